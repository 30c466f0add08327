use std::fmt;

use crate::domain::document::{
    self, Document, EditCommand, EMPTY_DOCUMENT_MARKUP, Position, Selection,
};

pub type ChangeListener = Box<dyn FnMut(&str) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The markup already matched what the surface shows.
    Unchanged,
    /// The surface was replaced with the loaded document.
    Rendered,
}

#[derive(Debug, Clone)]
struct Surface {
    document: Document,
    selection: Selection,
}

/// The post body being edited: a document, its selection and the last
/// published markup.
///
/// A buffer created with [`EditorBuffer::detached`] has no editable surface.
/// Every operation on it is a no-op reporting that nothing changed.
pub struct EditorBuffer {
    surface: Option<Surface>,
    markup: String,
    listeners: Vec<ChangeListener>,
    renders: u64,
}

impl fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorBuffer")
            .field("surface", &self.surface)
            .field("markup", &self.markup)
            .field("listeners", &self.listeners.len())
            .field("renders", &self.renders)
            .finish()
    }
}

impl Default for EditorBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorBuffer {
    pub fn new() -> Self {
        Self {
            surface: Some(Surface {
                document: Document::new(),
                selection: Selection::caret(Position::new(0, 0)),
            }),
            markup: EMPTY_DOCUMENT_MARKUP.to_string(),
            listeners: Vec::new(),
            renders: 0,
        }
    }

    pub fn detached() -> Self {
        Self {
            surface: None,
            markup: String::new(),
            listeners: Vec::new(),
            renders: 0,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.surface.is_none()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&str) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Markup last published by [`EditorBuffer::on_user_edit`] or installed
    /// by a render.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn document(&self) -> Option<&Document> {
        self.surface.as_ref().map(|surface| &surface.document)
    }

    pub fn selection(&self) -> Option<Selection> {
        self.surface.as_ref().map(|surface| surface.selection)
    }

    /// How many times the surface content has been replaced wholesale.
    pub fn render_count(&self) -> u64 {
        self.renders
    }

    /// Replace the document with `markup` unless the surface already shows
    /// it. Skipping identical content keeps the caret where the user left
    /// it.
    pub fn load(&mut self, markup: &str) -> LoadOutcome {
        let Some(surface) = self.surface.as_mut() else {
            return LoadOutcome::Unchanged;
        };

        if document::serialize(&surface.document) == markup {
            return LoadOutcome::Unchanged;
        }
        let parsed = document::parse(markup);
        if parsed == surface.document {
            return LoadOutcome::Unchanged;
        }

        surface.selection = Selection::caret(parsed.end());
        self.markup = document::serialize(&parsed);
        surface.document = parsed;
        self.renders += 1;
        LoadOutcome::Rendered
    }

    /// Set the selection, clamped into the document. Returns `false` when
    /// there is no surface.
    pub fn select(&mut self, selection: Selection) -> bool {
        match self.surface.as_mut() {
            Some(surface) => {
                surface.selection = surface.document.clamp_selection(selection);
                true
            }
            None => false,
        }
    }

    /// Serialize the document, store it as the authoritative value and
    /// notify every listener.
    pub fn on_user_edit(&mut self) -> Option<String> {
        let surface = self.surface.as_ref()?;
        let markup = document::serialize(&surface.document);
        self.markup = markup.clone();
        for listener in &mut self.listeners {
            listener(&markup);
        }
        Some(markup)
    }

    /// Insert clipboard content as plain text.
    pub fn on_paste(&mut self, raw: &str) -> Option<String> {
        self.edit(EditCommand::InsertText(raw.to_string()))?;
        self.on_user_edit()
    }

    /// Enter splits the block into a new paragraph; Shift+Enter breaks the
    /// line inside the current block.
    pub fn on_enter_key(&mut self, shift: bool) -> Option<String> {
        let command = if shift {
            EditCommand::InsertLineBreak
        } else {
            EditCommand::SplitBlock
        };
        self.edit(command)?;
        self.on_user_edit()
    }

    pub fn type_text(&mut self, text: &str) -> Option<String> {
        self.edit(EditCommand::InsertText(text.to_string()))?;
        self.on_user_edit()
    }

    /// Apply a formatting command and publish the result if the document
    /// changed.
    pub fn apply(&mut self, command: &EditCommand) -> Option<String> {
        if self.edit(command.clone())? {
            self.on_user_edit()
        } else {
            None
        }
    }

    /// Empty the document, as after a successful submission.
    pub fn reset(&mut self) -> LoadOutcome {
        let outcome = self.load("");
        self.select(Selection::caret(Position::new(0, 0)));
        outcome
    }

    /// Returns whether the document changed, or `None` without a surface.
    fn edit(&mut self, command: EditCommand) -> Option<bool> {
        let surface = self.surface.as_mut()?;
        let edit = document::apply(&surface.document, surface.selection, &command);
        let changed = edit.changed_from(&surface.document);
        surface.document = edit.document;
        surface.selection = edit.selection;
        Some(changed)
    }
}
