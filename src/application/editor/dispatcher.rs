use thiserror::Error;
use tracing::debug;

use crate::domain::document::{EditCommand, HeadingLevel, ListKind, Mark, Selection};

use super::buffer::EditorBuffer;

/// Toolbar actions offered by the writing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatCommand {
    Heading(HeadingLevel),
    Bold,
    Italic,
    Underline,
    UnorderedList,
    OrderedList,
    BlockQuote,
    Link,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatcherState {
    #[default]
    Idle,
    /// The link action is waiting for a URL; the selection it applies to is
    /// remembered so that moving the caret meanwhile does not retarget it.
    PendingLinkInsertion { selection: Selection },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The document changed; carries the published markup.
    Applied(String),
    /// Nothing to do: no surface, collapsed selection, or cancelled link.
    Skipped,
    AwaitingLinkUrl,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("a link is waiting for its URL")]
    LinkPending,
    #[error("no link insertion is pending")]
    NoPendingLink,
}

#[derive(Debug, Default)]
pub struct CommandDispatcher {
    state: DispatcherState,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    pub fn is_link_pending(&self) -> bool {
        matches!(self.state, DispatcherState::PendingLinkInsertion { .. })
    }

    pub fn dispatch(
        &mut self,
        buffer: &mut EditorBuffer,
        command: FormatCommand,
    ) -> Result<DispatchOutcome, CommandError> {
        if self.is_link_pending() {
            return Err(CommandError::LinkPending);
        }

        let Some(selection) = buffer.selection() else {
            debug!(
                target = "creator_circle::editor",
                ?command,
                "no editable surface, command skipped"
            );
            return Ok(DispatchOutcome::Skipped);
        };

        let edit = match command {
            FormatCommand::Link => {
                self.state = DispatcherState::PendingLinkInsertion { selection };
                return Ok(DispatchOutcome::AwaitingLinkUrl);
            }
            FormatCommand::Heading(level) => EditCommand::InsertHeading(level),
            FormatCommand::Bold => EditCommand::ToggleMark(Mark::Bold),
            FormatCommand::Italic => EditCommand::ToggleMark(Mark::Italic),
            FormatCommand::Underline => EditCommand::ToggleMark(Mark::Underline),
            FormatCommand::UnorderedList => EditCommand::ToggleList(ListKind::Unordered),
            FormatCommand::OrderedList => EditCommand::ToggleList(ListKind::Ordered),
            FormatCommand::BlockQuote => EditCommand::SetQuote,
        };

        Ok(Self::outcome(buffer.apply(&edit)))
    }

    /// Resume a pending link action. `None` or a blank answer cancels it.
    pub fn resolve_link(
        &mut self,
        buffer: &mut EditorBuffer,
        answer: Option<&str>,
    ) -> Result<DispatchOutcome, CommandError> {
        let DispatcherState::PendingLinkInsertion { selection } = self.state else {
            return Err(CommandError::NoPendingLink);
        };
        self.state = DispatcherState::Idle;

        let Some(url) = answer.map(str::trim).filter(|url| !url.is_empty()) else {
            return Ok(DispatchOutcome::Skipped);
        };

        if !buffer.select(selection) {
            return Ok(DispatchOutcome::Skipped);
        }
        Ok(Self::outcome(
            buffer.apply(&EditCommand::CreateLink(url.to_string())),
        ))
    }

    fn outcome(markup: Option<String>) -> DispatchOutcome {
        match markup {
            Some(markup) => DispatchOutcome::Applied(markup),
            None => DispatchOutcome::Skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::Position;

    fn buffer_with(markup: &str, selection: Selection) -> EditorBuffer {
        let mut buffer = EditorBuffer::new();
        buffer.load(markup);
        buffer.select(selection);
        buffer
    }

    fn span(block: usize, from: usize, to: usize) -> Selection {
        Selection::range(Position::new(block, from), Position::new(block, to))
    }

    #[test]
    fn heading_without_selection_inserts_placeholder() {
        let mut buffer = EditorBuffer::new();
        let mut dispatcher = CommandDispatcher::new();

        let outcome = dispatcher
            .dispatch(&mut buffer, FormatCommand::Heading(HeadingLevel::H1))
            .expect("dispatch");

        assert_eq!(
            outcome,
            DispatchOutcome::Applied("<h1>Heading Text</h1><p><br></p>".to_string())
        );
        assert_eq!(
            buffer.selection(),
            Some(Selection::caret(Position::new(1, 0)))
        );
    }

    #[test]
    fn bold_on_collapsed_selection_is_skipped() {
        let mut buffer = buffer_with("<p>abc</p>", Selection::caret(Position::new(0, 1)));
        let outcome = CommandDispatcher::new()
            .dispatch(&mut buffer, FormatCommand::Bold)
            .expect("dispatch");
        assert_eq!(outcome, DispatchOutcome::Skipped);
    }

    #[test]
    fn list_and_quote_commands_publish_markup() {
        let mut buffer = buffer_with("<p>item</p>", span(0, 0, 2));
        let mut dispatcher = CommandDispatcher::new();

        let outcome = dispatcher
            .dispatch(&mut buffer, FormatCommand::UnorderedList)
            .expect("dispatch");
        assert_eq!(
            outcome,
            DispatchOutcome::Applied("<ul><li>item</li></ul>".to_string())
        );

        let outcome = dispatcher
            .dispatch(&mut buffer, FormatCommand::BlockQuote)
            .expect("dispatch");
        assert_eq!(
            outcome,
            DispatchOutcome::Applied("<blockquote>item</blockquote>".to_string())
        );
    }

    #[test]
    fn link_waits_for_a_url_and_uses_the_original_selection() {
        let mut buffer = buffer_with("<p>read the docs</p>", span(0, 9, 13));
        let mut dispatcher = CommandDispatcher::new();

        assert_eq!(
            dispatcher.dispatch(&mut buffer, FormatCommand::Link),
            Ok(DispatchOutcome::AwaitingLinkUrl)
        );
        assert!(dispatcher.is_link_pending());
        assert_eq!(
            dispatcher.dispatch(&mut buffer, FormatCommand::Bold),
            Err(CommandError::LinkPending)
        );

        buffer.select(Selection::caret(Position::new(0, 0)));
        let outcome = dispatcher
            .resolve_link(&mut buffer, Some(" https://docs.rs "))
            .expect("resolve");
        assert_eq!(
            outcome,
            DispatchOutcome::Applied(
                "<p>read the <a href=\"https://docs.rs\">docs</a></p>".to_string()
            )
        );
        assert_eq!(dispatcher.state(), DispatcherState::Idle);
    }

    #[test]
    fn cancelled_or_blank_link_changes_nothing() {
        let mut buffer = buffer_with("<p>text</p>", span(0, 0, 4));
        let mut dispatcher = CommandDispatcher::new();

        dispatcher
            .dispatch(&mut buffer, FormatCommand::Link)
            .expect("dispatch");
        assert_eq!(
            dispatcher.resolve_link(&mut buffer, Some("   ")),
            Ok(DispatchOutcome::Skipped)
        );

        dispatcher
            .dispatch(&mut buffer, FormatCommand::Link)
            .expect("dispatch");
        assert_eq!(
            dispatcher.resolve_link(&mut buffer, None),
            Ok(DispatchOutcome::Skipped)
        );
        assert_eq!(buffer.markup(), "<p>text</p>");
    }

    #[test]
    fn resolving_without_a_pending_link_is_an_error() {
        let mut buffer = EditorBuffer::new();
        assert_eq!(
            CommandDispatcher::new().resolve_link(&mut buffer, Some("https://x.io")),
            Err(CommandError::NoPendingLink)
        );
    }

    #[test]
    fn detached_buffer_skips_every_command() {
        let mut buffer = EditorBuffer::detached();
        let mut dispatcher = CommandDispatcher::new();

        for command in [
            FormatCommand::Heading(HeadingLevel::H2),
            FormatCommand::Italic,
            FormatCommand::OrderedList,
            FormatCommand::Link,
        ] {
            assert_eq!(
                dispatcher.dispatch(&mut buffer, command),
                Ok(DispatchOutcome::Skipped)
            );
        }
        assert!(!dispatcher.is_link_pending());
    }
}
