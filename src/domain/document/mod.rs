//! Rich-text document model backing the post editor.
//!
//! A [`Document`] is a flat list of typed [`Block`]s. Each block carries text
//! runs with inline marks and an optional hyperlink. Consecutive list items of
//! the same kind serialize into one `<ul>`/`<ol>`, which keeps selection
//! arithmetic simple: a [`Position`] is a block index plus a character offset
//! into that block's text.
//!
//! Documents are always normalized: no empty runs, and no two adjacent runs
//! with identical formatting. That makes `parse(serialize(doc)) == doc`.

mod edit;
mod markup;

pub use edit::{Edit, EditCommand, apply};
pub use markup::{EMPTY_DOCUMENT_MARKUP, parse, serialize};

use serde::{Deserialize, Serialize};

/// Placeholder used when a heading is inserted without selected text.
pub const HEADING_PLACEHOLDER: &str = "Heading Text";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    /// Map an HTML heading level onto the supported range; `h4`..`h6` fold
    /// into level three.
    pub fn from_html_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::H1),
            2 => Some(Self::H2),
            3..=6 => Some(Self::H3),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::H1 => 1,
            Self::H2 => 2,
            Self::H3 => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    pub(crate) fn tag(self) -> &'static str {
        match self {
            Self::Unordered => "ul",
            Self::Ordered => "ol",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    Paragraph,
    Heading(HeadingLevel),
    ListItem(ListKind),
    Quote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    Bold,
    Italic,
    Underline,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Marks {
    pub fn has(&self, mark: Mark) -> bool {
        match mark {
            Mark::Bold => self.bold,
            Mark::Italic => self.italic,
            Mark::Underline => self.underline,
        }
    }

    pub fn set(&mut self, mark: Mark, enabled: bool) {
        match mark {
            Mark::Bold => self.bold = enabled,
            Mark::Italic => self.italic = enabled,
            Mark::Underline => self.underline = enabled,
        }
    }

    pub fn with(mut self, mark: Mark) -> Self {
        self.set(mark, true);
        self
    }
}

/// A stretch of text sharing one formatting. Line breaks inside a block are
/// stored as `'\n'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub marks: Marks,
    pub link: Option<String>,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Marks::default(),
            link: None,
        }
    }

    pub fn marked(text: impl Into<String>, marks: Marks) -> Self {
        Self {
            text: text.into(),
            marks,
            link: None,
        }
    }

    pub fn linked(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Marks::default(),
            link: Some(href.into()),
        }
    }

    pub(crate) fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn same_format(&self, other: &TextRun) -> bool {
        self.marks == other.marks && self.link == other.link
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub runs: Vec<TextRun>,
}

impl Block {
    pub fn new(kind: BlockKind, runs: Vec<TextRun>) -> Self {
        let mut block = Self { kind, runs };
        block.normalize();
        block
    }

    pub fn empty(kind: BlockKind) -> Self {
        Self {
            kind,
            runs: Vec::new(),
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Paragraph, vec![TextRun::plain(text)])
    }

    pub fn text_len(&self) -> usize {
        self.runs.iter().map(TextRun::char_len).sum()
    }

    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Merge adjacent runs with identical formatting and drop empty runs.
    pub(crate) fn normalize(&mut self) {
        let mut merged: Vec<TextRun> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if run.text.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.same_format(&run) => last.text.push_str(&run.text),
                _ => merged.push(run),
            }
        }
        self.runs = merged;
    }

    /// Ensure a run boundary exists at `offset` (in characters).
    pub(crate) fn split_runs_at(&mut self, offset: usize) {
        let mut start = 0;
        for index in 0..self.runs.len() {
            let len = self.runs[index].char_len();
            if offset > start && offset < start + len {
                let local = offset - start;
                let byte = byte_index(&self.runs[index].text, local);
                let tail = self.runs[index].text.split_off(byte);
                let mut second = self.runs[index].clone();
                second.text = tail;
                self.runs.insert(index + 1, second);
                return;
            }
            start += len;
        }
    }

    /// Split into the content before and after `offset`; both halves keep
    /// this block's kind.
    pub(crate) fn split_off(&mut self, offset: usize) -> Block {
        self.split_runs_at(offset);
        let mut consumed = 0;
        let mut index = 0;
        while index < self.runs.len() && consumed < offset {
            consumed += self.runs[index].char_len();
            index += 1;
        }
        let tail = self.runs.split_off(index);
        Block::new(self.kind, tail)
    }

    /// Text between two character offsets.
    pub(crate) fn text_between(&self, start: usize, end: usize) -> String {
        self.plain_text()
            .chars()
            .skip(start)
            .take(end.saturating_sub(start))
            .collect()
    }

    /// The run covering the character just before `offset`, if any.
    pub(crate) fn run_before(&self, offset: usize) -> Option<&TextRun> {
        if offset == 0 {
            return None;
        }
        let mut start = 0;
        for run in &self.runs {
            let len = run.char_len();
            if offset > start && offset <= start + len {
                return Some(run);
            }
            start += len;
        }
        None
    }

    /// The run covering the character at `offset`, if any.
    pub(crate) fn run_at(&self, offset: usize) -> Option<&TextRun> {
        let mut start = 0;
        for run in &self.runs {
            let len = run.char_len();
            if offset >= start && offset < start + len {
                return Some(run);
            }
            start += len;
        }
        None
    }
}

pub(crate) fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

/// A caret location: block index plus character offset within the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub block: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }
}

/// Anchor/focus pair as produced by a user dragging across text; the anchor
/// may come after the focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Position,
    pub focus: Position,
}

impl Selection {
    pub fn caret(position: Position) -> Self {
        Self {
            anchor: position,
            focus: position,
        }
    }

    pub fn range(anchor: Position, focus: Position) -> Self {
        Self { anchor, focus }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Ordered `(start, end)` bounds.
    pub fn bounds(&self) -> (Position, Position) {
        if self.anchor <= self.focus {
            (self.anchor, self.focus)
        } else {
            (self.focus, self.anchor)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A document holding one empty paragraph.
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::empty(BlockKind::Paragraph)],
        }
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut blocks: Vec<Block> = blocks
            .into_iter()
            .map(|mut block| {
                block.normalize();
                block
            })
            .collect();
        if blocks.is_empty() {
            blocks.push(Block::empty(BlockKind::Paragraph));
        }
        Self { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    /// True for a document with a single empty paragraph.
    pub fn is_blank(&self) -> bool {
        self.blocks
            .iter()
            .all(|block| block.plain_text().trim().is_empty())
    }

    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Caret position at the very end of the document.
    pub fn end(&self) -> Position {
        let last = self.blocks.len() - 1;
        Position::new(last, self.blocks[last].text_len())
    }

    /// Move a position into the document's bounds.
    pub fn clamp(&self, position: Position) -> Position {
        if position.block >= self.blocks.len() {
            return self.end();
        }
        let len = self.blocks[position.block].text_len();
        Position::new(position.block, position.offset.min(len))
    }

    pub fn clamp_selection(&self, selection: Selection) -> Selection {
        Selection {
            anchor: self.clamp(selection.anchor),
            focus: self.clamp(selection.focus),
        }
    }

    /// Plain text between two ordered positions; block boundaries become
    /// `'\n'`.
    pub fn text_between(&self, start: Position, end: Position) -> String {
        if start.block == end.block {
            return self.blocks[start.block].text_between(start.offset, end.offset);
        }

        let mut parts = Vec::with_capacity(end.block - start.block + 1);
        let first = &self.blocks[start.block];
        parts.push(first.text_between(start.offset, first.text_len()));
        for block in &self.blocks[start.block + 1..end.block] {
            parts.push(block.plain_text());
        }
        parts.push(self.blocks[end.block].text_between(0, end.offset));
        parts.join("\n")
    }
}
