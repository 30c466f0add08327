//! Pure editing operations over a [`Document`] and a [`Selection`].
//!
//! Every command takes the current state by reference and returns the next
//! state; nothing here touches a rendering surface.

use super::{
    Block, BlockKind, Document, HEADING_PLACEHOLDER, HeadingLevel, ListKind, Mark, Position,
    Selection, TextRun,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    /// Replace the selection with a heading holding the selected text, or
    /// [`HEADING_PLACEHOLDER`] when nothing is selected.
    InsertHeading(HeadingLevel),
    ToggleMark(Mark),
    /// Turn the selected blocks into list items, or back into paragraphs if
    /// they already are items of this kind.
    ToggleList(ListKind),
    SetQuote,
    CreateLink(String),
    InsertText(String),
    DeleteSelection,
    /// Enter: split the current block; the new block is a paragraph.
    SplitBlock,
    /// Shift+Enter: a line break inside the current block.
    InsertLineBreak,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub document: Document,
    pub selection: Selection,
}

impl Edit {
    pub fn changed_from(&self, previous: &Document) -> bool {
        &self.document != previous
    }
}

pub fn apply(document: &Document, selection: Selection, command: &EditCommand) -> Edit {
    let mut doc = document.clone();
    let selection = doc.clamp_selection(selection);
    let (start, end) = selection.bounds();

    let selection = match command {
        EditCommand::InsertHeading(level) => {
            Selection::caret(insert_heading(&mut doc, start, end, *level))
        }
        EditCommand::ToggleMark(mark) => {
            if !selection.is_collapsed() {
                toggle_mark(&mut doc, start, end, *mark);
            }
            selection
        }
        EditCommand::ToggleList(kind) => {
            toggle_list(&mut doc, start, end, *kind);
            selection
        }
        EditCommand::SetQuote => {
            for block in &mut doc.blocks_mut()[start.block..=end.block] {
                block.kind = BlockKind::Quote;
            }
            selection
        }
        EditCommand::CreateLink(href) => {
            if selection.is_collapsed() {
                let run = TextRun::linked(href.clone(), href.clone());
                Selection::caret(insert_run(&mut doc, start, run))
            } else {
                set_link(&mut doc, start, end, href);
                selection
            }
        }
        EditCommand::InsertText(text) => Selection::caret(insert_text(&mut doc, start, end, text)),
        EditCommand::DeleteSelection => Selection::caret(delete_range(&mut doc, start, end)),
        EditCommand::SplitBlock => {
            let caret = delete_range(&mut doc, start, end);
            Selection::caret(split_block(&mut doc, caret, BlockKind::Paragraph))
        }
        EditCommand::InsertLineBreak => {
            let caret = delete_range(&mut doc, start, end);
            Selection::caret(insert_inline(&mut doc, caret, "\n"))
        }
    };

    Edit {
        document: doc,
        selection,
    }
}

fn delete_range(doc: &mut Document, start: Position, end: Position) -> Position {
    if start == end {
        return start;
    }

    let blocks = doc.blocks_mut();
    if start.block == end.block {
        let block = &mut blocks[start.block];
        let tail = block.split_off(end.offset);
        block.split_off(start.offset);
        block.runs.extend(tail.runs);
        block.normalize();
        return start;
    }

    let tail = blocks[end.block].split_off(end.offset);
    blocks[start.block].split_off(start.offset);
    blocks.drain(start.block + 1..=end.block);
    let block = &mut blocks[start.block];
    block.runs.extend(tail.runs);
    block.normalize();
    start
}

/// Insert text at a caret, inheriting marks from the neighbouring text. A
/// link is only inherited strictly inside linked text.
fn insert_inline(doc: &mut Document, at: Position, text: &str) -> Position {
    if text.is_empty() {
        return at;
    }

    let block = &doc.blocks()[at.block];
    let before = block.run_before(at.offset);
    let after = block.run_at(at.offset);
    let marks = before.or(after).map(|run| run.marks).unwrap_or_default();
    let link = match (before, after) {
        (Some(before), Some(after)) if before.link.is_some() && before.link == after.link => {
            before.link.clone()
        }
        _ => None,
    };

    insert_run(
        doc,
        at,
        TextRun {
            text: text.to_string(),
            marks,
            link,
        },
    )
}

fn insert_run(doc: &mut Document, at: Position, run: TextRun) -> Position {
    let len = run.char_len();
    let block = &mut doc.blocks_mut()[at.block];
    let tail = block.split_off(at.offset);
    block.runs.push(run);
    block.runs.extend(tail.runs);
    block.normalize();
    Position::new(at.block, at.offset + len)
}

fn split_block(doc: &mut Document, at: Position, kind: BlockKind) -> Position {
    let blocks = doc.blocks_mut();
    let mut tail = blocks[at.block].split_off(at.offset);
    tail.kind = kind;
    blocks.insert(at.block + 1, tail);
    Position::new(at.block + 1, 0)
}

/// Pasted or typed text: line endings are normalized, control characters
/// other than tab are dropped and every further line opens a paragraph.
fn insert_text(doc: &mut Document, start: Position, end: Position, text: &str) -> Position {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut caret = delete_range(doc, start, end);

    for (index, line) in normalized.split('\n').enumerate() {
        if index > 0 {
            caret = split_block(doc, caret, BlockKind::Paragraph);
        }
        let clean: String = line
            .chars()
            .filter(|ch| !ch.is_control() || *ch == '\t')
            .collect();
        caret = insert_inline(doc, caret, &clean);
    }
    caret
}

fn insert_heading(
    doc: &mut Document,
    start: Position,
    end: Position,
    level: HeadingLevel,
) -> Position {
    let selected = doc.text_between(start, end).replace('\n', " ");
    let text = if selected.is_empty() {
        HEADING_PLACEHOLDER.to_string()
    } else {
        selected
    };

    let caret = delete_range(doc, start, end);
    let blocks = doc.blocks_mut();
    let mut after = blocks[caret.block].split_off(caret.offset);
    if after.is_empty() {
        after.kind = BlockKind::Paragraph;
    }

    let mut index = caret.block;
    if blocks[index].is_empty() {
        blocks.remove(index);
    } else {
        index += 1;
    }
    blocks.insert(
        index,
        Block::new(BlockKind::Heading(level), vec![TextRun::plain(text)]),
    );
    blocks.insert(index + 1, after);
    Position::new(index + 1, 0)
}

/// Split runs at the selection edges and return `(block, run)` indices of
/// every run lying inside it.
fn selected_runs(doc: &mut Document, start: Position, end: Position) -> Vec<(usize, usize)> {
    let mut hits = Vec::new();
    for index in start.block..=end.block {
        let block = &mut doc.blocks_mut()[index];
        let from = if index == start.block { start.offset } else { 0 };
        let to = if index == end.block {
            end.offset
        } else {
            block.text_len()
        };
        block.split_runs_at(to);
        block.split_runs_at(from);

        let mut offset = 0;
        for (run_index, run) in block.runs.iter().enumerate() {
            let len = run.char_len();
            if len > 0 && offset >= from && offset + len <= to {
                hits.push((index, run_index));
            }
            offset += len;
        }
    }
    hits
}

fn toggle_mark(doc: &mut Document, start: Position, end: Position, mark: Mark) {
    let hits = selected_runs(doc, start, end);
    let blocks = doc.blocks_mut();
    let all_marked = hits
        .iter()
        .all(|&(block, run)| blocks[block].runs[run].marks.has(mark));
    for &(block, run) in &hits {
        blocks[block].runs[run].marks.set(mark, !all_marked);
    }
    for block in &mut blocks[start.block..=end.block] {
        block.normalize();
    }
}

fn set_link(doc: &mut Document, start: Position, end: Position, href: &str) {
    let hits = selected_runs(doc, start, end);
    let blocks = doc.blocks_mut();
    for &(block, run) in &hits {
        blocks[block].runs[run].link = Some(href.to_string());
    }
    for block in &mut blocks[start.block..=end.block] {
        block.normalize();
    }
}

fn toggle_list(doc: &mut Document, start: Position, end: Position, kind: ListKind) {
    let blocks = &mut doc.blocks_mut()[start.block..=end.block];
    let already = blocks
        .iter()
        .all(|block| block.kind == BlockKind::ListItem(kind));
    let target = if already {
        BlockKind::Paragraph
    } else {
        BlockKind::ListItem(kind)
    };
    for block in blocks {
        block.kind = target;
    }
}
