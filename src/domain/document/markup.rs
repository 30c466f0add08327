//! Conversion between [`Document`] and the HTML markup stored with posts.
//!
//! Serialization is deterministic. Parsing is tolerant: unknown elements are
//! transparent, comments are skipped and stray text lands in an implicit
//! paragraph. A block's trailing `<br>` is a placeholder and never becomes
//! text, which keeps empty blocks stable across a round trip.

use std::cell::RefCell;
use std::rc::Rc;

use html_escape::decode_html_entities;
use lol_html::html_content::EndTag;
use lol_html::{HandlerResult, RewriteStrSettings, doc_text, element, rewrite_str};

use super::{Block, BlockKind, Document, HeadingLevel, ListKind, Marks, TextRun};

/// Markup of a document holding one empty paragraph.
pub const EMPTY_DOCUMENT_MARKUP: &str = "<p><br></p>";

pub fn serialize(document: &Document) -> String {
    let mut out = String::new();
    let mut open_list: Option<ListKind> = None;

    for block in document.blocks() {
        match block.kind {
            BlockKind::ListItem(kind) => {
                if open_list != Some(kind) {
                    if let Some(previous) = open_list {
                        close_tag(&mut out, previous.tag());
                    }
                    open_tag(&mut out, kind.tag());
                    open_list = Some(kind);
                }
                write_block(&mut out, "li", block);
            }
            other => {
                if let Some(previous) = open_list.take() {
                    close_tag(&mut out, previous.tag());
                }
                let tag = match other {
                    BlockKind::Paragraph => "p",
                    BlockKind::Quote => "blockquote",
                    BlockKind::Heading(HeadingLevel::H1) => "h1",
                    BlockKind::Heading(HeadingLevel::H2) => "h2",
                    BlockKind::Heading(HeadingLevel::H3) => "h3",
                    BlockKind::ListItem(_) => unreachable!("handled above"),
                };
                write_block(&mut out, tag, block);
            }
        }
    }

    if let Some(previous) = open_list {
        close_tag(&mut out, previous.tag());
    }
    out
}

fn open_tag(out: &mut String, tag: &str) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
}

fn close_tag(out: &mut String, tag: &str) {
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_block(out: &mut String, tag: &str, block: &Block) {
    open_tag(out, tag);
    for run in &block.runs {
        write_run(out, run);
    }
    let needs_placeholder = block
        .runs
        .last()
        .map(|run| run.text.ends_with('\n'))
        .unwrap_or(true);
    if needs_placeholder {
        out.push_str("<br>");
    }
    close_tag(out, tag);
}

fn write_run(out: &mut String, run: &TextRun) {
    if let Some(href) = &run.link {
        out.push_str("<a href=\"");
        escape_into(out, href, true);
        out.push_str("\">");
    }
    if run.marks.bold {
        out.push_str("<b>");
    }
    if run.marks.italic {
        out.push_str("<i>");
    }
    if run.marks.underline {
        out.push_str("<u>");
    }

    escape_into(out, &run.text, false);

    if run.marks.underline {
        out.push_str("</u>");
    }
    if run.marks.italic {
        out.push_str("</i>");
    }
    if run.marks.bold {
        out.push_str("</b>");
    }
    if run.link.is_some() {
        out.push_str("</a>");
    }
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\n' if !attribute => out.push_str("<br>"),
            '\u{a0}' => out.push_str("&nbsp;"),
            other => out.push(other),
        }
    }
}

/// Parse stored markup. Never fails; anything unrecognized degrades to text.
pub fn parse(markup: &str) -> Document {
    let builder = Rc::new(RefCell::new(Builder::default()));

    let rewritten = rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers: vec![element!("*", {
                let builder = Rc::clone(&builder);
                move |el| {
                    let name = el.tag_name();
                    let href = el
                        .get_attribute("href")
                        .map(|value| decode_html_entities(&value).into_owned());
                    let has_content = el.can_have_content() && !el.is_self_closing();
                    builder.borrow_mut().open(&name, href, has_content);

                    if let Some(handlers) = el.end_tag_handlers() {
                        let builder = Rc::clone(&builder);
                        handlers.push(Box::new(move |_end: &mut EndTag<'_>| -> HandlerResult {
                            builder.borrow_mut().close(&name);
                            Ok(())
                        }) as _);
                    }
                    Ok(())
                }
            })],
            document_content_handlers: vec![doc_text!({
                let builder = Rc::clone(&builder);
                move |chunk| {
                    let mut builder = builder.borrow_mut();
                    builder.pending_text.push_str(chunk.as_str());
                    if chunk.last_in_text_node() {
                        builder.flush_text();
                    }
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    );

    if rewritten.is_err() {
        return Document::from_blocks(vec![Block::paragraph(markup)]);
    }

    Rc::try_unwrap(builder)
        .map(RefCell::into_inner)
        .unwrap_or_else(|rc| rc.borrow().clone())
        .finish()
}

#[derive(Debug, Clone)]
enum InlineFrame {
    Bold(String),
    Italic(String),
    Underline(String),
    Link(String, Option<String>),
    Other(String),
}

impl InlineFrame {
    fn name(&self) -> &str {
        match self {
            InlineFrame::Bold(name)
            | InlineFrame::Italic(name)
            | InlineFrame::Underline(name)
            | InlineFrame::Link(name, _)
            | InlineFrame::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Builder {
    blocks: Vec<Block>,
    current: Option<Block>,
    lists: Vec<ListKind>,
    quote_depth: usize,
    inline: Vec<InlineFrame>,
    /// Raw text of the text node being streamed, decoded once it is complete.
    pending_text: String,
}

impl Builder {
    fn open(&mut self, name: &str, href: Option<String>, has_content: bool) {
        self.flush_text();
        match name {
            "br" => self.push_text("\n".to_string()),
            "p" | "div" => {
                if self.current_is_empty_list_item() {
                    return;
                }
                self.flush();
                self.current = Some(Block::empty(self.implicit_kind()));
            }
            "li" => {
                self.flush();
                let kind = self.lists.last().copied().unwrap_or(ListKind::Unordered);
                self.current = Some(Block::empty(BlockKind::ListItem(kind)));
            }
            "ul" | "ol" => {
                self.flush_nested();
                self.lists.push(if name == "ol" {
                    ListKind::Ordered
                } else {
                    ListKind::Unordered
                });
            }
            "blockquote" => {
                self.flush_nested();
                self.quote_depth += 1;
            }
            heading if heading_level(heading).is_some() => {
                self.flush_nested();
                let level = heading_level(heading).unwrap_or(HeadingLevel::H3);
                self.current = Some(Block::empty(BlockKind::Heading(level)));
            }
            _ if !has_content => {}
            "b" | "strong" => self.inline.push(InlineFrame::Bold(name.to_string())),
            "i" | "em" => self.inline.push(InlineFrame::Italic(name.to_string())),
            "u" => self.inline.push(InlineFrame::Underline(name.to_string())),
            "a" => self.inline.push(InlineFrame::Link(name.to_string(), href)),
            _ => self.inline.push(InlineFrame::Other(name.to_string())),
        }
    }

    fn close(&mut self, name: &str) {
        self.flush_text();
        match name {
            "p" | "div" | "li" => self.flush(),
            "ul" | "ol" => {
                self.flush();
                self.lists.pop();
            }
            "blockquote" => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            heading if heading_level(heading).is_some() => self.flush(),
            _ => {
                if let Some(index) = self.inline.iter().rposition(|frame| frame.name() == name) {
                    self.inline.truncate(index);
                }
            }
        }
    }

    fn flush_text(&mut self) {
        if self.pending_text.is_empty() {
            return;
        }
        let raw = std::mem::take(&mut self.pending_text);
        if self.current.is_none() && raw.trim().is_empty() {
            return;
        }
        self.push_text(decode_html_entities(&raw).into_owned());
    }

    fn push_text(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        let (marks, link) = self.inline_format();
        let kind = self.implicit_kind();
        let block = self.current.get_or_insert_with(|| Block::empty(kind));
        block.runs.push(TextRun { text, marks, link });
    }

    fn inline_format(&self) -> (Marks, Option<String>) {
        let mut marks = Marks::default();
        let mut link = None;
        for frame in &self.inline {
            match frame {
                InlineFrame::Bold(_) => marks.bold = true,
                InlineFrame::Italic(_) => marks.italic = true,
                InlineFrame::Underline(_) => marks.underline = true,
                InlineFrame::Link(_, Some(href)) => link = Some(href.clone()),
                InlineFrame::Link(_, None) | InlineFrame::Other(_) => {}
            }
        }
        (marks, link)
    }

    fn implicit_kind(&self) -> BlockKind {
        if self.quote_depth > 0 {
            BlockKind::Quote
        } else if let Some(kind) = self.lists.last() {
            BlockKind::ListItem(*kind)
        } else {
            BlockKind::Paragraph
        }
    }

    fn current_is_empty_list_item(&self) -> bool {
        matches!(
            &self.current,
            Some(Block { kind: BlockKind::ListItem(_), runs }) if runs.is_empty()
        )
    }

    /// Flush before a block nested in a list item; an item that holds no text
    /// yet only wraps the nested block and is dropped.
    fn flush_nested(&mut self) {
        if self.current_is_empty_list_item() {
            self.current = None;
        } else {
            self.flush();
        }
    }

    fn flush(&mut self) {
        let Some(mut block) = self.current.take() else {
            return;
        };
        if let Some(last) = block.runs.last_mut() {
            if last.text.ends_with('\n') {
                last.text.pop();
            }
        }
        block.normalize();
        self.blocks.push(block);
    }

    fn finish(mut self) -> Document {
        self.flush_text();
        self.flush();
        Document::from_blocks(self.blocks)
    }
}

fn heading_level(name: &str) -> Option<HeadingLevel> {
    let digit = name.strip_prefix('h')?;
    let level: u8 = digit.parse().ok()?;
    HeadingLevel::from_html_level(level)
}
