//! Content rendering for engine replies.
//!
//! The engine answers in Markdown. This module parses that text into a
//! structured block/inline tree and decorates path-like spans with an
//! open target, so the presentation layer can wire them to the engine's
//! open endpoint. Classification happens on the raw span text, before any
//! structural decoration, and each qualifying span is classified
//! independently: a table with fifty cells performs fifty checks.
//!
//! Rendering is a pure transform: no IO, no shared state, and the same
//! input always yields a structurally identical tree. Malformed or
//! partial Markdown degrades to plain text instead of erroring.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::paths::open_target;

/// Which side of the conversation a document renders for.
///
/// User mode is compact and single-line-biased: hard breaks collapse to
/// spaces. Assistant mode keeps the full block set. Both modes apply the
/// same path-detection rule; duration and copy affordances on assistant
/// turns are the caller's concern, not the renderer's.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RenderMode {
    /// Compact rendering for user turns.
    User,

    /// Full rendering for assistant turns.
    Assistant,
}

/// A rendered document: an ordered sequence of blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// The mode the document was rendered in.
    pub mode: RenderMode,

    /// Top-level blocks in source order.
    pub blocks: Vec<Block>,
}

/// A block-level element.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// A paragraph of inline content.
    Paragraph(Vec<Inline>),

    /// A heading. Levels deeper than 3 clamp to 3.
    Heading {
        /// Heading level, 1 through 3.
        level: u8,
        /// Inline content of the heading.
        inlines: Vec<Inline>,
    },

    /// An ordered or unordered list.
    List {
        /// True for numbered lists.
        ordered: bool,
        /// First item number for ordered lists.
        start: u64,
        /// One inline run per item.
        items: Vec<Vec<Inline>>,
    },

    /// A block quote containing nested blocks.
    BlockQuote(Vec<Block>),

    /// A fenced or indented code block. Never interactive.
    CodeBlock {
        /// Language tag from the fence, when present.
        language: Option<String>,
        /// Verbatim code text.
        code: String,
    },

    /// A table with a header row and body rows.
    Table {
        /// Header cells.
        header: Vec<TableCell>,
        /// Body rows.
        rows: Vec<Vec<TableCell>>,
    },

    /// A horizontal rule.
    Rule,
}

/// An inline element.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    /// Plain text.
    Text(String),

    /// A bold span. Interactive when its flattened text classifies as a
    /// filesystem path.
    Bold {
        /// Flattened text content of the span.
        text: String,
        /// Normalized path to open when the span is activated.
        open_target: Option<String>,
    },

    /// An italic span. Never interactive.
    Italic(String),

    /// An inline code span. Interactive when its text classifies as a
    /// filesystem path.
    Code {
        /// Verbatim code text.
        text: String,
        /// Normalized path to open when the span is activated.
        open_target: Option<String>,
    },
}

/// One table cell: its inline content plus the open target derived from
/// the cell's flattened text.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    /// Inline content of the cell.
    pub inlines: Vec<Inline>,

    /// Normalized path to open when the cell is activated.
    pub open_target: Option<String>,
}

impl Document {
    /// Returns every open target in the document, in source order.
    ///
    /// Targets come from bold spans, inline code spans, and table cells.
    /// Duplicates across distinct nodes are preserved, but a cell whose
    /// own target matched subsumes the spans inside it.
    pub fn open_targets(&self) -> Vec<&str> {
        fn walk_inlines<'a>(inlines: &'a [Inline], out: &mut Vec<&'a str>) {
            for inline in inlines {
                match inline {
                    Inline::Bold {
                        open_target: Some(target),
                        ..
                    } => out.push(target),
                    Inline::Code {
                        open_target: Some(target),
                        ..
                    } => out.push(target),
                    _ => {}
                }
            }
        }

        fn walk_cells<'a>(cells: &'a [TableCell], out: &mut Vec<&'a str>) {
            for cell in cells {
                // A cell target covers the cell's whole flattened text;
                // inner spans would report the same path again.
                if let Some(target) = &cell.open_target {
                    out.push(target);
                } else {
                    walk_inlines(&cell.inlines, out);
                }
            }
        }

        fn walk_blocks<'a>(blocks: &'a [Block], out: &mut Vec<&'a str>) {
            for block in blocks {
                match block {
                    Block::Paragraph(inlines) | Block::Heading { inlines, .. } => {
                        walk_inlines(inlines, out);
                    }
                    Block::List { items, .. } => {
                        for item in items {
                            walk_inlines(item, out);
                        }
                    }
                    Block::BlockQuote(inner) => walk_blocks(inner, out),
                    Block::Table { header, rows } => {
                        walk_cells(header, out);
                        for row in rows {
                            walk_cells(row, out);
                        }
                    }
                    Block::CodeBlock { .. } | Block::Rule => {}
                }
            }
        }

        let mut out = Vec::new();
        walk_blocks(&self.blocks, &mut out);
        out
    }
}

/// Renders formatted text into a [`Document`].
///
/// Pure function: no side effects, no network or filesystem access.
/// Calling it twice on the same input yields structurally equal trees.
pub fn render(text: &str, mode: RenderMode) -> Document {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);

    let mut builder = TreeBuilder::new(mode);
    for event in Parser::new_ext(text, options) {
        builder.handle(event);
    }
    Document {
        mode,
        blocks: builder.finish(),
    }
}

/// Kind of inline span currently being flattened.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum SpanKind {
    Bold,
    Italic,
}

#[derive(Debug, Default)]
struct ListBuild {
    ordered: bool,
    start: u64,
    items: Vec<Vec<Inline>>,
}

#[derive(Debug, Default)]
struct CellBuild {
    inlines: Vec<Inline>,
    raw: String,
}

#[derive(Debug, Default)]
struct TableBuild {
    header: Vec<TableCell>,
    rows: Vec<Vec<TableCell>>,
    current_row: Vec<TableCell>,
    cell: Option<CellBuild>,
    in_head: bool,
}

/// Incremental tree builder over the parser's event stream.
///
/// Unknown or out-of-place events fold into plain text rather than
/// erroring, so a malformed fragment degrades locally and the rest of
/// the document renders normally.
struct TreeBuilder {
    mode: RenderMode,
    root: Vec<Block>,
    quote_stack: Vec<Vec<Block>>,
    inlines: Vec<Inline>,
    span_stack: Vec<SpanKind>,
    span_text: String,
    lists: Vec<ListBuild>,
    item_depth: usize,
    table: Option<TableBuild>,
    heading: Option<u8>,
    in_code_block: bool,
    code_language: Option<String>,
    code_text: String,
}

impl TreeBuilder {
    fn new(mode: RenderMode) -> Self {
        Self {
            mode,
            root: Vec::new(),
            quote_stack: Vec::new(),
            inlines: Vec::new(),
            span_stack: Vec::new(),
            span_text: String::new(),
            lists: Vec::new(),
            item_depth: 0,
            table: None,
            heading: None,
            in_code_block: false,
            code_language: None,
            code_text: String::new(),
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        if self.in_code_block {
            match event {
                Event::End(TagEnd::CodeBlock) => self.end_code_block(),
                Event::Text(t) | Event::Code(t) => self.code_text.push_str(&t),
                Event::SoftBreak | Event::HardBreak => self.code_text.push('\n'),
                _ => {}
            }
            return;
        }

        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag_end) => self.end_tag(tag_end),
            Event::Text(t) => self.push_text(&t),
            Event::Code(t) => self.push_code(&t),
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => {
                if self.mode == RenderMode::User {
                    self.push_text(" ");
                } else {
                    self.push_text("\n");
                }
            }
            Event::Rule => {
                self.flush_paragraph();
                self.sink().push(Block::Rule);
            }
            // HTML and anything else the parser surfaces degrades to
            // plain text.
            Event::Html(t) | Event::InlineHtml(t) => self.push_text(&t),
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {}
            Tag::Heading { level, .. } => {
                self.flush_paragraph();
                self.heading = Some((level as u8).min(3));
            }
            Tag::BlockQuote(_) => {
                self.flush_paragraph();
                self.quote_stack.push(Vec::new());
            }
            Tag::List(start) => {
                self.flush_paragraph();
                self.lists.push(ListBuild {
                    ordered: start.is_some(),
                    start: start.unwrap_or(1),
                    items: Vec::new(),
                });
            }
            Tag::Item => {
                self.item_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.flush_paragraph();
                self.in_code_block = true;
                self.code_language = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    _ => None,
                };
            }
            Tag::Table(_) => {
                self.flush_paragraph();
                self.table = Some(TableBuild::default());
            }
            Tag::TableHead => {
                if let Some(table) = &mut self.table {
                    table.in_head = true;
                }
            }
            Tag::TableRow => {}
            Tag::TableCell => {
                if let Some(table) = &mut self.table {
                    table.cell = Some(CellBuild::default());
                }
            }
            Tag::Strong => self.span_stack.push(SpanKind::Bold),
            Tag::Emphasis => self.span_stack.push(SpanKind::Italic),
            // Links, images, and other inline containers render as their
            // flattened text content.
            _ => {}
        }
    }

    fn end_tag(&mut self, tag_end: TagEnd) {
        match tag_end {
            TagEnd::Paragraph => self.flush_paragraph(),
            TagEnd::Heading(_) => {
                let level = self.heading.take().unwrap_or(1);
                let inlines = std::mem::take(&mut self.inlines);
                self.sink().push(Block::Heading { level, inlines });
            }
            TagEnd::BlockQuote(_) => {
                self.flush_paragraph();
                if let Some(inner) = self.quote_stack.pop() {
                    self.sink().push(Block::BlockQuote(inner));
                }
            }
            TagEnd::List(_) => {
                if let Some(list) = self.lists.pop() {
                    self.sink().push(Block::List {
                        ordered: list.ordered,
                        start: list.start,
                        items: list.items,
                    });
                }
            }
            TagEnd::Item => {
                let item = std::mem::take(&mut self.inlines);
                if let Some(list) = self.lists.last_mut() {
                    list.items.push(item);
                }
                self.item_depth = self.item_depth.saturating_sub(1);
            }
            TagEnd::CodeBlock => self.end_code_block(),
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.sink().push(Block::Table {
                        header: table.header,
                        rows: table.rows,
                    });
                }
            }
            TagEnd::TableHead => {
                if let Some(table) = &mut self.table {
                    table.in_head = false;
                    table.header = std::mem::take(&mut table.current_row);
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = &mut self.table {
                    let row = std::mem::take(&mut table.current_row);
                    table.rows.push(row);
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = &mut self.table
                    && let Some(cell) = table.cell.take()
                {
                    let finished = TableCell {
                        open_target: open_target(&cell.raw),
                        inlines: cell.inlines,
                    };
                    table.current_row.push(finished);
                }
            }
            TagEnd::Strong => self.end_span(SpanKind::Bold),
            TagEnd::Emphasis => self.end_span(SpanKind::Italic),
            _ => {}
        }
    }

    /// Current block sink: the innermost open block quote, or the root.
    fn sink(&mut self) -> &mut Vec<Block> {
        self.quote_stack.last_mut().unwrap_or(&mut self.root)
    }

    fn flush_paragraph(&mut self) {
        // Paragraph boundaries inside list items and tables are handled
        // by the item and cell terminators.
        if self.item_depth > 0 || self.table.is_some() {
            return;
        }
        if !self.inlines.is_empty() {
            let inlines = std::mem::take(&mut self.inlines);
            self.sink().push(Block::Paragraph(inlines));
        }
    }

    fn end_code_block(&mut self) {
        self.in_code_block = false;
        let block = Block::CodeBlock {
            language: self.code_language.take(),
            code: std::mem::take(&mut self.code_text),
        };
        self.sink().push(block);
    }

    fn push_inline(&mut self, inline: Inline) {
        if let Some(table) = &mut self.table
            && let Some(cell) = &mut table.cell
        {
            cell.inlines.push(inline);
        } else {
            self.inlines.push(inline);
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(table) = &mut self.table
            && let Some(cell) = &mut table.cell
        {
            cell.raw.push_str(text);
        }
        if self.span_stack.is_empty() {
            self.push_inline(Inline::Text(text.to_string()));
        } else {
            self.span_text.push_str(text);
        }
    }

    fn push_code(&mut self, text: &str) {
        if let Some(table) = &mut self.table
            && let Some(cell) = &mut table.cell
        {
            cell.raw.push_str(text);
        }
        if self.span_stack.is_empty() {
            self.push_inline(Inline::Code {
                open_target: open_target(text),
                text: text.to_string(),
            });
        } else {
            // Code nested inside a bold/italic span flattens into the
            // span's text, as the original presentation did.
            self.span_text.push_str(text);
        }
    }

    fn end_span(&mut self, kind: SpanKind) {
        if self.span_stack.last() == Some(&kind) {
            self.span_stack.pop();
        }
        if !self.span_stack.is_empty() {
            // Still inside an outer span; keep flattening.
            return;
        }
        let text = std::mem::take(&mut self.span_text);
        let inline = match kind {
            SpanKind::Bold => Inline::Bold {
                open_target: open_target(&text),
                text,
            },
            SpanKind::Italic => Inline::Italic(text),
        };
        self.push_inline(inline);
    }

    fn finish(mut self) -> Vec<Block> {
        // Tolerate truncated input: close any dangling span and flush
        // the trailing paragraph.
        if !self.span_text.is_empty() {
            let text = std::mem::take(&mut self.span_text);
            let kind = self.span_stack.first().copied().unwrap_or(SpanKind::Bold);
            self.span_stack.clear();
            let inline = match kind {
                SpanKind::Bold => Inline::Bold {
                    open_target: open_target(&text),
                    text,
                },
                SpanKind::Italic => Inline::Italic(text),
            };
            self.push_inline(inline);
        }
        self.item_depth = 0;
        self.table = None;
        self.flush_paragraph();
        while let Some(inner) = self.quote_stack.pop() {
            self.root.push(Block::BlockQuote(inner));
        }
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assistant(text: &str) -> Document {
        render(text, RenderMode::Assistant)
    }

    #[test]
    fn bold_path_becomes_interactive() {
        let doc = assistant("**/Users/bob/report.pdf**");
        assert_eq!(doc.blocks.len(), 1);
        let Block::Paragraph(inlines) = &doc.blocks[0] else {
            panic!("expected paragraph, got {:?}", doc.blocks[0]);
        };
        assert_eq!(
            inlines[0],
            Inline::Bold {
                text: "/Users/bob/report.pdf".to_string(),
                open_target: Some("/Users/bob/report.pdf".to_string()),
            }
        );
    }

    #[test]
    fn bold_label_stays_plain() {
        let doc = assistant("**Total Price**");
        let Block::Paragraph(inlines) = &doc.blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(
            inlines[0],
            Inline::Bold {
                text: "Total Price".to_string(),
                open_target: None,
            }
        );
    }

    #[test]
    fn inline_code_path_becomes_interactive() {
        let doc = assistant("run `C:/tools/scan.exe` first");
        let Block::Paragraph(inlines) = &doc.blocks[0] else {
            panic!("expected paragraph");
        };
        assert!(inlines.iter().any(|inline| matches!(
            inline,
            Inline::Code { open_target: Some(target), .. } if target == "C:/tools/scan.exe"
        )));
    }

    #[test]
    fn table_cells_classify_independently() {
        let doc = assistant(
            "| File | Size |\n\
             | --- | --- |\n\
             | /tmp/a.txt | 10 |\n\
             | /tmp/b.txt | 20 |\n",
        );
        let Block::Table { header, rows } = &doc.blocks[0] else {
            panic!("expected table, got {:?}", doc.blocks[0]);
        };
        assert_eq!(header.len(), 2);
        assert!(header[0].open_target.is_none());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0].open_target.as_deref(), Some("/tmp/a.txt"));
        assert!(rows[0][1].open_target.is_none());
        assert_eq!(rows[1][0].open_target.as_deref(), Some("/tmp/b.txt"));
    }

    #[test]
    fn heading_levels_clamp_to_three() {
        let doc = assistant("# one\n\n### three\n\n##### five\n");
        let levels: Vec<u8> = doc
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::Heading { level, .. } => Some(*level),
                _ => None,
            })
            .collect();
        assert_eq!(levels, vec![1, 3, 3]);
    }

    #[test]
    fn lists_keep_order_and_numbering() {
        let doc = assistant("3. first\n4. second\n");
        let Block::List {
            ordered,
            start,
            items,
        } = &doc.blocks[0]
        else {
            panic!("expected list");
        };
        assert!(*ordered);
        assert_eq!(*start, 3);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0][0], Inline::Text("first".to_string()));
    }

    #[test]
    fn block_quote_nests_blocks() {
        let doc = assistant("> quoted **bold**\n");
        let Block::BlockQuote(inner) = &doc.blocks[0] else {
            panic!("expected block quote");
        };
        assert!(matches!(inner[0], Block::Paragraph(_)));
    }

    #[test]
    fn code_blocks_are_never_interactive() {
        let doc = assistant("```sh\nls /Users/bob\n```\n");
        let Block::CodeBlock { language, code } = &doc.blocks[0] else {
            panic!("expected code block");
        };
        assert_eq!(language.as_deref(), Some("sh"));
        assert_eq!(code, "ls /Users/bob\n");
        assert!(doc.open_targets().is_empty());
    }

    #[test]
    fn rule_renders() {
        let doc = assistant("before\n\n---\n\nafter\n");
        assert!(doc.blocks.iter().any(|b| matches!(b, Block::Rule)));
    }

    #[test]
    fn rendering_is_deterministic() {
        let text = "## Found\n\n| Path |\n| --- |\n| /tmp/x |\n\n- **/etc/hosts**\n";
        assert_eq!(assistant(text), assistant(text));
    }

    #[test]
    fn malformed_input_degrades_to_text() {
        // Unterminated emphasis, stray pipes, half a fence: nothing
        // should panic and the content should survive as text.
        for text in ["**unclosed", "| a | b", "```\nno fence end", "*"] {
            let doc = assistant(text);
            assert_eq!(doc, assistant(text));
        }
        let doc = assistant("**unclosed");
        assert!(!doc.blocks.is_empty());
    }

    #[test]
    fn user_mode_collapses_breaks() {
        let doc = render("line one\nline two", RenderMode::User);
        let Block::Paragraph(inlines) = &doc.blocks[0] else {
            panic!("expected paragraph");
        };
        let flat: String = inlines
            .iter()
            .map(|inline| match inline {
                Inline::Text(t) => t.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(flat, "line one line two");
    }

    #[test]
    fn open_targets_walk_in_source_order() {
        let doc = assistant(
            "**/a/first** and `/b/second`\n\n| cell |\n| --- |\n| /c/third |\n",
        );
        assert_eq!(doc.open_targets(), vec!["/a/first", "/b/second", "/c/third"]);
    }

    #[test]
    fn cell_target_subsumes_inner_spans() {
        // A bold path filling a cell matches as both the span and the
        // cell's flattened text; only the cell entry is reported.
        let doc = assistant(
            "| File | Note |\n\
             | --- | --- |\n\
             | **/tmp/a.txt** | see **/usr/bin/tool** |\n",
        );
        assert_eq!(doc.open_targets(), vec!["/tmp/a.txt", "/usr/bin/tool"]);
    }

    #[test]
    fn bold_inside_heading_still_classifies() {
        let doc = assistant("## Saved to **D:/archive/2024**\n");
        let Block::Heading { inlines, .. } = &doc.blocks[0] else {
            panic!("expected heading");
        };
        assert!(inlines.iter().any(|inline| matches!(
            inline,
            Inline::Bold { open_target: Some(target), .. } if target == "D:/archive/2024"
        )));
    }
}
