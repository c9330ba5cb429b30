//! Markdown to terminal text.
//!
//! Replies are rendered once, after the whole response arrived. Styled output
//! uses plain ANSI escapes; plain output is what gets written when standard
//! output is redirected. Widths are terminal columns, so CJK text counts two
//! per character.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::env;
use std::io::IsTerminal;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const DEFAULT_WRAP_WIDTH: usize = 100;
const MIN_CONTENT_WIDTH: usize = 20;
const CODE_INDENT: &str = "    ";

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const ITALIC: &str = "\x1b[3m";
const STRIKE: &str = "\x1b[9m";
const HEADING: &str = "\x1b[1;35m";
const CODE: &str = "\x1b[36m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renderer {
    width: usize,
    styled: bool,
}

impl Renderer {
    pub fn new(width: usize, styled: bool) -> Self {
        Self { width, styled }
    }

    pub fn plain() -> Self {
        Self::new(DEFAULT_WRAP_WIDTH, false)
    }

    /// Styled when stdout is a terminal and `NO_COLOR` is unset.
    pub fn for_stdout() -> Self {
        let styled = std::io::stdout().is_terminal() && env::var_os("NO_COLOR").is_none();
        Self::new(DEFAULT_WRAP_WIDTH, styled)
    }

    pub fn render(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut writer = TerminalWriter::new(self.width, self.styled);
        for event in Parser::new_ext(markdown, options) {
            writer.handle(event);
        }
        writer.finish()
    }
}

#[derive(Debug)]
struct ListState {
    next_number: Option<u64>,
}

#[derive(Debug, Default)]
struct TableState {
    rows: Vec<Vec<String>>,
    current_row: Vec<String>,
    current_cell: String,
    header_rows: usize,
}

struct TerminalWriter {
    width: usize,
    styled: bool,
    out: String,
    line: String,
    line_width: usize,
    line_started: bool,
    pending_space: bool,
    needs_blank: bool,
    indents: Vec<String>,
    pending_marker: Option<String>,
    styles: Vec<&'static str>,
    lists: Vec<ListState>,
    links: Vec<String>,
    code_block: Option<String>,
    table: Option<TableState>,
}

impl TerminalWriter {
    fn new(width: usize, styled: bool) -> Self {
        Self {
            width,
            styled,
            out: String::new(),
            line: String::new(),
            line_width: 0,
            line_started: false,
            pending_space: false,
            needs_blank: false,
            indents: Vec::new(),
            pending_marker: None,
            styles: Vec::new(),
            lists: Vec::new(),
            links: Vec::new(),
            code_block: None,
            table: None,
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        if let Some(code) = self.code_block.as_mut() {
            match event {
                Event::Text(text) => code.push_str(&text),
                Event::End(TagEnd::CodeBlock) => self.end_code_block(),
                _ => {}
            }
            return;
        }

        if let Some(table) = self.table.as_mut() {
            match event {
                Event::Text(text) | Event::Code(text) => table.current_cell.push_str(&text),
                Event::SoftBreak | Event::HardBreak => table.current_cell.push(' '),
                Event::End(TagEnd::TableCell) => {
                    let cell = std::mem::take(&mut table.current_cell);
                    table.current_row.push(cell.trim().to_string());
                }
                Event::End(TagEnd::TableHead) => {
                    let row = std::mem::take(&mut table.current_row);
                    table.rows.push(row);
                    table.header_rows = table.rows.len();
                }
                Event::End(TagEnd::TableRow) => {
                    let row = std::mem::take(&mut table.current_row);
                    table.rows.push(row);
                }
                Event::End(TagEnd::Table) => self.end_table(),
                _ => {}
            }
            return;
        }

        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => self.push_inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.push_text(&html),
            Event::SoftBreak => self.pending_space = true,
            Event::HardBreak => self.break_line(),
            Event::Rule => self.rule(),
            Event::TaskListMarker(done) => {
                self.push_word(if done { "[x]" } else { "[ ]" });
                self.pending_space = true;
            }
            Event::FootnoteReference(name) => self.push_word(&format!("[^{name}]")),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.begin_block(),
            Tag::Heading { level, .. } => {
                self.begin_block();
                self.push_word(&"#".repeat(heading_depth(level)));
                self.pending_space = true;
                self.push_style(HEADING);
            }
            Tag::BlockQuote(_) => {
                self.begin_block();
                self.indents.push("│ ".to_string());
            }
            Tag::CodeBlock(_) => {
                self.begin_block();
                self.code_block = Some(String::new());
            }
            Tag::List(first) => {
                if self.lists.is_empty() {
                    self.begin_block();
                } else {
                    self.break_line();
                }
                self.lists.push(ListState { next_number: first });
            }
            Tag::Item => {
                self.break_line();
                let marker = match self.lists.last_mut() {
                    Some(ListState {
                        next_number: Some(number),
                    }) => {
                        let marker = format!("{number}. ");
                        *number += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.indents.push(" ".repeat(marker.width()));
                self.pending_marker = Some(marker);
                self.needs_blank = false;
            }
            Tag::Emphasis => self.push_style(ITALIC),
            Tag::Strong => self.push_style(BOLD),
            Tag::Strikethrough => self.push_style(STRIKE),
            Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => {
                self.links.push(dest_url.to_string());
            }
            Tag::Table(_) => {
                self.begin_block();
                self.table = Some(TableState::default());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.end_block(),
            TagEnd::Heading(_) => {
                self.pop_style();
                self.end_block();
            }
            TagEnd::BlockQuote(_) => {
                self.break_line();
                self.indents.pop();
                self.needs_blank = true;
            }
            TagEnd::List(_) => {
                self.break_line();
                self.lists.pop();
                self.needs_blank = self.lists.is_empty();
            }
            TagEnd::Item => {
                self.break_line();
                self.indents.pop();
                self.pending_marker = None;
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link | TagEnd::Image => {
                if let Some(url) = self.links.pop()
                    && !url.is_empty()
                {
                    self.pending_space = true;
                    self.push_style(DIM);
                    self.push_word(&format!("({url})"));
                    self.pop_style();
                }
            }
            _ => {}
        }
    }

    fn begin_block(&mut self) {
        self.break_line();
        if self.needs_blank && !self.out.is_empty() {
            let prefix = self.indents.concat();
            self.out.push_str(prefix.trim_end());
            self.out.push('\n');
        }
        self.needs_blank = false;
    }

    fn end_block(&mut self) {
        self.break_line();
        self.needs_blank = true;
    }

    fn content_width(&self) -> usize {
        let prefix: usize = self.indents.iter().map(|indent| indent.width()).sum();
        self.width.saturating_sub(prefix).max(MIN_CONTENT_WIDTH)
    }

    fn line_prefix(&mut self) -> String {
        let mut prefix = String::new();
        let last = self.indents.len().saturating_sub(1);
        for (idx, indent) in self.indents.iter().enumerate() {
            match self.pending_marker.as_deref() {
                Some(marker) if idx == last => prefix.push_str(marker),
                _ => prefix.push_str(indent),
            }
        }
        self.pending_marker = None;
        prefix
    }

    fn start_line(&mut self) {
        if self.line_started {
            return;
        }
        let prefix = self.line_prefix();
        self.line.push_str(&prefix);
        if self.styled {
            for style in &self.styles {
                self.line.push_str(style);
            }
        }
        self.line_started = true;
        self.line_width = 0;
    }

    fn break_line(&mut self) {
        if self.line_started {
            if self.styled && !self.styles.is_empty() {
                self.line.push_str(RESET);
            }
            self.out.push_str(self.line.trim_end_matches(' '));
            self.out.push('\n');
        }
        self.line.clear();
        self.line_started = false;
        self.line_width = 0;
        self.pending_space = false;
    }

    fn push_style(&mut self, style: &'static str) {
        self.styles.push(style);
        if self.styled && self.line_started {
            if self.pending_space && self.line_width > 0 {
                self.line.push(' ');
                self.line_width += 1;
                self.pending_space = false;
            }
            self.line.push_str(style);
        }
    }

    fn pop_style(&mut self) {
        self.styles.pop();
        if self.styled && self.line_started {
            self.line.push_str(RESET);
            for style in &self.styles {
                self.line.push_str(style);
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.starts_with(char::is_whitespace) {
            self.pending_space = true;
        }
        for (idx, word) in text.split_whitespace().enumerate() {
            if idx > 0 {
                self.pending_space = true;
            }
            self.push_word(word);
        }
        if text.ends_with(char::is_whitespace) {
            self.pending_space = true;
        }
    }

    fn push_inline_code(&mut self, code: &str) {
        if self.styled {
            self.push_style(CODE);
            self.push_text(code);
            self.pop_style();
        } else {
            self.push_word(&format!("`{code}`"));
        }
    }

    fn push_word(&mut self, word: &str) {
        let available = self.content_width();
        let word_width = word.width();
        let mut space = self.pending_space && self.line_width > 0;
        self.pending_space = false;

        if self.line_width > 0 && self.line_width + usize::from(space) + word_width > available {
            self.break_line();
            space = false;
        }
        self.start_line();
        if space {
            self.line.push(' ');
            self.line_width += 1;
        }

        if word_width <= available.saturating_sub(self.line_width) {
            self.line.push_str(word);
            self.line_width += word_width;
            return;
        }

        for ch in word.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if self.line_width > 0 && self.line_width + ch_width > available {
                self.break_line();
                self.start_line();
            }
            self.line.push(ch);
            self.line_width += ch_width;
        }
    }

    fn emit_raw_line(&mut self, text: &str, style: &str) {
        let prefix = self.line_prefix();
        self.out.push_str(&prefix);
        if self.styled {
            self.out.push_str(style);
            self.out.push_str(text);
            self.out.push_str(RESET);
        } else {
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    fn end_code_block(&mut self) {
        let code = self.code_block.take().unwrap_or_default();
        for line in code.trim_end_matches('\n').lines() {
            let text = format!("{CODE_INDENT}{line}");
            self.emit_raw_line(text.trim_end(), CODE);
        }
        self.needs_blank = true;
    }

    fn rule(&mut self) {
        self.begin_block();
        let line = "─".repeat(self.content_width());
        self.emit_raw_line(&line, DIM);
        self.needs_blank = true;
    }

    fn end_table(&mut self) {
        let Some(table) = self.table.take() else {
            return;
        };
        let columns = table.rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0; columns];
        for row in &table.rows {
            for (idx, cell) in row.iter().enumerate() {
                widths[idx] = widths[idx].max(cell.width());
            }
        }

        for (row_idx, row) in table.rows.iter().enumerate() {
            let cells: Vec<String> = (0..columns)
                .map(|idx| {
                    let cell = row.get(idx).map(String::as_str).unwrap_or("");
                    let padding = widths[idx] - cell.width();
                    format!("{cell}{}", " ".repeat(padding))
                })
                .collect();
            let line = cells.join(" │ ");
            let style = if row_idx < table.header_rows { BOLD } else { "" };
            self.emit_raw_line(line.trim_end(), style);

            if row_idx + 1 == table.header_rows {
                let separator: Vec<String> = widths.iter().map(|width| "─".repeat(*width)).collect();
                self.emit_raw_line(&separator.join("─┼─"), DIM);
            }
        }
        self.needs_blank = true;
    }

    fn finish(mut self) -> String {
        self.break_line();
        self.out
    }
}

fn heading_depth(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
