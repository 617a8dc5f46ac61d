// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document serializer: section forest → heading-structured markdown.
//
// Headings are `#` repeated (base depth + tree depth) times. Leaf text is
// written verbatim except for injected section breaks, which keep any single
// rendered section below the configured size.

use pecha_core::PechaConfig;
use unicode_normalization::char::is_combining_mark;

use crate::sections::{SectionBody, SectionForest};

/// Empty heading injected between chunks of a long leaf.
///
/// Removing every occurrence restores the leaf text exactly.
pub const SECTION_BREAK: &str = "\n\n### {.empty}\n\n";

/// Serializer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownOptions {
    /// Heading depth of root sections.
    pub base_depth: usize,
    /// Code points per chunk before a section break.
    pub max_section_chars: usize,
    /// Blank line after every N lines of leaf text.
    pub lines_per_paragraph: Option<usize>,
}

impl MarkdownOptions {
    pub fn from_config(config: &PechaConfig) -> Self {
        Self {
            base_depth: 2,
            max_section_chars: config.max_section_chars.max(1),
            lines_per_paragraph: config.lines_per_paragraph.filter(|&n| n > 0),
        }
    }
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self::from_config(&PechaConfig::default())
    }
}

/// Render `forest` depth first.
pub fn write_sections(forest: &SectionForest, options: &MarkdownOptions) -> String {
    let mut out = String::new();
    for (depth, id) in forest.walk() {
        let section = forest.get(id);

        out.push_str(&heading(options.base_depth + depth, section.title.as_deref()));
        out.push_str("\n\n");
        if let Some(author) = &section.author {
            out.push_str(&author_line(author));
            out.push_str("\n\n");
        }
        if let SectionBody::Leaf(text) = &section.body {
            write_leaf(&mut out, text, options);
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push('\n');
        }
    }
    out
}

/// `##… title`, or a bare `##…` when the section is untitled.
pub fn heading(depth: usize, title: Option<&str>) -> String {
    let marks = "#".repeat(depth.max(1));
    match title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) => format!("{marks} {title}"),
        None => marks,
    }
}

pub fn author_line(author: &str) -> String {
    format!("[{author}]{{.author}}")
}

/// Append `text`, injecting [`SECTION_BREAK`] whenever the running code-point
/// count has reached the threshold before the next line or piece.
///
/// A count equal to the threshold already triggers the break.
pub fn write_leaf(out: &mut String, text: &str, options: &MarkdownOptions) {
    let limit = options.max_section_chars.max(1);
    let mut count = 0usize;
    let mut lines_written = 0usize;

    for line in text.split_inclusive('\n') {
        for piece in split_long(line, limit) {
            if count >= limit {
                out.push_str(SECTION_BREAK);
                count = 0;
            }
            out.push_str(piece);
            count += piece.chars().count();
        }

        lines_written += 1;
        if let Some(every) = options.lines_per_paragraph
            && lines_written % every == 0
            && line.ends_with('\n')
        {
            out.push('\n');
        }
    }
}

/// Split `line` into pieces of at most `limit` code points, cutting only
/// before a code point that does not combine with its predecessor. A run of
/// combining marks longer than `limit` stays whole.
fn split_long(line: &str, limit: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut count = 0;
    let mut last_cut = None;

    for (offset, ch) in line.char_indices() {
        if offset > start && !is_combining_mark(ch) {
            last_cut = Some(offset);
        }
        if count >= limit
            && let Some(cut) = last_cut
        {
            pieces.push(&line[start..cut]);
            count = line[cut..offset].chars().count();
            start = cut;
            last_cut = None;
        }
        count += 1;
    }
    pieces.push(&line[start..]);
    pieces
}
