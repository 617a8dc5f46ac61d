// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page content mapping.
//
// Walks the lines of a volume code point by code point and splits the text at
// every page marker's start position. Produces the page-annotated text (an
// inline ` \[N\] ` at each page start) and the page → slice map used by the
// section builder.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use pecha_core::{PageMarker, PageTable};
use tracing::debug;

/// Page sequence number → exact text of that page.
///
/// Every line contributes its code points followed by a `\n`. Text before the
/// first marker is kept as the preamble, so `concat()` always reproduces the
/// mapped text exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContentMap {
    preamble: String,
    pages: BTreeMap<u32, String>,
}

impl PageContentMap {
    /// Text preceding the first page marker.
    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    pub fn page(&self, sequence: u32) -> Option<&str> {
        self.pages.get(&sequence).map(String::as_str)
    }

    pub fn contains(&self, sequence: u32) -> bool {
        self.pages.contains_key(&sequence)
    }

    /// Number of pages that received content.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Preamble plus every page in ascending sequence order.
    pub fn concat(&self) -> String {
        let mut out = self.preamble.clone();
        for text in self.pages.values() {
            out.push_str(text);
        }
        out
    }

    /// Text of pages `start..=end`, or `None` if either endpoint is absent.
    ///
    /// Sequence gaps inside the range are fine; every page present in the
    /// range is included.
    pub fn slice_range(&self, start: u32, end: u32) -> Option<String> {
        if start > end || !self.contains(start) || !self.contains(end) {
            return None;
        }
        Some(self.pages.range(start..=end).map(|(_, text)| text.as_str()).collect())
    }
}

/// Output of [`map_pages`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedText {
    /// The text with ` \[N\] ` inserted at the start of every page.
    pub annotated: String,
    pub pages: PageContentMap,
}

/// Split `lines` into pages according to `table`.
///
/// A marker fires at the first position at or after its `(line, column)`
/// start. Column `len + 1` of a line is its terminator, so a page starting
/// on an empty line opens there. Markers beyond the end of the text never
/// fire and their pages stay absent from the map.
pub fn map_pages(lines: &[String], table: &PageTable) -> MappedText {
    let capacity = lines.iter().map(|l| l.len() + 1).sum::<usize>();
    let mut cursor = PageCursor::new(table.markers(), capacity);

    for (index, line) in lines.iter().enumerate() {
        let line_no = (index + 1) as u32;
        let mut column = 1u32;
        for ch in line.chars() {
            cursor.advance((line_no, column));
            cursor.push(ch);
            column += 1;
        }
        cursor.advance((line_no, column));
        cursor.push('\n');
    }

    cursor.finish()
}

/// The volume text without page information: lines joined by `\n`.
pub fn plain_text(lines: &[String]) -> String {
    lines.join("\n")
}

struct PageCursor<'a> {
    markers: &'a [PageMarker],
    next: usize,
    annotated: String,
    preamble: String,
    pages: BTreeMap<u32, String>,
    current: Option<(u32, String)>,
}

impl<'a> PageCursor<'a> {
    fn new(markers: &'a [PageMarker], capacity: usize) -> Self {
        Self {
            markers,
            next: 0,
            annotated: String::with_capacity(capacity + markers.len() * 8),
            preamble: String::new(),
            pages: BTreeMap::new(),
            current: None,
        }
    }

    /// Open every page whose start is at or before `position`.
    fn advance(&mut self, position: (u32, u32)) {
        while let Some(&marker) = self.markers.get(self.next)
            && marker.start() <= position
        {
            self.open(marker.sequence);
            self.next += 1;
        }
    }

    fn open(&mut self, sequence: u32) {
        self.close();
        self.current = Some((sequence, String::new()));
        let _ = write!(self.annotated, " \\[{sequence}\\] ");
    }

    fn close(&mut self) {
        if let Some((sequence, text)) = self.current.take() {
            self.pages.insert(sequence, text);
        }
    }

    fn push(&mut self, ch: char) {
        self.annotated.push(ch);
        match &mut self.current {
            Some((_, text)) => text.push(ch),
            None => self.preamble.push(ch),
        }
    }

    fn finish(mut self) -> MappedText {
        self.close();
        let unfired = self.markers.len() - self.next;
        if unfired > 0 {
            debug!(unfired, "page markers past the end of the text");
        }
        MappedText {
            annotated: self.annotated,
            pages: PageContentMap {
                preamble: self.preamble,
                pages: self.pages,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(sequence: u32, line: u32, column: u32) -> PageMarker {
        PageMarker {
            sequence,
            start_line: line,
            start_char: column,
            end_line: line,
            end_char: column,
        }
    }

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn splits_pages_at_marker_positions() {
        let table = PageTable::new(vec![marker(1, 1, 1), marker(2, 2, 3)]).expect("table");
        let mapped = map_pages(&lines("abc\ndefg\nhi"), &table);

        assert_eq!(mapped.pages.page(1), Some("abc\nde"));
        assert_eq!(mapped.pages.page(2), Some("fg\nhi\n"));
        assert_eq!(mapped.annotated, " \\[1\\] abc\nde \\[2\\] fg\nhi\n");
    }

    #[test]
    fn columns_count_code_points_not_bytes() {
        // Each Tibetan letter is three UTF-8 bytes; the stack ཀྱ is two code points.
        let table = PageTable::new(vec![marker(1, 1, 1), marker(2, 1, 4)]).expect("table");
        let mapped = map_pages(&lines("ཀྱིས་"), &table);

        assert_eq!(mapped.pages.page(1), Some("ཀྱི"));
        assert_eq!(mapped.pages.page(2), Some("ས་\n"));
    }

    #[test]
    fn concatenation_reproduces_the_text() {
        let text = "ཀ་ཁ་ག\nང་ཅ\n\nཆ་ཇ་ཉ\nཏ";
        let table = PageTable::new(vec![
            marker(5, 1, 3),
            marker(9, 2, 2),
            marker(12, 3, 1),
            marker(13, 4, 6),
        ])
        .expect("table");
        let mapped = map_pages(&lines(text), &table);

        let expected: String = text.lines().map(|l| format!("{l}\n")).collect();
        assert_eq!(mapped.pages.concat(), expected);
        assert_eq!(mapped.pages.preamble(), "ཀ་");
    }

    #[test]
    fn empty_line_marker_fires_at_terminator() {
        let table = PageTable::new(vec![marker(1, 1, 1), marker(2, 2, 1)]).expect("table");
        let mapped = map_pages(&lines("ka\n\nkha"), &table);

        assert_eq!(mapped.pages.page(1), Some("ka\n"));
        assert_eq!(mapped.pages.page(2), Some("\nkha\n"));
    }

    #[test]
    fn out_of_range_column_fires_at_next_position() {
        let table = PageTable::new(vec![marker(1, 1, 1), marker(2, 1, 40)]).expect("table");
        let mapped = map_pages(&lines("ka\nkha"), &table);

        assert_eq!(mapped.pages.page(1), Some("ka\n"));
        assert_eq!(mapped.pages.page(2), Some("kha\n"));
    }

    #[test]
    fn markers_past_the_end_leave_pages_absent() {
        let table = PageTable::new(vec![marker(1, 1, 1), marker(2, 9, 1)]).expect("table");
        let mapped = map_pages(&lines("ka"), &table);

        assert!(mapped.pages.contains(1));
        assert!(!mapped.pages.contains(2));
    }

    #[test]
    fn empty_table_keeps_everything_in_the_preamble() {
        let mapped = map_pages(&lines("Hello\nWorld"), &PageTable::empty());
        assert!(mapped.pages.is_empty());
        assert_eq!(mapped.pages.concat(), "Hello\nWorld\n");
        assert_eq!(mapped.annotated, "Hello\nWorld\n");
    }

    #[test]
    fn mapping_is_deterministic() {
        let table = PageTable::new(vec![marker(1, 1, 2), marker(2, 2, 1)]).expect("table");
        let input = lines("abc\ndef");
        assert_eq!(map_pages(&input, &table), map_pages(&input, &table));
    }

    #[test]
    fn slice_range_is_inclusive_and_needs_both_endpoints() {
        let table =
            PageTable::new(vec![marker(1, 1, 1), marker(2, 2, 1), marker(4, 3, 1)]).expect("table");
        let pages = map_pages(&lines("a\nb\nc"), &table).pages;

        assert_eq!(pages.slice_range(1, 2).as_deref(), Some("a\nb\n"));
        assert_eq!(pages.slice_range(2, 2).as_deref(), Some("b\n"));
        assert_eq!(pages.slice_range(1, 4).as_deref(), Some("a\nb\nc\n"));
        assert_eq!(pages.slice_range(1, 3), None);
        assert_eq!(pages.slice_range(4, 1), None);
    }
}
