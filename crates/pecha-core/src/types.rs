// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Pecha ebook pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{PechaError, Result};

// -- Works --------------------------------------------------------------------

/// Where a work part sits inside an item: a volume and an inclusive page range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkLocation {
    pub volume: u32,
    pub start_page: u32,
    /// Inclusive. Equal to `start_page` for single-page parts.
    pub end_page: u32,
}

impl WorkLocation {
    pub fn new(volume: u32, start_page: u32, end_page: u32) -> Self {
        Self {
            volume,
            start_page,
            end_page,
        }
    }

    /// A part occupying exactly one page.
    pub fn single_page(volume: u32, page: u32) -> Self {
        Self::new(volume, page, page)
    }
}

/// An abstract bibliographic text, possibly composed of nested parts.
///
/// Built fresh from the resource accessor for every unit and never mutated
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Work {
    pub id: String,
    pub title: Option<String>,
    /// Primary-name of the main author, already resolved to display text.
    pub author: Option<String>,
    /// `None` when the record has no location or an unusable one.
    pub location: Option<WorkLocation>,
    pub parts: Vec<Work>,
}

impl Work {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_location(mut self, location: WorkLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_part(mut self, part: Work) -> Self {
        self.parts.push(part);
        self
    }

    /// Direct parts located in `volume`.
    pub fn parts_in_volume(&self, volume: u32) -> impl Iterator<Item = &Work> {
        self.parts
            .iter()
            .filter(move |part| part.location.is_some_and(|loc| loc.volume == volume))
    }
}

// -- Pagination ---------------------------------------------------------------

/// One physical page's slice of the linear text.
///
/// Lines and characters are 1-indexed; characters count Unicode code points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMarker {
    pub sequence: u32,
    pub start_line: u32,
    pub start_char: u32,
    pub end_line: u32,
    pub end_char: u32,
}

impl PageMarker {
    /// `(line, column)` at which this page begins.
    pub fn start(&self) -> (u32, u32) {
        (self.start_line, self.start_char)
    }
}

/// Page markers of one etext, ascending by sequence.
///
/// An empty table is valid and means the text is unpaginated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTable {
    markers: Vec<PageMarker>,
}

impl PageTable {
    /// Sort `markers` by sequence and check that the table is usable.
    ///
    /// Sequence numbers need not be contiguous but must be unique, and start
    /// positions must strictly increase with the sequence.
    pub fn new(mut markers: Vec<PageMarker>) -> Result<Self> {
        markers.sort_by_key(|m| m.sequence);

        for pair in markers.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.sequence == next.sequence {
                return Err(PechaError::InconsistentPageTable(format!(
                    "page {} appears more than once",
                    next.sequence
                )));
            }
            if prev.start() >= next.start() {
                return Err(PechaError::InconsistentPageTable(format!(
                    "page {} starts at {:?}, not after page {} at {:?}",
                    next.sequence,
                    next.start(),
                    prev.sequence,
                    prev.start()
                )));
            }
        }

        Ok(Self { markers })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn markers(&self) -> &[PageMarker] {
        &self.markers
    }
}

// -- Documents ----------------------------------------------------------------

/// One serialized volume, ready for the output pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// File stem, already capped to the configured byte ceiling.
    pub name: String,
    pub title: String,
    /// 1-based volume number.
    pub volume: u32,
    pub total_volumes: u32,
    pub author: Option<String>,
    /// Display name of the distributor that input the text.
    pub inputter: Option<String>,
    /// Text was produced by OCR rather than manual input.
    pub ocr: bool,
    /// Heading-structured markdown body.
    pub body: String,
}

impl Document {
    /// The cover request the output pipeline hands to the cover generator.
    pub fn cover_request(&self) -> CoverRequest {
        CoverRequest {
            title: self.title.clone(),
            author: self.author.clone(),
            inputter: self.inputter.clone(),
            volume: (self.total_volumes > 1).then_some(self.volume),
        }
    }
}

/// Data needed to render a cover image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverRequest {
    pub title: String,
    pub author: Option<String>,
    pub inputter: Option<String>,
    /// Only set for multi-volume items.
    pub volume: Option<u32>,
}

/// Artifact formats the output pipeline can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Markdown,
    Epub,
    Docx,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Epub => "epub",
            Self::Docx => "docx",
        }
    }

    /// Subdirectory of the output directory holding this format.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Epub => "epub",
            Self::Docx => "docx",
        }
    }

    /// Whether producing this format needs the external converter.
    pub fn needs_converter(&self) -> bool {
        !matches!(self, Self::Markdown)
    }
}
