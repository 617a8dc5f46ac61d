// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pecha-document: Turns resources and volume text into documents.
//
// `pages` maps a page table onto the raw lines of a volume, `sections`
// resolves a work's parts against that map, `markdown` flattens the result
// into heading-structured text and `naming` computes the file stem. The
// `assemble` module drives all four for one resource id; `cover` draws the
// cover image handed to the output pipeline.

pub mod assemble;
pub mod cover;
pub mod markdown;
pub mod naming;
pub mod pages;
pub mod sections;

pub use assemble::{Assembly, DocumentAssembler, VolumeFailure};
pub use cover::CoverGenerator;
pub use markdown::{MarkdownOptions, SECTION_BREAK, write_sections};
pub use naming::{NameParts, document_name, truncate_utf8};
pub use pages::{MappedText, PageContentMap, map_pages};
pub use sections::{Section, SectionBody, SectionForest, SectionId, build_sections};
