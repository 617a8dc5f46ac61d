// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration, loaded from a JSON file.
//
// Data that used to live in code (the distributor table, the set of OCR
// distributors, transliteration schemes) is configuration here so that a
// new distributor never needs a rebuild.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PechaError, Result};
use crate::types::OutputFormat;

/// Settings shared by every stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PechaConfig {
    /// Language tag requested for titles and names.
    pub preferred_language: String,
    /// Language tag → transliteration-scheme tags accepted in its place.
    pub transliterations: BTreeMap<String, Vec<String>>,
    /// Distributor code → display name shown as the inputter.
    pub distributors: BTreeMap<String, String>,
    /// Distributor codes whose texts are OCR output.
    pub ocr_distributors: BTreeSet<String>,
    /// Characters per leaf chunk before a section break is injected.
    pub max_section_chars: usize,
    /// Insert a blank line after this many lines of leaf text.
    pub lines_per_paragraph: Option<usize>,
    /// Ceiling on the UTF-8 length of a document name.
    pub max_name_bytes: usize,
    /// Prepended to the names of OCR documents.
    pub ocr_name_prefix: String,
    /// Use the title instead of the resource id as the stable part of names.
    pub title_as_filename: bool,
    /// Heading of the single section emitted for unstructured volumes.
    pub fallback_title: String,
    /// Word printed before the volume number in multi-volume headings.
    pub volume_label: String,
    /// Markdown block placed after the volume heading of every item document.
    pub terms_markdown: Option<String>,
    pub output: OutputConfig,
    pub cover: CoverConfig,
}

impl Default for PechaConfig {
    fn default() -> Self {
        let mut transliterations = BTreeMap::new();
        transliterations.insert("bo".to_string(), vec!["bo-x-ewts".to_string()]);

        Self {
            preferred_language: "bo".into(),
            transliterations,
            distributors: BTreeMap::new(),
            ocr_distributors: BTreeSet::new(),
            max_section_chars: 50_000,
            lines_per_paragraph: None,
            max_name_bytes: 240,
            ocr_name_prefix: "OCR_".into(),
            title_as_filename: false,
            fallback_title: "The Text {.enHeader}".into(),
            volume_label: "པོད".into(),
            terms_markdown: None,
            output: OutputConfig::default(),
            cover: CoverConfig::default(),
        }
    }
}

impl PechaConfig {
    /// Load a configuration file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Reject values that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.max_section_chars == 0 {
            return Err(PechaError::Config("max_section_chars must be positive".into()));
        }
        if self.max_name_bytes == 0 {
            return Err(PechaError::Config("max_name_bytes must be positive".into()));
        }
        if self.lines_per_paragraph == Some(0) {
            return Err(PechaError::Config("lines_per_paragraph must be positive".into()));
        }
        if self.preferred_language.is_empty() {
            return Err(PechaError::Config("preferred_language must not be empty".into()));
        }
        Ok(())
    }

    /// Display name for a distributor code, if the code is known.
    pub fn distributor_name(&self, code: &str) -> Option<&str> {
        self.distributors.get(code).map(String::as_str)
    }

    pub fn is_ocr_distributor(&self, code: &str) -> bool {
        self.ocr_distributors.contains(code)
    }
}

/// Where and how artifacts are produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Explicit path to the converter; searched on `PATH` when unset.
    pub converter_path: Option<PathBuf>,
    /// Directory holding the stylesheet template, font, reference doc and logo.
    pub document_files_dir: Option<PathBuf>,
    pub stylesheet_template: String,
    pub font_file: String,
    pub font_name: String,
    pub reference_doc: String,
    pub logo_file: String,
    pub formats: Vec<OutputFormat>,
    /// Upper bound on a single converter invocation.
    pub converter_timeout_secs: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            converter_path: None,
            document_files_dir: None,
            stylesheet_template: "epub.css".into(),
            font_file: "NotoSansTibetan-Regular.ttf".into(),
            font_name: "NotoSansTibetan-Regular".into(),
            reference_doc: "reference.docx".into(),
            logo_file: "logo.png".into(),
            formats: vec![OutputFormat::Markdown],
            converter_timeout_secs: 300,
        }
    }
}

impl OutputConfig {
    /// Resolve a file inside the document-files directory.
    pub fn document_file(&self, file_name: &str) -> Option<PathBuf> {
        self.document_files_dir.as_ref().map(|dir| dir.join(file_name))
    }
}

/// Cover canvas geometry and colours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverConfig {
    pub width: u32,
    pub height: u32,
    pub title_width: u32,
    pub title_top: u32,
    pub title_font_size: f32,
    pub band_height: u32,
    pub band_color: [u8; 3],
    pub background_color: [u8; 3],
    pub logo_top: u32,
    pub logo_width: u32,
    /// Text printed beside the logo.
    pub label: Option<String>,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 2400,
            title_width: 1200,
            title_top: 200,
            title_font_size: 90.0,
            band_height: 800,
            band_color: [255, 153, 0],
            background_color: [255, 255, 255],
            logo_top: 2200,
            logo_width: 200,
            label: None,
        }
    }
}
