// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cover image generation.
//
// A white canvas with a coloured band along the bottom. The title is wrapped
// to the configured width and centred near the top; author and volume lines
// follow it, the inputter sits on the band and the logo near the bottom edge.
// A missing font or logo yields a plainer cover rather than an error.

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use pecha_core::config::CoverConfig;
use pecha_core::error::{PechaError, Result};
use pecha_core::tibetan::tibetan_number;
use pecha_core::{CoverRequest, PechaConfig};
use tracing::{debug, info, instrument, warn};

const TEXT_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
const LINE_SPACING: f32 = 1.4;
const SECONDARY_SCALE: f32 = 0.6;

/// Renders cover images for documents.
pub struct CoverGenerator {
    config: CoverConfig,
    volume_label: String,
    font: Option<FontVec>,
    logo: Option<RgbaImage>,
}

impl CoverGenerator {
    /// Build a generator from the configured font and logo files.
    ///
    /// Files that are missing or unreadable are logged and left out.
    pub fn new(config: &PechaConfig) -> Self {
        let font = config
            .output
            .document_file(&config.output.font_file)
            .and_then(|path| load_font(&path));
        let logo = config
            .output
            .document_file(&config.output.logo_file)
            .and_then(|path| load_logo(&path, config.cover.logo_width));

        Self {
            config: config.cover.clone(),
            volume_label: config.volume_label.clone(),
            font,
            logo,
        }
    }

    /// A generator that draws only the background and band.
    pub fn plain(config: &PechaConfig) -> Self {
        Self {
            config: config.cover.clone(),
            volume_label: config.volume_label.clone(),
            font: None,
            logo: None,
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw the cover for `request`.
    pub fn render(&self, request: &CoverRequest) -> RgbaImage {
        let cfg = &self.config;
        let [r, g, b] = cfg.background_color;
        let mut canvas = RgbaImage::from_pixel(cfg.width, cfg.height, Rgba([r, g, b, 255]));

        let band_height = cfg.band_height.min(cfg.height);
        let band_top = cfg.height - band_height;
        if band_height > 0 && cfg.width > 0 {
            let [r, g, b] = cfg.band_color;
            draw_filled_rect_mut(
                &mut canvas,
                Rect::at(0, band_top as i32).of_size(cfg.width, band_height),
                Rgba([r, g, b, 255]),
            );
        }

        if let Some(font) = &self.font {
            self.draw_text(&mut canvas, font, request, band_top);
        }

        if let Some(logo) = &self.logo {
            let x = (cfg.width.saturating_sub(logo.width()) / 2) as i64;
            imageops::overlay(&mut canvas, logo, x, cfg.logo_top as i64);
        }

        canvas
    }

    /// Render and save the cover as PNG.
    #[instrument(skip(self, request), fields(path = %path.as_ref().display()))]
    pub fn write_png(&self, request: &CoverRequest, path: impl AsRef<Path>) -> Result<()> {
        let canvas = self.render(request);
        canvas
            .save(path.as_ref())
            .map_err(|e| PechaError::CoverError(format!("failed to write cover: {e}")))?;
        info!(title = %request.title, "cover written");
        Ok(())
    }

    fn draw_text(&self, canvas: &mut RgbaImage, font: &FontVec, request: &CoverRequest, band_top: u32) {
        let cfg = &self.config;
        let title_scale = PxScale::from(cfg.title_font_size);
        let small_scale = PxScale::from(cfg.title_font_size * SECONDARY_SCALE);
        let line_height = (cfg.title_font_size * LINE_SPACING) as i32;
        let small_height = (cfg.title_font_size * SECONDARY_SCALE * LINE_SPACING) as i32;

        let measure = |text: &str| text_size(title_scale, font, text).0;
        let mut y = cfg.title_top as i32;
        for line in wrap_title(&request.title, cfg.title_width, measure) {
            self.centred(canvas, font, title_scale, &line, y);
            y += line_height;
        }

        y += small_height / 2;
        if let Some(author) = &request.author {
            self.centred(canvas, font, small_scale, author, y);
            y += small_height;
        }
        if let Some(volume) = request.volume {
            let line = format!("{} {}", self.volume_label, tibetan_number(volume));
            self.centred(canvas, font, small_scale, &line, y);
        }

        let mut band_y = band_top as i32 + small_height;
        if let Some(inputter) = &request.inputter {
            self.centred(canvas, font, small_scale, inputter, band_y);
            band_y += small_height;
        }
        if let Some(label) = &cfg.label {
            let y = if self.logo.is_some() {
                cfg.logo_top as i32 - small_height
            } else {
                band_y
            };
            self.centred(canvas, font, small_scale, label, y);
        }
    }

    fn centred(&self, canvas: &mut RgbaImage, font: &FontVec, scale: PxScale, text: &str, y: i32) {
        let (width, _) = text_size(scale, font, text);
        let x = (self.config.width as i32 - width as i32) / 2;
        draw_text_mut(canvas, TEXT_COLOR, x.max(0), y, scale, font, text);
    }
}

fn load_font(path: &Path) -> Option<FontVec> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cover font unavailable; covers will have no text");
            return None;
        }
    };
    match FontVec::try_from_vec(data) {
        Ok(font) => {
            debug!(path = %path.display(), "cover font loaded");
            Some(font)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cover font unreadable; covers will have no text");
            None
        }
    }
}

fn load_logo(path: &Path, width: u32) -> Option<RgbaImage> {
    let logo = match image::open(path) {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cover logo unavailable");
            return None;
        }
    };
    if width == 0 || logo.width() == 0 {
        return None;
    }
    let height = (logo.height() as u64 * width as u64 / logo.width() as u64).max(1) as u32;
    Some(imageops::resize(&logo, width, height, FilterType::Lanczos3))
}

// -- Title layout ---------------------------------------------------------------

fn is_tibetan(ch: char) -> bool {
    ('\u{0F00}'..='\u{0FFF}').contains(&ch)
}

/// Split a title so that Latin text following Tibetan text starts a new line.
pub fn split_scripts(title: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut seen_tibetan = false;

    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() && seen_tibetan {
            segments.push(std::mem::take(&mut current));
            seen_tibetan = false;
        }
        if is_tibetan(ch) {
            seen_tibetan = true;
        }
        current.push(ch);
    }
    segments.push(current);

    segments
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Greedy wrap of `title` to `max_width` as measured by `measure`.
///
/// Lines break after spaces and Tibetan syllable or clause marks. A single
/// token wider than `max_width` gets a line of its own.
pub fn wrap_title(title: &str, max_width: u32, measure: impl Fn(&str) -> u32) -> Vec<String> {
    let mut lines = Vec::new();

    for segment in split_scripts(title) {
        let mut line = String::new();
        for token in tokens(&segment) {
            let candidate = format!("{line}{token}");
            if !line.is_empty() && measure(candidate.trim_end()) > max_width {
                lines.push(line.trim_end().to_string());
                line = token.trim_start().to_string();
            } else {
                line = candidate;
            }
        }
        let line = line.trim_end();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    lines
}

fn tokens(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for (offset, ch) in text.char_indices() {
        if matches!(ch, ' ' | '་' | '།') {
            let end = offset + ch.len_utf8();
            out.push(&text[start..end]);
            start = end;
        }
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CoverRequest {
        CoverRequest {
            title: "བཀའ་འགྱུར། Kangyur".into(),
            author: Some("author".into()),
            inputter: Some("inputter".into()),
            volume: Some(3),
        }
    }

    #[test]
    fn latin_after_tibetan_starts_a_new_line() {
        assert_eq!(
            split_scripts("བཀའ་འགྱུར། Kangyur"),
            vec!["བཀའ་འགྱུར།".to_string(), "Kangyur".to_string()]
        );
        assert_eq!(split_scripts("Kangyur བཀའ"), vec!["Kangyur བཀའ".to_string()]);
    }

    #[test]
    fn wrap_breaks_at_syllables() {
        // One unit of width per code point.
        let measure = |s: &str| s.chars().count() as u32;
        let lines = wrap_title("ཀ་ཁ་ག་ང་", 4, measure);
        assert_eq!(lines, vec!["ཀ་ཁ་".to_string(), "ག་ང་".to_string()]);
    }

    #[test]
    fn wrap_keeps_oversized_tokens_whole() {
        let measure = |s: &str| s.chars().count() as u32;
        let lines = wrap_title("abcdefgh ij", 3, measure);
        assert_eq!(lines, vec!["abcdefgh".to_string(), "ij".to_string()]);
    }

    #[test]
    fn plain_cover_has_band_and_background() {
        let config = PechaConfig::default();
        let cover = CoverGenerator::plain(&config).render(&request());

        assert_eq!(cover.dimensions(), (1600, 2400));
        assert_eq!(cover.get_pixel(10, 10), &Rgba([255, 255, 255, 255]));
        assert_eq!(cover.get_pixel(10, 2399), &Rgba([255, 153, 0, 255]));
    }

    #[test]
    fn missing_files_degrade_to_plain_cover() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = PechaConfig::default();
        config.output.document_files_dir = Some(dir.path().to_path_buf());

        let generator = CoverGenerator::new(&config);
        assert!(!generator.has_font());

        let path = dir.path().join("cover.png");
        generator.write_png(&request(), &path).expect("write cover");
        let written = image::open(&path).expect("read back");
        assert_eq!(written.width(), 1600);
    }
}
