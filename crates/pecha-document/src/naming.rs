// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document names: stable, file-system safe and capped in UTF-8 length.

use pecha_core::PechaConfig;

/// Inputs to [`document_name`].
#[derive(Debug, Clone, Copy)]
pub struct NameParts<'a> {
    /// Resource id of the item or etext.
    pub id: &'a str,
    pub title: &'a str,
    pub volume: u32,
    pub total_volumes: u32,
    pub ocr: bool,
}

/// `[ocr prefix]{id}[_vol_N] {title}`, capped to `config.max_name_bytes`.
///
/// With `title_as_filename` the title takes the place of the id and is not
/// repeated. Departing from the plain formula, the `" " + title` tail is
/// also left out when the title is empty or equal to the id.
pub fn document_name(parts: NameParts<'_>, config: &PechaConfig) -> String {
    let mut name = String::new();
    if parts.ocr {
        name.push_str(&config.ocr_name_prefix);
    }

    let title = parts.title.trim();
    if config.title_as_filename && !title.is_empty() {
        name.push_str(title);
    } else {
        name.push_str(parts.id);
    }
    if parts.total_volumes > 1 {
        name.push_str(&format!("_vol_{}", parts.volume));
    }
    if !config.title_as_filename && !title.is_empty() && title != parts.id {
        name.push(' ');
        name.push_str(title);
    }

    let name = sanitize(&name);
    truncate_utf8(&name, config.max_name_bytes).to_string()
}

/// Longest prefix of `s` whose UTF-8 encoding fits in `max_bytes`.
pub fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Replace characters that cannot appear in a file name.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect()
}
