// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pecha: Core types, error definitions and configuration shared across all crates.

pub mod config;
pub mod error;
pub mod tibetan;
pub mod types;

pub use config::PechaConfig;
pub use error::PechaError;
pub use types::*;
