// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pecha-pipeline: Output pipeline and batch worker pool.

pub mod output;
pub mod pool;

pub use output::{Artifact, FormatFailure, OutputPipeline, RenderReport, find_converter};
pub use pool::{
    BatchReport, BatchRunner, ShutdownHandle, UnitSummary, default_workers, generate, process_unit,
};
