// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pecha: ebook sources from bibliographic records
//
// Entry point. Initialises logging, loads configuration, opens the resource
// store and runs every requested id through the batch pool. Without ids the
// store's items are scanned.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use pecha_core::error::Result;
use pecha_core::{OutputFormat, PechaConfig};
use pecha_pipeline::{BatchRunner, OutputPipeline, default_workers, generate};
use pecha_source::{FileStore, ResourceKind};
use tracing::{error, info, warn};

/// Generate markdown, EPUB and DOCX sources for items and etexts.
#[derive(Debug, Parser)]
#[command(name = "pecha", version, about)]
struct Args {
    /// Root of the resource store.
    data_dir: PathBuf,

    /// Item or etext ids; all items in the store when omitted.
    ids: Vec<String>,

    /// Parent of the timestamped run directory.
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Configuration file.
    #[arg(short, long, default_value = "config/pecha.json")]
    config: PathBuf,

    /// Directory with the stylesheet template, font, reference doc and logo.
    #[arg(long)]
    document_files: Option<PathBuf>,

    /// Also produce EPUB.
    #[arg(long)]
    epub: bool,

    /// Also produce DOCX.
    #[arg(long)]
    docx: bool,

    /// Number of workers (default: available cores).
    #[arg(short = 'j', long)]
    workers: Option<usize>,

    /// Name files after the title instead of the resource id.
    #[arg(long)]
    title_as_filename: bool,

    /// Code points per section before a break is injected.
    #[arg(long)]
    max_section_chars: Option<usize>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!("pecha starting");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "run aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = Arc::new(build_config(&args)?);
    let store = FileStore::new(&args.data_dir);

    let ids = if args.ids.is_empty() {
        let ids = store.list_ids(ResourceKind::Item)?;
        info!(items = ids.len(), root = %args.data_dir.display(), "scanned store");
        ids
    } else {
        args.ids.clone()
    };
    if ids.is_empty() {
        warn!("nothing to do");
        return Ok(());
    }

    let run_dir = run_directory(&args.output);
    let pipeline = Arc::new(OutputPipeline::new(&run_dir, Arc::clone(&config))?);
    info!(out_dir = %run_dir.display(), units = ids.len(), "writing documents");

    let runner = BatchRunner::new(args.workers.unwrap_or_else(default_workers));
    let shutdown = runner.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; finishing units in progress");
            shutdown.stop();
        }
    });

    let report = generate(&runner, ids, Arc::new(store), config, pipeline).await;

    let mut documents = 0;
    let mut failed_units = 0;
    let mut failed_formats = 0;
    for (id, result) in &report.completed {
        match result {
            Ok(summary) => {
                documents += summary.documents();
                failed_formats += summary.renders.iter().map(|r| r.failures.len()).sum::<usize>();
                for failure in &summary.volume_failures {
                    warn!(unit = %id, volume = failure.volume, error = %failure.error, "volume skipped");
                }
            }
            Err(e) => {
                failed_units += 1;
                warn!(unit = %id, error = %e, recoverable = e.is_recoverable(), "unit failed");
            }
        }
    }
    for id in &report.panicked {
        error!(unit = %id, "unit panicked");
    }

    info!(
        documents,
        failed_units,
        failed_formats,
        panicked = report.panicked.len(),
        cancelled = report.cancelled.len(),
        out_dir = %run_dir.display(),
        "done"
    );
    Ok(())
}

fn build_config(args: &Args) -> Result<PechaConfig> {
    let mut config = PechaConfig::load_or_default(&args.config)?;

    if let Some(dir) = &args.document_files {
        config.output.document_files_dir = Some(dir.clone());
    }
    if args.title_as_filename {
        config.title_as_filename = true;
    }
    if let Some(chars) = args.max_section_chars {
        config.max_section_chars = chars;
    }
    for (enabled, format) in [(args.epub, OutputFormat::Epub), (args.docx, OutputFormat::Docx)] {
        if enabled && !config.output.formats.contains(&format) {
            config.output.formats.push(format);
        }
    }
    if !config.output.formats.contains(&OutputFormat::Markdown) {
        config.output.formats.insert(0, OutputFormat::Markdown);
    }

    config.validate()?;
    Ok(config)
}

/// `{parent}/{YYYY-MM-DD HH-MM-SS}`.
fn run_directory(parent: &Path) -> PathBuf {
    parent.join(chrono::Local::now().format("%Y-%m-%d %H-%M-%S").to_string())
}
