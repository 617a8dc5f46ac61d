// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixed-size batch worker pool.
//
// Workers pull unit ids from a shared queue until it is empty or the pool is
// stopped. Units are independent: a failing or panicking unit is recorded and
// its worker moves on. Stopping is checked between units only, so a unit that
// has started always runs to completion.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pecha_core::PechaConfig;
use pecha_core::error::{PechaError, Result};
use pecha_document::{DocumentAssembler, VolumeFailure};
use pecha_source::ResourceAccessor;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use crate::output::{OutputPipeline, RenderReport};

/// Cooperative stop signal shared by a runner and its callers.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a batch produced.
#[derive(Debug)]
pub struct BatchReport<T> {
    /// Finished units in completion order.
    pub completed: Vec<(String, T)>,
    /// Units whose task panicked.
    pub panicked: Vec<String>,
    /// Units never started because the pool was stopped.
    pub cancelled: Vec<String>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            completed: Vec::new(),
            panicked: Vec::new(),
            cancelled: Vec::new(),
        }
    }
}

/// Runs units on a fixed number of workers.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    workers: usize,
    shutdown: ShutdownHandle,
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self::new(default_workers())
    }
}

/// Hardware concurrency, or 1 when it cannot be determined.
pub fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

impl BatchRunner {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            shutdown: ShutdownHandle::default(),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Handle that stops the runner between units.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Process every id with `process` and wait for all workers to drain.
    #[instrument(skip(self, ids, process), fields(units = ids.len(), workers = self.workers))]
    pub async fn run<T, F, Fut>(&self, ids: Vec<String>, process: F) -> BatchReport<T>
    where
        T: Send + 'static,
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        for id in ids {
            // The receiver is alive until the end of this function.
            let _ = sender.send(id);
        }
        drop(sender);

        let queue = Arc::new(Mutex::new(receiver));
        let process = Arc::new(process);
        let mut workers = JoinSet::new();

        for worker in 0..self.workers {
            let queue = Arc::clone(&queue);
            let process = Arc::clone(&process);
            let shutdown = self.shutdown.clone();
            workers.spawn(async move { work(worker, queue, process, shutdown).await });
        }

        let mut report = BatchReport::default();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(partial) => {
                    report.completed.extend(partial.completed);
                    report.panicked.extend(partial.panicked);
                }
                Err(e) => error!(error = %e, "worker task failed"),
            }
        }

        let mut receiver = queue.lock().await;
        while let Ok(id) = receiver.try_recv() {
            report.cancelled.push(id);
        }

        info!(
            completed = report.completed.len(),
            panicked = report.panicked.len(),
            cancelled = report.cancelled.len(),
            "batch finished"
        );
        report
    }
}

async fn work<T, F, Fut>(
    worker: usize,
    queue: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    process: Arc<F>,
    shutdown: ShutdownHandle,
) -> BatchReport<T>
where
    T: Send + 'static,
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let mut report = BatchReport::default();
    loop {
        if shutdown.is_stopped() {
            debug!(worker, "stop requested");
            break;
        }
        let Some(id) = queue.lock().await.recv().await else {
            break;
        };

        debug!(worker, unit = %id, "unit started");
        match tokio::spawn(process(id.clone())).await {
            Ok(output) => report.completed.push((id, output)),
            Err(e) => {
                error!(worker, unit = %id, error = %e, "unit panicked");
                report.panicked.push(id);
            }
        }
    }
    report
}

// -- Document units -------------------------------------------------------------

/// Outcome of one resource id.
#[derive(Debug, Default)]
pub struct UnitSummary {
    pub renders: Vec<RenderReport>,
    pub volume_failures: Vec<VolumeFailure>,
}

impl UnitSummary {
    pub fn documents(&self) -> usize {
        self.renders.len()
    }
}

/// Assemble the documents of `id` and hand each to the output pipeline.
///
/// Assembly runs on the blocking pool; rendering runs on the runtime.
pub async fn process_unit(
    id: String,
    accessor: Arc<dyn ResourceAccessor>,
    config: Arc<PechaConfig>,
    pipeline: Arc<OutputPipeline>,
) -> Result<UnitSummary> {
    let unit = id.clone();
    let assembled = tokio::task::spawn_blocking(move || {
        DocumentAssembler::new(accessor.as_ref(), &config).assemble(&unit)
    })
    .await;
    let assembly = match assembled {
        Ok(result) => result.inspect_err(|e| warn!(unit = %id, error = %e, "unit failed"))?,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => return Err(PechaError::Io(std::io::Error::other(e))),
    };

    let mut summary = UnitSummary {
        renders: Vec::with_capacity(assembly.documents.len()),
        volume_failures: assembly.failures,
    };
    for document in &assembly.documents {
        summary.renders.push(pipeline.render(document).await);
    }
    Ok(summary)
}

/// Run `ids` through assembly and output on `runner`.
pub async fn generate(
    runner: &BatchRunner,
    ids: Vec<String>,
    accessor: Arc<dyn ResourceAccessor>,
    config: Arc<PechaConfig>,
    pipeline: Arc<OutputPipeline>,
) -> BatchReport<Result<UnitSummary>> {
    runner
        .run(ids, move |id| {
            process_unit(
                id,
                Arc::clone(&accessor),
                Arc::clone(&config),
                Arc::clone(&pipeline),
            )
        })
        .await
}
