use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tokio::time::Instant;

use crate::encode::{encode_csv, encode_json};
use crate::error::AppError;
use crate::models::{PostRecord, UploadReceipt};
use crate::params::{CollectionParams, ParamsSource};
use crate::store::PostStore;
use crate::traits::{FeedSource, PageExtractor, Uploader};
use crate::util::{batch_file_stem, destination_path};

/// Pause after each scroll so the feed can render new posts.
pub const DEFAULT_SETTLE_INTERVAL: Duration = Duration::from_secs(1);

/// Where a collector is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Configuring,
    Running,
    Flushing,
    Done,
    /// A cycle or flush failed; the run stopped without a final flush.
    Aborted,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Configuring => write!(f, "configuring"),
            Phase::Running => write!(f, "running"),
            Phase::Flushing => write!(f, "flushing"),
            Phase::Done => write!(f, "done"),
            Phase::Aborted => write!(f, "aborted"),
        }
    }
}

/// Why a run stopped collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TargetReached,
    TimeBudgetSpent,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::TargetReached => write!(f, "target reached"),
            StopReason::TimeBudgetSpent => write!(f, "time budget spent"),
        }
    }
}

/// Events emitted by the collector for monitoring/logging.
#[derive(Debug, Clone)]
pub enum CollectorEvent<'a> {
    Started {
        context: &'a str,
        params: &'a CollectionParams,
    },
    CycleCompleted {
        cycle: u64,
        fresh: usize,
        batch_len: usize,
        total: usize,
    },
    Uploaded {
        receipt: &'a UploadReceipt,
    },
    Flushed {
        batch: u64,
        records: usize,
        collected: usize,
    },
    FlushSkipped,
    Finished {
        reason: StopReason,
        total: usize,
        batches: u64,
    },
    Aborted {
        error: &'a AppError,
        unflushed: usize,
    },
}

/// Trait for receiving collector events (decoupled logging).
pub trait CollectorReporter: Send + Sync {
    fn report(&self, event: CollectorEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCollectorReporter;

impl CollectorReporter for TracingCollectorReporter {
    fn report(&self, event: CollectorEvent<'_>) {
        match event {
            CollectorEvent::Started { context, params } => {
                tracing::info!(
                    %context,
                    total_secs = params.total_time.as_secs_f64(),
                    target = params.target_posts,
                    batch_secs = params.batch_time.as_secs_f64(),
                    batch_size = params.batch_size,
                    scroll_px = params.scroll_distance,
                    "Collection started"
                );
            }
            CollectorEvent::CycleCompleted {
                cycle,
                fresh,
                batch_len,
                total,
            } => {
                tracing::debug!(%cycle, %fresh, %batch_len, %total, "Cycle completed");
            }
            CollectorEvent::Uploaded { receipt } => {
                tracing::info!(path = %receipt.path, sha = ?receipt.sha, "Uploaded");
            }
            CollectorEvent::Flushed {
                batch,
                records,
                collected,
            } => {
                tracing::info!(%batch, %records, %collected, "Batch flushed");
            }
            CollectorEvent::FlushSkipped => {
                tracing::debug!("Batch timer elapsed with nothing to flush");
            }
            CollectorEvent::Finished {
                reason,
                total,
                batches,
            } => {
                tracing::info!(%reason, %total, %batches, "Collection finished");
            }
            CollectorEvent::Aborted { error, unflushed } => {
                tracing::error!(%error, %unflushed, "Collection aborted, active batch not flushed");
            }
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Every distinct record, in collection order.
    pub records: Vec<PostRecord>,
    pub batches: u64,
    pub uploads: Vec<UploadReceipt>,
    pub reason: StopReason,
    pub elapsed: Duration,
}

/// Scrolls a feed, harvests posts, and uploads them in batches.
///
/// All run state (store, active batch, counters) lives on the instance, so
/// independent collectors never share anything.
pub struct Collector<F, X, U, R = TracingCollectorReporter>
where
    F: FeedSource,
    X: PageExtractor,
    U: Uploader,
    R: CollectorReporter,
{
    feed: F,
    extractor: X,
    uploader: U,
    reporter: R,
    context: String,
    settle: Duration,
    phase: Phase,
    store: PostStore,
    batch: Vec<PostRecord>,
    collected: usize,
    batches: u64,
    uploads: Vec<UploadReceipt>,
}

impl<F, X, U> Collector<F, X, U, TracingCollectorReporter>
where
    F: FeedSource,
    X: PageExtractor,
    U: Uploader,
{
    /// Create an idle collector for the feed identified by `context`.
    pub fn new(feed: F, extractor: X, uploader: U, context: impl Into<String>) -> Self {
        Self::with_reporter(feed, extractor, uploader, context, TracingCollectorReporter)
    }
}

impl<F, X, U, R> Collector<F, X, U, R>
where
    F: FeedSource,
    X: PageExtractor,
    U: Uploader,
    R: CollectorReporter,
{
    pub fn with_reporter(
        feed: F,
        extractor: X,
        uploader: U,
        context: impl Into<String>,
        reporter: R,
    ) -> Self {
        Self {
            feed,
            extractor,
            uploader,
            reporter,
            context: context.into(),
            settle: DEFAULT_SETTLE_INTERVAL,
            phase: Phase::Idle,
            store: PostStore::new(),
            batch: Vec::new(),
            collected: 0,
            batches: 0,
            uploads: Vec::new(),
        }
    }

    pub fn with_settle_interval(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// Everything harvested so far, flushed or not.
    pub fn store(&self) -> &PostStore {
        &self.store
    }

    /// Records collected but not yet flushed.
    pub fn pending(&self) -> &[PostRecord] {
        &self.batch
    }

    /// Ask `source` for the run's parameters.
    ///
    /// Returns `Ok(None)` and goes back to `Idle` if the operator cancels.
    pub fn configure<P: ParamsSource>(
        &mut self,
        source: &mut P,
    ) -> Result<Option<CollectionParams>, AppError> {
        self.ensure_startable()?;
        self.phase = Phase::Configuring;
        match source.acquire() {
            Ok(Some(params)) => Ok(Some(params)),
            Ok(None) => {
                self.phase = Phase::Idle;
                Ok(None)
            }
            Err(e) => {
                self.phase = Phase::Idle;
                Err(e)
            }
        }
    }

    /// Collect until the target count or the time budget is reached.
    ///
    /// Any error aborts the run without flushing the active batch. A
    /// collector runs once; build a new one for the next run.
    pub async fn run(&mut self, params: CollectionParams) -> Result<RunSummary, AppError> {
        self.ensure_startable()?;
        self.phase = Phase::Running;
        self.reporter.report(CollectorEvent::Started {
            context: &self.context,
            params: &params,
        });

        match self.collect(&params).await {
            Ok(summary) => {
                self.phase = Phase::Done;
                self.reporter.report(CollectorEvent::Finished {
                    reason: summary.reason,
                    total: summary.records.len(),
                    batches: summary.batches,
                });
                Ok(summary)
            }
            Err(e) => {
                self.phase = Phase::Aborted;
                self.reporter.report(CollectorEvent::Aborted {
                    error: &e,
                    unflushed: self.batch.len(),
                });
                Err(e)
            }
        }
    }

    async fn collect(&mut self, params: &CollectionParams) -> Result<RunSummary, AppError> {
        let started = Instant::now();
        let mut batch_started = started;
        let mut cycle: u64 = 0;

        let reason = loop {
            // The store counts flushed and pending records alike.
            if self.store.len() >= params.target_posts {
                break StopReason::TargetReached;
            }
            if started.elapsed() >= params.total_time {
                break StopReason::TimeBudgetSpent;
            }

            cycle += 1;
            self.feed.scroll_by(params.scroll_distance).await?;
            tokio::time::sleep(self.settle).await;
            let page = self.feed.snapshot().await?;
            let fresh = self.extractor.harvest(&page, &mut self.store)?;
            let fresh_count = fresh.len();
            self.batch.extend(fresh);

            self.reporter.report(CollectorEvent::CycleCompleted {
                cycle,
                fresh: fresh_count,
                batch_len: self.batch.len(),
                total: self.store.len(),
            });

            if should_flush(
                self.batch.len(),
                batch_started.elapsed(),
                params.batch_size,
                params.batch_time,
            ) {
                self.flush().await?;
                batch_started = Instant::now();
            }
        };

        if !self.batch.is_empty() {
            self.flush().await?;
        }

        Ok(RunSummary {
            records: self.store.records().to_vec(),
            batches: self.batches,
            uploads: self.uploads.clone(),
            reason,
            elapsed: started.elapsed(),
        })
    }

    fn ensure_startable(&self) -> Result<(), AppError> {
        if matches!(self.phase, Phase::Idle | Phase::Configuring) {
            Ok(())
        } else {
            Err(AppError::Generic(format!(
                "Collector for '{}' cannot start a run while {}",
                self.context, self.phase
            )))
        }
    }

    /// Encode the active batch, upload it as CSV then JSON, and clear it.
    async fn flush(&mut self) -> Result<(), AppError> {
        if self.batch.is_empty() {
            self.reporter.report(CollectorEvent::FlushSkipped);
            return Ok(());
        }

        self.phase = Phase::Flushing;
        let stem = batch_file_stem(&self.context, now_local(), self.batch.len());
        let files = [
            ("csv", encode_csv(&self.batch)?),
            ("json", encode_json(&self.batch)?),
        ];

        for (ext, body) in files {
            let filename = format!("{stem}.{ext}");
            let path = destination_path(&self.context, &filename);
            let message = format!(
                "Add {} r/{} posts ({})",
                self.batch.len(),
                self.context,
                filename
            );
            let receipt = self.uploader.upload(&path, &body, &message).await?;
            self.reporter.report(CollectorEvent::Uploaded { receipt: &receipt });
            self.uploads.push(receipt);
        }

        self.collected += self.batch.len();
        self.batches += 1;
        self.reporter.report(CollectorEvent::Flushed {
            batch: self.batches,
            records: self.batch.len(),
            collected: self.collected,
        });
        self.batch.clear();
        self.phase = Phase::Running;
        Ok(())
    }
}

/// Flush when the batch is full or has been open for its whole time slice.
pub fn should_flush(
    batch_len: usize,
    since_last_flush: Duration,
    batch_size: usize,
    batch_time: Duration,
) -> bool {
    batch_len >= batch_size || since_last_flush >= batch_time
}

fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}
