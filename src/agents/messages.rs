//! Pipeline Control Messages
//!
//! Information Hiding:
//! - Progress is pushed over an mpsc channel owned by the caller
//! - Cancellation is a watch flag; the pipeline only sees `is_cancelled`/`cancelled`
//! - A control with no listener and no canceller is a valid no-op

use serde::Serialize;
use std::fmt;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Collection,
    Analysis,
    Visualization,
    ReportGen,
    Delivery,
    Complete,
}

impl PipelineStage {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::Collection => "Collecting data",
            PipelineStage::Analysis => "Analyzing with AI",
            PipelineStage::Visualization => "Building visualizations",
            PipelineStage::ReportGen => "Assembling report",
            PipelineStage::Delivery => "Delivering",
            PipelineStage::Complete => "Complete",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Emitted when the pipeline enters a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineEvent {
    pub stage: PipelineStage,
    /// Milliseconds since the run started
    pub elapsed_ms: u64,
}

/// Handle used by the caller to stop a running pipeline
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // send_replace never fails, even with no receivers left
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }
}

/// Progress sink plus cancellation flag for one pipeline run
#[derive(Debug)]
pub struct PipelineControl {
    progress: Option<mpsc::Sender<PipelineEvent>>,
    cancel: watch::Receiver<bool>,
    started: Instant,
}

impl PipelineControl {
    pub fn new() -> (Self, CancelHandle) {
        let (sender, cancel) = watch::channel(false);
        (
            Self {
                progress: None,
                cancel,
                started: Instant::now(),
            },
            CancelHandle { sender },
        )
    }

    /// Control that never reports progress and can never be cancelled
    pub fn detached() -> Self {
        Self::new().0
    }

    /// Attach a progress channel; the receiver is returned to the caller
    pub fn with_progress(mut self, buffer: usize) -> (Self, mpsc::Receiver<PipelineEvent>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        self.progress = Some(sender);
        (self, receiver)
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Resolves once cancellation is requested; pends forever if it never can be
    pub async fn cancelled(&self) {
        let mut cancel = self.cancel.clone();
        loop {
            if *cancel.borrow_and_update() {
                return;
            }
            if cancel.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    pub(crate) async fn emit(&self, stage: PipelineStage) {
        let event = PipelineEvent {
            stage,
            elapsed_ms: self.elapsed_ms(),
        };
        tracing::debug!("[Pipeline] Stage {:?} at {}ms", stage, event.elapsed_ms);

        if let Some(progress) = &self.progress {
            // A dropped receiver just means nobody is watching
            let _ = progress.send(event).await;
        }
    }
}

impl Default for PipelineControl {
    fn default() -> Self {
        Self::detached()
    }
}
