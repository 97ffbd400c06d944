//! Workflow states and the per-run summary.

use std::fmt;

use crate::locate::LocateStats;

/// Where a label resolution run is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WorkflowState {
    /// Waiting for the labels to show up in the store
    #[default]
    PendingLabels,
    /// Document with labels read
    LabelsReady,
    /// Resolving and writing labels
    Resolving,
    /// Finished
    Done,
    /// Labels never appeared
    Aborted,
}

impl WorkflowState {
    /// Allowed forward moves.
    pub fn can_transition_to(self, next: WorkflowState) -> bool {
        use WorkflowState::*;
        matches!(
            (self, next),
            (PendingLabels, LabelsReady)
                | (PendingLabels, Aborted)
                | (LabelsReady, Resolving)
                | (Resolving, Done)
        )
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowState::PendingLabels => "PENDING_LABELS",
            WorkflowState::LabelsReady => "LABELS_READY",
            WorkflowState::Resolving => "RESOLVING",
            WorkflowState::Done => "DONE",
            WorkflowState::Aborted => "ABORTED",
        };
        f.write_str(name)
    }
}

/// What one run did. Returned instead of kept in shared counters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub image_id: String,
    pub state: WorkflowState,
    /// Store reads spent polling for labels
    pub poll_attempts: u32,
    pub labels_seen: usize,
    /// Labels that got exact coordinates staged
    pub labels_resolved: usize,
    pub labels_skipped: usize,
    /// Resolved labels with an address match
    pub addresses_matched: usize,
    pub locate: LocateStats,
    pub writes_failed: usize,
    /// Address text promoted to the image document
    pub promoted_address: Option<String>,
}

impl RunSummary {
    pub fn new(image_id: &str) -> Self {
        Self {
            image_id: image_id.to_string(),
            ..Self::default()
        }
    }

    /// Move to `next`, logging the transition. Invalid moves are ignored.
    pub(crate) fn transition(&mut self, next: WorkflowState) {
        if !self.state.can_transition_to(next) {
            log::error!(
                "[{}] invalid transition {} -> {}",
                self.image_id,
                self.state,
                next
            );
            return;
        }
        log::debug!("[{}] {} -> {}", self.image_id, self.state, next);
        self.state = next;
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "image {} {}: {}/{} labels resolved ({} skipped, {} addressed), \
             hits {} misses {} escalations {}, {} writes failed",
            self.image_id,
            self.state,
            self.labels_resolved,
            self.labels_seen,
            self.labels_skipped,
            self.addresses_matched,
            self.locate.intersections.hits,
            self.locate.intersections.misses,
            self.locate.escalations,
            self.writes_failed
        )
    }
}
