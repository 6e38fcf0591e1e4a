//! Outcome reporting for best-effort remote writes.

use std::fmt;

use tokio::task::JoinHandle;

use crate::models::NoteId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOp {
    Upsert,
    Delete,
}

impl fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upsert => f.write_str("upsert"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Nobody is signed in, so there is no remote owner.
    NoIdentity,
    /// The mutation did not change the list.
    NoChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorOutcome {
    Mirrored,
    /// The remote write failed. Local state was kept; nothing is retried.
    Failed(String),
    Skipped(SkipReason),
}

/// What happened to the remote half of one mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorReport {
    pub op: RemoteOp,
    pub note_id: NoteId,
    pub outcome: MirrorOutcome,
}

impl MirrorReport {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, MirrorOutcome::Failed(_))
    }
}

/// Receives every mirror report, including skipped ones.
///
/// Called from the task that ran the remote write, so implementations must
/// not block.
pub trait SyncObserver: Send + Sync {
    fn on_mirror(&self, report: &MirrorReport);
}

/// Logs reports through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn on_mirror(&self, report: &MirrorReport) {
        match &report.outcome {
            MirrorOutcome::Mirrored => {
                tracing::debug!("Mirrored {} of note {}", report.op, report.note_id);
            }
            MirrorOutcome::Failed(reason) => {
                tracing::warn!(
                    "Remote {} of note {} failed, local copy kept: {}",
                    report.op,
                    report.note_id,
                    reason
                );
            }
            MirrorOutcome::Skipped(reason) => {
                tracing::debug!(
                    "Skipped remote {} of note {} ({:?})",
                    report.op,
                    report.note_id,
                    reason
                );
            }
        }
    }
}

/// Handle on the remote half of a mutation.
///
/// Dropping it does not cancel the write; the task runs to completion and
/// still reports to the observer.
#[derive(Debug)]
pub struct PendingMirror {
    inner: PendingInner,
}

#[derive(Debug)]
enum PendingInner {
    Ready(MirrorReport),
    Running {
        op: RemoteOp,
        note_id: NoteId,
        handle: JoinHandle<MirrorReport>,
    },
}

impl PendingMirror {
    pub(crate) fn ready(report: MirrorReport) -> Self {
        Self {
            inner: PendingInner::Ready(report),
        }
    }

    pub(crate) fn running(
        op: RemoteOp,
        note_id: NoteId,
        handle: JoinHandle<MirrorReport>,
    ) -> Self {
        Self {
            inner: PendingInner::Running {
                op,
                note_id,
                handle,
            },
        }
    }

    /// Whether a remote write was started.
    pub const fn is_running(&self) -> bool {
        matches!(self.inner, PendingInner::Running { .. })
    }

    /// Wait for the remote write to finish.
    pub async fn wait(self) -> MirrorReport {
        match self.inner {
            PendingInner::Ready(report) => report,
            PendingInner::Running {
                op,
                note_id,
                handle,
            } => handle.await.unwrap_or_else(|error| MirrorReport {
                op,
                note_id,
                outcome: MirrorOutcome::Failed(format!("remote task aborted: {error}")),
            }),
        }
    }
}
