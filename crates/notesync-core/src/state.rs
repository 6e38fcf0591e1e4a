//! Shared state types published to UI layers.

/// Health of the remote mirror as seen by the local client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncState {
    /// Signed out, or the last bootstrap fell back to the local snapshot.
    #[default]
    Offline,
    /// Bootstrap is fetching the remote set.
    Syncing,
    /// Remote bootstrap succeeded and every mirror write since has landed.
    Synced,
    /// A mirror write failed after the last successful bootstrap; the remote
    /// copy may lag local truth until the next full refetch.
    Error,
}
