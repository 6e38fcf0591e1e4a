//! Local-first synchronization of one user's notes.

mod controller;
mod mirror;

pub use controller::{
    BootstrapSource, Change, IdentityTransition, MutationReceipt, NotesController, NotesView,
};
pub use mirror::{
    MirrorOutcome, MirrorReport, PendingMirror, RemoteOp, SkipReason, SyncObserver,
    TracingObserver,
};
