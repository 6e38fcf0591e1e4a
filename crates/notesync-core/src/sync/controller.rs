//! Local-first note controller.
//!
//! The controller owns the in-memory note list and is its only writer. Every
//! mutation writes the full serialized list to the local snapshot before the
//! in-memory list changes, then starts the remote write on a detached task.
//! Remote failures never roll back local state.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use super::mirror::{
    MirrorOutcome, MirrorReport, PendingMirror, RemoteOp, SkipReason, SyncObserver,
    TracingObserver,
};
use crate::auth::Identity;
use crate::config::SyncSettings;
use crate::models::{IdGenerator, Note, NoteId, NoteList, TimestampIds};
use crate::remote::{RemoteNoteDocument, RemoteNoteStore, RemoteResult};
use crate::snapshot::{decode_snapshot, encode_snapshot, SnapshotStore};
use crate::state::SyncState;
use crate::{Error, Result};

const MAX_ID_ATTEMPTS: usize = 1_000;

/// Read-only projection published to UI layers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotesView {
    pub identity: Option<Identity>,
    pub notes: Vec<Note>,
    pub sync_state: SyncState,
}

/// Which source became the active list during bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapSource {
    Remote { count: usize },
    Snapshot { count: usize },
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityTransition {
    SignedIn(BootstrapSource),
    SignedOut,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Created(NoteId),
    Edited(NoteId),
    Deleted(NoteId),
    /// The id was not in the list; nothing was written.
    Unchanged(NoteId),
}

/// Result of one mutation: the local change, already durable, and a handle on
/// its remote mirror.
#[derive(Debug)]
pub struct MutationReceipt {
    pub change: Change,
    pub mirror: PendingMirror,
}

pub struct NotesController {
    remote: Arc<dyn RemoteNoteStore>,
    snapshot: Arc<dyn SnapshotStore>,
    ids: Box<dyn IdGenerator>,
    observer: Arc<dyn SyncObserver>,
    settings: SyncSettings,
    identity: Option<Identity>,
    notes: NoteList,
    view: Arc<watch::Sender<NotesView>>,
}

impl NotesController {
    pub fn new(remote: Arc<dyn RemoteNoteStore>, snapshot: Arc<dyn SnapshotStore>) -> Self {
        let (view, _) = watch::channel(NotesView::default());
        Self {
            remote,
            snapshot,
            ids: Box::new(TimestampIds::new()),
            observer: Arc::new(TracingObserver),
            settings: SyncSettings::default(),
            identity: None,
            notes: NoteList::new(),
            view: Arc::new(view),
        }
    }

    #[must_use]
    pub fn with_id_generator(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: SyncSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<NotesView> {
        self.view.subscribe()
    }

    pub const fn notes(&self) -> &NoteList {
        &self.notes
    }

    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn sync_state(&self) -> SyncState {
        self.view.borrow().sync_state
    }

    /// React to the identity provider announcing `next`.
    ///
    /// Bootstrap runs only when an identity appears or is replaced by a
    /// different user. A failed bootstrap leaves the controller signed out,
    /// so announcing the same user again retries it. Signing out clears the
    /// in-memory list but leaves the snapshot alone.
    pub async fn apply_identity(&mut self, next: Option<Identity>) -> Result<IdentityTransition> {
        match (self.owner_id(), next) {
            (None, None) => Ok(IdentityTransition::Unchanged),
            (Some(current), Some(next)) if current == next.user_id => {
                self.identity = Some(next);
                self.publish();
                Ok(IdentityTransition::Unchanged)
            }
            (_, Some(next)) => {
                tracing::info!("Identity {} signed in", next.user_id);
                self.notes = NoteList::new();
                self.identity = Some(next);
                self.publish();
                match self.bootstrap().await {
                    Ok(source) => Ok(IdentityTransition::SignedIn(source)),
                    Err(error) => {
                        self.identity = None;
                        self.notes = NoteList::new();
                        self.publish();
                        self.set_sync_state(SyncState::Offline);
                        Err(error)
                    }
                }
            }
            (Some(_), None) => {
                tracing::info!("Signed out; clearing in-memory notes");
                self.identity = None;
                self.notes = NoteList::new();
                self.publish();
                self.set_sync_state(SyncState::Offline);
                Ok(IdentityTransition::SignedOut)
            }
        }
    }

    /// Apply every identity announced on `identities` until the sender is
    /// dropped. The value current at call time is applied first. Failed
    /// transitions are logged and the feed keeps being followed.
    pub async fn follow_identity(&mut self, mut identities: watch::Receiver<Option<Identity>>) {
        loop {
            let next = identities.borrow_and_update().clone();
            if let Err(error) = self.apply_identity(next).await {
                tracing::warn!("Identity transition failed: {}", error);
            }
            if identities.changed().await.is_err() {
                break;
            }
        }
    }

    /// Refetch the remote set for the current identity, replacing local state
    /// on success or reloading the snapshot on failure.
    pub async fn resync(&mut self) -> Result<BootstrapSource> {
        if self.identity.is_none() {
            return Err(Error::NotSignedIn);
        }
        self.bootstrap().await
    }

    /// Prepend a note with the placeholder text.
    pub async fn create(&mut self) -> Result<MutationReceipt> {
        let id = self.fresh_id()?;
        let note = Note::new(id.clone(), self.settings.placeholder_text.clone());
        let next = self.notes.created(note.clone());
        self.commit(next).await?;

        Ok(MutationReceipt {
            change: Change::Created(id),
            mirror: self.mirror_upsert(note),
        })
    }

    /// Replace the text of note `id`. Absent ids are a silent no-op.
    pub async fn edit(&mut self, id: &NoteId, text: &str) -> Result<MutationReceipt> {
        let Some(next) = self.notes.edited(id, text) else {
            return Ok(self.unchanged(RemoteOp::Upsert, id));
        };
        let note = Note::new(id.clone(), text);
        self.commit(next).await?;

        Ok(MutationReceipt {
            change: Change::Edited(id.clone()),
            mirror: self.mirror_upsert(note),
        })
    }

    /// Remove note `id`. Absent ids are a no-op.
    pub async fn delete(&mut self, id: &NoteId) -> Result<MutationReceipt> {
        let Some(next) = self.notes.deleted(id) else {
            return Ok(self.unchanged(RemoteOp::Delete, id));
        };
        self.commit(next).await?;

        Ok(MutationReceipt {
            change: Change::Deleted(id.clone()),
            mirror: self.mirror_delete(id.clone()),
        })
    }

    async fn bootstrap(&mut self) -> Result<BootstrapSource> {
        let Some(owner_id) = self.owner_id() else {
            return Err(Error::NotSignedIn);
        };
        self.set_sync_state(SyncState::Syncing);

        match self.remote.query_by_owner(&owner_id).await {
            Ok(notes) => {
                let list = NoteList::from_notes(notes);
                let count = list.len();
                if let Err(error) = self.commit(list).await {
                    self.set_sync_state(SyncState::Offline);
                    return Err(error);
                }
                self.set_sync_state(SyncState::Synced);
                tracing::info!("Bootstrapped {} notes from remote store", count);
                Ok(BootstrapSource::Remote { count })
            }
            Err(error) => {
                tracing::warn!(
                    "Remote fetch failed, falling back to local snapshot: {}",
                    error
                );
                self.set_sync_state(SyncState::Offline);
                self.load_snapshot().await
            }
        }
    }

    async fn load_snapshot(&mut self) -> Result<BootstrapSource> {
        let slot = self.settings.snapshot_slot.as_str();
        let Some(raw) = self.snapshot.read_slot(slot).await? else {
            self.notes = NoteList::new();
            self.publish();
            tracing::info!("No local snapshot in slot {}; starting empty", slot);
            return Ok(BootstrapSource::Empty);
        };

        self.notes = decode_snapshot(&raw)?;
        self.publish();
        let count = self.notes.len();
        tracing::info!("Loaded {} notes from local snapshot", count);
        Ok(BootstrapSource::Snapshot { count })
    }

    /// Persist `next` to the snapshot, then make it the in-memory list. A
    /// failed write leaves both untouched.
    async fn commit(&mut self, next: NoteList) -> Result<()> {
        let serialized = encode_snapshot(&next)?;
        self.snapshot
            .write_slot(&self.settings.snapshot_slot, &serialized)
            .await?;
        self.notes = next;
        self.publish();
        Ok(())
    }

    fn fresh_id(&mut self) -> Result<NoteId> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = self.ids.next_id();
            if !self.notes.contains(&candidate) {
                return Ok(candidate);
            }
        }
        Err(Error::InvalidInput(
            "Id generator kept returning ids already in use".to_string(),
        ))
    }

    fn unchanged(&self, op: RemoteOp, id: &NoteId) -> MutationReceipt {
        let report = MirrorReport {
            op,
            note_id: id.clone(),
            outcome: MirrorOutcome::Skipped(SkipReason::NoChange),
        };
        self.observer.on_mirror(&report);
        MutationReceipt {
            change: Change::Unchanged(id.clone()),
            mirror: PendingMirror::ready(report),
        }
    }

    fn mirror_upsert(&self, note: Note) -> PendingMirror {
        let Some(owner_id) = self.owner_id() else {
            return self.skipped(RemoteOp::Upsert, note.id);
        };
        let remote = Arc::clone(&self.remote);
        let Note { id, text } = note;
        let target = id.clone();
        let document = RemoteNoteDocument {
            text,
            owner_id: owner_id.clone(),
        };
        self.spawn_mirror(RemoteOp::Upsert, id, owner_id, async move {
            remote.upsert(&target, &document).await
        })
    }

    fn mirror_delete(&self, id: NoteId) -> PendingMirror {
        let Some(owner_id) = self.owner_id() else {
            return self.skipped(RemoteOp::Delete, id);
        };
        let remote = Arc::clone(&self.remote);
        let target = id.clone();
        self.spawn_mirror(RemoteOp::Delete, id, owner_id, async move {
            remote.delete(&target).await
        })
    }

    fn spawn_mirror<F>(
        &self,
        op: RemoteOp,
        note_id: NoteId,
        owner_id: String,
        write: F,
    ) -> PendingMirror
    where
        F: Future<Output = RemoteResult<()>> + Send + 'static,
    {
        let observer = Arc::clone(&self.observer);
        let view = Arc::clone(&self.view);
        let report_id = note_id.clone();

        let handle = tokio::spawn(async move {
            let outcome = match write.await {
                Ok(()) => MirrorOutcome::Mirrored,
                Err(error) => {
                    mark_diverged(&view, &owner_id);
                    MirrorOutcome::Failed(error.to_string())
                }
            };
            let report = MirrorReport {
                op,
                note_id: report_id,
                outcome,
            };
            observer.on_mirror(&report);
            report
        });

        PendingMirror::running(op, note_id, handle)
    }

    fn skipped(&self, op: RemoteOp, note_id: NoteId) -> PendingMirror {
        let report = MirrorReport {
            op,
            note_id,
            outcome: MirrorOutcome::Skipped(SkipReason::NoIdentity),
        };
        self.observer.on_mirror(&report);
        PendingMirror::ready(report)
    }

    fn owner_id(&self) -> Option<String> {
        self.identity.as_ref().map(|identity| identity.user_id.clone())
    }

    fn publish(&self) {
        self.view.send_modify(|view| {
            view.identity.clone_from(&self.identity);
            view.notes = self.notes.as_slice().to_vec();
        });
    }

    fn set_sync_state(&self, state: SyncState) {
        self.view.send_if_modified(|view| {
            let changed = view.sync_state != state;
            view.sync_state = state;
            changed
        });
    }
}

/// A failed write only marks divergence while its owner is still the one
/// signed in and no refetch is running.
fn mark_diverged(view: &watch::Sender<NotesView>, owner_id: &str) {
    view.send_if_modified(|view| {
        let same_owner = view
            .identity
            .as_ref()
            .is_some_and(|identity| identity.user_id == owner_id);
        if same_owner && view.sync_state == SyncState::Synced {
            view.sync_state = SyncState::Error;
            true
        } else {
            false
        }
    });
}
