use std::path::{Path, PathBuf};
use std::sync::Arc;

use notesync_core::auth::TokenSource;
use notesync_core::config::SyncSettings;
use notesync_core::remote::FirestoreRemoteStore;
use notesync_core::snapshot::FileSnapshotStore;
use notesync_core::sync::{
    BootstrapSource, IdentityTransition, MirrorOutcome, MirrorReport, PendingMirror,
};
use notesync_core::{Note, NoteId, NoteList, NotesController};
use serde::Serialize;

use crate::auth::auth_client_for_profile;
use crate::config_profiles::{default_data_dir, CliProfilesConfig};
use crate::error::CliError;

const SHORT_ID_LEN: usize = 13;
const PREVIEW_LEN: usize = 40;

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub preview: String,
    pub text: String,
}

/// A signed-in profile with its notes bootstrapped.
pub struct Workspace {
    pub profile_name: String,
    pub controller: NotesController,
    pub source: BootstrapSource,
}

/// Restore the profile session and bootstrap its notes.
pub async fn open_workspace(
    global_profile: Option<&str>,
    data_dir: Option<&Path>,
) -> Result<Workspace, CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let firebase = config
        .profile(&profile_name)
        .cloned()
        .unwrap_or_default()
        .firebase_config();
    let project_id = firebase.project_id().ok_or_else(|| {
        CliError::Config(format!(
            "Profile '{profile_name}' is missing: {}. Run `notesync config init --profile {profile_name}` first.",
            firebase.missing_fields().join(", ")
        ))
    })?;

    let auth = Arc::new(auth_client_for_profile(&profile_name, &firebase)?);
    let session = auth
        .restore_session()
        .await
        .map_err(|error| CliError::Auth(error.to_string()))?
        .ok_or_else(|| CliError::NotSignedIn(profile_name.clone()))?;

    let settings = SyncSettings::default();
    let tokens: Arc<dyn TokenSource> = auth;
    let remote = FirestoreRemoteStore::new(
        firebase.firestore_url(),
        project_id,
        settings.collection.clone(),
        tokens,
    )?;
    let snapshot = FileSnapshotStore::new(resolve_data_dir(data_dir, &profile_name)?);

    let mut controller = NotesController::new(Arc::new(remote), Arc::new(snapshot))
        .with_settings(settings);
    let source = match controller.apply_identity(Some(session.identity)).await? {
        IdentityTransition::SignedIn(source) => source,
        IdentityTransition::SignedOut | IdentityTransition::Unchanged => {
            return Err(CliError::NotSignedIn(profile_name));
        }
    };
    tracing::debug!("Profile {} bootstrapped from {:?}", profile_name, source);

    Ok(Workspace {
        profile_name,
        controller,
        source,
    })
}

pub fn resolve_data_dir(explicit: Option<&Path>, profile_name: &str) -> Result<PathBuf, CliError> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_data_dir(profile_name).map_err(CliError::Config),
    }
}

/// Match `query` against an exact id first, then a unique id prefix.
pub fn resolve_note_id(query: &str, notes: &NoteList) -> Result<NoteId, CliError> {
    let query = normalize_note_identifier(query)?;
    let exact = NoteId::new(query.clone());
    if notes.contains(&exact) {
        return Ok(exact);
    }

    let matching = notes
        .iter()
        .filter(|note| note.id.as_str().starts_with(&query))
        .map(|note| note.id.clone())
        .take(3)
        .collect::<Vec<_>>();

    match matching.as_slice() {
        [] => Err(CliError::NoteNotFound(query)),
        [only] => Ok(only.clone()),
        _ => {
            let options = matching
                .iter()
                .map(short_id)
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousNoteId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

/// Wait for the remote write and tell the user when it did not land.
pub async fn finish_mirror(mirror: PendingMirror) -> MirrorReport {
    let report = mirror.wait().await;
    if let MirrorOutcome::Failed(reason) = &report.outcome {
        eprintln!(
            "Warning: saved locally, but the remote {} failed: {reason}. Run `notesync sync` to reconcile.",
            report.op
        );
    }
    report
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    notes
        .iter()
        .map(|note| {
            let id = short_id(&note.id);
            let preview = note_preview(note, PREVIEW_LEN);
            format!("{id:<13}  {preview}")
        })
        .collect()
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    NoteListItem {
        id: note.id.to_string(),
        preview: note_preview(note, PREVIEW_LEN),
        text: note.text.clone(),
    }
}

pub fn note_preview(note: &Note, max_chars: usize) -> String {
    let first_line = note.text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

fn short_id(id: &NoteId) -> String {
    id.as_str().chars().take(SHORT_ID_LEN).collect()
}

/// Join positional words into note text.
pub fn resolve_note_text(parts: &[String]) -> Result<String, CliError> {
    require_text(parts.join(" "))
}

/// Reject blank text; anything else is stored exactly as given.
pub fn require_text(text: String) -> Result<String, CliError> {
    if text.trim().is_empty() {
        Err(CliError::EmptyText)
    } else {
        Ok(text)
    }
}

pub fn normalize_note_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyNoteId)
    } else {
        Ok(trimmed.to_string())
    }
}
