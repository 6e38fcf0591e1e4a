use std::path::Path;

use clap::Parser;
use notesync_core::config::FirebaseConfig;
use notesync_core::sync::BootstrapSource;
use notesync_core::{Note, NoteId, NoteList};

use crate::cli::{Cli, Commands, CompletionShell};
use crate::commands::common::{
    format_note_lines, normalize_note_identifier, note_preview, note_to_list_item,
    require_text, resolve_data_dir, resolve_note_id, resolve_note_text,
};
use crate::commands::completions::render_completions;
use crate::commands::config::merge_firebase_config;
use crate::commands::sync::describe_bootstrap;
use crate::config_profiles::CliProfile;
use crate::error::CliError;

fn sample_notes() -> NoteList {
    NoteList::from_notes([
        Note::new("1712000000002", "Groceries\nmilk, eggs"),
        Note::new("1712000000001", "Call the plumber"),
        Note::new("1699999999999", "Old idea"),
    ])
}

#[test]
fn require_text_keeps_whitespace_and_rejects_blank() {
    assert_eq!(require_text("  hello  ".to_string()).unwrap(), "  hello  ");
    assert!(matches!(
        require_text(" \n\t ".to_string()),
        Err(CliError::EmptyText)
    ));
}

#[test]
fn resolve_note_text_joins_words() {
    let parts = vec!["buy".to_string(), "more".to_string(), "coffee".to_string()];
    assert_eq!(resolve_note_text(&parts).unwrap(), "buy more coffee");
    let padded = vec![" indented".to_string(), "line\n".to_string()];
    assert_eq!(resolve_note_text(&padded).unwrap(), " indented line\n");
    assert!(matches!(
        resolve_note_text(&[" ".to_string()]),
        Err(CliError::EmptyText)
    ));
}

#[test]
fn normalize_note_identifier_rejects_empty() {
    assert!(matches!(
        normalize_note_identifier(" \n "),
        Err(CliError::EmptyNoteId)
    ));
    assert_eq!(normalize_note_identifier("  t1  ").unwrap(), "t1");
}

#[test]
fn note_preview_truncates_with_ellipsis() {
    let note = Note::new("t1", "This is a very long sentence that should be shortened");
    assert_eq!(note_preview(&note, 20), "This is a very lo...");
}

#[test]
fn note_preview_uses_first_line_only() {
    let note = Note::new("t1", "  Title   with  gaps \nbody");
    assert_eq!(note_preview(&note, 40), "Title with gaps");
}

#[test]
fn resolve_note_id_prefers_exact_match() {
    let notes = NoteList::from_notes([Note::new("t1", "a"), Note::new("t10", "b")]);
    assert_eq!(resolve_note_id("t1", &notes).unwrap(), NoteId::new("t1"));
}

#[test]
fn resolve_note_id_accepts_unique_prefix() {
    assert_eq!(
        resolve_note_id("1699", &sample_notes()).unwrap(),
        NoteId::new("1699999999999")
    );
}

#[test]
fn resolve_note_id_reports_ambiguous_prefix() {
    let error = resolve_note_id("1712", &sample_notes()).unwrap_err();
    let CliError::AmbiguousNoteId(message) = error else {
        panic!("expected ambiguity error");
    };
    assert!(message.contains("1712000000002"));
    assert!(message.contains("1712000000001"));
}

#[test]
fn resolve_note_id_reports_missing_note() {
    assert!(matches!(
        resolve_note_id("zzz", &sample_notes()),
        Err(CliError::NoteNotFound(id)) if id == "zzz"
    ));
}

#[test]
fn format_note_lines_keep_list_order() {
    let lines = format_note_lines(sample_notes().as_slice());
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("1712000000002  Groceries"));
    assert!(lines[2].starts_with("1699999999999  Old idea"));
}

#[test]
fn list_items_serialize_full_text() {
    let item = note_to_list_item(&Note::new("t1", "Groceries\nmilk"));
    let json = serde_json::to_value(&item).unwrap();
    assert_eq!(json["id"], "t1");
    assert_eq!(json["preview"], "Groceries");
    assert_eq!(json["text"], "Groceries\nmilk");
}

#[test]
fn merge_firebase_config_prefers_flags_then_env_then_stored() {
    let explicit = FirebaseConfig {
        project_id: Some("from-flag".to_string()),
        ..FirebaseConfig::default()
    };
    let env = FirebaseConfig {
        project_id: Some("from-env".to_string()),
        api_key: Some("env-key".to_string()),
        ..FirebaseConfig::default()
    };
    let stored = FirebaseConfig {
        api_key: Some("stored-key".to_string()),
        firestore_url: Some("http://localhost:8080/v1".to_string()),
        ..FirebaseConfig::default()
    };

    let merged = merge_firebase_config(explicit, env, stored);
    assert_eq!(merged.project_id.as_deref(), Some("from-flag"));
    assert_eq!(merged.api_key.as_deref(), Some("env-key"));
    assert_eq!(merged.firestore_url.as_deref(), Some("http://localhost:8080/v1"));

    let profile = CliProfile::from(&merged);
    assert_eq!(profile.stored_firebase_config(), merged);
}

#[test]
fn describe_bootstrap_names_the_source() {
    assert!(describe_bootstrap("work", BootstrapSource::Remote { count: 3 }).contains("synced 3"));
    assert!(
        describe_bootstrap("work", BootstrapSource::Snapshot { count: 2 }).contains("2 locally")
    );
    assert!(describe_bootstrap("work", BootstrapSource::Empty).contains("no local cache"));
}

#[test]
fn resolve_data_dir_prefers_explicit_path() {
    let resolved = resolve_data_dir(Some(Path::new("/tmp/notesync-data")), "work").unwrap();
    assert_eq!(resolved, Path::new("/tmp/notesync-data"));
}

#[test]
fn cli_parses_edit_with_multiword_text() {
    let cli = Cli::try_parse_from(["notesync", "--profile", "work", "edit", "t1", "hello", "there"])
        .unwrap();
    assert_eq!(cli.profile.as_deref(), Some("work"));
    let Some(Commands::Edit { id, text }) = cli.command else {
        panic!("expected edit command");
    };
    assert_eq!(id, "t1");
    assert_eq!(text, vec!["hello".to_string(), "there".to_string()]);
}

#[test]
fn cli_requires_text_for_edit() {
    assert!(Cli::try_parse_from(["notesync", "edit", "t1"]).is_err());
}

#[test]
fn cli_parses_add_with_optional_text() {
    let cli = Cli::try_parse_from(["notesync", "add", "--text", "first thought"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Add { text: Some(ref text) }) if text == "first thought"
    ));
}

#[test]
fn completions_mention_binary_name() {
    let rendered = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(rendered.contains("notesync"));
}
