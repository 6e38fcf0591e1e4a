use std::path::Path;

use crate::commands::common::{format_note_lines, note_to_list_item, open_workspace, NoteListItem};
use crate::error::CliError;

pub async fn run_list(
    as_json: bool,
    profile: Option<&str>,
    data_dir: Option<&Path>,
) -> Result<(), CliError> {
    let workspace = open_workspace(profile, data_dir).await?;
    let notes = workspace.controller.notes();

    if as_json {
        let json_items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if notes.is_empty() {
        println!("No notes yet. Run `notesync add` to create one.");
    } else {
        for line in format_note_lines(notes.as_slice()) {
            println!("{line}");
        }
    }

    Ok(())
}
