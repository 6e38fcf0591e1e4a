use std::path::Path;

use crate::commands::common::{finish_mirror, open_workspace, resolve_note_id, resolve_note_text};
use crate::error::CliError;

pub async fn run_edit(
    id: &str,
    text_parts: &[String],
    profile: Option<&str>,
    data_dir: Option<&Path>,
) -> Result<(), CliError> {
    let text = resolve_note_text(text_parts)?;
    let mut workspace = open_workspace(profile, data_dir).await?;
    let note_id = resolve_note_id(id, workspace.controller.notes())?;

    let receipt = workspace.controller.edit(&note_id, &text).await?;
    finish_mirror(receipt.mirror).await;

    println!("{note_id}");
    Ok(())
}
