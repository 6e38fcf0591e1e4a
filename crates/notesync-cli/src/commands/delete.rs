use std::path::Path;

use crate::commands::common::{finish_mirror, open_workspace, resolve_note_id};
use crate::error::CliError;

pub async fn run_delete(
    id: &str,
    profile: Option<&str>,
    data_dir: Option<&Path>,
) -> Result<(), CliError> {
    let mut workspace = open_workspace(profile, data_dir).await?;
    let note_id = resolve_note_id(id, workspace.controller.notes())?;

    let receipt = workspace.controller.delete(&note_id).await?;
    finish_mirror(receipt.mirror).await;

    println!("{note_id}");
    Ok(())
}
