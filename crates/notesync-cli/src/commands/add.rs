use std::path::Path;

use notesync_core::sync::Change;

use crate::commands::common::{finish_mirror, open_workspace, require_text};
use crate::error::CliError;

/// Create a placeholder note, then apply `text` to it as an edit.
pub async fn run_add(
    text: Option<&str>,
    profile: Option<&str>,
    data_dir: Option<&Path>,
) -> Result<(), CliError> {
    let text = text.map(|raw| require_text(raw.to_string())).transpose()?;
    let mut workspace = open_workspace(profile, data_dir).await?;

    let created = workspace.controller.create().await?;
    let Change::Created(id) = created.change else {
        return Err(CliError::Config("Note creation did not produce an id".to_string()));
    };
    finish_mirror(created.mirror).await;

    if let Some(text) = text {
        let edited = workspace.controller.edit(&id, &text).await?;
        finish_mirror(edited.mirror).await;
    }

    println!("{id}");
    Ok(())
}
