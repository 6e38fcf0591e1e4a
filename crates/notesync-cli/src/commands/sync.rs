use std::path::Path;

use notesync_core::sync::BootstrapSource;

use crate::commands::common::open_workspace;
use crate::error::CliError;

pub async fn run_sync(profile: Option<&str>, data_dir: Option<&Path>) -> Result<(), CliError> {
    let workspace = open_workspace(profile, data_dir).await?;
    println!(
        "{}",
        describe_bootstrap(&workspace.profile_name, workspace.source)
    );
    Ok(())
}

pub fn describe_bootstrap(profile_name: &str, source: BootstrapSource) -> String {
    match source {
        BootstrapSource::Remote { count } => {
            format!("Profile '{profile_name}' synced {count} notes from Firebase")
        }
        BootstrapSource::Snapshot { count } => format!(
            "Remote unavailable; profile '{profile_name}' is using {count} locally cached notes"
        ),
        BootstrapSource::Empty => {
            format!("Remote unavailable and no local cache for profile '{profile_name}'")
        }
    }
}
