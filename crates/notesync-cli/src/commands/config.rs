use notesync_core::config::FirebaseConfig;

use crate::cli::ConfigCommands;
use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            api_key,
            project_id,
            auth_url,
            token_url,
            firestore_url,
            no_activate,
        } => {
            let explicit = FirebaseConfig {
                api_key,
                project_id,
                auth_url,
                token_url,
                firestore_url,
            };
            run_config_init(profile.as_deref().or(global_profile), explicit, no_activate)
        }
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    explicit: FirebaseConfig,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let existing = config
        .profile(&profile_name)
        .map(CliProfile::stored_firebase_config)
        .unwrap_or_default();

    let merged = merge_firebase_config(explicit, FirebaseConfig::from_env(), existing);
    merged
        .validate()
        .map_err(|error| CliError::Config(error.to_string()))?;
    *config.profile_mut_or_default(&profile_name) = CliProfile::from(&merged);

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let missing_fields = merged.missing_fields();
    if missing_fields.is_empty() {
        println!(
            "Profile '{profile_name}' is ready. Run `notesync auth login --email <email> --password <password>`."
        );
    } else {
        println!(
            "Profile '{}' is missing: {}",
            profile_name,
            missing_fields.join(", ")
        );
    }

    Ok(())
}

/// Flags win over environment variables, which win over stored values.
pub fn merge_firebase_config(
    explicit: FirebaseConfig,
    env: FirebaseConfig,
    existing: FirebaseConfig,
) -> FirebaseConfig {
    explicit.or(env).or(existing)
}

impl From<&FirebaseConfig> for CliProfile {
    fn from(firebase: &FirebaseConfig) -> Self {
        Self {
            api_key: firebase.api_key.clone(),
            project_id: firebase.project_id.clone(),
            auth_url: firebase.auth_url.clone(),
            token_url: firebase.token_url.clone(),
            firestore_url: firebase.firestore_url.clone(),
        }
    }
}
