use notesync_core::auth::IdentityProvider;

use crate::auth::{auth_client_for_profile, clear_stored_session, load_stored_session};
use crate::cli::AuthCommands;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;

    match command {
        AuthCommands::Signup {
            profile,
            email,
            password,
        } => {
            let profile_name = config.resolve_profile_name(profile.as_deref().or(global_profile));
            let client = configured_client(&config, &profile_name)?;
            let identity = client
                .sign_up(&email, &password)
                .await
                .map_err(|error| CliError::Auth(error.to_string()))?;
            let email_label = identity.email.as_deref().unwrap_or("(no email)");
            println!("Created account and signed in profile '{profile_name}' as {email_label}");
            Ok(())
        }
        AuthCommands::Login {
            profile,
            email,
            password,
        } => {
            let profile_name = config.resolve_profile_name(profile.as_deref().or(global_profile));
            let client = configured_client(&config, &profile_name)?;
            let identity = client
                .sign_in(&email, &password)
                .await
                .map_err(|error| CliError::Auth(error.to_string()))?;
            let email_label = identity.email.as_deref().unwrap_or("(no email)");
            println!("Signed in profile '{profile_name}' as {email_label}");
            Ok(())
        }
        AuthCommands::Status { profile } => {
            let profile_name = config.resolve_profile_name(profile.as_deref().or(global_profile));
            let Some(profile) = config.profile(&profile_name) else {
                println!("Profile '{profile_name}' is not configured.");
                return Ok(());
            };

            let firebase = profile.firebase_config();
            let session = if firebase.api_key().is_some() {
                auth_client_for_profile(&profile_name, &firebase)?
                    .restore_session()
                    .await
                    .map_err(|error| CliError::Auth(error.to_string()))?
            } else {
                load_stored_session(&profile_name)
                    .map_err(|error| CliError::Auth(error.to_string()))?
            };

            if let Some(session) = session {
                let email_label = session.identity.email.as_deref().unwrap_or("(no email)");
                println!(
                    "Profile '{}' is signed in as {} (user_id={}, expires_at={})",
                    profile_name, email_label, session.identity.user_id, session.expires_at
                );
            } else {
                println!("Profile '{profile_name}' is not signed in.");
            }
            Ok(())
        }
        AuthCommands::Logout { profile } => {
            let profile_name = config.resolve_profile_name(profile.as_deref().or(global_profile));
            let firebase = config
                .profile(&profile_name)
                .map(|profile| profile.firebase_config());

            match firebase {
                Some(firebase) if firebase.api_key().is_some() => {
                    auth_client_for_profile(&profile_name, &firebase)?
                        .sign_out()
                        .await
                        .map_err(|error| CliError::Auth(error.to_string()))?;
                }
                _ => clear_stored_session(&profile_name)
                    .map_err(|error| CliError::Auth(error.to_string()))?,
            }

            println!("Signed out profile '{profile_name}'");
            Ok(())
        }
    }
}

fn configured_client(
    config: &CliProfilesConfig,
    profile_name: &str,
) -> Result<crate::auth::ProfileAuthClient, CliError> {
    let profile = config.profile(profile_name).ok_or_else(|| {
        CliError::Config(format!(
            "Profile '{profile_name}' is not configured. Run `notesync config init --profile {profile_name}` first."
        ))
    })?;
    auth_client_for_profile(profile_name, &profile.firebase_config())
}
