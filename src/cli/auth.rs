//! CLI command: `opspilot auth`
//!
//! Lists, imports, selects and removes stored credential profiles. Tokens
//! are only ever printed masked.

use super::AuthCommand;
use crate::config::AppConfig;
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use opspilot_llm::util::mask_optional;
use opspilot_llm::{
    AuthEnv, AuthProfile, AuthProfiles, Error, NativeImporter, ProfileStore, ProviderKind,
    TolerantImporter,
};

/// Run the auth subcommand.
pub fn run(command: AuthCommand, config: &AppConfig) -> Result<()> {
    let auth_env = AuthEnv::system();
    let store = match &config.llm.auth_store_path {
        Some(path) => ProfileStore::open(path.clone()),
        None => ProfileStore::from_env(&auth_env)?,
    };

    match command {
        AuthCommand::List => {
            let profiles = store.load()?;
            print!("{}", render_list(&profiles, auth_env.clock.now()));
        }
        AuthCommand::ImportNative { path, default } => {
            let profile = NativeImporter::new(auth_env)
                .import(path.as_deref())
                .context("Native credential import failed")?;
            let id = save_imported(&store, profile, default)?;
            println!("Imported {id} into {}", store.path().display());
        }
        AuthCommand::Import {
            path,
            provider,
            profile,
            default,
        } => {
            let imported = TolerantImporter::new(auth_env)
                .import(path.as_deref(), &provider, profile.as_deref())
                .context("Credential import failed")?;
            let id = save_imported(&store, imported, default)?;
            println!("Imported {id} into {}", store.path().display());
        }
        AuthCommand::Use {
            provider,
            profile_id,
        } => {
            set_default(&store, &provider, &profile_id)?;
            println!("Default for {provider} is now {profile_id}");
        }
        AuthCommand::Remove { profile_id } => {
            remove(&store, &profile_id)?;
            println!("Removed {profile_id}");
        }
    }
    Ok(())
}

/// Upsert an imported profile, optionally making it the provider default
fn save_imported(store: &ProfileStore, profile: AuthProfile, make_default: bool) -> Result<String> {
    let id = profile.id.clone();
    let provider = profile.provider.clone();
    store.update(|profiles| {
        profiles.upsert(profile)?;
        if make_default {
            profiles.set_default(provider, id.clone());
        }
        Ok(())
    })?;
    Ok(id)
}

fn set_default(store: &ProfileStore, provider: &str, profile_id: &str) -> Result<()> {
    let kind: ProviderKind = provider.parse()?;
    store.update(|profiles| {
        let profile = profiles
            .get(profile_id)
            .ok_or_else(|| Error::ProfileNotFound {
                provider: kind.to_string(),
                profile_id: Some(profile_id.to_string()),
            })?;
        if profile.provider != kind.as_str() {
            return Err(Error::InvalidInput(format!(
                "profile {profile_id} belongs to {}, not {kind}",
                profile.provider
            )));
        }
        profiles.set_default(kind.as_str(), profile_id);
        Ok(())
    })?;
    Ok(())
}

fn remove(store: &ProfileStore, profile_id: &str) -> Result<()> {
    store.update(|profiles| {
        profiles
            .remove(profile_id)
            .map(|_| ())
            .ok_or_else(|| Error::InvalidInput(format!("no profile with id {profile_id}")))
    })?;
    Ok(())
}

fn render_list(profiles: &AuthProfiles, now: DateTime<Utc>) -> String {
    if profiles.is_empty() {
        return "No stored profiles. Run `opspilot auth import-native` or `opspilot auth import`.\n"
            .to_string();
    }

    let mut out = format!(
        "  {:<36} {:<14} {:<16} {}\n",
        "Profile", "Provider", "Token", "Expiry"
    );
    for profile in &profiles.profiles {
        let is_default = profiles.defaults.get(&profile.provider) == Some(&profile.id);
        out.push_str(&format!(
            "{} {:<36} {:<14} {:<16} {}\n",
            if is_default { "*" } else { " " },
            profile.id,
            profile.provider,
            mask_optional(profile.access_token.as_deref()),
            describe_expiry(profile, now),
        ));
    }
    out
}

fn describe_expiry(profile: &AuthProfile, now: DateTime<Utc>) -> String {
    match profile.expires_at {
        None => "never".to_string(),
        Some(at) if profile.is_expired(now) => {
            format!("expired {}", at.to_rfc3339_opts(SecondsFormat::Secs, true))
        }
        Some(at) => format!("valid until {}", at.to_rfc3339_opts(SecondsFormat::Secs, true)),
    }
}
