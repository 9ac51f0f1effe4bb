// src/bin/seed_credentials.rs
//! Seed a vault with a handful of demo credentials for UI development

use anyhow::{Context, Result};
use passwault::{load_config, CredentialStore, MasterSecret, UserPassword, VaultError};
use rpassword::prompt_password;
use tracing::{info, warn};

const DEMO_CREDENTIALS: &[(&str, &str, &str, &str)] = &[
    ("testwebsite.com", "testuser", "testpassword", "Test credentials"),
    ("test2_website.com", "testuser2", "testpassword2", "Test credentials 2"),
    ("test_website", "test_user", "test_password", "Test credentials"),
    ("test3_website.com", "testuser3", "testpassword3", "Test credentials 3"),
];

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = load_config().context("Failed to load configuration")?;

    let master_secret = match config.master_secret() {
        Ok(secret) => secret,
        Err(_) => MasterSecret::new(prompt_password("Master secret: ")?),
    };

    info!("Deriving vault key — this takes a moment");
    let store = CredentialStore::open(config, &master_secret)
        .context("Failed to open vault — is the master secret correct?")?;

    let account = std::env::var("PWT_SEED_USER").unwrap_or_else(|_| "admin".to_string());
    let password = UserPassword::new(prompt_password(format!("Password for {account}: "))?);

    let user_id = match store.create_user(&account, password.expose_secret()) {
        Ok(id) => id,
        Err(VaultError::DuplicateUsername) => {
            warn!("Account already exists — authenticating instead");
            store
                .authenticate(&account, password.expose_secret())
                .context("Authentication failed")?
        }
        Err(e) => return Err(e).context("Failed to create account"),
    };

    for (website, username, secret, notes) in DEMO_CREDENTIALS {
        let credential_id = store
            .add_credential(user_id, website, username, secret, Some(*notes))
            .with_context(|| format!("Failed to add credential for {website}"))?;
        info!(user_id, credential_id, "Added demo credential");
    }

    info!("Seeded {} credential(s)", DEMO_CREDENTIALS.len());
    Ok(())
}
