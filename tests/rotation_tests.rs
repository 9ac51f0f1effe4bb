// tests/rotation_tests.rs
//! Master-secret rotation re-seals every field under a new key and salt

mod common;
mod support;

use passwault::{CredentialStore, MasterSecret, VaultError};
use support::TestVault;

fn stored_salt(vault: &TestVault) -> (Vec<u8>, Option<String>) {
    vault
        .raw_conn()
        .query_row("SELECT kdf_salt, rotated_at FROM vault_meta WHERE id = 1", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .unwrap()
}

fn envelopes(vault: &TestVault) -> Vec<(String, String)> {
    let conn = vault.raw_conn();
    let mut stmt = conn
        .prepare("SELECT username_envelope, password_envelope FROM credentials ORDER BY id")
        .unwrap();
    let rows = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    rows
}

#[test]
fn rotation_reseals_all_users_rows() {
    common::setup();
    let vault = TestVault::new();
    let store = &vault.store;
    let alice = vault.user("alice");
    let bob = vault.user("bob");
    let a = store.add_credential(alice, "a.com", "alice@a", "pa", None).unwrap();
    let b = store.add_credential(bob, "b.com", "bob@b", "pb", None).unwrap();

    let (salt_before, rotated_before) = stored_salt(&vault);
    let envelopes_before = envelopes(&vault);
    assert!(rotated_before.is_none());

    let count = store
        .rotate_master_secret(&MasterSecret::new("brand-new-secret".to_string()))
        .unwrap();
    assert_eq!(count, 2);

    let (salt_after, rotated_after) = stored_salt(&vault);
    assert_ne!(salt_before, salt_after);
    assert!(rotated_after.is_some());

    let envelopes_after = envelopes(&vault);
    for (old, new) in envelopes_before.iter().zip(&envelopes_after) {
        assert_ne!(old.0, new.0);
        assert_ne!(old.1, new.1);
    }

    // Same store keeps working with the adopted key
    assert_eq!(store.reveal_password(a, alice).unwrap().as_str(), "pa");
    assert_eq!(store.reveal_password(b, bob).unwrap().as_str(), "pb");
    assert_eq!(store.get_credential(a, alice).unwrap().username, "alice@a");
}

#[test]
fn reopen_requires_the_new_secret() {
    let vault = TestVault::new();
    let alice = vault.user("alice");
    let id = vault
        .store
        .add_credential(alice, "a.com", "alice@a", "pa", None)
        .unwrap();
    vault
        .store
        .rotate_master_secret(&MasterSecret::new("rotated".to_string()))
        .unwrap();

    let config = vault.config();

    let stale = CredentialStore::open(&config, &MasterSecret::new(support::MASTER_SECRET.to_string()));
    assert!(matches!(stale, Err(VaultError::Decrypt)));

    let fresh = CredentialStore::open(&config, &MasterSecret::new("rotated".to_string())).unwrap();
    assert_eq!(fresh.reveal_password(id, alice).unwrap().as_str(), "pa");
}

#[test]
fn rotation_of_empty_vault_still_changes_salt() {
    let vault = TestVault::new();
    let (before, _) = stored_salt(&vault);
    let count = vault
        .store
        .rotate_master_secret(&MasterSecret::new("next".to_string()))
        .unwrap();
    assert_eq!(count, 0);
    assert_ne!(stored_salt(&vault).0, before);
}

#[test]
fn failed_rotation_changes_nothing() {
    let vault = TestVault::new();
    let alice = vault.user("alice");
    let id = vault.store.add_credential(alice, "a.com", "u", "pa", None).unwrap();

    // Corrupt one envelope so the re-seal pass fails halfway
    let good = vault.store.add_credential(alice, "b.com", "u", "pb", None).unwrap();
    vault
        .raw_conn()
        .execute(
            "UPDATE credentials SET password_envelope = ?1 WHERE id = ?2",
            rusqlite::params![format!("v1:{}:AAAA:{}", "00".repeat(24), "00".repeat(16)), id],
        )
        .unwrap();

    let (salt_before, _) = stored_salt(&vault);
    let before = envelopes(&vault);

    let err = vault
        .store
        .rotate_master_secret(&MasterSecret::new("next".to_string()))
        .unwrap_err();
    assert!(matches!(err, VaultError::Decrypt));

    assert_eq!(stored_salt(&vault).0, salt_before);
    assert_eq!(envelopes(&vault), before);
    // Live key unchanged
    assert_eq!(vault.store.reveal_password(good, alice).unwrap().as_str(), "pb");
}

#[test]
fn empty_new_secret_is_rejected() {
    let vault = TestVault::new();
    let err = vault
        .store
        .rotate_master_secret(&MasterSecret::new(String::new()))
        .unwrap_err();
    assert!(matches!(err, VaultError::Config(_)));
}
