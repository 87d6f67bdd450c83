use chrono::{TimeZone, Utc};
use devlic_crypto::{Codec, KeyContext};
use devlic_license::{Issuer, LicenseUnit, Validator};
use devlic_store::{LicenseStore, SqliteLicenseStore, StoreError, StoredLicense};

fn row(fingerprint: &str, period: u32) -> StoredLicense {
    StoredLicense {
        fingerprint: fingerprint.into(),
        unit: LicenseUnit::Month,
        period,
        issued_at: 1_700_000_000.0,
        expires_at: 1_700_000_000.0 + f64::from(period) * 30.0 * 86_400.0,
        license: format!("license-for-{fingerprint}-{period}"),
    }
}

#[test]
fn upsert_and_list() {
    let store = SqliteLicenseStore::open_in_memory().unwrap();
    store.upsert(&row("a", 1)).unwrap();
    store.upsert(&row("b", 2)).unwrap();

    let all = store.list_all().unwrap();
    assert_eq!(all, vec![row("a", 1), row("b", 2)]);
}

#[test]
fn list_empty() {
    let store = SqliteLicenseStore::open_in_memory().unwrap();
    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn upsert_replaces_same_fingerprint() {
    let store = SqliteLicenseStore::open_in_memory().unwrap();
    store.upsert(&row("a", 1)).unwrap();
    store.upsert(&row("b", 1)).unwrap();
    store.upsert(&row("a", 12)).unwrap();

    let all = store.list_all().unwrap();
    assert_eq!(all.len(), 2);
    // Updated in place, so insertion order is kept
    assert_eq!(all[0], row("a", 12));
    assert_eq!(all[1], row("b", 1));
}

#[test]
fn get_by_fingerprint() {
    let store = SqliteLicenseStore::open_in_memory().unwrap();
    store.upsert(&row("a", 3)).unwrap();
    assert_eq!(store.get("a").unwrap(), Some(row("a", 3)));
    assert_eq!(store.get("missing").unwrap(), None);
}

#[test]
fn persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".license.db");

    {
        let store = SqliteLicenseStore::open(&path).unwrap();
        store.upsert(&row("a", 1)).unwrap();
    }

    let reopened = SqliteLicenseStore::open(&path).unwrap();
    assert_eq!(reopened.list_all().unwrap(), vec![row("a", 1)]);
}

#[test]
fn stored_issued_license_still_validates() {
    let codec = Codec::new(KeyContext::default_random());
    let issuer = Issuer::new(codec.clone());
    let validator = Validator::new(codec);
    let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

    let issued = issuer.issue_record("dev-1", LicenseUnit::Year, 1, t0).unwrap();
    let store = SqliteLicenseStore::open_in_memory().unwrap();
    store.upsert(&StoredLicense::from_issued(&issued)).unwrap();

    let stored = store.get("dev-1").unwrap().unwrap();
    assert_eq!(stored.unit, LicenseUnit::Year);
    assert_eq!(stored.expires_at, issued.record.expires_at());
    assert!(validator.validate(&stored.license, "dev-1", t0).is_valid());
}

#[test]
fn corrupt_unit_is_invalid_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.db");
    let store = SqliteLicenseStore::open(&path).unwrap();
    store.upsert(&row("a", 1)).unwrap();

    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute("UPDATE license SET unit = 'week'", []).unwrap();
    drop(conn);

    assert!(matches!(store.list_all(), Err(StoreError::InvalidData(_))));
}

#[test]
fn usable_through_trait_object() {
    let store: Box<dyn LicenseStore> = Box::new(SqliteLicenseStore::open_in_memory().unwrap());
    store.upsert(&row("x", 1)).unwrap();
    assert_eq!(store.list_all().unwrap().len(), 1);
}
