//! Persistent record of issued licenses.
//!
//! Issued licenses are kept keyed by device fingerprint: issuing again for the
//! same device replaces the earlier row. The store is bookkeeping for the
//! issuing side; validation never consults it.

mod error;
mod sqlite;

pub use error::{StoreError, StoreResult};
pub use sqlite::SqliteLicenseStore;

use devlic_license::{IssuedLicense, LicenseUnit};
use serde::{Deserialize, Serialize};

/// One stored license row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLicense {
    pub fingerprint: String,
    pub unit: LicenseUnit,
    pub period: u32,
    /// Seconds since epoch.
    pub issued_at: f64,
    /// Seconds since epoch.
    pub expires_at: f64,
    /// The encoded license text.
    pub license: String,
}

impl StoredLicense {
    /// Builds a row from an issuance result.
    #[must_use]
    pub fn from_issued(issued: &IssuedLicense) -> Self {
        let record = &issued.record;
        Self {
            fingerprint: record.device_fingerprint().to_string(),
            unit: record.unit(),
            period: record.period(),
            issued_at: record.issued_at(),
            expires_at: record.expires_at(),
            license: issued.encoded.clone(),
        }
    }
}

/// Storage for issued licenses, keyed by fingerprint.
pub trait LicenseStore: Send + Sync {
    /// Inserts the row, or replaces the row with the same fingerprint.
    fn upsert(&self, license: &StoredLicense) -> StoreResult<()>;

    /// All rows in insertion order.
    fn list_all(&self) -> StoreResult<Vec<StoredLicense>>;

    /// The row for one fingerprint.
    fn get(&self, fingerprint: &str) -> StoreResult<Option<StoredLicense>>;
}
