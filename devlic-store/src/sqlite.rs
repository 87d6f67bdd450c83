//! SQLite-backed [`LicenseStore`].

use crate::error::{StoreError, StoreResult};
use crate::{LicenseStore, StoredLicense};
use devlic_license::LicenseUnit;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

const SELECT_COLUMNS: &str =
    "SELECT fingerprint, unit, period, issued_at, expires_at, license FROM license";

/// License store backed by a single SQLite file.
#[derive(Clone)]
pub struct SqliteLicenseStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLicenseStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened license store");
        Self::init(conn)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS license (
                fingerprint TEXT NOT NULL,
                unit TEXT NOT NULL,
                period INTEGER NOT NULL,
                issued_at REAL NOT NULL,
                expires_at REAL NOT NULL,
                license TEXT NOT NULL,
                UNIQUE (fingerprint)
            );
            ",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl LicenseStore for SqliteLicenseStore {
    fn upsert(&self, license: &StoredLicense) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO license (fingerprint, unit, period, issued_at, expires_at, license)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(fingerprint) DO UPDATE SET
                unit = excluded.unit,
                period = excluded.period,
                issued_at = excluded.issued_at,
                expires_at = excluded.expires_at,
                license = excluded.license",
            params![
                license.fingerprint,
                license.unit.as_str(),
                license.period,
                license.issued_at,
                license.expires_at,
                license.license,
            ],
        )?;
        debug!(unit = %license.unit, period = license.period, "stored license");
        Ok(())
    }

    fn list_all(&self) -> StoreResult<Vec<StoredLicense>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY rowid"))?;
        let rows = stmt
            .query_map([], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(into_stored).collect()
    }

    fn get(&self, fingerprint: &str) -> StoreResult<Option<StoredLicense>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE fingerprint = ?1"),
                params![fingerprint],
                read_row,
            )
            .optional()?;
        row.map(into_stored).transpose()
    }
}

type RawRow = (String, String, i64, f64, f64, String);

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn into_stored(raw: RawRow) -> StoreResult<StoredLicense> {
    let (fingerprint, unit, period, issued_at, expires_at, license) = raw;
    let unit: LicenseUnit = unit
        .parse()
        .map_err(|e| StoreError::InvalidData(format!("row {fingerprint}: {e}")))?;
    let period = u32::try_from(period)
        .map_err(|_| StoreError::InvalidData(format!("row {fingerprint}: period {period}")))?;
    Ok(StoredLicense {
        fingerprint,
        unit,
        period,
        issued_at,
        expires_at,
        license,
    })
}
