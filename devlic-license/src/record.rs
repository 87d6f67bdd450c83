//! The license record bound inside every license string.
//!
//! Wire form is a JSON object:
//!
//! ```json
//! {"device_fingerprint":"…","unit":"month","period":1,
//!  "issued_at":1700000000.0,"expires_at":1702592000.0}
//! ```
//!
//! Timestamps are floating-point seconds since the Unix epoch (UTC). The older
//! names `gen_timestamp` / `expire_timestamp` are accepted when decoding.

use crate::error::{LicenseError, LicenseResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Seconds in one day.
pub const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// Granularity of a license's validity period.
///
/// Units are fixed day counts, not calendar months or years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseUnit {
    /// 30 days.
    Month,
    /// 365 days.
    Year,
}

impl LicenseUnit {
    /// Number of days in one unit.
    #[must_use]
    pub fn days(&self) -> i64 {
        match self {
            Self::Month => 30,
            Self::Year => 365,
        }
    }

    /// Length of one unit.
    #[must_use]
    pub fn length(&self) -> Duration {
        Duration::days(self.days())
    }

    /// Wire tag.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl fmt::Display for LicenseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LicenseUnit {
    type Err = LicenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(LicenseError::InvalidParameters(format!(
                "unit must be 'month' or 'year', got '{other}'"
            ))),
        }
    }
}

/// Identity and validity window bound inside a license.
///
/// Records are immutable: they are built by the issuer or decoded by the
/// validator and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseRecord {
    device_fingerprint: String,
    unit: LicenseUnit,
    period: u32,
    #[serde(alias = "gen_timestamp")]
    issued_at: f64,
    #[serde(alias = "expire_timestamp")]
    expires_at: f64,
}

impl LicenseRecord {
    /// Builds a record, computing the expiry from `unit` and `period`.
    pub(crate) fn new(
        device_fingerprint: &str,
        unit: LicenseUnit,
        period: u32,
        issued_at: DateTime<Utc>,
    ) -> LicenseResult<Self> {
        if device_fingerprint.trim().is_empty() {
            return Err(LicenseError::InvalidParameters(
                "device fingerprint must not be empty".to_string(),
            ));
        }
        if period == 0 {
            return Err(LicenseError::InvalidParameters(
                "period must be at least 1".to_string(),
            ));
        }

        let issued = to_epoch_secs(issued_at);
        let validity = i64::from(period) * unit.days() * SECS_PER_DAY;
        let expires_at = issued + validity as f64;
        if from_epoch_secs(expires_at).is_none() {
            return Err(LicenseError::InvalidParameters(format!(
                "{period} {unit}(s) from issuance is past the latest representable time"
            )));
        }

        Ok(Self {
            device_fingerprint: device_fingerprint.to_string(),
            unit,
            period,
            issued_at: issued,
            expires_at,
        })
    }

    /// Serializes to canonical JSON bytes.
    pub fn to_bytes(&self) -> LicenseResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parses JSON bytes and checks record invariants.
    ///
    /// # Errors
    ///
    /// [`LicenseError::MalformedLicense`] for invalid JSON, missing fields, an
    /// unknown unit, a zero period, or an expiry not after issuance.
    pub fn from_bytes(bytes: &[u8]) -> LicenseResult<Self> {
        let record: Self = serde_json::from_slice(bytes)
            .map_err(|e| LicenseError::MalformedLicense(format!("invalid payload: {e}")))?;
        record.check()?;
        Ok(record)
    }

    fn check(&self) -> LicenseResult<()> {
        if self.period == 0 {
            return Err(LicenseError::MalformedLicense("period is zero".to_string()));
        }
        if from_epoch_secs(self.issued_at).is_none() || from_epoch_secs(self.expires_at).is_none() {
            return Err(LicenseError::MalformedLicense(
                "timestamp out of range".to_string(),
            ));
        }
        if self.expires_at <= self.issued_at {
            return Err(LicenseError::MalformedLicense(
                "expiry is not after issuance".to_string(),
            ));
        }
        Ok(())
    }

    /// The device fingerprint the license is bound to.
    #[must_use]
    pub fn device_fingerprint(&self) -> &str {
        &self.device_fingerprint
    }

    #[must_use]
    pub fn unit(&self) -> LicenseUnit {
        self.unit
    }

    #[must_use]
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Issue time in seconds since epoch.
    #[must_use]
    pub fn issued_at(&self) -> f64 {
        self.issued_at
    }

    /// Expiry time in seconds since epoch.
    #[must_use]
    pub fn expires_at(&self) -> f64 {
        self.expires_at
    }

    #[must_use]
    pub fn issued_at_utc(&self) -> DateTime<Utc> {
        from_epoch_secs(self.issued_at).unwrap_or_default()
    }

    #[must_use]
    pub fn expires_at_utc(&self) -> DateTime<Utc> {
        from_epoch_secs(self.expires_at).unwrap_or_default()
    }

    /// True once `now` is strictly past the expiry.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        to_epoch_secs(now) > self.expires_at
    }

    /// Time left at `now`, or `None` once expired.
    #[must_use]
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.is_expired_at(now) {
            return None;
        }
        let secs = self.expires_at - to_epoch_secs(now);
        Some(Duration::microseconds((secs * 1_000_000.0).round() as i64))
    }
}

/// Converts a UTC time to fractional epoch seconds (microsecond precision).
#[must_use]
pub fn to_epoch_secs(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

/// Converts fractional epoch seconds to a UTC time, if representable.
#[must_use]
pub fn from_epoch_secs(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let micros = (secs * 1_000_000.0).round();
    if micros < i64::MIN as f64 || micros > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_micros(micros as i64)
}
