//! License validation.
//!
//! Validation never fails with an error: every problem with the license text
//! becomes a [`Validation::Invalid`] carrying the first reason found, checked
//! in order malformed, device mismatch, expired.

use crate::device::FingerprintProbe;
use crate::error::{LicenseError, LicenseResult};
use crate::issuer::short;
use crate::record::{LicenseRecord, SECS_PER_DAY};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use devlic_crypto::Codec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Stable, machine-readable validation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    Ok,
    Malformed,
    DeviceMismatch,
    Expired,
}

impl ReasonCode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Malformed => "malformed",
            Self::DeviceMismatch => "device_mismatch",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a license was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// The text did not decode to a well-formed record.
    Malformed(String),
    /// The license is bound to another device.
    DeviceMismatch,
    /// The license expired at the given time.
    Expired { expired_at: DateTime<Utc> },
}

impl InvalidReason {
    #[must_use]
    pub fn code(&self) -> ReasonCode {
        match self {
            Self::Malformed(_) => ReasonCode::Malformed,
            Self::DeviceMismatch => ReasonCode::DeviceMismatch,
            Self::Expired { .. } => ReasonCode::Expired,
        }
    }
}

/// Result of validating a license.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    /// Usable on this device.
    Valid {
        record: LicenseRecord,
        remaining: Duration,
    },
    /// Not usable.
    Invalid(InvalidReason),
}

impl Validation {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    #[must_use]
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            Self::Valid { .. } => ReasonCode::Ok,
            Self::Invalid(reason) => reason.code(),
        }
    }

    /// Time left on a valid license.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            Self::Valid { remaining, .. } => Some(*remaining),
            Self::Invalid(_) => None,
        }
    }

    /// The decoded record of a valid license.
    #[must_use]
    pub fn record(&self) -> Option<&LicenseRecord> {
        match self {
            Self::Valid { record, .. } => Some(record),
            Self::Invalid(_) => None,
        }
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid { remaining, .. } => write!(
                f,
                "license valid, {} days remaining",
                remaining.num_seconds() / SECS_PER_DAY
            ),
            Self::Invalid(InvalidReason::Malformed(detail)) => {
                write!(f, "license is malformed: {detail}")
            }
            Self::Invalid(InvalidReason::DeviceMismatch) => {
                f.write_str("license does not match this device")
            }
            Self::Invalid(InvalidReason::Expired { expired_at }) => write!(
                f,
                "license expired at {}",
                expired_at.to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
        }
    }
}

/// Decodes license text and checks it against a device and a clock.
#[derive(Debug, Clone)]
pub struct Validator {
    codec: Codec,
}

impl Validator {
    #[must_use]
    pub fn new(codec: Codec) -> Self {
        Self { codec }
    }

    /// Decodes a license without checking device or expiry.
    ///
    /// # Errors
    ///
    /// [`LicenseError::MalformedLicense`] if decoding or parsing fails.
    pub fn inspect(&self, encoded: &str) -> LicenseResult<LicenseRecord> {
        let bytes = self
            .codec
            .decode(encoded)
            .map_err(|e| LicenseError::MalformedLicense(e.to_string()))?;
        LicenseRecord::from_bytes(&bytes)
    }

    /// Validates a license for `current_fingerprint` at time `now`.
    #[must_use]
    pub fn validate(
        &self,
        encoded: &str,
        current_fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Validation {
        let record = match self.inspect(encoded) {
            Ok(record) => record,
            Err(e) => {
                debug!(error = %e, "license rejected: malformed");
                let detail = match e {
                    LicenseError::MalformedLicense(detail) => detail,
                    other => other.to_string(),
                };
                return Validation::Invalid(InvalidReason::Malformed(detail));
            }
        };

        if record.device_fingerprint() != current_fingerprint {
            debug!(
                bound = %short(record.device_fingerprint()),
                current = %short(current_fingerprint),
                "license rejected: device mismatch"
            );
            return Validation::Invalid(InvalidReason::DeviceMismatch);
        }

        match record.remaining_at(now) {
            Some(remaining) => {
                debug!(remaining_secs = remaining.num_seconds(), "license valid");
                Validation::Valid { record, remaining }
            }
            None => {
                let expired_at = record.expires_at_utc();
                debug!(%expired_at, "license rejected: expired");
                Validation::Invalid(InvalidReason::Expired { expired_at })
            }
        }
    }

    /// Validates against the wall clock.
    #[must_use]
    pub fn validate_now(&self, encoded: &str, current_fingerprint: &str) -> Validation {
        self.validate(encoded, current_fingerprint, Utc::now())
    }

    /// Validates against this machine's fingerprint and the wall clock.
    ///
    /// # Errors
    ///
    /// [`LicenseError::FingerprintUnavailable`] if no device signal could be
    /// read; problems with the license itself are reported in the
    /// [`Validation`].
    pub fn validate_local(&self, encoded: &str, probe: &FingerprintProbe) -> LicenseResult<Validation> {
        let fingerprint = probe.compute()?;
        Ok(self.validate_now(encoded, &fingerprint))
    }
}
