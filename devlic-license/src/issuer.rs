//! License issuing.

use crate::error::LicenseResult;
use crate::record::{LicenseRecord, LicenseUnit};
use chrono::{DateTime, Utc};
use devlic_crypto::Codec;
use tracing::debug;

/// A freshly issued license: the bound record and its encoded text.
///
/// Persisting it is the caller's business.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedLicense {
    pub record: LicenseRecord,
    pub encoded: String,
}

/// Builds license records and encodes them with the shared key.
#[derive(Debug, Clone)]
pub struct Issuer {
    codec: Codec,
}

impl Issuer {
    #[must_use]
    pub fn new(codec: Codec) -> Self {
        Self { codec }
    }

    /// Issues a license valid from now for `period` units.
    ///
    /// # Errors
    ///
    /// [`crate::LicenseError::InvalidParameters`] for a zero period or empty
    /// fingerprint.
    pub fn issue(&self, fingerprint: &str, unit: LicenseUnit, period: u32) -> LicenseResult<String> {
        Ok(self.issue_record(fingerprint, unit, period, Utc::now())?.encoded)
    }

    /// Issues a license with an explicit issue time.
    pub fn issue_at(
        &self,
        fingerprint: &str,
        unit: LicenseUnit,
        period: u32,
        issued_at: DateTime<Utc>,
    ) -> LicenseResult<String> {
        Ok(self.issue_record(fingerprint, unit, period, issued_at)?.encoded)
    }

    /// Issues a license and returns the record alongside the encoded text.
    pub fn issue_record(
        &self,
        fingerprint: &str,
        unit: LicenseUnit,
        period: u32,
        issued_at: DateTime<Utc>,
    ) -> LicenseResult<IssuedLicense> {
        let record = LicenseRecord::new(fingerprint, unit, period, issued_at)?;
        let encoded = self.codec.encode(&record.to_bytes()?)?;

        debug!(
            fingerprint = %short(fingerprint),
            %unit,
            period,
            expires_at = %record.expires_at_utc(),
            format = ?self.codec.format(),
            "issued license"
        );

        Ok(IssuedLicense { record, encoded })
    }
}

/// Log-safe prefix of a fingerprint.
pub(crate) fn short(fingerprint: &str) -> &str {
    fingerprint
        .char_indices()
        .nth(8)
        .map_or(fingerprint, |(i, _)| &fingerprint[..i])
}
