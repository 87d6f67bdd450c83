//! Shared test helpers for license tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use devlic_crypto::{Codec, CodecFormat, KeyContext};
use devlic_license::{DiskSerialSource, Issuer, Validator};

/// Fixed issue time used across tests (2023-11-14T22:13:20Z).
pub const T: i64 = 1_700_000_000;

pub fn t0() -> DateTime<Utc> {
    Utc.timestamp_opt(T, 0).unwrap()
}

pub fn at(secs_after_t0: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(T + secs_after_t0, 0).unwrap()
}

/// Returns a deterministic 24-byte key.
pub fn test_key() -> KeyContext {
    KeyContext::from_secret(b"0123456789abcdef01234567").unwrap()
}

/// Issuer and validator sharing [`test_key`].
pub fn pair() -> (Issuer, Validator) {
    pair_with_format(CodecFormat::Legacy)
}

pub fn pair_with_format(format: CodecFormat) -> (Issuer, Validator) {
    let codec = Codec::new(test_key()).with_format(format);
    (Issuer::new(codec.clone()), Validator::new(codec))
}

/// Encodes an arbitrary payload with [`test_key`], bypassing the issuer.
pub fn encode_raw(payload: &str) -> String {
    Codec::new(test_key()).encode(payload.as_bytes()).unwrap()
}

/// Disk-serial source returning a fixed value.
pub struct FixedSerial(pub Option<&'static str>);

impl DiskSerialSource for FixedSerial {
    fn serial(&self) -> Option<String> {
        self.0.map(String::from)
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}
