//! Device-bound, time-limited licenses for devlic.
//!
//! This module handles:
//! - Issuing licenses that bind a device fingerprint to a validity window
//! - Decoding and validating licenses against a device and a clock
//! - Hardware fingerprinting for device binding
//!
//! # License Format
//!
//! A license is the JSON [`LicenseRecord`] encrypted by a
//! [`devlic_crypto::Codec`] under a key shared by issuer and validator.
//! Validity units are fixed lengths: a month is 30 days, a year 365 days.
//!
//! # Validation order
//!
//! [`Validator::validate`] reports the first failing check: malformed text,
//! then device mismatch, then expiry.

mod device;
mod disk_serial;
mod error;
mod issuer;
mod record;
mod validator;

pub use device::{DeviceSignals, FingerprintProbe, UNKNOWN_PROCESSOR};
pub use disk_serial::{
    parse_dmidecode_serial, parse_reg_product_id, parse_system_profiler_serial,
    platform_disk_serial, DiskSerialSource, LinuxDmiSerial, MacSystemProfiler, NoDiskSerial,
    WindowsProductId, MACHINE_ID_PATHS,
};
pub use error::{LicenseError, LicenseResult};
pub use issuer::{IssuedLicense, Issuer};
pub use record::{from_epoch_secs, to_epoch_secs, LicenseRecord, LicenseUnit, SECS_PER_DAY};
pub use validator::{InvalidReason, ReasonCode, Validation, Validator};
