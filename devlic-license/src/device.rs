//! Device fingerprinting for license binding.
//!
//! The fingerprint is the SHA-256 (hex) of the concatenation
//! `mac + processor + machine + hostname + disk_serial`. It is stable across
//! reboots and changes when the network card, CPU, host name or disk serial
//! changes.

use crate::disk_serial::{platform_disk_serial, DiskSerialSource};
use crate::error::{LicenseError, LicenseResult};
use crate::issuer::short;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::env;
use sysinfo::{CpuRefreshKind, Networks, RefreshKind, System};
use tracing::{debug, warn};

/// Placeholder used when the CPU brand cannot be read.
pub const UNKNOWN_PROCESSOR: &str = "Unknown Processor";

/// Raw signals that make up a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSignals {
    /// Hardware address of the first non-loopback interface.
    pub mac: String,
    /// CPU brand string.
    pub processor: String,
    /// Machine architecture.
    pub machine: String,
    /// Hostname.
    pub hostname: String,
    /// Disk or volume serial, when readable.
    pub disk_serial: Option<String>,
}

impl DeviceSignals {
    /// Collects signals from the current device.
    #[must_use]
    pub fn collect(disk: &dyn DiskSerialSource) -> Self {
        let disk_serial = disk.serial();
        if disk_serial.is_none() {
            warn!(source = disk.name(), "disk serial unavailable; fingerprint will be weaker");
        }

        Self {
            mac: get_mac_address().unwrap_or_default(),
            processor: get_processor(),
            machine: env::consts::ARCH.to_string(),
            hostname: get_hostname(),
            disk_serial,
        }
    }

    /// True when no signal carries any information.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mac.is_empty()
            && (self.processor.is_empty() || self.processor == UNKNOWN_PROCESSOR)
            && self.machine.is_empty()
            && self.hostname.is_empty()
            && self.disk_serial.as_deref().unwrap_or_default().is_empty()
    }

    /// Hashes the signals into a 64-character hex fingerprint.
    ///
    /// # Errors
    ///
    /// [`LicenseError::FingerprintUnavailable`] if every signal is empty.
    pub fn fingerprint(&self) -> LicenseResult<String> {
        if self.is_empty() {
            return Err(LicenseError::FingerprintUnavailable(
                "no hardware or OS signal could be read".to_string(),
            ));
        }

        let mut hasher = Sha256::new();
        hasher.update(self.mac.as_bytes());
        hasher.update(self.processor.as_bytes());
        hasher.update(self.machine.as_bytes());
        hasher.update(self.hostname.as_bytes());
        hasher.update(self.disk_serial.as_deref().unwrap_or_default().as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Computes the fingerprint of the current device.
///
/// Collection may run an external command for the disk serial, so avoid
/// calling this on a latency-sensitive thread.
pub struct FingerprintProbe {
    disk: Box<dyn DiskSerialSource>,
}

impl FingerprintProbe {
    /// A probe using the disk-serial source for this platform.
    #[must_use]
    pub fn new() -> Self {
        Self {
            disk: platform_disk_serial(),
        }
    }

    /// A probe using a specific disk-serial source.
    #[must_use]
    pub fn with_source(disk: Box<dyn DiskSerialSource>) -> Self {
        Self { disk }
    }

    /// Collects the raw signals.
    #[must_use]
    pub fn signals(&self) -> DeviceSignals {
        DeviceSignals::collect(self.disk.as_ref())
    }

    /// Computes the device fingerprint.
    pub fn compute(&self) -> LicenseResult<String> {
        let fingerprint = self.signals().fingerprint()?;
        debug!(fingerprint = %short(&fingerprint), source = self.disk.name(), "computed device fingerprint");
        Ok(fingerprint)
    }
}

impl Default for FingerprintProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FingerprintProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FingerprintProbe")
            .field("disk", &self.disk.name())
            .finish()
    }
}

/// Gets the machine hostname.
fn get_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_default()
}

/// Gets the CPU brand string.
fn get_processor() -> String {
    let sys = System::new_with_specifics(RefreshKind::new().with_cpu(CpuRefreshKind::new()));
    sys.cpus()
        .first()
        .map(|cpu| cpu.brand().trim().to_string())
        .filter(|brand| !brand.is_empty())
        .unwrap_or_else(|| UNKNOWN_PROCESSOR.to_string())
}

/// Gets the MAC address of the first interface (by name) with a real address.
fn get_mac_address() -> Option<String> {
    let networks = Networks::new_with_refreshed_list();
    let mut candidates: Vec<(&String, String)> = networks
        .iter()
        .filter(|(_, data)| !data.mac_address().is_unspecified())
        .map(|(name, data)| (name, data.mac_address().to_string()))
        .collect();
    candidates.sort();
    candidates.into_iter().next().map(|(_, mac)| mac)
}
