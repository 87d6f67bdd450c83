//! Platform disk/volume serial sources.
//!
//! Each source is best-effort: any failure yields `None`, and the fingerprint
//! is computed without the serial.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

/// Machine-id files tried in order on Linux-like systems.
pub const MACHINE_ID_PATHS: [&str; 2] = ["/var/lib/dbus/machine-id", "/etc/machine-id"];

/// A source of a stable per-machine serial string.
pub trait DiskSerialSource: Send + Sync {
    /// Returns the serial, or `None` if it cannot be read.
    fn serial(&self) -> Option<String>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Windows product identifier from the registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsProductId;

impl DiskSerialSource for WindowsProductId {
    fn serial(&self) -> Option<String> {
        run(
            "reg",
            &[
                "query",
                r"HKLM\SOFTWARE\Microsoft\Windows NT\CurrentVersion",
                "/v",
                "ProductId",
            ],
        )
        .as_deref()
        .and_then(parse_reg_product_id)
    }

    fn name(&self) -> &'static str {
        "windows-product-id"
    }
}

/// macOS hardware serial from `system_profiler`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacSystemProfiler;

impl DiskSerialSource for MacSystemProfiler {
    fn serial(&self) -> Option<String> {
        run("system_profiler", &["SPHardwareDataType"])
            .as_deref()
            .and_then(parse_system_profiler_serial)
    }

    fn name(&self) -> &'static str {
        "system-profiler"
    }
}

/// DMI system serial, falling back to the machine-id file.
#[derive(Debug, Clone)]
pub struct LinuxDmiSerial {
    query_dmi: bool,
    machine_id_paths: Vec<PathBuf>,
}

impl Default for LinuxDmiSerial {
    fn default() -> Self {
        Self {
            query_dmi: true,
            machine_id_paths: MACHINE_ID_PATHS.iter().map(PathBuf::from).collect(),
        }
    }
}

impl LinuxDmiSerial {
    /// Skips the DMI query and reads only the given machine-id files.
    #[must_use]
    pub fn machine_id_only(paths: Vec<PathBuf>) -> Self {
        Self {
            query_dmi: false,
            machine_id_paths: paths,
        }
    }
}

impl DiskSerialSource for LinuxDmiSerial {
    fn serial(&self) -> Option<String> {
        if self.query_dmi {
            // -n: never prompt for a password
            let dmi = run("sudo", &["-n", "dmidecode", "-s", "system-serial-number"])
                .as_deref()
                .and_then(parse_dmidecode_serial);
            if dmi.is_some() {
                return dmi;
            }
            debug!("dmidecode serial unavailable, trying machine-id");
        }

        self.machine_id_paths.iter().find_map(|path| {
            std::fs::read_to_string(path)
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
    }

    fn name(&self) -> &'static str {
        "linux-dmi"
    }
}

/// A source that never yields a serial.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiskSerial;

impl DiskSerialSource for NoDiskSerial {
    fn serial(&self) -> Option<String> {
        None
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// The source for the platform this binary was built for.
#[must_use]
pub fn platform_disk_serial() -> Box<dyn DiskSerialSource> {
    #[cfg(target_os = "windows")]
    {
        Box::new(WindowsProductId)
    }

    #[cfg(target_os = "macos")]
    {
        Box::new(MacSystemProfiler)
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        Box::new(LinuxDmiSerial::default())
    }
}

/// Extracts `ProductId` from `reg query` output.
#[must_use]
pub fn parse_reg_product_id(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with("ProductId") && l.contains("REG_SZ"))
        .and_then(|l| l.split_whitespace().nth(2))
        .map(String::from)
}

/// Extracts the serial from `system_profiler SPHardwareDataType` output.
#[must_use]
pub fn parse_system_profiler_serial(output: &str) -> Option<String> {
    output
        .lines()
        .find(|l| l.contains("Serial"))
        .and_then(|l| l.split_whitespace().last())
        .map(String::from)
}

/// Extracts the serial from `dmidecode -s system-serial-number` output.
#[must_use]
pub fn parse_dmidecode_serial(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
}

fn run(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        debug!(program, status = ?output.status.code(), "serial query failed");
        return None;
    }
    String::from_utf8(output.stdout).ok()
}
