//! Command-line front-end for devlic.
//!
//! Argument parsing, key-file handling and command dispatch live here so they
//! can be driven from tests; `main.rs` only wires up logging and stdout.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::{Parser, Subcommand};
use devlic_crypto::{Codec, CodecFormat, KeyContext, DEFAULT_KEY_SIZE};
use devlic_license::{FingerprintProbe, Issuer, LicenseRecord, LicenseUnit, Validator};
use devlic_store::{LicenseStore, SqliteLicenseStore, StoredLicense};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Exit code for a license that failed validation.
pub const EXIT_INVALID: u8 = 1;

#[derive(Parser, Debug)]
#[command(name = "devlic")]
#[command(about = "Issue and validate device-bound licenses")]
pub struct Args {
    /// Path to the shared key file
    #[arg(long, env = "DEVLIC_KEY_FILE", default_value = "devlic.key", global = true)]
    pub key_file: PathBuf,

    /// Shared secret string (16, 24 or 32 bytes); overrides --key-file
    #[arg(long, env = "DEVLIC_SECRET", hide_env_values = true, global = true)]
    pub secret: Option<String>,

    /// Path to the issued-license database
    #[arg(long, env = "DEVLIC_DB", default_value = ".license.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a new random key file
    Keygen {
        /// Key length in bytes (16, 24 or 32)
        #[arg(long, default_value_t = DEFAULT_KEY_SIZE)]
        length: usize,

        /// Overwrite an existing key file
        #[arg(long)]
        force: bool,
    },

    /// Print this device's fingerprint
    Fingerprint,

    /// Issue a license for a device
    Issue {
        /// Fingerprint of the device to bind
        #[arg(long)]
        fingerprint: String,

        /// Validity unit: month (30 days) or year (365 days)
        #[arg(long)]
        unit: LicenseUnit,

        /// Number of units
        #[arg(long, default_value_t = 1)]
        period: u32,

        /// Use the authenticated v2 format
        #[arg(long)]
        sealed: bool,

        /// Do not record the license in the database
        #[arg(long)]
        no_store: bool,
    },

    /// Decode a license and print its contents
    Inspect {
        /// License text
        license: String,
    },

    /// Check a license against a device and the current time
    Validate {
        /// License text
        license: String,

        /// Fingerprint to check against (defaults to this device)
        #[arg(long)]
        fingerprint: Option<String>,
    },

    /// List issued licenses
    List,
}

/// Runs a parsed command, writing user-facing output to `out`.
///
/// Returns the process exit code: 0 on success, [`EXIT_INVALID`] when a
/// validated license is not usable.
pub fn run(args: Args, out: &mut impl Write) -> Result<u8> {
    match args.command {
        Command::Keygen { length, force } => {
            let key = generate_key_file(&args.key_file, length, force)?;
            writeln!(
                out,
                "wrote {}-byte key to {}",
                key.key_size(),
                args.key_file.display()
            )?;
        }
        Command::Fingerprint => {
            let fingerprint = FingerprintProbe::new()
                .compute()
                .context("Failed to compute device fingerprint")?;
            writeln!(out, "{fingerprint}")?;
        }
        Command::Issue {
            ref fingerprint,
            unit,
            period,
            sealed,
            no_store,
        } => {
            let key = load_key(args.secret.as_deref(), &args.key_file)?;
            let format = if sealed { CodecFormat::Sealed } else { CodecFormat::Legacy };
            let issuer = Issuer::new(Codec::new(key).with_format(format));
            let issued = issuer
                .issue_record(fingerprint, unit, period, Utc::now())
                .context("Failed to issue license")?;

            if no_store {
                debug!("skipping license database");
            } else {
                let store = SqliteLicenseStore::open(&args.db)
                    .with_context(|| format!("Failed to open {}", args.db.display()))?;
                store.upsert(&StoredLicense::from_issued(&issued))?;
                info!("recorded license in {}", args.db.display());
            }

            writeln!(out, "{}", issued.encoded)?;
        }
        Command::Inspect { ref license } => {
            let key = load_key(args.secret.as_deref(), &args.key_file)?;
            let record = Validator::new(Codec::new(key))
                .inspect(license)
                .context("Failed to decode license")?;
            writeln!(out, "{}", serde_json::to_string_pretty(&RecordView::from(&record))?)?;
        }
        Command::Validate {
            ref license,
            ref fingerprint,
        } => {
            let key = load_key(args.secret.as_deref(), &args.key_file)?;
            let fingerprint = match fingerprint {
                Some(fp) => fp.clone(),
                None => FingerprintProbe::new()
                    .compute()
                    .context("Failed to compute device fingerprint")?,
            };
            let result = Validator::new(Codec::new(key)).validate_now(license, &fingerprint);
            writeln!(out, "{}: {result}", result.reason_code())?;
            if !result.is_valid() {
                return Ok(EXIT_INVALID);
            }
        }
        Command::List => {
            let store = SqliteLicenseStore::open(&args.db)
                .with_context(|| format!("Failed to open {}", args.db.display()))?;
            let now = Utc::now();
            for row in store.list_all()? {
                writeln!(out, "{}", format_row(&row, now))?;
            }
        }
    }
    Ok(0)
}

/// Loads the shared key: the explicit secret if given, else the key file.
pub fn load_key(secret: Option<&str>, key_file: &Path) -> Result<KeyContext> {
    if let Some(secret) = secret {
        debug!("using key from --secret");
        return KeyContext::from_secret(secret.as_bytes()).context("Invalid --secret");
    }

    info!("Loading key from {:?}", key_file);
    let text = fs::read_to_string(key_file)
        .with_context(|| format!("Failed to read key file {}", key_file.display()))?;
    KeyContext::from_base64(&text).context("Failed to decode key file")
}

/// Writes a fresh random key of `length` bytes to `path`.
pub fn generate_key_file(path: &Path, length: usize, force: bool) -> Result<KeyContext> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to replace it)", path.display());
    }
    if path.exists() {
        warn!("Replacing key at {:?}; licenses issued with the old key will stop validating", path);
    }

    let key = KeyContext::random(length).context("Invalid key length")?;
    fs::write(path, format!("{}\n", key.export_base64()))
        .context("Failed to write key file")?;
    restrict_permissions(path)?;
    info!("Generated new key at {:?}", path);
    Ok(key)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .context("Failed to restrict key file permissions")
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// Human-readable form of a decoded record.
#[derive(Debug, Serialize)]
pub struct RecordView {
    pub device_fingerprint: String,
    pub unit: LicenseUnit,
    pub period: u32,
    pub issued_at: String,
    pub expires_at: String,
}

impl From<&LicenseRecord> for RecordView {
    fn from(record: &LicenseRecord) -> Self {
        Self {
            device_fingerprint: record.device_fingerprint().to_string(),
            unit: record.unit(),
            period: record.period(),
            issued_at: rfc3339(record.issued_at_utc()),
            expires_at: rfc3339(record.expires_at_utc()),
        }
    }
}

/// One line of `devlic list` output.
pub fn format_row(row: &StoredLicense, now: DateTime<Utc>) -> String {
    let issued = devlic_license::from_epoch_secs(row.issued_at).map_or_else(|| "?".to_string(), rfc3339);
    let expires = devlic_license::from_epoch_secs(row.expires_at);
    let state = match expires {
        Some(at) if at >= now => format!("{} days left", (at - now).num_days()),
        Some(_) => "expired".to_string(),
        None => "invalid expiry".to_string(),
    };
    format!(
        "{}  {} x{}  issued {}  expires {}  ({state})",
        row.fingerprint,
        row.unit,
        row.period,
        issued,
        expires.map_or_else(|| "?".to_string(), rfc3339),
    )
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
