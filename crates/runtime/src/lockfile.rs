//! Lockfile discovery and parsing.
//!
//! The League client writes a small `lockfile` next to its executable
//! containing the rotating credentials for its local RPC service:
//! `name:pid:port:secret:scheme`, colon-separated UTF-8. The file is
//! rewritten on every client start, may be mid-rewrite when we read it, and
//! the secret inside must never reach a log line or disk.
//!
//! Candidate locations are probed in a fixed order, first hit wins:
//!
//! 1. Install directories of live `LeagueClientUx` processes
//! 2. A configured install path, when one was supplied
//! 3. Conventional install paths
//! 4. A scan of fixed drive roots for the conventional subpaths
//!
//! A candidate that exists but won't parse is a miss, not a failure: the
//! search moves on to the next location.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::diag::ConnectionLog;
use crate::error::{Error, Result};
use crate::host;

/// File name the client uses for its connection descriptor.
const LOCKFILE_NAME: &str = "lockfile";

/// Parse attempts per candidate before giving up on it.
const PARSE_ATTEMPTS: u32 = 5;

/// Fixed delay between parse attempts while the client is mid-rewrite.
const PARSE_RETRY_DELAY: Duration = Duration::from_millis(120);

/// Transport scheme advertised by the lockfile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportScheme {
    Https,
    Http,
}

impl TransportScheme {
    fn from_wire(value: &str) -> Self {
        // The client has only ever written "https"; treat anything
        // unrecognized as secure rather than silently downgrading.
        match value {
            "http" => TransportScheme::Http,
            _ => TransportScheme::Https,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransportScheme::Https => "https",
            TransportScheme::Http => "http",
        }
    }
}

/// Connection credentials parsed from a lockfile.
///
/// Held only in memory and discarded on disconnect. The `Debug` impl
/// redacts the secret so the struct can appear in trace output safely.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub port: u16,
    pub secret: String,
    pub scheme: TransportScheme,
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("port", &self.port)
            .field("secret", &"<redacted>")
            .field("scheme", &self.scheme)
            .finish()
    }
}

/// Locator configuration supplied by the embedding application.
#[derive(Debug, Clone, Default)]
pub struct LocatorConfig {
    /// Install directory override checked after the process table.
    pub install_path: Option<PathBuf>,
}

/// Finds and parses the client's lockfile.
#[derive(Clone)]
pub struct CredentialLocator {
    config: LocatorConfig,
    log: ConnectionLog,
}

impl CredentialLocator {
    pub fn new(config: LocatorConfig, log: ConnectionLog) -> Self {
        Self { config, log }
    }

    /// Runs the candidate search, first hit wins.
    ///
    /// Synchronous by design (file probes plus bounded retry sleeps); async
    /// callers drive it through `spawn_blocking`. Never panics: every
    /// malformed candidate degrades to a miss and the search continues.
    pub fn locate(&self) -> Result<ConnectionDescriptor> {
        // 1. Live client processes point at their own install directory.
        self.log.push("probe by process");
        for dir in host::host_install_dirs() {
            let candidate = dir.join(LOCKFILE_NAME);
            if let Some(descriptor) = self.try_candidate(&candidate, "process") {
                return Ok(descriptor);
            }
        }

        // 2. Configured install path, when the application supplied one.
        if let Some(configured) = &self.config.install_path {
            let candidate = configured.join(LOCKFILE_NAME);
            if let Some(descriptor) = self.try_candidate(&candidate, "config") {
                return Ok(descriptor);
            }
            if !candidate.exists() {
                self.log
                    .push(format!("config path miss: {}", candidate.display()));
            }
        }

        // 3. Conventional install paths.
        for dir in conventional_install_dirs() {
            let candidate = dir.join(LOCKFILE_NAME);
            if let Some(descriptor) = self.try_candidate(&candidate, "common path") {
                return Ok(descriptor);
            }
        }

        // 4. Fixed-drive scan for the conventional subpaths.
        for dir in drive_scan_dirs() {
            let candidate = dir.join(LOCKFILE_NAME);
            if let Some(descriptor) = self.try_candidate(&candidate, "drive scan") {
                return Ok(descriptor);
            }
        }

        self.log.push("lockfile probe exhausted");
        Err(Error::DescriptorNotFound)
    }

    /// Probes one candidate path; `None` means keep searching.
    fn try_candidate(&self, path: &Path, origin: &str) -> Option<ConnectionDescriptor> {
        if !path.exists() {
            return None;
        }
        self.log
            .push(format!("lockfile via {origin}: {}", path.display()));
        match self.parse_with_retry(path) {
            Ok(descriptor) => {
                debug!(target = "lcu.lockfile", port = descriptor.port, "lockfile parsed");
                self.log
                    .push(format!("lockfile parsed, port={}", descriptor.port));
                Some(descriptor)
            }
            Err(err) => {
                warn!(target = "lcu.lockfile", path = %path.display(), error = %err, "lockfile candidate unreadable");
                self.log
                    .push(format!("lockfile parse failed: {}", path.display()));
                None
            }
        }
    }

    /// Reads and parses the lockfile, retrying while the client rewrites it.
    ///
    /// Both read errors (file locked, mid-rotation) and malformed content
    /// (short write observed half way) are retried on the same fixed delay;
    /// after the budget is spent the candidate is reported unreadable.
    fn parse_with_retry(&self, path: &Path) -> Result<ConnectionDescriptor> {
        let mut last_reason = String::new();

        for attempt in 1..=PARSE_ATTEMPTS {
            let outcome = match fs::read_to_string(path) {
                Ok(content) => parse_descriptor(content.trim()),
                Err(err) => Err(format!("read failed: {err}")),
            };

            match outcome {
                Ok(descriptor) => return Ok(descriptor),
                Err(reason) => {
                    if attempt < PARSE_ATTEMPTS {
                        self.log.push(format!(
                            "lockfile busy, retry {attempt}/{PARSE_ATTEMPTS}"
                        ));
                        std::thread::sleep(PARSE_RETRY_DELAY);
                    }
                    last_reason = reason;
                }
            }
        }

        Err(Error::DescriptorUnreadable {
            path: path.display().to_string(),
            reason: last_reason,
        })
    }
}

/// Parses `name:pid:port:secret:scheme`.
///
/// The reason string on failure is safe to log: it never quotes the content.
fn parse_descriptor(content: &str) -> std::result::Result<ConnectionDescriptor, String> {
    let parts: Vec<&str> = content.split(':').collect();
    if parts.len() < 5 {
        return Err(format!("malformed: expected 5 fields, got {}", parts.len()));
    }

    let port: u16 = parts[2]
        .trim()
        .parse()
        .map_err(|_| "invalid port field".to_string())?;

    Ok(ConnectionDescriptor {
        port,
        secret: parts[3].trim().to_string(),
        scheme: TransportScheme::from_wire(parts[4].trim()),
    })
}

/// Conventional install locations, checked verbatim.
fn conventional_install_dirs() -> Vec<PathBuf> {
    [
        r"C:\Riot Games\League of Legends",
        r"D:\Riot Games\League of Legends",
        r"E:\Riot Games\League of Legends",
        r"C:\Program Files\Riot Games\League of Legends",
        r"D:\Program Files\Riot Games\League of Legends",
        r"E:\Program Files\Riot Games\League of Legends",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

/// Conventional subpaths on every fixed drive root that exists.
///
/// Drive letters are a Windows notion, where the client lives; elsewhere no
/// root exists and the scan is a no-op.
fn drive_scan_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    for letter in b'C'..=b'Z' {
        let root = PathBuf::from(format!(r"{}:\", letter as char));
        if !root.exists() {
            continue;
        }
        dirs.push(root.join(r"Riot Games\League of Legends"));
        dirs.push(root.join(r"Program Files\Riot Games\League of Legends"));
    }
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn locator_for(dir: &Path) -> (CredentialLocator, ConnectionLog) {
        let log = ConnectionLog::new();
        let locator = CredentialLocator::new(
            LocatorConfig {
                install_path: Some(dir.to_path_buf()),
            },
            log.clone(),
        );
        (locator, log)
    }

    #[test]
    fn valid_lockfile_is_located_via_configured_path() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("lockfile"), "LeagueClientUx:1234:2999:abc123:https").unwrap();

        let (locator, log) = locator_for(dir.path());
        let descriptor = locator.locate().unwrap();

        assert_eq!(descriptor.port, 2999);
        assert_eq!(descriptor.secret, "abc123");
        assert_eq!(descriptor.scheme, TransportScheme::Https);

        // The secret must not leak into the diagnostic log.
        for entry in log.snapshot() {
            assert!(!entry.contains("abc123"), "secret leaked: {entry}");
        }
    }

    #[test]
    fn missing_lockfile_everywhere_is_not_found() {
        let dir = tempdir().unwrap();
        let (locator, log) = locator_for(dir.path());

        assert!(matches!(locator.locate(), Err(Error::DescriptorNotFound)));
        assert!(
            log.snapshot()
                .iter()
                .any(|entry| entry.contains("lockfile probe exhausted"))
        );
    }

    #[test]
    fn short_field_count_is_a_miss_not_a_panic() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("lockfile"), "LeagueClientUx:1234:2999").unwrap();

        let (locator, _log) = locator_for(dir.path());
        assert!(matches!(locator.locate(), Err(Error::DescriptorNotFound)));
    }

    #[test]
    fn non_numeric_port_is_a_miss() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("lockfile"), "LeagueClientUx:1234:no-port:abc:https").unwrap();

        let (locator, _log) = locator_for(dir.path());
        assert!(matches!(locator.locate(), Err(Error::DescriptorNotFound)));
    }

    #[test]
    fn parse_descriptor_accepts_extra_fields() {
        // A secret containing a colon splits into extra fields; the first
        // five positions still carry the descriptor.
        let descriptor = parse_descriptor("LeagueClientUx:1234:2999:abc:https").unwrap();
        assert_eq!(descriptor.port, 2999);

        let short = parse_descriptor("only:two");
        assert!(short.is_err());
    }

    #[test]
    fn http_scheme_is_preserved_and_unknown_defaults_secure() {
        let http = parse_descriptor("x:1:2999:s:http").unwrap();
        assert_eq!(http.scheme, TransportScheme::Http);

        let odd = parse_descriptor("x:1:2999:s:carrier-pigeon").unwrap();
        assert_eq!(odd.scheme, TransportScheme::Https);
    }

    #[test]
    fn descriptor_debug_redacts_secret() {
        let descriptor = parse_descriptor("x:1:2999:topsecret:https").unwrap();
        let rendered = format!("{descriptor:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("topsecret"));
    }
}
