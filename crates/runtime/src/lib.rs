//! Runtime for talking to a locally running League Client Update (LCU)
//! service: credential discovery, authenticated transports, state tracking,
//! and the reconnection supervisor that ties them together.
//!
//! The layering is strict:
//!
//! - [`lockfile`] finds and parses the rotating credentials
//! - [`transport`] turns a credential set into REST calls and an event stream
//! - [`tracker`] deduplicates observed state and fans out change callbacks
//! - [`supervisor`] drives all of the above across client restarts
//!
//! Security posture: the lockfile secret lives only in memory, every `Debug`
//! impl and diagnostic log line redacts it, and TLS trust is only ever
//! relaxed for loopback targets ([`tls`]).

pub mod diag;
pub mod error;
pub mod host;
pub mod lockfile;
pub mod supervisor;
pub mod tls;
pub mod tracker;
pub mod transport;

pub use diag::ConnectionLog;
pub use error::{Error, Result};
pub use lockfile::{ConnectionDescriptor, CredentialLocator, LocatorConfig, TransportScheme};
pub use supervisor::{SessionHealth, SessionSupervisor};
pub use tracker::StateTracker;
pub use transport::{EventStream, TransportSession};
