//! lcu-status: read-only live status from a locally running League client.
//!
//! Discovers the client's rotating credentials from its lockfile, talks to
//! the local RPC service over HTTPS and WebSocket, and surfaces the current
//! gameflow phase, champion selection, and game mode through the
//! [`GameStateProvider`] trait. A background supervisor keeps the session
//! alive across client restarts.
//!
//! # Example
//!
//! ```ignore
//! use lcu_status::{GameStateProvider, LcuStatusClient};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = LcuStatusClient::default();
//!
//!     client.on_phase_changed(|phase| println!("phase: {phase:?}"));
//!     client.on_selection_changed(|id| println!("champion: {id:?}"));
//!
//!     if client.try_connect().await.is_err() {
//!         println!("client not running yet; monitoring will pick it up");
//!     }
//!     client.start_monitoring();
//!
//!     tokio::signal::ctrl_c().await.ok();
//!     client.disconnect().await;
//! }
//! ```

pub mod client;
pub mod provider;

pub use client::LcuStatusClient;
pub use provider::{GAME_MODE_UNKNOWN, GameStateProvider};

pub use lcu_protocol::GamePhase;
pub use lcu_runtime::{Error, LocatorConfig, Result, SessionHealth};
