//! The provider abstraction embedding applications program against.

use async_trait::async_trait;

use lcu_protocol::GamePhase;
use lcu_runtime::Result;

/// Game mode string returned when no mode can be determined.
pub const GAME_MODE_UNKNOWN: &str = "UNKNOWN";

/// Read-only view of the local game client's session state.
///
/// Implementations never panic on an absent client: every getter degrades
/// to its neutral value (`GamePhase::None`, `None`, empty, `UNKNOWN`) when
/// nothing is reachable.
#[async_trait]
pub trait GameStateProvider: Send + Sync {
    /// Attempts one full connection; recoverable failure is an `Err`, not a
    /// panic. Safe to call while already connected.
    async fn try_connect(&self) -> Result<()>;

    /// Tears down the connection and background work. Idempotent.
    async fn disconnect(&self);

    /// Starts background monitoring (liveness, reconnect, event stream).
    /// Idempotent.
    fn start_monitoring(&self);

    /// Stops background monitoring without forgetting the session.
    async fn stop_monitoring(&self);

    /// Current gameflow phase; `GamePhase::None` when disconnected.
    async fn phase(&self) -> GamePhase;

    /// Locally selected champion id, when one is locked and visible.
    async fn my_champion_id(&self) -> Option<i32>;

    /// Visible enemy champion ids; empty outside champ select and game.
    async fn enemy_champion_ids(&self) -> Vec<i32>;

    /// Active game mode, or [`GAME_MODE_UNKNOWN`].
    async fn game_mode(&self) -> String;

    /// `true` while a verified session is installed.
    fn is_connected(&self) -> bool;

    /// `true` while the push channel is open and subscribed.
    fn is_event_stream_active(&self) -> bool;

    /// Short label naming the provider and its active transport.
    fn provider_name(&self) -> &'static str;
}
