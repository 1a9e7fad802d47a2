//! Gameflow phase enumeration and the LCU's string mapping for it.

use serde::{Deserialize, Serialize};

/// Coarse lifecycle state of the client's current session.
///
/// Transitions are event-driven, not sequential: the client can jump from
/// any phase to any other (e.g. `InProgress` straight back to `None` on a
/// manual exit), so no ordering is implied here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// No active session, or the phase is unknown.
    #[default]
    None,
    /// Sitting in a lobby, queue not yet started.
    Lobby,
    /// Champion selection is in progress.
    ChampSelect,
    /// A game is running (includes game start and reconnect windows).
    InProgress,
    /// Post-game flow (end-of-game screens, stats).
    EndOfGame,
}

impl GamePhase {
    /// Maps an LCU gameflow phase string to a [`GamePhase`].
    ///
    /// The mapping is fixed by the wire protocol; several distinct LCU
    /// strings collapse onto one variant. Unrecognized strings map to
    /// [`GamePhase::None`] rather than failing, so a new client version
    /// introducing a phase name degrades gracefully.
    pub fn from_wire(name: &str) -> Self {
        match name {
            "None" => GamePhase::None,
            "Lobby" => GamePhase::Lobby,
            "ChampSelect" => GamePhase::ChampSelect,
            "InProgress" | "GameStart" | "Reconnect" => GamePhase::InProgress,
            "EndOfGame" | "PreEndOfGame" | "WaitingForStats" => GamePhase::EndOfGame,
            _ => GamePhase::None,
        }
    }

    /// Returns `true` while champ-select selection data is meaningful.
    pub fn selection_is_valid(self) -> bool {
        matches!(self, GamePhase::ChampSelect | GamePhase::InProgress)
    }
}
