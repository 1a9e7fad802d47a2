//! Wire types for the League Client Update (LCU) local RPC protocol.
//!
//! This crate knows nothing about sockets or lifecycles; it only describes
//! what travels over the wire:
//!
//! - **Gameflow phases**: the client's coarse session state and the fixed
//!   string mapping the LCU uses for it
//! - **Event frames**: the WAMP-flavored `[opcode, topic, payload]` arrays
//!   pushed over the WebSocket, and a pure decoder for the two topics this
//!   library subscribes to
//! - **Session payloads**: the champ-select and gameflow session shapes
//!   returned by the REST endpoints

pub mod event;
pub mod phase;
pub mod session;

pub use event::{
    ClientEvent, MalformedFrame, OP_EVENT, OP_SUBSCRIBE, TOPIC_CHAMP_SELECT, TOPIC_GAMEFLOW_PHASE,
    decode_frame, subscribe_frame,
};
pub use phase::GamePhase;
pub use session::{ChampSelectSession, GameflowSession, TeamSlot};
