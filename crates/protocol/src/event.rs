//! WAMP-flavored event frames and the pure decoder for them.
//!
//! The LCU WebSocket speaks a small WAMP subset: outbound subscribe frames
//! are `[5, "<topic>"]`, inbound event frames are `[8, "<topic>", payload]`
//! where the payload wraps the actual data in a `{"data": ..., "uri": ...,
//! "eventType": ...}` envelope. Everything else on the socket is ignored.

use serde_json::Value;

use crate::phase::GamePhase;
use crate::session::ChampSelectSession;

/// WAMP SUBSCRIBE opcode.
pub const OP_SUBSCRIBE: u8 = 5;
/// WAMP EVENT opcode; the only inbound opcode that carries state.
pub const OP_EVENT: u8 = 8;

/// Gameflow phase change topic.
pub const TOPIC_GAMEFLOW_PHASE: &str = "OnJsonApiEvent_lol-gameflow_v1_gameflow-phase";
/// Champ-select session change topic.
pub const TOPIC_CHAMP_SELECT: &str = "OnJsonApiEvent_lol-champ-select_v1_session";

/// A state change decoded from one inbound event frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The gameflow phase moved.
    PhaseChanged(GamePhase),
    /// The champ-select session changed.
    SelectionChanged {
        /// Local player's locked champion, if any.
        champion_id: Option<i32>,
        /// Visible enemy champion ids, in seat order.
        enemy_champion_ids: Vec<i32>,
    },
}

/// A frame that could not be decoded.
///
/// Carries a static reason for low-severity logging; deliberately not an
/// error type, because one bad frame never takes the stream down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedFrame(pub &'static str);

impl std::fmt::Display for MalformedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Renders the subscribe frame for a topic, e.g. `[5, "OnJsonApiEvent_..."]`.
pub fn subscribe_frame(topic: &str) -> String {
    // Topics are fixed identifiers, but go through the serializer anyway so
    // the frame stays valid JSON whatever the topic contains.
    format!(
        "[{}, {}]",
        OP_SUBSCRIBE,
        serde_json::to_string(topic).unwrap_or_else(|_| "\"\"".to_string())
    )
}

/// Decodes one inbound text frame.
///
/// Pure and stateless. Returns:
///
/// - `Ok(Some(event))` for an EVENT frame on a subscribed topic
/// - `Ok(None)` for frames that are valid but not for us: opcode other
///   than EVENT, or an EVENT on a topic we don't track
/// - `Err(_)` for frames that don't match the wire shape at all
///
/// Callers drop malformed frames and keep reading; the distinction from
/// `Ok(None)` exists only so the drop can be counted and logged.
pub fn decode_frame(text: &str) -> Result<Option<ClientEvent>, MalformedFrame> {
    let root: Value =
        serde_json::from_str(text).map_err(|_| MalformedFrame("frame is not valid JSON"))?;
    let frame = root
        .as_array()
        .ok_or(MalformedFrame("frame is not a JSON array"))?;

    let opcode = frame
        .first()
        .and_then(Value::as_u64)
        .ok_or(MalformedFrame("missing numeric opcode"))?;
    if opcode != u64::from(OP_EVENT) {
        return Ok(None);
    }

    if frame.len() < 3 {
        return Err(MalformedFrame("EVENT frame shorter than 3 elements"));
    }
    let topic = frame[1]
        .as_str()
        .ok_or(MalformedFrame("topic is not a string"))?;
    let data = frame[2]
        .get("data")
        .ok_or(MalformedFrame("payload has no data envelope"))?;

    match topic {
        TOPIC_GAMEFLOW_PHASE => {
            let name = data
                .as_str()
                .ok_or(MalformedFrame("phase payload is not a string"))?;
            Ok(Some(ClientEvent::PhaseChanged(GamePhase::from_wire(name))))
        }
        TOPIC_CHAMP_SELECT => {
            let session: ChampSelectSession = serde_json::from_value(data.clone())
                .map_err(|_| MalformedFrame("champ-select payload has unexpected shape"))?;
            Ok(Some(ClientEvent::SelectionChanged {
                champion_id: session.my_champion_id(),
                enemy_champion_ids: session.enemy_champion_ids(),
            }))
        }
        _ => Ok(None),
    }
}
