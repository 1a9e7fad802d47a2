//! REST session payload shapes.
//!
//! Only the fields this library reads are modeled; everything else the LCU
//! sends is ignored by serde. Deserialization stays tolerant because the
//! client rewrites these payloads freely between patches.

use serde::Deserialize;
use serde_json::Value;

/// One seat in a champ-select team array.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamSlot {
    /// Seat identifier, joined against `localPlayerCellId`.
    #[serde(rename = "cellId", default)]
    pub cell_id: i64,
    /// Selected champion, `0` while nothing is locked.
    #[serde(rename = "championId", default)]
    pub champion_id: i32,
}

/// Champ-select session as served by `/lol-champ-select/v1/session` and
/// pushed on the champ-select event topic.
#[derive(Debug, Clone, Deserialize)]
pub struct ChampSelectSession {
    #[serde(rename = "localPlayerCellId", default = "missing_cell_id")]
    pub local_player_cell_id: i64,
    #[serde(rename = "myTeam", default)]
    pub my_team: Vec<TeamSlot>,
    #[serde(rename = "theirTeam", default)]
    pub their_team: Vec<TeamSlot>,
}

fn missing_cell_id() -> i64 {
    -1
}

impl ChampSelectSession {
    /// Champion id for the local player's seat.
    ///
    /// Returns `None` when the seat can't be found or nothing is locked yet
    /// (`championId == 0`).
    pub fn my_champion_id(&self) -> Option<i32> {
        self.my_team
            .iter()
            .find(|slot| slot.cell_id == self.local_player_cell_id)
            .and_then(|slot| (slot.champion_id > 0).then_some(slot.champion_id))
    }

    /// Champion ids visible on the opposing team, in seat order.
    ///
    /// Unlocked seats (`championId == 0`) are skipped.
    pub fn enemy_champion_ids(&self) -> Vec<i32> {
        self.their_team
            .iter()
            .filter(|slot| slot.champion_id > 0)
            .map(|slot| slot.champion_id)
            .collect()
    }
}

/// Gameflow session, probed only for the active game mode.
#[derive(Debug, Clone, Deserialize)]
pub struct GameflowSession {
    #[serde(rename = "gameData", default)]
    pub game_data: Value,
}

impl GameflowSession {
    /// Extracts `gameData.queue.gameMode`, or `None` if the nesting isn't
    /// there (e.g. outside of an active queue).
    pub fn game_mode(&self) -> Option<&str> {
        self.game_data.get("queue")?.get("gameMode")?.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(local: i64, mine: &[(i64, i32)], theirs: &[i32]) -> ChampSelectSession {
        ChampSelectSession {
            local_player_cell_id: local,
            my_team: mine
                .iter()
                .map(|&(cell_id, champion_id)| TeamSlot {
                    cell_id,
                    champion_id,
                })
                .collect(),
            their_team: theirs
                .iter()
                .map(|&champion_id| TeamSlot {
                    cell_id: 0,
                    champion_id,
                })
                .collect(),
        }
    }

    #[test]
    fn my_champion_id_joins_on_cell_id() {
        let s = session(2, &[(0, 10), (1, 20), (2, 30)], &[]);
        assert_eq!(s.my_champion_id(), Some(30));
    }

    #[test]
    fn unlocked_champion_reads_as_none() {
        let s = session(1, &[(1, 0)], &[]);
        assert_eq!(s.my_champion_id(), None);
    }

    #[test]
    fn missing_seat_reads_as_none() {
        let s = session(9, &[(0, 10)], &[]);
        assert_eq!(s.my_champion_id(), None);
    }

    #[test]
    fn enemy_ids_skip_unlocked_seats() {
        let s = session(0, &[], &[55, 0, 103]);
        assert_eq!(s.enemy_champion_ids(), vec![55, 103]);
    }

    #[test]
    fn gameflow_session_extracts_nested_mode() {
        let s: GameflowSession = serde_json::from_str(
            r#"{"gameData":{"queue":{"gameMode":"ARAM"}},"phase":"InProgress"}"#,
        )
        .unwrap();
        assert_eq!(s.game_mode(), Some("ARAM"));
    }

    #[test]
    fn gameflow_session_without_queue_has_no_mode() {
        let s: GameflowSession = serde_json::from_str(r#"{"gameData":{}}"#).unwrap();
        assert_eq!(s.game_mode(), None);
    }

    #[test]
    fn champ_select_deserializes_wire_field_names() {
        let s: ChampSelectSession = serde_json::from_str(
            r#"{
                "localPlayerCellId": 3,
                "myTeam": [{"cellId": 3, "championId": 412, "summonerId": 99}],
                "theirTeam": [{"cellId": 5, "championId": 64}]
            }"#,
        )
        .unwrap();
        assert_eq!(s.my_champion_id(), Some(412));
        assert_eq!(s.enemy_champion_ids(), vec![64]);
    }
}
