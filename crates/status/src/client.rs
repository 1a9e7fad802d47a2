//! The LCU-backed [`GameStateProvider`].

use async_trait::async_trait;
use tracing::debug;

use lcu_protocol::GamePhase;
use lcu_runtime::supervisor::SessionHealth;
use lcu_runtime::{LocatorConfig, Result, SessionSupervisor};

use crate::provider::{GAME_MODE_UNKNOWN, GameStateProvider};

/// Live client status over the LCU's local RPC service.
///
/// Getters prefer a fresh REST read when a session is up and fall back to
/// the last tracked value otherwise, so they stay cheap and non-panicking
/// whether or not the client is running. Cheap to clone; clones share the
/// same session.
#[derive(Clone, Debug)]
pub struct LcuStatusClient {
    supervisor: SessionSupervisor,
}

impl LcuStatusClient {
    pub fn new(config: LocatorConfig) -> Self {
        Self {
            supervisor: SessionSupervisor::new(config),
        }
    }

    /// Fires on every accepted phase change, deduplicated.
    pub fn on_phase_changed(&self, callback: impl Fn(GamePhase) + Send + Sync + 'static) {
        self.supervisor.tracker().subscribe_phase(callback);
    }

    /// Fires when the local champion selection changes; `None` clears it.
    pub fn on_selection_changed(&self, callback: impl Fn(Option<i32>) + Send + Sync + 'static) {
        self.supervisor.tracker().subscribe_selection(callback);
    }

    /// Fires on connect and disconnect, deduplicated.
    pub fn on_connection_changed(&self, callback: impl Fn(bool) + Send + Sync + 'static) {
        self.supervisor.tracker().subscribe_connection(callback);
    }

    /// Recent connection diagnostics, oldest first. Never contains the
    /// lockfile secret.
    pub fn connection_log(&self) -> Vec<String> {
        self.supervisor.log().snapshot()
    }

    /// Point-in-time connectivity summary.
    pub fn health(&self) -> SessionHealth {
        self.supervisor.health()
    }
}

impl Default for LcuStatusClient {
    fn default() -> Self {
        Self::new(LocatorConfig::default())
    }
}

#[async_trait]
impl GameStateProvider for LcuStatusClient {
    async fn try_connect(&self) -> Result<()> {
        self.supervisor.try_connect().await
    }

    async fn disconnect(&self) {
        self.supervisor.disconnect().await;
    }

    fn start_monitoring(&self) {
        self.supervisor.start_monitoring();
    }

    async fn stop_monitoring(&self) {
        self.supervisor.stop_monitoring().await;
    }

    async fn phase(&self) -> GamePhase {
        let tracker = self.supervisor.tracker();
        if let Some(session) = self.supervisor.session() {
            match session.phase().await {
                Ok(phase) => {
                    tracker.apply_phase(phase);
                    return phase;
                }
                Err(err) => debug!(target = "lcu.status", error = %err, "phase read fell back to cache"),
            }
        }
        tracker.phase()
    }

    async fn my_champion_id(&self) -> Option<i32> {
        self.refresh_selection_if_relevant().await;
        self.supervisor.tracker().champion_id()
    }

    async fn enemy_champion_ids(&self) -> Vec<i32> {
        self.refresh_selection_if_relevant().await;
        self.supervisor.tracker().enemy_champion_ids()
    }

    async fn game_mode(&self) -> String {
        if let Some(session) = self.supervisor.session() {
            match session.game_mode().await {
                Ok(Some(mode)) => return mode,
                Ok(None) => {}
                Err(err) => debug!(target = "lcu.status", error = %err, "game mode unavailable"),
            }
        }
        GAME_MODE_UNKNOWN.to_string()
    }

    fn is_connected(&self) -> bool {
        self.supervisor.tracker().is_connected()
    }

    fn is_event_stream_active(&self) -> bool {
        self.supervisor.is_event_stream_open()
    }

    fn provider_name(&self) -> &'static str {
        if self.supervisor.is_event_stream_open() {
            "LCU (WS)"
        } else {
            "LCU (REST)"
        }
    }
}

impl LcuStatusClient {
    /// Refreshes selection over REST, but only in phases where the
    /// champ-select endpoint can answer; otherwise the cache stands.
    async fn refresh_selection_if_relevant(&self) {
        let tracker = self.supervisor.tracker();
        if !tracker.phase().selection_is_valid() {
            return;
        }
        if let Some(session) = self.supervisor.session() {
            if let Ok(cs) = session.champ_select().await {
                tracker.apply_selection(cs.my_champion_id(), cs.enemy_champion_ids());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn provider_name_reflects_transport() {
        let client = LcuStatusClient::default();
        // No stream was ever opened, so the REST label applies.
        assert_eq!(client.provider_name(), "LCU (REST)");
    }

    #[tokio::test]
    async fn getters_degrade_gracefully_without_a_client() {
        let client = LcuStatusClient::default();

        assert_eq!(client.phase().await, GamePhase::None);
        assert_eq!(client.my_champion_id().await, None);
        assert!(client.enemy_champion_ids().await.is_empty());
        assert_eq!(client.game_mode().await, GAME_MODE_UNKNOWN);
        assert!(!client.is_connected());
        assert!(!client.is_event_stream_active());
    }

    #[tokio::test]
    async fn double_disconnect_without_a_session_fires_nothing() {
        let client = LcuStatusClient::default();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        client.on_connection_changed(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        client.disconnect().await;
        client.disconnect().await;

        // Never connected, so there is no transition to report.
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn connection_log_is_exposed_and_clean() {
        let client = LcuStatusClient::default();
        client.disconnect().await;

        let log = client.connection_log();
        assert!(log.iter().any(|entry| entry.contains("disconnected")));
    }

    #[test]
    fn health_starts_all_down() {
        let client = LcuStatusClient::default();
        let health = client.health();
        assert!(!health.rest_reachable);
        assert!(!health.event_stream_open);
        assert!(!health.host_process_running);
        assert_eq!(health.dropped_frames, 0);
    }
}
