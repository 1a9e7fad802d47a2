//! Last-known state and change fan-out.
//!
//! The tracker is the single writer boundary for phase, selection, and
//! connection state. The supervisor and the frame-receive task both propose
//! updates through `apply_*`; every other component only reads. A callback
//! fires if and only if the accepted value differs from the last accepted
//! value on that channel, so subscribers never see redundant repeats.
//!
//! Callbacks run on whichever background task applied the update; consumers
//! marshal onto their own execution context if they need to. Ordering is
//! guaranteed per channel only.

use std::sync::Arc;

use parking_lot::Mutex;

use lcu_protocol::GamePhase;

type PhaseCallback = Arc<dyn Fn(GamePhase) + Send + Sync>;
type SelectionCallback = Arc<dyn Fn(Option<i32>) + Send + Sync>;
type ConnectionCallback = Arc<dyn Fn(bool) + Send + Sync>;

#[derive(Debug, Default)]
struct Known {
    phase: GamePhase,
    champion_id: Option<i32>,
    enemy_champion_ids: Vec<i32>,
    connected: bool,
}

/// Deduplicating state holder with observer registries.
#[derive(Default)]
pub struct StateTracker {
    /// Serializes apply+emit so each channel delivers in application order.
    apply_order: Mutex<()>,
    known: Mutex<Known>,
    phase_subs: Mutex<Vec<PhaseCallback>>,
    selection_subs: Mutex<Vec<SelectionCallback>>,
    connection_subs: Mutex<Vec<ConnectionCallback>>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- reads ----

    pub fn phase(&self) -> GamePhase {
        self.known.lock().phase
    }

    pub fn champion_id(&self) -> Option<i32> {
        self.known.lock().champion_id
    }

    pub fn enemy_champion_ids(&self) -> Vec<i32> {
        self.known.lock().enemy_champion_ids.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.known.lock().connected
    }

    // ---- writes ----

    /// Accepts a phase observation; fires subscribers only on change.
    ///
    /// A regression to [`GamePhase::None`] also clears the selection state,
    /// which fires the selection channel if a champion had been known.
    pub fn apply_phase(&self, phase: GamePhase) {
        let _order = self.apply_order.lock();

        let (phase_changed, selection_cleared) = {
            let mut known = self.known.lock();
            let phase_changed = known.phase != phase;
            known.phase = phase;

            let mut selection_cleared = false;
            if phase == GamePhase::None {
                selection_cleared = known.champion_id.is_some();
                known.champion_id = None;
                known.enemy_champion_ids.clear();
            }
            (phase_changed, selection_cleared)
        };

        if phase_changed {
            self.emit_phase(phase);
        }
        if selection_cleared {
            self.emit_selection(None);
        }
    }

    /// Accepts a selection observation.
    ///
    /// Enemy ids are stored silently (there is no dedicated channel for
    /// them); the selection channel fires only when the local champion
    /// changes.
    pub fn apply_selection(&self, champion_id: Option<i32>, enemy_champion_ids: Vec<i32>) {
        let _order = self.apply_order.lock();

        let changed = {
            let mut known = self.known.lock();
            known.enemy_champion_ids = enemy_champion_ids;
            let changed = known.champion_id != champion_id;
            known.champion_id = champion_id;
            changed
        };

        if changed {
            self.emit_selection(champion_id);
        }
    }

    /// Accepts a connectivity observation; fires only on change.
    pub fn set_connected(&self, connected: bool) {
        let _order = self.apply_order.lock();

        let changed = {
            let mut known = self.known.lock();
            let changed = known.connected != connected;
            known.connected = connected;
            changed
        };

        if changed {
            self.emit_connection(connected);
        }
    }

    /// Explicit disconnect: phase forced to `None`, selection cleared,
    /// connection dropped. Each channel fires at most once, and only if it
    /// actually changed, so a second call is a no-op.
    pub fn reset_to_disconnected(&self) {
        self.apply_phase(GamePhase::None);
        self.set_connected(false);
    }

    // ---- subscriptions ----

    pub fn subscribe_phase(&self, callback: impl Fn(GamePhase) + Send + Sync + 'static) {
        self.phase_subs.lock().push(Arc::new(callback));
    }

    pub fn subscribe_selection(&self, callback: impl Fn(Option<i32>) + Send + Sync + 'static) {
        self.selection_subs.lock().push(Arc::new(callback));
    }

    pub fn subscribe_connection(&self, callback: impl Fn(bool) + Send + Sync + 'static) {
        self.connection_subs.lock().push(Arc::new(callback));
    }

    // Registries are cloned out before invocation so a callback can take new
    // subscriptions without deadlocking; the apply_order guard (held by the
    // caller) keeps delivery in application order.

    fn emit_phase(&self, phase: GamePhase) {
        let subs: Vec<_> = self.phase_subs.lock().clone();
        for callback in subs {
            callback(phase);
        }
    }

    fn emit_selection(&self, champion_id: Option<i32>) {
        let subs: Vec<_> = self.selection_subs.lock().clone();
        for callback in subs {
            callback(champion_id);
        }
    }

    fn emit_connection(&self, connected: bool) {
        let subs: Vec<_> = self.connection_subs.lock().clone();
        for callback in subs {
            callback(connected);
        }
    }
}

impl std::fmt::Debug for StateTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let known = self.known.lock();
        f.debug_struct("StateTracker")
            .field("phase", &known.phase)
            .field("champion_id", &known.champion_id)
            .field("connected", &known.connected)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recording_tracker() -> (Arc<StateTracker>, Arc<Mutex<Vec<GamePhase>>>) {
        let tracker = Arc::new(StateTracker::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        tracker.subscribe_phase(move |phase| sink.lock().push(phase));
        (tracker, seen)
    }

    #[test]
    fn phase_fires_once_per_run_of_equal_values() {
        let (tracker, seen) = recording_tracker();

        tracker.apply_phase(GamePhase::Lobby);
        tracker.apply_phase(GamePhase::Lobby);
        tracker.apply_phase(GamePhase::ChampSelect);
        tracker.apply_phase(GamePhase::ChampSelect);
        tracker.apply_phase(GamePhase::ChampSelect);
        tracker.apply_phase(GamePhase::Lobby);

        assert_eq!(
            *seen.lock(),
            vec![GamePhase::Lobby, GamePhase::ChampSelect, GamePhase::Lobby]
        );
    }

    #[test]
    fn initial_none_phase_does_not_fire() {
        let (tracker, seen) = recording_tracker();
        tracker.apply_phase(GamePhase::None);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn selection_dedup_ignores_repeats() {
        let tracker = StateTracker::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        tracker.subscribe_selection(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tracker.apply_selection(Some(103), vec![64]);
        tracker.apply_selection(Some(103), vec![64, 55]);
        tracker.apply_selection(Some(7), vec![64, 55]);

        assert_eq!(count.load(Ordering::SeqCst), 2);
        // Enemy ids still track the latest observation silently.
        assert_eq!(tracker.enemy_champion_ids(), vec![64, 55]);
    }

    #[test]
    fn phase_regression_to_none_clears_selection() {
        let tracker = StateTracker::new();
        let selections = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&selections);
        tracker.subscribe_selection(move |id| sink.lock().push(id));

        tracker.apply_phase(GamePhase::ChampSelect);
        tracker.apply_selection(Some(103), vec![64]);
        tracker.apply_phase(GamePhase::None);

        assert_eq!(tracker.champion_id(), None);
        assert!(tracker.enemy_champion_ids().is_empty());
        assert_eq!(*selections.lock(), vec![Some(103), None]);
    }

    #[test]
    fn double_reset_fires_connection_at_most_once() {
        let tracker = StateTracker::new();
        tracker.set_connected(true);

        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        tracker.subscribe_connection(move |connected| {
            assert!(!connected);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tracker.reset_to_disconnected();
        tracker.reset_to_disconnected();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn connection_dedup() {
        let tracker = StateTracker::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        tracker.subscribe_connection(move |connected| sink.lock().push(connected));

        tracker.set_connected(true);
        tracker.set_connected(true);
        tracker.set_connected(false);
        tracker.set_connected(false);

        assert_eq!(*events.lock(), vec![true, false]);
    }

    #[test]
    fn callback_can_subscribe_without_deadlock() {
        let tracker = Arc::new(StateTracker::new());
        let inner = Arc::clone(&tracker);
        tracker.subscribe_phase(move |_| {
            inner.subscribe_selection(|_| {});
        });
        tracker.apply_phase(GamePhase::Lobby);
    }
}
