//! Synchronous signal bus implementation.

use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde_json::Value;

use super::signal::{Signal, SignalRecord};

/// Handler invoked for each matching signal.
pub type SignalHandler = Arc<dyn Fn(&SignalRecord) -> anyhow::Result<()> + Send + Sync>;

/// Handle returned by [`SignalBus::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    signal: Signal,
    handler: SignalHandler,
}

struct BusState {
    subscribers: HashMap<Signal, Vec<Subscriber>>,
    history: VecDeque<SignalRecord>,
    history_capacity: usize,
    next_subscription: u64,
    next_seq: u64,
}

/// In-process publish/subscribe for [`Signal`]s.
///
/// Handlers run synchronously on the publishing thread, in subscription
/// order. A handler that returns an error or panics is logged and the
/// remaining handlers still run. The last `history_capacity` records are kept
/// for diagnostics, oldest dropped first.
///
/// The internal lock is never held while handlers run, so a handler may
/// publish or (un)subscribe itself.
pub struct SignalBus {
    state: Arc<Mutex<BusState>>,
}

impl SignalBus {
    /// History size used by [`SignalBus::new`].
    pub const DEFAULT_HISTORY: usize = game_core::GameConfig::DEFAULT_SIGNAL_HISTORY;

    /// Creates a new signal bus with the default history size
    pub fn new() -> Self {
        Self::with_history(Self::DEFAULT_HISTORY)
    }

    /// Creates a new signal bus keeping at most `capacity` records.
    pub fn with_history(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(BusState {
                subscribers: HashMap::new(),
                history: VecDeque::with_capacity(capacity.min(Self::DEFAULT_HISTORY)),
                history_capacity: capacity,
                next_subscription: 1,
                next_seq: 1,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `handler` for `signal`. Later subscribers run after earlier ones.
    pub fn subscribe<F>(&self, signal: Signal, handler: F) -> SubscriptionId
    where
        F: Fn(&SignalRecord) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut state = self.lock();
        let id = SubscriptionId(state.next_subscription);
        state.next_subscription += 1;
        state.subscribers.entry(signal).or_default().push(Subscriber {
            id,
            signal,
            handler: Arc::new(handler),
        });
        id
    }

    /// Removes a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.lock();
        for list in state.subscribers.values_mut() {
            if let Some(pos) = list.iter().position(|s| s.id == id) {
                let removed = list.remove(pos);
                tracing::trace!(signal = %removed.signal, ?id, "unsubscribed");
                return true;
            }
        }
        false
    }

    /// Records a signal and delivers it to every current subscriber.
    pub fn publish(&self, signal: Signal, source: impl Into<String>, payload: Value) -> SignalRecord {
        let (record, handlers) = {
            let mut state = self.lock();
            let record = SignalRecord {
                seq: state.next_seq,
                signal,
                source: source.into(),
                payload,
                timestamp: Utc::now(),
            };
            state.next_seq += 1;

            if state.history_capacity > 0 {
                while state.history.len() >= state.history_capacity {
                    state.history.pop_front();
                }
                state.history.push_back(record.clone());
            }

            let handlers: Vec<(SubscriptionId, SignalHandler)> = state
                .subscribers
                .get(&signal)
                .map(|list| list.iter().map(|s| (s.id, Arc::clone(&s.handler))).collect())
                .unwrap_or_default();
            (record, handlers)
        };

        tracing::trace!(
            %signal,
            seq = record.seq,
            source = %record.source,
            handlers = handlers.len(),
            "signal published"
        );

        for (id, handler) in handlers {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(&record))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::error!(%signal, subscription = ?id, error = %err, "signal handler failed");
                }
                Err(_) => {
                    tracing::error!(%signal, subscription = ?id, "signal handler panicked");
                }
            }
        }
        record
    }

    /// The last `n` records, oldest first.
    pub fn history(&self, n: usize) -> Vec<SignalRecord> {
        let state = self.lock();
        let skip = state.history.len().saturating_sub(n);
        state.history.iter().skip(skip).cloned().collect()
    }

    /// Every retained record of one kind, oldest first.
    pub fn history_of(&self, signal: Signal) -> Vec<SignalRecord> {
        self.lock()
            .history
            .iter()
            .filter(|r| r.signal == signal)
            .cloned()
            .collect()
    }

    pub fn history_capacity(&self) -> usize {
        self.lock().history_capacity
    }

    pub fn subscriber_count(&self, signal: Signal) -> usize {
        self.lock().subscribers.get(&signal).map_or(0, Vec::len)
    }

    pub fn clear_history(&self) {
        self.lock().history.clear();
    }

    pub fn clear_subscribers(&self) {
        self.lock().subscribers.clear();
    }
}

impl Clone for SignalBus {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    #[test]
    fn handlers_run_in_subscription_order() {
        let bus = SignalBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            bus.subscribe(Signal::RegistryReloaded, move |_| {
                seen.lock().unwrap().push(tag);
                Ok(())
            });
        }

        bus.publish(Signal::RegistryReloaded, "test", json!({}));
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn failing_handlers_do_not_stop_delivery() {
        let bus = SignalBus::new();
        let delivered = Arc::new(AtomicUsize::new(0));

        bus.subscribe(Signal::EntityDied, |_| anyhow::bail!("boom"));
        bus.subscribe(Signal::EntityDied, |_| panic!("handler panic"));
        let counter = Arc::clone(&delivered);
        bus.subscribe(Signal::EntityDied, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.publish(Signal::EntityDied, "test", json!({"name": "Imp"}));
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn only_matching_signal_is_delivered() {
        let bus = SignalBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        bus.subscribe(Signal::TurnStarted, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.publish(Signal::TurnEnded, "test", Value::Null);
        bus.publish(Signal::TurnStarted, "test", Value::Null);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = SignalBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let id = bus.subscribe(Signal::StatusTick, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert_eq!(bus.subscriber_count(Signal::StatusTick), 1);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(Signal::StatusTick, "test", Value::Null);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(bus.subscriber_count(Signal::StatusTick), 0);
    }

    #[test]
    fn history_is_bounded_and_drops_oldest() {
        let bus = SignalBus::with_history(3);
        for i in 0..5 {
            bus.publish(Signal::TurnStarted, "test", json!({ "turn": i }));
        }

        let history = bus.history(10);
        let seqs: Vec<u64> = history.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![3, 4, 5]);
        assert_eq!(bus.history(1)[0].int_field("turn"), Some(4));

        bus.clear_history();
        assert!(bus.history(10).is_empty());
    }

    #[test]
    fn zero_capacity_keeps_no_history() {
        let bus = SignalBus::with_history(0);
        let record = bus.publish(Signal::CombatStarted, "test", Value::Null);
        assert_eq!(record.seq, 1);
        assert!(bus.history(5).is_empty());
    }

    #[test]
    fn handlers_may_publish() {
        let bus = SignalBus::new();
        let inner = bus.clone();
        bus.subscribe(Signal::EntityHpChanged, move |record| {
            if record.int_field("health") == Some(0) {
                inner.publish(Signal::EntityDied, "test", Value::Null);
            }
            Ok(())
        });

        bus.publish(Signal::EntityHpChanged, "test", json!({"health": 0}));
        assert_eq!(bus.history_of(Signal::EntityDied).len(), 1);
    }

    #[test]
    fn clear_subscribers_removes_everything() {
        let bus = SignalBus::new();
        bus.subscribe(Signal::CombatEnded, |_| Ok(()));
        bus.subscribe(Signal::CombatStarted, |_| Ok(()));
        bus.clear_subscribers();
        assert_eq!(bus.subscriber_count(Signal::CombatEnded), 0);
        assert_eq!(bus.subscriber_count(Signal::CombatStarted), 0);
    }
}
