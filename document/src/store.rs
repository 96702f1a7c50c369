//! The store (§4.6): the mutable holder of "current state", wired to the
//! transaction manager, a listener set and a pluggable reconciliation
//! scheduler. Everything else in this crate is pure; this is the one stateful
//! seam, matching the single mutable slot §5 requires.
//!
//! The core never names a runtime (§9): `IdleDeadline`/`Scheduler` are the
//! two narrow traits a host supplies. Because a self-capturing `&mut Store`
//! closure would force every embedding to pay for an `Rc<RefCell<Store>>`
//! even when it never uses a scheduler, the task handed to
//! `Scheduler::submit` carries no handle back into this store — a host
//! wiring a real scheduler uses its own side channel to call
//! [`Store::pump_reconciliation`] when the task fires. A host with no
//! scheduler at all just calls [`Store::reconcile_now`] (or
//! `pump_reconciliation` with a deadline of its own choosing) on its own
//! cadence.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::action::DocumentAction;
use crate::error::{describe_panic, Diagnostic, DiagnosticSink, LogDiagnosticSink};
use crate::line_index::{self, LineIndexStrategy};
use crate::reducer::{reduce, ReducerConfig};
use crate::state::DocumentState;
use crate::transaction::TransactionManager;

pub trait IdleDeadline {
    fn time_remaining_ms(&self) -> f64;
}

pub trait Scheduler {
    fn submit(&self, task: Box<dyn FnOnce(&dyn IdleDeadline)>);
}

const RECONCILE_MIN_REMAINING_MS: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn from_raw(id: u64) -> ListenerId {
        ListenerId(id)
    }

    pub(crate) fn raw(&self) -> u64 {
        self.0
    }
}

pub struct Store {
    state: DocumentState,
    tx: TransactionManager,
    strategy: Box<dyn LineIndexStrategy>,
    reducer_config: ReducerConfig,
    sink: Box<dyn DiagnosticSink>,
    scheduler: Option<Box<dyn Scheduler>>,
    listeners: Vec<(u64, Box<dyn Fn()>)>,
    next_listener_id: u64,
    pending_reconciliation: bool,
    is_reconciling: bool,
    viewport: Option<(u64, u64)>,
}

impl Store {
    pub fn new(state: DocumentState, strategy: Box<dyn LineIndexStrategy>) -> Store {
        Store {
            state,
            tx: TransactionManager::new(),
            strategy,
            reducer_config: ReducerConfig::default(),
            sink: Box::new(LogDiagnosticSink),
            scheduler: None,
            listeners: Vec::new(),
            next_listener_id: 0,
            pending_reconciliation: false,
            is_reconciling: false,
            viewport: None,
        }
    }

    pub fn new_with_sink(
        state: DocumentState,
        strategy: Box<dyn LineIndexStrategy>,
        sink: Box<dyn DiagnosticSink>,
    ) -> Store {
        Store {
            sink,
            ..Store::new(state, strategy)
        }
    }

    pub fn with_scheduler(mut self, scheduler: Box<dyn Scheduler>) -> Store {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn with_reducer_config(mut self, config: ReducerConfig) -> Store {
        self.reducer_config = config;
        self
    }

    pub fn get_snapshot(&self) -> &DocumentState {
        &self.state
    }

    pub(crate) fn sink(&self) -> &dyn DiagnosticSink {
        self.sink.as_ref()
    }

    pub(crate) fn strategy(&self) -> &dyn LineIndexStrategy {
        self.strategy.as_ref()
    }

    pub(crate) fn reducer_config(&self) -> &ReducerConfig {
        &self.reducer_config
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn()>) -> ListenerId {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.push((id, listener));
        ListenerId(id)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.retain(|(lid, _)| *lid != id.0);
    }

    /// Iterates a captured copy of the listener list so a handler that
    /// subscribes/unsubscribes doesn't perturb this pass (§5); a handler
    /// that panics is isolated and reported, the rest still run.
    fn notify_listeners(&self) {
        let snapshot: Vec<&Box<dyn Fn()>> = self.listeners.iter().map(|(_, f)| f).collect();
        for listener in snapshot {
            let result = panic::catch_unwind(AssertUnwindSafe(|| listener()));
            if let Err(payload) = result {
                self.sink.report(Diagnostic::ListenerFault {
                    message: describe_panic(payload.as_ref()),
                });
            }
        }
    }

    pub fn dispatch(&mut self, action: DocumentAction, now_ms: u64) -> DocumentState {
        match action {
            DocumentAction::TransactionStart => {
                self.tx.begin(self.state.clone());
            }
            DocumentAction::TransactionCommit => {
                let result = self.tx.commit();
                if result.is_outermost {
                    self.notify_listeners();
                    if !self.tx.is_active() && self.state.line_index.rebuild_pending() {
                        self.schedule_reconciliation();
                    }
                }
            }
            DocumentAction::TransactionRollback => {
                if let Some(snapshot) = self.tx.rollback() {
                    self.state = snapshot;
                }
                self.notify_listeners();
            }
            other => {
                let next = reduce(
                    &self.state,
                    &other,
                    self.strategy.as_ref(),
                    &self.reducer_config,
                    now_ms,
                );
                if !next.is_identical_to(&self.state) {
                    self.state = next;
                    if self.tx.is_active() {
                        self.tx.track_action(other);
                    } else {
                        self.notify_listeners();
                        if self.state.line_index.rebuild_pending() {
                            self.schedule_reconciliation();
                        }
                    }
                }
            }
        }
        self.state.clone()
    }

    /// `TRANSACTION_START`, each action in order, then `TRANSACTION_COMMIT`;
    /// on a panic from inside the loop, rolls back (and, if the rollback
    /// itself fails, performs an emergency reset to the bottom snapshot) and
    /// re-raises the original panic.
    pub fn batch(&mut self, actions: Vec<DocumentAction>, now_ms: u64) -> DocumentState {
        self.dispatch(DocumentAction::TransactionStart, now_ms);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            for action in actions {
                self.dispatch(action, now_ms);
            }
        }));

        match result {
            Ok(()) => {
                self.dispatch(DocumentAction::TransactionCommit, now_ms);
            }
            Err(payload) => {
                let rollback = panic::catch_unwind(AssertUnwindSafe(|| {
                    self.dispatch(DocumentAction::TransactionRollback, now_ms);
                }));
                if rollback.is_err() {
                    self.sink.report(Diagnostic::TransactionRollbackFault {
                        message: "rollback itself failed during batch; performing an emergency reset".to_string(),
                    });
                    if let Some(bottom) = self.tx.emergency_reset() {
                        self.state = bottom;
                    }
                    self.notify_listeners();
                }
                panic::resume_unwind(payload);
            }
        }

        self.state.clone()
    }

    /// Reconciles the visible window first (synchronously, so scrolling never
    /// shows dirty line metadata), then leaves any remaining dirty ranges for
    /// the background path.
    pub fn set_viewport(&mut self, start_line: u64, end_line: u64) {
        self.viewport = Some((start_line, end_line));
        let new_version = self.state.version + 1;
        let reconciled =
            line_index::reconcile_viewport(&self.state.line_index, start_line, end_line, new_version);
        if reconciled != *self.state.line_index {
            self.state = DocumentState {
                version: new_version,
                line_index: Arc::new(reconciled),
                ..self.state.clone()
            };
        }
        if self.state.line_index.rebuild_pending() {
            self.schedule_reconciliation();
        }
    }

    fn schedule_reconciliation(&mut self) {
        self.pending_reconciliation = true;
        if let Some(scheduler) = &self.scheduler {
            scheduler.submit(Box::new(|_deadline| {}));
        }
    }

    /// The idle-deadline callback body: reschedule if a transaction is active
    /// or time is nearly spent, otherwise reconcile and swap in the result
    /// without notifying (reconciliation never changes visible content).
    pub fn pump_reconciliation(&mut self, deadline: &dyn IdleDeadline) {
        if !self.pending_reconciliation || self.is_reconciling {
            return;
        }
        if self.tx.is_active() || deadline.time_remaining_ms() < RECONCILE_MIN_REMAINING_MS {
            self.schedule_reconciliation();
            return;
        }
        self.is_reconciling = true;
        self.reconcile_full_internal();
        self.is_reconciling = false;
    }

    /// Runs reconciliation synchronously, cancelling any pending schedule.
    pub fn reconcile_now(&mut self) {
        self.reconcile_full_internal();
    }

    fn reconcile_full_internal(&mut self) {
        self.pending_reconciliation = false;
        if !self.state.line_index.rebuild_pending() {
            return;
        }
        let new_version = self.state.version + 1;
        let reconciled = line_index::reconcile_full(&self.state.line_index, new_version);
        self.state = DocumentState {
            version: new_version,
            line_index: Arc::new(reconciled),
            ..self.state.clone()
        };
    }

    /// Outside the action algebra on purpose: persistence is an external
    /// collaborator (§1), so a host writes bytes to disk itself and then
    /// calls this to record that the in-memory document matches what was
    /// saved. Bumps version and clears `isDirty`; does not go through the
    /// reducer or history.
    pub fn mark_saved(&mut self) -> DocumentState {
        let new_version = self.state.version + 1;
        self.state = DocumentState {
            version: new_version,
            metadata: Arc::new(self.state.metadata.with_saved(new_version)),
            ..self.state.clone()
        };
        self.notify_listeners();
        self.state.clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;
    use crate::line_index::EagerLineIndex;
    use std::cell::Cell;
    use std::rc::Rc;

    fn new_store() -> Store {
        Store::new(DocumentState::empty(Config::default()), Box::new(EagerLineIndex))
    }

    #[test]
    fn dispatch_notifies_listeners_outside_a_transaction() {
        let mut store = new_store();
        let calls = Rc::new(Cell::new(0));
        let calls2 = Rc::clone(&calls);
        store.subscribe(Box::new(move || calls2.set(calls2.get() + 1)));

        store.dispatch(
            DocumentAction::Insert {
                start: 0,
                text: "hi".to_string(),
            },
            0,
        );
        assert_eq!(1, calls.get());
    }

    #[test]
    fn transaction_only_notifies_on_outermost_commit() {
        let mut store = new_store();
        let calls = Rc::new(Cell::new(0));
        let calls2 = Rc::clone(&calls);
        store.subscribe(Box::new(move || calls2.set(calls2.get() + 1)));

        store.dispatch(DocumentAction::TransactionStart, 0);
        store.dispatch(
            DocumentAction::Insert {
                start: 0,
                text: "a".to_string(),
            },
            0,
        );
        store.dispatch(DocumentAction::TransactionStart, 0);
        store.dispatch(
            DocumentAction::Insert {
                start: 1,
                text: "b".to_string(),
            },
            0,
        );
        store.dispatch(DocumentAction::TransactionCommit, 0);
        assert_eq!(0, calls.get());
        store.dispatch(DocumentAction::TransactionCommit, 0);
        assert_eq!(1, calls.get());
        assert_eq!("ab", store.get_snapshot().get_value());
    }

    #[test]
    fn rollback_restores_the_pre_transaction_snapshot_by_reference() {
        let mut store = new_store();
        store.dispatch(
            DocumentAction::Insert {
                start: 0,
                text: "abc".to_string(),
            },
            0,
        );
        let before = store.get_snapshot().clone();

        store.dispatch(DocumentAction::TransactionStart, 0);
        store.dispatch(
            DocumentAction::Insert {
                start: 3,
                text: "def".to_string(),
            },
            0,
        );
        store.dispatch(DocumentAction::TransactionRollback, 0);

        assert!(before.is_identical_to(store.get_snapshot()));
    }

    #[test]
    fn batch_applies_all_actions_atomically() {
        let mut store = new_store();
        store.dispatch(
            DocumentAction::Insert {
                start: 0,
                text: "abc".to_string(),
            },
            0,
        );
        store.batch(
            vec![
                DocumentAction::Insert {
                    start: 3,
                    text: "X".to_string(),
                },
                DocumentAction::Delete { start: 0, end: 100 },
                DocumentAction::Insert {
                    start: 0,
                    text: "Z".to_string(),
                },
            ],
            0,
        );
        assert_eq!("Z", store.get_snapshot().get_value());
    }

    #[test]
    fn set_viewport_does_not_change_visible_content() {
        let mut store = Store::new(
            DocumentState::empty(Config {
                content: Some("a\nb\nc".to_string()),
                ..Config::default()
            }),
            Box::new(crate::line_index::LazyLineIndex),
        );
        store.dispatch(
            DocumentAction::Insert {
                start: 0,
                text: "X\n".to_string(),
            },
            0,
        );
        let before_value = store.get_snapshot().get_value();
        store.set_viewport(0, 1);
        assert_eq!(before_value, store.get_snapshot().get_value());
    }

    #[test]
    fn reconcile_now_clears_dirty_state_without_changing_content() {
        let mut store = Store::new(
            DocumentState::empty(Config::default()),
            Box::new(crate::line_index::LazyLineIndex),
        );
        store.dispatch(
            DocumentAction::Insert {
                start: 0,
                text: "a\nb\nc".to_string(),
            },
            0,
        );
        assert!(store.get_snapshot().line_index.rebuild_pending());
        let before_value = store.get_snapshot().get_value();
        store.reconcile_now();
        assert!(!store.get_snapshot().line_index.rebuild_pending());
        assert_eq!(before_value, store.get_snapshot().get_value());
    }

    #[test]
    fn mark_saved_clears_dirty_flag() {
        let mut store = new_store();
        store.dispatch(
            DocumentAction::Insert {
                start: 0,
                text: "a".to_string(),
            },
            0,
        );
        assert!(store.get_snapshot().metadata.is_dirty);
        store.mark_saved();
        assert!(!store.get_snapshot().metadata.is_dirty);
    }
}
