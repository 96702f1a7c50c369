//! The event system (§4.3, §6.2): a thin observer layer over [`Store`] that
//! turns state transitions into named events instead of the store's single
//! undifferentiated "something changed" notification.
//!
//! There is no `SAVE` action in the algebra (§4.4 only reduces document
//! edits), so [`EventStore::mark_saved`] reaches past the reducer the same
//! way [`Store::mark_saved`] does, then synthesizes the save/dirty-change
//! events a host would expect from it.

use std::panic::{self, AssertUnwindSafe};

use crate::action::DocumentAction;
use crate::error::{describe_panic, Diagnostic, DiagnosticSink};
use crate::reducer::reduce;
use crate::state::DocumentState;
use crate::store::{ListenerId, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ContentChange,
    SelectionChange,
    HistoryChange,
    Save,
    DirtyChange,
}

pub type EventHandler = Box<dyn Fn(&DocumentState)>;

#[derive(Default)]
struct EventEmitter {
    next_id: u64,
    handlers: Vec<(u64, EventKind, EventHandler)>,
}

impl EventEmitter {
    fn new() -> EventEmitter {
        EventEmitter::default()
    }

    fn add_event_listener(&mut self, kind: EventKind, handler: EventHandler) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;
        self.handlers.push((id, kind, handler));
        ListenerId::from_raw(id)
    }

    fn remove_event_listener(&mut self, id: ListenerId) {
        self.handlers.retain(|(hid, _, _)| *hid != id.raw());
    }

    fn remove_all_listeners(&mut self) {
        self.handlers.clear();
    }

    /// Isolates a panicking handler the same way [`Store`] isolates a
    /// panicking subscriber: the payload is reported, the remaining handlers
    /// for this (and any other) event kind still run.
    fn emit(&self, kind: EventKind, state: &DocumentState, sink: &dyn DiagnosticSink) {
        let snapshot: Vec<&EventHandler> = self
            .handlers
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, h)| h)
            .collect();
        for handler in snapshot {
            let result = panic::catch_unwind(AssertUnwindSafe(|| handler(state)));
            if let Err(payload) = result {
                sink.report(Diagnostic::EventHandlerFault {
                    message: describe_panic(payload.as_ref()),
                });
            }
        }
    }
}

/// Which of the four diffable event kinds fire between `pre` and `post`.
/// `ContentChange`/`SelectionChange`/`HistoryChange` are decided by the
/// structural-sharing invariant (§3.1 item 10): a component that was
/// genuinely recomputed is a fresh `Arc`, so `Arc::ptr_eq` tells apart "the
/// reducer rebuilt the piece table" from "this action didn't touch it" far
/// more cheaply than a deep value comparison would.
fn changed_kinds(pre: &DocumentState, post: &DocumentState) -> Vec<EventKind> {
    let mut kinds = Vec::new();
    if !std::sync::Arc::ptr_eq(&pre.piece_table, &post.piece_table) {
        kinds.push(EventKind::ContentChange);
    }
    if !std::sync::Arc::ptr_eq(&pre.selection, &post.selection) {
        kinds.push(EventKind::SelectionChange);
    }
    if !std::sync::Arc::ptr_eq(&pre.history, &post.history) {
        kinds.push(EventKind::HistoryChange);
    }
    if pre.metadata.is_dirty != post.metadata.is_dirty {
        kinds.push(EventKind::DirtyChange);
    }
    kinds
}

/// Wraps a [`Store`] with named-event dispatch. Holds its own copy of the
/// strategy/config the store was built with, used only for the pure replay
/// [`Self::batch`] needs to report accurate per-action events.
pub struct EventStore {
    store: Store,
    emitter: EventEmitter,
}

impl EventStore {
    pub fn new(store: Store) -> EventStore {
        EventStore {
            store,
            emitter: EventEmitter::new(),
        }
    }

    pub fn get_snapshot(&self) -> &DocumentState {
        self.store.get_snapshot()
    }

    pub fn add_event_listener(&mut self, kind: EventKind, handler: EventHandler) -> ListenerId {
        self.emitter.add_event_listener(kind, handler)
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) {
        self.emitter.remove_event_listener(id);
    }

    pub fn remove_all_listeners(&mut self) {
        self.emitter.remove_all_listeners();
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn()>) -> ListenerId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) {
        self.store.unsubscribe(id);
    }

    pub fn dispatch(&mut self, action: DocumentAction, now_ms: u64) -> DocumentState {
        let pre = self.store.get_snapshot().clone();
        let post = self.store.dispatch(action, now_ms);
        for kind in changed_kinds(&pre, &post) {
            self.emitter.emit(kind, &post, self.store.sink());
        }
        post
    }

    /// Runs the real transactional batch for its atomicity guarantee, then —
    /// only if it actually committed — replays the same actions through a
    /// second, purely-functional `reduce` chain to recover the intermediate
    /// states needed for accurate per-action events. A rolled-back batch
    /// must stay invisible to observers (§8 invariant 9), so the replay is
    /// discarded entirely when the real result is reference-identical to
    /// the pre-batch state.
    pub fn batch(&mut self, actions: Vec<DocumentAction>, now_ms: u64) -> DocumentState {
        let pre = self.store.get_snapshot().clone();
        let post = self.store.batch(actions.clone(), now_ms);

        if post.is_identical_to(&pre) {
            return post;
        }

        let mut replay_state = pre;
        for action in actions {
            let next = reduce(
                &replay_state,
                &action,
                self.store.strategy(),
                self.store.reducer_config(),
                now_ms,
            );
            if !next.is_identical_to(&replay_state) {
                for kind in changed_kinds(&replay_state, &next) {
                    self.emitter.emit(kind, &next, self.store.sink());
                }
            }
            replay_state = next;
        }

        post
    }

    pub fn set_viewport(&mut self, start_line: u64, end_line: u64) {
        self.store.set_viewport(start_line, end_line);
    }

    pub fn pump_reconciliation(&mut self, deadline: &dyn crate::store::IdleDeadline) {
        self.store.pump_reconciliation(deadline);
    }

    pub fn reconcile_now(&mut self) {
        self.store.reconcile_now();
    }

    /// Bypasses the reducer entirely (there is no `SAVE` action), records
    /// the save point, and fires "save" plus "dirty-change" if the flag
    /// actually flipped.
    pub fn mark_saved(&mut self) -> DocumentState {
        let pre_dirty = self.store.get_snapshot().metadata.is_dirty;
        let post = self.store.mark_saved();
        self.emitter.emit(EventKind::Save, &post, self.store.sink());
        if pre_dirty != post.metadata.is_dirty {
            self.emitter
                .emit(EventKind::DirtyChange, &post, self.store.sink());
        }
        post
    }
}
