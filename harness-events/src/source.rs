// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event sources that listeners subscribe to.

use crate::{StepInvocation, SuiteMethod, TestSuite};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

/// A callback subscribed to an [`EventSource`].
pub type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Identifies a handler subscribed to an [`EventSource`].
///
/// Returned by [`EventSource::subscribe`] and used to unsubscribe the same handler later.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

/// A list of handlers for one kind of event.
///
/// Handlers are invoked synchronously on the thread that fires the event, in subscription order.
pub struct EventSource<T> {
    kind: EventKind,
    next_id: AtomicU64,
    handlers: RwLock<IndexMap<HandlerId, Handler<T>>>,
}

impl<T> EventSource<T> {
    /// Creates a new event source with no handlers.
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            next_id: AtomicU64::new(0),
            handlers: RwLock::new(IndexMap::new()),
        }
    }

    /// Returns the kind of event this source fires.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Subscribes a handler, returning an identifier for it.
    pub fn subscribe<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().insert(id, Arc::new(handler));
        id
    }

    /// Unsubscribes a handler. Returns false if the handler was not subscribed.
    pub fn unsubscribe(&self, id: HandlerId) -> bool {
        self.handlers.write().shift_remove(&id).is_some()
    }

    /// Invokes every subscribed handler with the event.
    ///
    /// The handler list is snapshotted first, so handlers may subscribe or unsubscribe while the
    /// event is being delivered. Such changes take effect from the next event on.
    pub fn fire(&self, event: &T) {
        let handlers: Vec<_> = self.handlers.read().values().cloned().collect();
        for handler in handlers {
            handler(event);
        }
    }

    /// Returns the number of subscribed handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }
}

impl<T> fmt::Debug for EventSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSource")
            .field("kind", &self.kind)
            .field("handler_count", &self.handler_count())
            .finish()
    }
}

/// The kinds of events a framework fires.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// A suite started.
    SuiteStarted,
    /// A suite finished.
    SuiteFinished,
    /// A test started.
    TestStarted,
    /// A test finished.
    TestFinished,
    /// A test was skipped without running.
    TestSkipped,
    /// A fixture (a before or after method) started.
    FixtureStarted,
    /// A fixture finished.
    FixtureFinished,
    /// A step started.
    StepStarted,
    /// A step finished.
    StepFinished,
}

impl EventKind {
    /// All event kinds.
    pub const ALL: [EventKind; 9] = [
        EventKind::SuiteStarted,
        EventKind::SuiteFinished,
        EventKind::TestStarted,
        EventKind::TestFinished,
        EventKind::TestSkipped,
        EventKind::FixtureStarted,
        EventKind::FixtureFinished,
        EventKind::StepStarted,
        EventKind::StepFinished,
    ];

    /// Returns a short name for this event kind.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::SuiteStarted => "suite-started",
            EventKind::SuiteFinished => "suite-finished",
            EventKind::TestStarted => "test-started",
            EventKind::TestFinished => "test-finished",
            EventKind::TestSkipped => "test-skipped",
            EventKind::FixtureStarted => "fixture-started",
            EventKind::FixtureFinished => "fixture-finished",
            EventKind::StepStarted => "step-started",
            EventKind::StepFinished => "step-finished",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every event source of a framework.
///
/// The framework owns this (usually behind an `Arc`) and fires events through it; listeners
/// subscribe to the sources they care about.
#[derive(Debug)]
pub struct FrameworkEvents {
    /// Fired when a suite starts.
    pub suite_started: EventSource<TestSuite>,
    /// Fired when a suite finishes.
    pub suite_finished: EventSource<TestSuite>,
    /// Fired when a test starts.
    pub test_started: EventSource<SuiteMethod>,
    /// Fired when a test finishes.
    pub test_finished: EventSource<SuiteMethod>,
    /// Fired when a test is skipped. No start or finish event is fired for a skipped test.
    pub test_skipped: EventSource<SuiteMethod>,
    /// Fired when a fixture starts.
    pub fixture_started: EventSource<SuiteMethod>,
    /// Fired when a fixture finishes.
    pub fixture_finished: EventSource<SuiteMethod>,
    /// Fired when a step starts.
    pub step_started: EventSource<StepInvocation>,
    /// Fired when a step finishes.
    pub step_finished: EventSource<StepInvocation>,
}

impl FrameworkEvents {
    /// Creates a new set of event sources with no handlers.
    pub fn new() -> Self {
        Self {
            suite_started: EventSource::new(EventKind::SuiteStarted),
            suite_finished: EventSource::new(EventKind::SuiteFinished),
            test_started: EventSource::new(EventKind::TestStarted),
            test_finished: EventSource::new(EventKind::TestFinished),
            test_skipped: EventSource::new(EventKind::TestSkipped),
            fixture_started: EventSource::new(EventKind::FixtureStarted),
            fixture_finished: EventSource::new(EventKind::FixtureFinished),
            step_started: EventSource::new(EventKind::StepStarted),
            step_finished: EventSource::new(EventKind::StepFinished),
        }
    }

    /// Unsubscribes a handler from the source for `kind`.
    ///
    /// Returns false if no such handler was subscribed to that source.
    pub fn unsubscribe(&self, kind: EventKind, id: HandlerId) -> bool {
        match kind {
            EventKind::SuiteStarted => self.suite_started.unsubscribe(id),
            EventKind::SuiteFinished => self.suite_finished.unsubscribe(id),
            EventKind::TestStarted => self.test_started.unsubscribe(id),
            EventKind::TestFinished => self.test_finished.unsubscribe(id),
            EventKind::TestSkipped => self.test_skipped.unsubscribe(id),
            EventKind::FixtureStarted => self.fixture_started.unsubscribe(id),
            EventKind::FixtureFinished => self.fixture_finished.unsubscribe(id),
            EventKind::StepStarted => self.step_started.unsubscribe(id),
            EventKind::StepFinished => self.step_finished.unsubscribe(id),
        }
    }

    /// Returns the number of handlers subscribed to the source for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::SuiteStarted => self.suite_started.handler_count(),
            EventKind::SuiteFinished => self.suite_finished.handler_count(),
            EventKind::TestStarted => self.test_started.handler_count(),
            EventKind::TestFinished => self.test_finished.handler_count(),
            EventKind::TestSkipped => self.test_skipped.handler_count(),
            EventKind::FixtureStarted => self.fixture_started.handler_count(),
            EventKind::FixtureFinished => self.fixture_finished.handler_count(),
            EventKind::StepStarted => self.step_started.handler_count(),
            EventKind::StepFinished => self.step_finished.handler_count(),
        }
    }

    /// Returns the number of handlers subscribed across all sources.
    pub fn total_handler_count(&self) -> usize {
        EventKind::ALL
            .iter()
            .map(|&kind| self.handler_count(kind))
            .sum()
    }
}

impl Default for FrameworkEvents {
    fn default() -> Self {
        Self::new()
    }
}
