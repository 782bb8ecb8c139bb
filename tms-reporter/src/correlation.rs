// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Correlation between framework run identifiers and TMS identifiers.
//!
//! When a suite, test or fixture starts, the listener creates TMS records and remembers their
//! identifiers under the framework's run identifier. When the same run finishes, the entry is
//! removed and used to finalize the records. Entries only live between a start and its finish.

use harness_events::{MethodRunUuid, SuiteRunUuid};
use indexmap::{IndexMap, map::Entry};
use parking_lot::Mutex;
use std::{fmt, hash::Hash};
use tms_model::TmsUuid;

/// The scope a correlation entry belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    /// A suite run.
    Suite,
    /// A test run.
    Test,
    /// A fixture run.
    Fixture,
    /// A step. Steps have no entries of their own but are routed through test and fixture
    /// entries.
    Step,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Suite => write!(f, "suite"),
            Scope::Test => write!(f, "test"),
            Scope::Fixture => write!(f, "fixture"),
            Scope::Step => write!(f, "step"),
        }
    }
}

/// The TMS side of a live suite run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuiteCorrelation {
    /// The container created for the suite.
    pub container_id: TmsUuid,

    /// The name of the suite.
    pub suite_name: String,

    /// The suite's tags, used to label the tests within it.
    pub tags: Vec<String>,
}

/// The TMS side of a live test run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TestCorrelation {
    /// The per-test container, nested under the suite's container.
    pub container_id: TmsUuid,

    /// The test result.
    pub test_result_id: TmsUuid,
}

/// The TMS side of a live fixture run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FixtureCorrelation {
    /// The fixture record.
    pub fixture_id: TmsUuid,
}

/// A concurrent map from a run identifier to a correlation entry.
///
/// Each operation is atomic. Entries are kept in insertion order, so [`first`](Self::first)
/// returns the oldest live entry.
#[derive(Debug)]
pub struct CorrelationMap<K, V> {
    scope: Scope,
    entries: Mutex<IndexMap<K, V>>,
}

impl<K, V> CorrelationMap<K, V>
where
    K: Copy + Eq + Hash,
    V: Clone,
{
    /// Creates a new, empty map for the given scope.
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            entries: Mutex::new(IndexMap::new()),
        }
    }

    /// Returns the scope of this map.
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Inserts an entry unless one already exists for `key`.
    ///
    /// Returns false, leaving the existing entry in place, if `key` was already live.
    pub fn insert_if_absent(&self, key: K, value: V) -> bool {
        match self.entries.lock().entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(value);
                true
            }
        }
    }

    /// Removes and returns the entry for `key`.
    ///
    /// If several callers race to remove the same key, only the first gets the entry.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.lock().shift_remove(key)
    }

    /// Returns a copy of the entry for `key`.
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.lock().get(key).cloned()
    }

    /// Returns a copy of the oldest live entry.
    pub fn first(&self) -> Option<V> {
        self.entries.lock().first().map(|(_, value)| value.clone())
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// The correlation maps owned by one listener.
#[derive(Debug)]
pub struct CorrelationStore {
    /// Live suite runs.
    pub suites: CorrelationMap<SuiteRunUuid, SuiteCorrelation>,

    /// Live test runs.
    pub tests: CorrelationMap<MethodRunUuid, TestCorrelation>,

    /// Live fixture runs.
    pub fixtures: CorrelationMap<MethodRunUuid, FixtureCorrelation>,
}

impl CorrelationStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self {
            suites: CorrelationMap::new(Scope::Suite),
            tests: CorrelationMap::new(Scope::Test),
            fixtures: CorrelationMap::new(Scope::Fixture),
        }
    }

    /// Returns the TMS item that a newly started step should be recorded under.
    ///
    /// This is the oldest live test result, or failing that the oldest live fixture. The choice
    /// is only right when at most one test or fixture runs at a time: under parallel execution,
    /// steps may be recorded under a different test than the one that ran them.
    pub fn current_step_parent(&self) -> Option<TmsUuid> {
        self.tests
            .first()
            .map(|test| test.test_result_id)
            .or_else(|| self.fixtures.first().map(|fixture| fixture.fixture_id))
    }

    /// Returns the number of live entries per scope.
    pub fn live_entries(&self) -> LiveEntries {
        LiveEntries {
            suites: self.suites.len(),
            tests: self.tests.len(),
            fixtures: self.fixtures.len(),
        }
    }
}

impl Default for CorrelationStore {
    fn default() -> Self {
        Self::new()
    }
}

/// The number of live correlation entries per scope.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LiveEntries {
    /// Live suite runs.
    pub suites: usize,
    /// Live test runs.
    pub tests: usize,
    /// Live fixture runs.
    pub fixtures: usize,
}
