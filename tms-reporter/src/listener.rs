// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The reporting listener: turns framework events into TMS client calls.
//!
//! Each scope (suite, test, fixture, step) follows the same two-phase pattern. A start event
//! creates TMS records and stores a correlation entry. The matching finish event removes that
//! entry, finalizes the records and signals completion to the client.
//!
//! Nothing escapes a handler. Client errors and client panics are logged with the handler's name
//! and discarded, so a reporting fault never aborts test execution.

use crate::{
    config::ReporterConfig,
    correlation::{
        CorrelationStore, FixtureCorrelation, LiveEntries, Scope, SuiteCorrelation,
        TestCorrelation,
    },
    errors::{DisplayErrorChain, ReportError},
    mapping::{
        FailureDetails, FixturePlacement, fixture_placement, mark_last_step_failed,
        new_test_result, test_labels, tms_status,
    },
};
use debug_ignore::DebugIgnore;
use harness_events::{StepInvocation, SuiteMethod, TestSuite};
use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};
use tms_model::{
    ClassContainer, FixtureResult, Status, StepResult, TestResult, TestRunId, TmsClient, TmsUuid,
};
use tracing::{debug, error, info, warn};

/// Reports framework events to a [`TmsClient`].
///
/// Handlers take `&self` and may be called concurrently from any thread the framework fires
/// events on.
#[derive(Debug)]
pub struct ReportingListener {
    client: DebugIgnore<Arc<dyn TmsClient>>,
    store: CorrelationStore,
    test_run_id: TestRunId,
}

impl ReportingListener {
    /// Creates a new listener.
    ///
    /// If the configuration does not name a test run, a new run is created through the client
    /// before this returns. That is the only failure reported to the caller.
    pub fn new(client: Arc<dyn TmsClient>, config: &ReporterConfig) -> Result<Self, ReportError> {
        let test_run_id = match config.test_run_id() {
            Some(id) => {
                debug!(test_run_id = id, "reporting to configured test run");
                TestRunId::new(id)
            }
            None => {
                let id = client
                    .create_test_run()
                    .map_err(ReportError::CreateTestRun)?;
                info!(test_run_id = %id, "created test run");
                id
            }
        };

        Ok(Self {
            client: DebugIgnore(client),
            store: CorrelationStore::new(),
            test_run_id,
        })
    }

    /// Returns the test run that results are reported to.
    pub fn test_run_id(&self) -> &TestRunId {
        &self.test_run_id
    }

    /// Returns the number of live correlation entries per scope.
    pub fn live_entries(&self) -> LiveEntries {
        self.store.live_entries()
    }

    /// Handles a suite starting.
    pub fn start_suite(&self, suite: &TestSuite) {
        report("start_suite", || self.try_start_suite(suite));
    }

    /// Handles a suite finishing.
    pub fn finish_suite(&self, suite: &TestSuite) {
        report("finish_suite", || self.try_finish_suite(suite));
    }

    /// Handles a test starting.
    pub fn start_test(&self, test: &SuiteMethod) {
        report("start_test", || self.try_start_test(test));
    }

    /// Handles a test finishing.
    pub fn finish_test(&self, test: &SuiteMethod) {
        report("finish_test", || self.try_finish_test(test));
    }

    /// Handles a test being skipped.
    ///
    /// A skipped test is reported exactly as if it had started and then finished with its
    /// (skipped) outcome.
    pub fn skip_test(&self, test: &SuiteMethod) {
        self.start_test(test);
        self.finish_test(test);
    }

    /// Handles a fixture starting.
    pub fn start_fixture(&self, fixture: &SuiteMethod) {
        report("start_fixture", || self.try_start_fixture(fixture));
    }

    /// Handles a fixture finishing.
    pub fn finish_fixture(&self, fixture: &SuiteMethod) {
        report("finish_fixture", || self.try_finish_fixture(fixture));
    }

    /// Handles a step starting.
    ///
    /// The step is recorded under the oldest live test, or failing that the oldest live fixture.
    /// This is only accurate when tests and fixtures run one at a time.
    pub fn start_step(&self, step: &StepInvocation) {
        report("start_step", || self.try_start_step(step));
    }

    /// Handles a step finishing. The client's most recently started step is stopped.
    pub fn finish_step(&self, step: &StepInvocation) {
        report("finish_step", || self.try_finish_step(step));
    }

    fn try_start_suite(&self, suite: &TestSuite) -> Result<(), ReportError> {
        let container = ClassContainer::generate();
        let container_id = container.id;
        self.client
            .start_test_container(None, container)
            .map_err(ReportError::client("start_test_container"))?;

        let correlation = SuiteCorrelation {
            container_id,
            suite_name: suite.name.clone(),
            tags: suite.tags.clone(),
        };
        if self
            .store
            .suites
            .insert_if_absent(suite.run_id(), correlation)
        {
            debug!(suite = %suite.name, suite_run_id = %suite.run_id(), %container_id, "suite started");
        } else {
            warn!(
                handler = "start_suite",
                suite_run_id = %suite.run_id(),
                "suite run was already started, keeping its existing container",
            );
        }
        Ok(())
    }

    fn try_finish_suite(&self, suite: &TestSuite) -> Result<(), ReportError> {
        let Some(correlation) = self.store.suites.remove(&suite.run_id()) else {
            correlation_miss("finish_suite", Scope::Suite, suite.run_id());
            return Ok(());
        };

        self.client
            .stop_test_container(correlation.container_id)
            .map_err(ReportError::client("stop_test_container"))?;
        debug!(suite = %correlation.suite_name, container_id = %correlation.container_id, "suite finished");
        Ok(())
    }

    fn try_start_test(&self, test: &SuiteMethod) -> Result<(), ReportError> {
        let parent_id = test.outcome.parent_id;
        let (parent, suite_tags) = match self.store.suites.get(&parent_id) {
            Some(suite) => (Some(suite.container_id), suite.tags),
            None => {
                correlation_miss("start_test", Scope::Suite, parent_id);
                (None, Vec::new())
            }
        };

        let container = ClassContainer::generate();
        let container_id = container.id;
        self.client
            .start_test_container(parent, container)
            .map_err(ReportError::client("start_test_container"))?;

        let labels = test_labels(&suite_tags, &test.categories);
        let result = new_test_result(TmsUuid::new_v4(), test, labels);
        let test_result_id = result.id;
        self.client
            .start_test_case(container_id, result)
            .map_err(ReportError::client("start_test_case"))?;

        let correlation = TestCorrelation {
            container_id,
            test_result_id,
        };
        if !self.store.tests.insert_if_absent(test.run_id(), correlation) {
            warn!(
                handler = "start_test",
                method_run_id = %test.run_id(),
                "test run was already started, keeping its existing test result",
            );
        }
        Ok(())
    }

    fn try_finish_test(&self, test: &SuiteMethod) -> Result<(), ReportError> {
        let Some(correlation) = self.store.tests.remove(&test.run_id()) else {
            correlation_miss("finish_test", Scope::Test, test.run_id());
            return Ok(());
        };
        let TestCorrelation {
            container_id,
            test_result_id,
        } = correlation;

        let status = tms_status(test.outcome.result);
        let failure =
            (status == Status::Failed).then(|| FailureDetails::from_outcome(&test.outcome));

        self.client
            .update_test_case(test_result_id, &mut |result: &mut TestResult| {
                result.status = Some(status);
                if let Some(failure) = &failure {
                    result.message = failure.message.clone();
                    result.trace = failure.trace.clone();
                    mark_last_step_failed(&mut result.steps);
                }
            })
            .map_err(ReportError::client("update_test_case"))?;

        if let Some(failure) = failure {
            if let Some(link) = failure.defect_link {
                self.client
                    .add_link(test_result_id, link)
                    .map_err(ReportError::client("add_link"))?;
            }
            for path in &failure.attachments {
                self.client
                    .add_attachment(test_result_id, path)
                    .map_err(ReportError::client("add_attachment"))?;
            }
        }

        self.client
            .stop_test_case(test_result_id)
            .map_err(ReportError::client("stop_test_case"))?;
        self.client
            .stop_test_container(container_id)
            .map_err(ReportError::client("stop_test_container"))?;
        self.client
            .write_test_case(test_result_id, container_id)
            .map_err(ReportError::client("write_test_case"))?;

        debug!(test = %test.method.name, %status, %test_result_id, "test finished");
        Ok(())
    }

    fn try_start_fixture(&self, fixture: &SuiteMethod) -> Result<(), ReportError> {
        let Some(placement) = fixture_placement(fixture.kind) else {
            warn!(
                handler = "start_fixture",
                method = %fixture.method.name,
                "test reported as a fixture, ignoring",
            );
            return Ok(());
        };
        let parent_id = fixture.outcome.parent_id;
        let Some(suite) = self.store.suites.get(&parent_id) else {
            correlation_miss("start_fixture", Scope::Suite, parent_id);
            return Ok(());
        };

        let result = FixtureResult::new(TmsUuid::new_v4(), fixture.method.name.clone());
        let fixture_id = result.id;
        match placement {
            FixturePlacement::Before => self
                .client
                .start_before_fixture(suite.container_id, result)
                .map_err(ReportError::client("start_before_fixture"))?,
            FixturePlacement::After => self
                .client
                .start_after_fixture(suite.container_id, result)
                .map_err(ReportError::client("start_after_fixture"))?,
        }

        if !self
            .store
            .fixtures
            .insert_if_absent(fixture.run_id(), FixtureCorrelation { fixture_id })
        {
            warn!(
                handler = "start_fixture",
                method_run_id = %fixture.run_id(),
                "fixture run was already started, keeping its existing record",
            );
        }
        Ok(())
    }

    fn try_finish_fixture(&self, fixture: &SuiteMethod) -> Result<(), ReportError> {
        let Some(FixtureCorrelation { fixture_id }) = self.store.fixtures.remove(&fixture.run_id())
        else {
            correlation_miss("finish_fixture", Scope::Fixture, fixture.run_id());
            return Ok(());
        };

        let status = tms_status(fixture.outcome.result);
        let failed = status == Status::Failed;
        self.client
            .update_fixture(fixture_id, &mut |result: &mut FixtureResult| {
                result.status = Some(status);
                if failed {
                    mark_last_step_failed(&mut result.steps);
                }
            })
            .map_err(ReportError::client("update_fixture"))?;

        if failed {
            // Fixtures carry attachments but never defect links.
            for attachment in &fixture.outcome.attachments {
                self.client
                    .add_attachment(fixture_id, attachment.file_path())
                    .map_err(ReportError::client("add_attachment"))?;
            }
        }

        self.client
            .stop_fixture(fixture_id)
            .map_err(ReportError::client("stop_fixture"))?;
        debug!(fixture = %fixture.method.name, %status, %fixture_id, "fixture finished");
        Ok(())
    }

    fn try_start_step(&self, step: &StepInvocation) -> Result<(), ReportError> {
        let Some(parent) = self.store.current_step_parent() else {
            correlation_miss("start_step", Scope::Step, &step.method.name);
            return Ok(());
        };

        let mut result = StepResult::new(TmsUuid::new_v4(), step.display_name());
        result.set_status(Status::Passed);
        self.client
            .start_step(parent, result)
            .map_err(ReportError::client("start_step"))
    }

    fn try_finish_step(&self, step: &StepInvocation) -> Result<(), ReportError> {
        if self.store.current_step_parent().is_none() {
            correlation_miss("finish_step", Scope::Step, &step.method.name);
            return Ok(());
        }

        self.client
            .stop_step(&mut |_: &mut StepResult| {})
            .map_err(ReportError::client("stop_step"))
    }
}

/// Runs a handler body, logging and discarding any error or panic.
fn report(handler: &'static str, body: impl FnOnce() -> Result<(), ReportError>) {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(())) => {}
        Ok(Err(error)) => {
            error!(handler, "failed to report to TMS: {}", DisplayErrorChain::new(&error));
        }
        Err(payload) => {
            error!(
                handler,
                "TMS client panicked: {}",
                panic_payload_to_string(payload),
            );
        }
    }
}

fn correlation_miss(handler: &'static str, scope: Scope, id: impl fmt::Display) {
    warn!(handler, %scope, id = %id, "no live correlation entry, skipping");
}

fn panic_payload_to_string(payload: Box<dyn Any + Send + 'static>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "(unknown panic payload)".to_owned()
    }
}
