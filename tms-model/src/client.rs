// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ClassContainer, ClientError, FixtureResult, Link, StepResult, TestResult, TestRunId, TmsUuid,
};
use camino::Utf8Path;

/// A client for a test management system.
///
/// Implementations own storage and transport. Every method may block; reporters call them
/// synchronously from whichever thread the test framework fires events on, so implementations
/// must be safe to call concurrently.
///
/// Records are keyed by [`TmsUuid`]s that the caller generates. Update methods take a closure
/// that is applied to the stored record in place.
pub trait TmsClient: Send + Sync {
    /// Creates a new test run and returns its identifier.
    fn create_test_run(&self) -> Result<TestRunId, ClientError>;

    /// Starts a container, optionally nested under a parent container.
    fn start_test_container(
        &self,
        parent: Option<TmsUuid>,
        container: ClassContainer,
    ) -> Result<(), ClientError>;

    /// Stops a container.
    fn stop_test_container(&self, id: TmsUuid) -> Result<(), ClientError>;

    /// Starts a test result within a container.
    fn start_test_case(&self, container: TmsUuid, result: TestResult) -> Result<(), ClientError>;

    /// Applies `update` to a started test result.
    fn update_test_case(
        &self,
        id: TmsUuid,
        update: &mut dyn FnMut(&mut TestResult),
    ) -> Result<(), ClientError>;

    /// Stops a test result.
    fn stop_test_case(&self, id: TmsUuid) -> Result<(), ClientError>;

    /// Persists a stopped test result together with its container.
    fn write_test_case(&self, id: TmsUuid, container: TmsUuid) -> Result<(), ClientError>;

    /// Starts a fixture that runs before the contents of a container.
    fn start_before_fixture(
        &self,
        container: TmsUuid,
        fixture: FixtureResult,
    ) -> Result<(), ClientError>;

    /// Starts a fixture that runs after the contents of a container.
    fn start_after_fixture(
        &self,
        container: TmsUuid,
        fixture: FixtureResult,
    ) -> Result<(), ClientError>;

    /// Applies `update` to a started fixture.
    fn update_fixture(
        &self,
        id: TmsUuid,
        update: &mut dyn FnMut(&mut FixtureResult),
    ) -> Result<(), ClientError>;

    /// Stops a fixture.
    fn stop_fixture(&self, id: TmsUuid) -> Result<(), ClientError>;

    /// Starts a step under a test result, a fixture, or another step.
    fn start_step(&self, parent: TmsUuid, step: StepResult) -> Result<(), ClientError>;

    /// Applies `update` to a started step.
    fn update_step(
        &self,
        id: TmsUuid,
        update: &mut dyn FnMut(&mut StepResult),
    ) -> Result<(), ClientError>;

    /// Applies `update` to the most recently started running step, then stops it.
    fn stop_step(&self, update: &mut dyn FnMut(&mut StepResult)) -> Result<(), ClientError>;

    /// Adds a link to a test result or fixture.
    fn add_link(&self, item: TmsUuid, link: Link) -> Result<(), ClientError>;

    /// Adds an attachment to a test result or fixture.
    fn add_attachment(&self, item: TmsUuid, path: &Utf8Path) -> Result<(), ClientError>;
}
