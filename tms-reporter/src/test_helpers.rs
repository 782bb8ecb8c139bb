// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test fixtures: a recording client, log capture and event builders.

use crate::{client::MemoryClient, config::ReporterConfig};
use camino::{Utf8Path, Utf8PathBuf};
use harness_events::{MethodInfo, StepInvocation, SuiteMethod, SuiteMethodKind, TestSuite};
use parking_lot::Mutex;
use std::{io, sync::Arc};
use tms_model::{
    ClassContainer, ClientError, FixtureResult, Link, StepResult, TestResult, TestRunId,
    TmsClient, TmsUuid,
};

/// A call made to a [`RecordingClient`].
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ClientCall {
    CreateTestRun,
    StartTestContainer {
        parent: Option<TmsUuid>,
        id: TmsUuid,
    },
    StopTestContainer(TmsUuid),
    StartTestCase {
        container: TmsUuid,
        result: TestResult,
    },
    UpdateTestCase(TmsUuid),
    StopTestCase(TmsUuid),
    WriteTestCase {
        id: TmsUuid,
        container: TmsUuid,
    },
    StartBeforeFixture {
        container: TmsUuid,
        fixture: FixtureResult,
    },
    StartAfterFixture {
        container: TmsUuid,
        fixture: FixtureResult,
    },
    UpdateFixture(TmsUuid),
    StopFixture(TmsUuid),
    StartStep {
        parent: TmsUuid,
        step: StepResult,
    },
    UpdateStep(TmsUuid),
    StopStep,
    AddLink {
        item: TmsUuid,
        link: Link,
    },
    AddAttachment {
        item: TmsUuid,
        path: Utf8PathBuf,
    },
}

impl ClientCall {
    /// Returns the name of the [`TmsClient`] method this call was made through.
    pub(crate) fn operation(&self) -> &'static str {
        match self {
            ClientCall::CreateTestRun => "create_test_run",
            ClientCall::StartTestContainer { .. } => "start_test_container",
            ClientCall::StopTestContainer(_) => "stop_test_container",
            ClientCall::StartTestCase { .. } => "start_test_case",
            ClientCall::UpdateTestCase(_) => "update_test_case",
            ClientCall::StopTestCase(_) => "stop_test_case",
            ClientCall::WriteTestCase { .. } => "write_test_case",
            ClientCall::StartBeforeFixture { .. } => "start_before_fixture",
            ClientCall::StartAfterFixture { .. } => "start_after_fixture",
            ClientCall::UpdateFixture(_) => "update_fixture",
            ClientCall::StopFixture(_) => "stop_fixture",
            ClientCall::StartStep { .. } => "start_step",
            ClientCall::UpdateStep(_) => "update_step",
            ClientCall::StopStep => "stop_step",
            ClientCall::AddLink { .. } => "add_link",
            ClientCall::AddAttachment { .. } => "add_attachment",
        }
    }
}

/// A [`TmsClient`] that records every call, then forwards it to a [`MemoryClient`].
///
/// A single operation can be made to fail or to panic.
#[derive(Debug, Default)]
pub(crate) struct RecordingClient {
    inner: MemoryClient,
    calls: Mutex<Vec<ClientCall>>,
    fail_on: Mutex<Option<&'static str>>,
    panic_on: Mutex<Option<&'static str>>,
}

impl RecordingClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn inner(&self) -> &MemoryClient {
        &self.inner
    }

    pub(crate) fn calls(&self) -> Vec<ClientCall> {
        self.calls.lock().clone()
    }

    /// Makes `operation` return an error from now on.
    pub(crate) fn fail_on(&self, operation: &'static str) {
        *self.fail_on.lock() = Some(operation);
    }

    /// Makes `operation` panic from now on.
    pub(crate) fn panic_on(&self, operation: &'static str) {
        *self.panic_on.lock() = Some(operation);
    }

    pub(crate) fn clear_injections(&self) {
        *self.fail_on.lock() = None;
        *self.panic_on.lock() = None;
    }

    fn record(&self, call: ClientCall) -> Result<(), ClientError> {
        let operation = call.operation();
        self.calls.lock().push(call);
        if *self.panic_on.lock() == Some(operation) {
            panic!("injected panic in {operation}");
        }
        if *self.fail_on.lock() == Some(operation) {
            return Err(ClientError::backend(format!(
                "injected failure in {operation}"
            )));
        }
        Ok(())
    }
}

impl TmsClient for RecordingClient {
    fn create_test_run(&self) -> Result<TestRunId, ClientError> {
        self.record(ClientCall::CreateTestRun)?;
        self.inner.create_test_run()
    }

    fn start_test_container(
        &self,
        parent: Option<TmsUuid>,
        container: ClassContainer,
    ) -> Result<(), ClientError> {
        self.record(ClientCall::StartTestContainer {
            parent,
            id: container.id,
        })?;
        self.inner.start_test_container(parent, container)
    }

    fn stop_test_container(&self, id: TmsUuid) -> Result<(), ClientError> {
        self.record(ClientCall::StopTestContainer(id))?;
        self.inner.stop_test_container(id)
    }

    fn start_test_case(&self, container: TmsUuid, result: TestResult) -> Result<(), ClientError> {
        self.record(ClientCall::StartTestCase {
            container,
            result: result.clone(),
        })?;
        self.inner.start_test_case(container, result)
    }

    fn update_test_case(
        &self,
        id: TmsUuid,
        update: &mut dyn FnMut(&mut TestResult),
    ) -> Result<(), ClientError> {
        self.record(ClientCall::UpdateTestCase(id))?;
        self.inner.update_test_case(id, update)
    }

    fn stop_test_case(&self, id: TmsUuid) -> Result<(), ClientError> {
        self.record(ClientCall::StopTestCase(id))?;
        self.inner.stop_test_case(id)
    }

    fn write_test_case(&self, id: TmsUuid, container: TmsUuid) -> Result<(), ClientError> {
        self.record(ClientCall::WriteTestCase { id, container })?;
        self.inner.write_test_case(id, container)
    }

    fn start_before_fixture(
        &self,
        container: TmsUuid,
        fixture: FixtureResult,
    ) -> Result<(), ClientError> {
        self.record(ClientCall::StartBeforeFixture {
            container,
            fixture: fixture.clone(),
        })?;
        self.inner.start_before_fixture(container, fixture)
    }

    fn start_after_fixture(
        &self,
        container: TmsUuid,
        fixture: FixtureResult,
    ) -> Result<(), ClientError> {
        self.record(ClientCall::StartAfterFixture {
            container,
            fixture: fixture.clone(),
        })?;
        self.inner.start_after_fixture(container, fixture)
    }

    fn update_fixture(
        &self,
        id: TmsUuid,
        update: &mut dyn FnMut(&mut FixtureResult),
    ) -> Result<(), ClientError> {
        self.record(ClientCall::UpdateFixture(id))?;
        self.inner.update_fixture(id, update)
    }

    fn stop_fixture(&self, id: TmsUuid) -> Result<(), ClientError> {
        self.record(ClientCall::StopFixture(id))?;
        self.inner.stop_fixture(id)
    }

    fn start_step(&self, parent: TmsUuid, step: StepResult) -> Result<(), ClientError> {
        self.record(ClientCall::StartStep {
            parent,
            step: step.clone(),
        })?;
        self.inner.start_step(parent, step)
    }

    fn update_step(
        &self,
        id: TmsUuid,
        update: &mut dyn FnMut(&mut StepResult),
    ) -> Result<(), ClientError> {
        self.record(ClientCall::UpdateStep(id))?;
        self.inner.update_step(id, update)
    }

    fn stop_step(&self, update: &mut dyn FnMut(&mut StepResult)) -> Result<(), ClientError> {
        self.record(ClientCall::StopStep)?;
        self.inner.stop_step(update)
    }

    fn add_link(&self, item: TmsUuid, link: Link) -> Result<(), ClientError> {
        self.record(ClientCall::AddLink {
            item,
            link: link.clone(),
        })?;
        self.inner.add_link(item, link)
    }

    fn add_attachment(&self, item: TmsUuid, path: &Utf8Path) -> Result<(), ClientError> {
        self.record(ClientCall::AddAttachment {
            item,
            path: path.to_owned(),
        })?;
        self.inner.add_attachment(item, path)
    }
}

/// Captures log output produced on the current thread.
#[derive(Clone, Debug, Default)]
pub(crate) struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with a subscriber that writes into this capture.
    pub(crate) fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }

    pub(crate) fn output(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    pub(crate) fn contains(&self, needle: &str) -> bool {
        self.output().contains(needle)
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Loads the built-in configuration, ignoring files and the environment.
pub(crate) fn isolated_config() -> ReporterConfig {
    ReporterConfig::default_config().expect("built-in config is valid")
}

pub(crate) fn test_method(suite: &TestSuite, name: &str) -> SuiteMethod {
    SuiteMethod::test(
        MethodInfo::new(name, "My.Company.Tests.LoginTest"),
        suite.run_id(),
    )
}

pub(crate) fn fixture_method(suite: &TestSuite, name: &str, kind: SuiteMethodKind) -> SuiteMethod {
    SuiteMethod::fixture(
        MethodInfo::new(name, "My.Company.Tests.LoginTest"),
        kind,
        suite.run_id(),
    )
}

pub(crate) fn step(name: &str) -> StepInvocation {
    StepInvocation::new(
        MethodInfo::new(name, "My.Company.Steps.Navigation"),
        Vec::<String>::new(),
    )
}
