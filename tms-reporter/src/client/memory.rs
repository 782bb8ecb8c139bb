// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::config::ReporterConfig;
use atomicwrites::{AtomicFile, OverwriteBehavior};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, FixedOffset, Local};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use tms_model::{
    ClassContainer, ClientError, FixtureResult, ItemKind, Link, Stage, StepResult, TestResult,
    TestRunId, TmsClient, TmsUuid,
};
use tracing::debug;

/// A [`TmsClient`] that keeps every record in memory.
///
/// Finished test results are moved to a written set when
/// [`write_test_case`](TmsClient::write_test_case) is called. If a results directory is
/// configured, each written result is also persisted there as
/// `<test-result-id>-result.json`, together with its container.
#[derive(Debug)]
pub struct MemoryClient {
    results_dir: Option<Utf8PathBuf>,
    test_run_name: String,
    target: RunTarget,
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    test_run_id: Option<TestRunId>,
    containers: IndexMap<TmsUuid, ClassContainer>,
    test_results: IndexMap<TmsUuid, TestResult>,
    fixtures: IndexMap<TmsUuid, RunningFixture>,
    steps: IndexMap<TmsUuid, RunningStep>,
    // Running steps, most recently started last.
    step_stack: Vec<TmsUuid>,
    written: IndexMap<TmsUuid, TestResult>,
}

#[derive(Debug)]
struct RunningFixture {
    container: TmsUuid,
    placement: Placement,
    result: FixtureResult,
}

#[derive(Copy, Clone, Debug)]
enum Placement {
    Before,
    After,
}

#[derive(Debug)]
struct RunningStep {
    parent: TmsUuid,
    result: StepResult,
}

/// Where results would be uploaded, recorded alongside each persisted result.
///
/// The private token is never recorded.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunTarget {
    url: String,
    project_id: String,
    configuration_id: String,
    automatic_creation_test_cases: bool,
}

/// A written test result as persisted to the results directory.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultFile<'a> {
    test_run_id: Option<&'a TestRunId>,
    test_run_name: &'a str,
    target: &'a RunTarget,
    container: &'a ClassContainer,
    result: &'a TestResult,
}

impl MemoryClient {
    /// Creates a new client that does not persist results.
    pub fn new() -> Self {
        Self {
            results_dir: None,
            test_run_name: String::new(),
            target: RunTarget::default(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Creates a new client from reporter configuration.
    ///
    /// The configured test run, if any, is taken as the current run. The upload target (URL,
    /// project and configuration) is recorded in every persisted result.
    pub fn from_config(config: &ReporterConfig) -> Self {
        let state = MemoryState {
            test_run_id: config.test_run_id().map(TestRunId::new),
            ..MemoryState::default()
        };
        Self {
            results_dir: config.results_dir.clone(),
            test_run_name: config.test_run_name.clone(),
            target: RunTarget {
                url: config.url.clone(),
                project_id: config.project_id.clone(),
                configuration_id: config.configuration_id.clone(),
                automatic_creation_test_cases: config.automatic_creation_test_cases,
            },
            state: Mutex::new(state),
        }
    }

    /// Persists written results to `results_dir`.
    pub fn with_results_dir(mut self, results_dir: impl Into<Utf8PathBuf>) -> Self {
        self.results_dir = Some(results_dir.into());
        self
    }

    /// Returns the directory written results are persisted to, if any.
    pub fn results_dir(&self) -> Option<&Utf8Path> {
        self.results_dir.as_deref()
    }

    /// Returns the current test run, if one was configured or created.
    pub fn test_run_id(&self) -> Option<TestRunId> {
        self.state.lock().test_run_id.clone()
    }

    /// Returns the written test results, in the order they were written.
    pub fn written_results(&self) -> Vec<TestResult> {
        self.state.lock().written.values().cloned().collect()
    }

    /// Returns a copy of a container.
    pub fn container(&self, id: TmsUuid) -> Option<ClassContainer> {
        self.state.lock().containers.get(&id).cloned()
    }

    /// Returns a copy of a test result, whether or not it was written.
    pub fn test_result(&self, id: TmsUuid) -> Option<TestResult> {
        let state = self.state.lock();
        state
            .test_results
            .get(&id)
            .or_else(|| state.written.get(&id))
            .cloned()
    }

    fn write_result_file(
        &self,
        dir: &Utf8Path,
        test_run_id: Option<&TestRunId>,
        container: &ClassContainer,
        result: &TestResult,
    ) -> Result<Utf8PathBuf, ClientError> {
        fs_err::create_dir_all(dir).map_err(|error| ClientError::Io {
            path: dir.to_owned(),
            error,
        })?;

        let path = dir.join(format!("{}-result.json", result.id));
        let file = ResultFile {
            test_run_id,
            test_run_name: &self.test_run_name,
            target: &self.target,
            container,
            result,
        };
        AtomicFile::new(&path, OverwriteBehavior::AllowOverwrite)
            .write(|f| serde_json::to_writer_pretty(f, &file))
            .map_err(|error| match error {
                atomicwrites::Error::Internal(error) => ClientError::Io {
                    path: path.clone(),
                    error,
                },
                atomicwrites::Error::User(error) => ClientError::Serialize {
                    path: path.clone(),
                    error,
                },
            })?;
        Ok(path)
    }
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryState {
    fn container_mut(&mut self, id: TmsUuid) -> Result<&mut ClassContainer, ClientError> {
        self.containers
            .get_mut(&id)
            .ok_or_else(|| ClientError::unknown(ItemKind::Container, id))
    }

    fn test_result_mut(&mut self, id: TmsUuid) -> Result<&mut TestResult, ClientError> {
        self.test_results
            .get_mut(&id)
            .ok_or_else(|| ClientError::unknown(ItemKind::TestResult, id))
    }

    fn fixture_mut(&mut self, id: TmsUuid) -> Result<&mut RunningFixture, ClientError> {
        self.fixtures
            .get_mut(&id)
            .ok_or_else(|| ClientError::unknown(ItemKind::Fixture, id))
    }

    fn start_fixture(
        &mut self,
        container: TmsUuid,
        placement: Placement,
        mut result: FixtureResult,
    ) -> Result<(), ClientError> {
        self.container_mut(container)?;
        result.stage = Stage::Running;
        result.start = Some(now());
        self.fixtures.insert(
            result.id,
            RunningFixture {
                container,
                placement,
                result,
            },
        );
        Ok(())
    }

    fn is_step_parent(&self, id: TmsUuid) -> bool {
        self.test_results.contains_key(&id)
            || self.fixtures.contains_key(&id)
            || self.steps.contains_key(&id)
    }

    fn parent_steps_mut(&mut self, id: TmsUuid) -> Option<&mut Vec<StepResult>> {
        if let Some(step) = self.steps.get_mut(&id) {
            Some(&mut step.result.steps)
        } else if let Some(fixture) = self.fixtures.get_mut(&id) {
            Some(&mut fixture.result.steps)
        } else {
            self.test_results.get_mut(&id).map(|result| &mut result.steps)
        }
    }
}

impl TmsClient for MemoryClient {
    fn create_test_run(&self) -> Result<TestRunId, ClientError> {
        let id = TestRunId::new(TmsUuid::new_v4().to_string());
        debug!(test_run_id = %id, test_run_name = %self.test_run_name, "created in-memory test run");
        self.state.lock().test_run_id = Some(id.clone());
        Ok(id)
    }

    fn start_test_container(
        &self,
        parent: Option<TmsUuid>,
        mut container: ClassContainer,
    ) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        if let Some(parent) = parent {
            state.container_mut(parent)?.children.push(container.id);
        }
        container.parent = parent;
        container.start = Some(now());
        state.containers.insert(container.id, container);
        Ok(())
    }

    fn stop_test_container(&self, id: TmsUuid) -> Result<(), ClientError> {
        self.state.lock().container_mut(id)?.stop = Some(now());
        Ok(())
    }

    fn start_test_case(&self, container: TmsUuid, mut result: TestResult) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        state.container_mut(container)?.children.push(result.id);
        result.stage = Stage::Running;
        result.start = Some(now());
        state.test_results.insert(result.id, result);
        Ok(())
    }

    fn update_test_case(
        &self,
        id: TmsUuid,
        update: &mut dyn FnMut(&mut TestResult),
    ) -> Result<(), ClientError> {
        update(self.state.lock().test_result_mut(id)?);
        Ok(())
    }

    fn stop_test_case(&self, id: TmsUuid) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        let result = state.test_result_mut(id)?;
        result.stage = Stage::Finished;
        result.stop = Some(now());
        Ok(())
    }

    fn write_test_case(&self, id: TmsUuid, container: TmsUuid) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        let container_record = state
            .containers
            .get(&container)
            .ok_or_else(|| ClientError::unknown(ItemKind::Container, container))?;
        let result = state
            .test_results
            .get(&id)
            .ok_or_else(|| ClientError::unknown(ItemKind::TestResult, id))?;

        // The result stays running until it has been persisted.
        if let Some(dir) = &self.results_dir {
            let path = self.write_result_file(
                dir,
                state.test_run_id.as_ref(),
                container_record,
                result,
            )?;
            debug!(%path, "wrote test result");
        }

        if let Some(result) = state.test_results.shift_remove(&id) {
            state.written.insert(id, result);
        }
        Ok(())
    }

    fn start_before_fixture(
        &self,
        container: TmsUuid,
        fixture: FixtureResult,
    ) -> Result<(), ClientError> {
        self.state
            .lock()
            .start_fixture(container, Placement::Before, fixture)
    }

    fn start_after_fixture(
        &self,
        container: TmsUuid,
        fixture: FixtureResult,
    ) -> Result<(), ClientError> {
        self.state
            .lock()
            .start_fixture(container, Placement::After, fixture)
    }

    fn update_fixture(
        &self,
        id: TmsUuid,
        update: &mut dyn FnMut(&mut FixtureResult),
    ) -> Result<(), ClientError> {
        update(&mut self.state.lock().fixture_mut(id)?.result);
        Ok(())
    }

    fn stop_fixture(&self, id: TmsUuid) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        let RunningFixture {
            container,
            placement,
            mut result,
        } = state
            .fixtures
            .shift_remove(&id)
            .ok_or_else(|| ClientError::unknown(ItemKind::Fixture, id))?;
        result.stage = Stage::Finished;
        result.stop = Some(now());

        let container = state.container_mut(container)?;
        match placement {
            Placement::Before => container.befores.push(result),
            Placement::After => container.afters.push(result),
        }
        Ok(())
    }

    fn start_step(&self, parent: TmsUuid, mut step: StepResult) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        if !state.is_step_parent(parent) {
            return Err(ClientError::unknown(ItemKind::StepParent, parent));
        }
        step.stage = Stage::Running;
        step.start = Some(now());
        state.step_stack.push(step.id);
        state.steps.insert(
            step.id,
            RunningStep {
                parent,
                result: step,
            },
        );
        Ok(())
    }

    fn update_step(
        &self,
        id: TmsUuid,
        update: &mut dyn FnMut(&mut StepResult),
    ) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        let step = state
            .steps
            .get_mut(&id)
            .ok_or_else(|| ClientError::unknown(ItemKind::Step, id))?;
        update(&mut step.result);
        Ok(())
    }

    fn stop_step(&self, update: &mut dyn FnMut(&mut StepResult)) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        let id = state.step_stack.pop().ok_or(ClientError::NoRunningStep)?;
        let RunningStep { parent, mut result } = state
            .steps
            .shift_remove(&id)
            .ok_or_else(|| ClientError::unknown(ItemKind::Step, id))?;
        update(&mut result);
        result.stage = Stage::Finished;
        result.stop = Some(now());

        let steps = state
            .parent_steps_mut(parent)
            .ok_or_else(|| ClientError::unknown(ItemKind::StepParent, parent))?;
        steps.push(result);
        Ok(())
    }

    fn add_link(&self, item: TmsUuid, link: Link) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        // Fixture records have no links.
        let result = state
            .test_results
            .get_mut(&item)
            .ok_or_else(|| ClientError::unknown(ItemKind::TestResult, item))?;
        result.links.push(link);
        Ok(())
    }

    fn add_attachment(&self, item: TmsUuid, path: &Utf8Path) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        if let Some(result) = state.test_results.get_mut(&item) {
            result.attachments.push(path.to_owned());
        } else if let Some(fixture) = state.fixtures.get_mut(&item) {
            fixture.result.attachments.push(path.to_owned());
        } else {
            return Err(ClientError::unknown(ItemKind::Attachable, item));
        }
        Ok(())
    }
}

fn now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}
