// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::TmsUuid;
use camino::Utf8PathBuf;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::fmt;

/// The status of a record in a test management system.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    /// Passed.
    #[default]
    Passed,

    /// Failed.
    Failed,

    /// Skipped.
    Skipped,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Passed => write!(f, "Passed"),
            Status::Failed => write!(f, "Failed"),
            Status::Skipped => write!(f, "Skipped"),
        }
    }
}

/// Where a record is in its lifecycle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Stage {
    /// The record was created but not started.
    #[default]
    Scheduled,

    /// The record was started and not yet stopped.
    Running,

    /// The record was stopped.
    Finished,
}

/// The relationship a [`Link`] expresses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum LinkType {
    /// A generic related resource.
    Related,

    /// The result is blocked by the linked resource.
    BlockedBy,

    /// The result is caused by a known defect.
    Defect,

    /// A linked issue.
    Issue,

    /// A linked requirement.
    Requirement,

    /// A linked repository.
    Repository,
}

/// A link from a test result to an external resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// The title shown for the link.
    pub title: String,

    /// The target of the link.
    pub url: String,

    /// A longer description of the link.
    pub description: String,

    /// What the link expresses.
    pub link_type: LinkType,
}

impl Link {
    /// Creates a new link.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        description: impl Into<String>,
        link_type: LinkType,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            description: description.into(),
            link_type,
        }
    }
}

/// A step recorded within a test result, a fixture, or another step.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    /// The identifier of this step.
    pub id: TmsUuid,

    /// The name under which the step is displayed.
    pub display_name: String,

    /// The status of the step.
    pub status: Option<Status>,

    /// The lifecycle stage of the step.
    pub stage: Stage,

    /// The time at which the step started.
    pub start: Option<DateTime<FixedOffset>>,

    /// The time at which the step stopped.
    pub stop: Option<DateTime<FixedOffset>>,

    /// Nested steps.
    pub steps: Vec<StepResult>,
}

impl StepResult {
    /// Creates a new step.
    pub fn new(id: TmsUuid, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            status: None,
            stage: Stage::Scheduled,
            start: None,
            stop: None,
            steps: Vec::new(),
        }
    }

    /// Sets the status.
    pub fn set_status(&mut self, status: Status) -> &mut Self {
        self.status = Some(status);
        self
    }
}

/// A before or after fixture recorded within a container.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureResult {
    /// The identifier of this fixture.
    pub id: TmsUuid,

    /// The name under which the fixture is displayed.
    pub display_name: String,

    /// The status of the fixture.
    pub status: Option<Status>,

    /// The lifecycle stage of the fixture.
    pub stage: Stage,

    /// The time at which the fixture started.
    pub start: Option<DateTime<FixedOffset>>,

    /// The time at which the fixture stopped.
    pub stop: Option<DateTime<FixedOffset>>,

    /// Steps recorded while the fixture ran.
    pub steps: Vec<StepResult>,

    /// Files attached to the fixture.
    pub attachments: Vec<Utf8PathBuf>,
}

impl FixtureResult {
    /// Creates a new fixture.
    pub fn new(id: TmsUuid, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            status: None,
            stage: Stage::Scheduled,
            start: None,
            stop: None,
            steps: Vec::new(),
            attachments: Vec::new(),
        }
    }
}

/// The result of a single test.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// The identifier of this test result.
    pub id: TmsUuid,

    /// The unqualified name of the class declaring the test.
    pub class_name: String,

    /// The namespace of the class declaring the test.
    pub namespace: String,

    /// A stable identifier of the test as known to the test framework.
    pub external_id: String,

    /// The name under which the test is displayed.
    pub display_name: String,

    /// The human-readable title of the test.
    pub title: String,

    /// Labels attached to the test.
    pub labels: Vec<String>,

    /// Work items (manual test cases) this result is linked to.
    pub work_item_ids: Vec<String>,

    /// The status of the test.
    pub status: Option<Status>,

    /// The failure message.
    pub message: Option<String>,

    /// The failure stack trace.
    pub trace: Option<String>,

    /// The lifecycle stage of the test result.
    pub stage: Stage,

    /// The time at which the test started.
    pub start: Option<DateTime<FixedOffset>>,

    /// The time at which the test stopped.
    pub stop: Option<DateTime<FixedOffset>>,

    /// Steps recorded while the test ran.
    pub steps: Vec<StepResult>,

    /// Links attached to the test result.
    pub links: Vec<Link>,

    /// Files attached to the test result.
    pub attachments: Vec<Utf8PathBuf>,
}

impl TestResult {
    /// Creates a new, empty test result.
    pub fn new(id: TmsUuid, display_name: impl Into<String>) -> Self {
        Self {
            id,
            class_name: String::new(),
            namespace: String::new(),
            external_id: String::new(),
            display_name: display_name.into(),
            title: String::new(),
            labels: Vec::new(),
            work_item_ids: Vec::new(),
            status: None,
            message: None,
            trace: None,
            stage: Stage::Scheduled,
            start: None,
            stop: None,
            steps: Vec::new(),
            links: Vec::new(),
            attachments: Vec::new(),
        }
    }
}

/// A container grouping test results and fixtures.
///
/// Containers can be nested: a suite's container is the parent of one container per test.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassContainer {
    /// The identifier of this container.
    pub id: TmsUuid,

    /// The parent container, if any.
    pub parent: Option<TmsUuid>,

    /// Test results and nested containers started within this container.
    pub children: Vec<TmsUuid>,

    /// Fixtures run before the contents of this container.
    pub befores: Vec<FixtureResult>,

    /// Fixtures run after the contents of this container.
    pub afters: Vec<FixtureResult>,

    /// The time at which the container started.
    pub start: Option<DateTime<FixedOffset>>,

    /// The time at which the container stopped.
    pub stop: Option<DateTime<FixedOffset>>,
}

impl ClassContainer {
    /// Creates a new container with the given identifier.
    pub fn new(id: TmsUuid) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            befores: Vec::new(),
            afters: Vec::new(),
            start: None,
            stop: None,
        }
    }

    /// Creates a new container with a freshly generated identifier.
    pub fn generate() -> Self {
        Self::new(TmsUuid::new_v4())
    }
}
