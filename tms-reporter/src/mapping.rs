// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Translation of framework outcomes into TMS records.
//!
//! Everything here is pure: the functions neither consult correlation state nor call the client.

use camino::Utf8PathBuf;
use harness_events::{Status as FrameworkStatus, SuiteMethod, SuiteMethodKind, TestOutcome};
use indexmap::IndexSet;
use tms_model::{Link, LinkType, Status, StepResult, TestResult, TmsUuid};

/// Maps a framework result to a TMS status.
///
/// Anything that is neither failed nor skipped counts as passed.
pub fn tms_status(status: FrameworkStatus) -> Status {
    match status {
        FrameworkStatus::Failed => Status::Failed,
        FrameworkStatus::Skipped => Status::Skipped,
        _ => Status::Passed,
    }
}

/// A dot-separated type name split into its namespace and class name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QualifiedName<'a> {
    /// Everything before the last `.`. Empty if the name has no `.`.
    pub namespace: &'a str,

    /// Everything after the last `.`.
    pub class_name: &'a str,
}

impl<'a> QualifiedName<'a> {
    /// Splits a fully qualified type name at its last `.`.
    ///
    /// A name without any `.` is treated as a class in the empty namespace.
    pub fn parse(type_name: &'a str) -> Self {
        match type_name.rsplit_once('.') {
            Some((namespace, class_name)) => Self {
                namespace,
                class_name,
            },
            None => Self {
                namespace: "",
                class_name: type_name,
            },
        }
    }
}

/// Computes the labels of a test: the union of its suite's tags and its own categories.
///
/// Duplicates are removed, keeping the first occurrence. Suite tags come first.
pub fn test_labels(suite_tags: &[String], categories: &[String]) -> Vec<String> {
    suite_tags
        .iter()
        .chain(categories)
        .cloned()
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// Builds the TMS record for a test that is starting.
pub fn new_test_result(id: TmsUuid, test: &SuiteMethod, labels: Vec<String>) -> TestResult {
    let name = QualifiedName::parse(&test.method.declaring_type);
    let outcome = &test.outcome;

    let mut result = TestResult::new(id, test.method.name.clone());
    result.class_name = name.class_name.to_owned();
    result.namespace = name.namespace.to_owned();
    result.external_id = outcome.id.to_string();
    result.title = outcome.title.clone();
    result.labels = labels;
    if let Some(test_case_id) = outcome.test_case_id.as_deref().filter(|id| !id.is_empty()) {
        result.work_item_ids.push(test_case_id.to_owned());
    }
    result
}

/// Where a fixture is recorded relative to its container's contents.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FixturePlacement {
    /// Recorded as a before-fixture.
    Before,

    /// Recorded as an after-fixture.
    After,
}

/// Determines where a suite method is recorded as a fixture. Returns `None` for tests.
pub fn fixture_placement(kind: SuiteMethodKind) -> Option<FixturePlacement> {
    match kind {
        SuiteMethodKind::BeforeSuite | SuiteMethodKind::BeforeTest => {
            Some(FixturePlacement::Before)
        }
        SuiteMethodKind::AfterSuite | SuiteMethodKind::AfterTest => Some(FixturePlacement::After),
        SuiteMethodKind::Test => None,
    }
}

/// What a failed outcome adds to its TMS record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailureDetails {
    /// The failure message.
    pub message: Option<String>,

    /// The failure stack trace.
    pub trace: Option<String>,

    /// A link to the known defect, if the outcome names one with a comment.
    pub defect_link: Option<Link>,

    /// Paths of the files attached to the outcome.
    pub attachments: Vec<Utf8PathBuf>,
}

impl FailureDetails {
    /// Extracts failure details from an outcome.
    pub fn from_outcome(outcome: &TestOutcome) -> Self {
        let defect_link = outcome
            .defect
            .as_ref()
            .filter(|defect| !defect.comment.is_empty())
            .map(|defect| Link::new(&defect.comment, &defect.id, "", LinkType::Defect));

        Self {
            message: outcome.fail_message.clone(),
            trace: outcome.fail_stack_trace.clone(),
            defect_link,
            attachments: outcome
                .attachments
                .iter()
                .map(|attachment| attachment.file_path.clone())
                .collect(),
        }
    }
}

/// Marks the last recorded step as failed.
///
/// Steps are stopped (as passed) before the failure of the enclosing test or fixture is known, so
/// the step that was running when the failure happened is the last one recorded.
pub fn mark_last_step_failed(steps: &mut [StepResult]) {
    if let Some(step) = steps.last_mut() {
        step.status = Some(Status::Failed);
    }
}
