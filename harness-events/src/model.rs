// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{MethodRunUuid, SuiteRunUuid};
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;

/// The result of running a suite, test or fixture.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Status {
    /// The unit ran to completion without failing.
    #[default]
    Passed,

    /// The unit failed.
    Failed,

    /// The unit was not run.
    Skipped,
}

impl Status {
    /// All known statuses.
    pub const ALL: [Status; 3] = [Status::Passed, Status::Failed, Status::Skipped];

    /// Returns the lowercase name of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Passed => "passed",
            Status::Failed => "failed",
            Status::Skipped => "skipped",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file produced while a test or fixture ran, such as a screenshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    /// A human-readable name for the attachment.
    pub name: String,

    /// Where the attachment was written.
    pub file_path: Utf8PathBuf,
}

impl Attachment {
    /// Creates a new attachment. The name defaults to the file name of the path.
    pub fn new(file_path: impl Into<Utf8PathBuf>) -> Self {
        let file_path = file_path.into();
        let name = file_path.file_name().unwrap_or_default().to_owned();
        Self { name, file_path }
    }

    /// Returns the path to the attachment.
    pub fn file_path(&self) -> &Utf8Path {
        &self.file_path
    }
}

/// A known defect that a test outcome is linked to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Defect {
    /// The identifier of the defect in an issue tracker.
    pub id: String,

    /// Free-form text describing why the outcome is linked to the defect.
    pub comment: String,
}

impl Defect {
    /// Creates a new defect link.
    pub fn new(id: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            comment: comment.into(),
        }
    }
}

/// The outcome of a single test or fixture run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestOutcome {
    /// The identifier of this run.
    pub id: MethodRunUuid,

    /// The identifier of the suite run this method belongs to.
    pub parent_id: SuiteRunUuid,

    /// The result of the run. Only final once the method has finished.
    pub result: Status,

    /// The identifier of the test case in a test management system, if the test declares one.
    pub test_case_id: Option<String>,

    /// The human-readable title of the test.
    pub title: String,

    /// The failure message, if the run failed.
    pub fail_message: Option<String>,

    /// The stack trace of the failure, if the run failed.
    pub fail_stack_trace: Option<String>,

    /// Files attached during the run.
    pub attachments: Vec<Attachment>,

    /// A known defect linked to this outcome.
    pub defect: Option<Defect>,
}

impl TestOutcome {
    /// Creates a new, passing outcome for the given run.
    pub fn new(id: MethodRunUuid, parent_id: SuiteRunUuid) -> Self {
        Self {
            id,
            parent_id,
            result: Status::Passed,
            test_case_id: None,
            title: String::new(),
            fail_message: None,
            fail_stack_trace: None,
            attachments: Vec::new(),
            defect: None,
        }
    }

    /// Sets the result.
    pub fn set_result(&mut self, result: Status) -> &mut Self {
        self.result = result;
        self
    }

    /// Sets the title.
    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    /// Sets the test management system's test case identifier.
    pub fn set_test_case_id(&mut self, test_case_id: impl Into<String>) -> &mut Self {
        self.test_case_id = Some(test_case_id.into());
        self
    }

    /// Marks this outcome as failed with the given message and stack trace.
    pub fn set_failure(
        &mut self,
        message: impl Into<String>,
        stack_trace: impl Into<String>,
    ) -> &mut Self {
        self.result = Status::Failed;
        self.fail_message = Some(message.into());
        self.fail_stack_trace = Some(stack_trace.into());
        self
    }

    /// Adds an attachment.
    pub fn add_attachment(&mut self, attachment: Attachment) -> &mut Self {
        self.attachments.push(attachment);
        self
    }

    /// Links a known defect.
    pub fn set_defect(&mut self, defect: Defect) -> &mut Self {
        self.defect = Some(defect);
        self
    }
}

/// The outcome of a suite run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuiteOutcome {
    /// The identifier of this suite run.
    pub id: SuiteRunUuid,

    /// The overall result of the suite.
    pub result: Status,
}

/// A test suite: a group of tests sharing setup and teardown fixtures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestSuite {
    /// The name of the suite.
    pub name: String,

    /// The outcome of the current run of this suite.
    pub outcome: SuiteOutcome,

    /// Tags declared on the suite.
    pub tags: Vec<String>,
}

impl TestSuite {
    /// Creates a new suite with a fresh run identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(name, SuiteRunUuid::new_v4())
    }

    /// Creates a new suite with the given run identifier.
    pub fn with_id(name: impl Into<String>, id: SuiteRunUuid) -> Self {
        Self {
            name: name.into(),
            outcome: SuiteOutcome {
                id,
                result: Status::Passed,
            },
            tags: Vec::new(),
        }
    }

    /// Returns the identifier of this suite run.
    #[inline]
    pub fn run_id(&self) -> SuiteRunUuid {
        self.outcome.id
    }

    /// Adds tags to the suite.
    pub fn add_tags(&mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }
}

/// A method declared on a test class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodInfo {
    /// The method name.
    pub name: String,

    /// The fully qualified, dot-separated name of the type declaring the method.
    pub declaring_type: String,
}

impl MethodInfo {
    /// Creates a new method description.
    pub fn new(name: impl Into<String>, declaring_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declaring_type: declaring_type.into(),
        }
    }
}

/// What role a suite method plays.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SuiteMethodKind {
    /// A test.
    Test,

    /// A fixture run once before all tests of a suite.
    BeforeSuite,

    /// A fixture run once after all tests of a suite.
    AfterSuite,

    /// A fixture run before each test of a suite.
    BeforeTest,

    /// A fixture run after each test of a suite.
    AfterTest,
}

impl SuiteMethodKind {
    /// Returns true if this method is a fixture rather than a test.
    pub fn is_fixture(self) -> bool {
        !matches!(self, SuiteMethodKind::Test)
    }
}

/// A test or fixture, together with the outcome of its current run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuiteMethod {
    /// The method being run.
    pub method: MethodInfo,

    /// Whether this is a test or a fixture.
    pub kind: SuiteMethodKind,

    /// The outcome of the current run.
    pub outcome: TestOutcome,

    /// Categories declared on a test. Always empty for fixtures.
    pub categories: Vec<String>,
}

impl SuiteMethod {
    /// Creates a new test belonging to the given suite run.
    pub fn test(method: MethodInfo, parent_id: SuiteRunUuid) -> Self {
        Self::new(method, SuiteMethodKind::Test, parent_id)
    }

    /// Creates a new fixture of the given kind belonging to the given suite run.
    pub fn fixture(method: MethodInfo, kind: SuiteMethodKind, parent_id: SuiteRunUuid) -> Self {
        Self::new(method, kind, parent_id)
    }

    fn new(method: MethodInfo, kind: SuiteMethodKind, parent_id: SuiteRunUuid) -> Self {
        let mut outcome = TestOutcome::new(MethodRunUuid::new_v4(), parent_id);
        outcome.set_title(method.name.clone());
        Self {
            method,
            kind,
            outcome,
            categories: Vec::new(),
        }
    }

    /// Returns the identifier of the current run.
    #[inline]
    pub fn run_id(&self) -> MethodRunUuid {
        self.outcome.id
    }

    /// Adds categories to a test.
    pub fn add_categories(
        &mut self,
        categories: impl IntoIterator<Item = impl Into<String>>,
    ) -> &mut Self {
        self.categories
            .extend(categories.into_iter().map(Into::into));
        self
    }
}

/// A call to a step method, as seen when the step starts or finishes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepInvocation {
    /// The step method.
    pub method: MethodInfo,

    /// A description template declared on the step, with `{0}`, `{1}`, ... placeholders for the
    /// arguments.
    pub description: Option<String>,

    /// The call arguments, already rendered as strings.
    pub arguments: Vec<String>,
}

impl StepInvocation {
    /// Creates a new step invocation without a description template.
    pub fn new(
        method: MethodInfo,
        arguments: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            method,
            description: None,
            arguments: arguments.into_iter().map(Into::into).collect(),
        }
    }

    /// Sets the description template.
    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the name under which this step is displayed.
    ///
    /// Placeholders without a matching argument are left as-is.
    pub fn display_name(&self) -> String {
        match &self.description {
            Some(template) => fill_placeholders(template, &self.arguments),
            None if self.arguments.is_empty() => self.method.name.clone(),
            None => format!("{}({})", self.method.name, self.arguments.join(", ")),
        }
    }
}

/// Replaces `{N}` placeholders in one left-to-right pass, so substituted text is never
/// expanded again.
fn fill_placeholders(template: &str, arguments: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let argument = after.find('}').and_then(|close| {
            let index = after[..close].parse::<usize>().ok()?;
            Some((arguments.get(index)?, close))
        });
        match argument {
            Some((argument, close)) => {
                out.push_str(argument);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn invocation(description: Option<&str>, arguments: &[&str]) -> StepInvocation {
        let mut step = StepInvocation::new(
            MethodInfo::new("OpenPage", "My.Company.Steps.Navigation"),
            arguments.iter().copied(),
        );
        if let Some(description) = description {
            step.set_description(description);
        }
        step
    }

    #[test_case(None, &[], "OpenPage" ; "no arguments")]
    #[test_case(None, &["home", "42"], "OpenPage(home, 42)" ; "arguments")]
    #[test_case(Some("Open '{0}' page"), &["home"], "Open 'home' page" ; "template")]
    #[test_case(Some("{0} and {1}"), &["{1}", "x"], "{1} and x" ; "argument text is not expanded")]
    #[test_case(Some("{1}{0}{1}"), &["a", "b"], "bab" ; "repeated and reordered")]
    #[test_case(Some("{2} of {x} {"), &["a"], "{2} of {x} {" ; "unmatched placeholders kept")]
    #[test_case(Some("Open {0} then {1}"), &["a", "b"], "Open a then b" ; "template two arguments")]
    #[test_case(Some("Open {0} then {1}"), &["a"], "Open a then {1}" ; "missing argument")]
    fn step_display_name(description: Option<&str>, arguments: &[&str], expected: &str) {
        assert_eq!(invocation(description, arguments).display_name(), expected);
    }

    #[test]
    fn attachment_name_defaults_to_file_name() {
        let attachment = Attachment::new("/tmp/screens/a.png");
        assert_eq!(attachment.name, "a.png");
        assert_eq!(attachment.file_path(), "/tmp/screens/a.png");
    }

    #[test]
    fn failure_sets_result() {
        let suite = TestSuite::new("Login");
        let mut test = SuiteMethod::test(MethodInfo::new("Works", "A.B"), suite.run_id());
        assert_eq!(test.outcome.result, Status::Passed);
        assert_eq!(test.outcome.title, "Works");

        test.outcome.set_failure("boom", "at A.B.Works()");
        assert_eq!(test.outcome.result, Status::Failed);
        assert_eq!(test.outcome.fail_message.as_deref(), Some("boom"));
        assert_eq!(test.outcome.parent_id, suite.run_id());
    }

    #[test]
    fn fixture_kinds() {
        assert!(!SuiteMethodKind::Test.is_fixture());
        for kind in [
            SuiteMethodKind::BeforeSuite,
            SuiteMethodKind::AfterSuite,
            SuiteMethodKind::BeforeTest,
            SuiteMethodKind::AfterTest,
        ] {
            assert!(kind.is_fixture(), "{kind:?} is a fixture");
        }
    }
}
