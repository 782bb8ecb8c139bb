// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use camino_tempfile::Utf8TempDir;
use harness_events::{
    Attachment, Defect, FrameworkEvents, MethodInfo, Status as FrameworkStatus, StepInvocation,
    SuiteMethod, SuiteMethodKind, TestSuite,
};
use indoc::formatdoc;
use pretty_assertions::assert_eq;
use std::{sync::Arc, thread};
use tms_model::{LinkType, Stage, Status};
use tms_reporter::{
    client::MemoryClient,
    config::{ConfigLocation, ReporterConfig},
    correlation::LiveEntries,
    subscription::ReporterInstance,
};

struct Harness {
    _dir: Utf8TempDir,
    results_dir: Utf8PathBuf,
    events: Arc<FrameworkEvents>,
    client: Arc<MemoryClient>,
    instance: ReporterInstance,
}

impl Harness {
    fn new() -> Self {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let results_dir = dir.path().join("results");
        let config_path = dir.path().join("tms.toml");
        fs_err::write(
            &config_path,
            formatdoc! {r#"
                url = "https://tms.example.com"
                private_token = "secret"
                project_id = "project-1"
                configuration_id = "configuration-1"
                test_run_name = "nightly"
                results_dir = '{results_dir}'
            "#, results_dir = results_dir},
        )
        .expect("wrote config");

        let config = ReporterConfig::from_location(ConfigLocation::Explicit(&config_path))
            .expect("config loaded");
        let client = Arc::new(MemoryClient::from_config(&config));
        let events = Arc::new(FrameworkEvents::new());
        let instance = ReporterInstance::from_config(events.clone(), client.clone(), &config)
            .expect("reporter created");

        Self {
            _dir: dir,
            results_dir,
            events,
            client,
            instance,
        }
    }
}

fn test(suite: &TestSuite, name: &str) -> SuiteMethod {
    SuiteMethod::test(
        MethodInfo::new(name, "Acme.Checkout.Tests.CartTest"),
        suite.run_id(),
    )
}

fn step(name: &str, arguments: &[&str]) -> StepInvocation {
    StepInvocation::new(
        MethodInfo::new(name, "Acme.Checkout.Steps.CartSteps"),
        arguments.iter().copied(),
    )
}

#[test]
fn full_run_is_recorded_and_persisted() {
    let harness = Harness::new();
    let events = &harness.events;

    // Run creation happened once, since no run was configured.
    let run_id = harness.client.test_run_id().expect("test run created");
    assert_eq!(harness.instance.listener().test_run_id(), &run_id);

    let mut suite = TestSuite::new("Cart");
    suite.add_tags(["checkout", "smoke"]);
    let setup = SuiteMethod::fixture(
        MethodInfo::new("SeedCatalog", "Acme.Checkout.Tests.CartTest"),
        SuiteMethodKind::BeforeSuite,
        suite.run_id(),
    );

    let mut passing = test(&suite, "AddsItem");
    passing.add_categories(["smoke", "fast"]);
    passing.outcome.set_test_case_id("TC-100");

    let mut failing = test(&suite, "RemovesItem");
    let mut skipped = test(&suite, "AppliesCoupon");
    skipped.outcome.set_result(FrameworkStatus::Skipped);

    events.suite_started.fire(&suite);
    events.fixture_started.fire(&setup);
    events.fixture_finished.fire(&setup);

    events.test_started.fire(&passing);
    events.step_started.fire(&step("AddToCart", &["book"]));
    events.step_finished.fire(&step("AddToCart", &["book"]));
    events.test_finished.fire(&passing);

    events.test_started.fire(&failing);
    events.step_started.fire(&step("OpenCart", &[]));
    events.step_finished.fire(&step("OpenCart", &[]));
    events.step_started.fire(&step("Remove", &["book"]));
    events.step_finished.fire(&step("Remove", &["book"]));
    failing
        .outcome
        .set_failure("cart still has 1 item", "at CartTest.RemovesItem()")
        .add_attachment(Attachment::new("/tmp/cart.png"))
        .set_defect(Defect::new("BUG-42", "remove button is flaky"));
    events.test_finished.fire(&failing);

    events.test_skipped.fire(&skipped);
    events.suite_finished.fire(&suite);

    let written = harness.client.written_results();
    let summary: Vec<_> = written
        .iter()
        .map(|result| (result.display_name.as_str(), result.status))
        .collect();
    assert_eq!(
        summary,
        [
            ("AddsItem", Some(Status::Passed)),
            ("RemovesItem", Some(Status::Failed)),
            ("AppliesCoupon", Some(Status::Skipped)),
        ]
    );

    let passed = &written[0];
    assert_eq!(passed.namespace, "Acme.Checkout.Tests");
    assert_eq!(passed.class_name, "CartTest");
    assert_eq!(passed.labels, ["checkout", "smoke", "fast"]);
    assert_eq!(passed.work_item_ids, ["TC-100"]);
    assert_eq!(passed.steps.len(), 1);
    assert_eq!(passed.steps[0].display_name, "AddToCart(book)");
    assert_eq!(passed.steps[0].status, Some(Status::Passed));
    assert_eq!(passed.stage, Stage::Finished);

    let failed = &written[1];
    assert_eq!(failed.message.as_deref(), Some("cart still has 1 item"));
    assert_eq!(failed.links.len(), 1);
    assert_eq!(failed.links[0].link_type, LinkType::Defect);
    assert_eq!(failed.links[0].title, "remove button is flaky");
    assert_eq!(failed.links[0].url, "BUG-42");
    assert_eq!(failed.attachments, [Utf8PathBuf::from("/tmp/cart.png")]);
    let step_statuses: Vec<_> = failed.steps.iter().map(|step| step.status).collect();
    assert_eq!(
        step_statuses,
        [Some(Status::Passed), Some(Status::Failed)]
    );

    // Every written result was persisted.
    for result in &written {
        let path = harness.results_dir.join(format!("{}-result.json", result.id));
        let json: serde_json::Value =
            serde_json::from_str(&fs_err::read_to_string(&path).expect("result file exists"))
                .expect("result file is JSON");
        assert_eq!(json["testRunId"], run_id.as_str());
        assert_eq!(json["testRunName"], "nightly");
        assert_eq!(json["result"]["displayName"], result.display_name.as_str());
    }

    assert_eq!(
        harness.instance.listener().live_entries(),
        LiveEntries::default()
    );
    harness.instance.dispose();
    assert_eq!(harness.events.total_handler_count(), 0);
}

#[test]
fn parallel_suites_report_every_test() {
    let harness = Harness::new();

    thread::scope(|scope| {
        for suite_index in 0..4 {
            let events = &harness.events;
            scope.spawn(move || {
                let suite = TestSuite::new(format!("Suite{suite_index}"));
                events.suite_started.fire(&suite);
                let tests: Vec<_> = (0..5)
                    .map(|test_index| test(&suite, &format!("Test{test_index}")))
                    .collect();
                for test in &tests {
                    events.test_started.fire(test);
                }
                for test in &tests {
                    events.test_finished.fire(test);
                }
                events.suite_finished.fire(&suite);
            });
        }
    });

    assert_eq!(harness.client.written_results().len(), 20);
    assert_eq!(
        harness.instance.listener().live_entries(),
        LiveEntries::default()
    );
}

#[test]
fn configured_run_is_reused() {
    let dir = Utf8TempDir::new().expect("created temp dir");
    let config_path = dir.path().join("tms.toml");
    fs_err::write(&config_path, "test_run_id = \"existing-run\"\n").expect("wrote config");

    let config = ReporterConfig::from_location(ConfigLocation::Explicit(&config_path))
        .expect("config loaded");
    let client = Arc::new(MemoryClient::from_config(&config));
    let instance = ReporterInstance::from_config(
        Arc::new(FrameworkEvents::new()),
        client.clone(),
        &config,
    )
    .expect("reporter created");

    assert_eq!(instance.listener().test_run_id().as_str(), "existing-run");
    assert_eq!(
        client.test_run_id().as_ref().map(|id| id.as_str()),
        Some("existing-run")
    );
}
