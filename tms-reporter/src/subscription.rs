// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attaching a [`ReportingListener`] to a framework's event sources.

use crate::{config::ReporterConfig, errors::ReportError, listener::ReportingListener};
use harness_events::{EventKind, EventSource, FrameworkEvents, HandlerId};
use std::sync::Arc;
use tms_model::TmsClient;
use tracing::debug;

/// A listener subscribed to every event source of a framework.
///
/// Handlers stay subscribed until the instance is disposed of or dropped.
#[derive(Debug)]
pub struct ReporterInstance {
    events: Arc<FrameworkEvents>,
    listener: Arc<ReportingListener>,
    registrations: Vec<(EventKind, HandlerId)>,
}

impl ReporterInstance {
    /// Subscribes `listener` to every event source in `events`.
    pub fn new(events: Arc<FrameworkEvents>, listener: Arc<ReportingListener>) -> Self {
        let registrations = vec![
            register(&events.suite_started, &listener, ReportingListener::start_suite),
            register(&events.suite_finished, &listener, ReportingListener::finish_suite),
            register(&events.test_started, &listener, ReportingListener::start_test),
            register(&events.test_finished, &listener, ReportingListener::finish_test),
            register(&events.test_skipped, &listener, ReportingListener::skip_test),
            register(&events.fixture_started, &listener, ReportingListener::start_fixture),
            register(&events.fixture_finished, &listener, ReportingListener::finish_fixture),
            register(&events.step_started, &listener, ReportingListener::start_step),
            register(&events.step_finished, &listener, ReportingListener::finish_step),
        ];
        debug!(
            handlers = registrations.len(),
            test_run_id = %listener.test_run_id(),
            "subscribed TMS reporter",
        );

        Self {
            events,
            listener,
            registrations,
        }
    }

    /// Creates a listener reporting to `client`, then subscribes it to `events`.
    ///
    /// Fails only if a test run had to be created and that failed.
    pub fn from_config(
        events: Arc<FrameworkEvents>,
        client: Arc<dyn TmsClient>,
        config: &ReporterConfig,
    ) -> Result<Self, ReportError> {
        let listener = ReportingListener::new(client, config)?;
        Ok(Self::new(events, Arc::new(listener)))
    }

    /// Returns the subscribed listener.
    pub fn listener(&self) -> &Arc<ReportingListener> {
        &self.listener
    }

    /// Unsubscribes every handler added by [`new`](Self::new).
    pub fn dispose(mut self) {
        self.unsubscribe_all();
    }

    fn unsubscribe_all(&mut self) {
        if self.registrations.is_empty() {
            return;
        }

        for (kind, id) in self.registrations.drain(..) {
            if !self.events.unsubscribe(kind, id) {
                debug!(%kind, ?id, "handler was already unsubscribed");
            }
        }
        debug!("unsubscribed TMS reporter");
    }
}

impl Drop for ReporterInstance {
    fn drop(&mut self) {
        self.unsubscribe_all();
    }
}

fn register<T: 'static>(
    source: &EventSource<T>,
    listener: &Arc<ReportingListener>,
    handler: fn(&ReportingListener, &T),
) -> (EventKind, HandlerId) {
    let listener = Arc::clone(listener);
    let id = source.subscribe(move |event: &T| handler(&listener, event));
    (source.kind(), id)
}
