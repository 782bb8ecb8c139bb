// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Reports the lifecycle events of a test-execution framework to a test management system (TMS).
//!
//! The flow is:
//!
//! 1. A [`ReporterInstance`](subscription::ReporterInstance) subscribes a
//!    [`ReportingListener`](listener::ReportingListener) to every
//!    [`FrameworkEvents`](harness_events::FrameworkEvents) source.
//! 2. When the framework fires an event, the listener looks up or records the TMS identifiers
//!    for the framework's run identifier in its [`correlation`] store.
//! 3. The [`mapping`] functions turn framework outcomes into TMS records.
//! 4. The listener hands those records to a [`TmsClient`](tms_model::TmsClient).
//!
//! Reporting never interferes with test execution: failures talking to the TMS are logged and
//! discarded at each handler boundary.

pub mod client;
pub mod config;
pub mod correlation;
pub mod errors;
pub mod listener;
pub mod mapping;
pub mod subscription;
#[cfg(test)]
mod test_helpers;
