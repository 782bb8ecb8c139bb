// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Record model and client interface for a test management system (TMS).
//!
//! A TMS stores test runs as a tree: [`ClassContainer`]s group [`TestResult`]s and before/after
//! [`FixtureResult`]s, and both test results and fixtures hold nested [`StepResult`]s. Reporters
//! build these records and hand them to a [`TmsClient`], which owns storage and transport.

mod client;
mod errors;
mod ids;
mod records;

pub use client::*;
pub use errors::*;
pub use ids::*;
pub use records::*;
