// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! The lifecycle event model of a test-execution framework.
//!
//! A framework fires events as it runs suites, tests, fixtures and steps. This crate defines what
//! those events carry ([`TestSuite`], [`SuiteMethod`], [`StepInvocation`]) and where they are
//! delivered ([`FrameworkEvents`], a set of [`EventSource`]s that listeners subscribe to).
//!
//! Everything here is read-only from a listener's point of view: listeners receive shared
//! references and never mutate outcomes.

mod ids;
mod model;
mod source;

pub use ids::*;
pub use model::*;
pub use source::*;
