// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use newtype_uuid::{TypedUuid, TypedUuidKind, TypedUuidTag};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind for [`TmsUuid`].
pub enum TmsItemKind {}

impl TypedUuidKind for TmsItemKind {
    #[inline]
    fn tag() -> TypedUuidTag {
        const TAG: TypedUuidTag = TypedUuidTag::new("tms_item");
        TAG
    }
}

/// Identifies a record created in a test management system: a container, a test result, a
/// fixture or a step.
///
/// Identifiers are generated by the reporter with [`TmsUuid::new_v4`] before the record is sent
/// to the client.
pub type TmsUuid = TypedUuid<TmsItemKind>;

/// Identifies a test run in a test management system.
///
/// Run identifiers are assigned by the TMS (or configured up front), so they are opaque strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestRunId(String);

impl TestRunId {
    /// Creates a new run identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
