// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use newtype_uuid::{TypedUuid, TypedUuidKind, TypedUuidTag};

/// The kind for [`SuiteRunUuid`].
pub enum SuiteRunKind {}

impl TypedUuidKind for SuiteRunKind {
    #[inline]
    fn tag() -> TypedUuidTag {
        const TAG: TypedUuidTag = TypedUuidTag::new("suite_run");
        TAG
    }
}

/// Identifies one execution of a test suite.
///
/// A fresh identifier is produced every time a suite runs.
pub type SuiteRunUuid = TypedUuid<SuiteRunKind>;

/// The kind for [`MethodRunUuid`].
pub enum MethodRunKind {}

impl TypedUuidKind for MethodRunKind {
    #[inline]
    fn tag() -> TypedUuidTag {
        const TAG: TypedUuidTag = TypedUuidTag::new("method_run");
        TAG
    }
}

/// Identifies one execution of a suite method: a test or a fixture.
pub type MethodRunUuid = TypedUuid<MethodRunKind>;
