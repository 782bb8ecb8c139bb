// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::TmsUuid;
use camino::Utf8PathBuf;
use std::fmt;
use thiserror::Error;

/// The kind of record a [`ClientError::UnknownItem`] refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ItemKind {
    /// A container.
    Container,

    /// A test result.
    TestResult,

    /// A fixture.
    Fixture,

    /// A step.
    Step,

    /// A test result or fixture that links and attachments can be added to.
    Attachable,

    /// A test result, fixture or step that steps can be nested under.
    StepParent,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Container => write!(f, "container"),
            ItemKind::TestResult => write!(f, "test result"),
            ItemKind::Fixture => write!(f, "fixture"),
            ItemKind::Step => write!(f, "step"),
            ItemKind::Attachable => write!(f, "test result or fixture"),
            ItemKind::StepParent => write!(f, "test result, fixture or step"),
        }
    }
}

/// An error returned by a [`TmsClient`](crate::TmsClient).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The client has no record with the given identifier.
    #[error("unknown {kind} `{id}`")]
    UnknownItem {
        /// The kind of record that was looked up.
        kind: ItemKind,

        /// The identifier that was looked up.
        id: TmsUuid,
    },

    /// A step was stopped while no step was running.
    #[error("no step is currently running")]
    NoRunningStep,

    /// An I/O error occurred while persisting a record.
    #[error("error writing `{path}`")]
    Io {
        /// The path that was being written.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// A record could not be serialized.
    #[error("error serializing record for `{path}`")]
    Serialize {
        /// The path the record was meant for.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },

    /// The backend (for example, a remote TMS) rejected the request.
    #[error("test management system error: {message}")]
    Backend {
        /// A description of the failure.
        message: String,
    },
}

impl ClientError {
    /// Creates a new [`ClientError::UnknownItem`].
    pub fn unknown(kind: ItemKind, id: TmsUuid) -> Self {
        Self::UnknownItem { kind, id }
    }

    /// Creates a new [`ClientError::Backend`].
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
