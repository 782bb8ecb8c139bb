// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the reporter.

use camino::Utf8PathBuf;
use config::ConfigError;
pub use display_error_chain::DisplayErrorChain;
use thiserror::Error;
use tms_model::ClientError;

/// An error that occurred while reporting to the test management system.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    /// A call to the TMS client failed.
    #[error("TMS client operation `{operation}` failed")]
    Client {
        /// The client operation that failed.
        operation: &'static str,

        /// The underlying error.
        #[source]
        error: ClientError,
    },

    /// A test run could not be created when the reporter started.
    #[error("failed to create a test run")]
    CreateTestRun(#[source] ClientError),

    /// The reporter configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigParseError),
}

impl ReportError {
    /// Returns a closure that wraps a [`ClientError`] returned by `operation`.
    ///
    /// Meant for use with `map_err`.
    pub(crate) fn client(operation: &'static str) -> impl FnOnce(ClientError) -> Self {
        move |error| Self::Client { operation, error }
    }
}

/// An error that occurred while loading the reporter configuration.
#[derive(Debug, Error)]
#[error(
    "failed to load TMS reporter config{}",
    .config_file.as_ref().map_or_else(String::new, |f| format!(" at `{f}`"))
)]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Option<Utf8PathBuf>,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: Option<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self { config_file, kind }
    }

    /// Returns the config file that failed to load, if a file was involved.
    pub fn config_file(&self) -> Option<&Utf8PathBuf> {
        self.config_file.as_ref()
    }

    /// Returns the kind of error that occurred.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of a [`ConfigParseError`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// Sources could not be read or merged.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// The merged configuration could not be deserialized.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),
}
