// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reporter configuration.
//!
//! Configuration is layered, lowest precedence first:
//!
//! 1. The embedded defaults in `default-config.toml`.
//! 2. A TOML config file (`tms.toml` in the current directory unless specified otherwise).
//! 3. Environment variables prefixed with `TMS_`, for example `TMS_TEST_RUN_ID`.

use crate::errors::{ConfigParseError, ConfigParseErrorKind};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::{collections::BTreeSet, fmt};
use tracing::{debug, warn};

/// Specifies where to load the reporter config file from.
#[derive(Clone, Copy, Debug)]
pub enum ConfigLocation<'a> {
    /// Load [`ReporterConfig::DEFAULT_PATH`] from the current directory if it exists.
    Default,

    /// Skip the config file, using only defaults and environment variables.
    Isolated,

    /// Load the config file from an explicit path. The file must exist.
    Explicit(&'a Utf8Path),
}

/// Configuration for reporting to a test management system.
///
/// The connection settings are passed through to the [`TmsClient`](tms_model::TmsClient) in use.
/// [`MemoryClient`](crate::client::MemoryClient) records the upload target in each persisted
/// result, but never the private token.
#[derive(Clone, Deserialize)]
pub struct ReporterConfig {
    /// The base URL of the test management system.
    pub url: String,

    /// The API token used to authenticate.
    pub private_token: String,

    /// The project that results are reported to.
    pub project_id: String,

    /// The configuration that results are reported under.
    pub configuration_id: String,

    /// The test run that results are added to. If unset or empty, a run is created on startup.
    #[serde(default)]
    pub test_run_id: Option<String>,

    /// The name given to a newly created test run.
    pub test_run_name: String,

    /// Whether unknown test cases are created automatically.
    pub automatic_creation_test_cases: bool,

    /// A directory where written test results are persisted as JSON.
    #[serde(default)]
    pub results_dir: Option<Utf8PathBuf>,
}

impl ReporterConfig {
    /// The config file loaded by [`ConfigLocation::Default`].
    pub const DEFAULT_PATH: &'static str = "tms.toml";

    /// The prefix for environment variable overrides, followed by an underscore.
    pub const ENVIRONMENT_PREFIX: &'static str = "TMS";

    const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Loads configuration from the given location and the process environment.
    pub fn from_location(location: ConfigLocation<'_>) -> Result<Self, ConfigParseError> {
        Self::from_sources(location, None, &mut DefaultConfigWarnings)
    }

    /// Returns the built-in defaults, ignoring config files and the environment.
    pub fn default_config() -> Result<Self, ConfigParseError> {
        let builder = Self::make_default_config();
        let (config, _unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(None, kind))?;
        Ok(config)
    }

    /// Returns the configured test run identifier, treating an empty string as unset.
    pub fn test_run_id(&self) -> Option<&str> {
        self.test_run_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Returns true if a test run identifier is configured.
    pub fn has_test_run_id(&self) -> bool {
        self.test_run_id().is_some()
    }

    // ---
    // Helper methods
    // ---

    /// Loads configuration, reading environment overrides from `env` instead of the process
    /// environment if provided.
    fn from_sources(
        location: ConfigLocation<'_>,
        env: Option<config::Map<String, String>>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let mut builder = Self::make_default_config();

        let config_file = match location {
            ConfigLocation::Isolated => {
                debug!("reporter config: skipping config file (isolated)");
                None
            }
            ConfigLocation::Explicit(path) => {
                debug!("reporter config: loading from explicit path {path}");
                builder = builder.add_source(File::new(path.as_str(), FileFormat::Toml));
                Some(path.to_owned())
            }
            ConfigLocation::Default => {
                let path = Utf8PathBuf::from(Self::DEFAULT_PATH);
                debug!("reporter config: loading from {path} if present");
                builder = builder
                    .add_source(File::new(path.as_str(), FileFormat::Toml).required(false));
                Some(path)
            }
        };

        builder = builder.add_source(
            Environment::with_prefix(Self::ENVIRONMENT_PREFIX)
                .prefix_separator("_")
                .source(env),
        );

        let (config, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(config_file.clone(), kind))?;

        if !unknown.is_empty() {
            warnings.unknown_config_keys(config_file.as_deref(), &unknown);
        }

        Ok(config)
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(Self, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: ReporterConfig =
            serde_path_to_error::deserialize(ignored_de).map_err(|error| {
                // The config crate also reports the key; drop it so the path is only shown once.
                let path = error.path().clone();
                let error = match error.into_inner() {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

impl fmt::Debug for ReporterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let private_token = if self.private_token.is_empty() {
            ""
        } else {
            "[redacted]"
        };
        f.debug_struct("ReporterConfig")
            .field("url", &self.url)
            .field("private_token", &private_token)
            .field("project_id", &self.project_id)
            .field("configuration_id", &self.configuration_id)
            .field("test_run_id", &self.test_run_id)
            .field("test_run_name", &self.test_run_name)
            .field(
                "automatic_creation_test_cases",
                &self.automatic_creation_test_cases,
            )
            .field("results_dir", &self.results_dir)
            .finish()
    }
}

/// Handles warnings produced while loading the config.
trait ConfigWarnings {
    /// Handle unknown configuration keys.
    fn unknown_config_keys(&mut self, config_file: Option<&Utf8Path>, unknown: &BTreeSet<String>);
}

/// Logs config warnings.
struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(&mut self, config_file: Option<&Utf8Path>, unknown: &BTreeSet<String>) {
        let keys = unknown.iter().cloned().collect::<Vec<_>>().join(", ");
        match config_file {
            Some(config_file) => {
                warn!("in reporter config {config_file}, ignoring unknown configuration keys: {keys}")
            }
            None => warn!("in reporter config, ignoring unknown configuration keys: {keys}"),
        }
    }
}
