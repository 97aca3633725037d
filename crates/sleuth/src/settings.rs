//! Settings read from the environment.

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::str::FromStr;
use std::time::Duration;
use std::{env, fs};

use sleuth_core::RoutingTable;
use sleuth_core::research::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MAX_ITERATIONS, DEFAULT_SOURCE_LIMIT,
};

/// Why the settings could not be loaded.
#[derive(Debug, PartialEq, Eq)]
pub enum SettingsError {
    /// A required variable is not set.
    Missing(&'static str),
    /// A variable holds a value that cannot be used.
    Invalid {
        /// The variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
    },
    /// The routing table file could not be read or parsed.
    RoutingTable {
        /// The file path.
        path: String,
        /// What went wrong.
        reason: String,
    },
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Missing(var) => {
                write!(f, "{var} environment variable is not set")
            }
            SettingsError::Invalid { var, value } => {
                write!(f, "{var} has an invalid value: {value:?}")
            }
            SettingsError::RoutingTable { path, reason } => {
                write!(f, "cannot load routing table from {path}: {reason}")
            }
        }
    }
}

impl StdError for SettingsError {}

/// Everything the terminal front end needs to assemble a session.
#[derive(Clone, PartialEq)]
pub struct Settings {
    /// `OPENAI_API_KEY`.
    pub openai_api_key: String,
    /// `OPENAI_BASE_URL`, the provider default when unset.
    pub openai_base_url: Option<String>,
    /// `OPENAI_MODEL`, the provider default when unset.
    pub openai_model: Option<String>,
    /// `FIRECRAWL_API_KEY`.
    pub firecrawl_api_key: String,
    /// `FIRECRAWL_BASE_URL`, the hosted API when unset.
    pub firecrawl_base_url: Option<String>,
    /// `SLEUTH_SOURCE_LIMIT`.
    pub source_limit: usize,
    /// `SLEUTH_MAX_ITERATIONS`.
    pub max_iterations: usize,
    /// `SLEUTH_CONFIDENCE_THRESHOLD`, `0..=100`.
    pub confidence_threshold: u8,
    /// Loaded from the JSON file named by `SLEUTH_ROUTING_TABLE`.
    pub routing_table: Option<RoutingTable>,
    /// `SLEUTH_DEADLINE_SECS`, the time budget of one request.
    pub deadline: Option<Duration>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("openai_api_key", &"<redacted>")
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("firecrawl_api_key", &"<redacted>")
            .field("firecrawl_base_url", &self.firecrawl_base_url)
            .field("source_limit", &self.source_limit)
            .field("max_iterations", &self.max_iterations)
            .field("confidence_threshold", &self.confidence_threshold)
            .field("routing_table", &self.routing_table.is_some())
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl Settings {
    /// Reads the settings from the process environment.
    #[inline]
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Reads the settings through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SettingsError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| {
            var(name).ok_or(SettingsError::Missing(name))
        };

        let confidence_threshold: u8 = parse_or(
            &var,
            "SLEUTH_CONFIDENCE_THRESHOLD",
            DEFAULT_CONFIDENCE_THRESHOLD,
        )?;
        if confidence_threshold > 100 {
            return Err(SettingsError::Invalid {
                var: "SLEUTH_CONFIDENCE_THRESHOLD",
                value: confidence_threshold.to_string(),
            });
        }

        let routing_table = match var("SLEUTH_ROUTING_TABLE") {
            Some(path) => Some(load_routing_table(&path)?),
            None => None,
        };
        let deadline = match var("SLEUTH_DEADLINE_SECS") {
            Some(_) => {
                let secs: u64 = parse_or(&var, "SLEUTH_DEADLINE_SECS", 0)?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_base_url: var("OPENAI_BASE_URL"),
            openai_model: var("OPENAI_MODEL"),
            firecrawl_api_key: required("FIRECRAWL_API_KEY")?,
            firecrawl_base_url: var("FIRECRAWL_BASE_URL"),
            source_limit: parse_or(
                &var,
                "SLEUTH_SOURCE_LIMIT",
                DEFAULT_SOURCE_LIMIT,
            )?,
            max_iterations: parse_or(
                &var,
                "SLEUTH_MAX_ITERATIONS",
                DEFAULT_MAX_ITERATIONS,
            )?,
            confidence_threshold,
            routing_table,
            deadline,
        })
    }
}

fn parse_or<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, SettingsError> {
    match var(name) {
        Some(value) => {
            value.trim().parse().map_err(|_| SettingsError::Invalid {
                var: name,
                value,
            })
        }
        None => Ok(default),
    }
}

fn load_routing_table(path: &str) -> Result<RoutingTable, SettingsError> {
    let error = |reason: String| SettingsError::RoutingTable {
        path: path.to_owned(),
        reason,
    };
    let json = fs::read_to_string(path).map_err(|err| error(err.to_string()))?;
    RoutingTable::from_json(&json).map_err(|err| error(err.to_string()))
}
