//! Runtime configuration read from `TASKBOARD_*` environment variables.

use crate::task::domain::PlanImportSettings;
use serde::Deserialize;
use thiserror::Error;

/// Default connection pool size.
pub const DEFAULT_POOL_SIZE: u32 = 4;

/// Accepted range for `TASKBOARD_PLAN_DURATION_DAYS`, roughly ten years.
pub const PLAN_DURATION_DAYS: std::ops::RangeInclusive<i64> = 1..=3650;

/// Default tracing filter directive.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Errors raised while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Neither `TASKBOARD_DATABASE_URL` nor `DATABASE_URL` is set.
    #[error("TASKBOARD_DATABASE_URL or DATABASE_URL must be set")]
    MissingDatabaseUrl,

    /// A numeric variable did not parse.
    #[error("{variable} must be a number, got {value:?}")]
    InvalidNumber {
        /// Variable name.
        variable: &'static str,
        /// Raw value.
        value: String,
    },

    /// The pool must hold at least one connection.
    #[error("TASKBOARD_POOL_SIZE must be at least 1")]
    EmptyPool,

    /// The planned project length is outside [`PLAN_DURATION_DAYS`].
    #[error("TASKBOARD_PLAN_DURATION_DAYS must be between 1 and 3650, got {0}")]
    DurationOutOfRange(i64),
}

/// Settings for the binary and the `PostgreSQL` adapter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaskboardConfig {
    /// `PostgreSQL` connection URL.
    pub database_url: String,
    /// Maximum pooled connections.
    pub pool_size: u32,
    /// `tracing` filter directive.
    pub log_filter: String,
    /// Prefix of plan project names.
    pub plan_project_prefix: String,
    /// Name of the organization created for imports when none exists.
    pub default_organization_name: String,
    /// Slug of that organization.
    pub default_organization_slug: String,
    /// Planned length of imported projects.
    pub plan_duration_days: i64,
}

impl Default for TaskboardConfig {
    fn default() -> Self {
        let plan = PlanImportSettings::default();
        Self {
            database_url: String::new(),
            pool_size: DEFAULT_POOL_SIZE,
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            plan_project_prefix: plan.project_prefix,
            default_organization_name: plan.default_organization_name,
            default_organization_slug: plan.default_organization_slug,
            plan_duration_days: plan.project_duration_days,
        }
    }
}

impl TaskboardConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the database URL is missing or a number
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the database URL is missing, a number
    /// does not parse or falls outside its range.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let database_url = lookup("TASKBOARD_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingDatabaseUrl)?;
        let pool_size =
            parse_number(&lookup, "TASKBOARD_POOL_SIZE")?.unwrap_or(defaults.pool_size);
        if pool_size == 0 {
            return Err(ConfigError::EmptyPool);
        }
        let plan_duration_days = parse_number(&lookup, "TASKBOARD_PLAN_DURATION_DAYS")?
            .unwrap_or(defaults.plan_duration_days);
        if !PLAN_DURATION_DAYS.contains(&plan_duration_days) {
            return Err(ConfigError::DurationOutOfRange(plan_duration_days));
        }
        Ok(Self {
            database_url,
            pool_size,
            log_filter: lookup("TASKBOARD_LOG").unwrap_or(defaults.log_filter),
            plan_project_prefix: lookup("TASKBOARD_PLAN_PROJECT_PREFIX")
                .unwrap_or(defaults.plan_project_prefix),
            default_organization_name: lookup("TASKBOARD_DEFAULT_ORG_NAME")
                .unwrap_or(defaults.default_organization_name),
            default_organization_slug: lookup("TASKBOARD_DEFAULT_ORG_SLUG")
                .unwrap_or(defaults.default_organization_slug),
            plan_duration_days,
        })
    }

    /// Plan import settings carried by this configuration.
    #[must_use]
    pub fn plan_settings(&self) -> PlanImportSettings {
        PlanImportSettings {
            project_prefix: self.plan_project_prefix.clone(),
            default_organization_name: self.default_organization_name.clone(),
            default_organization_slug: self.default_organization_slug.clone(),
            project_duration_days: self.plan_duration_days,
        }
    }
}

fn parse_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    variable: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(variable)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidNumber {
                    variable,
                    value: raw.clone(),
                })
        })
        .transpose()
}

#[cfg(test)]
#[expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[rstest]
    fn defaults_apply_when_only_the_url_is_set() {
        let config = TaskboardConfig::from_lookup(lookup_from(&[(
            "DATABASE_URL",
            "postgres://localhost/taskboard",
        )]))
        .expect("config should load");

        assert_eq!(config.database_url, "postgres://localhost/taskboard");
        assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
        assert_eq!(config.plan_settings(), PlanImportSettings::default());
    }

    #[rstest]
    fn taskboard_url_wins_over_database_url() {
        let config = TaskboardConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://fallback"),
            ("TASKBOARD_DATABASE_URL", "postgres://primary"),
            ("TASKBOARD_PLAN_DURATION_DAYS", "14"),
            ("TASKBOARD_PLAN_PROJECT_PREFIX", "Imported"),
        ]))
        .expect("config should load");

        assert_eq!(config.database_url, "postgres://primary");
        assert_eq!(config.plan_settings().project_duration_days, 14);
        assert_eq!(config.plan_settings().project_prefix, "Imported");
    }

    #[rstest]
    fn missing_url_is_rejected() {
        let result = TaskboardConfig::from_lookup(lookup_from(&[]));
        assert_eq!(result, Err(ConfigError::MissingDatabaseUrl));
    }

    #[rstest]
    #[case("TASKBOARD_POOL_SIZE", "many")]
    #[case("TASKBOARD_PLAN_DURATION_DAYS", "1.5")]
    fn malformed_numbers_are_typed_errors(#[case] variable: &'static str, #[case] raw: &str) {
        let result = TaskboardConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost"),
            (variable, raw),
        ]));
        assert_eq!(
            result,
            Err(ConfigError::InvalidNumber {
                variable,
                value: raw.to_owned(),
            })
        );
    }

    #[rstest]
    fn zero_pool_is_rejected() {
        let result = TaskboardConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost"),
            ("TASKBOARD_POOL_SIZE", "0"),
        ]));
        assert_eq!(result, Err(ConfigError::EmptyPool));
    }

    #[rstest]
    #[case("0", 0)]
    #[case("-7", -7)]
    #[case("1000000000", 1_000_000_000)]
    fn durations_outside_the_range_are_rejected(#[case] raw: &str, #[case] days: i64) {
        let result = TaskboardConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost"),
            ("TASKBOARD_PLAN_DURATION_DAYS", raw),
        ]));
        assert_eq!(result, Err(ConfigError::DurationOutOfRange(days)));
    }

    #[rstest]
    #[case("1", 1)]
    #[case("3650", 3650)]
    fn durations_at_the_bounds_load(#[case] raw: &str, #[case] days: i64) {
        let config = TaskboardConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost"),
            ("TASKBOARD_PLAN_DURATION_DAYS", raw),
        ]))
        .expect("config should load");
        assert_eq!(config.plan_duration_days, days);
    }
}
