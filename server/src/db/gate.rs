//! Startup migration decision.

use crate::config::{EnvSource, APP_ENV};
use std::fmt;

pub const AUTO_MIGRATE: &str = "AUTO_MIGRATE";

/// Operator override for startup migration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AutoMigrate {
    #[default]
    Unset,
    Enabled,
    Disabled,
}

impl AutoMigrate {
    /// Only the exact strings `true` and `false` count; anything else is
    /// treated as unset.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("true") => Self::Enabled,
            Some("false") => Self::Disabled,
            _ => Self::Unset,
        }
    }
}

/// Raw flags the decision is made from.
///
/// `app_env` is the unresolved `APP_ENV` value, so an empty value does not
/// count as development here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationFlags {
    pub auto_migrate: AutoMigrate,
    pub app_env: String,
}

impl MigrationFlags {
    pub fn from_env<E: EnvSource + ?Sized>(env: &E) -> Self {
        let raw = env.get(AUTO_MIGRATE);
        let auto_migrate = AutoMigrate::parse(raw.as_deref());

        if let Some(value) = raw.as_deref() {
            if auto_migrate == AutoMigrate::Unset && !value.is_empty() {
                tracing::warn!(
                    "Ignoring unrecognized {}={:?}; expected \"true\" or \"false\"",
                    AUTO_MIGRATE,
                    value
                );
            }
        }

        Self {
            auto_migrate,
            app_env: env.get(APP_ENV).unwrap_or_default(),
        }
    }
}

/// Why startup migration was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `AUTO_MIGRATE=false`
    ExplicitlyDisabled,
    /// Production without `AUTO_MIGRATE=true`
    ProductionWithoutOverride,
    /// Neither the flag nor development mode asked for it
    NotRequested,
}

impl SkipReason {
    pub fn message(&self) -> &'static str {
        match self {
            Self::ExplicitlyDisabled => "Skipping database migration (AUTO_MIGRATE=false)",
            Self::ProductionWithoutOverride => {
                "Skipping database migration (production environment, set AUTO_MIGRATE=true to enable)"
            }
            Self::NotRequested => "Skipping database migration (set AUTO_MIGRATE=true to enable)",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationDecision {
    Run,
    Skip(SkipReason),
}

impl MigrationDecision {
    pub fn is_run(&self) -> bool {
        matches!(self, Self::Run)
    }
}

/// Decide whether to migrate at startup. The first matching rule wins:
/// an explicit flag, then development mode, then skip.
pub fn decide(flags: &MigrationFlags) -> MigrationDecision {
    match flags.auto_migrate {
        AutoMigrate::Disabled => MigrationDecision::Skip(SkipReason::ExplicitlyDisabled),
        AutoMigrate::Enabled => MigrationDecision::Run,
        AutoMigrate::Unset if flags.app_env == "development" => MigrationDecision::Run,
        AutoMigrate::Unset if flags.app_env == "production" => {
            MigrationDecision::Skip(SkipReason::ProductionWithoutOverride)
        }
        AutoMigrate::Unset => MigrationDecision::Skip(SkipReason::NotRequested),
    }
}

pub fn should_migrate(flags: &MigrationFlags) -> bool {
    decide(flags).is_run()
}
