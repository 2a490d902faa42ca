use std::path::PathBuf;

/// Default tracing filter when neither `RUST_LOG` nor `STAFFING_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "staffing_engine=info";

/// Runtime configuration read from the environment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// SQLite file to open. `None` means the platform data directory.
    pub database_path: Option<PathBuf>,
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// - `STAFFING_DATABASE_PATH`: path to the SQLite database
    /// - `STAFFING_LOG`: tracing filter directives
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let database_path = lookup("STAFFING_DATABASE_PATH")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let log_filter = lookup("STAFFING_LOG")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Self {
            database_path,
            log_filter,
        }
    }

    /// Filter directives: `RUST_LOG` first, then `STAFFING_LOG`, then the default.
    pub fn tracing_filter(&self) -> String {
        std::env::var("RUST_LOG")
            .ok()
            .or_else(|| self.log_filter.clone())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(Config::from_lookup(lookup(&[])), Config::default());
    }

    #[test]
    fn reads_database_path_and_log_filter() {
        let config = Config::from_lookup(lookup(&[
            ("STAFFING_DATABASE_PATH", "/var/lib/staffing/db.sqlite"),
            ("STAFFING_LOG", "staffing_engine=debug"),
        ]));

        assert_eq!(
            config.database_path,
            Some(PathBuf::from("/var/lib/staffing/db.sqlite"))
        );
        assert_eq!(config.log_filter.as_deref(), Some("staffing_engine=debug"));
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = Config::from_lookup(lookup(&[
            ("STAFFING_DATABASE_PATH", "  "),
            ("STAFFING_LOG", ""),
        ]));
        assert_eq!(config, Config::default());
    }
}
