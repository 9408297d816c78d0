use crate::logging::LogFormat;
use clap::Parser;
use keepup_core::{KeepupError, SupervisorConfig};
use std::path::PathBuf;

/// Keep an application running by relaunching it whenever it is absent
#[derive(Debug, Parser)]
#[command(name = "keepup", version, about)]
pub struct Cli {
    /// Identifier of the application to keep running
    #[arg(env = "KEEPUP_IDENTIFIER")]
    pub identifier: Option<String>,

    /// Delay between two liveness checks, in milliseconds
    #[arg(long, env = "KEEPUP_INTERVAL_MS")]
    pub interval_ms: Option<u64>,

    /// Directory searched when resolving the identifier (repeatable)
    #[arg(long = "search-path", value_name = "DIR")]
    pub search_paths: Vec<PathBuf>,

    /// JSON configuration file; command-line values take precedence
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

impl Cli {
    /// Merge the configuration file (if any) with command-line overrides
    pub fn supervisor_config(&self) -> Result<SupervisorConfig, KeepupError> {
        let mut config = match &self.config {
            Some(path) => SupervisorConfig::from_json_file(path)?,
            None => SupervisorConfig::default(),
        };

        if let Some(identifier) = &self.identifier {
            config.identifier = identifier.clone();
        }
        if let Some(interval_ms) = self.interval_ms {
            config.poll_interval_ms = interval_ms;
        }
        if !self.search_paths.is_empty() {
            config.search_paths = self.search_paths.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepup_core::{DEFAULT_IDENTIFIER, DEFAULT_POLL_INTERVAL_MS};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("keepup").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["--interval-ms", "1000"]);
        assert_eq!(cli.log_format, LogFormat::Text);
        assert!(cli.config.is_none());

        let config = cli.supervisor_config().unwrap();
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert!(config.search_paths.is_empty());
    }

    #[test]
    fn test_overrides() {
        let cli = parse(&[
            "com.example.App",
            "--interval-ms",
            "250",
            "--search-path",
            "/opt/bin",
            "--search-path",
            "/usr/local/bin",
            "--log-format",
            "json",
        ]);
        assert_eq!(cli.log_format, LogFormat::Json);

        let config = cli.supervisor_config().unwrap();
        assert_eq!(config.identifier, "com.example.App");
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(
            config.search_paths,
            vec![PathBuf::from("/opt/bin"), PathBuf::from("/usr/local/bin")]
        );
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let cli = parse(&["com.example.App", "--interval-ms", "0"]);
        assert!(matches!(
            cli.supervisor_config(),
            Err(KeepupError::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let cli = parse(&["--config", "/definitely/not/here/keepup.json"]);
        assert!(matches!(cli.supervisor_config(), Err(KeepupError::Io(_))));
    }

    #[test]
    fn test_default_identifier_without_arguments() {
        let cli = Cli {
            identifier: None,
            interval_ms: None,
            search_paths: Vec::new(),
            config: None,
            log_format: LogFormat::Text,
        };
        let config = cli.supervisor_config().unwrap();
        assert_eq!(config.identifier, DEFAULT_IDENTIFIER);
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }
}
