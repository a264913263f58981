//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::{AppError, Result},
    models::Config,
    types::OutputMode,
};

/// Layers defaults, `.env`, environment and CLI flags into one [`Config`]
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        self.cli.validate().map_err(AppError::validation)?;

        EnvManager::load_env_file(self.cli.verbose)?;

        let mut config = Config::default();
        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);
        config.validate()?;

        Ok(config)
    }

    /// Flags override lower layers only when they were passed
    fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        if let Some(repetitions) = cli.repetitions {
            config.repetitions = repetitions;
        }
        if let Some(concurrency) = cli.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(timeout) = cli.timeout {
            config.timeout = timeout;
        }
        if let Some(url) = &cli.endpoints_url {
            config.endpoints_url = Some(url.clone());
        }
        if let Some(region) = &cli.region {
            config.region = Some(region.clone());
        }

        config.output_mode = if cli.top {
            OutputMode::Top
        } else if cli.csv {
            OutputMode::Csv
        } else if cli.csv_cum {
            OutputMode::CsvCumulative
        } else {
            OutputMode::Table
        };

        // CSV output must stay machine readable
        config.verbose = cli.verbose && !config.output_mode.is_machine_readable();
        config.enable_color = config.enable_color && cli.use_colors();
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// One line per setting, for verbose startup output
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Repetitions: {}", config.repetitions));
    summary.push(format!("Concurrency: {}", config.concurrency));
    if config.timeout.is_zero() {
        summary.push("Timeout: none".to_string());
    } else {
        summary.push(format!("Timeout: {:?}", config.timeout));
    }
    summary.push(format!("Output: {}", config.effective_output_mode().name()));
    if let Some(region) = &config.region {
        summary.push(format!("Region: {}", region));
    }
    summary.push(format!(
        "Directory: {}",
        config.endpoints_url.as_deref().unwrap_or("builtin")
    ));

    summary.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::test_support::{clear_cli_vars, ENV_LOCK};
    use clap::Parser;
    use std::time::Duration;

    fn parse(args: &[&str]) -> Result<Config> {
        let mut argv = vec!["regionping"];
        argv.extend_from_slice(args);
        ConfigParser::new(Cli::parse_from(argv)).parse()
    }

    #[test]
    fn test_defaults_without_flags() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_cli_vars();

        let config = parse(&[]).unwrap();
        assert_eq!(config.repetitions, crate::defaults::DEFAULT_REPETITIONS);
        assert_eq!(config.concurrency, crate::defaults::DEFAULT_CONCURRENCY);
        assert_eq!(config.timeout, Duration::ZERO);
        assert_eq!(config.output_mode, OutputMode::Table);
        assert!(config.endpoints_url.is_none());
    }

    #[test]
    fn test_cli_overrides_env() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_cli_vars();
        std::env::set_var("PROBE_COUNT", "3");
        std::env::set_var("PROBE_CONCURRENCY", "5");

        let config = parse(&["-n", "7"]).unwrap();
        assert_eq!(config.repetitions, 7);
        assert_eq!(config.concurrency, 5);

        clear_cli_vars();
    }

    #[test]
    fn test_unpassed_flags_keep_env_values() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_cli_vars();
        std::env::set_var("PROBE_TIMEOUT", "250ms");

        let config = parse(&["-c", "2"]).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.concurrency, 2);

        clear_cli_vars();
    }

    #[test]
    fn test_output_mode_flags() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_cli_vars();

        assert_eq!(parse(&["--top"]).unwrap().output_mode, OutputMode::Top);
        assert_eq!(parse(&["--csv"]).unwrap().output_mode, OutputMode::Csv);
        assert_eq!(parse(&["--csv-cum"]).unwrap().output_mode, OutputMode::CsvCumulative);

        let single = parse(&["-r", "us-east1"]).unwrap();
        assert_eq!(single.effective_output_mode(), OutputMode::Single);
    }

    #[test]
    fn test_csv_disables_verbose() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_cli_vars();

        assert!(parse(&["-v"]).unwrap().verbose);
        assert!(!parse(&["-v", "--csv"]).unwrap().verbose);
        assert!(!parse(&["-v", "--csv-cum"]).unwrap().verbose);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_cli_vars();

        assert!(matches!(parse(&["-c", "0"]), Err(AppError::Validation(_))));
        assert!(parse(&["--endpoints-url", "ftp://example.com"]).is_err());

        std::env::set_var("PROBE_CONCURRENCY", "0");
        assert!(matches!(parse(&[]), Err(AppError::Config(_))));
        clear_cli_vars();
    }

    #[test]
    fn test_no_color_flag() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_cli_vars();
        assert!(!parse(&["--no-color"]).unwrap().enable_color);
    }

    #[test]
    fn test_config_summary() {
        let mut config = Config::default();
        config.region = Some("asia-east1".to_string());
        config.timeout = Duration::from_millis(500);

        let summary = display_config_summary(&config);
        assert!(summary.contains("Repetitions: 10"));
        assert!(summary.contains("Timeout: 500ms"));
        assert!(summary.contains("Output: single"));
        assert!(summary.contains("Region: asia-east1"));
        assert!(summary.contains("Directory: builtin"));
    }
}
