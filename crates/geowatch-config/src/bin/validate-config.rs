//! Config validation CLI tool
//!
//! Validates a geowatch configuration file and reports any errors.

use geowatch_config::{ConfigError, NotifierSettings};
use geowatch_util::{default_config_path, format_duration};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a geowatch configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            eprintln!("  validate-config config.example.toml");
            return ExitCode::from(2);
        }
    };

    // Check file exists
    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    // The base URL may legitimately come from the environment at runtime
    let overrides = geowatch_config::ConfigOverrides {
        base_url: std::env::var("API_BASE_URL").ok(),
        ..Default::default()
    };

    match geowatch_config::load_config_with(&config_path, &overrides) {
        Ok(config) => {
            let monitor = &config.monitor;
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", geowatch_config::CURRENT_CONFIG_VERSION);
            println!("  Entities: {}", monitor.entities.len());
            println!("  Poll interval: {}", format_duration(monitor.poll_interval));
            match monitor.run_duration {
                Some(d) => println!("  Run duration: {}", format_duration(d)),
                None => println!("  Run duration: until stopped"),
            }
            println!("  Follow-up after: {}", format_duration(monitor.debounce));
            println!("  Position source: {}", config.source.base_url);
            match &config.notifier {
                NotifierSettings::Log => println!("  Notifier: log"),
                NotifierSettings::Smtp(smtp) => {
                    println!("  Notifier: smtp ({}:{} -> {})", smtp.host, smtp.port, smtp.recipient)
                }
            }

            println!();
            println!("Entities:");
            for entity in &monitor.entities {
                println!("  - {}", entity);
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        geowatch_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
