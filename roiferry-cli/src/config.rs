// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::Args;
use colored::Colorize;

use roiferry_core::config::{ServerConfig, TransferConfig};
use roiferry_core::error::RoiFerryError;
use roiferry_core::ut::track::Verbosity;
use roiferry_omero::get_roiferry_config;

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[arg(short = 'c', long, help = "Configuration file (defaults to ~/.roiferry/config.json).")]
    pub config: Option<String>,

    #[arg(long, help = "Source OMERO.web host.")]
    pub source_host: Option<String>,

    #[arg(long, help = "Source OMERO.web port.")]
    pub source_port: Option<u16>,

    #[arg(long, help = "Source username.")]
    pub source_user: Option<String>,

    #[arg(long, help = "Target OMERO.web host.")]
    pub target_host: Option<String>,

    #[arg(long, help = "Target OMERO.web port.")]
    pub target_port: Option<u16>,

    #[arg(long, help = "Target username.")]
    pub target_user: Option<String>,

    #[arg(long, help = "Connect over plain http instead of https.")]
    pub insecure: bool,

    #[arg(long, help = "Group to write ROIs into (-1 writes with the session defaults).")]
    pub target_group: Option<i64>,

    #[arg(long, help = "Id of the user new ROIs are owned by when --target-group is set.")]
    pub impersonate_user: Option<i64>,

    #[arg(long, help = "Stroke width in pixels for ROIs without a usable width.")]
    pub stroke_width: Option<f64>,

    #[arg(long, help = "Column holding source image ids.")]
    pub source_column: Option<String>,

    #[arg(long, help = "Column holding target image ids.")]
    pub target_column: Option<String>,

    #[arg(short = 'v', long, help = "Verbose output including every ROI.")]
    pub verbose: bool,

    #[arg(short = 'q', long, help = "Only print warnings and errors.")]
    pub quiet: bool,
}

/// Load the configuration file and apply command line overrides
pub fn resolve_config(args: &ConfigArgs) -> TransferConfig {
    let mut config = match &args.config {
        Some(path) => TransferConfig::open(path).unwrap_or_else(|err| {
            eprintln!("{}", err);
            std::process::exit(1);
        }),
        None => {
            let path: PathBuf = get_roiferry_config();
            if path.is_file() {
                TransferConfig::open(&path).unwrap_or_else(|err| {
                    eprintln!("{}", err);
                    std::process::exit(1);
                })
            } else {
                TransferConfig::default()
            }
        }
    };

    override_server(
        &mut config.source,
        &args.source_host,
        args.source_port,
        &args.source_user,
        args.insecure,
    );

    override_server(
        &mut config.target,
        &args.target_host,
        args.target_port,
        &args.target_user,
        args.insecure,
    );

    if let Some(group) = args.target_group {
        config.target_group = group;
    }

    if let Some(user) = args.impersonate_user {
        config.target_user = Some(user);
    }

    if let Some(width) = args.stroke_width {
        config.default_stroke_width = width;
    }

    if let Some(column) = &args.source_column {
        config.source_column = column.clone();
    }

    if let Some(column) = &args.target_column {
        config.target_column = column.clone();
    }

    if args.verbose {
        config.verbosity = Verbosity::Debug;
    } else if args.quiet {
        config.verbosity = Verbosity::Silent;
    }

    config.validate().unwrap_or_else(|err| {
        eprintln!("{}", err);
        std::process::exit(1);
    });

    config
}

fn override_server(
    server: &mut ServerConfig,
    host: &Option<String>,
    port: Option<u16>,
    user: &Option<String>,
    insecure: bool,
) {
    if let Some(host) = host {
        server.host = host.clone();
    }

    if let Some(port) = port {
        server.port = port;
    }

    if let Some(user) = user {
        server.username = Some(user.clone());
    }

    if insecure {
        server.secure = false;
    }
}

/// Fill in missing credentials from the environment or an interactive prompt
///
/// # Arguments
///
/// * `server` - Server configuration to complete
/// * `label` - Server label shown in the prompt (e.g. "1")
/// * `env_prefix` - Environment variable prefix (e.g. "ROIFERRY_SOURCE")
pub fn complete_credentials(server: &mut ServerConfig, label: &str, env_prefix: &str) {
    if server.username.is_none() {
        server.username = std::env::var(format!("{}_USERNAME", env_prefix))
            .ok()
            .filter(|username| !username.is_empty());
    }

    if server.password.is_none() {
        server.password = std::env::var(format!("{}_PASSWORD", env_prefix))
            .ok()
            .filter(|password| !password.is_empty());
    }

    if server.username.is_some() && server.password.is_some() {
        return;
    }

    println!(
        "Please provide credentials for OMERO server {} ({}):",
        label.bold(),
        server.host
    );

    if server.username.is_none() {
        server.username = Some(prompt("Username$"));
    }

    if server.password.is_none() {
        server.password = Some(prompt_hidden("Password$"));
    }
}

fn prompt(label: &str) -> String {
    print!("{} ", label);
    std::io::stdout().flush().unwrap_or_default();

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .unwrap_or_else(|_| {
            eprintln!("[roiferry::config] ERROR: Failed to read from stdin.");
            std::process::exit(1);
        });

    required(label, line.trim_end_matches(['\r', '\n'])).unwrap_or_else(|err| {
        eprintln!("{}", err);
        std::process::exit(1);
    })
}

// Input is read from the terminal without echo.
fn prompt_hidden(label: &str) -> String {
    let value = rpassword::prompt_password(format!("{} ", label)).unwrap_or_else(|_| {
        eprintln!("[roiferry::config] ERROR: Failed to read from the terminal.");
        std::process::exit(1);
    });

    required(label, &value).unwrap_or_else(|err| {
        eprintln!("{}", err);
        std::process::exit(1);
    })
}

fn required(label: &str, value: &str) -> Result<String, RoiFerryError> {
    if value.is_empty() {
        return Err(RoiFerryError::ConfigError(format!(
            "{} must not be empty.",
            label.trim_end_matches('$')
        )));
    }

    Ok(value.to_string())
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_required_rejects_empty() {
        assert!(matches!(
            required("Password$", ""),
            Err(RoiFerryError::ConfigError(_))
        ));
        assert_eq!(required("Password$", "s3cret").unwrap(), "s3cret");
    }

    #[test]
    fn test_complete_credentials_from_environment() {
        unsafe {
            std::env::set_var("ROIFERRY_TEST_CREDENTIALS_USERNAME", "alice");
            std::env::set_var("ROIFERRY_TEST_CREDENTIALS_PASSWORD", "s3cret");
        }

        let mut server = ServerConfig::default();
        complete_credentials(&mut server, "1", "ROIFERRY_TEST_CREDENTIALS");

        assert_eq!(server.username.as_deref(), Some("alice"));
        assert_eq!(server.password.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_complete_credentials_keeps_configured_values() {
        let mut server = ServerConfig {
            username: Some("bob".to_string()),
            password: Some("hunter2".to_string()),
            ..ServerConfig::default()
        };
        complete_credentials(&mut server, "2", "ROIFERRY_TEST_UNSET");

        assert_eq!(server.username.as_deref(), Some("bob"));
        assert_eq!(server.password.as_deref(), Some("hunter2"));
    }
}
