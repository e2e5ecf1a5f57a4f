//! Command-line interface: argument parsing, logging setup, and config
//! assembly for the server binary.

use anyhow::{Context, Result};
use clap::{
    Arg, ArgAction, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use crate::auth::{AuthConfig, DEV_SIGNING_SECRET, Environment, parse_ttl};

pub const ARG_PORT: &str = "port";
pub const ARG_SIGNING_SECRET: &str = "signing-secret";
pub const ARG_SESSION_TTL: &str = "session-ttl";
pub const ARG_RESET_TTL: &str = "reset-ttl";
pub const ARG_ENVIRONMENT: &str = "environment";
pub const ARG_VERBOSITY: &str = "verbosity";

/// Everything the binary needs to start serving.
pub struct ServerArgs {
    pub port: u16,
    pub config: AuthConfig,
}

/// Map verbosity count to tracing level
const fn get_verbosity_level(verbosity: u8) -> Option<tracing::Level> {
    match verbosity {
        0 => None,
        1 => Some(tracing::Level::WARN),
        2 => Some(tracing::Level::INFO),
        3 => Some(tracing::Level::DEBUG),
        _ => Some(tracing::Level::TRACE),
    }
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("dossier-auth")
        .about("Authentication and session management for Dossier")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("DOSSIER_AUTH_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_SIGNING_SECRET)
                .long(ARG_SIGNING_SECRET)
                .help("Symmetric secret for session token signing")
                .long_help(
                    "Symmetric secret for session token signing. Required in production \
                     (at least 32 bytes); development falls back to a fixed local value.",
                )
                .env("DOSSIER_AUTH_SIGNING_SECRET"),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL)
                .long(ARG_SESSION_TTL)
                .help("Session token lifetime, e.g. 7d, 12h, 30m")
                .default_value("7d")
                .env("DOSSIER_AUTH_SESSION_TTL"),
        )
        .arg(
            Arg::new(ARG_RESET_TTL)
                .long(ARG_RESET_TTL)
                .help("Password-reset token lifetime, e.g. 1h")
                .default_value("1h")
                .env("DOSSIER_AUTH_RESET_TTL"),
        )
        .arg(
            Arg::new(ARG_ENVIRONMENT)
                .long(ARG_ENVIRONMENT)
                .help("Deployment environment: development or production")
                .default_value("development")
                .env("DOSSIER_AUTH_ENVIRONMENT"),
        )
        .arg(
            Arg::new(ARG_VERBOSITY)
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (-v warn, -vv info, -vvv debug)")
                .action(ArgAction::Count),
        )
}

fn init_tracing(level: Option<tracing::Level>) {
    let filter = level.map_or_else(
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        |level| EnvFilter::new(level.to_string()),
    );
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Parse arguments, initialize logging, and assemble the server config.
///
/// # Errors
///
/// Returns an error on invalid TTL or environment values.
pub fn start() -> Result<ServerArgs> {
    let matches = new().get_matches();

    let verbosity_level =
        get_verbosity_level(matches.get_count(ARG_VERBOSITY));
    init_tracing(verbosity_level);

    server_args(&matches)
}

fn server_args(matches: &clap::ArgMatches) -> Result<ServerArgs> {
    let port = matches
        .get_one::<u16>(ARG_PORT)
        .copied()
        .context("missing port")?;

    let environment: Environment = matches
        .get_one::<String>(ARG_ENVIRONMENT)
        .context("missing environment")?
        .parse()?;

    let secret = matches
        .get_one::<String>(ARG_SIGNING_SECRET)
        .cloned()
        .unwrap_or_else(|| DEV_SIGNING_SECRET.to_string());

    let session_ttl = parse_ttl(
        matches
            .get_one::<String>(ARG_SESSION_TTL)
            .context("missing session ttl")?,
    )?;
    let reset_ttl = parse_ttl(
        matches
            .get_one::<String>(ARG_RESET_TTL)
            .context("missing reset ttl")?,
    )?;

    let config = AuthConfig::new(SecretString::from(secret))
        .with_session_ttl_seconds(session_ttl)
        .with_reset_ttl_seconds(reset_ttl)
        .with_environment(environment);

    Ok(ServerArgs { port, config })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();
        assert_eq!(command.get_name(), "dossier-auth");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Authentication and session management for Dossier".to_string())
        );
    }

    #[test]
    fn defaults_produce_development_config() {
        // Guard against ambient DOSSIER_AUTH_* variables leaking in.
        temp_env::with_vars_unset(
            [
                "DOSSIER_AUTH_PORT",
                "DOSSIER_AUTH_SIGNING_SECRET",
                "DOSSIER_AUTH_SESSION_TTL",
                "DOSSIER_AUTH_RESET_TTL",
                "DOSSIER_AUTH_ENVIRONMENT",
            ],
            || {
                let matches = new().get_matches_from(vec!["dossier-auth"]);
                let args = server_args(&matches).expect("valid args");

                assert_eq!(args.port, 8080);
                assert_eq!(args.config.environment(), Environment::Development);
                assert_eq!(args.config.session_ttl_seconds(), 7 * 24 * 60 * 60);
                assert_eq!(args.config.reset_ttl_seconds(), 60 * 60);
            },
        );
    }

    #[test]
    fn flags_override_defaults() -> Result<()> {
        let matches = new().get_matches_from(vec![
            "dossier-auth",
            "--port",
            "9000",
            "--session-ttl",
            "12h",
            "--reset-ttl",
            "30m",
            "--environment",
            "production",
            "--signing-secret",
            "a-proper-signing-secret-32-bytes-ok",
        ]);
        let args = server_args(&matches)?;

        assert_eq!(args.port, 9000);
        assert_eq!(args.config.environment(), Environment::Production);
        assert_eq!(args.config.session_ttl_seconds(), 12 * 60 * 60);
        assert_eq!(args.config.reset_ttl_seconds(), 30 * 60);
        Ok(())
    }

    #[test]
    fn environment_variables_are_honored() {
        temp_env::with_var("DOSSIER_AUTH_PORT", Some("9999"), || {
            let matches = new().get_matches_from(vec!["dossier-auth"]);
            let args = server_args(&matches).expect("valid args");
            assert_eq!(args.port, 9999);
        });
    }

    #[test]
    fn invalid_ttl_is_rejected() {
        let matches =
            new().get_matches_from(vec!["dossier-auth", "--session-ttl", "soon"]);
        assert!(server_args(&matches).is_err());
    }

    #[test]
    fn verbosity_mapping() {
        assert_eq!(get_verbosity_level(0), None);
        assert_eq!(get_verbosity_level(1), Some(tracing::Level::WARN));
        assert_eq!(get_verbosity_level(2), Some(tracing::Level::INFO));
        assert_eq!(get_verbosity_level(3), Some(tracing::Level::DEBUG));
        assert_eq!(get_verbosity_level(9), Some(tracing::Level::TRACE));
    }
}
