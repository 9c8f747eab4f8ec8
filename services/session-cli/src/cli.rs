//! Command-line interface

use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, Subcommand};
use serde_json::Value;
use session_client::RequestOptions;
use session_store::TokenRecord;
use transport::Method;

#[derive(Parser, Debug)]
#[command(name = "session-cli")]
#[command(about = "Authenticated API calls with automatic token refresh")]
#[command(version)]
pub struct Cli {
    /// Configuration file (falls back to CONFIG_PATH, then session-cli.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Print a Prometheus snapshot to stderr before exiting
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Send one request, refreshing the session if the server asks for it
    Call {
        /// GET, POST, PUT, PATCH or DELETE (any case)
        #[arg(value_parser = parse_method)]
        method: Method,

        /// Path relative to the API base URL
        endpoint: String,

        /// JSON request body
        #[arg(long, value_parser = parse_body)]
        body: Option<Value>,

        /// Send without the access token
        #[arg(long)]
        without_auth: bool,
    },

    /// Exchange the stored refresh token for a new session
    Refresh,

    /// Clear the stored session
    Logout,

    /// Print whether a session is stored and when it expires
    Show,

    /// Store a token record obtained elsewhere
    SetToken {
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        token: String,

        #[arg(value_parser = NonEmptyStringValueParser::new())]
        refresh_token: String,

        /// Expiry in milliseconds since the Unix epoch
        expire_at: u64,
    },
}

/// What a parsed invocation asks the client to do.
#[derive(Debug)]
pub enum Command {
    Call(RequestOptions),
    Refresh,
    Logout,
    Show,
    SetToken(TokenRecord),
}

impl From<CliCommand> for Command {
    fn from(command: CliCommand) -> Self {
        match command {
            CliCommand::Call {
                method,
                endpoint,
                body,
                without_auth,
            } => {
                let mut options = RequestOptions::new(method, endpoint);
                if let Some(body) = body {
                    options = options.with_body(body);
                }
                if without_auth {
                    options = options.without_auth();
                }
                Command::Call(options)
            }
            CliCommand::Refresh => Command::Refresh,
            CliCommand::Logout => Command::Logout,
            CliCommand::Show => Command::Show,
            CliCommand::SetToken {
                token,
                refresh_token,
                expire_at,
            } => Command::SetToken(TokenRecord::new(token, refresh_token, expire_at)),
        }
    }
}

fn parse_method(name: &str) -> Result<Method, String> {
    Method::parse(name).ok_or_else(|| format!("unsupported method: {name}"))
}

fn parse_body(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON body: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("session-cli").chain(args.iter().copied()))
    }

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn call_with_body_and_flags() {
        let cli = parse(&[
            "--config",
            "/etc/app.toml",
            "call",
            "post",
            "/orders",
            "--body",
            r#"{"qty":1}"#,
            "--without-auth",
        ])
        .unwrap();

        assert_eq!(cli.config.as_deref(), Some("/etc/app.toml"));
        assert!(!cli.metrics);
        match Command::from(cli.command) {
            Command::Call(options) => {
                assert_eq!(options.method, Method::Post);
                assert_eq!(options.endpoint, "/orders");
                assert_eq!(options.body, Some(json!({"qty": 1})));
                assert!(options.without_auth);
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn call_without_flags_keeps_defaults() {
        let cli = parse(&["call", "GET", "/orders"]).unwrap();
        match Command::from(cli.command) {
            Command::Call(options) => {
                assert_eq!(options.method, Method::Get);
                assert!(options.body.is_none());
                assert!(!options.without_auth);
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn global_flags_may_follow_the_command() {
        let cli = parse(&["show", "--metrics", "--config", "app.toml"]).unwrap();
        assert!(cli.metrics);
        assert_eq!(cli.config.as_deref(), Some("app.toml"));
        assert!(matches!(Command::from(cli.command), Command::Show));
    }

    #[test]
    fn simple_commands() {
        let command = |args: &[&str]| Command::from(parse(args).unwrap().command);
        assert!(matches!(command(&["refresh"]), Command::Refresh));
        assert!(matches!(command(&["logout"]), Command::Logout));
        assert!(parse(&["logout", "now"]).is_err());
    }

    #[test]
    fn set_token_builds_record() {
        let cli = parse(&["set-token", "at", "rt", "1700000000000"]).unwrap();
        match Command::from(cli.command) {
            Command::SetToken(record) => {
                assert_eq!(record.token, "at");
                assert_eq!(record.refresh_token, "rt");
                assert_eq!(record.expire_at, 1_700_000_000_000);
            }
            other => panic!("expected set-token, got {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["frobnicate"]).is_err());
        assert!(parse(&["call", "GET"]).is_err());
        assert!(parse(&["call", "TRACE", "/x"]).is_err());
        assert!(parse(&["call", "POST", "/x", "--body", "{nope"]).is_err());
        assert!(parse(&["call", "POST", "/x", "--body"]).is_err());
        assert!(parse(&["set-token", "at", "rt", "soon"]).is_err());
        assert!(parse(&["set-token", "", "rt", "1"]).is_err());
        assert!(parse(&["set-token", "at", "", "1"]).is_err());
        assert!(parse(&["--config"]).is_err());
    }
}
