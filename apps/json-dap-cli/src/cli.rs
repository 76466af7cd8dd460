//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;

/// Exercise a JSON data-access backend from the command line.
#[derive(Debug, Parser)]
#[command(name = "json-dap", version, about, long_about = None)]
pub struct Cli {
    /// Plugin configuration file (YAML). `JSON_DAP__*` variables override it.
    #[arg(short, long, env = "JSON_DAP_CONFIG", default_value = "json-dap.yaml")]
    pub config: PathBuf,

    /// Log output format. Logs go to stderr, filtered by `RUST_LOG`.
    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Look up the attributes of a subject.
    Attributes {
        subject: String,

        /// Known attribute used by parameter mappings, as `name=value`.
        /// JSON values are accepted, anything else is taken as a string.
        #[arg(long = "attr", value_parser = parse_attribute)]
        attributes: Vec<(String, Value)>,
    },

    /// Verify a password. Exits with status 1 when it is not confirmed.
    Verify {
        username: String,

        /// Read the password from this environment variable instead of stdin.
        #[arg(long)]
        password_env: Option<String>,
    },

    /// Store a new password. An empty password sends nothing.
    UpdatePassword {
        username: String,

        /// Read the new password from this environment variable instead of
        /// stdin.
        #[arg(long)]
        password_env: Option<String>,
    },

    /// Print whether the backend verifies passwords itself.
    VerifiesPassword,
}

fn parse_attribute(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    if name.is_empty() {
        return Err("attribute name must not be empty".to_owned());
    }
    let value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((name.to_owned(), value))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use clap::CommandFactory;
    use serde_json::json;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn attribute_values_prefer_json() {
        assert_eq!(parse_attribute("age=42").unwrap(), ("age".to_owned(), json!(42)));
        assert_eq!(
            parse_attribute("org=acme").unwrap(),
            ("org".to_owned(), json!("acme"))
        );
        assert_eq!(
            parse_attribute("tags=[\"a\"]").unwrap(),
            ("tags".to_owned(), json!(["a"]))
        );
        assert_eq!(
            parse_attribute("expr=a=b").unwrap(),
            ("expr".to_owned(), json!("a=b"))
        );
    }

    #[test]
    fn malformed_attributes_are_rejected() {
        assert!(parse_attribute("novalue").is_err());
        assert!(parse_attribute("=x").is_err());
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::try_parse_from([
            "json-dap",
            "--config",
            "dap.yaml",
            "attributes",
            "alice",
            "--attr",
            "org=acme",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("dap.yaml"));
        match cli.command {
            Command::Attributes {
                subject,
                attributes,
            } => {
                assert_eq!(subject, "alice");
                assert_eq!(attributes, vec![("org".to_owned(), json!("acme"))]);
            }
            other => panic!("Expected Attributes, got: {other:?}"),
        }
    }
}
