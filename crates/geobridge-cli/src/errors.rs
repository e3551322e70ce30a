use console::style;
use geobridge_core::config::ENV_PORTAL_TOKEN;
use geobridge_core::BridgeError;
use std::fmt;
use std::path::Path;

/// Enhanced error type with suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), context: None, suggestions: Vec::new(), help_command: None }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Create error for a geometry argument that is neither GeoJSON nor a readable file
pub fn invalid_geometry(input: &str, reason: &str) -> CliError {
    let shown: String = input.chars().take(80).collect();
    CliError::new("Invalid query geometry")
        .with_context(format!(
            "Could not read a GeoJSON geometry.\n\nInput: {}\nReason: {}",
            shown, reason
        ))
        .with_suggestion(
            r#"Pass a geometry inline: --geometry '{"type":"Point","coordinates":[115.2,-8.6]}'"#,
        )
        .with_suggestion("Or pass a path to a GeoJSON Geometry or Feature file")
        .with_help("Run: geobridge analyze --help")
}

/// Create error for an unreadable scenario feature file
pub fn features_unreadable(path: &Path, reason: &str) -> CliError {
    CliError::new("Cannot read scenario features")
        .with_context(format!(
            "The features file must be a GeoJSON FeatureCollection.\n\nPath: {}\nReason: {}",
            path.display(),
            reason
        ))
        .with_suggestion("Check the file path and try again")
        .with_suggestion("Export the scenario layer as GeoJSON")
        .with_help("Run: geobridge migrate --help")
}

/// Create error for an invalid configuration value
pub fn invalid_config(key: &str, reason: &str) -> CliError {
    CliError::new(format!("Invalid configuration: {}", key))
        .with_context(format!("Configuration value is invalid.\n\nReason: {}", reason))
        .with_suggestion("Check geobridge.toml for syntax errors")
        .with_suggestion("Or unset the matching GEOBRIDGE_* environment variable")
        .with_help("Run: geobridge config")
}

fn from_bridge(error: &BridgeError) -> CliError {
    let message = error.to_string();
    match error {
        BridgeError::Authentication { .. } => CliError::new(message)
            .with_suggestion(format!("Set a portal token: export {}=<token>", ENV_PORTAL_TOKEN))
            .with_suggestion("Or run from a terminal to sign in interactively")
            .with_help("Run: geobridge layers --help"),
        BridgeError::Authorization { status, .. } => CliError::new(message)
            .with_context(format!(
                "The remote service rejected the credentials (status {}).",
                status
            ))
            .with_suggestion("Check that the token is current and belongs to this service"),
        BridgeError::ResourceAccess { status, .. } => CliError::new(message)
            .with_context(format!(
                "The remote service could not find the item (status {}).",
                status
            ))
            .with_suggestion("Check the id and that your account can see it"),
        BridgeError::Transport(_) => CliError::new(message)
            .with_suggestion("Check the URL and your network connection")
            .with_help("Run: geobridge config"),
        BridgeError::ConfigInvalid { key, reason } => invalid_config(key, reason),
        _ => CliError::new(message),
    }
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    let error = match error.downcast::<CliError>() {
        Ok(cli_error) => return cli_error,
        Err(error) => error,
    };

    if let Some(bridge) = error.chain().find_map(|e| e.downcast_ref::<BridgeError>()) {
        let mut cli_error = from_bridge(bridge);
        if cli_error.context.is_none() && error.to_string() != bridge.to_string() {
            cli_error = cli_error.with_context(error.to_string());
        }
        return cli_error;
    }

    let message = format!("{:#}", error);
    if message.contains("No such file or directory") {
        CliError::new("File not found")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check the file path and try again")
    } else {
        CliError::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_error_survives_anyhow() {
        let error: anyhow::Error = invalid_geometry("{", "EOF").into();
        let cli_error = from_anyhow(error);
        assert_eq!(cli_error.message, "Invalid query geometry");
        assert_eq!(cli_error.suggestions.len(), 2);
    }

    #[test]
    fn test_bridge_errors_get_remediation() {
        let error = anyhow::Error::new(BridgeError::Authentication {
            reason: "no stored credential".to_string(),
        })
        .context("Failed to sign in");

        let cli_error = from_anyhow(error);
        assert_eq!(cli_error.message, "Sign-in failed: no stored credential");
        assert_eq!(cli_error.context.as_deref(), Some("Failed to sign in"));
        assert!(cli_error.suggestions[0].contains(ENV_PORTAL_TOKEN));
    }

    #[test]
    fn test_plain_errors_keep_their_message() {
        let cli_error = from_anyhow(anyhow::anyhow!("something odd"));
        assert_eq!(cli_error.message, "something odd");
        assert!(cli_error.suggestions.is_empty());
    }
}
