//! Error presentation with context and suggestions

use console::style;
use mapquery_core::error::MapQueryError;
use std::fmt;

/// CLI error with context and suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), context: None, suggestions: Vec::new() }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(context) = &self.context {
            eprintln!("\n{}", context);
        }

        if !self.suggestions.is_empty() {
            eprintln!("\n{}", style("Try:").bold());
            for suggestion in &self.suggestions {
                eprintln!("  {} {}", style("•").dim(), suggestion);
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "status": "error",
            "message": self.message,
            "context": self.context,
            "suggestions": self.suggestions,
        })
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Backend could not be reached or timed out
pub fn backend_unreachable(reason: &str) -> CliError {
    CliError::new("Cannot reach the feature backend")
        .with_context(reason.to_string())
        .with_suggestion("Check the URL: mapquery config")
        .with_suggestion("Override it: --backend-url http://host:5000 or MAPQUERY_BACKEND_URL")
        .with_suggestion("Raise the timeout: --timeout 60")
}

/// Backend answered with an error status
pub fn backend_failed(status: u16, message: &str) -> CliError {
    CliError::new(format!("Backend returned HTTP {}", status)).with_context(message.to_string())
}

/// The query polygon was rejected before any request was sent
pub fn invalid_polygon(reason: &str) -> CliError {
    CliError::new("Invalid query polygon")
        .with_context(reason.to_string())
        .with_suggestion("Give at least 3 distinct vertices: --ring \"0 0, 1 0, 1 1\"")
        .with_suggestion("Or pass a polygon: --wkt \"POLYGON((0 0,1 0,1 1,0 0))\"")
}

/// Configuration file or value could not be used
pub fn invalid_config(key: &str, reason: &str) -> CliError {
    CliError::new(format!("Invalid configuration: {}", key))
        .with_context(reason.to_string())
        .with_suggestion("Check mapquery.toml or the file given with --config")
        .with_suggestion("Inspect resolved values: mapquery config")
}

/// Map an error chain onto the most helpful CLI error
pub fn from_anyhow(error: &anyhow::Error) -> CliError {
    let domain = error.chain().find_map(|cause| cause.downcast_ref::<MapQueryError>());

    match domain {
        Some(MapQueryError::BackendUnavailable { reason }) => backend_unreachable(reason),
        Some(MapQueryError::Http { status, message }) => backend_failed(*status, message),
        Some(MapQueryError::ConfigInvalid { key, reason }) => invalid_config(key, reason),
        Some(e) if e.is_local_validation() => invalid_polygon(&e.to_string()),
        _ => {
            let mut cli_error = CliError::new(error.to_string());
            if let Some(source) = error.chain().nth(1) {
                cli_error = cli_error.with_context(source.to_string());
            }
            cli_error
        }
    }
}

/// Print a failed command's error in the selected output format
pub fn report(error: &anyhow::Error, json: bool) {
    let cli_error = from_anyhow(error);
    if json {
        eprintln!("{}", serde_json::to_string_pretty(&cli_error.to_json()).unwrap_or_default());
    } else {
        cli_error.display();
    }
}
