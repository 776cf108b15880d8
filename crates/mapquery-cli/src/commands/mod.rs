//! Command implementations

mod config;
mod features;
mod layers;
mod query;
mod wms_url;

use anyhow::{Context, Result};
use mapquery_client::{HttpBackend, SessionSnapshot, SpatialQueryOrchestrator};
use mapquery_core::config::ClientConfig;
use mapquery_core::models::{PageItem, PaginationDescriptor};

use crate::cli::{Cli, Commands};
use crate::config_loader::load_config_with_overrides;
use crate::map::TerminalMap;
use crate::output::OutputWriter;
use crate::output_types::{FeatureRow, TabRow};

/// Orchestrator wired to the HTTP backend and a terminal map
pub type Session = SpatialQueryOrchestrator<HttpBackend, TerminalMap>;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let layered = load_config_with_overrides(&cli)?;

    match cli.command {
        Commands::Layers => layers::execute(&layered.resolve(), &output).await,
        Commands::Query(args) => query::execute(args, &layered.resolve(), &output).await,
        Commands::Features(args) => features::execute(args, &layered.resolve(), &output).await,
        Commands::WmsUrl(args) => wms_url::execute(args, &layered.resolve(), &output),
        Commands::Config => config::execute(&layered, &output),
    }
}

fn open_session(config: &ClientConfig) -> Result<Session> {
    let backend = HttpBackend::new(config).context("Failed to create HTTP client")?;
    Ok(SpatialQueryOrchestrator::new(backend, TerminalMap::default(), config.clone()))
}

/// Human rendering of the result tabs and the displayed page
fn print_results(snapshot: &SessionSnapshot, output: &OutputWriter) {
    if !snapshot.tabs.is_empty() {
        output.section("Layers");
        let rows = snapshot
            .tabs
            .iter()
            .map(|tab| TabRow {
                marker: if snapshot.active_tab.as_ref() == Some(&tab.layer_id) {
                    "▶".to_string()
                } else {
                    String::new()
                },
                layer: tab.layer_name.clone(),
                count: match &tab.error {
                    Some(error) => format!("error: {}", error),
                    None => tab.count.to_string(),
                },
            })
            .collect();
        output.table::<TabRow>(rows);
    }

    if snapshot.active_tab.is_none() {
        return;
    }

    output.section("Features");
    let rows = snapshot
        .features
        .iter()
        .map(|feature| {
            let selected = feature.key().is_some_and(|id| snapshot.selection.contains(&id));
            FeatureRow::new(feature, selected)
        })
        .collect();
    output.table::<FeatureRow>(rows);
    print_pagination(&snapshot.pagination, &snapshot.pages, output);
}

fn print_pagination(pagination: &PaginationDescriptor, pages: &[PageItem], output: &OutputWriter) {
    let list = pages
        .iter()
        .map(|item| match item {
            PageItem::Page(n) if *n == pagination.page => format!("[{}]", n),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ");
    output.kv(
        "Page",
        format!(
            "{} of {} ({} features)  {}",
            pagination.page, pagination.total_pages, pagination.total_features, list
        ),
    );
}

/// Error for a page change that did not display the page
fn page_failure(session: &Session, page: u32) -> anyhow::Error {
    let snapshot = session.snapshot();
    match snapshot.outcome {
        Some(outcome) if outcome.is_error() => anyhow::anyhow!(outcome.message),
        _ => anyhow::anyhow!(
            "Page {} is out of range (1-{})",
            page,
            snapshot.pagination.total_pages
        ),
    }
}

/// Parse exactly `count` comma-separated numbers, e.g. a bbox or a click point
fn parse_numbers(text: &str, count: usize, what: &str) -> Result<Vec<f64>> {
    let values = text
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid {} '{}': expected numbers", what, text))?;

    if values.len() != count {
        anyhow::bail!("Invalid {} '{}': expected {} numbers, got {}", what, text, count, values.len());
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_numbers("1, 2.5,-3,4", 4, "bbox").unwrap(), vec![1.0, 2.5, -3.0, 4.0]);
        assert!(parse_numbers("1,2,3", 4, "bbox").is_err());
        assert!(parse_numbers("1,x", 2, "click").is_err());
    }
}
