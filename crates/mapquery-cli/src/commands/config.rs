use anyhow::Result;
use mapquery_core::config::LayeredConfig;

use crate::output::OutputWriter;
use crate::output_types::{ConfigEntry, ConfigOutput};

/// Execute the config command
pub fn execute(config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let mut values: Vec<ConfigEntry> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigEntry { key, value, source })
        .collect();
    values.sort_by(|a, b| a.key.cmp(&b.key));

    if output.is_json() {
        return output.result(ConfigOutput { values });
    }

    output.section("Configuration");
    output.table(values);
    Ok(())
}
