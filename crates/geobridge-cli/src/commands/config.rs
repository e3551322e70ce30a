use crate::output::OutputWriter;
use crate::output_types::{ConfigEntry, ConfigOutput};
use anyhow::Result;
use geobridge_core::config::{LayeredConfig, ENV_PORTAL_TOKEN};

pub fn execute(config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let mut values: Vec<ConfigEntry> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigEntry { key, value, source: format!("{:?}", source) })
        .collect();
    values.sort_by(|a, b| a.key.cmp(&b.key));

    let portal_token_set = config.portal_token.is_some();

    if output.is_json() {
        output.result(ConfigOutput { values, portal_token_set })?;
        return Ok(());
    }

    output.section("Effective configuration");
    output.table(values);
    output.kv(
        ENV_PORTAL_TOKEN,
        if portal_token_set { "set" } else { "not set" },
    );
    Ok(())
}
