//! Turns fetched pods into a shaped, rendered report table.

use std::io::Write;

use k8s_openapi::api::core::v1::Pod;
use log::{debug, info};

use crate::Result;
use crate::lib::builder::RowBuilder;
use crate::lib::cli::OutputFormat;
use crate::lib::config::ReportConfig;
use crate::lib::error::ConfigError;
use crate::lib::loopers::{LooperSettings, looper_for};
use crate::lib::table::{RenderOptions, Table};

/// Build the rows of `config.kind` and apply the filters, sort order and
/// outlier reduction the configuration asks for.
pub fn build_report(config: &ReportConfig, pods: &[Pod], settings: LooperSettings) -> Result<Table> {
    let looper = looper_for(config.kind, settings);
    let mut table = Table::new();
    RowBuilder::new(config.builder.clone()).build(pods, looper.as_ref(), &mut table)?;

    table.set_filter(&config.filters)?;
    table.sort_by_names(&config.sort)?;

    if config.oddities {
        show_only_oddities(config, &mut table)?;
    }
    Ok(table)
}

fn show_only_oddities(config: &ReportConfig, table: &mut Table) -> Result<()> {
    let title = config.kind.oddity_column().ok_or_else(|| {
        ConfigError::InvalidValue(format!(
            "--oddities is not supported by the {} report",
            config.kind.name()
        ))
    })?;
    let Some(column) = table.find_column(title) else {
        return Err(crate::TableError::UnknownColumn(title.to_string()).into());
    };

    let outliers = table.list_out_of_range(column);
    let in_range: Vec<usize> = table
        .visible_row_indices()
        .into_iter()
        .filter(|index| !outliers.contains(index))
        .collect();
    debug!("{} outliers in {}, hiding {} rows", outliers.len(), title, in_range.len());
    table.hide_rows(&in_range);
    Ok(())
}

/// Write `table` to `out` in the requested format
pub fn render(table: &Table, format: OutputFormat, colour: bool, out: &mut impl Write) -> Result<()> {
    match format {
        OutputFormat::Table => table.print(out, RenderOptions { colour })?,
        OutputFormat::Json => table.print_json(out)?,
        OutputFormat::Yaml => table.print_yaml(out)?,
    }
    info!("Rendered {} rows", table.visible_row_indices().len());
    Ok(())
}
