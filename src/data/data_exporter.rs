use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use tracing::info;

use crate::config::settings::DisplaySettings;
use crate::data::filter::FilteredView;
use crate::data::record::{ConnectionKind, InvoiceKind, Record};
use crate::schema::{
    ColumnRef, CustomValueType, ACTIONS_KEY, DOCUMENT_NUMBER_KEY, DOCUMENT_TYPE_KEY,
    FAT_COUNTERS_KEY, ID_KEY, NAME_KEY, REGION_KEY, STATUS_KEY, TAGS_KEY, UC_COUNTERS_KEY,
};
use crate::utils::format::{decimal_comma, format_date_br};

const BOM: &str = "\u{feff}";

/// A rendered CSV file, not yet written anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub file_name: String,
    pub content: String,
    pub row_count: usize,
}

/// Handles exporting the table view to delimited text
pub struct DataExporter;

impl DataExporter {
    /// File name embedding the export date
    pub fn export_file_name(date: NaiveDate) -> String {
        format!("tdm_massas_export_{}.csv", date.format("%Y-%m-%d"))
    }

    /// Visible columns in display order, without the actions column
    pub fn export_columns(settings: &DisplaySettings) -> Vec<ColumnRef<'_>> {
        settings
            .visible_columns()
            .into_iter()
            .filter(|c| c.key() != ACTIONS_KEY)
            .collect()
    }

    /// "3 Vencida, 1 A Vencer" style summary of the non-zero counters
    pub fn connection_summary(record: &Record) -> String {
        ConnectionKind::ALL
            .iter()
            .filter(|k| record.has_connection(**k))
            .map(|k| format!("{} {}", k.count(&record.connections), k.label()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn invoice_summary(record: &Record) -> String {
        InvoiceKind::ALL
            .iter()
            .filter(|k| record.has_invoice(**k))
            .map(|k| format!("{} {}", k.count(&record.invoices), k.label()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Text written for one cell
    pub fn cell_text(column: &ColumnRef<'_>, record: &Record) -> String {
        match column.key() {
            ID_KEY => record.id.to_string(),
            NAME_KEY => record.name_or_empty().to_string(),
            DOCUMENT_NUMBER_KEY => record.document_number.clone(),
            DOCUMENT_TYPE_KEY => record.document_type.to_string(),
            REGION_KEY => record.region.clone(),
            STATUS_KEY => record.status.label().to_string(),
            TAGS_KEY => record.tags.join(", "),
            UC_COUNTERS_KEY => Self::connection_summary(record),
            FAT_COUNTERS_KEY => Self::invoice_summary(record),
            key => {
                let value = record.metadata_text(key);
                if value.is_empty() {
                    return value;
                }
                match column {
                    ColumnRef::Custom(c) => match c.value_type {
                        CustomValueType::Number => decimal_comma(&value),
                        CustomValueType::Date => format_date_br(&value),
                        CustomValueType::Text | CustomValueType::Tag => value,
                    },
                    _ => value,
                }
            }
        }
    }

    /// Serialize the view to CSV.
    ///
    /// Uses the filtered view when a filter is active and the full set
    /// otherwise. Returns `None` when there is nothing to export.
    pub fn export_view(
        records: &[Record],
        view: &FilteredView,
        settings: &DisplaySettings,
        date: NaiveDate,
    ) -> Result<Option<CsvExport>> {
        let rows: Vec<&Record> = if view.is_filtered() {
            view.records(records).collect()
        } else {
            records.iter().collect()
        };
        if rows.is_empty() {
            return Ok(None);
        }

        let columns = Self::export_columns(settings);
        let mut writer = WriterBuilder::new()
            .delimiter(b';')
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(columns.iter().map(|c| c.export_label()))?;
        for record in &rows {
            writer.write_record(columns.iter().map(|c| Self::cell_text(c, record)))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to finish CSV output: {}", e))?;
        let mut content = String::from(BOM);
        content.push_str(&String::from_utf8(bytes).context("CSV output is not UTF-8")?);

        Ok(Some(CsvExport {
            file_name: Self::export_file_name(date),
            content,
            row_count: rows.len(),
        }))
    }

    /// Same as [`export_view`](Self::export_view) dated today
    pub fn export_view_today(
        records: &[Record],
        view: &FilteredView,
        settings: &DisplaySettings,
    ) -> Result<Option<CsvExport>> {
        Self::export_view(records, view, settings, Local::now().date_naive())
    }

    /// Write the export into `dir`, returning the full path
    pub fn write_to_dir(export: &CsvExport, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create export dir {}", dir.display()))?;
        let path = dir.join(&export.file_name);
        fs::write(&path, &export.content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Exported {} rows to {}", export.row_count, path.display());
        Ok(path)
    }
}
