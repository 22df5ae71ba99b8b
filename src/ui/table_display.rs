//! Terminal rendering of table models, notices and reports

use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use crossterm::style::Stylize;

use crate::config::settings::ColumnListEntry;
use crate::data::dashboard::DashboardStats;
use crate::data::pagination::{PageButton, PageLayout};
use crate::data::record::{metadata_value_text, mask_document, Record, RecordStatus};
use crate::data::filter::FilterSet;
use crate::state::{Notice, NoticeLevel};
use crate::ui::table_renderer::{CellValue, HeaderCell, TableModel};

fn status_color(status: &RecordStatus) -> Color {
    match status {
        RecordStatus::Available => Color::Green,
        RecordStatus::InUse => Color::Yellow,
        RecordStatus::Consumed => Color::DarkGrey,
        RecordStatus::Blocked => Color::Red,
        RecordStatus::Other(_) => Color::Grey,
    }
}

fn header_cell(text: impl ToString) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn checkbox(checked: bool) -> &'static str {
    if checked {
        "[x]"
    } else {
        "[ ]"
    }
}

fn body_cell(value: &CellValue, use_colors: bool) -> Cell {
    match value {
        CellValue::Badge { label, tooltip } => {
            let text = match tooltip {
                Some(comment) => format!("{} ({})", label, comment),
                None => label.clone(),
            };
            let cell = Cell::new(text);
            match RecordStatus::parse(label) {
                Some(status) if use_colors => cell.fg(status_color(&status)),
                _ => cell,
            }
        }
        CellValue::Chips(chips) => Cell::new(chips.join(", ")),
        CellValue::Empty => Cell::new("-").set_alignment(CellAlignment::Center),
        other => Cell::new(other.plain()),
    }
}

/// Render the page of rows described by `model`
pub fn render_table(model: &TableModel, use_colors: bool) -> String {
    if model.loading {
        return "Carregando...".to_string();
    }
    if model.rows.is_empty() {
        let message = "Nenhuma massa encontrada.";
        return if use_colors {
            message.yellow().to_string()
        } else {
            message.to_string()
        };
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(model.headers.iter().map(|header| match header {
        HeaderCell::SelectAll { checked } => header_cell(checkbox(*checked)),
        HeaderCell::Column { label, .. } => header_cell(label),
    }));

    for row in &model.rows {
        let mut cells = Vec::with_capacity(row.cells.len() + 1);
        if let Some(selected) = row.selected {
            cells.push(Cell::new(checkbox(selected)));
        }
        cells.extend(row.cells.iter().map(|c| body_cell(c, use_colors)));
        table.add_row(cells);
    }

    format!("{table}\n{}", render_pagination(&model.pagination))
}

/// Page buttons followed by the item range, e.g. `1 … 4 [5] 6 … 10  41-50 de 100`
pub fn render_pagination(layout: &PageLayout) -> String {
    let buttons: Vec<String> = layout
        .buttons
        .iter()
        .map(|button| match button {
            PageButton::Page {
                number,
                current: true,
            } => format!("[{}]", number),
            PageButton::Page { number, .. } => number.to_string(),
            PageButton::Ellipsis => "…".to_string(),
        })
        .collect();

    if buttons.is_empty() {
        layout.summary()
    } else {
        format!("{}  {}", buttons.join(" "), layout.summary())
    }
}

/// One-line summary of the active filters
pub fn render_filters(filters: &FilterSet) -> Option<String> {
    if !filters.is_active() {
        return None;
    }
    let parts: Vec<String> = filters.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    Some(format!("Filtros: {}", parts.join(", ")))
}

pub fn render_notice(notice: &Notice, use_colors: bool) -> String {
    let message = notice.message.as_str();
    if !use_colors {
        return message.to_string();
    }
    match notice.level {
        NoticeLevel::Success => message.green().to_string(),
        NoticeLevel::Warning => message.yellow().to_string(),
        NoticeLevel::Error => message.red().to_string(),
        NoticeLevel::Info => message.to_string(),
    }
}

/// Column manager listing
pub fn render_column_list(entries: &[ColumnListEntry], summary: &str) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        header_cell(""),
        header_cell("Chave"),
        header_cell("Coluna"),
        header_cell("Tipo"),
    ]);

    for entry in entries {
        let marker = if entry.locked {
            "[#]"
        } else {
            checkbox(entry.visible)
        };
        let kind = if entry.custom { "personalizada" } else { "fixa" };
        table.add_row(vec![
            Cell::new(marker),
            Cell::new(&entry.key),
            Cell::new(&entry.label),
            Cell::new(kind),
        ]);
    }

    format!("{table}\n{}", summary)
}

fn count_table<'a>(title: &str, rows: impl Iterator<Item = (String, &'a usize)>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell(title), header_cell("Qtd")]);
    for (label, count) in rows {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(count).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn render_dashboard(stats: &DashboardStats) -> String {
    let mut totals = Table::new();
    totals.set_header(vec![header_cell("Indicador"), header_cell("Valor")]);
    let rows: [(&str, u64); 13] = [
        ("Total de massas", stats.total as u64),
        ("Disponíveis", stats.available as u64),
        ("Em uso", stats.in_use as u64),
        ("Com faturas vencidas", stats.overdue as u64),
        ("UCs ligadas", stats.uc_ligada),
        ("UCs desligadas", stats.uc_desligada),
        ("UCs suspensas", stats.uc_suspensa),
        ("Faturas vencidas", stats.fat_vencidas),
        ("Faturas a vencer", stats.fat_a_vencer),
        ("Faturas pagas", stats.fat_pagas),
        ("Com boleto único", stats.with_boleto_unico as u64),
        ("Com multifaturas", stats.with_multifaturas as u64),
        ("Com renegociação", stats.with_renegociacao as u64),
    ];
    for (label, value) in rows {
        totals.add_row(vec![
            Cell::new(label),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }

    let by_status = count_table(
        "Status",
        stats.by_status.iter().map(|(key, count)| {
            let label = RecordStatus::parse(key)
                .map(|s| s.label().to_string())
                .unwrap_or_else(|| key.clone());
            (label, count)
        }),
    );
    let by_region = count_table(
        "Região",
        stats.by_region.iter().map(|(k, c)| (k.clone(), c)),
    );
    let by_type = count_table(
        "Tipo",
        stats.by_document_type.iter().map(|(k, c)| (k.clone(), c)),
    );

    format!("{totals}\n{by_status}\n{by_region}\n{by_type}")
}

/// Full field listing for one record
pub fn render_record_details(record: &Record) -> String {
    let mut out = String::from("=== DETALHES DA MASSA ===\n\n");
    let c = &record.connections;
    let inv = &record.invoices;

    let general = [
        ("ID", record.id.to_string()),
        ("Nome", record.name_or_empty().to_string()),
        (
            "Documento",
            mask_document(&record.document_number, record.document_type),
        ),
        ("Tipo", record.document_type.to_string()),
        ("Região", record.region.clone()),
        ("Status TDM", record.status.label().to_string()),
        (
            "Status Financeiro",
            record.financial_status.clone().unwrap_or_default(),
        ),
        ("UCs Ligadas", c.uc_ligada.to_string()),
        ("UCs Desligadas", c.uc_desligada.to_string()),
        ("UCs Suspensas", c.uc_suspensa.to_string()),
    ];
    for (label, value) in general {
        out.push_str(&format!("{}: {}\n", label, value));
    }

    out.push_str("\n=== FATURAS ===\n");
    let invoices = [
        ("Vencidas", inv.fat_vencidas),
        ("A Vencer", inv.fat_a_vencer),
        ("Pagas", inv.fat_pagas),
        ("Boleto Único", inv.fat_boleto_unico),
        ("Multifaturas", inv.fat_multifaturas),
        ("Renegociação", inv.fat_renegociacao),
    ];
    for (label, value) in invoices {
        out.push_str(&format!("{}: {}\n", label, value));
    }
    out.push_str(&format!("Tags: {}\n", record.tags.join(", ")));

    out.push_str("\n=== METADADOS ===\n");
    if record.metadata.is_empty() {
        out.push_str("(Sem metadados)\n");
    } else {
        for (key, value) in &record.metadata {
            out.push_str(&format!("{}: {}\n", key, metadata_value_text(Some(value))));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::DisplaySettings;
    use crate::data::record::DocumentType;
    use crate::state::{reduce, Action, AppState};
    use serde_json::json;

    fn state_with(n: i64) -> AppState {
        let records = (1..=n)
            .map(|i| {
                let mut r = Record::new(i, DocumentType::Cpf, &format!("{:011}", i));
                r.name = Some(format!("Cliente {}", i));
                r
            })
            .collect();
        let state = AppState::new(DisplaySettings::with_defaults(), 10);
        reduce(&state, Action::RecordsLoaded(records)).state
    }

    #[test]
    fn test_render_table_plain() {
        let model = TableModel::build(&state_with(3));
        let out = render_table(&model, false);
        assert!(out.contains("#1"));
        assert!(out.contains("Cliente 3"));
        assert!(out.contains("Disponível"));
        assert!(out.ends_with("[1]  1-3 de 3"));
    }

    #[test]
    fn test_render_empty_and_loading() {
        let state = AppState::new(DisplaySettings::with_defaults(), 10);
        let model = TableModel::build(&state);
        assert_eq!(render_table(&model, false), "Nenhuma massa encontrada.");

        let loading = reduce(&state, Action::SetLoading(true)).state;
        assert_eq!(render_table(&TableModel::build(&loading), false), "Carregando...");
    }

    #[test]
    fn test_selection_checkboxes() {
        let state = reduce(&state_with(2), Action::ToggleSelectionMode).state;
        let state = reduce(&state, Action::ToggleRowSelection(2)).state;
        let out = render_table(&TableModel::build(&state), false);
        assert!(out.contains("[x]"));
        assert!(out.contains("[ ]"));
    }

    #[test]
    fn test_render_filters() {
        assert_eq!(render_filters(&FilterSet::new()), None);
        let filters = FilterSet::new().with("region", "Bahia");
        assert_eq!(render_filters(&filters).unwrap(), "Filtros: region=Bahia");
    }

    #[test]
    fn test_record_details() {
        let mut record = Record::new(7, DocumentType::Cpf, "12345678901");
        record.metadata.insert("plano".into(), json!("ouro"));
        let out = render_record_details(&record);
        assert!(out.contains("ID: 7"));
        assert!(out.contains("Documento: 123.456.789-01"));
        assert!(out.contains("plano: ouro"));

        record.metadata.clear();
        assert!(render_record_details(&record).contains("(Sem metadados)"));
    }

    #[test]
    fn test_render_notice_plain() {
        let notice = Notice::warning("Nada para exportar");
        assert_eq!(render_notice(&notice, false), "Nada para exportar");
    }
}
