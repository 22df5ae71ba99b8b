use chrono::NaiveDate;

use tdm::config::settings::DisplaySettings;
use tdm::data::csv_import::{parse_import, ImportOptions};
use tdm::data::data_exporter::DataExporter;
use tdm::data::filter::FilteredView;
use tdm::data::record::{DocumentType, Record};
use tdm::schema::{CustomColumn, CustomValueType};

fn records() -> Vec<Record> {
    let rows = [
        (1, DocumentType::Cpf, "00000000123", "Ana Souza", "Bahia"),
        (2, DocumentType::Cnpj, "12345678000190", "Oficina Central", "São Paulo"),
        (3, DocumentType::Cpf, "98765432100", "José Araújo", "Rio Grande do Norte"),
    ];
    rows.iter()
        .map(|(id, ty, doc, name, region)| {
            let mut record = Record::new(*id, *ty, doc);
            record.name = Some(name.to_string());
            record.region = region.to_string();
            record.connections.uc_ligada = *id as u32;
            record.invoices.fat_vencidas = 2;
            record.invoices.fat_pagas = 1;
            record.tags = vec!["vip".into(), "teste".into()];
            record
        })
        .collect()
}

#[test]
fn test_export_then_import_recovers_identity_fields() {
    let records = records();
    let settings = DisplaySettings::with_defaults();
    let date = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();

    let export = DataExporter::export_view(&records, &FilteredView::all(records.len()), &settings, date)
        .unwrap()
        .unwrap();
    assert_eq!(export.file_name, "tdm_massas_export_2024-05-17.csv");
    assert_eq!(export.row_count, 3);

    let batch = parse_import(&export.content, &[], &ImportOptions::default()).unwrap();
    assert_eq!(batch.separator, ';');
    assert_eq!(batch.records.len(), records.len());

    for (original, imported) in records.iter().zip(&batch.records) {
        assert_eq!(imported.name, original.name);
        assert_eq!(imported.document_number, original.document_number);
        assert_eq!(imported.document_type, original.document_type);
        assert_eq!(imported.region, original.region);
    }
}

#[test]
fn test_exported_counter_phrases() {
    let records = records();
    let settings = DisplaySettings::with_defaults();
    let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let export = DataExporter::export_view(&records, &FilteredView::all(3), &settings, date)
        .unwrap()
        .unwrap();

    let first_row = export.content.lines().nth(1).unwrap();
    assert!(first_row.contains("\"2 Vencida, 1 Paga\""));
    assert!(first_row.contains("\"1 Ligada\""));
    assert!(first_row.contains("\"vip, teste\""));
}

#[test]
fn test_separator_quotes_and_padding_in_values() {
    let mut record = Record::new(1, DocumentType::Cpf, "00000000123");
    record.name = Some("Silva; Filhos \"ME\"".into());
    record.region = "  Bahia  ".into();
    record
        .metadata
        .insert("observacao".into(), serde_json::json!("corte; aviso \"urgente\""));
    let records = vec![record];

    let observacao = CustomColumn::new("Observação", CustomValueType::Text, &[]).unwrap();
    let settings = DisplaySettings::with_defaults()
        .add_custom_column(observacao.clone())
        .unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
    let export = DataExporter::export_view(&records, &FilteredView::all(1), &settings, date)
        .unwrap()
        .unwrap();

    let batch = parse_import(&export.content, &[observacao], &ImportOptions::default()).unwrap();
    assert_eq!(batch.records.len(), 1);
    let imported = &batch.records[0];
    assert_eq!(imported.name.as_deref(), Some("Silva; Filhos \"ME\""));
    assert_eq!(imported.metadata["observacao"], "corte; aviso \"urgente\"");
    // surrounding whitespace is trimmed on import
    assert_eq!(imported.region, "Bahia");
}
