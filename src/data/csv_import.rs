//! CSV import normalizer
//!
//! Maps an arbitrary delimited file onto the record schema. Header cells are
//! matched by keyword against their compact slug; unmatched required fields
//! get defaults. The result is a batch of candidate records, nothing is sent
//! anywhere from here.

use std::path::Path;

use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::data::record::{pad_document, DocumentType, NewRecord, RecordStatus};
use crate::schema::{compact_slug, key_slug, CustomColumn};

pub const FINANCIAL_OK: &str = "ADIMPLENTE";
pub const FINANCIAL_OVERDUE: &str = "COM_FATURAS_VENCIDAS";
pub const DEBT_TAG: &str = "com_divida";
pub const CONNECTED_TAG: &str = "com_luz";
pub const DEFAULT_FALLBACK_REGION: &str = "Brasília";

const DOC_TYPE_KEYWORDS: &[&str] = &["tipodoc", "tipodo", "tipo"];
const DOC_NUMBER_KEYWORDS: &[&str] = &["documento"];
const NAME_KEYWORDS: &[&str] = &["nome", "name", "razaosocial"];
const REGION_KEYWORDS: &[&str] = &["regiao"];
const LIGADA_KEYWORDS: &[&str] = &["ucsligadas", "qtducsligadas", "ligadas"];
const VENCIDAS_KEYWORDS: &[&str] = &["faturasvencidas", "qtdfaturasvencidas", "vencidas"];
const SUSPENSA_KEYWORDS: &[&str] = &["ucssuspensas", "qtducssuspensas", "suspensas"];
const DESLIGADA_KEYWORDS: &[&str] = &["ucsdesligadas", "qtducsdesligadas", "desligadas"];

/// Defaults applied to fields the file does not provide
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub fallback_region: String,
    pub default_document_type: DocumentType,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            fallback_region: DEFAULT_FALLBACK_REGION.to_string(),
            default_document_type: DocumentType::Cpf,
        }
    }
}

/// Parsed batch ready for bulk import
#[derive(Debug, Clone, PartialEq)]
pub struct ImportBatch {
    pub records: Vec<NewRecord>,
    pub separator: char,
    /// Data rows dropped because they had fewer than two fields
    pub short_rows: usize,
    /// Data rows dropped because the document number had too many digits
    pub invalid_documents: usize,
}

/// Column positions of the recognised fields; `None` when absent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderMap {
    pub document_type: Option<usize>,
    pub document_number: Option<usize>,
    pub name: Option<usize>,
    pub region: Option<usize>,
    pub uc_ligada: Option<usize>,
    pub fat_vencidas: Option<usize>,
    pub uc_suspensa: Option<usize>,
    pub uc_desligada: Option<usize>,
}

impl HeaderMap {
    pub fn detect(headers: &[String]) -> Self {
        let slugs: Vec<String> = headers.iter().map(|h| compact_slug(h)).collect();
        let find = |keywords: &[&str]| {
            let idx = slugs
                .iter()
                .position(|slug| keywords.iter().any(|k| slug.contains(k)));
            debug!("Header lookup {} -> {:?}", keywords.join("/"), idx);
            idx
        };

        Self {
            document_type: find(DOC_TYPE_KEYWORDS),
            document_number: find(DOC_NUMBER_KEYWORDS),
            name: find(NAME_KEYWORDS),
            region: find(REGION_KEYWORDS),
            uc_ligada: find(LIGADA_KEYWORDS),
            fat_vencidas: find(VENCIDAS_KEYWORDS),
            uc_suspensa: find(SUSPENSA_KEYWORDS),
            uc_desligada: find(DESLIGADA_KEYWORDS),
        }
    }
}

/// Reject spreadsheet formats that are not delimited text
pub fn check_file_kind(path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if ext == "xlsx" || ext == "xls" {
        return Err(anyhow!(
            "Excel files are not supported; save the sheet as CSV and import that instead"
        ));
    }
    Ok(())
}

/// Pick the field separator from the header line
pub fn detect_separator(header_line: &str) -> char {
    if header_line.contains(';') && !header_line.contains(',') {
        return ';';
    }
    let semicolons = header_line.split(';').count();
    let commas = header_line.split(',').count();
    if semicolons > commas {
        ';'
    } else {
        ','
    }
}

/// Split one line into trimmed fields.
///
/// A double quote toggles the in-quotes state and is itself dropped, so the
/// separator inside quotes is kept as data. Inside quotes a doubled quote
/// stands for one literal quote.
pub fn parse_line(line: &str, separator: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '"' {
            if in_quotes && chars.peek() == Some(&'"') {
                chars.next();
                current.push('"');
            } else {
                in_quotes = !in_quotes;
            }
        } else if ch == separator && !in_quotes {
            fields.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(ch);
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Leading-integer parse; anything unparseable, negative or out of range becomes 0
pub fn parse_count(raw: &str) -> u32 {
    let raw = raw.trim();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if negative || end == 0 {
        return 0;
    }
    match digits[..end].parse() {
        Ok(count) => count,
        Err(_) => {
            warn!("Counter '{}' is out of range, using 0", raw);
            0
        }
    }
}

fn cell<'a>(values: &'a [String], idx: Option<usize>) -> Option<&'a str> {
    idx.and_then(|i| values.get(i))
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

fn count_at(values: &[String], idx: Option<usize>) -> u32 {
    cell(values, idx).map(parse_count).unwrap_or(0)
}

/// Parse a whole file into a batch of candidate records.
///
/// `custom_columns` decides which extra header cells are copied into
/// metadata; the schema itself is left untouched.
pub fn parse_import(
    text: &str,
    custom_columns: &[CustomColumn],
    options: &ImportOptions,
) -> Result<ImportBatch> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let lines: Vec<&str> = text.split('\n').filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return Err(anyhow!("File is empty or has no data rows"));
    }

    let separator = detect_separator(lines[0]);
    info!("Importing CSV with separator '{}'", separator);

    let headers = parse_line(lines[0], separator);
    let map = HeaderMap::detect(&headers);
    let metadata_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, header)| {
            let slug = key_slug(header);
            custom_columns
                .iter()
                .any(|c| c.key == slug)
                .then_some((i, slug))
        })
        .collect();

    let mut batch = ImportBatch {
        records: Vec::new(),
        separator,
        short_rows: 0,
        invalid_documents: 0,
    };

    for (row, line) in lines.iter().enumerate().skip(1) {
        let values = parse_line(line, separator);
        if values.len() < 2 {
            batch.short_rows += 1;
            continue;
        }

        let document_type = cell(&values, map.document_type)
            .map(|v| DocumentType::from_label(&v.to_uppercase()))
            .unwrap_or(options.default_document_type);

        let raw_document = cell(&values, map.document_number)
            .map(str::to_string)
            .unwrap_or_else(|| row.to_string());
        let Some(document_number) = pad_document(&raw_document, document_type) else {
            warn!(
                "Row {}: document '{}' is too long for {}",
                row, raw_document, document_type
            );
            batch.invalid_documents += 1;
            continue;
        };

        let region = cell(&values, map.region)
            .map(str::to_string)
            .unwrap_or_else(|| options.fallback_region.clone());

        let mut record = NewRecord {
            name: Some(cell(&values, map.name).unwrap_or("").to_string()),
            document_type,
            document_number,
            region,
            status: RecordStatus::Available,
            financial_status: None,
            connections: Default::default(),
            invoices: Default::default(),
            tags: Vec::new(),
            metadata: Map::new(),
        };
        record.connections.uc_ligada = count_at(&values, map.uc_ligada);
        record.connections.uc_desligada = count_at(&values, map.uc_desligada);
        record.connections.uc_suspensa = count_at(&values, map.uc_suspensa);
        record.invoices.fat_vencidas = count_at(&values, map.fat_vencidas);

        let overdue = record.invoices.fat_vencidas > 0;
        record.financial_status = Some(
            if overdue { FINANCIAL_OVERDUE } else { FINANCIAL_OK }.to_string(),
        );

        for (i, key) in &metadata_columns {
            if let Some(value) = cell(&values, Some(*i)) {
                record.metadata.insert(key.clone(), Value::String(value.to_string()));
            }
        }

        if overdue {
            record.tags.push(DEBT_TAG.to_string());
        }
        if record.connections.uc_ligada > 0 {
            record.tags.push(CONNECTED_TAG.to_string());
        }

        batch.records.push(record);
    }

    info!(
        "Parsed {} records ({} short rows, {} invalid documents)",
        batch.records.len(),
        batch.short_rows,
        batch.invalid_documents
    );
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CustomValueType;

    fn headers(line: &str, sep: char) -> Vec<String> {
        parse_line(line, sep)
    }

    #[test]
    fn test_detect_separator() {
        assert_eq!(detect_separator("Tipo Doc;Documento;Nome;Região"), ';');
        assert_eq!(detect_separator("a,b,c"), ',');
        assert_eq!(detect_separator("a;b;c,d"), ';');
        assert_eq!(detect_separator("a;b,c"), ',');
        assert_eq!(detect_separator("single"), ',');
    }

    #[test]
    fn test_parse_line_with_quotes() {
        assert_eq!(
            parse_line(r#""Silva, João";123; x "#, ';'),
            vec!["Silva, João", "123", "x"]
        );
        assert_eq!(parse_line(r#"a,"b,c",d"#, ','), vec!["a", "b,c", "d"]);
        assert_eq!(parse_line(r#""say ""hi""""#, ','), vec![r#"say "hi""#]);
        assert_eq!(parse_line(r#""";"""";x"#, ';'), vec!["", "\"", "x"]);
    }

    #[test]
    fn test_header_detection() {
        let map = HeaderMap::detect(&headers(
            "Tipo Doc;Documento;Nome;Região;Qtd UCs Ligadas;Faturas Vencidas;Outro",
            ';',
        ));
        assert_eq!(map.document_type, Some(0));
        assert_eq!(map.document_number, Some(1));
        assert_eq!(map.name, Some(2));
        assert_eq!(map.region, Some(3));
        assert_eq!(map.uc_ligada, Some(4));
        assert_eq!(map.fat_vencidas, Some(5));
        assert_eq!(map.uc_suspensa, None);
        assert_eq!(map.uc_desligada, None);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("3"), 3);
        assert_eq!(parse_count(" 2.7 "), 2);
        assert_eq!(parse_count("4abc"), 4);
        assert_eq!(parse_count("abc"), 0);
        assert_eq!(parse_count("-1"), 0);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("4294967295"), u32::MAX);
        assert_eq!(parse_count("4294967296"), 0);
        assert_eq!(parse_count("99999999999999999999"), 0);
    }

    #[test]
    fn test_parse_import_defaults_and_tags() {
        let text = "Tipo Doc;Documento;Nome;UCs Ligadas;Faturas Vencidas\r\n\
                    CNPJ;12.345.678/0001-95;Padaria;1;2\r\n\
                    ;123;Maria;0;0\r\n\
                    \r\n\
                    solo\r\n";
        let batch = parse_import(text, &[], &ImportOptions::default()).unwrap();
        assert_eq!(batch.separator, ';');
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.short_rows, 1);

        let first = &batch.records[0];
        assert_eq!(first.document_type, DocumentType::Cnpj);
        assert_eq!(first.document_number, "12345678000195");
        assert_eq!(first.region, "Brasília");
        assert_eq!(first.status, RecordStatus::Available);
        assert_eq!(first.financial_status.as_deref(), Some(FINANCIAL_OVERDUE));
        assert_eq!(first.tags, vec![DEBT_TAG, CONNECTED_TAG]);

        let second = &batch.records[1];
        assert_eq!(second.document_type, DocumentType::Cpf);
        assert_eq!(second.document_number, "00000000123");
        assert_eq!(second.financial_status.as_deref(), Some(FINANCIAL_OK));
        assert!(second.tags.is_empty());
    }

    #[test]
    fn test_missing_document_uses_row_index() {
        let text = "Nome,Região\nAna,Bahia\nBia,Pernambuco\n";
        let batch = parse_import(text, &[], &ImportOptions::default()).unwrap();
        assert_eq!(batch.records[0].document_number, "00000000001");
        assert_eq!(batch.records[1].document_number, "00000000002");
        assert_eq!(batch.records[1].region, "Pernambuco");
    }

    #[test]
    fn test_custom_columns_copied_to_metadata() {
        let customs = vec![
            CustomColumn::new("Data de Corte", CustomValueType::Date, &[]).unwrap(),
            CustomColumn::new("Lote", CustomValueType::Text, &[]).unwrap(),
        ];
        let text = "Documento,Data de Corte,Lote,Ignorada\n1,2024-03-01,,x\n";
        let batch = parse_import(text, &customs, &ImportOptions::default()).unwrap();
        let metadata = &batch.records[0].metadata;
        assert_eq!(metadata.get("data_de_corte"), Some(&Value::from("2024-03-01")));
        assert!(metadata.get("lote").is_none());
        assert!(metadata.get("ignorada").is_none());
    }

    #[test]
    fn test_overlong_document_is_skipped() {
        let text = "Tipo,Documento\nCPF,123456789012\nCPF,1\n";
        let batch = parse_import(text, &[], &ImportOptions::default()).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.invalid_documents, 1);
    }

    #[test]
    fn test_rejects_single_line_files() {
        assert!(parse_import("Nome;Documento\n", &[], &ImportOptions::default()).is_err());
        assert!(parse_import("\n \n", &[], &ImportOptions::default()).is_err());
    }

    #[test]
    fn test_check_file_kind() {
        assert!(check_file_kind(Path::new("dados.XLSX")).is_err());
        assert!(check_file_kind(Path::new("dados.xls")).is_err());
        assert!(check_file_kind(Path::new("dados.csv")).is_ok());
        assert!(check_file_kind(Path::new("dados")).is_ok());
    }
}
