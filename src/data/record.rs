//! Record model ("massa") as exchanged with the record store

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::OnceLock;

pub type RecordId = i64;

/// Metadata key holding the free-text comment attached to a status
pub const STATUS_COMMENT_KEY: &str = "status_comment";

/// Treat an explicit JSON `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Brazilian document kind; each has a fixed digit length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum DocumentType {
    #[default]
    #[serde(rename = "CPF")]
    Cpf,
    #[serde(rename = "CNPJ")]
    Cnpj,
}

impl DocumentType {
    pub fn digit_len(self) -> usize {
        match self {
            DocumentType::Cpf => 11,
            DocumentType::Cnpj => 14,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Cpf => "CPF",
            DocumentType::Cnpj => "CNPJ",
        }
    }

    /// Anything that is not CNPJ is treated as CPF, the first variant
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("CNPJ") {
            DocumentType::Cnpj
        } else {
            DocumentType::Cpf
        }
    }
}

impl From<String> for DocumentType {
    fn from(value: String) -> Self {
        Self::from_label(&value)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Left-pad the digits of `raw` with zeros to the length required by `doc_type`.
///
/// Non-digit characters are dropped. Returns `None` when the input carries
/// more digits than the type allows; such numbers are never truncated.
pub fn pad_document(raw: &str, doc_type: DocumentType) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let target = doc_type.digit_len();
    if digits.len() > target {
        return None;
    }
    Some(format!("{:0>width$}", digits, width = target))
}

fn cpf_mask() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{3})(\d{3})(\d{3})(\d{2})$").expect("valid CPF pattern"))
}

fn cnpj_mask() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{2})(\d{3})(\d{3})(\d{4})(\d{2})$").expect("valid CNPJ pattern")
    })
}

/// Display form of a document number; unknown shapes are returned as-is
pub fn mask_document(number: &str, doc_type: DocumentType) -> String {
    if number.is_empty() {
        return "-".to_string();
    }
    match doc_type {
        DocumentType::Cpf => cpf_mask().replace(number, "$1.$2.$3-$4").into_owned(),
        DocumentType::Cnpj => cnpj_mask().replace(number, "$1.$2.$3/$4-$5").into_owned(),
    }
}

/// Lifecycle status. The store keeps this as free text, so values outside the
/// known set are carried verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordStatus {
    #[default]
    Available,
    InUse,
    Consumed,
    Blocked,
    Other(String),
}

impl RecordStatus {
    pub const ALL: [RecordStatus; 4] = [
        RecordStatus::Available,
        RecordStatus::InUse,
        RecordStatus::Consumed,
        RecordStatus::Blocked,
    ];

    /// Statuses offered by the bulk status-change action
    pub const ACTIONABLE: [RecordStatus; 3] = [
        RecordStatus::Available,
        RecordStatus::InUse,
        RecordStatus::Blocked,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            RecordStatus::Available => "AVAILABLE",
            RecordStatus::InUse => "IN_USE",
            RecordStatus::Consumed => "CONSUMED",
            RecordStatus::Blocked => "BLOCKED",
            RecordStatus::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            RecordStatus::Available => "Disponível",
            RecordStatus::InUse => "Em Uso",
            RecordStatus::Consumed => "Consumido",
            RecordStatus::Blocked => "Bloqueado",
            RecordStatus::Other(raw) => raw,
        }
    }

    pub fn is_actionable(&self) -> bool {
        Self::ACTIONABLE.contains(self)
    }

    /// Accepts the wire value or the display label of a known status, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|s| {
            s.as_str().eq_ignore_ascii_case(value)
                || s.label().to_lowercase() == value.to_lowercase()
                || s.as_str().replace('_', "-").eq_ignore_ascii_case(value)
        })
    }
}

impl From<String> for RecordStatus {
    fn from(value: String) -> Self {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == value)
            .unwrap_or(RecordStatus::Other(value))
    }
}

impl From<RecordStatus> for String {
    fn from(status: RecordStatus) -> Self {
        match status {
            RecordStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Utility-connection ("UC") counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionCounters {
    #[serde(default, deserialize_with = "null_as_default")]
    pub uc_ligada: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uc_desligada: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uc_suspensa: u32,
}

/// Invoice-state counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InvoiceCounters {
    #[serde(default, deserialize_with = "null_as_default")]
    pub fat_vencidas: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fat_a_vencer: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fat_pagas: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fat_boleto_unico: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fat_multifaturas: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fat_renegociacao: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    Ligada,
    Desligada,
    Suspensa,
}

impl ConnectionKind {
    pub const ALL: [ConnectionKind; 3] = [
        ConnectionKind::Ligada,
        ConnectionKind::Desligada,
        ConnectionKind::Suspensa,
    ];

    pub fn count(self, counters: &ConnectionCounters) -> u32 {
        match self {
            ConnectionKind::Ligada => counters.uc_ligada,
            ConnectionKind::Desligada => counters.uc_desligada,
            ConnectionKind::Suspensa => counters.uc_suspensa,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConnectionKind::Ligada => "Ligada",
            ConnectionKind::Desligada => "Desligada",
            ConnectionKind::Suspensa => "Suspensa",
        }
    }

    /// Filter option value selecting records with at least one of this kind
    pub fn flag(self) -> &'static str {
        match self {
            ConnectionKind::Ligada => "TEM_LIGADA",
            ConnectionKind::Desligada => "TEM_DESLIGADA",
            ConnectionKind::Suspensa => "TEM_SUSPENSA",
        }
    }

    pub fn from_flag(flag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.flag() == flag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceKind {
    Vencida,
    AVencer,
    Paga,
    BoletoUnico,
    Multifatura,
    Renegociacao,
}

impl InvoiceKind {
    pub const ALL: [InvoiceKind; 6] = [
        InvoiceKind::Vencida,
        InvoiceKind::AVencer,
        InvoiceKind::Paga,
        InvoiceKind::BoletoUnico,
        InvoiceKind::Multifatura,
        InvoiceKind::Renegociacao,
    ];

    pub fn count(self, counters: &InvoiceCounters) -> u32 {
        match self {
            InvoiceKind::Vencida => counters.fat_vencidas,
            InvoiceKind::AVencer => counters.fat_a_vencer,
            InvoiceKind::Paga => counters.fat_pagas,
            InvoiceKind::BoletoUnico => counters.fat_boleto_unico,
            InvoiceKind::Multifatura => counters.fat_multifaturas,
            InvoiceKind::Renegociacao => counters.fat_renegociacao,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InvoiceKind::Vencida => "Vencida",
            InvoiceKind::AVencer => "A Vencer",
            InvoiceKind::Paga => "Paga",
            InvoiceKind::BoletoUnico => "Boleto Único",
            InvoiceKind::Multifatura => "Multifatura",
            InvoiceKind::Renegociacao => "Renegociação",
        }
    }

    /// Some labels take an "s" in the plural, the invariable ones do not
    pub fn pluralizes(self) -> bool {
        matches!(
            self,
            InvoiceKind::Vencida | InvoiceKind::Paga | InvoiceKind::Multifatura
        )
    }

    pub fn flag(self) -> &'static str {
        match self {
            InvoiceKind::Vencida => "TEM_VENCIDA",
            InvoiceKind::AVencer => "TEM_A_VENCER",
            InvoiceKind::Paga => "TEM_PAGA",
            InvoiceKind::BoletoUnico => "TEM_BOLETO",
            InvoiceKind::Multifatura => "TEM_MULTI",
            InvoiceKind::Renegociacao => "TEM_RENEG",
        }
    }

    pub fn from_flag(flag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.flag() == flag)
    }
}

/// A stored record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(rename = "nome", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub document_type: DocumentType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub document_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub region: String,
    #[serde(default)]
    pub uf: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: RecordStatus,
    #[serde(default)]
    pub financial_status: Option<String>,
    #[serde(flatten)]
    pub connections: ConnectionCounters,
    #[serde(flatten)]
    pub invoices: InvoiceCounters,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(rename = "metadata_info", default, deserialize_with = "null_as_default")]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_used_at: Option<String>,
    #[serde(default)]
    pub last_used_by: Option<String>,
}

/// String projection of a metadata value; absent or null values are empty
pub fn metadata_value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

impl Record {
    /// Minimal record, mostly useful for building fixtures
    pub fn new(id: RecordId, document_type: DocumentType, document_number: &str) -> Self {
        Self {
            id,
            name: None,
            document_type,
            document_number: document_number.to_string(),
            region: String::new(),
            uf: None,
            status: RecordStatus::Available,
            financial_status: None,
            connections: ConnectionCounters::default(),
            invoices: InvoiceCounters::default(),
            tags: Vec::new(),
            metadata: Map::new(),
            created_at: None,
            last_used_at: None,
            last_used_by: None,
        }
    }

    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn metadata_text(&self, key: &str) -> String {
        metadata_value_text(self.metadata.get(key))
    }

    pub fn status_comment(&self) -> Option<&str> {
        self.metadata
            .get(STATUS_COMMENT_KEY)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn has_connection(&self, kind: ConnectionKind) -> bool {
        kind.count(&self.connections) > 0
    }

    pub fn has_invoice(&self, kind: InvoiceKind) -> bool {
        kind.count(&self.invoices) > 0
    }
}

/// A record candidate sent to create / bulk-import (no identifier yet)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    #[serde(rename = "nome")]
    pub name: Option<String>,
    pub document_type: DocumentType,
    pub document_number: String,
    pub region: String,
    pub status: RecordStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub financial_status: Option<String>,
    #[serde(flatten)]
    pub connections: ConnectionCounters,
    #[serde(flatten)]
    pub invoices: InvoiceCounters,
    pub tags: Vec<String>,
    #[serde(rename = "metadata_info")]
    pub metadata: Map<String, Value>,
}

/// Partial update; only the populated fields are sent.
///
/// Document type, document number and region are fixed once a record exists,
/// so they have no place here.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordUpdate {
    #[serde(rename = "nome", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connections: Option<ConnectionCounters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoices: Option<InvoiceCounters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(rename = "metadata_info", skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl RecordUpdate {
    pub fn status(status: RecordStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Flatten into the JSON body expected by the store
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        if let Ok(Value::Object(fields)) = serde_json::to_value(self) {
            for (key, value) in fields {
                match (key.as_str(), value) {
                    ("connections" | "invoices", Value::Object(inner)) => body.extend(inner),
                    (_, value) => {
                        body.insert(key, value);
                    }
                }
            }
        }
        Value::Object(body)
    }
}

/// Split a comma-separated tag list, dropping blanks
pub fn split_tags(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
