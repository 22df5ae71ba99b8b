//! Column schema registry
//!
//! The table schema is partly fixed (the columns every record has) and
//! partly user-defined: custom columns live in the display settings and
//! their values are stored in each record's metadata map.

pub mod slug;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

pub use slug::{compact_slug, key_slug};

pub const ID_KEY: &str = "id";
pub const NAME_KEY: &str = "nome";
pub const DOCUMENT_NUMBER_KEY: &str = "document_number";
pub const DOCUMENT_TYPE_KEY: &str = "document_type";
pub const REGION_KEY: &str = "region";
pub const STATUS_KEY: &str = "status";
pub const UC_COUNTERS_KEY: &str = "uc_counters";
pub const FAT_COUNTERS_KEY: &str = "fat_counters";
pub const TAGS_KEY: &str = "tags";
pub const ACTIONS_KEY: &str = "actions";

/// Keys that stay at the end of the default order; new custom columns are
/// inserted right before them.
pub const RESERVED_TRAILING_KEYS: [&str; 2] = [TAGS_KEY, ACTIONS_KEY];

/// One entry of an enumerated filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
}

const fn opt(value: &'static str, label: &'static str) -> SelectOption {
    SelectOption { value, label }
}

/// How a column can be filtered from the header filter row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    None,
    Text,
    Select(&'static [SelectOption]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedColumn {
    pub key: &'static str,
    pub label: &'static str,
    pub filter: FilterKind,
}

pub const DOCUMENT_TYPE_OPTIONS: &[SelectOption] = &[opt("CPF", "CPF"), opt("CNPJ", "CNPJ")];

pub const REGION_OPTIONS: &[SelectOption] = &[
    opt("Bahia", "Bahia"),
    opt("Brasília", "Brasília"),
    opt("Mato Grosso do Sul", "Mato Grosso do Sul"),
    opt("Pernambuco", "Pernambuco"),
    opt("Rio Grande do Norte", "Rio Grande do Norte"),
    opt("São Paulo", "São Paulo"),
];

pub const STATUS_OPTIONS: &[SelectOption] = &[
    opt("AVAILABLE", "Disponível"),
    opt("IN_USE", "Em Uso"),
    opt("CONSUMED", "Consumido"),
    opt("BLOCKED", "Bloqueado"),
];

pub const UC_FLAG_OPTIONS: &[SelectOption] = &[
    opt("TEM_LIGADA", "Com Ligada"),
    opt("TEM_DESLIGADA", "Com Desligada"),
    opt("TEM_SUSPENSA", "Com Suspensa"),
];

pub const FAT_FLAG_OPTIONS: &[SelectOption] = &[
    opt("TEM_VENCIDA", "Com Vencida"),
    opt("TEM_A_VENCER", "Com A Vencer"),
    opt("TEM_PAGA", "Com Paga"),
    opt("TEM_BOLETO", "Com Boleto Único"),
    opt("TEM_MULTI", "Com Multifatura"),
    opt("TEM_RENEG", "Com Renegociação"),
];

/// The fixed columns in their default display order
pub const FIXED_COLUMNS: &[FixedColumn] = &[
    FixedColumn { key: ID_KEY, label: "ID", filter: FilterKind::Text },
    FixedColumn { key: NAME_KEY, label: "NOME", filter: FilterKind::Text },
    FixedColumn { key: DOCUMENT_NUMBER_KEY, label: "DOCUMENTO", filter: FilterKind::Text },
    FixedColumn {
        key: DOCUMENT_TYPE_KEY,
        label: "TIPO",
        filter: FilterKind::Select(DOCUMENT_TYPE_OPTIONS),
    },
    FixedColumn { key: REGION_KEY, label: "REGIÃO", filter: FilterKind::Select(REGION_OPTIONS) },
    FixedColumn {
        key: STATUS_KEY,
        label: "STATUS TDM",
        filter: FilterKind::Select(STATUS_OPTIONS),
    },
    FixedColumn {
        key: UC_COUNTERS_KEY,
        label: "STATUS UC",
        filter: FilterKind::Select(UC_FLAG_OPTIONS),
    },
    FixedColumn {
        key: FAT_COUNTERS_KEY,
        label: "FATURAS",
        filter: FilterKind::Select(FAT_FLAG_OPTIONS),
    },
    FixedColumn { key: TAGS_KEY, label: "TAGS", filter: FilterKind::Text },
    FixedColumn { key: ACTIONS_KEY, label: "AÇÕES", filter: FilterKind::None },
];

pub fn fixed_column(key: &str) -> Option<&'static FixedColumn> {
    FIXED_COLUMNS.iter().find(|c| c.key == key)
}

pub fn is_fixed_key(key: &str) -> bool {
    fixed_column(key).is_some()
}

pub fn fixed_keys() -> impl Iterator<Item = &'static str> {
    FIXED_COLUMNS.iter().map(|c| c.key)
}

/// Value type of a user-defined column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomValueType {
    #[default]
    Text,
    Number,
    Date,
    #[serde(alias = "tags")]
    Tag,
}

impl CustomValueType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "number" => Some(Self::Number),
            "date" => Some(Self::Date),
            "tag" | "tags" => Some(Self::Tag),
            _ => None,
        }
    }
}

/// A user-defined column whose values live in record metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomColumn {
    pub name: String,
    pub key: String,
    #[serde(rename = "type", default)]
    pub value_type: CustomValueType,
}

impl CustomColumn {
    /// Build a column definition, deriving the key from the name.
    ///
    /// Fails when the name produces an empty key or collides with a fixed
    /// key or an already defined custom key.
    pub fn new(
        name: &str,
        value_type: CustomValueType,
        existing: &[CustomColumn],
    ) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(anyhow!("Column name cannot be empty"));
        }

        let key = key_slug(name);
        if key.chars().all(|c| c == '_') {
            return Err(anyhow!("Column name '{}' does not produce a usable key", name));
        }
        if is_fixed_key(&key) {
            return Err(anyhow!("Column key '{}' is reserved by a fixed column", key));
        }
        if existing.iter().any(|c| c.key == key) {
            return Err(anyhow!("A column with key '{}' already exists", key));
        }

        Ok(Self {
            name: name.to_string(),
            key,
            value_type,
        })
    }

    /// Header filter kind; only text-like custom columns get an input
    pub fn filter_kind(&self) -> FilterKind {
        match self.value_type {
            CustomValueType::Text | CustomValueType::Tag => FilterKind::Text,
            CustomValueType::Number | CustomValueType::Date => FilterKind::None,
        }
    }
}

/// A display-order key resolved against the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRef<'a> {
    Fixed(&'static FixedColumn),
    Custom(&'a CustomColumn),
    /// A key with no definition (stale settings); rendered with the raw key
    Orphan(&'a str),
}

impl<'a> ColumnRef<'a> {
    pub fn resolve(key: &'a str, custom_columns: &'a [CustomColumn]) -> Self {
        if let Some(fixed) = fixed_column(key) {
            return ColumnRef::Fixed(fixed);
        }
        match custom_columns.iter().find(|c| c.key == key) {
            Some(custom) => ColumnRef::Custom(custom),
            None => ColumnRef::Orphan(key),
        }
    }

    pub fn key(&self) -> &'a str {
        match self {
            ColumnRef::Fixed(f) => f.key,
            ColumnRef::Custom(c) => &c.key,
            ColumnRef::Orphan(k) => k,
        }
    }

    /// Label shown in the table header
    pub fn header_label(&self) -> String {
        match self {
            ColumnRef::Fixed(f) => f.label.to_string(),
            ColumnRef::Custom(c) => c.name.to_uppercase(),
            ColumnRef::Orphan(k) => k.to_string(),
        }
    }

    /// Label written to exported files
    pub fn export_label(&self) -> String {
        match self {
            ColumnRef::Fixed(f) => f.label.to_string(),
            ColumnRef::Custom(c) => c.name.clone(),
            ColumnRef::Orphan(k) => k.to_string(),
        }
    }

    pub fn filter_kind(&self) -> FilterKind {
        match self {
            ColumnRef::Fixed(f) => f.filter,
            ColumnRef::Custom(c) => c.filter_kind(),
            ColumnRef::Orphan(_) => FilterKind::None,
        }
    }

    pub fn is_custom(&self) -> bool {
        !matches!(self, ColumnRef::Fixed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_columns_end_with_reserved_keys() {
        let keys: Vec<&str> = fixed_keys().collect();
        assert_eq!(&keys[keys.len() - 2..], &RESERVED_TRAILING_KEYS);
    }

    #[test]
    fn test_custom_column_key_is_slugged() {
        let col = CustomColumn::new("Data de Corte", CustomValueType::Date, &[]).unwrap();
        assert_eq!(col.key, "data_de_corte");
        assert_eq!(col.name, "Data de Corte");
    }

    #[test]
    fn test_custom_column_collisions_are_rejected() {
        let existing = vec![CustomColumn::new("Contrato", CustomValueType::Text, &[]).unwrap()];
        assert!(CustomColumn::new("contrato", CustomValueType::Text, &existing).is_err());
        assert!(CustomColumn::new("Contrató", CustomValueType::Number, &existing).is_err());
        assert!(CustomColumn::new("Status", CustomValueType::Text, &[]).is_err());
        assert!(CustomColumn::new("   ", CustomValueType::Text, &[]).is_err());
        assert!(CustomColumn::new("!!!", CustomValueType::Text, &[]).is_err());
    }

    #[test]
    fn test_resolve_falls_back_to_raw_key() {
        let customs = vec![CustomColumn::new("Lote", CustomValueType::Text, &[]).unwrap()];
        assert_eq!(ColumnRef::resolve("lote", &customs).header_label(), "LOTE");
        assert_eq!(ColumnRef::resolve("lote", &customs).export_label(), "Lote");
        assert_eq!(ColumnRef::resolve("region", &customs).header_label(), "REGIÃO");
        let orphan = ColumnRef::resolve("gone_column", &customs);
        assert_eq!(orphan, ColumnRef::Orphan("gone_column"));
        assert_eq!(orphan.header_label(), "gone_column");
        assert_eq!(orphan.filter_kind(), FilterKind::None);
    }

    #[test]
    fn test_custom_value_type_serde() {
        let col: CustomColumn =
            serde_json::from_str(r#"{"name":"Etiquetas","key":"etiquetas","type":"tag"}"#).unwrap();
        assert_eq!(col.value_type, CustomValueType::Tag);
        let col: CustomColumn = serde_json::from_str(r#"{"name":"Obs","key":"obs"}"#).unwrap();
        assert_eq!(col.value_type, CustomValueType::Text);
    }
}
