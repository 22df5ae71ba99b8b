use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::record::{DocumentType, Record, RecordStatus};

/// Aggregates handed to the chart collaborator, recomputed from the full
/// record set on every data change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub available: usize,
    pub in_use: usize,
    /// Records with at least one overdue invoice
    pub overdue: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_region: BTreeMap<String, usize>,
    pub by_document_type: BTreeMap<String, usize>,
    pub uc_ligada: u64,
    pub uc_desligada: u64,
    pub uc_suspensa: u64,
    pub fat_vencidas: u64,
    pub fat_a_vencer: u64,
    pub fat_pagas: u64,
    pub with_boleto_unico: usize,
    pub with_multifaturas: usize,
    pub with_renegociacao: usize,
}

impl DashboardStats {
    pub fn compute(records: &[Record]) -> Self {
        let mut stats = Self {
            total: records.len(),
            ..Self::default()
        };
        for status in RecordStatus::ALL {
            stats.by_status.insert(status.as_str().to_string(), 0);
        }
        for doc_type in [DocumentType::Cpf, DocumentType::Cnpj] {
            stats.by_document_type.insert(doc_type.to_string(), 0);
        }

        for record in records {
            match record.status {
                RecordStatus::Available => stats.available += 1,
                RecordStatus::InUse => stats.in_use += 1,
                _ => {}
            }
            *stats
                .by_status
                .entry(record.status.as_str().to_string())
                .or_default() += 1;

            let region = if record.region.is_empty() {
                "-"
            } else {
                record.region.as_str()
            };
            *stats.by_region.entry(region.to_string()).or_default() += 1;
            *stats
                .by_document_type
                .entry(record.document_type.to_string())
                .or_default() += 1;

            let c = &record.connections;
            stats.uc_ligada += u64::from(c.uc_ligada);
            stats.uc_desligada += u64::from(c.uc_desligada);
            stats.uc_suspensa += u64::from(c.uc_suspensa);

            let inv = &record.invoices;
            if inv.fat_vencidas > 0 {
                stats.overdue += 1;
            }
            stats.fat_vencidas += u64::from(inv.fat_vencidas);
            stats.fat_a_vencer += u64::from(inv.fat_a_vencer);
            stats.fat_pagas += u64::from(inv.fat_pagas);
            if inv.fat_boleto_unico > 0 {
                stats.with_boleto_unico += 1;
            }
            if inv.fat_multifaturas > 0 {
                stats.with_multifaturas += 1;
            }
            if inv.fat_renegociacao > 0 {
                stats.with_renegociacao += 1;
            }
        }
        stats
    }
}
