use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tdm::data::filter::{FilterSet, FilteredView};
use tdm::data::record::{DocumentType, Record, RecordStatus};
use serde_json::json;

fn create_test_data(rows: usize) -> Vec<Record> {
    let regions = [
        "Bahia",
        "Brasília",
        "Mato Grosso do Sul",
        "Pernambuco",
        "Rio Grande do Norte",
        "São Paulo",
    ];

    (0..rows)
        .map(|i| {
            let mut record = Record::new(i as i64 + 1, DocumentType::Cpf, &format!("{:011}", i));
            record.name = Some(format!("Cliente {}", i));
            record.region = regions[i % regions.len()].to_string();
            record.status = RecordStatus::ALL[i % RecordStatus::ALL.len()].clone();
            record.connections.uc_ligada = (i % 3) as u32;
            record.invoices.fat_vencidas = (i % 5) as u32;
            record.tags = vec!["com_luz".into(), format!("lote_{}", i % 10)];
            record
                .metadata
                .insert("plano".into(), json!(format!("Plano {}", i % 7)));
            record
        })
        .collect()
}

fn benchmark_text_filters(c: &mut Criterion) {
    let records_10k = create_test_data(10_000);
    let records_100k = create_test_data(100_000);

    let mut group = c.benchmark_group("filter_text");

    group.bench_function("name_10k", |b| {
        let filters = FilterSet::new().with("nome", "cliente 99");
        b.iter(|| FilteredView::compute(black_box(&records_10k), &filters));
    });

    group.bench_function("name_100k", |b| {
        let filters = FilterSet::new().with("nome", "cliente 99");
        b.iter(|| FilteredView::compute(black_box(&records_100k), &filters));
    });

    group.bench_function("metadata_100k", |b| {
        let filters = FilterSet::new().with("plano", "plano 3");
        b.iter(|| FilteredView::compute(black_box(&records_100k), &filters));
    });

    group.finish();
}

fn benchmark_combined_filters(c: &mut Criterion) {
    let records_100k = create_test_data(100_000);

    let mut group = c.benchmark_group("filter_combined");

    group.bench_function("region_status_flag", |b| {
        let filters = FilterSet::new()
            .with("region", "Bahia")
            .with("status", "AVAILABLE")
            .with("fat_counters", "TEM_VENCIDA");
        b.iter(|| FilteredView::compute(black_box(&records_100k), &filters));
    });

    group.finish();
}

criterion_group!(benches, benchmark_text_filters, benchmark_combined_filters);
criterion_main!(benches);
