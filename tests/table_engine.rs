use tdm::config::settings::DisplaySettings;
use tdm::data::csv_import::{detect_separator, parse_line};
use tdm::data::filter::{FilterSet, FilteredView};
use tdm::data::pagination::Pagination;
use tdm::data::record::{pad_document, DocumentType, Record, RecordStatus};
use tdm::schema::{CustomColumn, CustomValueType, ACTIONS_KEY, ID_KEY, NAME_KEY, TAGS_KEY};
use tdm::state::{reduce, Action, AppState};

fn records(n: i64) -> Vec<Record> {
    (1..=n)
        .map(|id| {
            let mut record = Record::new(id, DocumentType::Cpf, &format!("{:011}", id));
            record.name = Some(format!("Cliente {}", id));
            record.region = ["Bahia", "Pernambuco", "São Paulo"][(id % 3) as usize].to_string();
            record.status = RecordStatus::ALL[(id % 4) as usize].clone();
            record
        })
        .collect()
}

#[test]
fn test_filter_is_subset_and_identity_when_empty() {
    let records = records(40);
    let all = FilteredView::compute(&records, &FilterSet::new());
    assert_eq!(all.len(), records.len());
    assert!(!all.is_filtered());

    let filters = FilterSet::new()
        .with("region", "Bahia")
        .with("status", "BLOCKED");
    let view = FilteredView::compute(&records, &filters);
    assert!(view.len() < records.len());
    for record in view.records(&records) {
        assert!(records.contains(record));
        assert_eq!(record.region, "Bahia");
        assert_eq!(record.status, RecordStatus::Blocked);
    }
}

#[test]
fn test_connection_flag_scenario() {
    let mut first = Record::new(1, DocumentType::Cpf, "1");
    first.connections.uc_ligada = 2;
    let mut second = Record::new(2, DocumentType::Cpf, "2");
    second.connections.uc_desligada = 1;
    let third = Record::new(3, DocumentType::Cpf, "3");
    let records = vec![first, second, third];

    let view = FilteredView::compute(&records, &FilterSet::new().with("uc_counters", "TEM_LIGADA"));
    let ids: Vec<i64> = view.records(&records).map(|r| r.id).collect();
    assert_eq!(ids, vec![1]);
}

#[test]
fn test_pages_partition_the_view() {
    let items: Vec<usize> = (0..103).collect();
    for size in [10, 25, 50, 100] {
        let mut pagination = Pagination::new(size);
        let mut seen = Vec::new();
        let mut page = 1;
        loop {
            let slice = pagination.slice(&items);
            assert!(slice.len() <= size);
            seen.extend_from_slice(slice);
            page += 1;
            if !pagination.go_to(page, items.len()) {
                break;
            }
        }
        assert_eq!(seen, items);

        let before = pagination.current_page();
        assert!(!pagination.go_to(0, items.len()));
        assert!(!pagination.go_to(before + 1, items.len()));
        assert_eq!(pagination.current_page(), before);
    }
}

#[test]
fn test_page_clamps_when_filter_shrinks_view() {
    let state = AppState::new(DisplaySettings::with_defaults(), 10);
    let state = reduce(&state, Action::RecordsLoaded(records(60))).state;
    let state = reduce(&state, Action::GoToPage(6)).state;
    assert_eq!(state.pagination.current_page(), 6);

    let state = reduce(
        &state,
        Action::SetFilter {
            key: "nome".into(),
            value: "Cliente 6".into(),
        },
    )
    .state;
    assert_eq!(state.pagination.current_page(), 1);
    assert_eq!(state.view.len(), 2);

    let state = reduce(&state, Action::SetPageSize(50)).state;
    assert_eq!(state.pagination.page_size(), 50);
}

#[test]
fn test_reorder_is_a_pure_move() {
    let settings = DisplaySettings::with_defaults();
    let before = settings.column_order.clone();
    let moved = settings.move_column(TAGS_KEY, NAME_KEY).unwrap();

    let others_before: Vec<&String> = before.iter().filter(|k| *k != TAGS_KEY).collect();
    let others_after: Vec<&String> = moved.column_order.iter().filter(|k| *k != TAGS_KEY).collect();
    assert_eq!(others_before, others_after);
    let target_index = before.iter().position(|k| k == NAME_KEY).unwrap();
    assert_eq!(moved.column_order[target_index], TAGS_KEY);
}

#[test]
fn test_drag_gesture_moves_and_persists() {
    let state = AppState::new(DisplaySettings::with_defaults(), 25);
    let state = reduce(&state, Action::DragStart(NAME_KEY.into())).state;
    let transition = reduce(&state, Action::DropOn(ID_KEY.into()));
    assert_eq!(transition.state.settings.column_order[0], NAME_KEY);
    assert!(transition.state.drag_source.is_none());
    assert_eq!(transition.effects.len(), 1);
}

#[test]
fn test_hide_then_show_restores_position() {
    let settings = DisplaySettings::with_defaults();
    let hidden = settings.toggle_visibility(NAME_KEY);
    assert!(!hidden.visible_columns().iter().any(|c| c.key() == NAME_KEY));
    assert_eq!(hidden.column_order, settings.column_order);

    let shown = hidden.toggle_visibility(NAME_KEY);
    assert_eq!(shown.visible_columns(), settings.visible_columns());

    let all_hidden = settings.hide_all();
    let keys: Vec<&str> = all_hidden.visible_columns().iter().map(|c| c.key()).collect();
    assert_eq!(keys, vec![ACTIONS_KEY]);
    assert_eq!(all_hidden.show_all().visible_columns(), settings.visible_columns());
}

#[test]
fn test_custom_column_goes_before_trailing_columns() {
    let settings = DisplaySettings::with_defaults();
    let column = CustomColumn::new("Valor da Conta", CustomValueType::Number, &[]).unwrap();
    let settings = settings.add_custom_column(column).unwrap();
    let n = settings.column_order.len();
    assert_eq!(settings.column_order[n - 3], "valor_da_conta");
    assert_eq!(settings.column_order[n - 2], TAGS_KEY);
    assert_eq!(settings.column_order[n - 1], ACTIONS_KEY);

    let duplicate = CustomColumn::new("valor da conta", CustomValueType::Text, &settings.custom_columns);
    assert!(duplicate.is_err());
}

#[test]
fn test_document_padding_is_idempotent() {
    for (raw, ty) in [
        ("123", DocumentType::Cpf),
        ("123.456.789-01", DocumentType::Cpf),
        ("", DocumentType::Cnpj),
        ("12.345.678/0001-90", DocumentType::Cnpj),
    ] {
        let once = pad_document(raw, ty).unwrap();
        assert_eq!(once.len(), ty.digit_len());
        assert_eq!(pad_document(&once, ty).unwrap(), once);
    }
    assert_eq!(pad_document("123", DocumentType::Cpf).unwrap(), "00000000123");
}

#[test]
fn test_semicolon_header_scenario() {
    let header = "Tipo Doc;Documento;Nome;Região";
    assert_eq!(detect_separator(header), ';');
    assert_eq!(
        parse_line(header, ';'),
        vec!["Tipo Doc", "Documento", "Nome", "Região"]
    );
}
