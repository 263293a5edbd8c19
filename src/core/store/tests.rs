use super::*;
use crate::core::document::MilestoneDates;
use tempfile::tempdir;

fn sample(id: &str, stt: i64, doc_no: &str, discipline: &str) -> Document {
    Document {
        id: id.to_string(),
        stt,
        document_no: doc_no.to_string(),
        title: format!("{} title", doc_no),
        revision: "A".to_string(),
        discipline: discipline.to_string(),
        scope: "PTSC".to_string(),
        table: "T1".to_string(),
        status: "Not yet issued".to_string(),
        plan_dates: MilestoneDates {
            ifi: Some("2025-10-01".to_string()),
            ifa: Some("45835".to_string()),
            ..Default::default()
        },
        actual_dates: MilestoneDates {
            ifi: Some("2025-10-05".to_string()),
            ..Default::default()
        },
        pic_ptsc: Some("Hung".to_string()),
        is_overdue: true,
        is_critical: true,
        ..Default::default()
    }
}

#[test]
fn test_store_creation() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join(".mdi/mdi.db");
    let store = DocumentStore::open(&path).unwrap();

    assert!(path.exists());
    let stats = store.stats().unwrap();
    assert_eq!(stats.total_documents, 0);
    assert!(stats.last_import.is_none());
    assert!(stats.last_source.is_none());
}

#[test]
fn test_stored_row_round_trip() {
    let doc = sample("a", 1, "DOC-001", "EE");
    let row = StoredRow::from(&doc);

    assert_eq!(row.table_name, "T1");
    assert_eq!(row.plan[0].as_deref(), Some("2025-10-01"));
    assert_eq!(row.plan[2].as_deref(), Some("45835"));
    assert_eq!(row.plan[1], None);
    assert_eq!(row.actual[0].as_deref(), Some("2025-10-05"));
    assert_eq!(row.is_overdue, 1);

    assert_eq!(StoredRow::from(&Document::from(row.clone())), row);
    assert_eq!(Document::from(row), doc);
}

#[test]
fn test_replace_all_and_load_in_stt_order() {
    let mut store = DocumentStore::open_in_memory().unwrap();
    let docs = vec![
        sample("c", 3, "DOC-003", "PL"),
        sample("a", 1, "DOC-001", "EE"),
        sample("b", 2, "DOC-002", "EE"),
    ];
    assert_eq!(store.replace_all(&docs).unwrap(), 3);

    let loaded = store.load_all().unwrap();
    let ids: Vec<_> = loaded.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(loaded[0], docs[1]);
}

#[test]
fn test_replace_all_discards_previous_corpus() {
    let mut store = DocumentStore::open_in_memory().unwrap();
    store
        .replace_all(&[sample("a", 1, "DOC-001", "EE"), sample("b", 2, "DOC-002", "EE")])
        .unwrap();
    store.replace_all(&[sample("z", 1, "DOC-900", "PL")]).unwrap();

    let loaded = store.load_all().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, "z");
}

#[test]
fn test_shared_id_counts_what_was_stored() {
    let mut store = DocumentStore::open_in_memory().unwrap();
    let saved = store
        .replace_all(&[
            sample("P:/a.pdf", 1, "DOC-001", "EE"),
            sample("P:/a.pdf", 2, "DOC-001-R", "EE"),
            sample("P:/b.pdf", 3, "DOC-002", "EE"),
        ])
        .unwrap();

    assert_eq!(saved, 2);
    assert_eq!(store.count().unwrap(), 2);
    // The later row wins
    assert_eq!(store.get("P:/a.pdf").unwrap().unwrap().document_no, "DOC-001-R");
}

#[test]
fn test_upsert_keeps_existing_rows() {
    let mut store = DocumentStore::open_in_memory().unwrap();
    store
        .replace_all(&[sample("a", 1, "DOC-001", "EE"), sample("b", 2, "DOC-002", "EE")])
        .unwrap();

    let mut changed = sample("b", 2, "DOC-002", "EE");
    changed.status = "Approved".to_string();
    store.upsert(&[changed, sample("c", 3, "DOC-003", "CV")]).unwrap();

    let loaded = store.load_all().unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded[1].status, "Approved");
}

#[test]
fn test_get_by_id_or_document_number() {
    let mut store = DocumentStore::open_in_memory().unwrap();
    store.replace_all(&[sample("a", 1, "DOC-001", "EE")]).unwrap();

    assert_eq!(store.get("a").unwrap().unwrap().document_no, "DOC-001");
    assert_eq!(store.get("doc-001").unwrap().unwrap().id, "a");
    assert!(store.get("missing").unwrap().is_none());
}

#[test]
fn test_stats_and_import_record() {
    let tmp = tempdir().unwrap();
    let mut store = DocumentStore::open(&tmp.path().join("mdi.db")).unwrap();
    store
        .replace_all(&[
            sample("a", 1, "DOC-001", "EE"),
            sample("b", 2, "DOC-002", "EE"),
            sample("c", 3, "DOC-003", ""),
        ])
        .unwrap();
    store.record_import("mdi.csv", &fingerprint(b"abc")).unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.total_documents, 3);
    assert!(stats.last_import.is_some());
    assert_eq!(stats.by_discipline[0], NamedCount { name: "EE".to_string(), count: 2 });
    assert_eq!(stats.by_discipline[1], NamedCount { name: "Other".to_string(), count: 1 });

    let record = stats.last_source.unwrap();
    assert_eq!(record.source, "mdi.csv");
    assert_eq!(
        record.sha256,
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn test_clear() {
    let mut store = DocumentStore::open_in_memory().unwrap();
    store.replace_all(&[sample("a", 1, "DOC-001", "EE")]).unwrap();
    store.record_import("x.csv", "00").unwrap();

    assert_eq!(store.clear().unwrap(), 1);
    assert_eq!(store.count().unwrap(), 0);
    assert!(store.last_import().unwrap().is_none());
}

#[test]
fn test_reopen_persists() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("mdi.db");
    {
        let mut store = DocumentStore::open(&path).unwrap();
        store.replace_all(&[sample("a", 1, "DOC-001", "EE")]).unwrap();
    }
    let store = DocumentStore::open(&path).unwrap();
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn test_schema_version_mismatch_rebuilds() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("mdi.db");
    {
        let mut store = DocumentStore::open(&path).unwrap();
        store.replace_all(&[sample("a", 1, "DOC-001", "EE")]).unwrap();
        store
            .conn
            .execute("UPDATE schema_version SET version = 0", [])
            .unwrap();
    }
    let store = DocumentStore::open(&path).unwrap();
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_null_text_columns_read_as_empty() {
    let store = DocumentStore::open_in_memory().unwrap();
    store
        .conn
        .execute(
            "INSERT INTO documents (id, stt, documentNo) VALUES ('x', NULL, 'DOC-X')",
            [],
        )
        .unwrap();

    let doc = store.get("x").unwrap().unwrap();
    assert_eq!(doc.stt, 0);
    assert_eq!(doc.title, "");
    assert!(!doc.is_overdue);
}
