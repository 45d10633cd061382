//! Unit tests for `JsonlJournal`.
//!
//! Validates directory creation, one file per instance, sequence numbers
//! that survive a reopen, flattened record fields, and concurrent writes.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use shipment_watch::journal::writer::JsonlJournal;
use shipment_watch::journal::{JournalRecord, LogJournal};
use shipment_watch::models::log::{LogEntry, Severity};

fn read_records(path: &Path) -> Vec<JournalRecord> {
    fs::read_to_string(path)
        .expect("journal file")
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid json line"))
        .collect()
}

#[test]
fn new_creates_directory_if_missing() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path().join("nested").join("journal");
    assert!(!dir.exists());

    JsonlJournal::new(dir.clone()).expect("constructor creates the directory");
    assert!(dir.is_dir());
}

#[test]
fn file_name_is_the_sanitized_instance_id() {
    let temp = tempfile::tempdir().expect("tempdir");
    let journal = JsonlJournal::new(temp.path().to_path_buf()).expect("journal");

    assert_eq!(
        journal.path_for("ship-42_a"),
        temp.path().join("ship-42_a.jsonl")
    );
    assert_eq!(
        journal.path_for("../etc/passwd"),
        temp.path().join("___etc_passwd.jsonl")
    );
}

#[test]
fn each_instance_gets_its_own_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let journal = JsonlJournal::new(temp.path().to_path_buf()).expect("journal");

    journal
        .record("ship-1", &LogEntry::new(Severity::Info, "Status changed to PACKAGED (Warehouse)"))
        .expect("ship-1 write");
    journal
        .record("ship-2", &LogEntry::new(Severity::Info, "Status changed to ORDER_RECEIVED (Order Received)"))
        .expect("ship-2 write");
    journal
        .record("ship-1", &LogEntry::new(Severity::Human, "Decision submitted: Accept delay"))
        .expect("ship-1 second write");

    let first = read_records(&journal.path_for("ship-1"));
    assert_eq!(first.len(), 2);
    assert!(first.iter().all(|record| record.instance_id == "ship-1"));
    assert_eq!(first[0].entry.severity, Severity::Info);
    assert_eq!(first[1].entry.message, "Decision submitted: Accept delay");
    assert_eq!(
        first.iter().map(|record| record.seq).collect::<Vec<_>>(),
        [0, 1]
    );

    let second = read_records(&journal.path_for("ship-2"));
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].seq, 0);
}

#[test]
fn sequence_continues_after_reopening() {
    let temp = tempfile::tempdir().expect("tempdir");
    {
        let journal = JsonlJournal::new(temp.path().to_path_buf()).expect("journal");
        for message in ["first", "second"] {
            journal
                .record("ship-7", &LogEntry::new(Severity::Info, message))
                .expect("write");
        }
    }

    let reopened = JsonlJournal::new(temp.path().to_path_buf()).expect("reopened");
    reopened
        .record("ship-7", &LogEntry::new(Severity::Success, "Shipment delivered"))
        .expect("write after reopen");

    let records = read_records(&reopened.path_for("ship-7"));
    assert_eq!(
        records
            .iter()
            .map(|record| (record.seq, record.entry.message.as_str()))
            .collect::<Vec<_>>(),
        [(0, "first"), (1, "second"), (2, "Shipment delivered")]
    );
}

#[test]
fn record_fields_are_flattened() {
    let temp = tempfile::tempdir().expect("tempdir");
    let journal = JsonlJournal::new(temp.path().to_path_buf()).expect("journal");
    journal
        .record("ship-9", &LogEntry::new(Severity::Warning, "MINOR_DELAY: late truck"))
        .expect("write");

    let raw = fs::read_to_string(journal.path_for("ship-9")).expect("read");
    let value: serde_json::Value = serde_json::from_str(raw.trim()).expect("json");
    assert_eq!(value["instance_id"], "ship-9");
    assert_eq!(value["seq"], 0);
    assert_eq!(value["severity"], "warning");
    assert_eq!(value["message"], "MINOR_DELAY: late truck");
    assert!(value["timestamp"].is_string());
}

#[test]
fn concurrent_writes_keep_per_instance_sequences_dense() {
    let temp = tempfile::tempdir().expect("tempdir");
    let journal = Arc::new(JsonlJournal::new(temp.path().to_path_buf()).expect("journal"));

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let journal = Arc::clone(&journal);
            std::thread::spawn(move || {
                for n in 0..25 {
                    journal
                        .record(
                            &format!("ship-{}", worker % 2),
                            &LogEntry::new(Severity::Info, format!("entry {worker}-{n}")),
                        )
                        .expect("write");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer thread");
    }

    for instance in ["ship-0", "ship-1"] {
        let seqs: Vec<u64> = read_records(&journal.path_for(instance))
            .iter()
            .map(|record| record.seq)
            .collect();
        assert_eq!(seqs, (0..100).collect::<Vec<u64>>(), "{instance}");
    }
}
