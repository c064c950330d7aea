mod common;

use chrono::{Duration, Local, TimeZone, Utc};
use lexchat::config::CacheConfig;
use lexchat::message::Message;
use lexchat::storage::KeyValueStorage;
use lexchat::store::{ConversationStore, RecencyBucket, WriteOutcome};

#[test]
fn test_eleventh_session_evicts_first_inserted() {
    let (storage, _tmp) = common::create_temp_storage();
    let store = ConversationStore::new(storage);

    for i in 0..10 {
        let outcome = store.save_messages(&format!("s-{}", i), &common::exchange("q", "a"));
        assert_eq!(outcome, WriteOutcome::Written);
    }

    let outcome = store.save_messages("s-10", &common::exchange("q", "a"));
    assert_eq!(
        outcome,
        WriteOutcome::WrittenAfterEviction {
            evicted: vec!["s-0".to_string()]
        }
    );
    assert!(store.load_messages("s-0").is_none());
    for i in 1..=10 {
        assert!(store.load_messages(&format!("s-{}", i)).is_some());
    }
}

#[test]
fn test_resaving_a_session_keeps_its_eviction_position() {
    let (storage, _tmp) = common::create_temp_storage();
    let store = ConversationStore::new(storage);

    for i in 0..10 {
        store.save_messages(&format!("s-{}", i), &common::exchange("q", "a"));
    }
    // Updating the oldest session does not make it newer.
    let mut longer = common::exchange("q", "a");
    longer.extend(common::exchange("q2", "a2"));
    store.save_messages("s-0", &longer);

    store.save_messages("s-10", &common::exchange("q", "a"));
    assert!(store.load_messages("s-0").is_none());
    assert!(store.load_messages("s-1").is_some());
}

#[test]
fn test_messages_survive_reopen() {
    let (storage, tmp) = common::create_temp_storage();
    let db_path = storage.db_path().to_path_buf();
    let stamp = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
    {
        let mut store = ConversationStore::new(storage);
        store.add_conversation("s-1", "Cuti melahirkan");
        store.save_messages(
            "s-1",
            &[
                Message::user("Berapa lama cuti melahirkan?").with_timestamp(stamp),
                Message::assistant("Tiga bulan [1].").with_timestamp(stamp),
            ],
        );
    }

    let reopened = lexchat::storage::SqliteStorage::new_with_path(db_path).unwrap();
    let store = ConversationStore::new(reopened);
    let messages = store.load_messages("s-1").expect("messages cached");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "Tiga bulan [1].");
    assert_eq!(messages[1].timestamp, stamp);
    assert_eq!(store.get_conversation("s-1").unwrap().title, "Cuti melahirkan");
    drop(tmp);
}

#[test]
fn test_quota_failure_retries_with_fewer_sessions() {
    let (storage, _tmp) = common::create_temp_storage();
    let storage = storage.with_quota(Some(2600));
    let config = CacheConfig {
        quota_retry_sessions: 2,
        ..Default::default()
    };
    let store = ConversationStore::with_config(storage, config);
    let body = "x".repeat(1000);

    assert_eq!(
        store.save_messages("s-0", &[Message::user(body.clone())]),
        WriteOutcome::Written
    );
    assert_eq!(
        store.save_messages("s-1", &[Message::user(body.clone())]),
        WriteOutcome::Written
    );
    assert_eq!(
        store.save_messages("s-2", &[Message::user(body.clone())]),
        WriteOutcome::WrittenAfterEviction {
            evicted: vec!["s-0".to_string()]
        }
    );

    assert!(store.load_messages("s-0").is_none());
    assert!(store.load_messages("s-1").is_some());
    assert!(store.load_messages("s-2").is_some());
}

#[test]
fn test_failed_retry_leaves_previous_cache_intact() {
    let (storage, _tmp) = common::create_temp_storage();
    let storage = storage.with_quota(Some(2600));
    let store = ConversationStore::new(storage);

    store.save_messages("s-0", &[Message::user("kecil")]);
    let outcome = store.save_messages("s-1", &[Message::user("x".repeat(5000))]);

    assert!(matches!(outcome, WriteOutcome::Failed { .. }));
    assert!(store.load_messages("s-0").is_some());
    assert!(store.load_messages("s-1").is_none());
}

#[test]
fn test_delete_removes_index_entry_and_messages() {
    let (storage, _tmp) = common::create_temp_storage();
    let mut store = ConversationStore::new(storage);

    store.add_conversation("s-1", "Pesangon");
    store.add_conversation("s-2", "Lembur");
    store.save_messages("s-1", &common::exchange("q", "a"));
    store.save_messages("s-2", &common::exchange("q", "a"));

    store.delete_conversation("s-1");

    let ids: Vec<String> = store.list().into_iter().map(|c| c.id).collect();
    assert_eq!(ids, vec!["s-2".to_string()]);
    assert!(store.load_messages("s-1").is_none());
    assert!(store.load_messages("s-2").is_some());
}

#[test]
fn test_corrupted_records_read_as_empty() {
    let (storage, _tmp) = common::create_temp_storage();
    let config = CacheConfig::default();
    storage.set(&config.conversations_key, "{not json").unwrap();
    storage.set(&config.messages_key, "[1, 2, 3]").unwrap();

    let mut store = ConversationStore::with_config(storage, config);
    assert!(store.list().is_empty());
    assert!(store.load_messages("s-1").is_none());

    store.add_conversation("s-1", "Mulai lagi");
    assert_eq!(store.list().len(), 1);
}

#[test]
fn test_grouping_over_persisted_index() {
    let (storage, _tmp) = common::create_temp_storage();
    let mut store = ConversationStore::new(storage);
    store.add_conversation("s-1", "Hari ini");

    let now = Local::now();
    let groups = store.list_grouped_at(&now);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].label, RecencyBucket::Today);

    let groups = store.list_grouped_at(&(now + Duration::days(30)));
    assert_eq!(groups[0].label, RecencyBucket::Older);
}
