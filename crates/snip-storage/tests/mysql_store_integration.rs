use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};
use snip_core::{NewUrlRecord, ShortCode};
use snip_storage::{MySqlStore, ReadStore, StorageError, UrlStore};
use snip_test_infra::mysql::{MySqlServer, MysqlConfig};

struct Fixture {
    _mysql: MySqlServer,
    store: MySqlStore,
}

impl Fixture {
    async fn start() -> Self {
        let mysql = MySqlServer::new(MysqlConfig::builder().build())
            .await
            .expect("start mysql");
        let pool = mysql.pool().await.expect("connect mysql");
        let store = MySqlStore::new(pool);
        store.ensure_schema().await.expect("create schema");

        Self {
            _mysql: mysql,
            store,
        }
    }
}

fn code(value: &str) -> ShortCode {
    ShortCode::new_unchecked(value)
}

fn truncate_to_micros(ts: Timestamp) -> Timestamp {
    Timestamp::from_microsecond(ts.as_microsecond()).unwrap()
}

fn new_record(short_code: &str, url: &str, expires_at: Option<Timestamp>) -> NewUrlRecord {
    NewUrlRecord {
        original_url: url.to_string(),
        short_code: code(short_code),
        created_at: Timestamp::now(),
        expires_at,
    }
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn insert_and_find_record() {
    let fixture = Fixture::start().await;
    let expires_at = Timestamp::now() + SignedDuration::from_hours(24);
    let new = new_record("abc1234", "https://example.com", Some(expires_at));

    let stored = fixture.store.insert(new.clone()).await.unwrap();
    assert!(stored.id > 0);
    assert_eq!(stored.click_count, 0);

    let found = fixture.store.find_by_code(&code("abc1234")).await.unwrap().unwrap();
    assert_eq!(found.id, stored.id);
    assert_eq!(found.original_url, "https://example.com");
    assert_eq!(found.created_at, truncate_to_micros(new.created_at));
    assert_eq!(found.expires_at, Some(truncate_to_micros(expires_at)));
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn find_returns_none_for_unknown_code() {
    let fixture = Fixture::start().await;

    assert!(fixture.store.find_by_code(&code("missing")).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn insert_conflicts_when_code_already_exists() {
    let fixture = Fixture::start().await;

    fixture
        .store
        .insert(new_record("abc1234", "https://one.example", None))
        .await
        .unwrap();

    let err = fixture
        .store
        .insert(new_record("abc1234", "https://two.example", None))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Conflict(_)));
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn codes_differing_only_in_case_are_distinct() {
    let fixture = Fixture::start().await;

    fixture
        .store
        .insert(new_record("abcdefg", "https://lower.example", None))
        .await
        .unwrap();
    fixture
        .store
        .insert(new_record("ABCDEFG", "https://upper.example", None))
        .await
        .unwrap();

    let upper = fixture.store.find_by_code(&code("ABCDEFG")).await.unwrap().unwrap();
    assert_eq!(upper.original_url, "https://upper.example");
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn find_by_original_url_returns_first_record() {
    let fixture = Fixture::start().await;

    let first = fixture
        .store
        .insert(new_record("first01", "https://dup.example", None))
        .await
        .unwrap();
    fixture
        .store
        .insert(new_record("second2", "https://dup.example", None))
        .await
        .unwrap();

    let found = fixture
        .store
        .find_by_original_url("https://dup.example")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, first.id);
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn increment_unknown_code_is_not_found() {
    let fixture = Fixture::start().await;

    let err = fixture
        .store
        .increment_click_count(&code("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn concurrent_increments_are_not_lost() {
    let fixture = Fixture::start().await;
    fixture
        .store
        .insert(new_record("hot0001", "https://example.com", None))
        .await
        .unwrap();

    let store = Arc::new(fixture.store.clone());
    let mut handles = vec![];
    for _ in 0..50 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.increment_click_count(&code("hot0001")).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let found = fixture.store.find_by_code(&code("hot0001")).await.unwrap().unwrap();
    assert_eq!(found.click_count, 50);
}
