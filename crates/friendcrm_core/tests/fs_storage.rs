use chrono::{NaiveDate, TimeZone, Utc};
use friendcrm_core::codec::{FriendRecord, InteractionRecord};
use friendcrm_core::{
    encode_friend, reconnect_soon_at, Friend, FsStorageDriver, Interaction, ListFriendsFilter,
    StorageDriver, StorageError,
};
use prost::Message;
use prost_types::Timestamp;
use std::sync::Arc;
use tempfile::TempDir;

async fn open_store() -> (TempDir, FsStorageDriver) {
    let dir = tempfile::tempdir().unwrap();
    let driver = FsStorageDriver::new(dir.path().join("data"));
    driver.init().await.unwrap();
    (dir, driver)
}

fn sample_friend(id: &str, name: &str) -> Friend {
    let mut friend = Friend::new(id, name);
    friend.birthday = NaiveDate::from_ymd_opt(1992, 7, 14);
    friend.facts.push("allergic to cats".to_string());
    friend.knows_because = "work".to_string();
    let mut interaction = Interaction::new(
        "lunch",
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 15, 0).unwrap(),
    );
    interaction.tags = vec!["food".to_string()];
    friend.interactions.push(interaction);
    friend
}

#[tokio::test]
async fn init_creates_nested_directories_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let driver = FsStorageDriver::new(dir.path().join("deep").join("data"));

    driver.init().await.unwrap();
    assert!(driver.friends_dir().is_dir());
    assert!(driver.friends_dir().ends_with("data/friends"));

    driver.add_friend(Friend::new("a", "Anna")).await.unwrap();
    driver.init().await.expect("second init should succeed");
    assert!(driver.get_friend("a").await.unwrap().is_some());
}

#[tokio::test]
async fn add_then_get_returns_equal_record() {
    let (_dir, driver) = open_store().await;
    let friend = sample_friend("f-1", "Anna");

    let stored = driver.add_friend(friend.clone()).await.unwrap();
    assert_eq!(stored, friend);

    let loaded = driver.get_friend("f-1").await.unwrap().unwrap();
    assert_eq!(loaded, friend);
    assert!(driver.friends_dir().join("f-1.friend").is_file());
}

#[tokio::test]
async fn get_missing_returns_none() {
    let (_dir, driver) = open_store().await;
    assert!(driver.get_friend("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn remove_returns_record_then_reports_absent() {
    let (_dir, driver) = open_store().await;
    let friend = sample_friend("f-1", "Anna");
    driver.add_friend(friend.clone()).await.unwrap();

    let removed = driver.remove_friend("f-1").await.unwrap();
    assert_eq!(removed, Some(friend));
    assert!(driver.get_friend("f-1").await.unwrap().is_none());
    assert!(!driver.friends_dir().join("f-1.friend").exists());

    assert!(driver.remove_friend("f-1").await.unwrap().is_none());
}

#[tokio::test]
async fn update_missing_returns_none_and_writes_nothing() {
    let (_dir, driver) = open_store().await;

    let result = driver
        .update_friend(sample_friend("ghost", "Casper"))
        .await
        .unwrap();
    assert!(result.is_none());
    assert!(driver.get_friend("ghost").await.unwrap().is_none());
    assert!(driver
        .list_friends(&ListFriendsFilter::all())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn update_replaces_whole_record() {
    let (_dir, driver) = open_store().await;
    driver
        .add_friend(sample_friend("f-1", "Anna"))
        .await
        .unwrap();

    let replacement = Friend::new("f-1", "Anna Karenina");
    let updated = driver.update_friend(replacement.clone()).await.unwrap();
    assert_eq!(updated, Some(replacement.clone()));

    let loaded = driver.get_friend("f-1").await.unwrap().unwrap();
    assert_eq!(loaded, replacement);
    assert!(loaded.facts.is_empty());
    assert!(loaded.interactions.is_empty());
    assert!(loaded.birthday.is_none());
}

#[tokio::test]
async fn list_filters_by_case_insensitive_substring() {
    let (_dir, driver) = open_store().await;
    for (id, name) in [("1", "Anna"), ("2", "Diana"), ("3", "Bob")] {
        driver.add_friend(Friend::new(id, name)).await.unwrap();
    }

    let mut names: Vec<String> = driver
        .list_friends(&ListFriendsFilter::by_name("an"))
        .await
        .unwrap()
        .into_iter()
        .map(|friend| friend.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["Anna".to_string(), "Diana".to_string()]);

    let all = driver.list_friends(&ListFriendsFilter::all()).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn list_skips_foreign_files_and_undecodable_records() {
    let (_dir, driver) = open_store().await;
    driver.add_friend(Friend::new("ok", "Olga")).await.unwrap();
    std::fs::write(driver.friends_dir().join("notes.txt"), b"hello").unwrap();
    std::fs::write(driver.friends_dir().join("broken.friend"), [0xff, 0xff, 0xff]).unwrap();

    let friends = driver.list_friends(&ListFriendsFilter::all()).await.unwrap();
    assert_eq!(friends.len(), 1);
    assert_eq!(friends[0].id, "ok");

    let err = driver
        .get_friend("broken")
        .await
        .expect_err("direct read of a corrupt record should fail");
    assert!(matches!(err, StorageError::Decode { ref id, .. } if id == "broken"));
}

#[tokio::test]
async fn update_can_overwrite_an_undecodable_record() {
    let (_dir, driver) = open_store().await;
    std::fs::write(driver.friends_dir().join("broken.friend"), [0xff, 0xff]).unwrap();

    let repaired = Friend::new("broken", "Fixed");
    assert!(driver.update_friend(repaired.clone()).await.unwrap().is_some());
    assert_eq!(driver.get_friend("broken").await.unwrap(), Some(repaired));
}

#[tokio::test]
async fn files_written_by_the_codec_are_readable_by_the_driver() {
    let (_dir, driver) = open_store().await;
    let friend = sample_friend("external", "Eve");
    std::fs::write(
        driver.friends_dir().join("external.friend"),
        encode_friend(&friend),
    )
    .unwrap();

    assert_eq!(driver.get_friend("external").await.unwrap(), Some(friend));
}

#[tokio::test]
async fn undated_interactions_do_not_hide_the_record() {
    let (_dir, driver) = open_store().await;
    let record = FriendRecord {
        id: "mixed".to_string(),
        name: "Mika".to_string(),
        interactions: vec![
            InteractionRecord {
                title: "dated".to_string(),
                date: Some(Timestamp {
                    seconds: 1_700_000_000,
                    nanos: 0,
                }),
                ..InteractionRecord::default()
            },
            InteractionRecord {
                title: "undated".to_string(),
                ..InteractionRecord::default()
            },
        ],
        ..FriendRecord::default()
    };
    std::fs::write(
        driver.friends_dir().join("mixed.friend"),
        record.encode_to_vec(),
    )
    .unwrap();

    let listed = driver.list_friends(&ListFriendsFilter::all()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].interactions.len(), 2);
    assert!(listed[0].interactions[1].date.is_none());

    // 1_700_000_000 is 2023-11-14T22:13:20Z.
    let now = Utc.with_ymd_and_hms(2023, 12, 24, 12, 0, 0).unwrap();
    let suggestions = reconnect_soon_at(&driver, 30, now).await.unwrap();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].days_since_last_interaction, 40);

    assert!(driver.remove_friend("mixed").await.unwrap().is_some());
}

#[tokio::test]
async fn list_without_init_propagates_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let driver = FsStorageDriver::new(dir.path().join("never-created"));

    let err = driver
        .list_friends(&ListFriendsFilter::all())
        .await
        .expect_err("missing records directory should fail");
    assert!(matches!(err, StorageError::Io { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_leave_one_complete_record() {
    let (_dir, driver) = open_store().await;
    let driver = Arc::new(driver);
    driver.add_friend(Friend::new("f-1", "Anna")).await.unwrap();

    let mut first = sample_friend("f-1", "Anna First");
    first.facts = vec!["first".to_string(); 64];
    let mut second = Friend::new("f-1", "Anna Second");
    second.knows_because = "second".to_string();

    for _ in 0..20 {
        let a = {
            let driver = Arc::clone(&driver);
            let friend = first.clone();
            tokio::spawn(async move { driver.update_friend(friend).await })
        };
        let b = {
            let driver = Arc::clone(&driver);
            let friend = second.clone();
            tokio::spawn(async move { driver.update_friend(friend).await })
        };

        assert!(a.await.unwrap().unwrap().is_some());
        assert!(b.await.unwrap().unwrap().is_some());

        let stored = driver.get_friend("f-1").await.unwrap().unwrap();
        assert!(stored == first || stored == second, "record was corrupted");
    }
}
