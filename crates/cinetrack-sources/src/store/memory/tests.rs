use super::*;
use cinetrack_models::ContentSnapshot;
use std::sync::Arc;
use tempfile::TempDir;

fn snapshot(title: &str) -> ContentSnapshot {
    ContentSnapshot {
        title: title.to_string(),
        poster_path: Some(format!("/{}.jpg", title.to_lowercase())),
        ..Default::default()
    }
}

fn watch_entry(user_id: &str, movie_id: u64, media: MediaType) -> NewWatchlistEntry {
    NewWatchlistEntry {
        user_id: user_id.to_string(),
        movie_id,
        media_type: media,
        snapshot: snapshot("Heat"),
        status: WatchStatus::PlanToWatch,
    }
}

fn rating(user_id: &str, movie_id: u64, score: u8) -> NewRating {
    NewRating {
        user_id: user_id.to_string(),
        movie_id,
        media_type: MediaType::Movie,
        rating: score,
        review: None,
        snapshot: snapshot("Heat"),
    }
}

fn post(user_id: &str, movie_id: u64) -> NewPost {
    NewPost {
        user_id: user_id.to_string(),
        movie_id,
        media_type: MediaType::Movie,
        title: "Heat".to_string(),
        poster_path: None,
        content: Some("Check out this amazing movie!".to_string()),
    }
}

async fn user(store: &MemoryStore, email: &str) -> UserProfile {
    store
        .insert_user(&NewUser {
            email: email.to_string(),
            name: Some(email.split('@').next().unwrap_or_default().to_string()),
            image: None,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_watchlist_is_unique_per_title_and_media() {
    let store = MemoryStore::new();

    store.add_to_watchlist(&watch_entry("u1", 949, MediaType::Movie)).await.unwrap();
    let duplicate = store.add_to_watchlist(&watch_entry("u1", 949, MediaType::Movie)).await;
    assert!(matches!(duplicate, Err(StoreError::Conflict(_))));

    // Same id under the other media type is a different title
    store.add_to_watchlist(&watch_entry("u1", 949, MediaType::Tv)).await.unwrap();
    store.add_to_watchlist(&watch_entry("u2", 949, MediaType::Movie)).await.unwrap();

    assert_eq!(store.list_watchlist("u1").await.unwrap().len(), 2);
    assert!(store.is_in_watchlist("u1", 949, MediaType::Tv).await.unwrap());
    assert!(!store.is_in_watchlist("u1", 1, MediaType::Movie).await.unwrap());
}

#[tokio::test]
async fn test_watchlist_newest_first_and_status_update() {
    let store = MemoryStore::new();
    let first = store.add_to_watchlist(&watch_entry("u1", 1, MediaType::Movie)).await.unwrap();
    let second = store.add_to_watchlist(&watch_entry("u1", 2, MediaType::Movie)).await.unwrap();

    let list = store.list_watchlist("u1").await.unwrap();
    assert_eq!(list[0].id, second.id);
    assert_eq!(list[1].id, first.id);

    let updated = store.update_watchlist_status(&first.id, WatchStatus::Completed).await.unwrap();
    assert_eq!(updated.status, WatchStatus::Completed);

    store.remove_from_watchlist(&second.id).await.unwrap();
    assert_eq!(store.list_watchlist("u1").await.unwrap().len(), 1);

    assert!(store
        .update_watchlist_status("missing", WatchStatus::Watching)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_rating_upsert_keeps_one_row() {
    let store = MemoryStore::new();

    let first = store.upsert_rating(&rating("u1", 7, 6)).await.unwrap();
    let second = store.upsert_rating(&rating("u1", 7, 9)).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(second.rating, 9);

    let all = store.list_ratings("u1").await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(
        store.get_rating("u1", 7, MediaType::Movie).await.unwrap().map(|r| r.rating),
        Some(9)
    );
}

#[tokio::test]
async fn test_average_rating() {
    let store = MemoryStore::new();
    assert_eq!(store.average_rating(7, MediaType::Movie).await.unwrap(), 0.0);

    store.upsert_rating(&rating("u1", 7, 8)).await.unwrap();
    store.upsert_rating(&rating("u2", 7, 9)).await.unwrap();
    store.upsert_rating(&rating("u3", 8, 1)).await.unwrap();

    assert_eq!(store.average_rating(7, MediaType::Movie).await.unwrap(), 8.5);
    assert_eq!(store.average_rating(7, MediaType::Tv).await.unwrap(), 0.0);
}

#[tokio::test]
async fn test_toggle_like_twice_restores_state() {
    let store = MemoryStore::new();
    let created = store.create_post(&post("author", 42)).await.unwrap();

    let liked = store.toggle_like("u1", &created.id).await.unwrap();
    assert_eq!(liked, LikeOutcome { is_liked: true, likes: 1 });

    let unliked = store.toggle_like("u1", &created.id).await.unwrap();
    assert_eq!(unliked, LikeOutcome { is_liked: false, likes: 0 });

    let feed = store.list_posts(Some("u1")).await.unwrap();
    assert_eq!(feed[0].likes, 0);
    assert_eq!(feed[0].is_liked, Some(false));

    assert!(store.toggle_like("u1", "missing").await.unwrap_err().is_not_found());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_toggles_stay_consistent() {
    let store = Arc::new(MemoryStore::new());
    let created = store.create_post(&post("author", 42)).await.unwrap();

    // Ten users each toggle an odd number of times, five users an even number
    let mut handles = Vec::new();
    for user in 0..15 {
        let toggles = if user < 10 { 3 } else { 2 };
        for _ in 0..toggles {
            let store = Arc::clone(&store);
            let post_id = created.id.clone();
            handles.push(tokio::spawn(async move {
                store.toggle_like(&format!("u{}", user), &post_id).await
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let feed = store.list_posts(None).await.unwrap();
    assert_eq!(feed[0].likes, 10);
    let like_rows = store.lock().unwrap().post_likes.len();
    assert_eq!(like_rows, 10);
}

#[tokio::test]
async fn test_feed_joins_author_counts_and_viewer_likes() {
    let store = MemoryStore::new();
    let ann = user(&store, "ann@example.com").await;
    let bob = user(&store, "bob@example.com").await;

    let older = store.create_post(&post(&ann.id, 1)).await.unwrap();
    let newer = store.create_post(&post(&bob.id, 2)).await.unwrap();

    store.toggle_like(&ann.id, &newer.id).await.unwrap();
    for text in ["first", "second"] {
        store
            .add_comment(&NewComment {
                user_id: ann.id.clone(),
                post_id: older.id.clone(),
                content: text.to_string(),
            })
            .await
            .unwrap();
    }

    let feed = store.list_posts(Some(&ann.id)).await.unwrap();
    assert_eq!(feed[0].id, newer.id);
    assert_eq!(feed[0].is_liked, Some(true));
    assert_eq!(feed[0].user.as_ref().map(|u| u.email.as_str()), Some("bob@example.com"));
    assert_eq!(feed[1].comment_count, 2);
    assert_eq!(feed[1].is_liked, Some(false));

    // Anonymous readers get no liked flag at all
    let anonymous = store.list_posts(None).await.unwrap();
    assert!(anonymous.iter().all(|p| p.is_liked.is_none()));

    let comments = store.list_comments(&older.id).await.unwrap();
    let texts: Vec<&str> = comments.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(texts, vec!["first", "second"]);
    assert_eq!(comments[0].user.as_ref().map(|u| u.display_name()), Some("ann"));
}

#[tokio::test]
async fn test_delete_post_cascades() {
    let store = MemoryStore::new();
    let created = store.create_post(&post("author", 42)).await.unwrap();
    store.toggle_like("u1", &created.id).await.unwrap();
    store
        .add_comment(&NewComment {
            user_id: "u1".to_string(),
            post_id: created.id.clone(),
            content: "nice".to_string(),
        })
        .await
        .unwrap();

    store.delete_post(&created.id).await.unwrap();

    assert!(store.list_posts(None).await.unwrap().is_empty());
    assert!(store.list_comments(&created.id).await.unwrap().is_empty());
    assert!(store.lock().unwrap().post_likes.is_empty());
}

#[tokio::test]
async fn test_unavailable_store_fails_every_call() {
    let store = MemoryStore::new();
    store.set_unavailable(true);

    let err = store.list_watchlist("u1").await.unwrap_err();
    assert!(matches!(err, StoreError::Api { status: 503, .. }));
    assert!(store.create_post(&post("u1", 1)).await.is_err());

    store.set_unavailable(false);
    assert!(store.list_watchlist("u1").await.is_ok());
}

#[tokio::test]
async fn test_offline_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data").join("offline_store.json");

    {
        let store = MemoryStore::open(&path).unwrap();
        store.add_to_watchlist(&watch_entry("u1", 949, MediaType::Movie)).await.unwrap();
        store.upsert_rating(&rating("u1", 949, 10)).await.unwrap();
    }

    let reopened = MemoryStore::open(&path).unwrap();
    assert!(reopened.is_in_watchlist("u1", 949, MediaType::Movie).await.unwrap());
    assert_eq!(reopened.list_ratings("u1").await.unwrap()[0].rating, 10);
}

#[tokio::test]
async fn test_corrupted_offline_file_starts_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("offline_store.json");
    std::fs::write(&path, "{not json").unwrap();

    let store = MemoryStore::open(&path).unwrap();
    assert!(store.list_watchlist("u1").await.unwrap().is_empty());
}
