use super::*;
use cinetrack_models::{ContentItem, Genre, NewUser};
use cinetrack_sources::MemoryStore;
use serde_json::Value;

struct Harness {
    store: Arc<MemoryStore>,
    cache: Arc<QueryCache>,
    log: Arc<NoticeLog>,
    actions: Actions,
    viewer: Session,
}

async fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let user = store
        .insert_user(&NewUser {
            email: "ann@example.com".to_string(),
            name: Some("Ann".to_string()),
            image: None,
        })
        .await
        .unwrap();
    let viewer = Session {
        user_id: user.id,
        email: user.email,
        name: user.name,
        image: user.image,
    };
    let cache = Arc::new(QueryCache::default());
    let log = Arc::new(NoticeLog::new());
    let actions = Actions::new(store.clone(), cache.clone(), Some(viewer.clone()), log.clone());
    Harness { store, cache, log, actions, viewer }
}

fn details(id: u64, media: MediaType, title: &str) -> ContentDetails {
    ContentDetails {
        item: ContentItem {
            id,
            title: (media == MediaType::Movie).then(|| title.to_string()),
            name: (media == MediaType::Tv).then(|| title.to_string()),
            overview: "overview".to_string(),
            poster_path: Some("/poster.jpg".to_string()),
            backdrop_path: None,
            vote_average: 7.9,
            release_date: None,
            first_air_date: None,
            media_type: Some(media),
            genre_ids: vec![],
            popularity: 10.0,
        },
        genres: vec![Genre { id: 80, name: "Crime".to_string() }],
        runtime: Some(170),
        episode_run_time: vec![],
        number_of_seasons: None,
        number_of_episodes: None,
        videos: None,
        credits: None,
    }
}

async fn seeded_post(h: &Harness) -> CommunityPost {
    let post = h
        .store
        .create_post(&NewPost {
            user_id: "someone-else".to_string(),
            movie_id: 949,
            media_type: MediaType::Movie,
            title: "Heat".to_string(),
            poster_path: None,
            content: None,
        })
        .await
        .unwrap();
    // Prime the feed the way a render would
    let feed = h.store.list_posts(Some(&h.viewer.user_id)).await.unwrap();
    h.cache.set(&keys::community_posts(Some(&h.viewer.user_id)), &feed).unwrap();
    post
}

#[tokio::test]
async fn test_signed_out_viewer_gets_notice_and_no_call() {
    let store = Arc::new(MemoryStore::new());
    // Any store call would fail with an Api error instead of SignedOut
    store.set_unavailable(true);
    let log = Arc::new(NoticeLog::new());
    let actions = Actions::new(store, Arc::new(QueryCache::default()), None, log.clone());

    let err = actions.add_to_watchlist(&details(949, MediaType::Movie, "Heat")).await.unwrap_err();
    assert!(matches!(err, ActionError::SignedOut(_)));
    assert!(matches!(actions.toggle_like("p1").await, Err(ActionError::SignedOut(_))));

    let notices = log.drain();
    assert_eq!(notices.len(), 2);
    assert!(notices.iter().all(|n| n.level == NoticeLevel::Error));
    assert!(notices[0].message.starts_with("Please sign in"));
}

#[tokio::test]
async fn test_add_then_remove_watchlist_entry() {
    let h = harness().await;
    let movie = details(42, MediaType::Movie, "The Answer");

    let added = h.actions.add_to_watchlist(&movie).await.unwrap();
    assert_eq!(added.status, WatchStatus::PlanToWatch);
    assert_eq!(added.snapshot.title, "The Answer");
    assert_eq!(added.snapshot.genre_ids, vec![80]);

    h.actions.remove_from_watchlist(MediaType::Movie, 42).await.unwrap();

    let list = h.store.list_watchlist(&h.viewer.user_id).await.unwrap();
    assert!(list.iter().all(|e| e.movie_id != 42));

    let notices = h.log.drain();
    assert_eq!(notices[0], Notice::success("Added The Answer to your watchlist"));
    assert_eq!(notices[1], Notice::success("Removed The Answer from your watchlist"));
}

#[tokio::test]
async fn test_duplicate_watchlist_add_reports_error() {
    let h = harness().await;
    let movie = details(42, MediaType::Movie, "The Answer");
    h.actions.add_to_watchlist(&movie).await.unwrap();

    let err = h.actions.add_to_watchlist(&movie).await.unwrap_err();
    assert!(matches!(err, ActionError::AlreadyInWatchlist(_)));
    assert_eq!(h.log.drain().last().map(|n| n.level), Some(NoticeLevel::Error));
}

#[tokio::test]
async fn test_watchlist_add_invalidates_dependent_keys() {
    let h = harness().await;
    let list_key = keys::watchlist(&h.viewer.user_id);
    let check_key = keys::watchlist_check(42, MediaType::Movie, &h.viewer.user_id);
    h.cache.set(&list_key, &Vec::<WatchlistEntry>::new()).unwrap();
    h.cache.set(&check_key, &false).unwrap();

    h.actions.add_to_watchlist(&details(42, MediaType::Movie, "The Answer")).await.unwrap();

    assert!(h.cache.is_stale(&list_key));
    assert!(h.cache.is_stale(&check_key));
}

#[tokio::test]
async fn test_status_update_patches_cached_list() {
    let h = harness().await;
    h.actions.add_to_watchlist(&details(42, MediaType::Movie, "The Answer")).await.unwrap();
    let key = keys::watchlist(&h.viewer.user_id);
    let list = h.store.list_watchlist(&h.viewer.user_id).await.unwrap();
    h.cache.set(&key, &list).unwrap();

    h.actions
        .update_watchlist_status(MediaType::Movie, 42, WatchStatus::Watching)
        .await
        .unwrap();

    let cached: Vec<WatchlistEntry> = h.cache.get(&key).unwrap().unwrap();
    assert_eq!(cached[0].status, WatchStatus::Watching);
}

#[tokio::test]
async fn test_status_update_failure_rolls_back_list() {
    let h = harness().await;
    h.actions.add_to_watchlist(&details(42, MediaType::Movie, "The Answer")).await.unwrap();
    let key = keys::watchlist(&h.viewer.user_id);
    let list = h.store.list_watchlist(&h.viewer.user_id).await.unwrap();
    h.cache.set(&key, &list).unwrap();
    let before: Value = h.cache.get(&key).unwrap().unwrap();

    h.store.set_unavailable(true);
    assert!(h
        .actions
        .update_watchlist_status(MediaType::Movie, 42, WatchStatus::Completed)
        .await
        .is_err());

    assert_eq!(h.cache.get::<Value>(&key).unwrap(), Some(before));
}

#[tokio::test]
async fn test_rating_twice_keeps_latest_score_and_review() {
    let h = harness().await;
    let show = details(7, MediaType::Tv, "Seven");

    h.actions.rate(&show, 6, None).await.unwrap();
    h.actions.rate(&show, 9, Some("great".to_string())).await.unwrap();

    let rating = h
        .store
        .get_rating(&h.viewer.user_id, 7, MediaType::Tv)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rating.rating, 9);
    assert_eq!(rating.review.as_deref(), Some("great"));
    assert_eq!(h.store.list_ratings(&h.viewer.user_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_out_of_range_score_is_rejected_before_store() {
    let h = harness().await;
    let err = h.actions.rate(&details(7, MediaType::Tv, "Seven"), 11, None).await.unwrap_err();

    assert!(matches!(err, ActionError::InvalidScore(RatingError { score: 11 })));
    assert!(h.store.list_ratings(&h.viewer.user_id).await.unwrap().is_empty());
    assert_eq!(h.log.drain()[0].level, NoticeLevel::Error);
}

#[tokio::test]
async fn test_delete_rating_without_rating() {
    let h = harness().await;
    assert!(matches!(
        h.actions.delete_rating(MediaType::Movie, 1).await,
        Err(ActionError::NotRated { id: 1, .. })
    ));
}

#[tokio::test]
async fn test_share_uses_default_caption() {
    let h = harness().await;
    let feed_key = keys::community_posts(Some(&h.viewer.user_id));
    h.cache.set(&feed_key, &Vec::<CommunityPost>::new()).unwrap();

    let post = h.actions.share(&details(1399, MediaType::Tv, "Game of Thrones"), None).await.unwrap();
    assert_eq!(post.content.as_deref(), Some("Check out this amazing tv show!"));
    assert_eq!(post.title, "Game of Thrones");
    assert!(h.cache.is_stale(&feed_key));

    let custom = h
        .actions
        .share(&details(949, MediaType::Movie, "Heat"), Some("Best heist ever".to_string()))
        .await
        .unwrap();
    assert_eq!(custom.content.as_deref(), Some("Best heist ever"));
}

#[tokio::test]
async fn test_only_author_can_delete_post() {
    let h = harness().await;
    let foreign = seeded_post(&h).await;

    assert!(matches!(h.actions.delete_post(&foreign).await, Err(ActionError::NotOwner)));
    assert_eq!(h.store.list_posts(None).await.unwrap().len(), 1);

    let own = h.actions.share(&details(949, MediaType::Movie, "Heat"), None).await.unwrap();
    h.actions.delete_post(&own).await.unwrap();
    assert_eq!(h.store.list_posts(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_two_toggles_return_post_to_original_state() {
    let h = harness().await;
    let post = seeded_post(&h).await;
    let key = keys::community_posts(Some(&h.viewer.user_id));
    let before: Value = h.cache.get(&key).unwrap().unwrap();

    let first = h.actions.toggle_like(&post.id).await.unwrap();
    assert_eq!(first, LikeOutcome { is_liked: true, likes: 1 });
    let cached: Vec<CommunityPost> = h.cache.get(&key).unwrap().unwrap();
    assert_eq!((cached[0].likes, cached[0].is_liked), (1, Some(true)));

    let second = h.actions.toggle_like(&post.id).await.unwrap();
    assert_eq!(second, LikeOutcome { is_liked: false, likes: 0 });
    assert_eq!(h.cache.get::<Value>(&key).unwrap(), Some(before));
}

#[tokio::test]
async fn test_failed_like_rolls_back_feed() {
    let h = harness().await;
    let post = seeded_post(&h).await;
    let key = keys::community_posts(Some(&h.viewer.user_id));
    let before: Value = h.cache.get(&key).unwrap().unwrap();

    h.store.set_unavailable(true);
    assert!(h.actions.toggle_like(&post.id).await.is_err());

    assert_eq!(h.cache.get::<Value>(&key).unwrap(), Some(before));
    let notice = h.log.drain().pop().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.starts_with("Failed to update like"));
}

#[tokio::test]
async fn test_comment_replaces_provisional_entry() {
    let h = harness().await;
    let post = seeded_post(&h).await;
    let key = keys::comments(&post.id);
    h.cache.set(&key, &Vec::<Comment>::new()).unwrap();

    let saved = h.actions.add_comment(&post.id, "  Classic.  ").await.unwrap();
    assert_eq!(saved.content, "Classic.");
    assert!(!saved.is_provisional());

    let cached: Vec<Comment> = h.cache.get(&key).unwrap().unwrap();
    let matching: Vec<&Comment> = cached.iter().filter(|c| c.content == "Classic.").collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].id, saved.id);
    assert!(cached.iter().all(|c| !c.is_provisional()));
}

#[tokio::test]
async fn test_comment_survives_a_read_started_before_it() {
    let h = harness().await;
    let post = seeded_post(&h).await;
    let key = keys::comments(&post.id);
    h.cache.set(&key, &Vec::<Comment>::new()).unwrap();
    h.cache.invalidate_prefix(&key);

    let (tx, rx) = tokio::sync::oneshot::channel::<Vec<Comment>>();
    let read = {
        let cache = Arc::clone(&h.cache);
        let key = key.clone();
        tokio::spawn(async move {
            cache
                .fetch(&key, move || async move { rx.await.map_err(|e| e.to_string()) })
                .await
        })
    };
    while !h.cache.is_fetching(&key) {
        tokio::task::yield_now().await;
    }

    let saved = h.actions.add_comment(&post.id, "Classic.").await.unwrap();
    tx.send(Vec::new()).unwrap();
    read.await.unwrap().unwrap();

    let cached: Vec<Comment> = h.cache.get(&key).unwrap().unwrap();
    let matching: Vec<&Comment> = cached.iter().filter(|c| c.content == "Classic.").collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].id, saved.id);
    assert!(h.cache.is_stale(&key));
}

#[tokio::test]
async fn test_failed_comment_restores_exact_snapshot() {
    let h = harness().await;
    let post = seeded_post(&h).await;
    let key = keys::comments(&post.id);
    h.store
        .add_comment(&NewComment {
            user_id: h.viewer.user_id.clone(),
            post_id: post.id.clone(),
            content: "first".to_string(),
        })
        .await
        .unwrap();
    let existing = h.store.list_comments(&post.id).await.unwrap();
    h.cache.set(&key, &existing).unwrap();
    let before: Value = h.cache.get(&key).unwrap().unwrap();

    h.store.set_unavailable(true);
    assert!(h.actions.add_comment(&post.id, "second").await.is_err());

    assert_eq!(h.cache.get::<Value>(&key).unwrap(), Some(before));
}

#[tokio::test]
async fn test_failed_comment_on_uncached_post_leaves_key_empty() {
    let h = harness().await;
    let post = seeded_post(&h).await;
    h.store.set_unavailable(true);

    assert!(h.actions.add_comment(&post.id, "hello").await.is_err());
    assert_eq!(h.cache.get::<Value>(&keys::comments(&post.id)).unwrap(), None);
}

#[tokio::test]
async fn test_empty_comment_is_rejected() {
    let h = harness().await;
    assert!(matches!(h.actions.add_comment("p1", "   ").await, Err(ActionError::EmptyComment)));
}

#[tokio::test]
async fn test_provisional_comment_carries_viewer_profile() {
    let h = harness().await;
    let comment = provisional_comment(&h.viewer, "p1", "Classic.");

    assert!(comment.is_provisional());
    let author = comment.user.unwrap();
    assert_eq!(author.id, h.viewer.user_id);
    assert_eq!(author.name.as_deref(), Some("Ann"));
    assert_eq!(author.display_name(), "Ann");
}

#[test]
fn test_reconcile_leaves_one_copy_when_refetch_landed_first() {
    let saved = Comment {
        id: "c1".to_string(),
        user_id: "u1".to_string(),
        post_id: "p1".to_string(),
        content: "hi".to_string(),
        created_at: Utc::now(),
        user: None,
    };
    let provisional = Comment { id: "temp-x".to_string(), ..saved.clone() };

    let list = reconcile_comment(vec![saved.clone(), provisional], "temp-x", &saved);
    assert_eq!(list, vec![saved.clone()]);

    // No provisional entry: list is left alone
    let list = reconcile_comment(vec![saved.clone()], "temp-x", &saved);
    assert_eq!(list.len(), 1);

    // A refetch from before the insert dropped both copies
    let list = reconcile_comment(Vec::new(), "temp-x", &saved);
    assert_eq!(list, vec![saved]);
}
