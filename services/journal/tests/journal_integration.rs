//! Integration tests for the journal repositories
//!
//! These tests exercise the credential store, content store, and search
//! engine against a real PostgreSQL instance. They are skipped when
//! `DATABASE_URL` is not set. Each test registers its own users, so the
//! tests can run concurrently against a shared database.

use journal::error::AppError;
use journal::media::StoredMedia;
use journal::models::{NewReview, NewTrip, User};
use journal::repositories::{TripRepository, UserRepository};
use sqlx::PgPool;
use uuid::Uuid;

async fn test_pool() -> Option<PgPool> {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set, skipping journal integration test");
        return None;
    }

    let config = common::database::DatabaseConfig::from_env().expect("database config");
    let pool = common::database::init_pool(&config).await.expect("pool");
    journal::MIGRATOR.run(&pool).await.expect("migrations");
    Some(pool)
}

fn unique_user(prefix: &str) -> journal::models::NewUser {
    let tag = Uuid::new_v4().simple().to_string();
    journal::models::NewUser {
        username: format!("{}_{}", prefix, &tag[..12]),
        email: format!("{}_{}@example.com", prefix, &tag[..12]),
        password: "correct horse battery".to_string(),
    }
}

async fn register(pool: &PgPool, prefix: &str) -> User {
    UserRepository::new(pool.clone())
        .create(&unique_user(prefix))
        .await
        .expect("user registration")
}

fn paris_trip() -> NewTrip {
    NewTrip {
        country: "France".to_string(),
        city: "Paris".to_string(),
        start_date: Some("2024-01-01".parse().unwrap()),
        end_date: Some("2024-01-05".parse().unwrap()),
        written_text: Some("A week of museums".to_string()),
    }
}

#[tokio::test]
async fn test_duplicate_username_and_email_name_the_field() {
    let Some(pool) = test_pool().await else { return };
    let users = UserRepository::new(pool.clone());

    let first = unique_user("dup");
    users.create(&first).await.expect("first registration");

    // Same username, fresh email
    let mut same_username = unique_user("dup");
    same_username.username = first.username.clone();
    match users.create(&same_username).await {
        Err(AppError::Duplicate(field)) => assert_eq!(field, "username"),
        other => panic!("expected username collision, got {:?}", other.map(|u| u.username)),
    }

    // Same email, fresh username
    let mut same_email = unique_user("dup");
    same_email.email = first.email.clone();
    match users.create(&same_email).await {
        Err(AppError::Duplicate(field)) => assert_eq!(field, "email"),
        other => panic!("expected email collision, got {:?}", other.map(|u| u.username)),
    }
}

#[tokio::test]
async fn test_password_verification() {
    let Some(pool) = test_pool().await else { return };
    let users = UserRepository::new(pool.clone());

    let new_user = unique_user("auth");
    let user = users.create(&new_user).await.expect("registration");

    // The plaintext never ends up stored
    assert_ne!(user.password_hash, new_user.password);

    let found = users
        .find_by_username(&new_user.username)
        .await
        .expect("lookup")
        .expect("registered user exists");
    assert!(users.verify_password(&found, &new_user.password).await.unwrap());
    assert!(!users.verify_password(&found, "wrong password").await.unwrap());

    // Nonexistent usernames never authenticate
    assert!(
        users
            .find_by_username("no_such_user_anywhere")
            .await
            .expect("lookup")
            .is_none()
    );
}

#[tokio::test]
async fn test_trip_creation_rejects_inverted_dates() {
    let Some(pool) = test_pool().await else { return };
    let trips = TripRepository::new(pool.clone());
    let owner = register(&pool, "dates").await;

    let mut trip = paris_trip();
    trip.start_date = Some("2024-01-05".parse().unwrap());
    trip.end_date = Some("2024-01-01".parse().unwrap());

    let result = trips.create(owner.id, &trip, &StoredMedia::default()).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_only_the_owner_may_edit_or_delete() {
    let Some(pool) = test_pool().await else { return };
    let trips = TripRepository::new(pool.clone());
    let alice = register(&pool, "owner").await;
    let bob = register(&pool, "intruder").await;

    let trip = trips
        .create(alice.id, &paris_trip(), &StoredMedia::default())
        .await
        .expect("trip creation");

    let update = trips.update(trip.id, bob.id, &paris_trip(), None).await;
    assert!(matches!(update, Err(AppError::Forbidden)));

    let delete = trips.delete(trip.id, bob.id).await;
    assert!(matches!(delete, Err(AppError::Forbidden)));

    // The owner still can
    trips.delete(trip.id, alice.id).await.expect("owner delete");
    assert!(matches!(
        trips.get_detail(trip.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_update_keeps_media_unless_new_files_are_supplied() {
    let Some(pool) = test_pool().await else { return };
    let trips = TripRepository::new(pool.clone());
    let owner = register(&pool, "media").await;

    let media = StoredMedia {
        photos: vec!["/media/1-a.jpg".to_string(), "/media/2-b.jpg".to_string()],
        video: Some("/media/3-clip.mp4".to_string()),
    };
    let trip = trips
        .create(owner.id, &paris_trip(), &media)
        .await
        .expect("trip creation");

    // No new media: fields change, media stays
    let mut fields = paris_trip();
    fields.city = "Lyon".to_string();
    let updated = trips
        .update(trip.id, owner.id, &fields, None)
        .await
        .expect("update without media");
    assert_eq!(updated.city, "Lyon");
    assert_eq!(updated.photos, media.photos);
    assert_eq!(updated.video, media.video);

    // New media replaces the old references
    let replacement = StoredMedia {
        photos: vec!["/media/9-c.jpg".to_string()],
        video: None,
    };
    let updated = trips
        .update(trip.id, owner.id, &fields, Some(&replacement))
        .await
        .expect("update with media");
    assert_eq!(updated.photos, replacement.photos);
    assert_eq!(updated.video, None);
}

#[tokio::test]
async fn test_reviews_attach_and_cascade_on_trip_deletion() {
    let Some(pool) = test_pool().await else { return };
    let trips = TripRepository::new(pool.clone());
    let owner = register(&pool, "review").await;

    let trip = trips
        .create(owner.id, &paris_trip(), &StoredMedia::default())
        .await
        .expect("trip creation");

    // Out-of-range ratings and missing content are rejected
    for rating in [0, 6] {
        let result = trips
            .add_review(trip.id, &NewReview { content: "x".into(), rating })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
    let result = trips
        .add_review(trip.id, &NewReview { content: "  ".into(), rating: 3 })
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    // Unknown trip ids are rejected
    let result = trips
        .add_review(Uuid::new_v4(), &NewReview { content: "x".into(), rating: 3 })
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let review = trips
        .add_review(trip.id, &NewReview { content: "Great".into(), rating: 5 })
        .await
        .expect("review creation");

    // Both sides of the reference are written
    let detail = trips.get_detail(trip.id).await.expect("detail");
    assert_eq!(detail.trip.review_ids, vec![review.id]);
    assert_eq!(detail.reviews.len(), 1);
    assert_eq!(detail.reviews[0].content, "Great");
    assert_eq!(detail.reviews[0].rating, 5);

    // Deleting the trip removes its reviews too
    trips.delete(trip.id, owner.id).await.expect("delete");
    let orphan_count: i64 =
        sqlx::query_scalar("SELECT count(*) FROM reviews WHERE trip_id = $1")
            .bind(trip.id)
            .fetch_one(&pool)
            .await
            .expect("orphan count");
    assert_eq!(orphan_count, 0);
}

#[tokio::test]
async fn test_end_to_end_register_trip_review_detail() {
    let Some(pool) = test_pool().await else { return };
    let users = UserRepository::new(pool.clone());
    let trips = TripRepository::new(pool.clone());

    let new_user = unique_user("e2e");
    let user = users.create(&new_user).await.expect("registration");

    let trip = trips
        .create(user.id, &paris_trip(), &StoredMedia::default())
        .await
        .expect("trip creation");

    trips
        .add_review(trip.id, &NewReview { content: "Great".into(), rating: 5 })
        .await
        .expect("review");

    let detail = trips.get_detail(trip.id).await.expect("detail");
    assert_eq!(detail.owner_username, new_user.username);
    assert_eq!(detail.trip.city, "Paris");
    assert_eq!(detail.reviews.len(), 1);
    assert_eq!(detail.reviews[0].content, "Great");
    assert_eq!(detail.reviews[0].rating, 5);

    let listed = trips.list_by_owner(user.id).await.expect("listing");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].reviews.len(), 1);
}

#[tokio::test]
async fn test_search_is_case_insensitive_and_excludes_the_caller() {
    let Some(pool) = test_pool().await else { return };
    let trips = TripRepository::new(pool.clone());
    let caller = register(&pool, "searcher").await;
    let other = register(&pool, "searched").await;

    trips
        .create(caller.id, &paris_trip(), &StoredMedia::default())
        .await
        .expect("caller trip");
    let others_trip = trips
        .create(other.id, &paris_trip(), &StoredMedia::default())
        .await
        .expect("other trip");

    let results = trips.search(caller.id, "par").await.expect("search");
    let ids: Vec<Uuid> = results.iter().map(|r| r.trip.id).collect();
    assert!(ids.contains(&others_trip.id));
    // The caller's own identically matching trip is excluded
    assert!(results.iter().all(|r| r.trip.created_by != caller.id));
    let hit = results.iter().find(|r| r.trip.id == others_trip.id).unwrap();
    assert_eq!(hit.owner_username, other.username);

    // An empty term matches nothing
    assert!(trips.search(caller.id, "").await.expect("search").is_empty());
    assert!(trips.search(caller.id, "   ").await.expect("search").is_empty());

    // LIKE wildcards in the term are literal characters
    assert!(trips.search(caller.id, "%").await.expect("search").is_empty());
}

#[tokio::test]
async fn test_recent_search_history_is_bounded_to_five() {
    let Some(pool) = test_pool().await else { return };
    let users = UserRepository::new(pool.clone());
    let user = register(&pool, "history").await;

    let mut history = Vec::new();
    for term in ["a", "b", "c", "d", "e", "f"] {
        history = users.record_search(user.id, term).await.expect("record");
    }

    assert_eq!(history, vec!["f", "e", "d", "c", "b"]);

    let stored = users
        .find_by_id(user.id)
        .await
        .expect("lookup")
        .expect("user exists");
    assert_eq!(stored.recent_searches, vec!["f", "e", "d", "c", "b"]);
}
