//! Trip and review repository for database operations
//!
//! Owns the trip records, their attached reviews, and the destination
//! search. Every mutation is scoped by ownership: only the creating user
//! may edit or delete a trip.

use sqlx::{PgPool, Row, postgres::PgRow};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::media::StoredMedia;
use crate::models::{NewReview, NewTrip, Review, Trip, TripDetail, TripSummary, TripWithReviews};

const TRIP_COLUMNS: &str = "id, country, city, start_date, end_date, written_text, photos, \
                            video, created_by, review_ids, created_at, updated_at";

fn trip_from_row(row: &PgRow) -> Trip {
    Trip {
        id: row.get("id"),
        country: row.get("country"),
        city: row.get("city"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        written_text: row.get("written_text"),
        photos: row.get("photos"),
        video: row.get("video"),
        created_by: row.get("created_by"),
        review_ids: row.get("review_ids"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn review_from_row(row: &PgRow) -> Review {
    Review {
        id: row.get("id"),
        trip_id: row.get("trip_id"),
        content: row.get("content"),
        rating: row.get("rating"),
        created_at: row.get("created_at"),
    }
}

/// Escape LIKE wildcards in a user-supplied search term.
fn escape_like(term: &str) -> String {
    term.replace('\\', r"\\")
        .replace('%', r"\%")
        .replace('_', r"\_")
}

/// Trip repository
#[derive(Clone)]
pub struct TripRepository {
    pool: PgPool,
}

impl TripRepository {
    /// Create a new trip repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new trip owned by `owner`, with an empty review list
    pub async fn create(
        &self,
        owner: Uuid,
        new_trip: &NewTrip,
        media: &StoredMedia,
    ) -> AppResult<Trip> {
        let (start_date, end_date) = new_trip.validate().map_err(AppError::Validation)?;

        info!("Creating trip to {}, {} for {}", new_trip.city, new_trip.country, owner);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO trips (country, city, start_date, end_date, written_text, photos, video, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TRIP_COLUMNS}
            "#,
        ))
        .bind(&new_trip.country)
        .bind(&new_trip.city)
        .bind(start_date)
        .bind(end_date)
        .bind(&new_trip.written_text)
        .bind(&media.photos)
        .bind(&media.video)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        Ok(trip_from_row(&row))
    }

    /// All trips owned by `owner` in creation order, reviews resolved
    pub async fn list_by_owner(&self, owner: Uuid) -> AppResult<Vec<TripWithReviews>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {TRIP_COLUMNS}
            FROM trips
            WHERE created_by = $1
            ORDER BY created_at, id
            "#,
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        let trips: Vec<Trip> = rows.iter().map(trip_from_row).collect();
        let trip_ids: Vec<Uuid> = trips.iter().map(|t| t.id).collect();
        let mut reviews = self.reviews_for_trips(&trip_ids).await?;

        Ok(trips
            .into_iter()
            .map(|trip| {
                let reviews = resolve_reviews(&trip, &mut reviews);
                TripWithReviews { trip, reviews }
            })
            .collect())
    }

    /// One trip by id with the owner's username and reviews resolved
    pub async fn get_detail(&self, trip_id: Uuid) -> AppResult<TripDetail> {
        let row = sqlx::query(
            r#"
            SELECT t.id, t.country, t.city, t.start_date, t.end_date, t.written_text,
                   t.photos, t.video, t.created_by, t.review_ids, t.created_at, t.updated_at,
                   u.username AS owner_username
            FROM trips t
            JOIN users u ON u.id = t.created_by
            WHERE t.id = $1
            "#,
        )
        .bind(trip_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("trip"))?;

        let trip = trip_from_row(&row);
        let owner_username: String = row.get("owner_username");
        let mut reviews = self.reviews_for_trips(&[trip.id]).await?;
        let reviews = resolve_reviews(&trip, &mut reviews);

        Ok(TripDetail {
            trip,
            owner_username,
            reviews,
        })
    }

    /// One trip by id, after checking that `caller` owns it
    pub async fn find_owned(&self, trip_id: Uuid, caller: Uuid) -> AppResult<Trip> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {TRIP_COLUMNS}
            FROM trips
            WHERE id = $1
            "#,
        ))
        .bind(trip_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("trip"))?;

        let trip = trip_from_row(&row);
        if trip.created_by != caller {
            return Err(AppError::Forbidden);
        }
        Ok(trip)
    }

    /// Overwrite a trip's fields; photos and video change only when new
    /// media was supplied with this call.
    pub async fn update(
        &self,
        trip_id: Uuid,
        caller: Uuid,
        new_trip: &NewTrip,
        media: Option<&StoredMedia>,
    ) -> AppResult<Trip> {
        let (start_date, end_date) = new_trip.validate().map_err(AppError::Validation)?;
        self.find_owned(trip_id, caller).await?;

        let row = match media {
            Some(media) => {
                sqlx::query(&format!(
                    r#"
                    UPDATE trips
                    SET country = $2, city = $3, start_date = $4, end_date = $5,
                        written_text = $6, photos = $7, video = $8, updated_at = now()
                    WHERE id = $1
                    RETURNING {TRIP_COLUMNS}
                    "#,
                ))
                .bind(trip_id)
                .bind(&new_trip.country)
                .bind(&new_trip.city)
                .bind(start_date)
                .bind(end_date)
                .bind(&new_trip.written_text)
                .bind(&media.photos)
                .bind(&media.video)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    r#"
                    UPDATE trips
                    SET country = $2, city = $3, start_date = $4, end_date = $5,
                        written_text = $6, updated_at = now()
                    WHERE id = $1
                    RETURNING {TRIP_COLUMNS}
                    "#,
                ))
                .bind(trip_id)
                .bind(&new_trip.country)
                .bind(&new_trip.city)
                .bind(start_date)
                .bind(end_date)
                .bind(&new_trip.written_text)
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(trip_from_row(&row))
    }

    /// Delete a trip and, in the same transaction, its reviews
    pub async fn delete(&self, trip_id: Uuid, caller: Uuid) -> AppResult<()> {
        self.find_owned(trip_id, caller).await?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM reviews WHERE trip_id = $1")
            .bind(trip_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM trips WHERE id = $1")
            .bind(trip_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Deleted trip {}", trip_id);
        Ok(())
    }

    /// Attach a review to a trip.
    ///
    /// The review row and the trip's review-id list are written inside
    /// one transaction, so the two sides of the reference cannot diverge.
    pub async fn add_review(&self, trip_id: Uuid, new_review: &NewReview) -> AppResult<Review> {
        new_review.validate().map_err(AppError::Validation)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM trips WHERE id = $1 FOR UPDATE")
            .bind(trip_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound("trip"))?;

        let row = sqlx::query(
            r#"
            INSERT INTO reviews (trip_id, content, rating)
            VALUES ($1, $2, $3)
            RETURNING id, trip_id, content, rating, created_at
            "#,
        )
        .bind(trip_id)
        .bind(&new_review.content)
        .bind(new_review.rating)
        .fetch_one(&mut *tx)
        .await?;
        let review = review_from_row(&row);

        sqlx::query(
            r#"
            UPDATE trips
            SET review_ids = array_append(review_ids, $2), updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(trip_id)
        .bind(review.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(review)
    }

    /// Case-insensitive substring search of `term` against country and
    /// city, excluding the caller's own trips. An empty term matches
    /// nothing.
    pub async fn search(&self, caller: Uuid, term: &str) -> AppResult<Vec<TripSummary>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let pattern = format!("%{}%", escape_like(term));
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.country, t.city, t.start_date, t.end_date, t.written_text,
                   t.photos, t.video, t.created_by, t.review_ids, t.created_at, t.updated_at,
                   u.username AS owner_username
            FROM trips t
            JOIN users u ON u.id = t.created_by
            WHERE t.created_by <> $1
              AND (t.country ILIKE $2 ESCAPE '\' OR t.city ILIKE $2 ESCAPE '\')
            ORDER BY t.created_at, t.id
            "#,
        )
        .bind(caller)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| TripSummary {
                trip: trip_from_row(row),
                owner_username: row.get("owner_username"),
            })
            .collect())
    }

    async fn reviews_for_trips(&self, trip_ids: &[Uuid]) -> AppResult<HashMap<Uuid, Review>> {
        if trip_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT id, trip_id, content, rating, created_at
            FROM reviews
            WHERE trip_id = ANY($1)
            "#,
        )
        .bind(trip_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let review = review_from_row(row);
                (review.id, review)
            })
            .collect())
    }
}

/// Order a trip's reviews by its review-id list
fn resolve_reviews(trip: &Trip, reviews: &mut HashMap<Uuid, Review>) -> Vec<Review> {
    trip.review_ids
        .iter()
        .filter_map(|id| reviews.remove(id))
        .collect()
}
