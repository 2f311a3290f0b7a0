//! Trip model and related functionality

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::Review;

/// Trip entity
///
/// A trip holds the ordered list of its review ids while each review also
/// stores the owning trip id; the repository keeps both sides consistent
/// inside one transaction.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trip {
    pub id: Uuid,
    pub country: String,
    pub city: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub written_text: Option<String>,
    /// Storage references under the media prefix, in upload order
    pub photos: Vec<String>,
    pub video: Option<String>,
    /// Owning user, immutable after creation
    pub created_by: Uuid,
    pub review_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Trip creation/update payload, before media is attached
#[derive(Debug, Clone, Deserialize)]
pub struct NewTrip {
    pub country: String,
    pub city: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub written_text: Option<String>,
}

impl NewTrip {
    /// Check required fields and date ordering
    pub fn validate(&self) -> Result<(NaiveDate, NaiveDate), String> {
        if self.country.trim().is_empty() {
            return Err("country is required".to_string());
        }
        if self.city.trim().is_empty() {
            return Err("city is required".to_string());
        }
        let start_date = self.start_date.ok_or("startDate is required")?;
        let end_date = self.end_date.ok_or("endDate is required")?;
        if start_date > end_date {
            return Err("startDate must not be after endDate".to_string());
        }
        Ok((start_date, end_date))
    }
}

/// A trip with its reviews resolved, as listed on the owner's page
#[derive(Debug, Clone, Serialize)]
pub struct TripWithReviews {
    #[serde(flatten)]
    pub trip: Trip,
    pub reviews: Vec<Review>,
}

/// A single trip with owner username and reviews resolved
#[derive(Debug, Clone, Serialize)]
pub struct TripDetail {
    #[serde(flatten)]
    pub trip: Trip,
    pub owner_username: String,
    pub reviews: Vec<Review>,
}

/// A search hit: another user's trip with its owner's username
#[derive(Debug, Clone, Serialize)]
pub struct TripSummary {
    #[serde(flatten)]
    pub trip: Trip,
    pub owner_username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_trip(start: Option<&str>, end: Option<&str>) -> NewTrip {
        NewTrip {
            country: "France".to_string(),
            city: "Paris".to_string(),
            start_date: start.map(|s| s.parse().unwrap()),
            end_date: end.map(|s| s.parse().unwrap()),
            written_text: None,
        }
    }

    #[test]
    fn test_valid_date_range_passes() {
        assert!(new_trip(Some("2024-01-01"), Some("2024-01-05")).validate().is_ok());
        // Single-day trips are fine
        assert!(new_trip(Some("2024-01-01"), Some("2024-01-01")).validate().is_ok());
    }

    #[test]
    fn test_missing_dates_are_rejected() {
        assert!(new_trip(None, Some("2024-01-05")).validate().is_err());
        assert!(new_trip(Some("2024-01-01"), None).validate().is_err());
    }

    #[test]
    fn test_inverted_date_range_is_rejected() {
        let err = new_trip(Some("2024-01-05"), Some("2024-01-01"))
            .validate()
            .unwrap_err();
        assert!(err.contains("startDate"));
    }

    #[test]
    fn test_blank_location_is_rejected() {
        let mut trip = new_trip(Some("2024-01-01"), Some("2024-01-05"));
        trip.city = "  ".to_string();
        assert!(trip.validate().is_err());
    }
}
