//! Review model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Inclusive rating bounds. 1-5 is the canonical contract.
pub const RATING_MIN: i32 = 1;
pub const RATING_MAX: i32 = 5;

/// Review entity, attached to exactly one trip
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub content: String,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
}

/// Review creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub content: String,
    pub rating: i32,
}

impl NewReview {
    /// Check required content and the rating bounds
    pub fn validate(&self) -> Result<(), String> {
        if self.content.trim().is_empty() {
            return Err("content is required".to_string());
        }
        if self.rating < RATING_MIN || self.rating > RATING_MAX {
            return Err(format!(
                "rating must be between {} and {}",
                RATING_MIN, RATING_MAX
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(content: &str, rating: i32) -> NewReview {
        NewReview {
            content: content.to_string(),
            rating,
        }
    }

    #[test]
    fn test_rating_bounds_are_inclusive() {
        assert!(review("Great", 1).validate().is_ok());
        assert!(review("Great", 5).validate().is_ok());
        assert!(review("Great", 0).validate().is_err());
        assert!(review("Great", 6).validate().is_err());
        assert!(review("Great", -1).validate().is_err());
    }

    #[test]
    fn test_content_is_required() {
        assert!(review("", 3).validate().is_err());
        assert!(review("   ", 3).validate().is_err());
    }
}
