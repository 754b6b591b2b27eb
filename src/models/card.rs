use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A task item within a list.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Card {
    pub id: Uuid,
    pub list_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub position: f64,
    pub archived: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    pub fn new(input: NewCard, position: f64, created_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            list_id: input.list_id,
            title: input.title,
            description: input.description,
            position,
            archived: false,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a card.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCard {
    pub list_id: Uuid,
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub position: Option<f64>,
}

/// Partial card change. Setting `list_id` to another list moves the card; without an
/// explicit `position` it is appended to the destination.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CardUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,
    pub list_id: Option<Uuid>,
    pub position: Option<f64>,
    pub archived: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_creation() {
        let creator = Uuid::new_v4();
        let input = NewCard {
            list_id: Uuid::new_v4(),
            title: "Write release notes".into(),
            description: None,
            position: None,
        };
        let list_id = input.list_id;

        let card = Card::new(input, 65536.0, creator);
        assert_eq!(card.list_id, list_id);
        assert_eq!(card.created_by, creator);
        assert!(!card.archived);
    }

    #[test]
    fn test_card_validation() {
        let input = NewCard {
            list_id: Uuid::new_v4(),
            title: "a".repeat(201),
            description: None,
            position: None,
        };
        assert!(input.validate().is_err());

        let update = CardUpdate {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }
}
