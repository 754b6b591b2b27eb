use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::card::Card;

/// An ordered column within a board.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct List {
    pub id: Uuid,
    pub board_id: Uuid,
    pub name: String,
    pub position: f64,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl List {
    pub fn new(board_id: Uuid, name: String, position: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            board_id,
            name,
            position,
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListSummary {
    #[serde(flatten)]
    pub list: List,
    pub card_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListWithCards {
    #[serde(flatten)]
    pub list: List,
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewList {
    pub board_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Omit to append after the last list.
    pub position: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ListUpdate {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub position: Option<f64>,
    pub archived: Option<bool>,
}
