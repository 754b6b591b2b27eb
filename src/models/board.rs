use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::list::ListSummary;

/// Role of a member within a board.
/// Corresponds to the `board_role` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "board_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BoardRole {
    /// Created the board; may rename, delete and remove others.
    Owner,
    Moderator,
    Member,
}

impl BoardRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoardRole::Owner => "owner",
            BoardRole::Moderator => "moderator",
            BoardRole::Member => "member",
        }
    }

    pub fn is_owner(&self) -> bool {
        matches!(self, BoardRole::Owner)
    }
}

/// A shared workspace. Joining requires the board password.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Board {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Board {
    pub fn new(input: NewBoard, password_hash: String, creator_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            slug: input.slug,
            description: input.description,
            password_hash,
            creator_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BoardMember {
    pub id: Uuid,
    pub board_id: Uuid,
    pub member_id: Uuid,
    pub role: BoardRole,
    pub joined_at: DateTime<Utc>,
}

impl BoardMember {
    pub fn new(board_id: Uuid, member_id: Uuid, role: BoardRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            board_id,
            member_id,
            role,
            joined_at: Utc::now(),
        }
    }
}

/// A member of a board together with their public profile.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BoardMemberProfile {
    pub member_id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: BoardRole,
    pub joined_at: DateTime<Utc>,
}

/// A board as seen by one of its members.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MemberBoard {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub board: Board,
    pub role: BoardRole,
    pub starred: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardSummary {
    #[serde(flatten)]
    pub entry: MemberBoard,
    pub member_count: i64,
    pub list_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardPage {
    pub boards: Vec<BoardSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardDetails {
    pub board: Board,
    pub role: BoardRole,
    pub starred: bool,
    pub lists: Vec<ListSummary>,
    pub members: Vec<BoardMemberProfile>,
}

/// Input for creating a board.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewBoard {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Lowercase letters, digits and hyphens; 3 to 50 characters.
    #[validate(length(min = 3, max = 50))]
    pub slug: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    /// Password other members must present to join.
    #[validate(length(min = 1, max = 72))]
    pub password: String,
}

/// Partial board change. For `description`, `Some(None)` clears it.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct BoardUpdate {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 3, max = 50))]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,
    #[validate(length(min = 1, max = 72))]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct JoinBoardInput {
    #[validate(length(min = 1))]
    pub password: String,
}

/// Query parameters for listing the caller's boards.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardListQuery {
    /// Only return boards the caller has starred.
    #[serde(default)]
    pub starred: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> NewBoard {
        NewBoard {
            name: "Team X".to_string(),
            slug: "team-x".to_string(),
            description: Some("Sprint planning".to_string()),
            password: "secret123".to_string(),
        }
    }

    #[test]
    fn test_board_creation() {
        let creator = Uuid::new_v4();
        let board = Board::new(sample_input(), "hash".into(), creator);
        assert_eq!(board.slug, "team-x");
        assert_eq!(board.creator_id, creator);
        assert_eq!(board.created_at, board.updated_at);
    }

    #[test]
    fn test_board_validation() {
        assert!(sample_input().validate().is_ok());

        let mut invalid = sample_input();
        invalid.name = "".to_string();
        assert!(invalid.validate().is_err());

        let mut invalid = sample_input();
        invalid.password = "".to_string();
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_board_serialization_hides_password_hash() {
        let board = Board::new(sample_input(), "hash".into(), Uuid::new_v4());
        let json = serde_json::to_value(&board).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["slug"], "team-x");
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_value(BoardRole::Owner).unwrap(), "owner");
        assert_eq!(BoardRole::Moderator.as_str(), "moderator");
        assert!(!BoardRole::Member.is_owner());
    }

    #[test]
    fn test_board_update_description_clearing() {
        let update: BoardUpdate = serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(update.description, Some(None));
        assert!(update.name.is_none());
    }
}
