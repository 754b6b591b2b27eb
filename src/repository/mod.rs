//! Persistence ports, one trait per aggregate.
//!
//! Services only talk to these traits. `postgres` is the production adapter and
//! `memory` an in-process one for tests and local runs. Update and delete operations
//! report whether a row was affected so callers can turn `false` into the matching
//! not-found error. Archived lists and cards are ignored by every position and count query.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    Board, BoardMember, BoardMemberProfile, Card, List, Member, MemberBoard, RefreshToken,
};

pub use memory::InMemoryRepository;
pub use postgres::PgRepository;

#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Fails with `UserAlreadyExists` if the email or username is taken.
    async fn insert_member(&self, member: &Member) -> Result<(), AppError>;
    async fn find_member_by_id(&self, id: Uuid) -> Result<Option<Member>, AppError>;
    async fn find_member_by_email(&self, email: &str) -> Result<Option<Member>, AppError>;
    async fn find_member_by_username(&self, username: &str) -> Result<Option<Member>, AppError>;
    async fn update_member(&self, member: &Member) -> Result<bool, AppError>;
}

#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<(), AppError>;
    /// Only returns a record that is unrevoked and expires after `now`.
    async fn find_active_refresh_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, AppError>;
    /// Returns `false` when no unrevoked record matches.
    async fn revoke_refresh_token(&self, token_hash: &str) -> Result<bool, AppError>;
    async fn revoke_member_tokens(&self, member_id: Uuid) -> Result<u64, AppError>;
    /// Deletes records expired before `now` and revoked ones created before `revoked_before`.
    async fn delete_stale_tokens(
        &self,
        now: DateTime<Utc>,
        revoked_before: DateTime<Utc>,
    ) -> Result<u64, AppError>;
}

#[async_trait]
pub trait BoardRepository: Send + Sync {
    /// Inserts the board and its owner membership atomically.
    async fn create_board_with_owner(
        &self,
        board: &Board,
        owner: &BoardMember,
    ) -> Result<(), AppError>;
    async fn find_board_by_id(&self, id: Uuid) -> Result<Option<Board>, AppError>;
    async fn find_board_by_slug(&self, slug: &str) -> Result<Option<Board>, AppError>;
    /// Boards the member belongs to, newest first, plus the total before paging.
    async fn list_member_boards(
        &self,
        member_id: Uuid,
        starred_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<MemberBoard>, i64), AppError>;
    async fn update_board(&self, board: &Board) -> Result<bool, AppError>;
    async fn delete_board(&self, id: Uuid) -> Result<bool, AppError>;

    async fn find_board_member(
        &self,
        board_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<BoardMember>, AppError>;
    /// Fails with `AlreadyBoardMember` if the pair already exists.
    async fn insert_board_member(&self, membership: &BoardMember) -> Result<(), AppError>;
    async fn delete_board_member(&self, board_id: Uuid, member_id: Uuid)
        -> Result<bool, AppError>;
    async fn list_board_members(&self, board_id: Uuid)
        -> Result<Vec<BoardMemberProfile>, AppError>;
    async fn count_board_members(&self, board_id: Uuid) -> Result<i64, AppError>;

    /// Idempotent.
    async fn star_board(&self, board_id: Uuid, member_id: Uuid) -> Result<(), AppError>;
    /// Idempotent.
    async fn unstar_board(&self, board_id: Uuid, member_id: Uuid) -> Result<(), AppError>;
    async fn is_board_starred(&self, board_id: Uuid, member_id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait ListRepository: Send + Sync {
    async fn insert_list(&self, list: &List) -> Result<(), AppError>;
    async fn find_list_by_id(&self, id: Uuid) -> Result<Option<List>, AppError>;
    /// Unarchived lists ordered by position, then creation time.
    async fn lists_in_board(&self, board_id: Uuid) -> Result<Vec<List>, AppError>;
    async fn update_list(&self, list: &List) -> Result<bool, AppError>;
    async fn delete_list(&self, id: Uuid) -> Result<bool, AppError>;
    async fn max_list_position(&self, board_id: Uuid) -> Result<Option<f64>, AppError>;
    async fn count_lists_in_board(&self, board_id: Uuid) -> Result<i64, AppError>;
}

#[async_trait]
pub trait CardRepository: Send + Sync {
    async fn insert_card(&self, card: &Card) -> Result<(), AppError>;
    async fn find_card_by_id(&self, id: Uuid) -> Result<Option<Card>, AppError>;
    /// Unarchived cards ordered by position, then creation time.
    async fn cards_in_list(&self, list_id: Uuid) -> Result<Vec<Card>, AppError>;
    async fn update_card(&self, card: &Card) -> Result<bool, AppError>;
    async fn delete_card(&self, id: Uuid) -> Result<bool, AppError>;
    async fn max_card_position(&self, list_id: Uuid) -> Result<Option<f64>, AppError>;
    async fn count_cards_in_list(&self, list_id: Uuid) -> Result<i64, AppError>;
}

/// Every persistence capability the services need.
pub trait Repository:
    MemberRepository + TokenRepository + BoardRepository + ListRepository + CardRepository
{
}

impl<T> Repository for T where
    T: MemberRepository + TokenRepository + BoardRepository + ListRepository + CardRepository
{
}

pub type SharedRepository = Arc<dyn Repository>;
