//! PostgreSQL adapter built on sqlx.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{BoardRepository, CardRepository, ListRepository, MemberRepository, TokenRepository};
use crate::error::AppError;
use crate::models::{
    Board, BoardMember, BoardMemberProfile, Card, List, Member, MemberBoard, RefreshToken,
};

const MEMBER_COLUMNS: &str =
    "id, email, username, full_name, password_hash, created_at, updated_at";
const BOARD_COLUMNS: &str =
    "id, name, slug, description, password_hash, creator_id, created_at, updated_at";
const LIST_COLUMNS: &str = "id, board_id, name, position, archived, created_at, updated_at";
const CARD_COLUMNS: &str =
    "id, list_id, title, description, position, archived, created_by, created_at, updated_at";

#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Turns a unique-constraint violation into a domain error. Foreign-key violations go
/// through [`missing_parent`]; everything else stays a database error.
fn on_unique_violation(error: sqlx::Error, map: impl FnOnce(Option<&str>) -> AppError) -> AppError {
    if let Some(db_error) = error.as_database_error() {
        if db_error.is_unique_violation() {
            return map(db_error.constraint());
        }
    }
    on_missing_parent(error)
}

/// A row that references a parent deleted in the meantime reports the parent as gone.
fn on_missing_parent(error: sqlx::Error) -> AppError {
    if let Some(db_error) = error.as_database_error() {
        if db_error.is_foreign_key_violation() {
            if let Some(not_found) = missing_parent(db_error.constraint()) {
                return not_found;
            }
        }
    }
    AppError::from(error)
}

fn missing_parent(constraint: Option<&str>) -> Option<AppError> {
    match constraint? {
        "lists_board_id_fkey" | "board_members_board_id_fkey" | "starred_boards_board_id_fkey" => {
            Some(AppError::BoardNotFound)
        }
        "cards_list_id_fkey" => Some(AppError::ListNotFound),
        "refresh_tokens_member_id_fkey"
        | "boards_creator_id_fkey"
        | "board_members_member_id_fkey"
        | "starred_boards_member_id_fkey"
        | "cards_created_by_fkey" => Some(AppError::UserNotFound),
        _ => None,
    }
}

#[async_trait]
impl MemberRepository for PgRepository {
    async fn insert_member(&self, member: &Member) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO members (id, email, username, full_name, password_hash, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(member.id)
        .bind(&member.email)
        .bind(&member.username)
        .bind(&member.full_name)
        .bind(&member.password_hash)
        .bind(member.created_at)
        .bind(member.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| on_unique_violation(e, |_| AppError::UserAlreadyExists))?;
        Ok(())
    }

    async fn find_member_by_id(&self, id: Uuid) -> Result<Option<Member>, AppError> {
        let sql = format!("SELECT {} FROM members WHERE id = $1", MEMBER_COLUMNS);
        Ok(sqlx::query_as::<_, Member>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_member_by_email(&self, email: &str) -> Result<Option<Member>, AppError> {
        let sql = format!("SELECT {} FROM members WHERE email = $1", MEMBER_COLUMNS);
        Ok(sqlx::query_as::<_, Member>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_member_by_username(&self, username: &str) -> Result<Option<Member>, AppError> {
        let sql = format!("SELECT {} FROM members WHERE username = $1", MEMBER_COLUMNS);
        Ok(sqlx::query_as::<_, Member>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_member(&self, member: &Member) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE members
             SET email = $1, username = $2, full_name = $3, password_hash = $4, updated_at = $5
             WHERE id = $6",
        )
        .bind(&member.email)
        .bind(&member.username)
        .bind(&member.full_name)
        .bind(&member.password_hash)
        .bind(member.updated_at)
        .bind(member.id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            on_unique_violation(e, |constraint| match constraint {
                Some("members_email_key") => AppError::EmailAlreadyTaken,
                _ => AppError::UsernameAlreadyTaken,
            })
        })?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TokenRepository for PgRepository {
    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO refresh_tokens (id, member_id, token_hash, expires_at, created_at, revoked)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(token.id)
        .bind(token.member_id)
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .bind(token.created_at)
        .bind(token.revoked)
        .execute(&self.pool)
        .await
        .map_err(on_missing_parent)?;
        Ok(())
    }

    async fn find_active_refresh_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, AppError> {
        Ok(sqlx::query_as::<_, RefreshToken>(
            "SELECT id, member_id, token_hash, expires_at, created_at, revoked
             FROM refresh_tokens
             WHERE token_hash = $1 AND revoked = FALSE AND expires_at > $2",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn revoke_refresh_token(&self, token_hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE WHERE token_hash = $1 AND revoked = FALSE",
        )
        .bind(token_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn revoke_member_tokens(&self, member_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE WHERE member_id = $1 AND revoked = FALSE",
        )
        .bind(member_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_stale_tokens(
        &self,
        now: DateTime<Utc>,
        revoked_before: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "DELETE FROM refresh_tokens
             WHERE expires_at < $1 OR (revoked = TRUE AND created_at < $2)",
        )
        .bind(now)
        .bind(revoked_before)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl BoardRepository for PgRepository {
    async fn create_board_with_owner(
        &self,
        board: &Board,
        owner: &BoardMember,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO boards (id, name, slug, description, password_hash, creator_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(board.id)
        .bind(&board.name)
        .bind(&board.slug)
        .bind(&board.description)
        .bind(&board.password_hash)
        .bind(board.creator_id)
        .bind(board.created_at)
        .bind(board.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| on_unique_violation(e, |_| AppError::BoardAlreadyExists))?;

        sqlx::query(
            "INSERT INTO board_members (id, board_id, member_id, role, joined_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(owner.id)
        .bind(owner.board_id)
        .bind(owner.member_id)
        .bind(owner.role)
        .bind(owner.joined_at)
        .execute(&mut *tx)
        .await
        .map_err(on_missing_parent)?;

        // Dropping `tx` on any early return above rolls both inserts back.
        tx.commit().await?;
        Ok(())
    }

    async fn find_board_by_id(&self, id: Uuid) -> Result<Option<Board>, AppError> {
        let sql = format!("SELECT {} FROM boards WHERE id = $1", BOARD_COLUMNS);
        Ok(sqlx::query_as::<_, Board>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_board_by_slug(&self, slug: &str) -> Result<Option<Board>, AppError> {
        let sql = format!("SELECT {} FROM boards WHERE slug = $1", BOARD_COLUMNS);
        Ok(sqlx::query_as::<_, Board>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_member_boards(
        &self,
        member_id: Uuid,
        starred_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<MemberBoard>, i64), AppError> {
        let boards = sqlx::query_as::<_, MemberBoard>(
            "SELECT b.id, b.name, b.slug, b.description, b.password_hash, b.creator_id,
                    b.created_at, b.updated_at, bm.role,
                    (sb.member_id IS NOT NULL) AS starred
             FROM boards b
             JOIN board_members bm ON bm.board_id = b.id AND bm.member_id = $1
             LEFT JOIN starred_boards sb ON sb.board_id = b.id AND sb.member_id = $1
             WHERE ($2 = FALSE OR sb.member_id IS NOT NULL)
             ORDER BY b.created_at DESC, b.id
             LIMIT $3 OFFSET $4",
        )
        .bind(member_id)
        .bind(starred_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*)
             FROM board_members bm
             LEFT JOIN starred_boards sb ON sb.board_id = bm.board_id AND sb.member_id = bm.member_id
             WHERE bm.member_id = $1 AND ($2 = FALSE OR sb.member_id IS NOT NULL)",
        )
        .bind(member_id)
        .bind(starred_only)
        .fetch_one(&self.pool)
        .await?;

        Ok((boards, total))
    }

    async fn update_board(&self, board: &Board) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE boards
             SET name = $1, slug = $2, description = $3, password_hash = $4, updated_at = $5
             WHERE id = $6",
        )
        .bind(&board.name)
        .bind(&board.slug)
        .bind(&board.description)
        .bind(&board.password_hash)
        .bind(board.updated_at)
        .bind(board.id)
        .execute(&self.pool)
        .await
        .map_err(|e| on_unique_violation(e, |_| AppError::BoardAlreadyExists))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_board(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_board_member(
        &self,
        board_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<BoardMember>, AppError> {
        Ok(sqlx::query_as::<_, BoardMember>(
            "SELECT id, board_id, member_id, role, joined_at
             FROM board_members WHERE board_id = $1 AND member_id = $2",
        )
        .bind(board_id)
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert_board_member(&self, membership: &BoardMember) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO board_members (id, board_id, member_id, role, joined_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(membership.id)
        .bind(membership.board_id)
        .bind(membership.member_id)
        .bind(membership.role)
        .bind(membership.joined_at)
        .execute(&self.pool)
        .await
        .map_err(|e| on_unique_violation(e, |_| AppError::AlreadyBoardMember))?;
        Ok(())
    }

    async fn delete_board_member(
        &self,
        board_id: Uuid,
        member_id: Uuid,
    ) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM board_members WHERE board_id = $1 AND member_id = $2")
                .bind(board_id)
                .bind(member_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_board_members(
        &self,
        board_id: Uuid,
    ) -> Result<Vec<BoardMemberProfile>, AppError> {
        Ok(sqlx::query_as::<_, BoardMemberProfile>(
            "SELECT m.id AS member_id, m.username, m.email, m.full_name, bm.role, bm.joined_at
             FROM board_members bm
             JOIN members m ON m.id = bm.member_id
             WHERE bm.board_id = $1
             ORDER BY bm.joined_at ASC",
        )
        .bind(board_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn count_board_members(&self, board_id: Uuid) -> Result<i64, AppError> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM board_members WHERE board_id = $1")
                .bind(board_id)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn star_board(&self, board_id: Uuid, member_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO starred_boards (id, board_id, member_id, starred_at)
             VALUES ($1, $2, $3, NOW())
             ON CONFLICT (board_id, member_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(board_id)
        .bind(member_id)
        .execute(&self.pool)
        .await
        .map_err(on_missing_parent)?;
        Ok(())
    }

    async fn unstar_board(&self, board_id: Uuid, member_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM starred_boards WHERE board_id = $1 AND member_id = $2")
            .bind(board_id)
            .bind(member_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn is_board_starred(&self, board_id: Uuid, member_id: Uuid) -> Result<bool, AppError> {
        Ok(sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM starred_boards WHERE board_id = $1 AND member_id = $2)",
        )
        .bind(board_id)
        .bind(member_id)
        .fetch_one(&self.pool)
        .await?)
    }
}

#[async_trait]
impl ListRepository for PgRepository {
    async fn insert_list(&self, list: &List) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO lists (id, board_id, name, position, archived, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(list.id)
        .bind(list.board_id)
        .bind(&list.name)
        .bind(list.position)
        .bind(list.archived)
        .bind(list.created_at)
        .bind(list.updated_at)
        .execute(&self.pool)
        .await
        .map_err(on_missing_parent)?;
        Ok(())
    }

    async fn find_list_by_id(&self, id: Uuid) -> Result<Option<List>, AppError> {
        let sql = format!("SELECT {} FROM lists WHERE id = $1", LIST_COLUMNS);
        Ok(sqlx::query_as::<_, List>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn lists_in_board(&self, board_id: Uuid) -> Result<Vec<List>, AppError> {
        let sql = format!(
            "SELECT {} FROM lists WHERE board_id = $1 AND archived = FALSE
             ORDER BY position ASC, created_at ASC, id ASC",
            LIST_COLUMNS
        );
        Ok(sqlx::query_as::<_, List>(&sql)
            .bind(board_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_list(&self, list: &List) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE lists SET name = $1, position = $2, archived = $3, updated_at = $4 WHERE id = $5",
        )
        .bind(&list.name)
        .bind(list.position)
        .bind(list.archived)
        .bind(list.updated_at)
        .bind(list.id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_list(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM lists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn max_list_position(&self, board_id: Uuid) -> Result<Option<f64>, AppError> {
        Ok(sqlx::query_scalar(
            "SELECT MAX(position) FROM lists WHERE board_id = $1 AND archived = FALSE",
        )
        .bind(board_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn count_lists_in_board(&self, board_id: Uuid) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar(
            "SELECT COUNT(*) FROM lists WHERE board_id = $1 AND archived = FALSE",
        )
        .bind(board_id)
        .fetch_one(&self.pool)
        .await?)
    }
}

#[async_trait]
impl CardRepository for PgRepository {
    async fn insert_card(&self, card: &Card) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO cards (id, list_id, title, description, position, archived, created_by, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(card.id)
        .bind(card.list_id)
        .bind(&card.title)
        .bind(&card.description)
        .bind(card.position)
        .bind(card.archived)
        .bind(card.created_by)
        .bind(card.created_at)
        .bind(card.updated_at)
        .execute(&self.pool)
        .await
        .map_err(on_missing_parent)?;
        Ok(())
    }

    async fn find_card_by_id(&self, id: Uuid) -> Result<Option<Card>, AppError> {
        let sql = format!("SELECT {} FROM cards WHERE id = $1", CARD_COLUMNS);
        Ok(sqlx::query_as::<_, Card>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn cards_in_list(&self, list_id: Uuid) -> Result<Vec<Card>, AppError> {
        let sql = format!(
            "SELECT {} FROM cards WHERE list_id = $1 AND archived = FALSE
             ORDER BY position ASC, created_at ASC, id ASC",
            CARD_COLUMNS
        );
        Ok(sqlx::query_as::<_, Card>(&sql)
            .bind(list_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_card(&self, card: &Card) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE cards
             SET list_id = $1, title = $2, description = $3, position = $4, archived = $5, updated_at = $6
             WHERE id = $7",
        )
        .bind(card.list_id)
        .bind(&card.title)
        .bind(&card.description)
        .bind(card.position)
        .bind(card.archived)
        .bind(card.updated_at)
        .bind(card.id)
        .execute(&self.pool)
        .await
        .map_err(on_missing_parent)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_card(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn max_card_position(&self, list_id: Uuid) -> Result<Option<f64>, AppError> {
        Ok(sqlx::query_scalar(
            "SELECT MAX(position) FROM cards WHERE list_id = $1 AND archived = FALSE",
        )
        .bind(list_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn count_cards_in_list(&self, list_id: Uuid) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar(
            "SELECT COUNT(*) FROM cards WHERE list_id = $1 AND archived = FALSE",
        )
        .bind(list_id)
        .fetch_one(&self.pool)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parent_maps_to_not_found() {
        for constraint in [
            "lists_board_id_fkey",
            "board_members_board_id_fkey",
            "starred_boards_board_id_fkey",
        ] {
            assert!(matches!(
                missing_parent(Some(constraint)),
                Some(AppError::BoardNotFound)
            ));
        }
        assert!(matches!(
            missing_parent(Some("cards_list_id_fkey")),
            Some(AppError::ListNotFound)
        ));
        assert!(matches!(
            missing_parent(Some("board_members_member_id_fkey")),
            Some(AppError::UserNotFound)
        ));
    }

    #[test]
    fn test_unknown_constraints_stay_database_errors() {
        assert!(missing_parent(Some("some_other_fkey")).is_none());
        assert!(missing_parent(None).is_none());
        assert!(matches!(
            on_missing_parent(sqlx::Error::RowNotFound),
            AppError::DatabaseError(_)
        ));
    }
}
