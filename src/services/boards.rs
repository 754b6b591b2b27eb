use chrono::Utc;
use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use uuid::Uuid;

use super::membership::MembershipService;
use crate::auth::password::hash_password;
use crate::error::AppError;
use crate::models::{
    Board, BoardDetails, BoardListQuery, BoardMember, BoardPage, BoardRole, BoardSummary,
    BoardUpdate, ListSummary, NewBoard,
};
use crate::repository::SharedRepository;

pub const SLUG_MIN_LEN: usize = 3;
pub const SLUG_MAX_LEN: usize = 50;
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

lazy_static! {
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9-]+$").unwrap();
}

pub fn validate_slug(slug: &str) -> Result<(), AppError> {
    if slug.len() < SLUG_MIN_LEN {
        return Err(AppError::InvalidBoardSlug(format!(
            "must be at least {} characters",
            SLUG_MIN_LEN
        )));
    }
    if slug.len() > SLUG_MAX_LEN {
        return Err(AppError::InvalidBoardSlug(format!(
            "must be at most {} characters",
            SLUG_MAX_LEN
        )));
    }
    if !SLUG_REGEX.is_match(slug) {
        return Err(AppError::InvalidBoardSlug(
            "only lowercase letters, digits and hyphens are allowed".into(),
        ));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::ValidationError("name must not be empty".into()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct BoardService {
    repo: SharedRepository,
    membership: MembershipService,
}

impl BoardService {
    pub fn new(repo: SharedRepository, membership: MembershipService) -> Self {
        Self { repo, membership }
    }

    /// Creates the board and makes `creator_id` its owner in one atomic step.
    pub async fn create(&self, creator_id: Uuid, input: NewBoard) -> Result<Board, AppError> {
        validate_name(&input.name)?;
        validate_slug(&input.slug)?;
        if input.password.is_empty() {
            return Err(AppError::ValidationError(
                "board password must not be empty".into(),
            ));
        }
        if self.repo.find_board_by_slug(&input.slug).await?.is_some() {
            return Err(AppError::BoardAlreadyExists);
        }

        let password_hash = hash_password(&input.password)?;
        let board = Board::new(input, password_hash, creator_id);
        let owner = BoardMember::new(board.id, creator_id, BoardRole::Owner);
        self.repo.create_board_with_owner(&board, &owner).await?;

        info!("board {} ({}) created by {}", board.id, board.slug, creator_id);
        Ok(board)
    }

    pub async fn list_for_member(
        &self,
        member_id: Uuid,
        query: BoardListQuery,
    ) -> Result<BoardPage, AppError> {
        let limit = match query.limit {
            Some(limit) if (1..=MAX_PAGE_SIZE).contains(&limit) => limit,
            _ => DEFAULT_PAGE_SIZE,
        };
        let offset = query.offset.unwrap_or(0).max(0);

        let (entries, total) = self
            .repo
            .list_member_boards(member_id, query.starred, limit, offset)
            .await?;

        let mut boards = Vec::with_capacity(entries.len());
        for entry in entries {
            let member_count = self.repo.count_board_members(entry.board.id).await?;
            let list_count = self.repo.count_lists_in_board(entry.board.id).await?;
            boards.push(BoardSummary {
                entry,
                member_count,
                list_count,
            });
        }

        Ok(BoardPage {
            boards,
            total,
            limit,
            offset,
        })
    }

    pub async fn get_details(&self, board_id: Uuid, member_id: Uuid) -> Result<BoardDetails, AppError> {
        let board = self.membership.find_board(board_id).await?;
        let membership = self.membership.require_member(board_id, member_id).await?;

        let starred = self.repo.is_board_starred(board_id, member_id).await?;
        let mut lists = Vec::new();
        for list in self.repo.lists_in_board(board_id).await? {
            let card_count = self.repo.count_cards_in_list(list.id).await?;
            lists.push(ListSummary { list, card_count });
        }
        let members = self.repo.list_board_members(board_id).await?;

        Ok(BoardDetails {
            board,
            role: membership.role,
            starred,
            lists,
            members,
        })
    }

    pub async fn update(
        &self,
        board_id: Uuid,
        actor_id: Uuid,
        update: BoardUpdate,
    ) -> Result<Board, AppError> {
        let mut board = self.membership.find_board(board_id).await?;
        self.membership.require_owner(board_id, actor_id).await?;

        if let Some(name) = update.name {
            validate_name(&name)?;
            board.name = name;
        }

        if let Some(slug) = update.slug {
            if slug != board.slug {
                validate_slug(&slug)?;
                if let Some(other) = self.repo.find_board_by_slug(&slug).await? {
                    if other.id != board_id {
                        return Err(AppError::BoardAlreadyExists);
                    }
                }
                board.slug = slug;
            }
        }

        if let Some(description) = update.description {
            board.description = description;
        }

        if let Some(password) = update.password {
            if password.is_empty() {
                return Err(AppError::ValidationError(
                    "board password must not be empty".into(),
                ));
            }
            board.password_hash = hash_password(&password)?;
        }

        board.updated_at = Utc::now();
        if !self.repo.update_board(&board).await? {
            return Err(AppError::BoardNotFound);
        }
        Ok(board)
    }

    pub async fn delete(&self, board_id: Uuid, actor_id: Uuid) -> Result<(), AppError> {
        self.membership.find_board(board_id).await?;
        self.membership.require_owner(board_id, actor_id).await?;

        if !self.repo.delete_board(board_id).await? {
            return Err(AppError::BoardNotFound);
        }
        info!("board {} deleted by {}", board_id, actor_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_validation() {
        assert!(validate_slug("my-board-1").is_ok());
        assert!(validate_slug("abc").is_ok());
        assert!(validate_slug(&"a".repeat(50)).is_ok());

        assert!(matches!(
            validate_slug("My_Board"),
            Err(AppError::InvalidBoardSlug(_))
        ));
        assert!(matches!(
            validate_slug("ab"),
            Err(AppError::InvalidBoardSlug(msg)) if msg.contains("at least")
        ));
        assert!(validate_slug(&"a".repeat(51)).is_err());
        assert!(validate_slug("has space").is_err());
    }
}
