//! Board-scoped authorization and membership changes.
//!
//! Every check reads the membership row again; nothing is cached between calls.

use log::info;
use uuid::Uuid;

use crate::auth::password::verify_password;
use crate::error::AppError;
use crate::models::{Board, BoardMember, BoardRole};
use crate::repository::SharedRepository;

#[derive(Clone)]
pub struct MembershipService {
    repo: SharedRepository,
}

impl MembershipService {
    pub fn new(repo: SharedRepository) -> Self {
        Self { repo }
    }

    pub async fn find_board(&self, board_id: Uuid) -> Result<Board, AppError> {
        self.repo
            .find_board_by_id(board_id)
            .await?
            .ok_or(AppError::BoardNotFound)
    }

    /// Fails with `NotBoardMember` unless the member belongs to the board.
    pub async fn require_member(
        &self,
        board_id: Uuid,
        member_id: Uuid,
    ) -> Result<BoardMember, AppError> {
        self.repo
            .find_board_member(board_id, member_id)
            .await?
            .ok_or(AppError::NotBoardMember)
    }

    /// Fails with `NotBoardMember` or `NotBoardOwner`.
    pub async fn require_owner(
        &self,
        board_id: Uuid,
        member_id: Uuid,
    ) -> Result<BoardMember, AppError> {
        let membership = self.require_member(board_id, member_id).await?;
        if !membership.role.is_owner() {
            return Err(AppError::NotBoardOwner);
        }
        Ok(membership)
    }

    pub async fn join(&self, slug: &str, password: &str, member_id: Uuid) -> Result<Board, AppError> {
        let board = self
            .repo
            .find_board_by_slug(slug)
            .await?
            .ok_or(AppError::BoardNotFound)?;

        if self
            .repo
            .find_board_member(board.id, member_id)
            .await?
            .is_some()
        {
            return Err(AppError::AlreadyBoardMember);
        }

        if !verify_password(password, &board.password_hash)? {
            return Err(AppError::InvalidBoardPassword);
        }

        self.repo
            .insert_board_member(&BoardMember::new(board.id, member_id, BoardRole::Member))
            .await?;
        info!("member {} joined board {}", member_id, board.id);
        Ok(board)
    }

    /// Removes `target_id` from the board. Members may remove themselves; removing
    /// anyone else takes an owner, and an owner may not remove themselves.
    pub async fn remove_member(
        &self,
        board_id: Uuid,
        target_id: Uuid,
        actor_id: Uuid,
    ) -> Result<(), AppError> {
        self.find_board(board_id).await?;
        let actor = self.require_member(board_id, actor_id).await?;

        if actor_id == target_id {
            if actor.role.is_owner() {
                return Err(AppError::CannotRemoveOwner);
            }
        } else {
            if !actor.role.is_owner() {
                return Err(AppError::NotBoardOwner);
            }
            if self
                .repo
                .find_board_member(board_id, target_id)
                .await?
                .is_none()
            {
                return Err(AppError::BoardMemberNotFound);
            }
        }

        if !self.repo.delete_board_member(board_id, target_id).await? {
            return Err(AppError::BoardMemberNotFound);
        }
        info!(
            "member {} removed from board {} by {}",
            target_id, board_id, actor_id
        );
        Ok(())
    }

    pub async fn star(&self, board_id: Uuid, member_id: Uuid) -> Result<(), AppError> {
        self.find_board(board_id).await?;
        self.require_member(board_id, member_id).await?;
        self.repo.star_board(board_id, member_id).await
    }

    pub async fn unstar(&self, board_id: Uuid, member_id: Uuid) -> Result<(), AppError> {
        self.find_board(board_id).await?;
        self.require_member(board_id, member_id).await?;
        self.repo.unstar_board(board_id, member_id).await
    }
}
