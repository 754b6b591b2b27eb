use chrono::Utc;
use uuid::Uuid;

use super::membership::MembershipService;
use super::position::{next_position, resolve_position, validate_position};
use crate::error::AppError;
use crate::models::{List, ListUpdate, ListWithCards, NewList};
use crate::repository::SharedRepository;

#[derive(Clone)]
pub struct ListService {
    repo: SharedRepository,
    membership: MembershipService,
}

impl ListService {
    pub fn new(repo: SharedRepository, membership: MembershipService) -> Self {
        Self { repo, membership }
    }

    async fn find_list(&self, list_id: Uuid) -> Result<List, AppError> {
        self.repo
            .find_list_by_id(list_id)
            .await?
            .ok_or(AppError::ListNotFound)
    }

    pub async fn create(&self, actor_id: Uuid, input: NewList) -> Result<List, AppError> {
        self.membership.find_board(input.board_id).await?;
        self.membership
            .require_member(input.board_id, actor_id)
            .await?;

        if input.name.trim().is_empty() {
            return Err(AppError::ValidationError("name must not be empty".into()));
        }

        let position = match input.position {
            Some(position) => validate_position(position)?,
            None => next_position(self.repo.max_list_position(input.board_id).await?),
        };

        let list = List::new(input.board_id, input.name, position);
        self.repo.insert_list(&list).await?;
        Ok(list)
    }

    pub async fn get_with_cards(&self, list_id: Uuid, actor_id: Uuid) -> Result<ListWithCards, AppError> {
        let list = self.find_list(list_id).await?;
        self.membership.require_member(list.board_id, actor_id).await?;

        let cards = self.repo.cards_in_list(list_id).await?;
        Ok(ListWithCards { list, cards })
    }

    pub async fn update(
        &self,
        list_id: Uuid,
        actor_id: Uuid,
        update: ListUpdate,
    ) -> Result<List, AppError> {
        let mut list = self.find_list(list_id).await?;
        self.membership.require_member(list.board_id, actor_id).await?;

        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(AppError::ValidationError("name must not be empty".into()));
            }
            list.name = name;
        }
        if let Some(position) = update.position {
            list.position = resolve_position(Some(position), None)?;
        }
        if let Some(archived) = update.archived {
            list.archived = archived;
        }

        list.updated_at = Utc::now();
        if !self.repo.update_list(&list).await? {
            return Err(AppError::ListNotFound);
        }
        Ok(list)
    }

    /// Deletes the list and every card in it.
    pub async fn delete(&self, list_id: Uuid, actor_id: Uuid) -> Result<(), AppError> {
        let list = self.find_list(list_id).await?;
        self.membership.require_member(list.board_id, actor_id).await?;

        if !self.repo.delete_list(list_id).await? {
            return Err(AppError::ListNotFound);
        }
        Ok(())
    }
}
