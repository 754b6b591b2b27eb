use chrono::Utc;
use uuid::Uuid;

use super::membership::MembershipService;
use super::position::{next_position, validate_position};
use crate::error::AppError;
use crate::models::{Card, CardUpdate, List, NewCard};
use crate::repository::SharedRepository;

#[derive(Clone)]
pub struct CardService {
    repo: SharedRepository,
    membership: MembershipService,
}

impl CardService {
    pub fn new(repo: SharedRepository, membership: MembershipService) -> Self {
        Self { repo, membership }
    }

    async fn find_list(&self, list_id: Uuid) -> Result<List, AppError> {
        self.repo
            .find_list_by_id(list_id)
            .await?
            .ok_or(AppError::ListNotFound)
    }

    /// Resolves card → list, authorizing the actor against the owning board.
    async fn resolve(&self, card_id: Uuid, actor_id: Uuid) -> Result<(Card, List), AppError> {
        let card = self
            .repo
            .find_card_by_id(card_id)
            .await?
            .ok_or(AppError::CardNotFound)?;
        // A card whose list vanished underneath us is gone as well.
        let list = self
            .repo
            .find_list_by_id(card.list_id)
            .await?
            .ok_or(AppError::CardNotFound)?;
        self.membership.require_member(list.board_id, actor_id).await?;
        Ok((card, list))
    }

    pub async fn create(&self, actor_id: Uuid, input: NewCard) -> Result<Card, AppError> {
        let list = self.find_list(input.list_id).await?;
        self.membership.require_member(list.board_id, actor_id).await?;

        if input.title.trim().is_empty() {
            return Err(AppError::ValidationError("title must not be empty".into()));
        }

        let position = match input.position {
            Some(position) => validate_position(position)?,
            None => next_position(self.repo.max_card_position(list.id).await?),
        };

        let card = Card::new(input, position, actor_id);
        self.repo.insert_card(&card).await?;
        Ok(card)
    }

    pub async fn get(&self, card_id: Uuid, actor_id: Uuid) -> Result<Card, AppError> {
        let (card, _) = self.resolve(card_id, actor_id).await?;
        Ok(card)
    }

    /// Applies a partial update. Changing `list_id` moves the card within the same board.
    pub async fn update(
        &self,
        card_id: Uuid,
        actor_id: Uuid,
        update: CardUpdate,
    ) -> Result<Card, AppError> {
        let (mut card, current_list) = self.resolve(card_id, actor_id).await?;

        if let Some(title) = update.title {
            if title.trim().is_empty() {
                return Err(AppError::ValidationError("title must not be empty".into()));
            }
            card.title = title;
        }
        if let Some(description) = update.description {
            card.description = description;
        }
        if let Some(archived) = update.archived {
            card.archived = archived;
        }

        let moving_to = update.list_id.filter(|id| *id != current_list.id);
        if let Some(target_id) = moving_to {
            let target = self.find_list(target_id).await?;
            if target.board_id != current_list.board_id {
                return Err(AppError::CardMoveAcrossBoards);
            }
            card.list_id = target.id;
            card.position = match update.position {
                Some(position) => validate_position(position)?,
                None => next_position(self.repo.max_card_position(target.id).await?),
            };
        } else if let Some(position) = update.position {
            card.position = validate_position(position)?;
        }

        card.updated_at = Utc::now();
        if !self.repo.update_card(&card).await? {
            return Err(AppError::CardNotFound);
        }
        Ok(card)
    }

    pub async fn delete(&self, card_id: Uuid, actor_id: Uuid) -> Result<(), AppError> {
        self.resolve(card_id, actor_id).await?;
        if !self.repo.delete_card(card_id).await? {
            return Err(AppError::CardNotFound);
        }
        Ok(())
    }
}
