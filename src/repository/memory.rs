//! In-process repository backed by hash maps behind a single lock.
//!
//! Mirrors the uniqueness rules and cascades of the PostgreSQL schema so the services
//! behave the same on either adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::{BoardRepository, CardRepository, ListRepository, MemberRepository, TokenRepository};
use crate::error::AppError;
use crate::models::{
    Board, BoardMember, BoardMemberProfile, Card, List, Member, MemberBoard, RefreshToken,
};
use crate::services::position::sort_positioned;

#[derive(Debug, Clone, Default)]
struct State {
    members: HashMap<Uuid, Member>,
    refresh_tokens: Vec<RefreshToken>,
    boards: HashMap<Uuid, Board>,
    board_members: Vec<BoardMember>,
    stars: HashMap<(Uuid, Uuid), DateTime<Utc>>,
    lists: HashMap<Uuid, List>,
    cards: HashMap<Uuid, Card>,
}

impl State {
    fn membership(&self, board_id: Uuid, member_id: Uuid) -> Option<&BoardMember> {
        self.board_members
            .iter()
            .find(|m| m.board_id == board_id && m.member_id == member_id)
    }

    fn add_board_member(&mut self, membership: &BoardMember) -> Result<(), AppError> {
        if !self.boards.contains_key(&membership.board_id) {
            return Err(AppError::BoardNotFound);
        }
        if self
            .membership(membership.board_id, membership.member_id)
            .is_some()
        {
            return Err(AppError::AlreadyBoardMember);
        }
        self.board_members.push(membership.clone());
        Ok(())
    }

    fn check_member_unique(&self, member: &Member) -> Result<(), AppError> {
        let others = self.members.values().filter(|m| m.id != member.id);
        for other in others {
            if other.email == member.email {
                return Err(AppError::EmailAlreadyTaken);
            }
            if other.username == member.username {
                return Err(AppError::UsernameAlreadyTaken);
            }
        }
        Ok(())
    }

    fn remove_list_cascade(&mut self, list_id: Uuid) {
        self.lists.remove(&list_id);
        self.cards.retain(|_, card| card.list_id != list_id);
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: RwLock<State>,
    fail_owner_insert: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the owner-membership step of the next board creation fail.
    pub fn fail_next_owner_insert(&self) {
        self.fail_owner_insert.store(true, Ordering::SeqCst);
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, AppError> {
        self.state
            .read()
            .map_err(|_| AppError::DatabaseError("in-memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, AppError> {
        self.state
            .write()
            .map_err(|_| AppError::DatabaseError("in-memory store lock poisoned".into()))
    }
}

#[async_trait]
impl MemberRepository for InMemoryRepository {
    async fn insert_member(&self, member: &Member) -> Result<(), AppError> {
        let mut state = self.write()?;
        if state
            .members
            .values()
            .any(|m| m.email == member.email || m.username == member.username)
        {
            return Err(AppError::UserAlreadyExists);
        }
        state.members.insert(member.id, member.clone());
        Ok(())
    }

    async fn find_member_by_id(&self, id: Uuid) -> Result<Option<Member>, AppError> {
        Ok(self.read()?.members.get(&id).cloned())
    }

    async fn find_member_by_email(&self, email: &str) -> Result<Option<Member>, AppError> {
        Ok(self
            .read()?
            .members
            .values()
            .find(|m| m.email == email)
            .cloned())
    }

    async fn find_member_by_username(&self, username: &str) -> Result<Option<Member>, AppError> {
        Ok(self
            .read()?
            .members
            .values()
            .find(|m| m.username == username)
            .cloned())
    }

    async fn update_member(&self, member: &Member) -> Result<bool, AppError> {
        let mut state = self.write()?;
        if !state.members.contains_key(&member.id) {
            return Ok(false);
        }
        state.check_member_unique(member)?;
        state.members.insert(member.id, member.clone());
        Ok(true)
    }
}

#[async_trait]
impl TokenRepository for InMemoryRepository {
    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<(), AppError> {
        self.write()?.refresh_tokens.push(token.clone());
        Ok(())
    }

    async fn find_active_refresh_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, AppError> {
        Ok(self
            .read()?
            .refresh_tokens
            .iter()
            .find(|t| t.token_hash == token_hash && t.is_active(now))
            .cloned())
    }

    async fn revoke_refresh_token(&self, token_hash: &str) -> Result<bool, AppError> {
        let mut state = self.write()?;
        let mut revoked = false;
        for token in state
            .refresh_tokens
            .iter_mut()
            .filter(|t| t.token_hash == token_hash && !t.revoked)
        {
            token.revoked = true;
            revoked = true;
        }
        Ok(revoked)
    }

    async fn revoke_member_tokens(&self, member_id: Uuid) -> Result<u64, AppError> {
        let mut state = self.write()?;
        let mut count = 0;
        for token in state
            .refresh_tokens
            .iter_mut()
            .filter(|t| t.member_id == member_id && !t.revoked)
        {
            token.revoked = true;
            count += 1;
        }
        Ok(count)
    }

    async fn delete_stale_tokens(
        &self,
        now: DateTime<Utc>,
        revoked_before: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let mut state = self.write()?;
        let before = state.refresh_tokens.len();
        state.refresh_tokens.retain(|t| {
            let expired = t.expires_at < now;
            let long_revoked = t.revoked && t.created_at < revoked_before;
            !(expired || long_revoked)
        });
        Ok((before - state.refresh_tokens.len()) as u64)
    }
}

#[async_trait]
impl BoardRepository for InMemoryRepository {
    async fn create_board_with_owner(
        &self,
        board: &Board,
        owner: &BoardMember,
    ) -> Result<(), AppError> {
        let mut state = self.write()?;
        if state.boards.values().any(|b| b.slug == board.slug) {
            return Err(AppError::BoardAlreadyExists);
        }

        // Both inserts go into a scratch copy that only replaces the live state on success.
        let mut staged = state.clone();
        staged.boards.insert(board.id, board.clone());
        if self.fail_owner_insert.swap(false, Ordering::SeqCst) {
            return Err(AppError::DatabaseError(
                "injected failure inserting owner membership".into(),
            ));
        }
        staged.add_board_member(owner)?;

        *state = staged;
        Ok(())
    }

    async fn find_board_by_id(&self, id: Uuid) -> Result<Option<Board>, AppError> {
        Ok(self.read()?.boards.get(&id).cloned())
    }

    async fn find_board_by_slug(&self, slug: &str) -> Result<Option<Board>, AppError> {
        Ok(self
            .read()?
            .boards
            .values()
            .find(|b| b.slug == slug)
            .cloned())
    }

    async fn list_member_boards(
        &self,
        member_id: Uuid,
        starred_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<MemberBoard>, i64), AppError> {
        let state = self.read()?;
        let mut entries: Vec<MemberBoard> = state
            .board_members
            .iter()
            .filter(|m| m.member_id == member_id)
            .filter_map(|m| {
                let board = state.boards.get(&m.board_id)?;
                let starred = state.stars.contains_key(&(board.id, member_id));
                Some(MemberBoard {
                    board: board.clone(),
                    role: m.role,
                    starred,
                })
            })
            .filter(|entry| !starred_only || entry.starred)
            .collect();

        entries.sort_by(|a, b| {
            b.board
                .created_at
                .cmp(&a.board.created_at)
                .then_with(|| a.board.id.cmp(&b.board.id))
        });
        let total = entries.len() as i64;
        let page = entries
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn update_board(&self, board: &Board) -> Result<bool, AppError> {
        let mut state = self.write()?;
        if !state.boards.contains_key(&board.id) {
            return Ok(false);
        }
        if state
            .boards
            .values()
            .any(|b| b.id != board.id && b.slug == board.slug)
        {
            return Err(AppError::BoardAlreadyExists);
        }
        state.boards.insert(board.id, board.clone());
        Ok(true)
    }

    async fn delete_board(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.write()?;
        if state.boards.remove(&id).is_none() {
            return Ok(false);
        }
        let list_ids: Vec<Uuid> = state
            .lists
            .values()
            .filter(|l| l.board_id == id)
            .map(|l| l.id)
            .collect();
        for list_id in list_ids {
            state.remove_list_cascade(list_id);
        }
        state.board_members.retain(|m| m.board_id != id);
        state.stars.retain(|(board_id, _), _| *board_id != id);
        Ok(true)
    }

    async fn find_board_member(
        &self,
        board_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<BoardMember>, AppError> {
        Ok(self.read()?.membership(board_id, member_id).cloned())
    }

    async fn insert_board_member(&self, membership: &BoardMember) -> Result<(), AppError> {
        self.write()?.add_board_member(membership)
    }

    async fn delete_board_member(
        &self,
        board_id: Uuid,
        member_id: Uuid,
    ) -> Result<bool, AppError> {
        let mut state = self.write()?;
        let before = state.board_members.len();
        state
            .board_members
            .retain(|m| !(m.board_id == board_id && m.member_id == member_id));
        Ok(state.board_members.len() < before)
    }

    async fn list_board_members(
        &self,
        board_id: Uuid,
    ) -> Result<Vec<BoardMemberProfile>, AppError> {
        let state = self.read()?;
        let mut profiles: Vec<BoardMemberProfile> = state
            .board_members
            .iter()
            .filter(|m| m.board_id == board_id)
            .filter_map(|m| {
                let member = state.members.get(&m.member_id)?;
                Some(BoardMemberProfile {
                    member_id: member.id,
                    username: member.username.clone(),
                    email: member.email.clone(),
                    full_name: member.full_name.clone(),
                    role: m.role,
                    joined_at: m.joined_at,
                })
            })
            .collect();
        profiles.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        Ok(profiles)
    }

    async fn count_board_members(&self, board_id: Uuid) -> Result<i64, AppError> {
        Ok(self
            .read()?
            .board_members
            .iter()
            .filter(|m| m.board_id == board_id)
            .count() as i64)
    }

    async fn star_board(&self, board_id: Uuid, member_id: Uuid) -> Result<(), AppError> {
        let mut state = self.write()?;
        if !state.boards.contains_key(&board_id) {
            return Err(AppError::BoardNotFound);
        }
        state.stars.entry((board_id, member_id)).or_insert_with(Utc::now);
        Ok(())
    }

    async fn unstar_board(&self, board_id: Uuid, member_id: Uuid) -> Result<(), AppError> {
        self.write()?.stars.remove(&(board_id, member_id));
        Ok(())
    }

    async fn is_board_starred(&self, board_id: Uuid, member_id: Uuid) -> Result<bool, AppError> {
        Ok(self.read()?.stars.contains_key(&(board_id, member_id)))
    }
}

#[async_trait]
impl ListRepository for InMemoryRepository {
    async fn insert_list(&self, list: &List) -> Result<(), AppError> {
        let mut state = self.write()?;
        if !state.boards.contains_key(&list.board_id) {
            return Err(AppError::BoardNotFound);
        }
        state.lists.insert(list.id, list.clone());
        Ok(())
    }

    async fn find_list_by_id(&self, id: Uuid) -> Result<Option<List>, AppError> {
        Ok(self.read()?.lists.get(&id).cloned())
    }

    async fn lists_in_board(&self, board_id: Uuid) -> Result<Vec<List>, AppError> {
        let mut lists: Vec<List> = self
            .read()?
            .lists
            .values()
            .filter(|l| l.board_id == board_id && !l.archived)
            .cloned()
            .collect();
        sort_positioned(&mut lists);
        Ok(lists)
    }

    async fn update_list(&self, list: &List) -> Result<bool, AppError> {
        let mut state = self.write()?;
        match state.lists.get_mut(&list.id) {
            Some(existing) => {
                *existing = list.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_list(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.write()?;
        if !state.lists.contains_key(&id) {
            return Ok(false);
        }
        state.remove_list_cascade(id);
        Ok(true)
    }

    async fn max_list_position(&self, board_id: Uuid) -> Result<Option<f64>, AppError> {
        Ok(self
            .read()?
            .lists
            .values()
            .filter(|l| l.board_id == board_id && !l.archived)
            .map(|l| l.position)
            .max_by(f64::total_cmp))
    }

    async fn count_lists_in_board(&self, board_id: Uuid) -> Result<i64, AppError> {
        Ok(self
            .read()?
            .lists
            .values()
            .filter(|l| l.board_id == board_id && !l.archived)
            .count() as i64)
    }
}

#[async_trait]
impl CardRepository for InMemoryRepository {
    async fn insert_card(&self, card: &Card) -> Result<(), AppError> {
        let mut state = self.write()?;
        if !state.lists.contains_key(&card.list_id) {
            return Err(AppError::ListNotFound);
        }
        state.cards.insert(card.id, card.clone());
        Ok(())
    }

    async fn find_card_by_id(&self, id: Uuid) -> Result<Option<Card>, AppError> {
        Ok(self.read()?.cards.get(&id).cloned())
    }

    async fn cards_in_list(&self, list_id: Uuid) -> Result<Vec<Card>, AppError> {
        let mut cards: Vec<Card> = self
            .read()?
            .cards
            .values()
            .filter(|c| c.list_id == list_id && !c.archived)
            .cloned()
            .collect();
        sort_positioned(&mut cards);
        Ok(cards)
    }

    async fn update_card(&self, card: &Card) -> Result<bool, AppError> {
        let mut state = self.write()?;
        if !state.lists.contains_key(&card.list_id) {
            return Err(AppError::ListNotFound);
        }
        match state.cards.get_mut(&card.id) {
            Some(existing) => {
                *existing = card.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_card(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.write()?.cards.remove(&id).is_some())
    }

    async fn max_card_position(&self, list_id: Uuid) -> Result<Option<f64>, AppError> {
        Ok(self
            .read()?
            .cards
            .values()
            .filter(|c| c.list_id == list_id && !c.archived)
            .map(|c| c.position)
            .max_by(f64::total_cmp))
    }

    async fn count_cards_in_list(&self, list_id: Uuid) -> Result<i64, AppError> {
        Ok(self
            .read()?
            .cards
            .values()
            .filter(|c| c.list_id == list_id && !c.archived)
            .count() as i64)
    }
}
