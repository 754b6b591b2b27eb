#![allow(dead_code)]

use std::sync::Arc;

use taskboard::auth::TokenManager;
use taskboard::models::{Board, Member, NewBoard, NewMember};
use taskboard::repository::{InMemoryRepository, SharedRepository};
use taskboard::{AppState, JwtConfig};

pub const PASSWORD: &str = "password123";
pub const BOARD_PASSWORD: &str = "secret123";

pub struct TestContext {
    pub repo: Arc<InMemoryRepository>,
    pub tokens: Arc<TokenManager>,
    pub state: AppState,
}

pub fn jwt_config() -> JwtConfig {
    JwtConfig::new("integration-test-secret", 900, 86400).expect("valid jwt config")
}

pub fn context() -> TestContext {
    let repo = Arc::new(InMemoryRepository::new());
    let tokens = Arc::new(TokenManager::new(&jwt_config()));
    let shared: SharedRepository = repo.clone();
    let state = AppState::new(shared, tokens.clone());
    TestContext {
        repo,
        tokens,
        state,
    }
}

pub async fn register(state: &AppState, username: &str) -> Member {
    state
        .identity
        .register(NewMember {
            email: format!("{}@example.com", username),
            username: username.to_string(),
            full_name: None,
            password: PASSWORD.to_string(),
        })
        .await
        .expect("registration succeeds")
}

pub fn new_board(slug: &str) -> NewBoard {
    NewBoard {
        name: format!("Board {}", slug),
        slug: slug.to_string(),
        description: None,
        password: BOARD_PASSWORD.to_string(),
    }
}

pub async fn create_board(state: &AppState, owner: &Member, slug: &str) -> Board {
    state
        .boards
        .create(owner.id, new_board(slug))
        .await
        .expect("board creation succeeds")
}
