pub mod boards;
pub mod cards;
pub mod identity;
pub mod lists;
pub mod membership;
pub mod position;
pub mod sweeper;

use std::sync::Arc;

use crate::auth::TokenManager;
use crate::repository::SharedRepository;

pub use boards::BoardService;
pub use cards::CardService;
pub use identity::IdentityService;
pub use lists::ListService;
pub use membership::MembershipService;

/// Shared application state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub identity: IdentityService,
    pub membership: MembershipService,
    pub boards: BoardService,
    pub lists: ListService,
    pub cards: CardService,
}

impl AppState {
    pub fn new(repo: SharedRepository, tokens: Arc<TokenManager>) -> Self {
        let membership = MembershipService::new(repo.clone());
        Self {
            identity: IdentityService::new(repo.clone(), tokens),
            boards: BoardService::new(repo.clone(), membership.clone()),
            lists: ListService::new(repo.clone(), membership.clone()),
            cards: CardService::new(repo, membership.clone()),
            membership,
        }
    }
}
