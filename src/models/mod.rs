pub mod board;
pub mod card;
pub mod list;
pub mod member;

use serde::{Deserialize, Deserializer};

pub use board::{
    Board, BoardDetails, BoardListQuery, BoardMember, BoardMemberProfile, BoardPage, BoardRole,
    BoardSummary, BoardUpdate, JoinBoardInput, MemberBoard, NewBoard,
};
pub use card::{Card, CardUpdate, NewCard};
pub use list::{List, ListSummary, ListUpdate, ListWithCards, NewList};
pub use member::{Member, NewMember, ProfileUpdate, RefreshToken};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
///
/// Use together with `#[serde(default)]` so a missing key stays `None`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
