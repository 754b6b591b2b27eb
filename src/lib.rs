#![doc = "The `taskboard` library crate."]
#![doc = ""]
#![doc = "Backend core for a collaborative task board: boards hold ordered lists, lists hold"]
#![doc = "ordered cards, and access is scoped by board membership. The crate provides the"]
#![doc = "identity and token lifecycle, board-scoped authorization, fractional ordering,"]
#![doc = "persistence adapters and the HTTP routes used by the `taskboard` binary."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;

pub use crate::config::{Config, JwtConfig};
pub use crate::error::{AppError, ErrorKind};
pub use crate::services::AppState;
