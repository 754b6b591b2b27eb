//! Gap-based fractional ordering for lists and cards.
//!
//! Positions are `f64` keys sorted ascending. A new item without an explicit position
//! goes one gap after the current maximum of its unarchived siblings. Ties are not
//! prevented; readers break them by creation time, then id.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Card, List};

/// Spacing between consecutively appended items.
pub const POSITION_GAP: f64 = 65536.0;

/// Position for an item appended after siblings whose maximum is `max_sibling`.
pub fn next_position(max_sibling: Option<f64>) -> f64 {
    max_sibling.unwrap_or(0.0) + POSITION_GAP
}

/// Accepts a caller-supplied position verbatim, zero included.
pub fn validate_position(position: f64) -> Result<f64, AppError> {
    if position.is_finite() {
        Ok(position)
    } else {
        Err(AppError::ValidationError(
            "position must be a finite number".into(),
        ))
    }
}

/// Uses `explicit` when given, otherwise appends after `max_sibling`.
pub fn resolve_position(explicit: Option<f64>, max_sibling: Option<f64>) -> Result<f64, AppError> {
    match explicit {
        Some(position) => validate_position(position),
        None => Ok(next_position(max_sibling)),
    }
}

pub trait Positioned {
    fn position(&self) -> f64;
    fn created_at(&self) -> DateTime<Utc>;
    fn id(&self) -> Uuid;
}

impl Positioned for List {
    fn position(&self) -> f64 {
        self.position
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Positioned for Card {
    fn position(&self) -> f64 {
        self.position
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn id(&self) -> Uuid {
        self.id
    }
}

pub fn compare_positioned<T: Positioned>(a: &T, b: &T) -> Ordering {
    a.position()
        .total_cmp(&b.position())
        .then_with(|| a.created_at().cmp(&b.created_at()))
        .then_with(|| a.id().cmp(&b.id()))
}

pub fn sort_positioned<T: Positioned>(items: &mut [T]) {
    items.sort_by(compare_positioned);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_first_item_gets_one_gap() {
        assert_eq!(next_position(None), 65536.0);
    }

    #[test]
    fn test_append_after_max() {
        let siblings = [65536.0_f64, 131072.0];
        let max = siblings.iter().copied().max_by(f64::total_cmp);
        assert_eq!(next_position(max), 196608.0);
    }

    #[test]
    fn test_explicit_position_is_verbatim() {
        assert_eq!(resolve_position(Some(0.0), Some(131072.0)).unwrap(), 0.0);
        assert_eq!(resolve_position(Some(-12.5), None).unwrap(), -12.5);
        assert_eq!(resolve_position(None, Some(10.0)).unwrap(), 65546.0);
    }

    #[test]
    fn test_non_finite_positions_are_rejected() {
        assert!(resolve_position(Some(f64::NAN), None).is_err());
        assert!(resolve_position(Some(f64::INFINITY), None).is_err());
    }

    #[test]
    fn test_ties_break_on_creation_time() {
        let board_id = Uuid::new_v4();
        let mut later = List::new(board_id, "later".into(), 65536.0);
        later.created_at = later.created_at + Duration::seconds(5);
        let earlier = List::new(board_id, "earlier".into(), 65536.0);
        let first = List::new(board_id, "first".into(), 1.0);

        let mut lists = vec![later, earlier, first];
        sort_positioned(&mut lists);

        let names: Vec<&str> = lists.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["first", "earlier", "later"]);
    }
}
