//! Review Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use thiserror::Error;

use crate::{
    domain::{UnknownVariant, books::records::BookUuid, users::records::UserUuid},
    uuids::TypedUuid,
};

/// Review UUID
pub type ReviewUuid = TypedUuid<ReviewRecord>;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("rating must be between 1 and 5, got {0}")]
pub struct InvalidRating(pub u8);

/// Star rating, 1 to 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(u8);

impl Rating {
    /// # Errors
    ///
    /// Returns [`InvalidRating`] outside `1..=5`.
    pub const fn new(value: u8) -> Result<Self, InvalidRating> {
        if value >= MIN_RATING && value <= MAX_RATING {
            Ok(Self(value))
        } else {
            Err(InvalidRating(value))
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = InvalidRating;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Admin decision on a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Moderation {
    /// Keep the review visible and clear any flag.
    Approve,
    /// Hide the review from listings and aggregates.
    Remove,
}

impl Moderation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Remove => "remove",
        }
    }

    pub(crate) const fn keeps_active(self) -> bool {
        matches!(self, Self::Approve)
    }
}

impl fmt::Display for Moderation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Moderation {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Self::Approve),
            "remove" => Ok(Self::Remove),
            other => Err(UnknownVariant::new("moderation", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRecord {
    pub uuid: ReviewUuid,
    pub book_uuid: BookUuid,
    pub user_uuid: UserUuid,
    pub rating: Rating,
    pub title: String,
    pub comment: String,
    pub helpful_count: u32,
    pub not_helpful_count: u32,
    pub verified: bool,
    pub flagged: bool,
    pub flag_reason: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Aggregate rating stored on a book.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookRating {
    pub average_rating: f64,
    pub review_count: u32,
}

/// Change to the helpful/not-helpful counters when a user votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteDelta {
    pub helpful: i32,
    pub not_helpful: i32,
}

impl VoteDelta {
    /// Counter movement for a vote, given the voter's previous vote if any.
    #[must_use]
    pub const fn between(previous: Option<bool>, helpful: bool) -> Self {
        match (previous, helpful) {
            (Some(true), true) | (Some(false), false) => Self {
                helpful: 0,
                not_helpful: 0,
            },
            (None, true) => Self {
                helpful: 1,
                not_helpful: 0,
            },
            (None, false) => Self {
                helpful: 0,
                not_helpful: 1,
            },
            (Some(false), true) => Self {
                helpful: 1,
                not_helpful: -1,
            },
            (Some(true), false) => Self {
                helpful: -1,
                not_helpful: 1,
            },
        }
    }

    #[must_use]
    pub const fn is_noop(self) -> bool {
        self.helpful == 0 && self.not_helpful == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_accepts_one_to_five() {
        for value in 1..=5 {
            assert_eq!(Rating::new(value).map(Rating::get), Ok(value));
        }

        assert_eq!(Rating::new(0), Err(InvalidRating(0)));
        assert_eq!(Rating::try_from(6), Err(InvalidRating(6)));
    }

    #[test]
    fn moderation_parses() {
        assert_eq!("approve".parse::<Moderation>(), Ok(Moderation::Approve));
        assert_eq!("remove".parse::<Moderation>(), Ok(Moderation::Remove));
        assert!("ban".parse::<Moderation>().is_err());
    }

    #[test]
    fn first_vote_counts_once() {
        assert_eq!(
            VoteDelta::between(None, true),
            VoteDelta {
                helpful: 1,
                not_helpful: 0
            }
        );
        assert_eq!(
            VoteDelta::between(None, false),
            VoteDelta {
                helpful: 0,
                not_helpful: 1
            }
        );
    }

    #[test]
    fn changed_vote_moves_the_count() {
        assert_eq!(
            VoteDelta::between(Some(true), false),
            VoteDelta {
                helpful: -1,
                not_helpful: 1
            }
        );
        assert_eq!(
            VoteDelta::between(Some(false), true),
            VoteDelta {
                helpful: 1,
                not_helpful: -1
            }
        );
    }

    #[test]
    fn repeated_vote_is_a_noop() {
        assert!(VoteDelta::between(Some(true), true).is_noop());
        assert!(VoteDelta::between(Some(false), false).is_noop());
    }
}
