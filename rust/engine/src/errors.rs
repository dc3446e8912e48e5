use thiserror::Error;

use crate::player::PlayerId;

/// Errors returned to the caller of an engine operation.
///
/// Every variant except [`GameError::Fault`] is a rejection: the engine state
/// is left exactly as it was before the call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("It's not player {actual}'s turn (expected {})", .expected.as_deref().unwrap_or("nobody"))]
    NotYourTurn {
        expected: Option<PlayerId>,
        actual: PlayerId,
    },
    #[error("Invalid action: {reason}")]
    InvalidAction { reason: String },
    #[error("Hand already settled")]
    HandAlreadySettled,
    #[error("A hand is already in progress")]
    HandInProgress,
    #[error("No hand in progress")]
    NoHandInProgress,
    #[error("Player {0} is not seated at this table")]
    PlayerNotFound(PlayerId),
    #[error("Invalid table setup: {reason}")]
    InvalidSetup { reason: String },
    #[error("Not enough players with chips to start a hand")]
    NotEnoughPlayers,
    #[error("{variant} supports at most {max} players, {seated} seated")]
    TooManyPlayers {
        variant: String,
        max: usize,
        seated: usize,
    },
    #[error("Run it twice is not available: {reason}")]
    RunItTwiceNotEligible { reason: String },
    #[error("Run it twice has not been enabled for this hand")]
    RunItTwiceNotEnabled,
    #[error(transparent)]
    Fault(#[from] EngineFault),
}

impl GameError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        GameError::InvalidAction {
            reason: reason.into(),
        }
    }

    pub(crate) fn rit(reason: impl Into<String>) -> Self {
        GameError::RunItTwiceNotEligible {
            reason: reason.into(),
        }
    }
}

/// Internal invariant violations. These indicate a logic defect, never a
/// player mistake, and are logged at error level where they are detected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineFault {
    #[error("deck exhausted: needed {needed} more card(s), {remaining} left")]
    DeckExhausted { needed: usize, remaining: usize },
    #[error("chip conservation violated: {wagered} wagered, {distributed} distributed")]
    ChipConservation { wagered: u64, distributed: u64 },
    #[error("internal engine error: {0}")]
    Internal(&'static str),
}

pub type GameResult<T> = Result<T, GameError>;
