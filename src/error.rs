use cosmwasm_std::StdError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("only admin")]
    Unauthorized {},

    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    #[error("invalid fund")]
    InvalidFund {},

    #[error("insufficient balance")]
    InsufficientBalance {},

    #[error("preceding session not drawn")]
    PrecedingSessionOpen { session_id: u64 },

    #[error("session not found")]
    SessionNotFound { session_id: u64 },

    #[error("number out of range")]
    NumberOutOfRange { number: u32, max_number: u32 },

    #[error("number already picked")]
    NumberAlreadyPicked { number: u32 },

    #[error("already picked")]
    CallerAlreadyPicked {},

    #[error("too early")]
    TooEarly { draw_timestamp: u64 },

    #[error("winning number already set")]
    AlreadyDrawn {},

    #[error("winning number not set")]
    NotDrawn {},

    #[error("payout already claimed")]
    PayoutAlreadyClaimed {},

    #[error("not winner")]
    NotWinner {},

    #[error("not an admin: {address}")]
    NotAdmin { address: String },

    #[error("cannot remove last admin")]
    LastAdmin {},
}

impl ContractError {
    pub fn invalid_parameter(reason: impl Into<String>) -> Self {
        ContractError::InvalidParameter {
            reason: reason.into(),
        }
    }
}
