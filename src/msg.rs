use crate::state::SessionStatus;
use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Uint128, Uint256};

#[cw_serde]
pub struct InstantiateMsg {
    pub admin: Option<String>,
    // "uosmo" for osmosis, "untrn" for neutron, "usei" for sei, ...
    pub main_denom: String,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Opens a new session. The payout is the `main_denom` coin sent along.
    CreateSession {
        max_number: u32,
        open_duration_minutes: u64,
        refund_admin: Option<String>,
    },
    PickNumber {
        session_id: u64,
        number: u32,
    },
    SetWinningNumber {
        session_id: u64,
        winning_number: u32,
    },
    ClaimPayout {
        session_id: u64,
    },
    AddAdmin {
        address: String,
    },
    RemoveAdmin {
        address: String,
    },
    /// Hands the sender's admin role over to `new_admin`.
    ChangeAdmin {
        new_admin: String,
    },
    WithdrawContractFunds {
        to: String,
        amount: Uint128,
    },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ConfigResponse)]
    QueryConfig {},
    #[returns(SessionResponse)]
    QuerySession { session_id: u64 },
    #[returns(SessionsResponse)]
    QuerySessions {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(NextSessionIdResponse)]
    QueryNextSessionId {},
    #[returns(IsAdminResponse)]
    QueryIsAdmin { address: String },
    #[returns(AdminsResponse)]
    QueryAdmins {
        start_after: Option<String>,
        limit: Option<u32>,
    },
    /// Returns 0 when the address has not picked.
    #[returns(PickedNumberResponse)]
    QueryPickedNumber { session_id: u64, address: String },
    #[returns(HasPickedResponse)]
    QueryHasPicked { session_id: u64, address: String },
    #[returns(PickedByResponse)]
    QueryPickedBy { session_id: u64, number: u32 },
    #[returns(PicksResponse)]
    QueryPicks {
        session_id: u64,
        start_after: Option<String>,
        limit: Option<u32>,
    },
    /// One word per 256 numbers, bit `(n - 1) % 256` of word `(n - 1) / 256`.
    #[returns(TakenBitmapResponse)]
    QueryTakenBitmap { session_id: u64 },
    #[returns(ContractBalanceResponse)]
    QueryBalance {},
}

#[cw_serde]
pub struct ConfigResponse {
    pub main_denom: String,
    pub admin_count: u32,
    pub next_session_id: u64,
    pub escrowed: Uint128,
}

#[cw_serde]
pub struct SessionResponse {
    pub session_id: u64,
    pub max_number: u32,
    pub winning_number: u32,
    pub draw_timestamp: u64,
    pub payout: Uint128,
    pub creator: String,
    pub refund_admin: Option<String>,
    pub winner: Option<String>,
    pub winning_number_set: bool,
    pub payout_claimed: bool,
    pub status: SessionStatus,
}

#[cw_serde]
pub struct SessionsResponse {
    pub sessions: Vec<SessionResponse>,
}

#[cw_serde]
pub struct NextSessionIdResponse {
    pub next_session_id: u64,
}

#[cw_serde]
pub struct IsAdminResponse {
    pub is_admin: bool,
}

#[cw_serde]
pub struct AdminsResponse {
    pub admins: Vec<String>,
}

#[cw_serde]
pub struct PickedNumberResponse {
    pub number: u32,
}

#[cw_serde]
pub struct HasPickedResponse {
    pub has_picked: bool,
}

#[cw_serde]
pub struct PickedByResponse {
    pub player: Option<String>,
}

#[cw_serde]
pub struct PickResponse {
    pub player: String,
    pub number: u32,
}

#[cw_serde]
pub struct PicksResponse {
    pub picks: Vec<PickResponse>,
}

#[cw_serde]
pub struct TakenBitmapResponse {
    pub words: Vec<Uint256>,
}

#[cw_serde]
pub struct ContractBalanceResponse {
    pub amount: Uint128,
    pub escrowed: Uint128,
    pub free: Uint128,
}
