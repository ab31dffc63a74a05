use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Empty, Uint128};
use cw_storage_plus::{Item, Map};

use crate::bitmap::TakenWord;

#[cw_serde]
pub struct Config {
    /// the only denom accepted as session payout
    pub main_denom: String,
}

#[cw_serde]
pub struct Session {
    pub max_number: u32,
    pub winning_number: u32,
    pub draw_timestamp: u64,
    pub payout: Uint128,
    pub creator: Addr,
    pub refund_admin: Option<Addr>,
    pub winner: Option<Addr>,
    pub winning_number_set: bool,
    pub payout_claimed: bool,
}

#[cw_serde]
pub enum SessionStatus {
    /// picks accepted, draw time not reached
    Open,
    /// draw time reached, winning number not set yet
    AwaitingDraw,
    Drawn,
    Settled,
}

impl Session {
    pub fn status(&self, now: u64) -> SessionStatus {
        if self.payout_claimed {
            SessionStatus::Settled
        } else if self.winning_number_set {
            SessionStatus::Drawn
        } else if now < self.draw_timestamp {
            SessionStatus::Open
        } else {
            SessionStatus::AwaitingDraw
        }
    }

    /// Where an unclaimed payout goes when nobody picked the winning number.
    pub fn refund_recipient(&self) -> &Addr {
        self.refund_admin.as_ref().unwrap_or(&self.creator)
    }
}

pub const CONFIG: Item<Config> = Item::new("config");
pub const ADMINS: Map<&Addr, Empty> = Map::new("admins");
pub const ADMIN_COUNT: Item<u32> = Item::new("admin_count");

pub const NEXT_SESSION_ID: Item<u64> = Item::new("next_session_id");
pub const SESSIONS: Map<u64, Session> = Map::new("sessions");
/// sum of payouts that have not left the contract yet
pub const ESCROWED: Item<Uint128> = Item::new("escrowed");

/// (session, player) -> picked number
pub const PICKS: Map<(u64, &Addr), u32> = Map::new("picks");
/// (session, number) -> player
pub const PICKED_BY_NUMBER: Map<(u64, u32), Addr> = Map::new("picked_by_number");
/// (session, word index) -> taken bits
pub const TAKEN: Map<(u64, u32), TakenWord> = Map::new("taken");
