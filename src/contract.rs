#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    ensure, to_binary, Addr, Binary, Deps, DepsMut, Empty, Env, Event, MessageInfo, Order,
    Response, StdResult, Storage, Uint128,
};
use cw2::set_contract_version;
use cw_asset::Asset;
use cw_storage_plus::Bound;

use crate::bitmap;
use crate::error::ContractError;
use crate::msg::{
    AdminsResponse, ConfigResponse, ContractBalanceResponse, ExecuteMsg, HasPickedResponse,
    InstantiateMsg, IsAdminResponse, NextSessionIdResponse, PickResponse, PickedByResponse,
    PickedNumberResponse, PicksResponse, QueryMsg, SessionResponse, SessionsResponse,
    TakenBitmapResponse,
};
use crate::state::{
    Config, Session, ADMINS, ADMIN_COUNT, CONFIG, ESCROWED, NEXT_SESSION_ID, PICKED_BY_NUMBER,
    PICKS, SESSIONS, TAKEN,
};

// version info for migration
const CONTRACT_NAME: &str = "crates.io:number_guessing_game";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

// constants
const SECONDS_PER_MINUTE: u64 = 60;
const MAX_NUMBER_LIMIT: u32 = 65_535;

// Limits for pagination
const MAX_LIMIT: u32 = 30;
const DEFAULT_LIMIT: u32 = 10;

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    ensure!(
        !msg.main_denom.is_empty(),
        ContractError::invalid_parameter("main denom must not be empty")
    );

    let admin = msg
        .admin
        .map(|addr_string| deps.api.addr_validate(&addr_string))
        .transpose()?
        .unwrap_or(info.sender);

    CONFIG.save(
        deps.storage,
        &Config {
            main_denom: msg.main_denom.clone(),
        },
    )?;
    ADMIN_COUNT.save(deps.storage, &0)?;
    insert_admin(deps.storage, &admin)?;
    NEXT_SESSION_ID.save(deps.storage, &0u64)?;
    ESCROWED.save(deps.storage, &Uint128::zero())?;

    Ok(Response::new()
        .add_attribute("method", "instantiate")
        .add_attribute("admin", admin)
        .add_attribute("main_denom", msg.main_denom))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::CreateSession {
            max_number,
            open_duration_minutes,
            refund_admin,
        } => execute_create_session(
            deps,
            env,
            info,
            max_number,
            open_duration_minutes,
            refund_admin,
        ),
        ExecuteMsg::PickNumber { session_id, number } => {
            execute_pick_number(deps, info, session_id, number)
        }
        ExecuteMsg::SetWinningNumber {
            session_id,
            winning_number,
        } => execute_set_winning_number(deps, env, info, session_id, winning_number),
        ExecuteMsg::ClaimPayout { session_id } => execute_claim_payout(deps, info, session_id),
        ExecuteMsg::AddAdmin { address } => execute_add_admin(deps, info, address),
        ExecuteMsg::RemoveAdmin { address } => execute_remove_admin(deps, info, address),
        ExecuteMsg::ChangeAdmin { new_admin } => execute_change_admin(deps, info, new_admin),
        ExecuteMsg::WithdrawContractFunds { to, amount } => {
            execute_withdraw_contract_funds(deps, env, info, to, amount)
        }
    }
}

pub fn execute_create_session(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    max_number: u32,
    open_duration_minutes: u64,
    refund_admin: Option<String>,
) -> Result<Response, ContractError> {
    assert_admin(deps.storage, &info.sender)?;

    ensure!(
        (1..=MAX_NUMBER_LIMIT).contains(&max_number),
        ContractError::invalid_parameter(format!(
            "max number must be between 1 and {}",
            MAX_NUMBER_LIMIT
        ))
    );
    let main_denom = CONFIG.load(deps.storage)?.main_denom;
    let payout = attached_payout(&info, &main_denom)?;

    // The previous session has to be drawn before a new one opens
    let session_id = NEXT_SESSION_ID.load(deps.storage)?;
    if let Some(previous_id) = session_id.checked_sub(1) {
        let previous = SESSIONS.load(deps.storage, previous_id)?;
        ensure!(
            previous.winning_number_set,
            ContractError::PrecedingSessionOpen {
                session_id: previous_id
            }
        );
    }

    let draw_timestamp = open_duration_minutes
        .checked_mul(SECONDS_PER_MINUTE)
        .and_then(|duration| env.block.time.seconds().checked_add(duration))
        .ok_or_else(|| ContractError::invalid_parameter("open duration overflows"))?;
    let refund_admin = refund_admin
        .map(|addr_string| deps.api.addr_validate(&addr_string))
        .transpose()?;

    let session = Session {
        max_number,
        winning_number: 0,
        draw_timestamp,
        payout,
        creator: info.sender,
        refund_admin,
        winner: None,
        winning_number_set: false,
        payout_claimed: false,
    };
    SESSIONS.save(deps.storage, session_id, &session)?;
    NEXT_SESSION_ID.save(deps.storage, &(session_id + 1))?;
    ESCROWED.update(deps.storage, |escrowed| -> StdResult<_> {
        Ok(escrowed.checked_add(payout)?)
    })?;

    Ok(Response::new()
        .add_attribute("method", "execute_create_session")
        .add_attribute("session_id", session_id.to_string())
        .add_attribute("max_number", max_number.to_string())
        .add_attribute("draw_timestamp", draw_timestamp.to_string())
        .add_event(
            Event::new("session_created")
                .add_attribute("session_id", session_id.to_string())
                .add_attribute("payout", payout.to_string()),
        ))
}

pub fn execute_pick_number(
    deps: DepsMut,
    info: MessageInfo,
    session_id: u64,
    number: u32,
) -> Result<Response, ContractError> {
    let player = info.sender;
    let session = load_session(deps.storage, session_id)?;

    // No deadline check here: picks stay open until the winning number is set.
    ensure!(!session.winning_number_set, ContractError::AlreadyDrawn {});
    ensure!(
        (1..=session.max_number).contains(&number),
        ContractError::NumberOutOfRange {
            number,
            max_number: session.max_number,
        }
    );
    ensure!(
        !PICKS.has(deps.storage, (session_id, &player)),
        ContractError::CallerAlreadyPicked {}
    );

    let (word_index, bit) = bitmap::position(number);
    let mut word = TAKEN
        .may_load(deps.storage, (session_id, word_index))?
        .unwrap_or_default();
    ensure!(
        !word.is_set(bit),
        ContractError::NumberAlreadyPicked { number }
    );
    word.set(bit);

    TAKEN.save(deps.storage, (session_id, word_index), &word)?;
    PICKS.save(deps.storage, (session_id, &player), &number)?;
    PICKED_BY_NUMBER.save(deps.storage, (session_id, number), &player)?;

    Ok(Response::new()
        .add_attribute("method", "execute_pick_number")
        .add_attribute("session_id", session_id.to_string())
        .add_attribute("player", player)
        .add_attribute("number", number.to_string()))
}

pub fn execute_set_winning_number(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    session_id: u64,
    winning_number: u32,
) -> Result<Response, ContractError> {
    assert_admin(deps.storage, &info.sender)?;
    let mut session = load_session(deps.storage, session_id)?;

    ensure!(!session.winning_number_set, ContractError::AlreadyDrawn {});
    ensure!(
        env.block.time.seconds() >= session.draw_timestamp,
        ContractError::TooEarly {
            draw_timestamp: session.draw_timestamp
        }
    );
    ensure!(
        (1..=session.max_number).contains(&winning_number),
        ContractError::NumberOutOfRange {
            number: winning_number,
            max_number: session.max_number,
        }
    );

    let winner = PICKED_BY_NUMBER.may_load(deps.storage, (session_id, winning_number))?;
    session.winning_number = winning_number;
    session.winner = winner.clone();
    session.winning_number_set = true;
    SESSIONS.save(deps.storage, session_id, &session)?;

    Ok(Response::new()
        .add_attribute("method", "execute_set_winning_number")
        .add_attribute("session_id", session_id.to_string())
        .add_attribute("winning_number", winning_number.to_string())
        .add_attribute(
            "winner",
            winner.map_or_else(|| "none".to_string(), String::from),
        ))
}

pub fn execute_claim_payout(
    deps: DepsMut,
    info: MessageInfo,
    session_id: u64,
) -> Result<Response, ContractError> {
    let mut session = load_session(deps.storage, session_id)?;

    ensure!(session.winning_number_set, ContractError::NotDrawn {});
    ensure!(
        !session.payout_claimed,
        ContractError::PayoutAlreadyClaimed {}
    );

    // Without a winner anybody may trigger the refund
    let recipient = match &session.winner {
        Some(winner) => {
            ensure!(info.sender == *winner, ContractError::NotWinner {});
            winner.clone()
        }
        None => session.refund_recipient().clone(),
    };

    let amount = session.payout;
    session.payout = Uint128::zero();
    session.payout_claimed = true;
    SESSIONS.save(deps.storage, session_id, &session)?;
    ESCROWED.update(deps.storage, |escrowed| -> StdResult<_> {
        Ok(escrowed.checked_sub(amount)?)
    })?;

    let main_denom = CONFIG.load(deps.storage)?.main_denom;
    let transfer = Asset::native(main_denom, amount).transfer_msg(recipient.clone())?;

    Ok(Response::new()
        .add_attribute("method", "execute_claim_payout")
        .add_attribute("session_id", session_id.to_string())
        .add_attribute("recipient", recipient.clone())
        .add_attribute("refund", session.winner.is_none().to_string())
        .add_message(transfer)
        .add_event(
            Event::new("payout_claimed")
                .add_attribute("session_id", session_id.to_string())
                .add_attribute("amount", amount.to_string())
                .add_attribute("recipient", recipient),
        ))
}

pub fn execute_add_admin(
    deps: DepsMut,
    info: MessageInfo,
    address: String,
) -> Result<Response, ContractError> {
    assert_admin(deps.storage, &info.sender)?;
    let address = deps.api.addr_validate(&address)?;
    insert_admin(deps.storage, &address)?;

    Ok(Response::new()
        .add_attribute("method", "execute_add_admin")
        .add_attribute("admin", address))
}

pub fn execute_remove_admin(
    deps: DepsMut,
    info: MessageInfo,
    address: String,
) -> Result<Response, ContractError> {
    assert_admin(deps.storage, &info.sender)?;
    let address = deps.api.addr_validate(&address)?;
    drop_admin(deps.storage, &address)?;

    Ok(Response::new()
        .add_attribute("method", "execute_remove_admin")
        .add_attribute("admin", address))
}

pub fn execute_change_admin(
    deps: DepsMut,
    info: MessageInfo,
    new_admin: String,
) -> Result<Response, ContractError> {
    assert_admin(deps.storage, &info.sender)?;
    let new_admin = deps.api.addr_validate(&new_admin)?;
    if new_admin != info.sender {
        insert_admin(deps.storage, &new_admin)?;
        drop_admin(deps.storage, &info.sender)?;
    }

    Ok(Response::new()
        .add_attribute("method", "execute_change_admin")
        .add_attribute("previous_admin", info.sender)
        .add_attribute("new_admin", new_admin))
}

pub fn execute_withdraw_contract_funds(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    to: String,
    amount: Uint128,
) -> Result<Response, ContractError> {
    assert_admin(deps.storage, &info.sender)?;
    ensure!(
        !amount.is_zero(),
        ContractError::invalid_parameter("amount must be positive")
    );
    let to = deps.api.addr_validate(&to)?;

    // Payouts of unsettled sessions are not withdrawable
    let main_denom = CONFIG.load(deps.storage)?.main_denom;
    let balance = deps
        .querier
        .query_balance(&env.contract.address, &main_denom)?
        .amount;
    let free = balance.saturating_sub(ESCROWED.load(deps.storage)?);
    ensure!(amount <= free, ContractError::InsufficientBalance {});

    let transfer = Asset::native(main_denom, amount).transfer_msg(to.clone())?;

    Ok(Response::new()
        .add_attribute("method", "execute_withdraw_contract_funds")
        .add_attribute("to", to)
        .add_attribute("amount", amount.to_string())
        .add_message(transfer))
}

fn assert_admin(storage: &dyn Storage, sender: &Addr) -> Result<(), ContractError> {
    ensure!(ADMINS.has(storage, sender), ContractError::Unauthorized {});
    Ok(())
}

fn insert_admin(storage: &mut dyn Storage, address: &Addr) -> StdResult<()> {
    if !ADMINS.has(storage, address) {
        ADMINS.save(storage, address, &Empty {})?;
        ADMIN_COUNT.update(storage, |count| -> StdResult<_> { Ok(count + 1) })?;
    }
    Ok(())
}

fn drop_admin(storage: &mut dyn Storage, address: &Addr) -> Result<(), ContractError> {
    ensure!(
        ADMINS.has(storage, address),
        ContractError::NotAdmin {
            address: address.to_string()
        }
    );
    let count = ADMIN_COUNT.load(storage)?;
    ensure!(count > 1, ContractError::LastAdmin {});
    ADMINS.remove(storage, address);
    ADMIN_COUNT.save(storage, &(count - 1))?;
    Ok(())
}

fn load_session(storage: &dyn Storage, session_id: u64) -> Result<Session, ContractError> {
    SESSIONS
        .may_load(storage, session_id)?
        .ok_or(ContractError::SessionNotFound { session_id })
}

/// The payout is the single `main_denom` coin attached to the message.
fn attached_payout(info: &MessageInfo, main_denom: &str) -> Result<Uint128, ContractError> {
    let payout = match info.funds.as_slice() {
        [] => Uint128::zero(),
        [coin] if coin.denom == main_denom => coin.amount,
        _ => return Err(ContractError::InvalidFund {}),
    };
    ensure!(
        !payout.is_zero(),
        ContractError::invalid_parameter("payout must be positive")
    );
    Ok(payout)
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::QueryConfig {} => to_binary(&query_config(deps)?),
        QueryMsg::QuerySession { session_id } => {
            to_binary(&query_session(deps, env, session_id)?)
        }
        QueryMsg::QuerySessions { start_after, limit } => {
            to_binary(&query_sessions(deps, env, start_after, limit)?)
        }
        QueryMsg::QueryNextSessionId {} => to_binary(&NextSessionIdResponse {
            next_session_id: NEXT_SESSION_ID.load(deps.storage)?,
        }),
        QueryMsg::QueryIsAdmin { address } => to_binary(&query_is_admin(deps, address)?),
        QueryMsg::QueryAdmins { start_after, limit } => {
            to_binary(&query_admins(deps, start_after, limit)?)
        }
        QueryMsg::QueryPickedNumber {
            session_id,
            address,
        } => to_binary(&query_picked_number(deps, session_id, address)?),
        QueryMsg::QueryHasPicked {
            session_id,
            address,
        } => to_binary(&query_has_picked(deps, session_id, address)?),
        QueryMsg::QueryPickedBy { session_id, number } => {
            to_binary(&query_picked_by(deps, session_id, number)?)
        }
        QueryMsg::QueryPicks {
            session_id,
            start_after,
            limit,
        } => to_binary(&query_picks(deps, session_id, start_after, limit)?),
        QueryMsg::QueryTakenBitmap { session_id } => {
            to_binary(&query_taken_bitmap(deps, session_id)?)
        }
        QueryMsg::QueryBalance {} => to_binary(&query_balance(deps, env)?),
    }
}

fn query_config(deps: Deps) -> StdResult<ConfigResponse> {
    let config = CONFIG.load(deps.storage)?;
    Ok(ConfigResponse {
        main_denom: config.main_denom,
        admin_count: ADMIN_COUNT.load(deps.storage)?,
        next_session_id: NEXT_SESSION_ID.load(deps.storage)?,
        escrowed: ESCROWED.load(deps.storage)?,
    })
}

fn session_response(session_id: u64, session: Session, now: u64) -> SessionResponse {
    let status = session.status(now);
    SessionResponse {
        session_id,
        max_number: session.max_number,
        winning_number: session.winning_number,
        draw_timestamp: session.draw_timestamp,
        payout: session.payout,
        creator: session.creator.to_string(),
        refund_admin: session.refund_admin.map(String::from),
        winner: session.winner.map(String::from),
        winning_number_set: session.winning_number_set,
        payout_claimed: session.payout_claimed,
        status,
    }
}

fn query_session(deps: Deps, env: Env, session_id: u64) -> StdResult<SessionResponse> {
    let session = SESSIONS.load(deps.storage, session_id)?;
    Ok(session_response(
        session_id,
        session,
        env.block.time.seconds(),
    ))
}

fn query_sessions(
    deps: Deps,
    env: Env,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<SessionsResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);
    let now = env.block.time.seconds();
    let sessions: StdResult<Vec<_>> = SESSIONS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(id, session)| session_response(id, session, now)))
        .collect();

    Ok(SessionsResponse {
        sessions: sessions?,
    })
}

fn query_is_admin(deps: Deps, address: String) -> StdResult<IsAdminResponse> {
    let address = deps.api.addr_validate(&address)?;
    Ok(IsAdminResponse {
        is_admin: ADMINS.has(deps.storage, &address),
    })
}

fn query_admins(
    deps: Deps,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<AdminsResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start_addr = start_after
        .map(|addr_string| deps.api.addr_validate(&addr_string))
        .transpose()?;
    let start = start_addr.as_ref().map(Bound::exclusive);
    let admins: StdResult<Vec<_>> = ADMINS
        .keys(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(String::from))
        .collect();

    Ok(AdminsResponse { admins: admins? })
}

fn query_picked_number(
    deps: Deps,
    session_id: u64,
    address: String,
) -> StdResult<PickedNumberResponse> {
    let address = deps.api.addr_validate(&address)?;
    let number = PICKS
        .may_load(deps.storage, (session_id, &address))?
        .unwrap_or(0);
    Ok(PickedNumberResponse { number })
}

fn query_has_picked(
    deps: Deps,
    session_id: u64,
    address: String,
) -> StdResult<HasPickedResponse> {
    let address = deps.api.addr_validate(&address)?;
    Ok(HasPickedResponse {
        has_picked: PICKS.has(deps.storage, (session_id, &address)),
    })
}

fn query_picked_by(deps: Deps, session_id: u64, number: u32) -> StdResult<PickedByResponse> {
    let player = PICKED_BY_NUMBER.may_load(deps.storage, (session_id, number))?;
    Ok(PickedByResponse {
        player: player.map(String::from),
    })
}

fn query_picks(
    deps: Deps,
    session_id: u64,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<PicksResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start_addr = start_after
        .map(|addr_string| deps.api.addr_validate(&addr_string))
        .transpose()?;
    let start = start_addr.as_ref().map(Bound::exclusive);
    let picks: StdResult<Vec<_>> = PICKS
        .prefix(session_id)
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| {
            item.map(|(player, number)| PickResponse {
                player: player.to_string(),
                number,
            })
        })
        .collect();

    Ok(PicksResponse { picks: picks? })
}

fn query_taken_bitmap(deps: Deps, session_id: u64) -> StdResult<TakenBitmapResponse> {
    let session = SESSIONS.load(deps.storage, session_id)?;
    let words = (0..bitmap::word_count(session.max_number))
        .map(|index| {
            let word = TAKEN
                .may_load(deps.storage, (session_id, index))?
                .unwrap_or_default();
            Ok(word.to_uint256())
        })
        .collect::<StdResult<Vec<_>>>()?;
    Ok(TakenBitmapResponse { words })
}

fn query_balance(deps: Deps, env: Env) -> StdResult<ContractBalanceResponse> {
    let main_denom = CONFIG.load(deps.storage)?.main_denom;
    let balance = deps
        .querier
        .query_balance(&env.contract.address, &main_denom)?;
    let escrowed = ESCROWED.load(deps.storage)?;
    Ok(ContractBalanceResponse {
        amount: balance.amount,
        escrowed,
        free: balance.amount.saturating_sub(escrowed),
    })
}
