pub mod bitmap;
pub mod contract;
mod error;
pub mod msg;
pub mod state;


pub use crate::error::ContractError;
