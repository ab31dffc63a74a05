//! Packed taken-number tracking.
//!
//! Number `n` of a session lives at bit `(n - 1) % 256` of word
//! `(n - 1) / 256`. Words are stored sparsely; a word that was never written
//! reads as zero.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint256;

pub const BITS_PER_WORD: u32 = 256;
const LIMB_BITS: u32 = 64;

/// One 256-bit word, little-endian limbs (`limbs[0]` holds bits 0..64).
#[cw_serde]
#[derive(Copy, Default)]
pub struct TakenWord {
    pub limbs: [u64; 4],
}

impl TakenWord {
    pub fn is_set(&self, bit: u32) -> bool {
        let (limb, offset) = split(bit);
        self.limbs[limb] & (1u64 << offset) != 0
    }

    pub fn set(&mut self, bit: u32) {
        let (limb, offset) = split(bit);
        self.limbs[limb] |= 1u64 << offset;
    }

    pub fn to_uint256(self) -> Uint256 {
        let mut bytes = [0u8; 32];
        for (i, limb) in self.limbs.iter().rev().enumerate() {
            bytes[i * 8..(i + 1) * 8].copy_from_slice(&limb.to_be_bytes());
        }
        Uint256::from_be_bytes(bytes)
    }
}

fn split(bit: u32) -> (usize, u32) {
    debug_assert!(bit < BITS_PER_WORD);
    ((bit / LIMB_BITS) as usize, bit % LIMB_BITS)
}

/// Word index and bit position of a 1-based number.
pub fn position(number: u32) -> (u32, u32) {
    let index = number - 1;
    (index / BITS_PER_WORD, index % BITS_PER_WORD)
}

/// Number of words needed to cover `1..=max_number`.
pub fn word_count(max_number: u32) -> u32 {
    max_number / BITS_PER_WORD + u32::from(max_number % BITS_PER_WORD != 0)
}
