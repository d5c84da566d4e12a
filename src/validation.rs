//! Solana address format check used for the page's client-side gating.

pub const MIN_ADDRESS_LEN: usize = 32;
pub const MAX_ADDRESS_LEN: usize = 44;

/// Base58 alphabet (no `0`, `O`, `I`, `l`) and 32..=44 chars.
pub fn is_valid_solana_address(address: &str) -> bool {
    (MIN_ADDRESS_LEN..=MAX_ADDRESS_LEN).contains(&address.len())
        && bs58::decode(address).into_vec().is_ok()
}
