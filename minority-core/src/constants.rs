// Sizes and literals shared by the crypto, commitment and types modules. The hash
// inputs below must stay byte-identical to what the deployed contract hashes.
pub const SALT_BYTES: usize = 32;
pub const SALT_HEX_LEN: usize = SALT_BYTES * 2;
pub const VOTE_TRUE: &str = "true";
pub const VOTE_FALSE: &str = "false";
pub const COMMITMENT_KEY_PREFIX: &str = "voting_commitment_";
pub const UFIX64_DECIMALS: u32 = 8;
pub const UFIX64_SCALE: u64 = 100_000_000;
pub const FLOW_ADDRESS_HEX_LEN: usize = 16;
