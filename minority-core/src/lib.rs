//! Client-side core for the Minority Rule game: commit/reveal hashing that matches the
//! contract's verifier, local persistence of the salt behind a commit, a typed boundary for
//! fetched game snapshots, and a replay of recorded rounds into winners and losers.

pub mod analysis;
pub mod commitment;
pub mod constants;
pub mod crypto;
pub mod snapshot;
pub mod types;

pub use analysis::{
    analyze, ConsistencyError, GameAnalysis, PlayerStanding, PlayerStatus, RoundResult,
};
pub use commitment::{
    CommitmentStore, FileStore, KeyValueStore, MemoryStore, StoreError, VotingCommitment,
};
pub use crypto::{commit_hash, generate_salt, verify_commitment, CryptoError, VoteHashes};
pub use snapshot::{parse_game, ParseError};
pub use types::{Address, Game, GameState, Ufix64, VoteRecord};
