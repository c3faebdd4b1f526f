use crate::constants::{FLOW_ADDRESS_HEX_LEN, UFIX64_DECIMALS, UFIX64_SCALE};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

// Typed view of a game as the contract exposes it. Values here are already validated; the
// loose wire shape lives in snapshot.rs.

/// Flow account address in canonical `0x` + 16 lowercase hex form.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let digits = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .unwrap_or(raw);
        if digits.is_empty() || digits.len() > FLOW_ADDRESS_HEX_LEN {
            return Err(format!("invalid address length: {:?}", raw));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("invalid address characters: {:?}", raw));
        }
        Ok(Address(format!(
            "0x{:0>width$}",
            digits.to_ascii_lowercase(),
            width = FLOW_ADDRESS_HEX_LEN
        )))
    }
}

impl TryFrom<String> for Address {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cadence `UFix64`: unsigned fixed point with eight decimal places.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(try_from = "String", into = "String")]
pub struct Ufix64(u64);

impl Ufix64 {
    pub fn from_units(units: u64) -> Self {
        Ufix64(units)
    }

    pub fn units(&self) -> u64 {
        self.0
    }

    pub fn whole(&self) -> u64 {
        self.0 / UFIX64_SCALE
    }
}

impl FromStr for Ufix64 {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (whole, frac) = raw.split_once('.').unwrap_or((raw, ""));
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(frac) {
            return Err(format!("invalid UFix64: {:?}", raw));
        }
        if frac.len() > UFIX64_DECIMALS as usize {
            return Err(format!("too many decimal places in UFix64: {:?}", raw));
        }
        let whole: u64 = whole
            .parse()
            .map_err(|_| format!("UFix64 out of range: {:?}", raw))?;
        let frac_units: u64 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac, width = UFIX64_DECIMALS as usize);
            padded
                .parse()
                .map_err(|_| format!("invalid UFix64: {:?}", raw))?
        };
        whole
            .checked_mul(UFIX64_SCALE)
            .and_then(|w| w.checked_add(frac_units))
            .map(Ufix64)
            .ok_or_else(|| format!("UFix64 out of range: {:?}", raw))
    }
}

impl TryFrom<String> for Ufix64 {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<Ufix64> for String {
    fn from(value: Ufix64) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Ufix64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:0width$}",
            self.0 / UFIX64_SCALE,
            self.0 % UFIX64_SCALE,
            width = UFIX64_DECIMALS as usize
        )
    }
}

/// Lifecycle state, numbered as the contract's raw enum values.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum GameState {
    CommitPhase,
    RevealPhase,
    ProcessingRound,
    Completed,
}

impl GameState {
    pub fn from_raw(raw: u64) -> Option<Self> {
        match raw {
            0 => Some(GameState::CommitPhase),
            1 => Some(GameState::RevealPhase),
            2 => Some(GameState::ProcessingRound),
            3 => Some(GameState::Completed),
            _ => None,
        }
    }

    pub fn raw(&self) -> u8 {
        match self {
            GameState::CommitPhase => 0,
            GameState::RevealPhase => 1,
            GameState::ProcessingRound => 2,
            GameState::Completed => 3,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct VoteRecord {
    pub round: u32,
    pub vote: bool,
    pub timestamp: Ufix64,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Game {
    pub game_id: u64,
    pub question_text: String,
    pub entry_fee: Ufix64,
    pub creator: Address,
    pub state: GameState,
    pub current_round: u32,
    pub players: Vec<Address>,
    pub vote_history: HashMap<Address, Vec<VoteRecord>>,
    pub remaining_players: Vec<Address>,
    pub winners: Vec<Address>,
    pub round_results: BTreeMap<u32, bool>,
}

impl Game {
    pub fn vote_in_round(&self, player: &Address, round: u32) -> Option<&VoteRecord> {
        self.vote_history
            .get(player)?
            .iter()
            .find(|record| record.round == round)
    }

    pub fn is_completed(&self) -> bool {
        self.state == GameState::Completed
    }
}
