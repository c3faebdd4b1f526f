use crate::types::{Address, Game, GameState, Ufix64, VoteRecord};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

// Boundary for game snapshots fetched by the query layer. Script results arrive loosely typed
// (integers as strings, enums wrapped in rawValue objects, dictionary keys as strings); they
// are checked here once so the analyzer only ever sees a well formed Game. Nothing is
// defaulted: a missing or malformed field is an error.

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed game snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field}: invalid integer {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("{field}: {reason}")]
    InvalidAddress { field: &'static str, reason: String },
    #[error("{field}: {reason}")]
    InvalidFixedPoint { field: &'static str, reason: String },
    #[error("unknown game state {0}")]
    UnknownState(u64),
    #[error("{field}: round numbers start at 1")]
    ZeroRound { field: &'static str },
    #[error("player {0} joined more than once")]
    DuplicatePlayer(Address),
    #[error("player {player} has more than one vote for round {round}")]
    DuplicateVote { player: Address, round: u32 },
}

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum RawUInt {
    Number(u64),
    Text(String),
}

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum RawFix {
    Text(String),
    Number(serde_json::Number),
}

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum RawEnum {
    Wrapped {
        #[serde(rename = "rawValue")]
        raw_value: RawUInt,
    },
    Bare(RawUInt),
}

#[derive(Deserialize, Debug, Clone)]
pub struct RawVoteRecord {
    pub round: RawUInt,
    pub vote: bool,
    pub timestamp: RawFix,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawGame {
    pub game_id: RawUInt,
    pub question_text: String,
    pub entry_fee: RawFix,
    pub creator: String,
    pub state: RawEnum,
    pub current_round: RawUInt,
    pub players: Vec<String>,
    pub player_vote_history: HashMap<String, Vec<RawVoteRecord>>,
    pub remaining_players: Vec<String>,
    pub winners: Vec<String>,
    pub round_results: HashMap<String, bool>,
}

pub fn parse_game(json: &str) -> Result<Game, ParseError> {
    let raw: RawGame = serde_json::from_str(json)?;
    raw.validate()
}

pub fn parse_game_value(value: serde_json::Value) -> Result<Game, ParseError> {
    let raw: RawGame = serde_json::from_value(value)?;
    raw.validate()
}

impl RawGame {
    pub fn validate(self) -> Result<Game, ParseError> {
        let game_id = uint(&self.game_id, "gameId")?;
        let entry_fee = fixed(&self.entry_fee, "entryFee")?;
        let creator = address(&self.creator, "creator")?;
        let raw_state = match &self.state {
            RawEnum::Wrapped { raw_value } => uint(raw_value, "state")?,
            RawEnum::Bare(value) => uint(value, "state")?,
        };
        let state = GameState::from_raw(raw_state).ok_or(ParseError::UnknownState(raw_state))?;
        let current_round = round(&self.current_round, "currentRound", true)?;

        let mut players = Vec::with_capacity(self.players.len());
        let mut seen = HashSet::new();
        for raw in &self.players {
            let player = address(raw, "players")?;
            if !seen.insert(player.clone()) {
                return Err(ParseError::DuplicatePlayer(player));
            }
            players.push(player);
        }

        let mut vote_history = HashMap::with_capacity(self.player_vote_history.len());
        for (raw_player, raw_records) in &self.player_vote_history {
            let player = address(raw_player, "playerVoteHistory")?;
            let mut rounds = HashSet::new();
            let mut records = Vec::with_capacity(raw_records.len());
            for raw in raw_records {
                let record = VoteRecord {
                    round: round(&raw.round, "playerVoteHistory.round", false)?,
                    vote: raw.vote,
                    timestamp: fixed(&raw.timestamp, "playerVoteHistory.timestamp")?,
                };
                if !rounds.insert(record.round) {
                    return Err(ParseError::DuplicateVote {
                        player,
                        round: record.round,
                    });
                }
                records.push(record);
            }
            vote_history.insert(player, records);
        }

        let remaining_players = addresses(&self.remaining_players, "remainingPlayers")?;
        let winners = addresses(&self.winners, "winners")?;

        let mut round_results = BTreeMap::new();
        for (key, winning_vote) in &self.round_results {
            let number = round(&RawUInt::Text(key.clone()), "roundResults", false)?;
            round_results.insert(number, *winning_vote);
        }

        Ok(Game {
            game_id,
            question_text: self.question_text,
            entry_fee,
            creator,
            state,
            current_round,
            players,
            vote_history,
            remaining_players,
            winners,
            round_results,
        })
    }
}

fn uint(raw: &RawUInt, field: &'static str) -> Result<u64, ParseError> {
    match raw {
        RawUInt::Number(n) => Ok(*n),
        RawUInt::Text(text) => text.trim().parse().map_err(|_| ParseError::InvalidNumber {
            field,
            value: text.clone(),
        }),
    }
}

fn round(raw: &RawUInt, field: &'static str, allow_zero: bool) -> Result<u32, ParseError> {
    let value = uint(raw, field)?;
    let number = u32::try_from(value).map_err(|_| ParseError::InvalidNumber {
        field,
        value: value.to_string(),
    })?;
    if number == 0 && !allow_zero {
        return Err(ParseError::ZeroRound { field });
    }
    Ok(number)
}

fn fixed(raw: &RawFix, field: &'static str) -> Result<Ufix64, ParseError> {
    let text = match raw {
        RawFix::Text(text) => text.trim().to_string(),
        RawFix::Number(number) => match (number.as_u64(), number.as_f64()) {
            (Some(whole), _) => whole.to_string(),
            // Display would switch to exponent form for values like 1e-7.
            (None, Some(value)) if value.is_finite() && value >= 0.0 => format!("{:.8}", value),
            _ => {
                return Err(ParseError::InvalidFixedPoint {
                    field,
                    reason: format!("not an unsigned fixed-point number: {}", number),
                })
            }
        },
    };
    text.parse()
        .map_err(|reason| ParseError::InvalidFixedPoint { field, reason })
}

fn address(raw: &str, field: &'static str) -> Result<Address, ParseError> {
    raw.trim()
        .parse()
        .map_err(|reason| ParseError::InvalidAddress { field, reason })
}

fn addresses(raw: &[String], field: &'static str) -> Result<Vec<Address>, ParseError> {
    raw.iter().map(|a| address(a, field)).collect()
}
