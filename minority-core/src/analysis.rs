use crate::types::{Address, Game};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

// Replays a game's recorded rounds to recover who survived and who was knocked out in each.
// Rounds are resolved strictly in ascending order because every round's participants are the
// survivors of the rounds before it. Players with no vote in a round are left out of that
// round's tally and keep their place.

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    pub round: u32,
    pub yes_count: usize,
    pub no_count: usize,
    pub total: usize,
    pub winning_vote: bool,
    pub winners: Vec<Address>,
    pub losers: Vec<Address>,
}

impl RoundResult {
    /// The less popular answer by count, `None` on a tie or an empty round.
    pub fn tally_minority(&self) -> Option<bool> {
        use std::cmp::Ordering;
        match self.yes_count.cmp(&self.no_count) {
            Ordering::Less => Some(true),
            Ordering::Greater => Some(false),
            Ordering::Equal => None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameAnalysis {
    pub game_id: u64,
    pub completed: bool,
    pub rounds: Vec<RoundResult>,
    pub survivors: Vec<Address>,
    pub eliminated: Vec<Address>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PlayerStatus {
    Alive,
    Winner,
    Eliminated { round: u32 },
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStanding {
    pub player: Address,
    #[serde(flatten)]
    pub status: PlayerStatus,
    pub rounds_voted: u32,
    pub rounds_won: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("player {0} is both eliminated and surviving")]
    EliminatedSurvivor(Address),
    #[error("outcome recorded for round {round} but the game is at round {current_round}")]
    OutcomeOutOfRange { round: u32, current_round: u32 },
    #[error("derived winners {derived:?} differ from recorded winners {recorded:?}")]
    WinnersMismatch {
        derived: Vec<Address>,
        recorded: Vec<Address>,
    },
    #[error("derived survivors {derived:?} differ from remaining players {recorded:?}")]
    RemainingMismatch {
        derived: Vec<Address>,
        recorded: Vec<Address>,
    },
}

pub fn analyze(game: &Game) -> GameAnalysis {
    let mut survivors = game.players.clone();
    let mut eliminated = Vec::new();
    let mut seen_eliminated = HashSet::new();
    let mut rounds = Vec::with_capacity(game.round_results.len());

    for (&round, &winning_vote) in &game.round_results {
        let result = resolve_round(game, round, winning_vote, &survivors);
        let losers: HashSet<&Address> = result.losers.iter().collect();
        survivors.retain(|player| !losers.contains(player));
        for loser in &result.losers {
            if seen_eliminated.insert(loser.clone()) {
                eliminated.push(loser.clone());
            }
        }
        rounds.push(result);
    }

    debug_assert!(survivors.iter().all(|p| !seen_eliminated.contains(p)));

    GameAnalysis {
        game_id: game.game_id,
        completed: game.is_completed(),
        rounds,
        survivors,
        eliminated,
    }
}

fn resolve_round(
    game: &Game,
    round: u32,
    winning_vote: bool,
    participants: &[Address],
) -> RoundResult {
    let mut yes_count = 0;
    let mut no_count = 0;
    let mut winners = Vec::new();
    let mut losers = Vec::new();

    for player in participants {
        let Some(record) = game.vote_in_round(player, round) else {
            continue;
        };
        if record.vote {
            yes_count += 1;
        } else {
            no_count += 1;
        }
        if record.vote == winning_vote {
            winners.push(player.clone());
        } else {
            losers.push(player.clone());
        }
    }

    RoundResult {
        round,
        yes_count,
        no_count,
        total: yes_count + no_count,
        winning_vote,
        winners,
        losers,
    }
}

impl GameAnalysis {
    pub fn round(&self, number: u32) -> Option<&RoundResult> {
        self.rounds.iter().find(|r| r.round == number)
    }

    pub fn final_winners(&self) -> Option<&[Address]> {
        self.completed.then_some(self.survivors.as_slice())
    }

    pub fn standings(&self, game: &Game) -> Vec<PlayerStanding> {
        game.players
            .iter()
            .map(|player| {
                let mut rounds_voted = 0;
                let mut rounds_won = 0;
                let mut knocked_out = None;
                for result in &self.rounds {
                    if result.winners.contains(player) {
                        rounds_voted += 1;
                        rounds_won += 1;
                    } else if result.losers.contains(player) {
                        rounds_voted += 1;
                        if knocked_out.is_none() {
                            knocked_out = Some(result.round);
                        }
                    }
                }
                let status = match knocked_out {
                    Some(round) => PlayerStatus::Eliminated { round },
                    None if self.completed => PlayerStatus::Winner,
                    None => PlayerStatus::Alive,
                };
                PlayerStanding {
                    player: player.clone(),
                    status,
                    rounds_voted,
                    rounds_won,
                }
            })
            .collect()
    }

    /// Cross-checks the replay against itself and against what the contract reported.
    pub fn check_consistency(&self, game: &Game) -> Result<(), ConsistencyError> {
        let eliminated: HashSet<&Address> = self.eliminated.iter().collect();
        if let Some(player) = self.survivors.iter().find(|p| eliminated.contains(p)) {
            return Err(ConsistencyError::EliminatedSurvivor(player.clone()));
        }
        if let Some(&round) = game
            .round_results
            .keys()
            .find(|&&round| round == 0 || round > game.current_round)
        {
            return Err(ConsistencyError::OutcomeOutOfRange {
                round,
                current_round: game.current_round,
            });
        }
        let (recorded, completed) = if game.is_completed() {
            (&game.winners, true)
        } else {
            (&game.remaining_players, false)
        };
        if !same_members(&self.survivors, recorded) {
            let derived = self.survivors.clone();
            let recorded = recorded.clone();
            return Err(if completed {
                ConsistencyError::WinnersMismatch { derived, recorded }
            } else {
                ConsistencyError::RemainingMismatch { derived, recorded }
            });
        }
        Ok(())
    }
}

fn same_members(a: &[Address], b: &[Address]) -> bool {
    let a: HashSet<&Address> = a.iter().collect();
    let b: HashSet<&Address> = b.iter().collect();
    a == b
}
