use anyhow::{bail, Context, Result};
use log::{info, warn};
use minority_core::analysis::{analyze, GameAnalysis, PlayerStanding};
use minority_core::commitment::{CommitmentStore, KeyValueStore, VotingCommitment};
use minority_core::crypto::{commit_hash, generate_salt, verify_commitment};
use minority_core::snapshot::parse_game;
use minority_core::types::GameState;
use serde::{Deserialize, Serialize};

pub mod config;

// Front door for the command line: one handler per command, each returning the value that
// main prints. The store is injected so tests can run against memory.

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevealPayload {
    pub game_id: String,
    pub vote: bool,
    pub salt: String,
    pub hash: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub question_text: String,
    pub state: GameState,
    pub current_round: u32,
    #[serde(flatten)]
    pub analysis: GameAnalysis,
    pub standings: Vec<PlayerStanding>,
    pub warnings: Vec<String>,
}

pub struct App<S: KeyValueStore> {
    commitments: CommitmentStore<S>,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(backend: S) -> Self {
        Self {
            commitments: CommitmentStore::new(backend),
        }
    }

    pub fn salt(&self) -> Result<String> {
        Ok(generate_salt()?)
    }

    pub fn hash(&self, vote: bool, salt: &str) -> Result<String> {
        Ok(commit_hash(vote, salt)?)
    }

    pub fn verify(&self, vote: bool, salt: &str, hash: &str) -> Result<bool> {
        Ok(verify_commitment(vote, salt, hash)?)
    }

    pub fn commit(&mut self, game_id: &str) -> Result<VotingCommitment> {
        let commitment = VotingCommitment::generate(game_id)?;
        self.commitments
            .store(game_id, &commitment)
            .with_context(|| format!("failed to store commitment for game {}", game_id))?;
        info!("created commitment for game {}", game_id);
        Ok(commitment)
    }

    pub fn reveal(&self, game_id: &str, vote: bool) -> Result<RevealPayload> {
        let Some(commitment) = self.commitments.retrieve(game_id)? else {
            bail!(
                "no commitment stored for game {}; run `minority commit --game {}` first",
                game_id,
                game_id
            );
        };
        let hash = commitment.hash_for(vote).to_string();
        if !verify_commitment(vote, &commitment.salt, &hash)? {
            bail!("stored commitment for game {} does not match its salt", game_id);
        }
        Ok(RevealPayload {
            game_id: game_id.to_string(),
            vote,
            salt: commitment.salt,
            hash,
        })
    }

    pub fn clear(&mut self, game_id: &str) -> Result<()> {
        self.commitments.clear(game_id)?;
        info!("cleared commitment for game {}", game_id);
        Ok(())
    }

    pub fn analyze(&self, snapshot: &str) -> Result<AnalysisReport> {
        let game = parse_game(snapshot).context("could not read game snapshot")?;
        let analysis = analyze(&game);
        let mut warnings = Vec::new();
        if let Err(e) = analysis.check_consistency(&game) {
            warnings.push(e.to_string());
        }
        for round in &analysis.rounds {
            if let Some(minority) = round.tally_minority() {
                if minority != round.winning_vote {
                    warnings.push(format!(
                        "round {} recorded {} as the minority but the tally was {} yes / {} no",
                        round.round, round.winning_vote, round.yes_count, round.no_count
                    ));
                }
            }
        }
        for warning in &warnings {
            warn!("game {}: {}", game.game_id, warning);
        }
        let standings = analysis.standings(&game);
        Ok(AnalysisReport {
            question_text: game.question_text,
            state: game.state,
            current_round: game.current_round,
            analysis,
            standings,
            warnings,
        })
    }
}
