use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_STORE_PATH: &str = ".minority/commitments.json";

#[derive(Parser, Debug)]
#[command(
    name = "minority",
    version,
    about = "Commit/reveal helper and round analyzer for Minority Rule games"
)]
pub struct Cli {
    /// Where commitments are kept between commit and reveal.
    #[arg(long, global = true, env = "MINORITY_STORE", default_value = DEFAULT_STORE_PATH)]
    pub store: PathBuf,
    /// More log output; repeat for more detail. RUST_LOG overrides this.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print a fresh 32-byte salt as hex.
    Salt,
    /// Print the commit hash for a vote and salt.
    Hash {
        #[arg(long, action = ArgAction::Set)]
        vote: bool,
        #[arg(long)]
        salt: String,
    },
    /// Check a commit hash against a vote and salt.
    Verify {
        #[arg(long, action = ArgAction::Set)]
        vote: bool,
        #[arg(long)]
        salt: String,
        #[arg(long)]
        hash: String,
    },
    /// Create and store a commitment for a game.
    Commit {
        #[arg(long)]
        game: String,
        /// Print only the hash to submit for this vote.
        #[arg(long)]
        vote: Option<bool>,
    },
    /// Print the salt and hash needed to reveal a stored commitment.
    Reveal {
        #[arg(long)]
        game: String,
        #[arg(long, action = ArgAction::Set)]
        vote: bool,
    },
    /// Drop the stored commitment for a game.
    Clear {
        #[arg(long)]
        game: String,
    },
    /// Replay a game snapshot (file or stdin) into per-round results.
    Analyze { file: Option<PathBuf> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub store_path: PathBuf,
    pub log_filter: &'static str,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        let log_filter = match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        Self {
            store_path: cli.store.clone(),
            log_filter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reveal_with_explicit_bool() {
        let cli =
            Cli::try_parse_from(["minority", "reveal", "--game", "4", "--vote", "false"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Reveal {
                game: "4".into(),
                vote: false
            }
        );
    }

    #[test]
    fn commit_vote_is_optional() {
        let cli = Cli::try_parse_from(["minority", "commit", "--game", "4"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Commit {
                game: "4".into(),
                vote: None
            }
        );
    }

    #[test]
    fn verbosity_maps_to_log_filter() {
        let cli =
            Cli::try_parse_from(["minority", "-vv", "--store", "/tmp/c.json", "salt"]).unwrap();
        let config = Config::from_cli(&cli);
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.store_path, PathBuf::from("/tmp/c.json"));
    }

    #[test]
    fn hash_requires_vote() {
        assert!(Cli::try_parse_from(["minority", "hash", "--salt", "00"]).is_err());
    }
}
