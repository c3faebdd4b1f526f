use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error};
use minority_cli::config::{Cli, Command, Config};
use minority_cli::App;
use minority_core::commitment::FileStore;
use std::io::Read;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::from_cli(&cli);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter))
        .format_target(false)
        .format_timestamp_millis()
        .init();

    match run(config, cli.command) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config, command: Command) -> Result<ExitCode> {
    let store = FileStore::open(&config.store_path);
    debug!("using commitment store at {}", store.path().display());
    let mut app = App::new(store);
    match command {
        Command::Salt => println!("{}", app.salt()?),
        Command::Hash { vote, salt } => println!("{}", app.hash(vote, &salt)?),
        Command::Verify { vote, salt, hash } => {
            let valid = app.verify(vote, &salt, &hash)?;
            println!("{}", valid);
            if !valid {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Commit { game, vote } => {
            let commitment = app.commit(&game)?;
            match vote {
                Some(vote) => println!("{}", commitment.hash_for(vote)),
                None => println!("{}", serde_json::to_string_pretty(&commitment)?),
            }
        }
        Command::Reveal { game, vote } => {
            let payload = app.reveal(&game, vote)?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Command::Clear { game } => app.clear(&game)?,
        Command::Analyze { file } => {
            let snapshot = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("failed to read snapshot from stdin")?;
                    buf
                }
            };
            let report = app.analyze(&snapshot)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(ExitCode::SUCCESS)
}
