//! fatetrace CLI: prints the Fate history of one player.
//!
//! Usage: `fatetrace <player-id> [--json]`

use anyhow::{anyhow, bail};

use fatetrace_lib::fate::report;
use fatetrace_lib::{load_config, trace_player, ErrorPayload};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let mut player_id: Option<String> = None;
    let mut json = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            "-h" | "--help" => {
                println!("Usage: fatetrace <player-id> [--json]");
                return Ok(());
            }
            other if other.starts_with('-') => bail!("Unknown option: {other}"),
            other if player_id.is_none() => player_id = Some(other.to_string()),
            other => bail!("Unexpected argument: {other}"),
        }
    }
    let Some(player_id) = player_id else {
        bail!("Usage: fatetrace <player-id> [--json]");
    };

    let config = load_config().map_err(|e| anyhow!("Failed to load fatetrace config: {e}"))?;

    match trace_player(&config, &player_id) {
        Ok(transitions) if json => {
            println!("{}", serde_json::to_string_pretty(&transitions)?);
        }
        Ok(transitions) => {
            print!("{}", report::render(&transitions));
        }
        Err(err) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&ErrorPayload::from(&err))?);
            } else {
                eprintln!("{err}");
                eprintln!("{}", err.recovery_suggestion());
            }
            std::process::exit(1);
        }
    }

    Ok(())
}
