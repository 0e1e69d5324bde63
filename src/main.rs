use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::Path;

use anyhow::Context as _;
use clap::Parser;

use guildgrep::api::SearchClient;
use guildgrep::history;
use guildgrep::search::{self, SearchOutcome};

/// Output file, relative to the working directory, overwritten each run.
const OUTPUT_FILE: &str = "results.txt";
const TOKEN_ENV_VAR: &str = "DISCORD_TOKEN";

#[derive(Parser)]
#[command(
    name = "guildgrep",
    version,
    about = "Search Discord messages in a guild and save them to a text file"
)]
struct Cli {
    /// The search string to look for in messages
    query: String,

    /// Guild ID to search in
    #[arg(long)]
    guild_id: Option<String>,

    /// Saved guild name to search in
    #[arg(long, conflicts_with = "guild_id")]
    guild_name: Option<String>,

    /// Show per-request details
    #[arg(short, long)]
    verbose: bool,
}

fn cmd_search(cli: &Cli) -> anyhow::Result<i32> {
    let history_path = Path::new(history::HISTORY_FILE);
    let mut hist = history::load(history_path);

    let resolved = match history::resolve(
        &mut hist,
        cli.guild_id.as_deref(),
        cli.guild_name.as_deref(),
    ) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("[guildgrep] error: {e:#}");
            return Ok(1);
        }
    };

    // Save failures keep the run going; the resolved id is already in hand.
    if let Err(e) = history::save(history_path, &hist) {
        eprintln!("[guildgrep] error saving guild history: {e:#}");
    }

    let Some(token) = std::env::var(TOKEN_ENV_VAR).ok().filter(|t| !t.is_empty()) else {
        eprintln!("[guildgrep] error: {TOKEN_ENV_VAR} is not set");
        return Ok(2);
    };
    let client = SearchClient::new(&token)?;

    let file = File::create(OUTPUT_FILE).with_context(|| format!("create {OUTPUT_FILE}"))?;
    let mut out = BufWriter::new(file);

    eprintln!(
        "[guildgrep] searching guild '{}' ({}) for '{}'",
        resolved.name, resolved.id, cli.query
    );

    let outcome = search::run(&client, &resolved.id, &cli.query, &mut out, cli.verbose)?;
    out.flush().context("flush results")?;

    match &outcome {
        SearchOutcome::Exhausted { total } => {
            eprintln!("[guildgrep] search complete — {total} message(s) written to {OUTPUT_FILE}");
        }
        SearchOutcome::TransportError { total, .. } => {
            eprintln!(
                "[guildgrep] search stopped early — {total} message(s) written to {OUTPUT_FILE}"
            );
        }
    }
    Ok(0)
}

fn main() {
    // A local .env file supplements the environment; absence is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let exit_code = cmd_search(&cli).unwrap_or_else(|e| {
        eprintln!("[guildgrep] error: {e:#}");
        1
    });
    std::process::exit(exit_code);
}
