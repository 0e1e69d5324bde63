use std::fs;
use std::path::Path;

use anyhow::Context as _;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default location of the guild history file, relative to the working directory.
pub const HISTORY_FILE: &str = "guild_history.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildEntry {
    pub name: String,
}

/// Persisted record of known guilds and the last one searched.
///
/// The guild map keeps insertion order so that name lookups scan guilds in
/// the order they were first saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildHistory {
    #[serde(default)]
    pub guilds: IndexMap<String, GuildEntry>,
    #[serde(default)]
    pub last_used_id: Option<String>,
}

/// The guild a search run will target, produced by [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGuild {
    pub id: String,
    pub name: String,
}

/// Load the guild history from `path`.
///
/// A missing file yields an empty history. A file that exists but cannot be
/// read or parsed is warned about on stderr and treated as empty; the next
/// save overwrites it.
pub fn load(path: &Path) -> GuildHistory {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return GuildHistory::default(),
        Err(e) => {
            eprintln!(
                "[guildgrep] warning: could not read {}: {e}",
                path.display()
            );
            return GuildHistory::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(history) => history,
        Err(e) => {
            eprintln!(
                "[guildgrep] warning: {} is malformed and will be ignored: {e}",
                path.display()
            );
            GuildHistory::default()
        }
    }
}

/// Persist the guild history to `path` as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the file
/// cannot be written.
pub fn save(path: &Path, history: &GuildHistory) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(history).context("serialize guild history")?;
    fs::write(path, content).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Find the id of the guild whose stored name exactly matches `name`.
///
/// Comparison is case-sensitive; the first match in stored order wins.
pub fn find_id_by_name<'a>(history: &'a GuildHistory, name: &str) -> Option<&'a str> {
    history
        .guilds
        .iter()
        .find(|(_, entry)| entry.name == name)
        .map(|(id, _)| id.as_str())
}

/// Decide which guild to search and record it as the new last-used guild.
///
/// Resolution order: explicit id, then explicit name, then the persisted
/// last-used id. An explicit id unknown to the history is inserted with a
/// placeholder name. When no default is available, the known guilds are
/// listed on stderr before the error is returned.
///
/// # Errors
///
/// Returns an error if `guild_name` matches no stored guild, or if neither
/// id nor name was given and there is no usable last-used id.
pub fn resolve(
    history: &mut GuildHistory,
    guild_id: Option<&str>,
    guild_name: Option<&str>,
) -> anyhow::Result<ResolvedGuild> {
    let resolved = if let Some(id) = guild_id {
        let entry = history
            .guilds
            .entry(id.to_string())
            .or_insert_with(|| GuildEntry {
                name: format!("Unnamed Guild {id}"),
            });
        ResolvedGuild {
            id: id.to_string(),
            name: entry.name.clone(),
        }
    } else if let Some(name) = guild_name {
        let id = find_id_by_name(history, name)
            .ok_or_else(|| anyhow::anyhow!("guild name '{name}' not found in {HISTORY_FILE}"))?
            .to_string();
        ResolvedGuild {
            id,
            name: name.to_string(),
        }
    } else {
        let last = history
            .last_used_id
            .as_deref()
            .and_then(|id| {
                history
                    .guilds
                    .get(id)
                    .map(|entry| (id.to_string(), entry.name.clone()))
            });
        let Some((id, name)) = last else {
            if !history.guilds.is_empty() {
                eprintln!("[guildgrep] known guilds:");
                for (id, entry) in &history.guilds {
                    eprintln!("[guildgrep]   {id}  {}", entry.name);
                }
            }
            anyhow::bail!(
                "no default guild set or found — specify one with --guild-id or --guild-name"
            );
        };
        ResolvedGuild { id, name }
    };

    history.last_used_id = Some(resolved.id.clone());
    Ok(resolved)
}
