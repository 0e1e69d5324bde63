use std::io::Write;

use anyhow::Context as _;

use crate::api::SearchClient;
use crate::output::MessageRecord;

/// How a pagination run ended.
#[derive(Debug)]
pub enum SearchOutcome {
    /// The endpoint returned an empty page; every match was fetched.
    Exhausted { total: usize },
    /// A page request failed; `total` messages were written before the stop.
    TransportError {
        total: usize,
        error: anyhow::Error,
    },
}

impl SearchOutcome {
    pub const fn total(&self) -> usize {
        match self {
            Self::Exhausted { total } | Self::TransportError { total, .. } => *total,
        }
    }
}

/// Page through the search results for `query` in `guild_id`, writing one
/// line per message to `out` in the order the API returns them.
///
/// The offset advances by the number of entries actually flattened from each
/// page, so a short page still lines the next request up directly behind it.
/// Any fetch failure stops the loop; what was already written stays written.
///
/// # Errors
///
/// Returns an error only if writing to `out` fails. Fetch failures are
/// reported through [`SearchOutcome::TransportError`] instead.
pub fn run<W: Write>(
    client: &SearchClient,
    guild_id: &str,
    query: &str,
    out: &mut W,
    verbose: bool,
) -> anyhow::Result<SearchOutcome> {
    let mut offset = 0usize;
    let mut total = 0usize;

    loop {
        if verbose {
            eprintln!("[guildgrep] requesting page at offset {offset}");
        }
        let page = match client.fetch_page(guild_id, query, offset) {
            Ok(page) => page,
            Err(error) => {
                eprintln!("[guildgrep] error fetching page at offset {offset}: {error:#}");
                eprintln!("[guildgrep] stopping due to fetch error");
                return Ok(SearchOutcome::TransportError { total, error });
            }
        };

        if verbose
            && offset == 0
            && let Some(reported) = page.total_results
        {
            eprintln!("[guildgrep] endpoint reports {reported} total result(s)");
        }

        // Entries are tuple-like arrays; element 0 is the matching message.
        // Empty entries are skipped rather than trusted.
        let records: Vec<MessageRecord> = page
            .messages
            .iter()
            .filter_map(|entry| entry.first())
            .map(MessageRecord::from_raw)
            .collect();

        if records.is_empty() {
            eprintln!("[guildgrep] no more messages found at offset {offset}");
            return Ok(SearchOutcome::Exhausted { total });
        }

        for record in &records {
            writeln!(out, "{}", record.format_line()).context("write results")?;
        }

        let fetched = records.len();
        total += fetched;
        offset += fetched;
        eprintln!(
            "[guildgrep] fetched {fetched} message(s) (total {total}), next offset {offset}"
        );
    }
}
