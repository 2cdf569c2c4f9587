//! Interactive search loop with paged results.

use crate::search::run_query;
use anyhow::Result;
use sitesearch_core::{RankingAlgorithm, SearchEngine, SearchHit};
use std::io::{BufRead, Write};

/// Results shown per page.
pub const PAGE_SIZE: usize = 10;

/// Results fetched per query; paging happens client-side.
const SEARCH_LIMIT: usize = 1_000;

/// Reads queries from `input` until it ends, writing paged results to `output`.
///
/// After a result page, `n` and `p` move to the next and previous page and
/// any other line starts a new search.
pub fn run_repl(
    engine: &SearchEngine,
    algorithm: RankingAlgorithm,
    input: impl BufRead,
    mut output: impl Write,
) -> Result<()> {
    let mut lines = input.lines();
    let mut explained = false;

    loop {
        writeln!(output, "\nEnter search query:")?;
        output.flush()?;
        let Some(line) = lines.next().transpose()? else {
            return Ok(());
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }

        let outcome = match run_query(engine, query, SEARCH_LIMIT, algorithm) {
            Ok(outcome) => outcome,
            Err(e) => {
                writeln!(output, "{:#}", e)?;
                continue;
            }
        };
        let seconds = outcome.elapsed.as_secs_f64();
        if outcome.hits.is_empty() {
            writeln!(
                output,
                "\nYour search did not match any documents ({:.3} seconds)",
                seconds
            )?;
            continue;
        }

        writeln!(
            output,
            "\nFound {} results ({:.3} seconds)\n",
            outcome.hits.len(),
            seconds
        )?;
        let pages = outcome.hits.len().div_ceil(PAGE_SIZE);
        let mut page = 1;
        write_page(&mut output, &outcome.hits, page)?;

        loop {
            if !explained {
                writeln!(
                    output,
                    "\nEnter n or p for next or previous page, any other key to search again"
                )?;
                explained = true;
            }
            output.flush()?;
            let Some(key) = lines.next().transpose()? else {
                return Ok(());
            };
            match key.trim() {
                "n" => page = (page + 1).min(pages),
                "p" => page = page.saturating_sub(1).max(1),
                _ => break,
            }
            write_page(&mut output, &outcome.hits, page)?;
        }
    }
}

fn write_page(output: &mut impl Write, hits: &[SearchHit], page: usize) -> Result<()> {
    let start = (page - 1) * PAGE_SIZE;
    for (rank, hit) in hits.iter().enumerate().skip(start).take(PAGE_SIZE) {
        writeln!(output, "{}. {}", rank + 1, hit.document.url)?;
    }
    Ok(())
}
