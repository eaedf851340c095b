use std::path::Path;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::db;
use crate::output;
use crate::parser;
use crate::parser::emit::{ClassifiedEntry, RenderStyle};
use crate::parser::sections::{self, DrugSection};
use crate::parser::synonyms::SynonymTable;

/// What one `convert` run produced. Zero entries means nothing was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Converted {
    pub entries: usize,
    pub drugs: usize,
}

/// Source → entries → JSON file (+ lookup table when `conn` is given).
///
/// Previous output survives two failure modes: an unreadable source returns
/// the error before anything is touched, and a document without drug
/// headings returns zero entries without writing.
pub async fn convert(
    input: &str,
    out_path: &Path,
    conn: Option<&Connection>,
    table: &SynonymTable,
    style: RenderStyle,
) -> Result<Converted> {
    let paragraphs = match crate::source::load(input).await {
        Ok(p) => p,
        Err(e) => {
            warn!("Source unavailable: {:#}", e);
            return Err(e.context("Source unavailable, previous output left untouched"));
        }
    };

    let sections = sections::split_sections(&paragraphs);
    let entries = process_sections(&sections, table, style);
    if entries.is_empty() {
        warn!("No drug headings found in {}; previous output left untouched", input);
        return Ok(Converted { entries: 0, drugs: 0 });
    }

    output::write_json_atomic(out_path, &entries)?;
    if let Some(conn) = conn {
        db::replace_regulations(conn, input, &entries)?;
    }

    Ok(Converted {
        entries: entries.len(),
        drugs: sections.len(),
    })
}

fn process_sections(
    sections: &[DrugSection],
    table: &SynonymTable,
    style: RenderStyle,
) -> Vec<ClassifiedEntry> {
    let pb = ProgressBar::new(sections.len() as u64);
    if let Ok(bar_style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} drugs")
    {
        pb.set_style(bar_style.progress_chars("#>-"));
    }

    let entries = parser::process_sections(sections, table, style, |_| pb.inc(1));

    pb.finish_and_clear();
    info!("Classified {} drugs into {} entries", sections.len(), entries.len());
    entries
}

// ── Tests ──
