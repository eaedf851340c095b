pub mod classify;
pub mod emit;
pub mod hierarchy;
pub mod sections;
pub mod synonyms;

use rayon::prelude::*;

use classify::Classifier;
use emit::{ClassifiedEntry, RenderStyle};
use sections::DrugSection;
use synonyms::SynonymTable;

/// Two-phase pipeline for one drug: classify paragraphs → emit entries.
pub fn process_section(
    section: &DrugSection,
    table: &SynonymTable,
    style: RenderStyle,
) -> Vec<ClassifiedEntry> {
    let buckets = Classifier::new(table).classify(section);
    emit::emit_section(section, &buckets, style)
}

/// Sections → entries, in document order. Sections share no state, so they
/// are classified in parallel; `on_section` fires as each one finishes.
pub fn process_sections<F>(
    sections: &[DrugSection],
    table: &SynonymTable,
    style: RenderStyle,
    on_section: F,
) -> Vec<ClassifiedEntry>
where
    F: Fn(&DrugSection) + Sync,
{
    let per_section: Vec<Vec<ClassifiedEntry>> = sections
        .par_iter()
        .map(|s| {
            let entries = process_section(s, table, style);
            on_section(s);
            entries
        })
        .collect();
    per_section.into_iter().flatten().collect()
}

// ── Tests ──
