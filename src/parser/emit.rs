use serde::{Deserialize, Serialize};

use super::classify::{CategoryBuckets, GENERAL};
use super::hierarchy::HierarchyTag;
use super::sections::{DrugSection, Paragraph};

pub const UNCLASSIFIED: &str = "Unclassified";

const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// One output record: a drug's regulation text for one cancer type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedEntry {
    pub drug_name: String,
    pub cancer_type: String,
    pub regulation: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum RenderStyle {
    /// Paragraph text as-is.
    #[default]
    Plain,
    /// Bold top-level lines, `>` quote markers for nesting depth.
    Markdown,
}

pub fn render(paragraph: &Paragraph, style: RenderStyle) -> String {
    match style {
        RenderStyle::Plain => paragraph.text.clone(),
        RenderStyle::Markdown => match paragraph.tag {
            HierarchyTag::Parent => format!("**{}**", paragraph.text),
            _ if paragraph.depth == 0 => paragraph.text.clone(),
            _ => format!("{} {}", ">".repeat(paragraph.depth as usize), paragraph.text),
        },
    }
}

fn join_rendered<'a>(paragraphs: impl Iterator<Item = &'a Paragraph>, style: RenderStyle) -> String {
    paragraphs
        .map(|p| render(p, style))
        .collect::<Vec<_>>()
        .join(PARAGRAPH_SEPARATOR)
        .trim()
        .to_string()
}

/// Flatten a section's buckets into entries, General first.
pub fn emit_section(
    section: &DrugSection,
    buckets: &CategoryBuckets,
    style: RenderStyle,
) -> Vec<ClassifiedEntry> {
    if buckets.is_empty() {
        let cancer_type = if section.paragraphs.is_empty() {
            GENERAL
        } else {
            UNCLASSIFIED
        };
        return vec![ClassifiedEntry {
            drug_name: section.name.clone(),
            cancer_type: cancer_type.to_string(),
            regulation: join_rendered(section.paragraphs.iter(), RenderStyle::Plain),
        }];
    }

    buckets
        .ordered()
        .into_iter()
        .map(|(category, paragraphs)| ClassifiedEntry {
            drug_name: section.name.clone(),
            cancer_type: category.to_string(),
            regulation: join_rendered(paragraphs.iter().copied(), style),
        })
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::classify::Classifier;
    use crate::parser::sections::split_sections;
    use crate::parser::synonyms::SynonymTable;

    fn entries(lines: &[&str], style: RenderStyle) -> Vec<ClassifiedEntry> {
        let table = SynonymTable::builtin();
        let classifier = Classifier::new(&table);
        split_sections(lines)
            .iter()
            .flat_map(|s| emit_section(s, &classifier.classify(s), style))
            .collect()
    }

    fn entry(drug: &str, cancer: &str, regulation: &str) -> ClassifiedEntry {
        ClassifiedEntry {
            drug_name: drug.to_string(),
            cancer_type: cancer.to_string(),
            regulation: regulation.to_string(),
        }
    }

    #[test]
    fn general_comes_first() {
        let out = entries(
            &["9.1 DrugX", "1. 肺癌", "(1) Adult dose 100mg", "2. Dosage", "(1) 50mg"],
            RenderStyle::Plain,
        );
        assert_eq!(
            out,
            [
                entry("9.1 DrugX", GENERAL, "2. Dosage\n\n(1) 50mg"),
                entry("9.1 DrugX", "肺癌", "1. 肺癌\n\n(1) Adult dose 100mg"),
            ]
        );
    }

    #[test]
    fn empty_section_emits_empty_general() {
        let out = entries(&["9.1 DrugX：(刪除)"], RenderStyle::Markdown);
        assert_eq!(out, [entry("9.1 DrugX", GENERAL, "")]);
    }

    #[test]
    fn unclassified_fallback() {
        let sections = split_sections(["9.1 DrugX", "1. a", "(1) b"]);
        let out = emit_section(&sections[0], &CategoryBuckets::default(), RenderStyle::Markdown);
        assert_eq!(out, [entry("9.1 DrugX", UNCLASSIFIED, "1. a\n\n(1) b")]);
    }

    #[test]
    fn markdown_markers() {
        let out = entries(
            &["9.1 DrugX", "1. 肺癌", "(1) a", "note", "I. b", "i. c", "2. Dosage", "tail"],
            RenderStyle::Markdown,
        );
        assert_eq!(
            out,
            [
                entry("9.1 DrugX", GENERAL, "**2. Dosage**\n\ntail"),
                entry(
                    "9.1 DrugX",
                    "肺癌",
                    "**1. 肺癌**\n\n> (1) a\n\n> note\n\n>> I. b\n\n>>> i. c"
                ),
            ]
        );
    }

    #[test]
    fn entries_serialize_with_contract_field_names() {
        let json = serde_json::to_value(entry("9.1 DrugX", "肺癌", "x")).unwrap();
        assert_eq!(json["drug_name"], "9.1 DrugX");
        assert_eq!(json["cancer_type"], "肺癌");
        assert_eq!(json["regulation"], "x");
    }
}
