use tracing::debug;

use super::hierarchy::HierarchyTag;
use super::sections::{DrugSection, Paragraph};
use super::synonyms::SynonymTable;

pub const GENERAL: &str = "General";

/// How one paragraph moves the active category set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Reset phrase present: back to General, nothing else evaluated.
    Reset,
    /// Top-level line: its keywords replace the set, none means General.
    Declare,
    /// Nested line: keep the set, no keyword scan.
    Inherit,
    /// Unnumbered line: keywords replace the set, none keeps it.
    Sticky,
}

impl Rule {
    pub fn for_tag(tag: HierarchyTag) -> Rule {
        match tag {
            HierarchyTag::Parent => Rule::Declare,
            HierarchyTag::Child | HierarchyTag::Grandchild | HierarchyTag::GreatGrandchild => {
                Rule::Inherit
            }
            HierarchyTag::Plain => Rule::Sticky,
            // Unreachable from `classify`: headings end the section instead of
            // joining it. Listed so the match covers every tag; a new section
            // starts from General, hence Reset.
            HierarchyTag::Heading => Rule::Reset,
        }
    }

    pub fn scans_keywords(self) -> bool {
        matches!(self, Rule::Declare | Rule::Sticky)
    }
}

/// Active categories while walking one section. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationState {
    active: Vec<String>,
}

impl Default for ClassificationState {
    fn default() -> Self {
        Self::general()
    }
}

impl ClassificationState {
    pub fn general() -> Self {
        ClassificationState {
            active: vec![GENERAL.to_string()],
        }
    }

    pub fn active(&self) -> &[String] {
        &self.active
    }

    #[cfg(test)]
    pub fn is_general(&self) -> bool {
        self.active.len() == 1 && self.active[0] == GENERAL
    }

    /// Pure transition: previous state + rule + keyword matches → next state.
    pub fn apply(&self, rule: Rule, matches: Vec<String>) -> ClassificationState {
        match rule {
            Rule::Reset => Self::general(),
            Rule::Inherit => self.clone(),
            Rule::Declare if matches.is_empty() => Self::general(),
            Rule::Sticky if matches.is_empty() => self.clone(),
            Rule::Declare | Rule::Sticky => ClassificationState { active: matches },
        }
    }
}

/// Paragraphs per category for one section, in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryBuckets<'s> {
    buckets: Vec<(String, Vec<&'s Paragraph>)>,
}

impl<'s> CategoryBuckets<'s> {
    pub fn push(&mut self, category: &str, paragraph: &'s Paragraph) {
        match self.buckets.iter_mut().find(|(c, _)| c.as_str() == category) {
            Some((_, items)) => items.push(paragraph),
            None => self.buckets.push((category.to_string(), vec![paragraph])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Category names in first-insertion order.
    pub fn categories(&self) -> Vec<&str> {
        self.buckets.iter().map(|(c, _)| c.as_str()).collect()
    }

    /// General first if present, the rest in first-insertion order.
    pub fn ordered(&self) -> Vec<(&str, &[&'s Paragraph])> {
        let general = self.buckets.iter().filter(|(c, _)| c == GENERAL);
        let rest = self.buckets.iter().filter(|(c, _)| c != GENERAL);
        general
            .chain(rest)
            .map(|(c, items)| (c.as_str(), items.as_slice()))
            .collect()
    }
}

pub struct Classifier<'t> {
    table: &'t SynonymTable,
}

impl<'t> Classifier<'t> {
    pub fn new(table: &'t SynonymTable) -> Self {
        Classifier { table }
    }

    pub fn rule_for(&self, paragraph: &Paragraph) -> Rule {
        if self.table.is_reset(&paragraph.text) {
            Rule::Reset
        } else {
            Rule::for_tag(paragraph.tag)
        }
    }

    /// State after `paragraph`, given the state left by the one before it.
    pub fn step(&self, state: &ClassificationState, paragraph: &Paragraph) -> ClassificationState {
        let rule = self.rule_for(paragraph);
        let matches = if rule.scans_keywords() {
            self.table.matches(&paragraph.text)
        } else {
            Vec::new()
        };
        state.apply(rule, matches)
    }

    pub fn classify<'s>(&self, section: &'s DrugSection) -> CategoryBuckets<'s> {
        let mut state = ClassificationState::general();
        let mut buckets = CategoryBuckets::default();

        for paragraph in &section.paragraphs {
            state = self.step(&state, paragraph);
            for category in state.active() {
                buckets.push(category, paragraph);
            }
        }

        debug!(
            drug = %section.name,
            paragraphs = section.paragraphs.len(),
            categories = ?buckets.categories(),
            "classified section"
        );
        buckets
    }
}

// ── Tests ──
