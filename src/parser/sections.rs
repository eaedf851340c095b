use super::hierarchy::{self, HierarchyTag};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub text: String,
    pub tag: HierarchyTag,
    /// Visual indent depth (0..=3). Plain lines inherit the last explicit depth.
    pub depth: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrugSection {
    pub name: String,
    pub paragraphs: Vec<Paragraph>,
}

impl DrugSection {
    fn new(heading: &str) -> Self {
        DrugSection {
            name: clean_drug_name(heading),
            paragraphs: Vec::new(),
        }
    }
}

/// Split a flat paragraph stream into drug sections by `9.<n>` headings.
/// Paragraphs before the first heading have no drug context and are dropped.
pub fn split_sections<I, S>(paragraphs: I) -> Vec<DrugSection>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut sections: Vec<DrugSection> = Vec::new();
    let mut current: Option<DrugSection> = None;
    let mut depth: u8 = 0;

    for raw in paragraphs {
        let text = raw.as_ref().trim();
        if text.is_empty() {
            continue;
        }

        let tag = hierarchy::tag_line(text);
        if tag == HierarchyTag::Heading {
            if let Some(done) = current.take() {
                sections.push(done);
            }
            current = Some(DrugSection::new(text));
            depth = 0;
            continue;
        }

        let Some(section) = current.as_mut() else {
            continue;
        };

        if let Some(d) = tag.explicit_depth() {
            depth = d;
        }
        section.paragraphs.push(Paragraph {
            text: text.to_string(),
            tag,
            depth,
        });
    }

    if let Some(done) = current {
        sections.push(done);
    }

    sections
}

/// Heading text up to the first half- or full-width colon.
pub fn clean_drug_name(heading: &str) -> String {
    heading
        .split([':', '：'])
        .next()
        .unwrap_or(heading)
        .trim()
        .to_string()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_lines() -> Vec<String> {
        let text = std::fs::read_to_string("tests/fixtures/regulations.txt").unwrap();
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn drug_names_are_cleaned() {
        assert_eq!(clean_drug_name("9.1 Gefitinib: (91/11/1)"), "9.1 Gefitinib");
        assert_eq!(clean_drug_name("9.2 Erlotinib：(95/6/1)"), "9.2 Erlotinib");
        assert_eq!(clean_drug_name("9.3 Plain heading "), "9.3 Plain heading");
    }

    #[test]
    fn preamble_is_dropped() {
        let sections = split_sections(["Introduction", "1. 通則", "9.1 DrugX", "1. Dose"]);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, "9.1 DrugX");
        assert_eq!(sections[0].paragraphs.len(), 1);
        assert_eq!(sections[0].paragraphs[0].text, "1. Dose");
    }

    #[test]
    fn no_heading_means_no_sections() {
        assert!(split_sections(["1. a", "(1) b", "c"]).is_empty());
    }

    #[test]
    fn empty_sections_are_kept() {
        let sections = split_sections(["9.1 A", "9.2 B", "1. x", "9.3 C"]);
        let names: Vec<&str> = sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["9.1 A", "9.2 B", "9.3 C"]);
        assert!(sections[0].paragraphs.is_empty());
        assert_eq!(sections[1].paragraphs.len(), 1);
        assert!(sections[2].paragraphs.is_empty());
    }

    #[test]
    fn plain_lines_inherit_depth() {
        let sections = split_sections(["9.1 A", "1. x", "(1) y", "note", "I. z", "note2", "2. w", "note3"]);
        let depths: Vec<(HierarchyTag, u8)> = sections[0].paragraphs.iter().map(|p| (p.tag, p.depth)).collect();
        assert_eq!(
            depths,
            [
                (HierarchyTag::Parent, 0),
                (HierarchyTag::Child, 1),
                (HierarchyTag::Plain, 1),
                (HierarchyTag::Grandchild, 2),
                (HierarchyTag::Plain, 2),
                (HierarchyTag::Parent, 0),
                (HierarchyTag::Plain, 0),
            ]
        );
    }

    #[test]
    fn depth_resets_at_heading() {
        let sections = split_sections(["9.1 A", "(1) y", "9.2 B", "note"]);
        assert_eq!(sections[1].paragraphs[0].depth, 0);
    }

    #[test]
    fn blank_input_lines_are_skipped() {
        let sections = split_sections(["9.1 A", "   ", "", "  1. x  "]);
        assert_eq!(sections[0].paragraphs.len(), 1);
        assert_eq!(sections[0].paragraphs[0].text, "1. x");
    }

    #[test]
    fn fixture_sections() {
        let sections = split_sections(fixture_lines());
        let names: Vec<&str> = sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            ["9.1 Gefitinib", "9.2 Bevacizumab", "9.3 Pembrolizumab", "9.4 Placeholder"]
        );
        assert!(sections[3].paragraphs.is_empty());
        // Every body line lands in exactly one section.
        let total: usize = sections.iter().map(|s| s.paragraphs.len()).sum();
        let body_lines = fixture_lines()
            .iter()
            .skip_while(|l| !hierarchy::is_heading(l.trim()))
            .filter(|l| !l.trim().is_empty() && !hierarchy::is_heading(l.trim()))
            .count();
        assert_eq!(total, body_lines);
    }
}
