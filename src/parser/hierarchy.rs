use std::sync::LazyLock;

use regex::Regex;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^9\.\d+").unwrap());
static PARENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.").unwrap());
static CHILD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\(\d+\)").unwrap());
static UPPER_ROMAN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[IVX]+\.").unwrap());
static LOWER_ROMAN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[ivx]+\.").unwrap());

/// Structural level of a paragraph, read from its leading numbering only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HierarchyTag {
    /// `9.<n>` drug heading.
    Heading,
    /// `1.`, `2.`
    Parent,
    /// `(1)`, `(2)`
    Child,
    /// `I.`, `II.`
    Grandchild,
    /// `i.`, `ii.`
    GreatGrandchild,
    /// No numbering.
    Plain,
}

impl HierarchyTag {
    /// Indent depth set by an explicitly numbered line. Plain lines carry
    /// no depth of their own and reuse the last one set.
    pub fn explicit_depth(self) -> Option<u8> {
        match self {
            HierarchyTag::Parent => Some(0),
            HierarchyTag::Child => Some(1),
            HierarchyTag::Grandchild => Some(2),
            HierarchyTag::GreatGrandchild => Some(3),
            HierarchyTag::Heading | HierarchyTag::Plain => None,
        }
    }
}

pub fn is_heading(text: &str) -> bool {
    HEADING_RE.is_match(text)
}

/// Tag a paragraph inside a drug section. Patterns are tried in order and
/// the first match wins; headings are detected separately by the segmenter.
pub fn tag_body_line(text: &str) -> HierarchyTag {
    let levels: [(&Regex, HierarchyTag); 4] = [
        (&*PARENT_RE, HierarchyTag::Parent),
        (&*CHILD_RE, HierarchyTag::Child),
        (&*UPPER_ROMAN_RE, HierarchyTag::Grandchild),
        (&*LOWER_ROMAN_RE, HierarchyTag::GreatGrandchild),
    ];
    levels
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, tag)| *tag)
        .unwrap_or(HierarchyTag::Plain)
}

pub fn tag_line(text: &str) -> HierarchyTag {
    if is_heading(text) {
        HierarchyTag::Heading
    } else {
        tag_body_line(text)
    }
}
