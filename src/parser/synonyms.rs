use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Raw keyword → canonical cancer label.
const DEFAULT_SYNONYMS: &[(&str, &str)] = &[
    // Lung
    ("非鱗狀非小細胞肺癌", "肺癌"),
    ("非小細胞肺癌", "肺癌"),
    ("小細胞肺癌", "肺癌"),
    ("鱗狀細胞肺癌", "肺癌"),
    ("鱗狀上皮細胞癌", "肺癌"),
    ("肺癌", "肺癌"),
    ("NSCLC", "肺癌"),
    ("SCLC", "肺癌"),
    // Colorectal
    ("直腸癌", "結直腸癌"),
    ("結腸癌", "結直腸癌"),
    ("大腸癌", "結直腸癌"),
    ("大腸直腸癌", "結直腸癌"),
    ("結直腸癌", "結直腸癌"),
    ("胃癌", "胃癌"),
    ("胃食道接合處", "胃癌"),
    ("乳癌", "乳癌"),
    ("胰臟癌", "胰臟癌"),
    ("胰腺癌", "胰臟癌"),
    ("肝癌", "肝癌"),
    ("肝細胞癌", "肝癌"),
    ("膽道癌", "膽道癌"),
    ("膽管癌", "膽道癌"),
    ("攝護腺癌", "攝護腺癌"),
    ("前列腺癌", "攝護腺癌"),
    ("黑色素瘤", "黑色素瘤"),
    // Urothelial
    ("泌尿道上皮癌", "尿路上皮癌"),
    ("泌尿道癌", "尿路上皮癌"),
    ("尿路上皮癌", "尿路上皮癌"),
    ("膀胱癌", "尿路上皮癌"),
    ("輸尿管癌", "尿路上皮癌"),
    ("腎盂癌", "尿路上皮癌"),
    // Head and neck
    ("頭頸癌", "頭頸癌"),
    ("口腔癌", "頭頸癌"),
    ("下咽癌", "頭頸癌"),
    ("口咽癌", "頭頸癌"),
    ("喉癌", "頭頸癌"),
    // Gynaecological
    ("卵巢癌", "卵巢癌"),
    ("輸卵管癌", "卵巢癌"),
    ("腹膜癌", "卵巢癌"),
    ("子宮頸癌", "子宮頸癌"),
    ("子宮體癌", "子宮體癌"),
    ("子宮內膜癌", "子宮體癌"),
    // Haematological
    ("淋巴瘤", "淋巴瘤"),
    ("白血病", "白血病"),
    ("多發性骨髓瘤", "多發性骨髓瘤"),
    ("神經母細胞瘤", "神經母細胞瘤"),
    ("GIST", "胃腸道基質瘤"),
    ("胃腸道基質瘤", "胃腸道基質瘤"),
    ("軟組織肉瘤", "軟組織肉瘤"),
    ("甲狀腺癌", "甲狀腺癌"),
    ("腎細胞癌", "腎細胞癌"),
    ("腎癌", "腎細胞癌"),
    ("骨癌", "骨癌"),
    ("皮膚癌", "皮膚癌"),
    ("基底細胞癌", "皮膚癌"),
];

/// Literal markers that put classification back to General.
pub const DEFAULT_RESET_PHRASES: &[&str] = &["給付規定通則", "一般給付規定", "通則"];

/// Immutable keyword lookup handed to the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymTable {
    entries: Vec<(String, String)>,
    reset_phrases: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SynonymFile {
    categories: Vec<CategoryKeywords>,
    #[serde(default)]
    reset_phrases: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CategoryKeywords {
    category: String,
    keywords: Vec<String>,
}

impl SynonymTable {
    pub fn new<K, C, R>(
        pairs: impl IntoIterator<Item = (K, C)>,
        reset_phrases: impl IntoIterator<Item = R>,
    ) -> Result<Self>
    where
        K: Into<String>,
        C: Into<String>,
        R: Into<String>,
    {
        let mut entries = Vec::new();
        for (keyword, category) in pairs {
            let keyword = keyword.into();
            let category = category.into();
            if keyword.trim().is_empty() {
                bail!("Empty keyword for category '{}'", category);
            }
            if category.trim().is_empty() {
                bail!("Empty category for keyword '{}'", keyword);
            }
            entries.push((keyword, category));
        }

        let mut phrases = Vec::new();
        for phrase in reset_phrases {
            let phrase = phrase.into();
            if phrase.trim().is_empty() {
                bail!("Empty reset phrase");
            }
            phrases.push(phrase);
        }

        Ok(SynonymTable {
            entries,
            reset_phrases: phrases,
        })
    }

    pub fn builtin() -> Self {
        SynonymTable {
            entries: DEFAULT_SYNONYMS
                .iter()
                .map(|(k, c)| (k.to_string(), c.to_string()))
                .collect(),
            reset_phrases: DEFAULT_RESET_PHRASES.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Parse an override file. Reset phrases fall back to the defaults when omitted.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: SynonymFile = serde_json::from_str(json).context("Invalid synonym file")?;
        let pairs = file
            .categories
            .into_iter()
            .flat_map(|c| {
                let category = c.category;
                c.keywords.into_iter().map(move |k| (k, category.clone()))
            })
            .collect::<Vec<_>>();
        let phrases = file.reset_phrases.unwrap_or_else(|| {
            DEFAULT_RESET_PHRASES.iter().map(|p| p.to_string()).collect()
        });
        Self::new(pairs, phrases)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read synonym file {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reset_phrases(&self) -> &[String] {
        &self.reset_phrases
    }

    /// Distinct categories in table order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for (_, category) in &self.entries {
            if !seen.contains(&category.as_str()) {
                seen.push(category.as_str());
            }
        }
        seen
    }

    pub fn keywords_for(&self, category: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, c)| c == category)
            .map(|(k, _)| k.as_str())
            .collect()
    }

    pub fn is_reset(&self, text: &str) -> bool {
        self.reset_phrases.iter().any(|p| text.contains(p.as_str()))
    }

    /// Every distinct category with a keyword occurring in `text`, ordered by
    /// where the category is first mentioned (table order breaks ties).
    pub fn matches(&self, text: &str) -> Vec<String> {
        // (category, first byte offset, table index of first hit)
        let mut hits: Vec<(&str, usize, usize)> = Vec::new();
        for (idx, (keyword, category)) in self.entries.iter().enumerate() {
            let Some(pos) = text.find(keyword.as_str()) else {
                continue;
            };
            match hits.iter_mut().find(|(c, _, _)| *c == category.as_str()) {
                Some(hit) => {
                    if pos < hit.1 {
                        hit.1 = pos;
                    }
                }
                None => hits.push((category.as_str(), pos, idx)),
            }
        }
        hits.sort_by_key(|&(_, pos, idx)| (pos, idx));
        hits.into_iter().map(|(c, _, _)| c.to_string()).collect()
    }
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lung_family_collapses() {
        let table = SynonymTable::builtin();
        assert_eq!(table.matches("晚期非鱗狀非小細胞肺癌"), ["肺癌"]);
        assert_eq!(table.matches("NSCLC first line"), ["肺癌"]);
        assert_eq!(table.matches("Dosage"), Vec::<String>::new());
    }

    #[test]
    fn multiple_categories_in_text_order() {
        let table = SynonymTable::builtin();
        assert_eq!(table.matches("用於乳癌及轉移性大腸直腸癌"), ["乳癌", "結直腸癌"]);
        assert_eq!(table.matches("轉移性大腸直腸癌或乳癌"), ["結直腸癌", "乳癌"]);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let table = SynonymTable::builtin();
        assert!(table.matches("nsclc").is_empty());
        assert!(table.matches("gist").is_empty());
    }

    #[test]
    fn reset_phrases() {
        let table = SynonymTable::builtin();
        assert!(table.is_reset("給付規定通則"));
        assert!(table.is_reset("（依一般給付規定辦理）"));
        assert!(!table.is_reset("肺癌"));
    }

    #[test]
    fn categories_and_keywords() {
        let table = SynonymTable::builtin();
        let cats = table.categories();
        assert_eq!(cats[0], "肺癌");
        assert_eq!(cats.iter().filter(|c| **c == "肺癌").count(), 1);
        assert!(table.keywords_for("皮膚癌").contains(&"基底細胞癌"));
    }

    #[test]
    fn json_override() {
        let json = r#"{
            "categories": [
                {"category": "Lung", "keywords": ["lung", "NSCLC"]},
                {"category": "Breast", "keywords": ["breast"]}
            ],
            "reset_phrases": ["general rule"]
        }"#;
        let table = SynonymTable::from_json(json).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.matches("breast and lung"), ["Breast", "Lung"]);
        assert!(table.is_reset("see general rule"));
        assert!(!table.is_reset("通則"));
    }

    #[test]
    fn json_override_keeps_default_resets() {
        let json = r#"{"categories": [{"category": "Lung", "keywords": ["lung"]}]}"#;
        let table = SynonymTable::from_json(json).unwrap();
        assert!(table.is_reset("給付規定通則"));
    }

    #[test]
    fn empty_keyword_rejected() {
        let json = r#"{"categories": [{"category": "Lung", "keywords": [""]}]}"#;
        assert!(SynonymTable::from_json(json).is_err());
        assert!(SynonymTable::new([("x", "")], Vec::<String>::new()).is_err());
    }
}
