use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::parser::emit::ClassifiedEntry;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS regulations (
            id          INTEGER PRIMARY KEY,
            drug_name   TEXT NOT NULL,
            cancer_type TEXT NOT NULL,
            regulation  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_regulations_pair ON regulations(drug_name, cancer_type);

        CREATE TABLE IF NOT EXISTS conversions (
            id           INTEGER PRIMARY KEY,
            source       TEXT NOT NULL,
            entries      INTEGER NOT NULL,
            drugs        INTEGER NOT NULL,
            converted_at TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

// ── Conversion ──

/// Swap the whole regulation table for `entries` in one transaction.
/// On any error the previous table is left as it was.
pub fn replace_regulations(
    conn: &Connection,
    source: &str,
    entries: &[ClassifiedEntry],
) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM regulations", [])?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO regulations (drug_name, cancer_type, regulation) VALUES (?1, ?2, ?3)",
        )?;
        for e in entries {
            count += stmt.execute(rusqlite::params![e.drug_name, e.cancer_type, e.regulation])?;
        }
    }
    let drugs: usize = tx.query_row(
        "SELECT COUNT(DISTINCT drug_name) FROM regulations",
        [],
        |r| r.get(0),
    )?;
    tx.execute(
        "INSERT INTO conversions (source, entries, drugs, converted_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![source, count, drugs, chrono::Utc::now().to_rfc3339()],
    )?;
    tx.commit()?;
    Ok(count)
}

// ── Lookup ──

/// Distinct drug names, optionally filtered by a case-insensitive substring.
pub fn fetch_drugs(conn: &Connection, search: Option<&str>) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT drug_name FROM regulations
         WHERE ?1 IS NULL OR instr(lower(drug_name), lower(?1)) > 0
         ORDER BY drug_name",
    )?;
    let rows = stmt
        .query_map([search], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn fetch_cancer_types(conn: &Connection, drug: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT cancer_type FROM regulations WHERE drug_name = ?1 ORDER BY cancer_type",
    )?;
    let rows = stmt
        .query_map([drug], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Regulation for a (drug, cancer type) pair. Pairs can repeat; the first
/// one inserted wins.
pub fn fetch_regulation(conn: &Connection, drug: &str, cancer: &str) -> Result<Option<String>> {
    let regulation = conn
        .query_row(
            "SELECT regulation FROM regulations
             WHERE drug_name = ?1 AND cancer_type = ?2
             ORDER BY id LIMIT 1",
            [drug, cancer],
            |row| row.get(0),
        )
        .optional()?;
    Ok(regulation)
}

// ── Stats ──

pub struct LastConversion {
    pub source: String,
    pub converted_at: String,
}

pub struct Stats {
    pub entries: usize,
    pub drugs: usize,
    pub cancer_types: usize,
    pub last_conversion: Option<LastConversion>,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let entries: usize = conn.query_row("SELECT COUNT(*) FROM regulations", [], |r| r.get(0))?;
    let drugs: usize = conn.query_row(
        "SELECT COUNT(DISTINCT drug_name) FROM regulations",
        [],
        |r| r.get(0),
    )?;
    let cancer_types: usize = conn.query_row(
        "SELECT COUNT(DISTINCT cancer_type) FROM regulations",
        [],
        |r| r.get(0),
    )?;
    let last_conversion = conn
        .query_row(
            "SELECT source, converted_at FROM conversions ORDER BY id DESC LIMIT 1",
            [],
            |r| {
                Ok(LastConversion {
                    source: r.get(0)?,
                    converted_at: r.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(Stats {
        entries,
        drugs,
        cancer_types,
        last_conversion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn entry(drug: &str, cancer: &str, regulation: &str) -> ClassifiedEntry {
        ClassifiedEntry {
            drug_name: drug.to_string(),
            cancer_type: cancer.to_string(),
            regulation: regulation.to_string(),
        }
    }

    fn sample() -> Vec<ClassifiedEntry> {
        vec![
            entry("9.1 Gefitinib", "General", "2. dose"),
            entry("9.1 Gefitinib", "肺癌", "1. 肺癌"),
            entry("9.2 Bevacizumab", "General", "first"),
            entry("9.2 Bevacizumab", "卵巢癌", "2. 卵巢癌"),
            entry("9.2 Bevacizumab", "General", "second"),
        ]
    }

    #[test]
    fn replace_and_lookup() {
        let conn = memory();
        assert_eq!(replace_regulations(&conn, "a.docx", &sample()).unwrap(), 5);
        assert_eq!(fetch_drugs(&conn, None).unwrap(), ["9.1 Gefitinib", "9.2 Bevacizumab"]);
        assert_eq!(fetch_cancer_types(&conn, "9.2 Bevacizumab").unwrap(), ["General", "卵巢癌"]);
        assert_eq!(
            fetch_regulation(&conn, "9.1 Gefitinib", "肺癌").unwrap().as_deref(),
            Some("1. 肺癌")
        );
        assert_eq!(fetch_regulation(&conn, "9.1 Gefitinib", "胃癌").unwrap(), None);
    }

    #[test]
    fn duplicate_pair_first_wins() {
        let conn = memory();
        replace_regulations(&conn, "a.docx", &sample()).unwrap();
        assert_eq!(
            fetch_regulation(&conn, "9.2 Bevacizumab", "General").unwrap().as_deref(),
            Some("first")
        );
    }

    #[test]
    fn search_is_case_insensitive() {
        let conn = memory();
        replace_regulations(&conn, "a.docx", &sample()).unwrap();
        assert_eq!(fetch_drugs(&conn, Some("BEVA")).unwrap(), ["9.2 Bevacizumab"]);
        assert!(fetch_drugs(&conn, Some("nivolumab")).unwrap().is_empty());
    }

    #[test]
    fn replace_drops_previous_rows() {
        let conn = memory();
        replace_regulations(&conn, "a.docx", &sample()).unwrap();
        replace_regulations(&conn, "b.docx", &[entry("9.9 New", "General", "x")]).unwrap();
        assert_eq!(fetch_drugs(&conn, None).unwrap(), ["9.9 New"]);

        let stats = get_stats(&conn).unwrap();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.drugs, 1);
        assert_eq!(stats.cancer_types, 1);
        assert_eq!(stats.last_conversion.unwrap().source, "b.docx");
    }

    #[test]
    fn empty_stats() {
        let conn = memory();
        let stats = get_stats(&conn).unwrap();
        assert_eq!(stats.entries, 0);
        assert!(stats.last_conversion.is_none());
    }
}
