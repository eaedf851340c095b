mod config;
mod convert;
mod db;
mod output;
mod parser;
mod source;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use config::Settings;
use parser::emit::RenderStyle;
use parser::synonyms::SynonymTable;

#[derive(Parser)]
#[command(name = "nhi_regs", about = "NHI anticancer drug payment regulations, split per drug and cancer type")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a regulations document (.docx path, text file or URL) into per-cancer entries
    Convert {
        /// Source document
        input: String,
        /// JSON output path (default: $NHI_OUTPUT or nhi_data.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Synonym table override (JSON)
        #[arg(long)]
        synonyms: Option<PathBuf>,
        /// How regulation text is rendered
        #[arg(long, value_enum, default_value = "markdown")]
        style: RenderStyle,
        /// Only write JSON, leave the lookup database alone
        #[arg(long)]
        no_db: bool,
    },
    /// Load an existing JSON entry list into the lookup database
    Import {
        /// JSON file (default: $NHI_OUTPUT or nhi_data.json)
        path: Option<PathBuf>,
    },
    /// List drug names
    Drugs {
        /// Case-insensitive substring filter
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show cancer types for a drug, or the regulation for one cancer type
    Show {
        drug: String,
        cancer: Option<String>,
    },
    /// Show database statistics
    Stats,
    /// Print the active synonym table
    Synonyms {
        /// Synonym table override (JSON)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::from_env();

    let result = match cli.command {
        Commands::Convert {
            input,
            output: out_path,
            synonyms,
            style,
            no_db,
        } => {
            let table = load_table(synonyms.as_deref())?;
            let out_path = out_path.unwrap_or_else(|| settings.output_path.clone());
            let conn = if no_db {
                None
            } else {
                let conn = db::connect(&settings.db_path)?;
                db::init_schema(&conn)?;
                Some(conn)
            };

            let converted =
                convert::convert(&input, &out_path, conn.as_ref(), &table, style).await?;
            if converted.entries == 0 {
                println!("No entries extracted from {}.", input);
            } else {
                println!(
                    "Extracted {} entries for {} drugs → {}",
                    converted.entries,
                    converted.drugs,
                    out_path.display()
                );
            }
            Ok(())
        }
        Commands::Import { path } => {
            let path = path.unwrap_or_else(|| settings.output_path.clone());
            let entries = output::read_json(&path)?;
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let count = db::replace_regulations(&conn, &path.display().to_string(), &entries)?;
            println!("Imported {} entries from {}", count, path.display());
            Ok(())
        }
        Commands::Drugs { search } => {
            let conn = open_db(&settings.db_path)?;
            let drugs = db::fetch_drugs(&conn, search.as_deref())?;
            if drugs.is_empty() {
                println!("No matching drugs found.");
                return Ok(());
            }
            for d in &drugs {
                println!("{}", d);
            }
            println!("\n{} drugs", drugs.len());
            Ok(())
        }
        Commands::Show { drug, cancer } => {
            let conn = open_db(&settings.db_path)?;
            match cancer {
                None => {
                    let types = db::fetch_cancer_types(&conn, &drug)?;
                    if types.is_empty() {
                        println!("No regulations for {}.", drug);
                    } else {
                        println!("{}:", drug);
                        for t in &types {
                            println!("  {}", t);
                        }
                    }
                }
                Some(cancer) => match db::fetch_regulation(&conn, &drug, &cancer)? {
                    Some(regulation) => {
                        println!("Regulation for {} - {}\n", drug, cancer);
                        println!("{}", regulation);
                    }
                    None => println!("No regulation found for this combination."),
                },
            }
            Ok(())
        }
        Commands::Stats => {
            let conn = open_db(&settings.db_path)?;
            let s = db::get_stats(&conn)?;
            println!("Entries:      {}", s.entries);
            println!("Drugs:        {}", s.drugs);
            println!("Cancer types: {}", s.cancer_types);
            match s.last_conversion {
                Some(c) => println!("Last source:  {} ({})", c.source, c.converted_at),
                None => println!("Last source:  -"),
            }
            Ok(())
        }
        Commands::Synonyms { file } => {
            let table = load_table(file.as_deref())?;
            for category in table.categories() {
                println!("{}: {}", category, table.keywords_for(category).join(", "));
            }
            println!("\nReset phrases: {}", table.reset_phrases().join(", "));
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

fn load_table(path: Option<&Path>) -> anyhow::Result<SynonymTable> {
    let table = match path {
        Some(p) => SynonymTable::load(p)?,
        None => SynonymTable::builtin(),
    };
    if table.is_empty() {
        warn!("Synonym table is empty; every paragraph will be filed under General");
    }
    info!(
        "Synonym table: {} keywords, {} categories",
        table.len(),
        table.categories().len()
    );
    Ok(table)
}

fn open_db(path: &Path) -> anyhow::Result<rusqlite::Connection> {
    let conn = db::connect(path).context("Run 'convert' first to build the database")?;
    db::init_schema(&conn)?;
    Ok(conn)
}
