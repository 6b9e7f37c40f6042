//! MLB player statistics scraper CLI
//!
//! Scrapes ESPN rosters and player split tables into a SQLite database.

use clap::{Parser, Subcommand};
use mlb_stats::{Config, Result};

#[derive(Parser)]
#[command(name = "mlb-stats")]
#[command(about = "Scrape MLB player split statistics from ESPN into SQLite", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Defaults to `sync` over every team
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape rosters and player stats into the database
    Sync {
        /// Only scrape these team abbreviations (e.g. --team nyy --team bos)
        #[arg(long = "team")]
        teams: Vec<String>,
    },
    /// Show database status
    Status {
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Write a default config file
    Init,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    // Run command
    let result = match cli.command {
        None => commands::sync(&config, &[]),
        Some(Commands::Sync { teams }) => commands::sync(&config, &teams),
        Some(Commands::Status { format }) => commands::status(&config, format),
        Some(Commands::Init) => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use mlb_stats::data::scrapers::espn::EspnScraper;
    use mlb_stats::data::scrapers::HttpFetcher;
    use mlb_stats::data::Database;
    use mlb_stats::pipeline::{mlb_teams, Pipeline};
    use mlb_stats::ScrapeError;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'mlb-stats' to scrape every team");
        println!("  3. Run 'mlb-stats status' to check the database");

        Ok(())
    }

    pub fn sync(config: &Config, selection: &[String]) -> Result<()> {
        // Nothing can be recorded without storage, so this is fatal
        let mut db = Database::open(&config.data.database_path)?;
        let fetcher = HttpFetcher::new(&config.scraper)?;
        let scraper = EspnScraper::new(config.scraper.base_url.as_str());

        let teams = mlb_teams(&scraper, selection);
        if teams.is_empty() {
            return Err(ScrapeError::Config(format!(
                "No teams match {}",
                selection.join(", ")
            )));
        }

        println!(
            "Scraping {} teams into {}",
            teams.len(),
            config.data.database_path
        );

        let summary = Pipeline::new(&fetcher, &mut db, scraper).run(&teams);

        println!(
            "Scraping completed: {} rows from {} players across {} teams",
            summary.rows_persisted, summary.players_stored, summary.teams_scraped
        );
        if summary.teams_failed > 0 || summary.players_failed > 0 {
            println!(
                "Skipped {} teams and {} players (see log)",
                summary.teams_failed, summary.players_failed
            );
        }

        Ok(())
    }

    pub fn status(config: &Config, format: OutputFormat) -> Result<()> {
        let db = Database::open_existing(&config.data.database_path)?;
        let stats = db.get_stats()?;

        match format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&stats)
                    .map_err(|e| ScrapeError::Parse(e.to_string()))?;
                println!("{}", json);
            }
            OutputFormat::Table => {
                println!("Database: {}", config.data.database_path);
                println!("  Rows:    {}", stats.row_count);
                println!("  Players: {}", stats.player_count);
                println!("  Teams:   {}", stats.team_count);
                if !stats.missing_columns.is_empty() {
                    println!(
                        "  Table lacks columns (not stored): {}",
                        stats.missing_columns.join(", ")
                    );
                }
            }
        }

        Ok(())
    }
}
