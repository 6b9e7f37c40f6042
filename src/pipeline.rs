//! Team-by-team scraping run
//!
//! Fetches each roster, then each player's page, and appends the normalized
//! split rows to the sink. A failing team or player is logged and skipped.

use crate::data::normalize::normalize_rows;
use crate::data::scrapers::espn::EspnScraper;
use crate::data::scrapers::Fetcher;
use crate::data::StatSink;
use crate::{PlayerRef, Result, Team, TeamName};
use serde::Serialize;

/// The 30 MLB clubs and their ESPN abbreviations
pub const MLB_TEAMS: [(&str, &str); 30] = [
    ("Arizona Diamondbacks", "ari"),
    ("Atlanta Braves", "atl"),
    ("Baltimore Orioles", "bal"),
    ("Boston Red Sox", "bos"),
    ("Chicago White Sox", "chw"),
    ("Chicago Cubs", "chc"),
    ("Cincinnati Reds", "cin"),
    ("Cleveland Guardians", "cle"),
    ("Colorado Rockies", "col"),
    ("Detroit Tigers", "det"),
    ("Houston Astros", "hou"),
    ("Kansas City Royals", "kc"),
    ("Los Angeles Angels", "laa"),
    ("Los Angeles Dodgers", "lad"),
    ("Miami Marlins", "mia"),
    ("Milwaukee Brewers", "mil"),
    ("Minnesota Twins", "min"),
    ("New York Yankees", "nyy"),
    ("New York Mets", "nym"),
    ("Oakland Athletics", "oak"),
    ("Philadelphia Phillies", "phi"),
    ("Pittsburgh Pirates", "pit"),
    ("San Diego Padres", "sd"),
    ("San Francisco Giants", "sf"),
    ("Seattle Mariners", "sea"),
    ("St. Louis Cardinals", "stl"),
    ("Tampa Bay Rays", "tb"),
    ("Texas Rangers", "tex"),
    ("Toronto Blue Jays", "tor"),
    ("Washington Nationals", "wsh"),
];

/// Teams to scrape. An empty selection means every club; otherwise only
/// the given abbreviations (case-insensitive), in league order.
pub fn mlb_teams(scraper: &EspnScraper, selection: &[String]) -> Vec<Team> {
    MLB_TEAMS
        .iter()
        .filter(|(_, abbr)| {
            selection.is_empty() || selection.iter().any(|s| s.eq_ignore_ascii_case(abbr))
        })
        .map(|(name, abbr)| Team::new(*name, scraper.roster_url(abbr)))
        .collect()
}

/// Outcome of scraping one team
#[derive(Debug, Clone, Default, Serialize)]
pub struct TeamReport {
    pub team_name: String,
    pub players_found: usize,
    pub players_stored: usize,
    pub players_without_stats: usize,
    pub players_failed: usize,
    pub rows_persisted: usize,
}

/// Totals for a full run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub teams_scraped: usize,
    pub teams_failed: usize,
    pub players_stored: usize,
    pub players_without_stats: usize,
    pub players_failed: usize,
    pub rows_persisted: usize,
}

impl RunSummary {
    fn add(&mut self, report: &TeamReport) {
        self.teams_scraped += 1;
        self.players_stored += report.players_stored;
        self.players_without_stats += report.players_without_stats;
        self.players_failed += report.players_failed;
        self.rows_persisted += report.rows_persisted;
    }
}

/// Sequential scraper run over a fetcher and a sink
pub struct Pipeline<'a, F: Fetcher, S: StatSink> {
    fetcher: &'a F,
    sink: &'a mut S,
    scraper: EspnScraper,
}

impl<'a, F: Fetcher, S: StatSink> Pipeline<'a, F, S> {
    pub fn new(fetcher: &'a F, sink: &'a mut S, scraper: EspnScraper) -> Self {
        Pipeline {
            fetcher,
            sink,
            scraper,
        }
    }

    /// Scrape every team in order. Team failures are logged and counted.
    pub fn run(&mut self, teams: &[Team]) -> RunSummary {
        let mut summary = RunSummary::default();

        for team in teams {
            log::info!("Scraping data for {}", team.name);
            match self.scrape_team(team) {
                Ok(report) => summary.add(&report),
                Err(e) => {
                    log::warn!("Failed to scrape {}: {}", team.name, e);
                    summary.teams_failed += 1;
                }
            }
        }

        log::info!(
            "Scraping completed: {} teams ({} failed), {} players stored, {} without stats, {} failed, {} rows",
            summary.teams_scraped,
            summary.teams_failed,
            summary.players_stored,
            summary.players_without_stats,
            summary.players_failed,
            summary.rows_persisted
        );
        summary
    }

    /// Scrape one team. Only a roster fetch or roster parse failure is
    /// returned; player failures are absorbed into the report.
    pub fn scrape_team(&mut self, team: &Team) -> Result<TeamReport> {
        log::info!("Fetching team page: {}", team.roster_url);
        let html = self.fetcher.fetch(&team.roster_url)?;
        let roster = self.scraper.parse_roster(&html)?;

        let team_name = match roster.team_name {
            TeamName::Found(name) => name,
            TeamName::NotFound => {
                log::warn!(
                    "No team heading on {}, using {}",
                    team.roster_url,
                    team.name
                );
                team.name.clone()
            }
        };

        let mut report = TeamReport {
            team_name: team_name.clone(),
            players_found: roster.players.len(),
            ..TeamReport::default()
        };

        for player in &roster.players {
            match self.process_player(player, &team_name) {
                Ok(0) => report.players_without_stats += 1,
                Ok(rows) => {
                    report.players_stored += 1;
                    report.rows_persisted += rows;
                }
                Err(e) => {
                    log::warn!("Skipping {} ({}): {}", player.name, player.profile_url, e);
                    report.players_failed += 1;
                }
            }
        }

        log::info!(
            "{}: {} of {} players stored, {} rows",
            report.team_name,
            report.players_stored,
            report.players_found,
            report.rows_persisted
        );
        Ok(report)
    }

    /// Fetch, extract, normalize and store one player's splits.
    /// Returns the number of rows written.
    pub fn process_player(&mut self, player: &PlayerRef, team_name: &str) -> Result<usize> {
        log::info!("Fetching data for {} from {}", player.name, player.profile_url);
        let html = self.fetcher.fetch(&player.profile_url)?;

        let rows = self.scraper.parse_player_stats(&html, player, team_name)?;
        if rows.is_empty() {
            return Ok(0);
        }

        let rows = normalize_rows(rows);
        let count = self.sink.append(&rows)?;
        log::info!("Data for {} inserted into the database ({} rows)", player.name, count);
        Ok(count)
    }
}
