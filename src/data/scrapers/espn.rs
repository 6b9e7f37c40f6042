//! ESPN roster and player page extraction
//!
//! Roster pages list players in one or more `table.Table` elements; player
//! pages carry their split statistics in a right-aligned `Table`.

use super::resolve_url;
use crate::{PlayerRef, Result, ScrapeError, StatRow, StatValue, TeamName};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

// Exact class attributes; ESPN's fixed-left label table also carries
// `Table--align-right` among extra classes.
const TEAM_HEADING: &str = r#"span[class="db fw-bold"]"#;
const ROSTER_TABLE: &str = "table.Table";
const PLAYER_LINK: &str = "a.AnchorLink";
const STATS_TABLE: &str = r#"table[class="Table Table--align-right"]"#;

/// Team name and players extracted from a roster page
#[derive(Debug, Clone)]
pub struct Roster {
    pub team_name: TeamName,
    pub players: Vec<PlayerRef>,
}

/// Extractor for ESPN MLB pages
pub struct EspnScraper {
    base_url: String,
}

impl EspnScraper {
    pub fn new(base_url: impl Into<String>) -> Self {
        EspnScraper {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Roster page URL for a team abbreviation (e.g. `ari`)
    pub fn roster_url(&self, abbr: &str) -> String {
        format!(
            "{}/mlb/team/roster/_/name/{}",
            self.base_url.trim_end_matches('/'),
            abbr
        )
    }

    /// Parse a team roster page into its team name and player list
    pub fn parse_roster(&self, html: &str) -> Result<Roster> {
        let document = Html::parse_document(html);

        let team_name = self.extract_team_name(&document)?;
        log::info!("Scraped team name: {}", team_name);

        let table_selector = selector(ROSTER_TABLE)?;
        let tr_selector = selector("tr")?;
        let td_selector = selector("td")?;
        let link_selector = selector(PLAYER_LINK)?;

        let mut players = Vec::new();

        for table in document.select(&table_selector) {
            // First row is the header
            for row in table.select(&tr_selector).skip(1) {
                let cells: Vec<_> = row.select(&td_selector).collect();
                if cells.is_empty() {
                    continue;
                }

                let position = element_text(&cells[0]);

                let Some(link) = cells
                    .get(1)
                    .and_then(|cell| cell.select(&link_selector).next())
                else {
                    continue;
                };

                let Some(href) = link.value().attr("href") else {
                    log::debug!("Player link without href in row: {}", element_text(&row));
                    continue;
                };

                let profile_url = match resolve_url(&self.base_url, href) {
                    Ok(url) => url,
                    Err(e) => {
                        log::warn!("Skipping roster row {}: {}", element_text(&row), e);
                        continue;
                    }
                };

                let player = PlayerRef {
                    name: element_text(&link),
                    profile_url,
                    position,
                };

                log::debug!(
                    "Found player: {}, URL: {}, Position: {}",
                    player.name,
                    player.profile_url,
                    player.position
                );
                players.push(player);
            }
        }

        log::info!("Found {} players for {}", players.len(), team_name);
        Ok(Roster { team_name, players })
    }

    fn extract_team_name(&self, document: &Html) -> Result<TeamName> {
        let heading_selector = selector(TEAM_HEADING)?;

        Ok(document
            .select(&heading_selector)
            .next()
            .map(|heading| TeamName::Found(element_text(&heading)))
            .unwrap_or(TeamName::NotFound))
    }

    /// Parse a player page's stats table and tag each row with the player's
    /// context. A page without a stats table yields no rows.
    pub fn parse_player_stats(
        &self,
        html: &str,
        player: &PlayerRef,
        team_name: &str,
    ) -> Result<Vec<StatRow>> {
        let Some(mut rows) = self.parse_stats_table(html)? else {
            log::info!("No stats found for {}", player.name);
            return Ok(vec![]);
        };

        for row in &mut rows {
            row.insert("PlayerName", StatValue::from(player.name.as_str()));
            row.insert("TeamName", StatValue::from(team_name));
            row.insert("Position", StatValue::from(player.position.as_str()));
        }

        log::debug!("Extracted {} stat rows for {}", rows.len(), player.name);
        Ok(rows)
    }

    /// Read the stats table into rows keyed by its header row.
    /// Returns `None` when the page has no stats table.
    pub fn parse_stats_table(&self, html: &str) -> Result<Option<Vec<StatRow>>> {
        let document = Html::parse_document(html);

        let table_selector = selector(STATS_TABLE)?;
        let tr_selector = selector("tr")?;
        let cell_selector = selector("th, td")?;

        let Some(table) = document.select(&table_selector).next() else {
            return Ok(None);
        };

        let mut table_rows = table.select(&tr_selector);

        let headers = match table_rows.next() {
            Some(header_row) => column_names(
                header_row
                    .select(&cell_selector)
                    .map(|cell| element_text(&cell)),
            ),
            None => return Ok(Some(vec![])),
        };

        let mut rows = Vec::new();
        for tr in table_rows {
            let cells: Vec<String> = tr
                .select(&cell_selector)
                .map(|cell| element_text(&cell))
                .collect();
            if cells.is_empty() {
                continue;
            }

            let mut row = StatRow::new();
            for (idx, header) in headers.iter().enumerate() {
                let value = cells
                    .get(idx)
                    .map(|cell| StatValue::from_cell(cell))
                    .unwrap_or(StatValue::Null);
                row.insert(header.clone(), value);
            }
            for (idx, cell) in cells.iter().enumerate().skip(headers.len()) {
                row.insert(unnamed(idx), StatValue::from_cell(cell));
            }
            rows.push(row);
        }

        Ok(Some(rows))
    }
}

/// Header texts to unique column names: blanks become `Unnamed: {i}`,
/// repeats get a `.1`, `.2`, ... suffix.
fn column_names<I: IntoIterator<Item = String>>(headers: I) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::new();

    for (idx, header) in headers.into_iter().enumerate() {
        let base = if header.is_empty() { unnamed(idx) } else { header };
        let count = seen.entry(base.clone()).or_insert(0);
        let name = if *count == 0 {
            base
        } else {
            format!("{}.{}", base, count)
        };
        *count += 1;
        names.push(name);
    }

    names
}

fn unnamed(idx: usize) -> String {
    format!("Unnamed: {}", idx)
}

/// Whitespace-collapsed text content of an element
fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::Parse(format!("Bad selector {}: {}", css, e)))
}
