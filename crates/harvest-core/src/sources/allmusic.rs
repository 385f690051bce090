//! Weekly new-release listings: the upstream stage that fills the artist store.

use anyhow::Result;
use chrono::{Datelike, Days, NaiveDate};
use scraper::{Html, Selector};

const LISTING_ENDPOINT: &str = "https://www.allmusic.com/newreleases/all";

/// Listing dates (`YYYYMMDD`) every `step_days` from Jan 1 of `start_year`, strictly before `today`.
pub fn release_dates(start_year: i32, step_days: u32, today: NaiveDate) -> Vec<String> {
    let step = Days::new(u64::from(step_days.max(1)));
    let mut out = Vec::new();
    let Some(mut date) = NaiveDate::from_ymd_opt(start_year, 1, 1) else {
        return out;
    };
    while date < today {
        out.push(format!("{:04}{:02}{:02}", date.year(), date.month(), date.day()));
        match date.checked_add_days(step) {
            Some(next) => date = next,
            None => break,
        }
    }
    out
}

pub fn listing_url(date: &str) -> String {
    format!("{}/{}", LISTING_ENDPOINT, date)
}

/// Artist names linked from the listing table (`td.artist a`), trimmed, empties dropped.
pub fn extract_artist_names(html: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("td.artist a")
        .map_err(|e| anyhow::anyhow!("invalid selector: {}", e))?;
    Ok(document
        .select(&selector)
        .map(|a| a.text().collect::<String>().trim().to_string())
        .filter(|name| !name.is_empty())
        .collect())
}
