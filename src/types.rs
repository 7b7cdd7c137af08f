//! Shared site-level types and date formatting.

use chrono::{Local, TimeZone};

use crate::manifest::DocumentEntry;

/// One document as it appears on the index page. Carries the manifest record
/// plus the timestamp the index actually displays, which for frozen groups is
/// the live mtime of the primary artifact rather than the recorded one.
#[derive(Debug, Clone, PartialEq)]
pub struct SitePage {
    pub entry: DocumentEntry,
    /// Display/sort timestamp, milliseconds since the Unix epoch.
    pub modified_time: u64,
}

/// One source group's section of the index page.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteGroup {
    pub name: String,
    pub pages: Vec<SitePage>,
}

/// Everything the index renderer needs, in config order. Assembled fresh on
/// every run from live results and manifest reconstruction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteStructure {
    pub groups: Vec<SiteGroup>,
}

impl SiteStructure {
    /// Newest display timestamp across the whole site, 0 when empty.
    pub fn latest_update_millis(&self) -> u64 {
        self.groups
            .iter()
            .flat_map(|g| &g.pages)
            .map(|p| p.modified_time)
            .max()
            .unwrap_or(0)
    }
}

/// Format a millisecond timestamp as a human date in local time, in the
/// `d. m. yyyy v H:MM:SS` style the site has always used. Zero means "never"
/// and renders as `N/A`.
pub fn format_date_millis(millis: u64) -> String {
    if millis == 0 {
        return "N/A".to_string();
    }
    match Local.timestamp_millis_opt(millis as i64) {
        chrono::LocalResult::Single(dt) | chrono::LocalResult::Ambiguous(dt, _) => {
            dt.format("%-d. %-m. %Y v %-H:%M:%S").to_string()
        }
        chrono::LocalResult::None => "N/A".to_string(),
    }
}

/// Parse a `YYYY-MM-DD` cutoff into milliseconds at local midnight. Returns
/// `None` for unparseable input; config validation rejects those up front.
pub fn cutoff_millis(date: &str) -> Option<u64> {
    let date = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    match Local.from_local_datetime(&midnight) {
        chrono::LocalResult::Single(dt) | chrono::LocalResult::Ambiguous(dt, _) => {
            u64::try_from(dt.timestamp_millis()).ok()
        }
        chrono::LocalResult::None => None,
    }
}
