//! Index page rendering.
//!
//! Builds `index.html` from the assembled [`SiteStructure`]: a search box, a
//! "Recently updated" section of the newest documents across all groups, and
//! one section per source group. All markup is produced with maud; the
//! client-side search script is embedded from `static/search.js` while
//! `styles.css` and `favicon.svg` are linked (they are copied into the
//! output directory as site assets).
//!
//! The renderer is pure. The caller supplies the current time so badge
//! windows are deterministic under test.

use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::types::{SitePage, SiteStructure, cutoff_millis};

const SEARCH_JS: &str = include_str!("../static/search.js");

const DAY_MS: u64 = 24 * 60 * 60 * 1000;
/// Documents updated within this window get a NEW badge in their group.
pub const RECENT_WINDOW_MS: u64 = 90 * DAY_MS;
/// Documents updated within this window appear in "Recently updated".
pub const ACTIVE_WINDOW_MS: u64 = 210 * DAY_MS;

/// A document's update only counts as "recent" once it is newer than the
/// group's optional cutoff date; bulk re-uploads of old material would
/// otherwise flood the recently-updated section.
fn after_cutoff(page: &SitePage) -> bool {
    match page
        .entry
        .show_updates_after
        .as_deref()
        .and_then(cutoff_millis)
    {
        Some(cutoff) => page.modified_time > cutoff,
        None => true,
    }
}

/// Link to a page's primary artifact. Plain PDFs open in a new tab and are
/// badged so readers know they are leaving the HTML site.
fn page_link(page: &SitePage) -> Markup {
    let entry = &page.entry;
    match entry.html_name() {
        Some(html_name) => html! {
            a href={ "./" (html_name) } { (entry.original_name) }
        },
        None => html! {
            a href={ "./" (entry.primary_artifact()) } target="_blank" rel="noopener noreferrer" {
                (entry.original_name) " " span.badge.pdf-badge { "PDF" }
            }
        },
    }
}

fn recently_updated_section(structure: &SiteStructure, now_millis: u64) -> Markup {
    let mut active: Vec<(&str, &SitePage)> = structure
        .groups
        .iter()
        .flat_map(|g| g.pages.iter().map(move |p| (g.name.as_str(), p)))
        .filter(|(_, p)| now_millis.saturating_sub(p.modified_time) < ACTIVE_WINDOW_MS)
        .filter(|(_, p)| after_cutoff(p))
        .collect();
    active.sort_by(|a, b| b.1.modified_time.cmp(&a.1.modified_time));

    if active.is_empty() {
        return html! {};
    }
    html! {
        div.active-files-group data-directory-name="recently updated" {
            h2 { "Recently updated" }
            ul {
                @for (group_name, page) in &active {
                    li data-file-name=(page.entry.original_name.to_lowercase())
                       data-directory-name=(group_name.to_lowercase()) {
                        (page_link(page))
                        " "
                        span.file-group-name { "(" (group_name) ")" }
                    }
                }
            }
        }
    }
}

fn group_section(name: &str, pages: &[&SitePage], now_millis: u64) -> Markup {
    html! {
        div.directory-group data-directory-name=(name.to_lowercase()) {
            h2 { (name) }
            ul {
                @for page in pages {
                    @let is_recent =
                        now_millis.saturating_sub(page.modified_time) < RECENT_WINDOW_MS;
                    li data-file-name=(page.entry.original_name.to_lowercase()) {
                        (page_link(page))
                        @if is_recent { " " span.badge { "NEW" } }
                    }
                }
            }
        }
    }
}

/// Render the complete index page. Groups are listed alphabetically and each
/// group's documents alphabetically by title; `now_millis` anchors the NEW
/// and recently-updated windows.
pub fn render_index(
    title: &str,
    structure: &SiteStructure,
    generation_date: &str,
    latest_update_date: &str,
    now_millis: u64,
) -> String {
    let mut groups: Vec<(&str, Vec<&SitePage>)> = structure
        .groups
        .iter()
        .map(|g| {
            let mut pages: Vec<&SitePage> = g.pages.iter().collect();
            pages.sort_by(|a, b| a.entry.original_name.cmp(&b.entry.original_name));
            (g.name.as_str(), pages)
        })
        .collect();
    groups.sort_by(|a, b| a.0.cmp(b.0));

    let markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                link rel="stylesheet" href="styles.css";
                link rel="icon" href="favicon.svg" type="image/svg+xml";
            }
            body {
                div.container {
                    h1 { (title) }
                    div.page-info {
                        span { "Site built: " strong { (generation_date) } }
                        span { "Notes last updated: " strong { (latest_update_date) } }
                    }
                    input type="text" id="searchInput" placeholder="Search the notes...";
                    (recently_updated_section(structure, now_millis))
                    div id="file-list" {
                        @for (name, pages) in &groups {
                            (group_section(name, pages, now_millis))
                        }
                    }
                }
                footer.main-footer-license {
                    p {
                        "All materials on this site are the author's personal lecture notes. \
                         They come with no warranty and are intended for study purposes only."
                    }
                    p {
                        "The content is licensed under "
                        a href="http://creativecommons.org/licenses/by-nc-sa/4.0/"
                          target="_blank" rel="noopener noreferrer" {
                            "Creative Commons BY-NC-SA 4.0"
                        }
                        ". You may share and adapt it for non-commercial purposes with \
                         attribution, under the same license."
                    }
                }
                script { (PreEscaped(SEARCH_JS)) }
            }
        }
    };
    markup.into_string()
}
