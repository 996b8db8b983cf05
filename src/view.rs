//! Terminal rendering of a gist session.
//!
//! Rendering is stateless: everything comes from a borrowed `GistSession`.

use chrono::{DateTime, Local, Utc};
use console::style;

use crate::api::{Gist, Visibility};
use crate::session::GistSession;

const EMPTY_MESSAGE: &str = "No gists loaded. Run \"gist-sweep list\" with a saved token.";
const MAX_SUMMARY_LEN: usize = 60;

#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub use_color: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig { use_color: true }
    }
}

fn badge(visibility: Visibility, config: &ViewConfig) -> String {
    let label = match visibility {
        Visibility::Public => "Public ",
        Visibility::Private => "Private",
    };
    if !config.use_color {
        return label.to_string();
    }
    match visibility {
        Visibility::Public => style(label).green().to_string(),
        Visibility::Private => style(label).dim().to_string(),
    }
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Human readable "time ago" relative to `now`
pub fn format_relative_time(timestamp: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(*timestamp);
    if duration.num_seconds() < 60 {
        return "just now".to_string();
    }

    let minutes = duration.num_minutes();
    let hours = duration.num_hours();
    let days = duration.num_days();

    let (n, unit) = if minutes < 60 {
        (minutes, "minute")
    } else if hours < 24 {
        (hours, "hour")
    } else if days < 30 {
        (days, "day")
    } else if days < 365 {
        (days / 30, "month")
    } else {
        (days / 365, "year")
    };

    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn file_list(gist: &Gist) -> String {
    gist.files()
        .map(|file| match file.language() {
            Some(lang) => format!("{} ({})", file.filename(), lang),
            None => file.filename().to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// One line per gist, used as the label in interactive selection
pub fn summary_line(gist: &Gist) -> String {
    let visibility = match gist.visibility() {
        Visibility::Public => "public",
        Visibility::Private => "private",
    };
    format!(
        "{} [{}] {}",
        truncate(gist.title(), MAX_SUMMARY_LEN),
        visibility,
        gist.id()
    )
}

pub fn render_gist(gist: &Gist, selected: bool, config: &ViewConfig) -> String {
    let marker = if selected { "[x]" } else { "[ ]" };
    let title = if config.use_color {
        style(gist.title()).bold().to_string()
    } else {
        gist.title().to_string()
    };
    let link = if config.use_color {
        style(gist.html_url()).blue().underlined().to_string()
    } else {
        gist.html_url().to_string()
    };

    let mut out = format!(
        "{} {} {}  ({})\n",
        marker,
        badge(gist.visibility(), config),
        title,
        gist.id()
    );
    let files = file_list(gist);
    if !files.is_empty() {
        out.push_str(&format!("    {}\n", files));
    }
    out.push_str(&format!(
        "    Created: {}  Updated: {} ({})\n",
        format_timestamp(gist.created_at()),
        format_timestamp(gist.updated_at()),
        format_relative_time(gist.updated_at(), &Utc::now())
    ));
    out.push_str(&format!("    {}\n", link));
    out
}

pub fn render_list(session: &GistSession, config: &ViewConfig) -> String {
    if session.gists().is_empty() {
        return format!("{}\n", EMPTY_MESSAGE);
    }

    let mut out = String::new();
    for gist in session.gists() {
        out.push_str(&render_gist(gist, session.is_selected(gist.id()), config));
        out.push('\n');
    }
    out.push_str(&format!(
        "{} gists, {} selected\n",
        session.gists().len(),
        session.selected_count()
    ));
    out
}
