use std::collections::VecDeque;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::FeedError;

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub id: String,
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Innings {
    pub label: String,
    pub runs: u32,
    pub wickets: u32,
    pub overs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub city: String,
    pub temperature_c: Option<f64>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDetail {
    pub name: String,
    pub status: String,
    pub innings: Vec<Innings>,
    pub weather: Option<Weather>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
}

/// Display-side records. Written only by [`crate::workflow::Workflow`].
#[derive(Debug, Clone)]
pub struct AppState {
    pub summaries: Option<Vec<MatchSummary>>,
    pub cursor: usize,
    pub list_loading: bool,
    pub list_error: Option<FeedError>,
    pub last_detail: Option<MatchDetail>,
    pub detail_error: Option<FeedError>,
    pub detail_updated_at: Option<DateTime<Local>>,
    pub news: Option<Vec<NewsArticle>>,
    pub news_topic: Option<String>,
    pub news_loading: bool,
    pub news_error: Option<FeedError>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            summaries: None,
            cursor: 0,
            list_loading: false,
            list_error: None,
            last_detail: None,
            detail_error: None,
            detail_updated_at: None,
            news: None,
            news_topic: None,
            news_loading: false,
            news_error: None,
            logs: VecDeque::with_capacity(MAX_LOGS),
            help_overlay: false,
        }
    }

    pub fn matches(&self) -> &[MatchSummary] {
        self.summaries.as_deref().unwrap_or(&[])
    }

    pub fn find_match(&self, id: &str) -> Option<&MatchSummary> {
        self.matches().iter().find(|m| m.id == id)
    }

    pub fn match_under_cursor(&self) -> Option<&MatchSummary> {
        self.matches().get(self.cursor)
    }

    pub fn select_next(&mut self) {
        let total = self.matches().len();
        if total == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = (self.cursor + 1) % total;
    }

    pub fn select_prev(&mut self) {
        let total = self.matches().len();
        if total == 0 {
            self.cursor = 0;
            return;
        }
        if self.cursor == 0 {
            self.cursor = total - 1;
        } else {
            self.cursor -= 1;
        }
    }

    pub fn clamp_cursor(&mut self) {
        let total = self.matches().len();
        if total == 0 {
            self.cursor = 0;
        } else if self.cursor >= total {
            self.cursor = total - 1;
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

/// Work for the feed provider. Generations tag requests so late answers can be dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedCommand {
    FetchLiveMatches { generation: u64 },
    FetchMatchDetail { match_id: String, generation: u64 },
    FetchNews { topic: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    SetMatches {
        generation: u64,
        matches: Vec<MatchSummary>,
    },
    MatchesFailed {
        generation: u64,
        error: FeedError,
    },
    SetMatchDetail {
        match_id: String,
        generation: u64,
        detail: MatchDetail,
    },
    MatchDetailFailed {
        match_id: String,
        generation: u64,
        error: FeedError,
    },
    SetNews {
        topic: String,
        articles: Vec<NewsArticle>,
    },
    NewsFailed {
        topic: String,
        error: FeedError,
    },
}

pub fn match_heading(name: &str, status: &str) -> String {
    format!("{name} — {status}")
}

pub fn innings_line(innings: &Innings) -> String {
    format!(
        "{}: {}/{} in {} overs",
        innings.label, innings.runs, innings.wickets, innings.overs
    )
}

pub fn weather_line(weather: &Weather) -> String {
    match weather.temperature_c {
        Some(temp) => format!(
            "Weather in {}: {}, {temp}°C",
            weather.city, weather.description
        ),
        None => format!("Weather in {}: {}", weather.city, weather.description),
    }
}

/// Heading, one line per innings, then weather only when the backend sent it.
pub fn detail_lines(detail: &MatchDetail) -> Vec<String> {
    let mut lines = Vec::with_capacity(detail.innings.len() + 2);
    lines.push(match_heading(&detail.name, &detail.status));
    lines.extend(detail.innings.iter().map(innings_line));
    if let Some(weather) = detail.weather.as_ref() {
        lines.push(weather_line(weather));
    }
    lines
}

pub const NO_NEWS: &str = "No news found.";

pub fn news_lines(articles: &[NewsArticle]) -> Vec<String> {
    if articles.is_empty() {
        return vec![NO_NEWS.to_string()];
    }
    let mut lines = Vec::with_capacity(articles.len() * 2);
    for article in articles {
        lines.push(format!(
            "- {} ({})",
            article.title,
            format_published(&article.published_at)
        ));
        lines.push(format!("  {}", article.url));
    }
    lines
}

pub fn format_published(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

pub fn summary_row(summary: &MatchSummary) -> String {
    match_heading(&summary.name, &summary.status)
}
