use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use rand::Rng;

use crate::error::{FeedError, FeedResult};
use crate::score_fetch::ScoreBackend;
use crate::state::{Innings, MatchDetail, MatchSummary, NewsArticle, Weather};

/// Offline backend: a few seeded fixtures whose live innings move on every detail fetch.
pub struct FakeBackend {
    summaries: Vec<MatchSummary>,
    details: Mutex<HashMap<String, MatchDetail>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        let seeds = seed_matches();
        let summaries = seeds
            .iter()
            .map(|(id, detail)| MatchSummary {
                id: id.to_string(),
                name: detail.name.clone(),
                status: detail.status.clone(),
            })
            .collect();
        let details = seeds
            .into_iter()
            .map(|(id, detail)| (id.to_string(), detail))
            .collect();
        Self {
            summaries,
            details: Mutex::new(details),
        }
    }
}

impl ScoreBackend for FakeBackend {
    fn list_live_matches(&self) -> FeedResult<Vec<MatchSummary>> {
        Ok(self.summaries.clone())
    }

    fn get_match_detail(&self, match_id: &str) -> FeedResult<MatchDetail> {
        let mut details = self
            .details
            .lock()
            .map_err(|_| FeedError::Server("demo feed state poisoned".to_string()))?;
        let Some(detail) = details.get_mut(match_id) else {
            return Err(FeedError::NotFound(match_id.to_string()));
        };
        if detail.status == "Live" {
            let mut rng = rand::thread_rng();
            if let Some(innings) = detail.innings.last_mut() {
                advance_innings(innings, &mut rng);
            }
            if let Some(temp) = detail.weather.as_mut().and_then(|w| w.temperature_c.as_mut()) {
                let drift: f64 = rng.gen_range(-0.4..=0.4);
                *temp = ((*temp + drift) * 10.0).round() / 10.0;
            }
        }
        Ok(detail.clone())
    }

    fn list_news(&self, topic: &str) -> FeedResult<Vec<NewsArticle>> {
        let now = Utc::now();
        let stamp = |hours: i64| {
            (now - ChronoDuration::hours(hours)).to_rfc3339_opts(SecondsFormat::Secs, true)
        };
        Ok(vec![
            NewsArticle {
                title: format!("Demo {topic} roundup: openers dominate the powerplay"),
                url: "https://example.com/news/powerplay".to_string(),
                published_at: stamp(1),
            },
            NewsArticle {
                title: format!("Demo {topic} preview: spin expected to decide the series"),
                url: "https://example.com/news/spin".to_string(),
                published_at: stamp(5),
            },
        ])
    }
}

/// Adds one ball's worth of play; overs stay in cricket notation (x.0 .. x.5).
fn advance_innings(innings: &mut Innings, rng: &mut impl Rng) {
    if innings.wickets >= 10 {
        return;
    }
    innings.runs += match rng.gen_range(0..10) {
        0..=3 => 0,
        4..=6 => 1,
        7 => 2,
        8 => 4,
        _ => 6,
    };
    if rng.gen_bool(0.04) {
        innings.wickets += 1;
    }
    let balls = overs_to_balls(innings.overs) + 1;
    innings.overs = ((balls / 6) * 10 + balls % 6) as f64 / 10.0;
}

fn overs_to_balls(overs: f64) -> u32 {
    let whole = overs.trunc() as u32;
    let part = ((overs.fract() * 10.0).round() as u32).min(5);
    whole * 6 + part
}

fn seed_matches() -> Vec<(&'static str, MatchDetail)> {
    vec![
        (
            "demo-ind-aus",
            MatchDetail {
                name: "IND vs AUS".to_string(),
                status: "Live".to_string(),
                innings: vec![Innings {
                    label: "India Inning 1".to_string(),
                    runs: 120,
                    wickets: 3,
                    overs: 15.2,
                }],
                weather: Some(Weather {
                    city: "Mumbai".to_string(),
                    temperature_c: Some(31.0),
                    description: "haze".to_string(),
                }),
            },
        ),
        (
            "demo-eng-nz",
            MatchDetail {
                name: "ENG vs NZ".to_string(),
                status: "Live".to_string(),
                innings: vec![
                    Innings {
                        label: "England Inning 1".to_string(),
                        runs: 287,
                        wickets: 8,
                        overs: 50.0,
                    },
                    Innings {
                        label: "New Zealand Inning 1".to_string(),
                        runs: 64,
                        wickets: 1,
                        overs: 11.4,
                    },
                ],
                weather: None,
            },
        ),
        (
            "demo-pak-sa",
            MatchDetail {
                name: "PAK vs SA".to_string(),
                status: "Match starts at 14:00 GMT".to_string(),
                innings: Vec::new(),
                weather: Some(Weather {
                    city: "Lahore".to_string(),
                    temperature_c: Some(27.5),
                    description: "clear sky".to_string(),
                }),
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overs_roll_over_after_six_balls() {
        let mut innings = Innings {
            label: "1st".to_string(),
            runs: 0,
            wickets: 0,
            overs: 3.5,
        };
        let mut rng = rand::thread_rng();
        advance_innings(&mut innings, &mut rng);
        assert_eq!(innings.overs, 4.0);
        advance_innings(&mut innings, &mut rng);
        assert_eq!(innings.overs, 4.1);
    }

    #[test]
    fn unknown_demo_match_is_not_found() {
        let backend = FakeBackend::new();
        let err = backend.get_match_detail("nope").unwrap_err();
        assert_eq!(err, FeedError::NotFound("nope".to_string()));
    }

    #[test]
    fn upcoming_demo_match_does_not_move() {
        let backend = FakeBackend::new();
        let first = backend.get_match_detail("demo-pak-sa").unwrap();
        let second = backend.get_match_detail("demo-pak-sa").unwrap();
        assert_eq!(first, second);
    }
}
