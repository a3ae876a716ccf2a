use std::time::Duration;

use anyhow::Result;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{FeedError, FeedResult};
use crate::graphql::{GraphqlRequest, decode_response};
use crate::http_client::http_client;
use crate::state::{Innings, MatchDetail, MatchSummary, NewsArticle, Weather};

pub const LIVE_MATCHES_QUERY: &str = "query LiveMatches { liveMatches { id name status } }";

pub const MATCH_DETAIL_QUERY: &str = "query MatchDetail($matchId: String!) { \
     match(matchId: $matchId) { \
     name status score { inning r w o } weather { city temperature description } } }";

pub const NEWS_QUERY: &str =
    "query News($query: String!) { news(query: $query) { title url publishedAt } }";

/// The three calls the widget makes. One request each, no retry.
pub trait ScoreBackend: Send + Sync {
    fn list_live_matches(&self) -> FeedResult<Vec<MatchSummary>>;
    fn get_match_detail(&self, match_id: &str) -> FeedResult<MatchDetail>;
    fn list_news(&self, topic: &str) -> FeedResult<Vec<NewsArticle>>;
}

pub struct GraphqlBackend {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl GraphqlBackend {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.endpoint.clone(), config.request_timeout)
    }

    fn post<T: DeserializeOwned>(&self, op: &str, request: &GraphqlRequest<'_>) -> FeedResult<T> {
        debug!(op, endpoint = %self.endpoint, "graphql request");
        let result = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .and_then(|resp| {
                let status = resp.status().as_u16();
                resp.text().map(|body| (status, body))
            });
        let (status, body) = match result {
            Ok(pair) => pair,
            Err(err) => {
                let err = FeedError::from_transport(&err, self.timeout);
                warn!(op, kind = err.kind(), "graphql transport failure: {err}");
                return Err(err);
            }
        };
        decode_response(status, &body).inspect_err(|err| {
            warn!(op, status, kind = err.kind(), "graphql response rejected: {err}");
        })
    }
}

impl ScoreBackend for GraphqlBackend {
    fn list_live_matches(&self) -> FeedResult<Vec<MatchSummary>> {
        let data: LiveMatchesData =
            self.post("liveMatches", &GraphqlRequest::new(LIVE_MATCHES_QUERY))?;
        Ok(live_matches_from_data(data))
    }

    fn get_match_detail(&self, match_id: &str) -> FeedResult<MatchDetail> {
        let request = GraphqlRequest::new(MATCH_DETAIL_QUERY).with_variable("matchId", match_id);
        let data: MatchDetailData = self.post("match", &request)?;
        match_detail_from_data(match_id, data)
    }

    fn list_news(&self, topic: &str) -> FeedResult<Vec<NewsArticle>> {
        let request = GraphqlRequest::new(NEWS_QUERY).with_variable("query", topic);
        let data: NewsData = self.post("news", &request)?;
        Ok(news_from_data(data))
    }
}

pub fn parse_live_matches_json(raw: &str) -> FeedResult<Vec<MatchSummary>> {
    decode_response::<LiveMatchesData>(200, raw).map(live_matches_from_data)
}

pub fn parse_match_detail_json(match_id: &str, raw: &str) -> FeedResult<MatchDetail> {
    decode_response::<MatchDetailData>(200, raw)
        .and_then(|data| match_detail_from_data(match_id, data))
}

pub fn parse_news_json(raw: &str) -> FeedResult<Vec<NewsArticle>> {
    decode_response::<NewsData>(200, raw).map(news_from_data)
}

#[derive(Debug, Deserialize)]
struct LiveMatchesData {
    #[serde(rename = "liveMatches", default)]
    live_matches: Option<Vec<MatchSummary>>,
}

#[derive(Debug, Deserialize)]
struct MatchDetailData {
    #[serde(rename = "match", default)]
    detail: Option<WireMatch>,
}

#[derive(Debug, Deserialize)]
struct WireMatch {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    score: Option<Vec<WireInning>>,
    #[serde(default)]
    weather: Option<WireWeather>,
}

#[derive(Debug, Deserialize)]
struct WireInning {
    #[serde(default)]
    inning: Option<String>,
    #[serde(default)]
    r: Option<u32>,
    #[serde(default)]
    w: Option<u32>,
    #[serde(default)]
    o: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WireWeather {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsData {
    #[serde(default)]
    news: Option<Vec<WireArticle>>,
}

#[derive(Debug, Deserialize)]
struct WireArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(rename = "publishedAt", default)]
    published_at: Option<String>,
}

fn live_matches_from_data(data: LiveMatchesData) -> Vec<MatchSummary> {
    data.live_matches.unwrap_or_default()
}

fn match_detail_from_data(match_id: &str, data: MatchDetailData) -> FeedResult<MatchDetail> {
    let Some(wire) = data.detail else {
        return Err(FeedError::NotFound(match_id.to_string()));
    };

    let innings = wire
        .score
        .unwrap_or_default()
        .into_iter()
        .map(|row| Innings {
            label: row.inning.unwrap_or_default(),
            runs: row.r.unwrap_or(0),
            wickets: row.w.unwrap_or(0),
            overs: row.o.unwrap_or(0.0),
        })
        .collect();

    let weather = wire.weather.map(|w| Weather {
        city: w.city.unwrap_or_default(),
        temperature_c: w.temperature,
        description: w.description.unwrap_or_default(),
    });

    Ok(MatchDetail {
        name: wire.name.unwrap_or_default(),
        status: wire.status.unwrap_or_default(),
        innings,
        weather,
    })
}

fn news_from_data(data: NewsData) -> Vec<NewsArticle> {
    data.news
        .unwrap_or_default()
        .into_iter()
        .map(|article| NewsArticle {
            title: article.title.unwrap_or_default(),
            url: article.url.unwrap_or_default(),
            published_at: article.published_at.unwrap_or_default(),
        })
        .collect()
}
