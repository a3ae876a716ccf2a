//! Match-refresh and selection workflow.
//!
//! The workflow is the single writer of widget state. User actions and timer ticks call
//! into it on the UI loop; it turns them into [`FeedCommand`]s for the feed provider and
//! folds the resulting [`Delta`]s back in. The detail poll timer lives inside the active
//! selection, so dropping the selection is what cancels the poll.

use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::state::{AppState, Delta, FeedCommand};

pub trait CommandSink {
    /// Returns false when nothing is listening any more.
    fn dispatch(&mut self, cmd: FeedCommand) -> bool;
}

impl CommandSink for Vec<FeedCommand> {
    fn dispatch(&mut self, cmd: FeedCommand) -> bool {
        self.push(cmd);
        true
    }
}

impl CommandSink for Sender<FeedCommand> {
    fn dispatch(&mut self, cmd: FeedCommand) -> bool {
        self.send(cmd).is_ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ListLoaded,
    DetailActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTimer {
    due: Instant,
    interval: Duration,
}

impl PollTimer {
    pub fn arm(now: Instant, interval: Duration) -> Self {
        Self {
            due: now + interval,
            interval,
        }
    }

    pub fn due(&self) -> Instant {
        self.due
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.due
    }

    fn rearm(&mut self, now: Instant) {
        self.due = now + self.interval;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSelection {
    match_id: String,
    generation: u64,
    timer: PollTimer,
    in_flight: bool,
}

impl ActiveSelection {
    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }
}

pub struct Workflow<S> {
    state: AppState,
    selection: Option<ActiveSelection>,
    poll_interval: Duration,
    list_generation: u64,
    detail_generation: u64,
    sink: S,
    shut_down: bool,
}

impl<S: CommandSink> Workflow<S> {
    pub fn new(sink: S, poll_interval: Duration) -> Self {
        Self {
            state: AppState::new(),
            selection: None,
            poll_interval,
            list_generation: 0,
            detail_generation: 0,
            sink,
            shut_down: false,
        }
    }

    pub fn from_config(sink: S, config: &Config) -> Self {
        Self::new(sink, config.poll_interval)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// For view-only fields such as the cursor and the help overlay.
    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn selection(&self) -> Option<&ActiveSelection> {
        self.selection.as_ref()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selection.as_ref().map(|s| s.match_id.as_str())
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn phase(&self) -> Phase {
        if self.selection.is_some() {
            Phase::DetailActive
        } else if self.state.summaries.is_some() {
            Phase::ListLoaded
        } else {
            Phase::Idle
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.selection.as_ref().map(|s| s.timer.due())
    }

    /// Drops any selection (and its pending tick), then asks for a fresh list.
    pub fn refresh(&mut self) -> bool {
        if self.shut_down {
            return false;
        }
        self.cancel_selection("list refresh");
        self.list_generation += 1;
        let sent = self.sink.dispatch(FeedCommand::FetchLiveMatches {
            generation: self.list_generation,
        });
        self.state.list_loading = sent;
        if sent {
            info!(generation = self.list_generation, "refreshing live matches");
            self.state.push_log("[INFO] Loading live matches...");
        } else {
            warn!("live matches request dropped: feed unavailable");
            self.state
                .push_log("[WARN] Live matches request failed: feed unavailable");
        }
        sent
    }

    /// Returns false, without issuing a request, when `match_id` is not in the last list.
    pub fn select(&mut self, match_id: &str, now: Instant) -> bool {
        if self.shut_down {
            return false;
        }
        let Some(pos) = self.state.matches().iter().position(|m| m.id == match_id) else {
            debug!(match_id, "ignoring selection of unknown match");
            return false;
        };

        self.cancel_selection("selection replaced");
        self.detail_generation += 1;
        self.state.cursor = pos;

        let generation = self.detail_generation;
        let in_flight = self.sink.dispatch(FeedCommand::FetchMatchDetail {
            match_id: match_id.to_string(),
            generation,
        });
        if in_flight {
            info!(match_id, generation, "match selected");
            self.state.push_log("[INFO] Loading match info...");
        } else {
            warn!(match_id, "match detail request dropped: feed unavailable");
            self.state
                .push_log("[WARN] Match detail request failed: feed unavailable");
        }
        self.selection = Some(ActiveSelection {
            match_id: match_id.to_string(),
            generation,
            timer: PollTimer::arm(now, self.poll_interval),
            in_flight,
        });
        true
    }

    /// Selects the first match in the list carrying this display name.
    pub fn select_by_name(&mut self, name: &str, now: Instant) -> bool {
        let Some(id) = self
            .state
            .matches()
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.id.clone())
        else {
            return false;
        };
        self.select(&id, now)
    }

    pub fn select_at_cursor(&mut self, now: Instant) -> bool {
        let Some(id) = self.state.match_under_cursor().map(|m| m.id.clone()) else {
            return false;
        };
        self.select(&id, now)
    }

    pub fn deselect(&mut self) -> bool {
        self.cancel_selection("deselected")
    }

    /// Fires the pending tick if it is due. Returns whether a detail request went out.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(selection) = self.selection.as_mut() else {
            return false;
        };
        if !selection.timer.is_due(now) {
            return false;
        }
        selection.timer.rearm(now);
        if selection.in_flight {
            debug!(
                match_id = %selection.match_id,
                "previous detail request still pending, skipping tick"
            );
            return false;
        }

        let sent = self.sink.dispatch(FeedCommand::FetchMatchDetail {
            match_id: selection.match_id.clone(),
            generation: selection.generation,
        });
        selection.in_flight = sent;
        if sent {
            debug!(match_id = %selection.match_id, "detail poll tick");
        } else {
            warn!(match_id = %selection.match_id, "detail poll dropped: feed unavailable");
            self.state
                .push_log("[WARN] Match detail request failed: feed unavailable");
        }
        sent
    }

    pub fn request_news(&mut self, topic: &str) -> bool {
        if self.shut_down {
            return false;
        }
        let sent = self.sink.dispatch(FeedCommand::FetchNews {
            topic: topic.to_string(),
        });
        self.state.news_loading = sent;
        if sent {
            self.state.push_log(format!("[INFO] Loading {topic} news..."));
        } else {
            self.state
                .push_log("[WARN] News request failed: feed unavailable");
        }
        sent
    }

    /// Cancels the poll. Later refresh/select/news calls are refused.
    pub fn shutdown(&mut self) {
        self.cancel_selection("shutdown");
        self.shut_down = true;
    }

    pub fn apply_delta(&mut self, delta: Delta) {
        match delta {
            Delta::SetMatches {
                generation,
                matches,
            } => {
                if generation != self.list_generation {
                    debug!(generation, current = self.list_generation, "stale match list");
                    return;
                }
                let count = matches.len();
                self.state.list_loading = false;
                self.state.list_error = None;
                self.state.summaries = Some(matches);
                self.state.clamp_cursor();
                // A pick made from the old list while this one was loading.
                let stale = self
                    .selected_id()
                    .is_some_and(|id| self.state.find_match(id).is_none());
                if stale {
                    self.cancel_selection("match left the list");
                    self.state
                        .push_log("[INFO] Selected match is no longer live");
                }
                info!(count, "live matches loaded");
                self.state
                    .push_log(format!("[INFO] Loaded {count} live matches"));
            }
            Delta::MatchesFailed { generation, error } => {
                if generation != self.list_generation {
                    debug!(generation, current = self.list_generation, "stale match list error");
                    return;
                }
                self.state.list_loading = false;
                self.state
                    .push_log(format!("[WARN] Error fetching matches: {error}"));
                self.state.list_error = Some(error);
            }
            Delta::SetMatchDetail {
                match_id,
                generation,
                detail,
            } => {
                let Some(selection) = self.current_selection_mut(&match_id, generation) else {
                    debug!(%match_id, generation, "discarding detail for inactive selection");
                    return;
                };
                selection.in_flight = false;
                self.state.last_detail = Some(detail);
                self.state.detail_error = None;
                self.state.detail_updated_at = Some(Local::now());
            }
            Delta::MatchDetailFailed {
                match_id,
                generation,
                error,
            } => {
                let Some(selection) = self.current_selection_mut(&match_id, generation) else {
                    debug!(%match_id, generation, "discarding detail error for inactive selection");
                    return;
                };
                selection.in_flight = false;
                self.state
                    .push_log(format!("[WARN] Error fetching match: {error}"));
                self.state.detail_error = Some(error);
            }
            Delta::SetNews { topic, articles } => {
                self.state.news_loading = false;
                self.state.news_error = None;
                if articles.is_empty() {
                    self.state.push_log("[INFO] No news found.");
                } else {
                    self.state
                        .push_log(format!("[INFO] Loaded {} {topic} articles", articles.len()));
                }
                self.state.news_topic = Some(topic);
                self.state.news = Some(articles);
            }
            Delta::NewsFailed { topic, error } => {
                self.state.news_loading = false;
                self.state
                    .push_log(format!("[WARN] Failed to fetch {topic} news: {error}"));
                self.state.news_error = Some(error);
            }
        }
    }

    fn current_selection_mut(
        &mut self,
        match_id: &str,
        generation: u64,
    ) -> Option<&mut ActiveSelection> {
        self.selection
            .as_mut()
            .filter(|s| s.generation == generation && s.match_id == match_id)
    }

    fn cancel_selection(&mut self, reason: &str) -> bool {
        let Some(selection) = self.selection.take() else {
            return false;
        };
        debug!(match_id = %selection.match_id, reason, "detail poll cancelled");
        self.state.last_detail = None;
        self.state.detail_error = None;
        self.state.detail_updated_at = None;
        true
    }
}
