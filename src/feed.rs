use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::score_fetch::ScoreBackend;
use crate::state::{Delta, FeedCommand};

/// Runs fetch commands off the UI loop until the command channel closes.
pub fn spawn_provider(
    backend: Arc<dyn ScoreBackend>,
    tx: Sender<Delta>,
    cmd_rx: Receiver<FeedCommand>,
    threads: usize,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let pool = build_fetch_pool(threads);
        if pool.is_none() {
            warn!("fetch pool unavailable, falling back to a thread per request");
        }

        while let Ok(cmd) = cmd_rx.recv() {
            debug!(?cmd, "feed command");
            let backend = backend.clone();
            let tx = tx.clone();
            let job = move || {
                let delta = execute_command(backend.as_ref(), cmd);
                let _ = tx.send(delta);
            };
            if let Some(pool) = pool.as_ref() {
                pool.spawn(job);
            } else {
                thread::spawn(job);
            }
        }
        info!("command channel closed, feed provider stopping");
    })
}

/// One command, one backend call, one delta. Errors become `*Failed` deltas.
pub fn execute_command<B: ScoreBackend + ?Sized>(backend: &B, cmd: FeedCommand) -> Delta {
    match cmd {
        FeedCommand::FetchLiveMatches { generation } => match backend.list_live_matches() {
            Ok(matches) => Delta::SetMatches {
                generation,
                matches,
            },
            Err(error) => Delta::MatchesFailed { generation, error },
        },
        FeedCommand::FetchMatchDetail {
            match_id,
            generation,
        } => match backend.get_match_detail(&match_id) {
            Ok(detail) => Delta::SetMatchDetail {
                match_id,
                generation,
                detail,
            },
            Err(error) => Delta::MatchDetailFailed {
                match_id,
                generation,
                error,
            },
        },
        FeedCommand::FetchNews { topic } => match backend.list_news(&topic) {
            Ok(articles) => Delta::SetNews { topic, articles },
            Err(error) => Delta::NewsFailed { topic, error },
        },
    }
}

fn build_fetch_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.clamp(1, 16))
        .thread_name(|idx| format!("cricwidget-fetch-{idx}"))
        .build()
        .ok()
}
