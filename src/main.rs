use std::fs::{self, OpenOptions};
use std::io;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cricwidget::config::Config;
use cricwidget::fake_feed::FakeBackend;
use cricwidget::feed;
use cricwidget::score_fetch::{GraphqlBackend, ScoreBackend};
use cricwidget::state::{self, AppState, Delta, FeedCommand};
use cricwidget::workflow::{Phase, Workflow};

struct App {
    workflow: Workflow<Sender<FeedCommand>>,
    news_topic: String,
    source_label: String,
    should_quit: bool,
}

impl App {
    fn new(workflow: Workflow<Sender<FeedCommand>>, config: &Config) -> Self {
        let source_label = if config.demo {
            "demo feed".to_string()
        } else {
            config.endpoint.clone()
        };
        Self {
            workflow,
            news_topic: config.news_topic.clone(),
            source_label,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.workflow.refresh();
            }
            KeyCode::Char('j') | KeyCode::Down => self.workflow.state_mut().select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.workflow.state_mut().select_prev(),
            KeyCode::Enter => {
                if !self.workflow.select_at_cursor(Instant::now()) {
                    self.workflow
                        .state_mut()
                        .push_log("[INFO] No match under cursor");
                }
            }
            KeyCode::Esc | KeyCode::Char('x') => {
                self.workflow.deselect();
            }
            KeyCode::Char('n') | KeyCode::Char('N') => {
                let topic = self.news_topic.clone();
                self.workflow.request_news(&topic);
            }
            KeyCode::Char('?') => {
                let state = self.workflow.state_mut();
                state.help_overlay = !state.help_overlay;
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let config = Config::from_env()?;
    if let Err(err) = init_tracing(&config) {
        eprintln!("logging disabled: {err:#}");
    }

    let backend: Arc<dyn ScoreBackend> = if config.demo {
        Arc::new(FakeBackend::new())
    } else {
        Arc::new(GraphqlBackend::from_config(&config)?)
    };
    info!(
        demo = config.demo,
        endpoint = %config.endpoint,
        timeout_secs = config.request_timeout.as_secs(),
        poll_secs = config.poll_interval.as_secs(),
        "starting cricwidget"
    );

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let provider = feed::spawn_provider(backend, tx, cmd_rx, config.fetch_threads);

    let mut app = App::new(Workflow::from_config(cmd_tx, &config), &config);
    app.workflow.refresh();

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend).context("create terminal")?;

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode().context("disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("leave alternate screen")?;
    terminal.show_cursor().context("show cursor")?;

    app.workflow.shutdown();
    drop(app);
    if provider.join().is_err() {
        warn!("feed provider panicked");
    }
    info!("cricwidget stopped");

    res.context("ui loop failed")
}

fn init_tracing(config: &Config) -> Result<()> {
    let Some(path) = config.log_file.as_ref() else {
        return Ok(());
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("create log directory {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("install subscriber: {err}"))?;
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);

    loop {
        while let Ok(delta) = rx.try_recv() {
            app.workflow.apply_delta(delta);
        }

        let now = Instant::now();
        app.workflow.tick(now);

        terminal.draw(|f| ui(f, app))?;

        let timeout = app
            .workflow
            .next_deadline()
            .map(|due| due.saturating_duration_since(Instant::now()))
            .map_or(tick_rate, |until_due| until_due.min(tick_rate));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(8),
            Constraint::Length(7),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app))
        .block(Block::default().borders(Borders::BOTTOM))
        .style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);
    render_match_list(frame, body[0], app);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(body[1]);
    render_detail(frame, right[0], app);
    render_news(frame, right[1], app.workflow.state());

    render_console(frame, chunks[2], app.workflow.state());

    let footer = Paragraph::new(
        "r Refresh | j/k/↑/↓ Move | Enter Select | Esc/x Deselect | n News | ? Help | q Quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.workflow.state().help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let phase = match app.workflow.phase() {
        Phase::Idle => "no list",
        Phase::ListLoaded => "pick a match",
        Phase::DetailActive => "live",
    };
    format!(
        "LIVE CRICKET | {} | {} | poll {}s",
        phase,
        app.source_label,
        app.workflow.poll_interval().as_secs()
    )
}

fn render_match_list(frame: &mut Frame, area: Rect, app: &App) {
    let state = app.workflow.state();
    let selected_id = app.workflow.selected_id();
    let mut lines: Vec<Line> = Vec::new();

    if state.list_loading {
        lines.push(Line::styled(
            "Loading live matches...",
            Style::default().fg(Color::Yellow),
        ));
    }
    if let Some(err) = state.list_error.as_ref() {
        lines.push(Line::styled(
            format!("Error fetching matches: {err}"),
            Style::default().fg(Color::Red),
        ));
    }
    match state.summaries.as_deref() {
        None if !state.list_loading => {
            lines.push(Line::styled(
                "Press r to load live matches",
                Style::default().fg(Color::DarkGray),
            ));
        }
        Some([]) => {
            lines.push(Line::styled(
                "No live matches right now",
                Style::default().fg(Color::DarkGray),
            ));
        }
        Some(matches) => {
            for (idx, summary) in matches.iter().enumerate() {
                let marker = if Some(summary.id.as_str()) == selected_id {
                    "▶ "
                } else {
                    "  "
                };
                let mut style = Style::default();
                if idx == state.cursor {
                    style = style.fg(Color::White).bg(Color::DarkGray);
                }
                lines.push(Line::styled(
                    format!("{marker}{}", state::summary_row(summary)),
                    style,
                ));
            }
        }
        None => {}
    }

    let list = Paragraph::new(lines)
        .block(Block::default().title("Matches").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(list, area);
}

fn render_detail(frame: &mut Frame, area: Rect, app: &App) {
    let state = app.workflow.state();
    let mut lines: Vec<Line> = Vec::new();

    if app.workflow.selection().is_none() {
        lines.push(Line::styled(
            "Select a match with Enter",
            Style::default().fg(Color::DarkGray),
        ));
    } else if let Some(detail) = state.last_detail.as_ref() {
        for (idx, text) in state::detail_lines(detail).into_iter().enumerate() {
            let style = if idx == 0 {
                Style::default().add_modifier(Modifier::BOLD)
            } else if text.starts_with("Weather in ") {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            lines.push(Line::styled(text, style));
        }
        if let Some(at) = state.detail_updated_at {
            lines.push(Line::styled(
                format!("updated {}", at.format("%H:%M:%S")),
                Style::default().fg(Color::DarkGray),
            ));
        }
    } else if state.detail_error.is_none() {
        lines.push(Line::styled(
            "Loading match info...",
            Style::default().fg(Color::Yellow),
        ));
    }
    if let Some(err) = state.detail_error.as_ref() {
        lines.push(Line::styled(
            format!("Error fetching match: {err}"),
            Style::default().fg(Color::Red),
        ));
    }

    let detail = Paragraph::new(lines)
        .block(Block::default().title("Score").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(detail, area);
}

fn render_news(frame: &mut Frame, area: Rect, state: &AppState) {
    let mut lines: Vec<Line> = Vec::new();
    if state.news_loading {
        lines.push(Line::styled(
            "Loading news...",
            Style::default().fg(Color::Yellow),
        ));
    }
    if let Some(err) = state.news_error.as_ref() {
        lines.push(Line::styled(
            format!("Failed to fetch news: {err}"),
            Style::default().fg(Color::Red),
        ));
    }
    match state.news.as_deref() {
        Some(articles) => lines.extend(state::news_lines(articles).into_iter().map(Line::raw)),
        None if !state.news_loading => lines.push(Line::styled(
            "Press n for news",
            Style::default().fg(Color::DarkGray),
        )),
        None => {}
    }

    let title = match state.news_topic.as_deref() {
        Some(topic) => format!("News: {topic}"),
        None => "News".to_string(),
    };
    let news = Paragraph::new(lines)
        .block(Block::default().title(title).borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(news, area);
}

fn render_console(frame: &mut Frame, area: Rect, state: &AppState) {
    let visible = area.height.saturating_sub(2) as usize;
    let skip = state.logs.len().saturating_sub(visible);
    let lines: Vec<Line> = state
        .logs
        .iter()
        .skip(skip)
        .map(|msg| {
            let style = if msg.starts_with("[WARN]") {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::Gray)
            };
            Line::styled(msg.clone(), style)
        })
        .collect();
    let console = Paragraph::new(lines).block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Live Cricket - Help",
        "",
        "  r            Refresh live matches (drops the selection)",
        "  j/k or ↑/↓   Move cursor",
        "  Enter        Select match and start polling",
        "  Esc / x      Stop polling",
        "  n            Fetch news",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
