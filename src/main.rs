use std::env;
use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph};

use statline_terminal::analysis::{self, AnalysisSnapshot};
use statline_terminal::demo_feed::DemoStore;
use statline_terminal::insights::{ConsistencyLevel, FormStatus};
use statline_terminal::match_db::{self, MatchDb};
use statline_terminal::provider::{DataSource, spawn_provider};
use statline_terminal::series::windowed_matches;
use statline_terminal::state::{
    ALL_SEASONS, AppState, ChartPoint, Delta, DisplayOption, LEAGUES, MATCH_FETCH_LIMIT,
    ProviderCommand, apply_delta, league_baseline,
};
use statline_terminal::store_fetch::RemoteStore;
use statline_terminal::true_odds::Factorials;

struct App {
    state: AppState,
    snapshot: AnalysisSnapshot,
    factorials: Factorials,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    /// Fingerprint of the last opponent-average fetch, so overlay data is only
    /// re-requested when the opponent set actually changed.
    opponents_key: Option<String>,
    source_label: &'static str,
}

impl App {
    fn new(cmd_tx: Option<mpsc::Sender<ProviderCommand>>, source_label: &'static str) -> Self {
        let mut state = AppState::new();
        state.config.league = Some(LEAGUES[0].to_string());
        Self {
            state,
            snapshot: AnalysisSnapshot::default(),
            factorials: Factorials::new(),
            should_quit: false,
            cmd_tx,
            opponents_key: None,
            source_label,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Char('a') => self.cycle_team_a(1),
            KeyCode::Char('A') => self.cycle_team_a(-1),
            KeyCode::Char('b') => self.cycle_team_b(1),
            KeyCode::Char('B') => self.cycle_team_b(-1),
            KeyCode::Char('c') => self.clear_team_b(),
            KeyCode::Char('x') => self.swap_teams(),
            KeyCode::Char('l') => self.cycle_league(),
            KeyCode::Char('n') => self.cycle_season(),
            KeyCode::Char('s') => {
                self.state.config.category = self.state.config.category.next();
                self.state.config.clamp_line_to_category();
                self.state.dirty = true;
            }
            KeyCode::Char('d') => {
                self.state.config.display = self.state.config.display.next();
                self.state.dirty = true;
            }
            KeyCode::Char('v') => {
                self.state.config.venue = self.state.config.venue.next();
                self.state.dirty = true;
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.nudge_sample(1),
            KeyCode::Char('-') => self.nudge_sample(-1),
            KeyCode::Char('>') | KeyCode::Char('.') => self.nudge_team_b_sample(1),
            KeyCode::Char('<') | KeyCode::Char(',') => self.nudge_team_b_sample(-1),
            KeyCode::Char(']') => {
                self.state.config.nudge_line(1);
                self.state.dirty = true;
            }
            KeyCode::Char('[') => {
                self.state.config.nudge_line(-1);
                self.state.dirty = true;
            }
            KeyCode::Char('o') => {
                self.state.config.smoothing = !self.state.config.smoothing;
                self.state.dirty = true;
            }
            KeyCode::Char('1') => self.set_strength(1),
            KeyCode::Char('2') => self.set_strength(2),
            KeyCode::Char('3') => self.set_strength(3),
            KeyCode::Char('m') => {
                self.state.config.show_moving_average = !self.state.config.show_moving_average;
                self.state.dirty = true;
            }
            KeyCode::Char('p') => {
                self.state.config.show_average_against = !self.state.config.show_average_against;
                self.state.dirty = true;
            }
            KeyCode::Char('r') => self.refresh(),
            _ => {}
        }
    }

    fn cycle_team_a(&mut self, step: i64) {
        if self.state.teams.is_empty() {
            self.state.push_log("[INFO] No teams loaded yet");
            return;
        }
        self.state.config.team_a =
            cycle_selection(&self.state.config.team_a, &self.state.teams, step);
        self.state.dirty = true;
        self.request_matches();
    }

    fn cycle_team_b(&mut self, step: i64) {
        if self.state.teams.is_empty() {
            self.state.push_log("[INFO] No teams loaded yet");
            return;
        }
        self.state.config.team_b =
            cycle_selection(&self.state.config.team_b, &self.state.teams, step);
        self.state.dirty = true;
        self.request_matches();
    }

    fn clear_team_b(&mut self) {
        if self.state.config.team_b.take().is_some() {
            self.state.team_b_matches.clear();
            self.state.dirty = true;
        }
    }

    fn swap_teams(&mut self) {
        let config = &mut self.state.config;
        if let (Some(a), Some(b)) = (config.team_a.clone(), config.team_b.clone()) {
            config.team_a = Some(b);
            config.team_b = Some(a);
            std::mem::swap(&mut self.state.team_a_matches, &mut self.state.team_b_matches);
            self.state.dirty = true;
            self.state.push_log("[INFO] Teams swapped");
        }
    }

    fn cycle_league(&mut self) {
        let current = self.state.config.league.clone();
        let idx = current
            .as_deref()
            .and_then(|league| LEAGUES.iter().position(|l| *l == league));
        let next = match idx {
            Some(i) => (i + 1) % LEAGUES.len(),
            None => 0,
        };
        self.state.config.league = Some(LEAGUES[next].to_string());
        self.state.config.season = ALL_SEASONS.to_string();
        self.state.seasons.clear();
        self.state.dirty = true;
        self.request_seasons();
        self.request_roster();
    }

    fn cycle_season(&mut self) {
        // The "all" sentinel always heads the picker.
        let mut options = vec![ALL_SEASONS.to_string()];
        options.extend(self.state.seasons.iter().cloned());
        let idx = options
            .iter()
            .position(|s| *s == self.state.config.season)
            .unwrap_or(0);
        self.state.config.season = options[(idx + 1) % options.len()].clone();
        self.state.dirty = true;
        self.request_roster();
        self.request_matches();
    }

    fn nudge_sample(&mut self, step: i64) {
        let next = (self.state.config.sample_size as i64 + step).clamp(1, MATCH_FETCH_LIMIT as i64);
        self.state.config.sample_size = next as usize;
        self.state.dirty = true;
    }

    fn nudge_team_b_sample(&mut self, step: i64) {
        let current = self.state.config.effective_team_b_sample() as i64;
        let next = (current + step).clamp(1, MATCH_FETCH_LIMIT as i64);
        self.state.config.team_b_sample = Some(next as usize);
        self.state.dirty = true;
    }

    fn set_strength(&mut self, strength: u8) {
        self.state.config.smoothing_strength = strength;
        self.state.dirty = true;
    }

    fn refresh(&mut self) {
        self.state.push_log("[INFO] Refreshing current selection");
        self.opponents_key = None;
        self.request_seasons();
        self.request_roster();
        self.request_matches();
    }

    fn request_seasons(&mut self) {
        let Some(league) = self.state.config.league.clone() else {
            return;
        };
        let Some(tx) = &self.cmd_tx else {
            return;
        };
        let generation = self.state.next_seasons_generation();
        if tx
            .send(ProviderCommand::FetchSeasons { generation, league })
            .is_err()
        {
            self.state.push_log("[WARN] Seasons request failed");
        }
    }

    fn request_roster(&mut self) {
        let Some(league) = self.state.config.league.clone() else {
            return;
        };
        let Some(tx) = &self.cmd_tx else {
            return;
        };
        let generation = self.state.next_roster_generation();
        self.state.roster_loading = true;
        if tx
            .send(ProviderCommand::FetchRoster {
                generation,
                league,
                season: self.state.config.season.clone(),
            })
            .is_err()
        {
            self.state.roster_loading = false;
            self.state.push_log("[WARN] Roster request failed");
        }
    }

    fn request_matches(&mut self) {
        let Some(team_a) = self.state.config.team_a.clone() else {
            if !self.state.team_a_matches.is_empty() || !self.state.team_b_matches.is_empty() {
                self.state.team_a_matches.clear();
                self.state.team_b_matches.clear();
                self.state.dirty = true;
            }
            return;
        };
        let Some(tx) = &self.cmd_tx else {
            return;
        };
        let team_b = self
            .state
            .config
            .team_b
            .clone()
            .unwrap_or_else(|| team_a.clone());
        let generation = self.state.next_matches_generation();
        self.state.matches_loading = true;
        if tx
            .send(ProviderCommand::FetchMatches {
                generation,
                team_a,
                team_b,
                season: self.state.config.season.clone(),
            })
            .is_err()
        {
            self.state.matches_loading = false;
            self.state.push_log("[WARN] Match request failed");
        }
    }

    /// Requests conceded averages for the opponents currently on the chart,
    /// but only when the set changed since the last request. Outside the
    /// for-view the overlay derives locally, so the map is dropped.
    fn sync_opponent_overlay(&mut self) {
        let key = overlay_fingerprint(&self.state);
        if key == self.opponents_key {
            return;
        }
        self.opponents_key = key.clone();

        if key.is_none() {
            if !self.state.opponent_averages.is_empty() {
                self.state.opponent_averages.clear();
                self.state.dirty = true;
            }
            return;
        }

        let Some(tx) = &self.cmd_tx else {
            return;
        };
        let opponents = overlay_opponents(&self.state);
        let league_fallback =
            league_baseline(&self.state.league_averages, self.state.config.category);
        let generation = self.state.next_opponents_generation();
        if tx
            .send(ProviderCommand::FetchOpponentAverages {
                generation,
                category: self.state.config.category,
                opponents,
                season: self.state.config.season.clone(),
                league_fallback,
            })
            .is_err()
        {
            self.state.push_log("[WARN] Opponent averages request failed");
        }
    }
}

/// Opponents in the current chart window, deduped and sorted. Rows missing an
/// opponent name are skipped rather than looked up.
fn overlay_opponents(state: &AppState) -> Vec<String> {
    let rows = windowed_matches(
        &state.team_a_matches,
        state.config.venue,
        state.config.sample_size,
    );
    let mut opponents: Vec<String> = rows
        .iter()
        .map(|m| m.opponent.clone())
        .filter(|o| !o.is_empty())
        .collect();
    opponents.sort();
    opponents.dedup();
    opponents
}

fn overlay_fingerprint(state: &AppState) -> Option<String> {
    if state.config.display != DisplayOption::ForA || !state.config.show_average_against {
        return None;
    }
    let opponents = overlay_opponents(state);
    if opponents.is_empty() {
        return None;
    }
    Some(format!(
        "{}|{}|{}",
        state.config.category.key(),
        state.config.season,
        opponents.join(",")
    ))
}

fn cycle_selection(current: &Option<String>, options: &[String], step: i64) -> Option<String> {
    if options.is_empty() {
        return None;
    }
    let idx = current
        .as_ref()
        .and_then(|c| options.iter().position(|t| t == c));
    let next = match idx {
        Some(i) => (i as i64 + step).rem_euclid(options.len() as i64) as usize,
        None => {
            if step >= 0 {
                0
            } else {
                options.len() - 1
            }
        }
    };
    Some(options[next].clone())
}

fn select_source(startup_logs: &mut Vec<String>) -> DataSource {
    let requested = env::var("STATLINE_SOURCE")
        .unwrap_or_else(|_| "demo".to_string())
        .trim()
        .to_lowercase();

    match requested.as_str() {
        "remote" => match RemoteStore::from_env() {
            Some(store) => DataSource::Remote(store),
            None => {
                startup_logs.push(
                    "[WARN] STATLINE_DB_URL/STATLINE_DB_KEY not set, using demo data".to_string(),
                );
                DataSource::Demo(DemoStore::generate())
            }
        },
        "sqlite" => {
            let path = match_db::default_db_path();
            match MatchDb::open(&path) {
                Ok(db) => DataSource::Sqlite(db),
                Err(err) => {
                    startup_logs.push(format!(
                        "[WARN] sqlite open failed ({err}), using demo data"
                    ));
                    DataSource::Demo(DemoStore::generate())
                }
            }
        }
        _ => DataSource::Demo(DemoStore::generate()),
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let mut startup_logs = Vec::new();
    let source = select_source(&mut startup_logs);
    let source_label = source.label();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(tx, cmd_rx, source);

    let mut app = App::new(Some(cmd_tx), source_label);
    for line in startup_logs {
        app.state.push_log(line);
    }
    app.state
        .push_log(format!("[INFO] Data source: {source_label}"));
    app.request_seasons();
    app.request_roster();

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        app.sync_opponent_overlay();
        if app.state.dirty {
            app.snapshot = analysis::compute_snapshot(&app.state, &mut app.factorials);
            app.state.dirty = false;
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
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
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(7),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(32)])
        .split(chunks[1]);
    render_chart(frame, top[0], app);
    render_odds_card(frame, top[1], app);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(chunks[2]);
    render_form_card(frame, cards[0], app);
    render_consistency_card(frame, cards[1], app);
    render_hit_rate_card(frame, cards[2], app);
    render_trend_card(frame, cards[3], app);

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[3]);

    let footer = Paragraph::new(footer_text()).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[4]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let state = &app.state;
    let config = &state.config;
    let league = config.league.as_deref().unwrap_or("-");
    let team_a = config.team_a.as_deref().unwrap_or("- press a -");
    let team_b = config.team_b.as_deref().unwrap_or("-");
    let loading = match (state.roster_loading, state.matches_loading) {
        (true, _) => " | loading roster...",
        (false, true) => " | loading matches...",
        _ => "",
    };
    let smoothing = if config.smoothing {
        format!(" | Smooth x{}", config.smoothing_strength)
    } else {
        String::new()
    };

    format!(
        "STATLINE TERMINAL | {} | {} | {}{loading}\nTeam A: {team_a}  vs  Team B: {team_b}\n{} | {} | Venue {} | Line {:.1} | Sample {}{smoothing}",
        app.source_label,
        league,
        config.season_label(),
        config.category.label(),
        config.display.label(),
        config.venue.label(),
        config.line,
        config.sample_size,
    )
}

fn footer_text() -> &'static str {
    "a/b teams | c clear B | x swap | l league | n season | s stat | d display | v venue | +/- sample | [/] line | o smooth | m/p overlays | r refresh | ? help | q quit"
}

fn render_chart(frame: &mut Frame, area: Rect, app: &App) {
    let state = &app.state;
    let snapshot = &app.snapshot;
    let title = format!(
        "{} | Line {:.1} | Avg {:.1}",
        snapshot.chart_title, state.config.line, snapshot.series_average
    );
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    if state.matches_loading {
        let loading =
            Paragraph::new("Loading matches...").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(loading, inner);
        return;
    }
    if snapshot.points.is_empty() {
        let hint = if state.config.team_a.is_none() {
            "No team selected. Press a to pick one."
        } else {
            "No matches for this selection."
        };
        let empty = Paragraph::new(hint).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    const BAR_WIDTH: u16 = 4;
    const BAR_GAP: u16 = 1;
    let fit = (inner.width / (BAR_WIDTH + BAR_GAP)).max(1) as usize;
    let start = snapshot.points.len().saturating_sub(fit);
    let visible = &snapshot.points[start..];

    let line = state.config.line;
    let bars: Vec<Bar> = visible
        .iter()
        .map(|point| {
            let style = if point.is_padding() {
                Style::default().fg(Color::DarkGray)
            } else if point.smoothed {
                Style::default().fg(Color::Yellow)
            } else if point.value > line {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Red)
            };
            let text = if point.is_padding() {
                String::new()
            } else {
                trim_value(point.value)
            };
            Bar::default()
                .value(scaled(point.value))
                .text_value(text)
                .label(Line::from(opponent_abbr(point)))
                .style(style)
        })
        .collect();

    let top = visible
        .iter()
        .map(|p| p.value)
        .fold(line, f64::max);
    let chart = BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .bar_width(BAR_WIDTH)
        .bar_gap(BAR_GAP)
        .max(scaled(top).max(1));
    frame.render_widget(chart, inner);
}

fn render_odds_card(frame: &mut Frame, area: Rect, app: &App) {
    let config = &app.state.config;
    let odds = &app.snapshot.odds;

    let text = if odds.is_available() {
        format!(
            "Matchup: {} vs {}\nMarket:  {} over {:.1}\n\nOver   {:>7.2}  ({:.1}%)\nUnder  {:>7.2}  ({:.1}%)\n\nExpected value {:.2}\nB sample {}",
            config.team_a.as_deref().unwrap_or("-"),
            config.team_b.as_deref().unwrap_or("-"),
            config.category.label(),
            config.line,
            odds.over_odds,
            odds.over_implied_pct(),
            odds.under_odds,
            odds.under_implied_pct(),
            odds.expected_value,
            config.effective_team_b_sample(),
        )
    } else if config.team_b.is_none() {
        "Pick Team B (b) to price\nthe over/under.".to_string()
    } else if app.state.league_averages.is_empty() {
        "No league baseline loaded.".to_string()
    } else {
        "Waiting for match data...".to_string()
    };

    let card = Paragraph::new(text)
        .block(Block::default().title("Model Odds").borders(Borders::ALL));
    frame.render_widget(card, area);
}

fn render_form_card(frame: &mut Frame, area: Rect, app: &App) {
    let form = &app.snapshot.form;
    let color = match form.status {
        FormStatus::Strong => Color::Green,
        FormStatus::Weak => Color::Red,
        FormStatus::Neutral => Color::Gray,
    };
    let text = format!(
        "{}\nL5 {:.1} vs all {:.1}\nDiff {:+.1}",
        form.status.label(),
        form.recent5_avg,
        form.overall_avg,
        form.difference
    );
    let card = Paragraph::new(text)
        .style(Style::default().fg(color))
        .block(Block::default().title("Form").borders(Borders::ALL));
    frame.render_widget(card, area);
}

fn render_consistency_card(frame: &mut Frame, area: Rect, app: &App) {
    let consistency = &app.snapshot.consistency;
    let color = match consistency.level {
        ConsistencyLevel::High => Color::Green,
        ConsistencyLevel::Medium => Color::Yellow,
        ConsistencyLevel::Low => Color::Red,
        ConsistencyLevel::Neutral => Color::Gray,
    };
    let text = format!(
        "{}\nCV {:.1}%\nSD {:.2}  Mean {:.1}",
        consistency.level.label(),
        consistency.coefficient,
        consistency.std_dev,
        consistency.mean
    );
    let card = Paragraph::new(text)
        .style(Style::default().fg(color))
        .block(Block::default().title("Consistency").borders(Borders::ALL));
    frame.render_widget(card, area);
}

fn render_hit_rate_card(frame: &mut Frame, area: Rect, app: &App) {
    let snapshot = &app.snapshot;
    let text = format!(
        "Over {:.1}\nL5  {:>5.1}%\nL10 {:>5.1}%\nL15 {:>5.1}%",
        app.state.config.line, snapshot.hit_rate_5, snapshot.hit_rate_10, snapshot.hit_rate_15
    );
    let card = Paragraph::new(text)
        .block(Block::default().title("Hit Rate").borders(Borders::ALL));
    frame.render_widget(card, area);
}

fn render_trend_card(frame: &mut Frame, area: Rect, app: &App) {
    let state = &app.state;
    let snapshot = &app.snapshot;
    let conceded = &snapshot.conceded;

    let last = snapshot.points.last();
    let ma = if state.config.show_moving_average {
        last.map(|p| trim_value(p.moving_average))
            .unwrap_or_else(|| "-".to_string())
    } else {
        "off".to_string()
    };
    let opp = if state.config.show_average_against {
        last.map(|p| trim_value(p.average_against))
            .unwrap_or_else(|| "-".to_string())
    } else {
        "off".to_string()
    };

    let text = format!(
        "Conceded H {:.1} / A {:.1}\nMA5 {ma}\nOpp avg {opp}",
        conceded.home, conceded.away
    );
    let card = Paragraph::new(text)
        .block(Block::default().title("Trend").borders(Borders::ALL));
    frame.render_widget(card, area);
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    let mut lines: Vec<String> = state.logs.iter().rev().take(3).cloned().collect();
    lines.reverse();
    lines.join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(64, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Statline Terminal - Help",
        "",
        "Selection:",
        "  a / A        Cycle Team A forward/back",
        "  b / B        Cycle Team B forward/back",
        "  c            Clear Team B",
        "  x            Swap Team A and Team B",
        "  l            Next league",
        "  n            Next season (all first)",
        "",
        "Pipeline:",
        "  s            Next statistic",
        "  d            For / Against / Combined",
        "  v            Venue filter",
        "  + / -        Sample size",
        "  > / <        Team B sample size",
        "  ] / [        Move the line",
        "  o            Toggle outlier smoothing",
        "  1 / 2 / 3    Smoothing strength",
        "  m            Moving-average overlay",
        "  p            Opponent-average overlay",
        "",
        "  r            Refresh data",
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

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

/// Chart values are one-decimal, so they scale to integers without loss.
fn scaled(value: f64) -> u64 {
    (value.max(0.0) * 10.0).round() as u64
}

fn trim_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

fn opponent_abbr(point: &ChartPoint) -> String {
    if point.is_padding() {
        return String::new();
    }
    let first = point.opponent.split_whitespace().next().unwrap_or("");
    first.chars().take(3).collect::<String>().to_uppercase()
}
