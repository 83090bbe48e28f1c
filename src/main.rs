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
use ratatui::prelude::*;
use ratatui::symbols;
use ratatui::widgets::{Axis, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph};

use rankwatch::backfill::BackfillTrigger;
use rankwatch::engine::Engine;
use rankwatch::fake_feed;
use rankwatch::feed;
use rankwatch::models::{AGGREGATE_TICK, Delta, ProviderCommand};
use rankwatch::viewport::TableViewport;

struct App {
    engine: Engine,
    trigger: BackfillTrigger,
    viewport: TableViewport,
    dark: bool,
    help_overlay: bool,
    should_quit: bool,
}

impl App {
    fn new(engine: Engine) -> Self {
        Self {
            engine,
            trigger: BackfillTrigger::new(),
            viewport: TableViewport::new(),
            dark: false,
            help_overlay: false,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => {
                self.viewport.scroll_down(self.table_rows_total());
            }
            KeyCode::Char('k') | KeyCode::Up => self.viewport.scroll_up(),
            KeyCode::Char('g') => self.viewport.jump_top(),
            KeyCode::Char('G') => self.viewport.jump_bottom(self.table_rows_total()),
            KeyCode::Char('t') => {
                self.dark = !self.dark;
                self.engine.set_dark_mode(self.dark);
            }
            KeyCode::Char('n') => self.cycle_subject(1),
            KeyCode::Char('p') => self.cycle_subject(-1),
            KeyCode::Char('?') => self.help_overlay = !self.help_overlay,
            _ => {}
        }
    }

    fn cycle_subject(&mut self, step: i64) {
        let mut ids: Vec<u32> = self.engine.teams().keys().copied().collect();
        if ids.is_empty() {
            return;
        }
        ids.sort_unstable();
        let current = self.engine.subject_id();
        let pos = ids.iter().position(|id| *id == current).unwrap_or(0) as i64;
        let next = (pos + step).rem_euclid(ids.len() as i64) as usize;
        self.viewport.jump_top();
        self.engine.set_subject(ids[next]);
    }

    fn table_rows_total(&self) -> usize {
        // Cached rounds plus the load-more sentinel row.
        self.engine.cache().len() + 1
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel::<ProviderCommand>();
    match env::var("SCOREBOARD_URL").ok().filter(|v| !v.trim().is_empty()) {
        Some(base_url) => feed::spawn_live_provider(base_url, tx, cmd_rx),
        None => fake_feed::spawn_fake_provider(tx, cmd_rx),
    }

    let subject_id = env::var("TEAM_ID")
        .ok()
        .and_then(|val| val.parse::<u32>().ok())
        .unwrap_or(1);
    let mut app = App::new(Engine::new(subject_id, cmd_tx));
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
    let cadence = Duration::from_millis(
        env::var("BACKFILL_CADENCE_MS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(500)
            .max(100),
    );
    let mut last_tick = Instant::now();
    let mut last_cadence = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            app.engine.apply_delta(delta);
        }

        if last_cadence.elapsed() >= cadence {
            let visible = app.viewport.sentinel_visible(app.table_rows_total());
            if app.trigger.on_cadence(visible, app.engine.outstanding()) {
                let rows_total = app.table_rows_total();
                app.engine.load_more();
                app.viewport.nudge_off_bottom(rows_total);
            }
            last_cadence = Instant::now();
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

fn ui(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(5),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app))
        .style(Style::default().fg(app.engine.palette().text()))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(34)])
        .split(chunks[1]);

    render_chart(frame, columns[0], app);
    render_tick_table(frame, columns[1], app);
    render_console(frame, chunks[2], app);

    if app.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let engine = &app.engine;
    let subject = engine
        .teams()
        .get(&engine.subject_id())
        .map(|t| t.name.clone())
        .unwrap_or_else(|| format!("#{}", engine.subject_id()));
    let tick = match engine.current_tick() {
        Some(AGGREGATE_TICK) => "overall".to_string(),
        Some(tick) => format!("tick {tick}"),
        None => "waiting for first tick".to_string(),
    };
    format!(
        "RANKWATCH | Team {subject} | {tick} | window {} | loading {}",
        engine.window(),
        engine.outstanding()
    )
}

fn render_chart(frame: &mut Frame, area: Rect, app: &App) {
    let dataset_src = app.engine.dataset();
    let palette = app.engine.palette();

    let mut y_max: f64 = 1.0;
    for series in &dataset_src.series {
        for (_, value) in &series.data {
            y_max = y_max.max(*value);
        }
    }
    let x_max = dataset_src.labels.len().saturating_sub(1).max(1) as f64;

    let datasets: Vec<Dataset> = dataset_src
        .series
        .iter()
        .map(|series| {
            Dataset::default()
                .name(series.label.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(series.color))
                .data(&series.data)
        })
        .collect();

    let axis_style = Style::default().fg(palette.text());
    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title("Point history")
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("tick")
                .style(axis_style)
                .bounds([0.0, x_max])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format!("{}", (x_max / 2.0) as i64)),
                    Span::raw(format!("{}", x_max as i64)),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("points")
                .style(axis_style)
                .bounds([0.0, y_max * 1.05])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format!("{:.0}", y_max * 1.05)),
                ]),
        );
    frame.render_widget(chart, area);
}

fn render_tick_table(frame: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default().title("Rounds").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height < 2 || inner.width == 0 {
        app.viewport.set_rows_visible(0);
        return;
    }

    let header_area = Rect { height: 1, ..inner };
    let header = Paragraph::new("tick  rank  points      Δ")
        .style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(header, header_area);

    let list_area = Rect {
        y: inner.y + 1,
        height: inner.height - 1,
        ..inner
    };
    let visible = list_area.height as usize;
    app.viewport.set_rows_visible(visible);

    let ticks = app.engine.cache().ticks_desc();
    let rows_total = ticks.len() + 1;
    let start = app.viewport.clamp(rows_total);
    let end = (start + visible).min(rows_total);

    let sentinel_index = ticks.len();

    let mut lines = Vec::new();
    for idx in start..end {
        if idx == sentinel_index {
            let text = if app.engine.outstanding() > 0 {
                "  … loading more rounds"
            } else {
                "  ↓ scroll for more history"
            };
            lines.push(Line::styled(text, Style::default().fg(Color::DarkGray)));
            continue;
        }
        let tick = ticks[idx];
        if let Some(rank) = app.engine.cache().get(tick) {
            let delta = ticks
                .get(idx + 1)
                .and_then(|prev| app.engine.cache().get(*prev))
                .map(|prev| rank.points - prev.points);
            let delta = match delta {
                Some(d) => format_signed(d),
                None => "-".to_string(),
            };
            lines.push(Line::raw(format!(
                "{tick:>4}  {:>4}  {:>9.1}  {delta:>6}",
                rank.rank, rank.points
            )));
        }
    }
    frame.render_widget(Paragraph::new(lines), list_area);
}

fn render_console(frame: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Length(1)])
        .split(area);

    let logs: Vec<&str> = app.engine.logs().collect();
    let tail = logs.iter().rev().take(2).rev().copied().collect::<Vec<_>>();
    let console = Paragraph::new(tail.join("\n"))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, rows[0]);

    let keybar = Paragraph::new(
        "j/k/↑/↓ Scroll | g/G Top/Bottom | n/p Team | t Theme | ? Help | q Quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(keybar, rows[1]);
}

fn format_signed(n: f64) -> String {
    if n < 0.0 {
        format!("{n:.1}")
    } else {
        format!("+{n:.1}")
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(50, 50, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "rankwatch - Help",
        "",
        "  j/k or ↑/↓   Scroll the round table",
        "  g / G        Jump to newest / oldest",
        "  n / p        Next / previous team",
        "  t            Toggle dark mode",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Scrolling the sentinel row into view loads",
        "older rounds automatically.",
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
