// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use lossmap_app::{
    AppCommand, AppState, CountiesResponse, CountyIndex, CumulativePoint, DetailPhase, PanelKind,
    SHADE_NEUTRAL, SearchCommand, SearchOutcome, SearchState, SeriesPoint,
    format_currency_short, format_month_yy, format_timestamp_utc, normalize_fips, shade,
};
use lossmap_geo::{CountyAtlas, CountyShape};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::Span;
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine};
use ratatui::widgets::{
    Axis, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, Paragraph, Row, Table,
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

/// How the rendering layer reaches the loss API. The production runtime
/// spawns a worker thread per series fetch; the default implementation runs
/// synchronously, which is enough for tests and demo data.
pub trait AppRuntime {
    fn load_counties(&mut self) -> Result<CountiesResponse>;

    fn fetch_series(&mut self, fips: &str, run: Option<&str>) -> Result<Vec<SeriesPoint>>;

    fn spawn_series_fetch(
        &mut self,
        token: u64,
        fips: &str,
        run: Option<&str>,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let event = match self.fetch_series(fips, run) {
            Ok(points) => InternalEvent::Series(SeriesFetchEvent::Completed { token, points }),
            Err(error) => InternalEvent::Series(SeriesFetchEvent::Failed {
                token,
                error: error.to_string(),
            }),
        };
        tx.send(event)
            .map_err(|_| anyhow::anyhow!("series event channel closed"))?;
        Ok(())
    }
}

/// Completion of a background series fetch, tagged with the selection token
/// it was issued for.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesFetchEvent {
    Completed { token: u64, points: Vec<SeriesPoint> },
    Failed { token: u64, error: String },
}

impl SeriesFetchEvent {
    const fn token(&self) -> u64 {
        match self {
            Self::Completed { token, .. } | Self::Failed { token, .. } => *token,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Series(SeriesFetchEvent),
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ViewData {
    index: CountyIndex,
    detail: lossmap_app::DetailController,
    search: SearchState,
    atlas: CountyAtlas,
    ranked_cursor: usize,
    chart_cursor: usize,
    selection_centroid: Option<(f64, f64)>,
    help_visible: bool,
    status_token: u64,
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    atlas: CountyAtlas,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData {
        atlas,
        ..ViewData::default()
    };
    let (internal_tx, internal_rx) = mpsc::channel();

    load_county_list(state, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Mouse(mouse) => {
                    let size = terminal.size().context("terminal size")?;
                    let area = Rect::new(0, 0, size.width, size.height);
                    handle_mouse_event(state, runtime, &mut view_data, &internal_tx, mouse, area);
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(
        io::stdout(),
        terminal::LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("leave alternate screen")?;
    result
}

fn load_county_list<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    match runtime.load_counties() {
        Ok(response) => {
            view_data.detail.set_run(response.run.clone());
            view_data.index = CountyIndex::new(response.counties);
            view_data.ranked_cursor = 0;
            let message = match view_data.detail.run() {
                Some(run) => format!("{} counties loaded (run {run})", view_data.index.len()),
                None => format!("{} counties loaded", view_data.index.len()),
            };
            emit_status(state, view_data, internal_tx, message);
        }
        Err(error) => {
            tracing::warn!(error = %format!("{error:#}"), "county list load failed");
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("county list load failed: {error}"),
            );
        }
    }
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Series(event) => handle_series_event(view_data, event),
        }
    }
}

fn handle_series_event(view_data: &mut ViewData, event: SeriesFetchEvent) {
    let token = event.token();
    let committed = match event {
        SeriesFetchEvent::Completed { token, points } => {
            view_data.detail.complete(token, Ok(points))
        }
        SeriesFetchEvent::Failed { token, error } => {
            tracing::warn!(%error, "series fetch failed");
            view_data.detail.complete(token, Err(error))
        }
    };

    if committed {
        // Park the readout cursor on the newest point.
        if let DetailPhase::Loaded(series) = view_data.detail.phase() {
            view_data.chart_cursor = series.len().saturating_sub(1);
        }
    } else {
        tracing::debug!(token, "discarded stale series response");
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

/// Every county activation path funnels through here.
fn select_county<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    fips: &str,
    name: &str,
) {
    let token = view_data.detail.begin(fips, name);
    view_data.chart_cursor = 0;
    let fips = normalize_fips(fips);
    view_data.selection_centroid = view_data.atlas.centroid(&fips);

    let run = view_data.detail.run().map(str::to_owned);
    if let Err(error) =
        runtime.spawn_series_fetch(token, &fips, run.as_deref(), internal_tx.clone())
    {
        tracing::warn!(%fips, error = %format!("{error:#}"), "series fetch spawn failed");
        view_data.detail.complete(token, Err(error.to_string()));
    }
    emit_status(state, view_data, internal_tx, format!("loading {name}"));
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            view_data.help_visible = false;
        }
        return false;
    }

    if key.code == KeyCode::Tab {
        state.dispatch(AppCommand::NextPanel);
        return false;
    }
    if key.code == KeyCode::BackTab {
        state.dispatch(AppCommand::PrevPanel);
        return false;
    }

    if state.focus == PanelKind::Search {
        handle_search_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('?') => {
            view_data.help_visible = true;
        }
        KeyCode::Char('/') => {
            state.dispatch(AppCommand::FocusPanel(PanelKind::Search));
        }
        KeyCode::Char('r') => {
            // Full list reload; the run identifier is re-captured here and
            // nowhere else.
            load_county_list(state, runtime, view_data, internal_tx);
        }
        _ => match state.focus {
            PanelKind::Map => handle_map_key(state, runtime, view_data, internal_tx, key),
            PanelKind::Ranked => handle_ranked_key(state, runtime, view_data, internal_tx, key),
            PanelKind::Chart => handle_chart_key(view_data, key),
            PanelKind::Search => {}
        },
    }
    false
}

fn handle_search_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let suggestion_count = view_data.index.suggestions(&view_data.search.query).len();
    let command = match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            if view_data.search.open {
                Some(SearchCommand::Dismiss)
            } else {
                state.dispatch(AppCommand::FocusPanel(PanelKind::Map));
                None
            }
        }
        (KeyCode::Up, _) => Some(SearchCommand::MoveUp),
        (KeyCode::Down, _) => Some(SearchCommand::MoveDown),
        (KeyCode::Backspace, _) => Some(SearchCommand::Backspace),
        (KeyCode::Enter, _) => Some(SearchCommand::Submit),
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(SearchCommand::ClearQuery)
        }
        (KeyCode::Char(ch), modifiers)
            if modifiers.is_empty() || modifiers == KeyModifiers::SHIFT =>
        {
            Some(SearchCommand::Insert(ch))
        }
        _ => None,
    };

    let Some(command) = command else {
        return;
    };

    match view_data.search.apply(command, suggestion_count) {
        SearchOutcome::Commit(index) => {
            let target = view_data
                .index
                .suggestions(&view_data.search.query)
                .get(index)
                .map(|county| (county.fips.clone(), county.name.clone()));
            if let Some((fips, name)) = target {
                select_county(state, runtime, view_data, internal_tx, &fips, &name);
            }
        }
        SearchOutcome::Dismissed | SearchOutcome::None => {}
    }
}

fn handle_ranked_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let total = view_data.index.len();
    if total == 0 {
        return;
    }
    match key.code {
        KeyCode::Up => {
            view_data.ranked_cursor = view_data.ranked_cursor.saturating_sub(1);
        }
        KeyCode::Down => {
            view_data.ranked_cursor = (view_data.ranked_cursor + 1).min(total - 1);
        }
        KeyCode::PageUp => {
            view_data.ranked_cursor = view_data.ranked_cursor.saturating_sub(10);
        }
        KeyCode::PageDown => {
            view_data.ranked_cursor = (view_data.ranked_cursor + 10).min(total - 1);
        }
        KeyCode::Home => view_data.ranked_cursor = 0,
        KeyCode::End => view_data.ranked_cursor = total - 1,
        KeyCode::Enter => {
            let target = view_data
                .index
                .ranked()
                .get(view_data.ranked_cursor)
                .map(|county| (county.fips.clone(), county.name.clone()));
            if let Some((fips, name)) = target {
                select_county(state, runtime, view_data, internal_tx, &fips, &name);
            }
        }
        _ => {}
    }
}

fn handle_map_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Up | KeyCode::Char('p') => {
            step_map_selection(state, runtime, view_data, internal_tx, -1);
        }
        KeyCode::Down | KeyCode::Char('n') => {
            step_map_selection(state, runtime, view_data, internal_tx, 1);
        }
        _ => {}
    }
}

/// Keyboard parity for map clicks: walk the selection through the ranked
/// order.
fn step_map_selection<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    delta: isize,
) {
    let target = {
        let ranked = view_data.index.ranked();
        if ranked.is_empty() {
            return;
        }
        let len = ranked.len() as isize;
        let next = match view_data.detail.selection().and_then(|selection| {
            ranked
                .iter()
                .position(|county| normalize_fips(&county.fips) == selection.fips)
        }) {
            Some(position) => (position as isize + delta).rem_euclid(len) as usize,
            None => 0,
        };
        (ranked[next].fips.clone(), ranked[next].name.clone())
    };
    select_county(state, runtime, view_data, internal_tx, &target.0, &target.1);
}

fn handle_chart_key(view_data: &mut ViewData, key: KeyEvent) {
    let DetailPhase::Loaded(series) = view_data.detail.phase() else {
        return;
    };
    if series.is_empty() {
        return;
    }
    let last = series.len() - 1;
    match key.code {
        KeyCode::Left => view_data.chart_cursor = view_data.chart_cursor.saturating_sub(1),
        KeyCode::Right => view_data.chart_cursor = (view_data.chart_cursor + 1).min(last),
        KeyCode::Home => view_data.chart_cursor = 0,
        KeyCode::End => view_data.chart_cursor = last,
        _ => {}
    }
}

fn handle_mouse_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    mouse: MouseEvent,
    area: Rect,
) {
    let rects = layout_rects(area);
    let at = (mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if cell_in_rect(at, rects.map) {
                state.dispatch(AppCommand::FocusPanel(PanelKind::Map));
                map_click(state, runtime, view_data, internal_tx, at, rects.map);
            } else if cell_in_rect(at, rects.ranked) {
                state.dispatch(AppCommand::FocusPanel(PanelKind::Ranked));
                ranked_click(state, runtime, view_data, internal_tx, at, rects.ranked);
            } else if cell_in_rect(at, rects.search) {
                state.dispatch(AppCommand::FocusPanel(PanelKind::Search));
            } else if cell_in_rect(at, rects.chart) {
                state.dispatch(AppCommand::FocusPanel(PanelKind::Chart));
            }
        }
        MouseEventKind::ScrollUp if cell_in_rect(at, rects.ranked) => {
            view_data.ranked_cursor = view_data.ranked_cursor.saturating_sub(1);
        }
        MouseEventKind::ScrollDown if cell_in_rect(at, rects.ranked) => {
            let total = view_data.index.len();
            if total > 0 {
                view_data.ranked_cursor = (view_data.ranked_cursor + 1).min(total - 1);
            }
        }
        _ => {}
    }
}

fn map_click<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    at: (u16, u16),
    map_area: Rect,
) {
    let Some(bounds) = map_bounds(&view_data.atlas) else {
        return;
    };
    let inner = map_area.inner(Margin {
        horizontal: 1,
        vertical: 1,
    });
    let Some((lon, lat)) = cell_to_geo(inner, bounds, at.0, at.1) else {
        return;
    };
    let Some((fips, name)) = resolve_map_selection(view_data, lon, lat) else {
        return;
    };
    select_county(state, runtime, view_data, internal_tx, &fips, &name);
}

/// Display-name preference on map activation: joined summary, then the
/// polygon's own name, then the bare identifier.
fn resolve_map_selection(view_data: &ViewData, lon: f64, lat: f64) -> Option<(String, String)> {
    let shape = view_data.atlas.hit_test(lon, lat)?;
    let name = view_data
        .index
        .get(&shape.fips)
        .map(|summary| summary.name.clone())
        .or_else(|| (!shape.name.is_empty()).then(|| shape.name.clone()))
        .unwrap_or_else(|| shape.fips.clone());
    Some((shape.fips.clone(), name))
}

fn ranked_click<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    at: (u16, u16),
    ranked_area: Rect,
) {
    let inner = ranked_area.inner(Margin {
        horizontal: 1,
        vertical: 1,
    });
    if !cell_in_rect(at, inner) {
        return;
    }
    let row = (at.1 - inner.y) as usize;
    if row == 0 {
        return; // header
    }
    let total = view_data.index.len();
    let visible = inner.height.saturating_sub(1) as usize;
    let (start, end) = ranked_window(view_data.ranked_cursor, total, visible);
    let item = start + row - 1;
    if item >= end {
        return;
    }
    view_data.ranked_cursor = item;
    let target = view_data
        .index
        .ranked()
        .get(item)
        .map(|county| (county.fips.clone(), county.name.clone()));
    if let Some((fips, name)) = target {
        select_county(state, runtime, view_data, internal_tx, &fips, &name);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LayoutRects {
    header: Rect,
    map: Rect,
    search: Rect,
    ranked: Rect,
    chart: Rect,
    status: Rect,
}

/// One layout function shared by rendering and mouse hit-testing so the two
/// can never disagree about where a panel is.
fn layout_rects(area: Rect) -> LayoutRects {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(12),
            Constraint::Length(2),
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(58), Constraint::Min(30)])
        .split(rows[1]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(4)])
        .split(columns[1]);

    LayoutRects {
        header: rows[0],
        map: columns[0],
        search: side[0],
        ranked: side[1],
        chart: rows[2],
        status: rows[3],
    }
}

fn cell_in_rect(at: (u16, u16), rect: Rect) -> bool {
    at.0 >= rect.x
        && at.0 < rect.x.saturating_add(rect.width)
        && at.1 >= rect.y
        && at.1 < rect.y.saturating_add(rect.height)
}

/// Atlas bounds padded slightly so border counties are not clipped.
fn map_bounds(atlas: &CountyAtlas) -> Option<(f64, f64, f64, f64)> {
    let (min_lon, min_lat, max_lon, max_lat) = atlas.bounds()?;
    let pad_lon = ((max_lon - min_lon) * 0.02).max(0.01);
    let pad_lat = ((max_lat - min_lat) * 0.02).max(0.01);
    Some((
        min_lon - pad_lon,
        min_lat - pad_lat,
        max_lon + pad_lon,
        max_lat + pad_lat,
    ))
}

/// Invert the map projection: a terminal cell back to lon/lat at the cell
/// center. Rows grow downward, latitude grows upward.
fn cell_to_geo(
    inner: Rect,
    bounds: (f64, f64, f64, f64),
    column: u16,
    row: u16,
) -> Option<(f64, f64)> {
    if inner.width == 0 || inner.height == 0 || !cell_in_rect((column, row), inner) {
        return None;
    }
    let (min_lon, min_lat, max_lon, max_lat) = bounds;
    let fx = (f64::from(column - inner.x) + 0.5) / f64::from(inner.width);
    let fy = (f64::from(row - inner.y) + 0.5) / f64::from(inner.height);
    Some((
        min_lon + fx * (max_lon - min_lon),
        max_lat - fy * (max_lat - min_lat),
    ))
}

/// Scroll window that keeps the cursor visible.
fn ranked_window(cursor: usize, total: usize, visible: usize) -> (usize, usize) {
    if visible == 0 || total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }
    let start = cursor.saturating_sub(visible - 1).min(total - visible);
    (start, start + visible)
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}

fn panel_block(title: &str, focused: bool) -> Block<'_> {
    let block = Block::default().borders(Borders::ALL).title(title.to_owned());
    if focused {
        block.border_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        block
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let rects = layout_rects(frame.area());

    let header = Paragraph::new(header_text(view_data))
        .block(Block::default().borders(Borders::ALL).title("lossmap"));
    frame.render_widget(header, rects.header);

    render_map(frame, rects.map, state, view_data);
    render_search(frame, rects.search, state, view_data);
    render_ranked(frame, rects.ranked, state, view_data);
    render_chart(frame, rects.chart, state, view_data);

    let status = Paragraph::new(status_text(state))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, rects.status);

    if state.focus == PanelKind::Search && view_data.search.open {
        render_search_popover(frame, rects.search, view_data);
    }

    if view_data.help_visible {
        let area = centered_rect(64, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn header_text(view_data: &ViewData) -> String {
    let mut parts = vec!["Texas expected-loss forecast".to_owned()];
    if let Some(run) = view_data.detail.run() {
        parts.push(format!("run {run}"));
    }
    if !view_data.index.is_empty() {
        parts.push(format!("{} counties", view_data.index.len()));
        parts.push(format!(
            "peak {}",
            format_currency_short(view_data.index.max_loss())
        ));
    }
    parts.join("  |  ")
}

fn status_text(state: &AppState) -> String {
    match &state.status_line {
        Some(message) => message.clone(),
        None => format!(
            "[{}] tab: focus  /: search  enter: select  r: reload  ?: help  q: quit",
            state.focus.label()
        ),
    }
}

fn help_overlay_text() -> String {
    [
        "tab / shift-tab   cycle panel focus",
        "/                 focus the search box",
        "type              filter counties (top 3 matches)",
        "up/down           move through suggestions or the ranked list",
        "enter             select the highlighted county",
        "esc               close the suggestion popover",
        "click on the map  select the county under the cursor",
        "n / p             step the map selection through the ranking",
        "left/right        move the chart readout cursor",
        "r                 reload the county list (re-pins the run)",
        "q / ctrl-q        quit",
    ]
    .join("\n")
}

fn render_map(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let block = panel_block("map", state.focus == PanelKind::Map);

    let Some(bounds) = map_bounds(&view_data.atlas) else {
        let placeholder = Paragraph::new(
            "no county topology loaded\nset [map] counties_path or run with --demo",
        )
        .block(block);
        frame.render_widget(placeholder, area);
        return;
    };

    let selected = view_data
        .detail
        .selection()
        .map(|selection| selection.fips.clone());
    let max_loss = view_data.index.max_loss();

    let canvas = Canvas::default()
        .block(block)
        .marker(symbols::Marker::Braille)
        .x_bounds([bounds.0, bounds.2])
        .y_bounds([bounds.1, bounds.3])
        .paint(|ctx| {
            for shape in view_data.atlas.shapes() {
                if selected.as_deref() == Some(shape.fips.as_str()) {
                    continue;
                }
                let color = match view_data.index.get(&shape.fips) {
                    Some(summary) => rgb(shade(summary.el_total_sum, max_loss)),
                    None => rgb(SHADE_NEUTRAL),
                };
                draw_shape(ctx, shape, color);
            }

            // Selected county last, re-stroked in the highlight color.
            if let Some(fips) = &selected
                && let Some(shape) = view_data.atlas.get(fips)
            {
                draw_shape(ctx, shape, Color::White);
                if let (Some((lon, lat)), Some(selection)) =
                    (view_data.selection_centroid, view_data.detail.selection())
                {
                    ctx.print(
                        lon,
                        lat,
                        Span::styled(
                            selection.name.clone(),
                            Style::default()
                                .fg(Color::White)
                                .add_modifier(Modifier::BOLD),
                        ),
                    );
                }
            }
        });
    frame.render_widget(canvas, area);
}

fn draw_shape(ctx: &mut ratatui::widgets::canvas::Context<'_>, shape: &CountyShape, color: Color) {
    for ring in &shape.rings {
        for segment in ring.windows(2) {
            ctx.draw(&CanvasLine {
                x1: segment[0].0,
                y1: segment[0].1,
                x2: segment[1].0,
                y2: segment[1].1,
                color,
            });
        }
    }
}

fn render_search(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let focused = state.focus == PanelKind::Search;
    let content = if focused {
        format!("{}_", view_data.search.query)
    } else if view_data.search.query.is_empty() {
        "press / to search".to_owned()
    } else {
        view_data.search.query.clone()
    };
    let search = Paragraph::new(content).block(panel_block("search", focused));
    frame.render_widget(search, area);
}

fn render_search_popover(frame: &mut ratatui::Frame<'_>, search_area: Rect, view_data: &ViewData) {
    let suggestions = view_data.index.suggestions(&view_data.search.query);
    if suggestions.is_empty() {
        return;
    }
    let frame_area = frame.area();
    let height = (suggestions.len() as u16 + 2).min(frame_area.height.saturating_sub(search_area.bottom()));
    if height < 3 {
        return;
    }
    let area = Rect::new(
        search_area.x,
        search_area.bottom(),
        search_area.width,
        height,
    );
    frame.render_widget(Clear, area);
    let popover = Paragraph::new(search_popover_text(view_data))
        .block(Block::default().borders(Borders::ALL).title("matches"));
    frame.render_widget(popover, area);
}

fn search_popover_text(view_data: &ViewData) -> String {
    view_data
        .index
        .suggestions(&view_data.search.query)
        .iter()
        .enumerate()
        .map(|(index, county)| {
            let marker = if index == view_data.search.active {
                ">"
            } else {
                " "
            };
            format!(
                "{marker} {:<14} {}",
                county.name,
                format_currency_short(county.el_total_sum)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_ranked(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let focused = state.focus == PanelKind::Ranked;
    let block = panel_block("highest risk", focused);

    if view_data.index.is_empty() {
        let placeholder = Paragraph::new("no counties loaded").block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let inner = area.inner(Margin {
        horizontal: 1,
        vertical: 1,
    });
    let visible = inner.height.saturating_sub(1) as usize;
    let ranked = view_data.index.ranked();
    let (start, end) = ranked_window(view_data.ranked_cursor, ranked.len(), visible);
    let selected_fips = view_data
        .detail
        .selection()
        .map(|selection| selection.fips.clone());

    let rows: Vec<Row> = ranked[start..end]
        .iter()
        .enumerate()
        .map(|(offset, county)| {
            let rank = start + offset;
            let is_cursor = rank == view_data.ranked_cursor;
            let is_selected =
                selected_fips.as_deref() == Some(normalize_fips(&county.fips).as_str());
            let mut style = Style::default();
            if is_selected {
                style = style.fg(Color::White).add_modifier(Modifier::BOLD);
            }
            if is_cursor && focused {
                style = style.bg(Color::DarkGray);
            }
            Row::new(vec![
                Cell::from(format!("{}", rank + 1)),
                Cell::from(county.name.clone()),
                Cell::from(format_currency_short(county.el_total_sum)),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(10),
        ],
    )
    .header(
        Row::new(vec!["#", "county", "loss"]).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
    )
    .block(block);
    frame.render_widget(table, area);
}

fn render_chart(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let focused = state.focus == PanelKind::Chart;
    let title = match view_data.detail.selection() {
        Some(selection) => format!("cumulative loss | {} ({})", selection.name, selection.fips),
        None => "cumulative loss".to_owned(),
    };
    let block = panel_block(&title, focused);

    let series = match view_data.detail.phase() {
        DetailPhase::Idle => {
            let placeholder =
                Paragraph::new("select a county to load its series").block(block);
            frame.render_widget(placeholder, area);
            return;
        }
        DetailPhase::Loading => {
            let placeholder = Paragraph::new("loading series...").block(block);
            frame.render_widget(placeholder, area);
            return;
        }
        DetailPhase::Failed(message) => {
            let error = Paragraph::new(message.clone())
                .style(Style::default().fg(Color::Red))
                .block(block);
            frame.render_widget(error, area);
            return;
        }
        DetailPhase::Loaded(series) if series.is_empty() => {
            let placeholder = Paragraph::new("no series data").block(block);
            frame.render_widget(placeholder, area);
            return;
        }
        DetailPhase::Loaded(series) => series,
    };

    let split = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(block.inner(area));
    frame.render_widget(block, area);

    let data: Vec<(f64, f64)> = series
        .iter()
        .map(|point| (point.dt.unix_timestamp() as f64, point.el_cum))
        .collect();

    let x_min = data.first().map_or(0.0, |point| point.0);
    let x_max = data.last().map_or(1.0, |point| point.0).max(x_min + 1.0);
    let y_min = data.iter().map(|point| point.1).fold(0.0_f64, f64::min);
    let y_max = data
        .iter()
        .map(|point| point.1)
        .fold(f64::NEG_INFINITY, f64::max)
        .max(y_min + 1.0);

    let mid = series.len() / 2;
    let x_labels = vec![
        Span::raw(format_month_yy(series[0].dt)),
        Span::raw(format_month_yy(series[mid].dt)),
        Span::raw(format_month_yy(series[series.len() - 1].dt)),
    ];
    let y_labels = vec![
        Span::raw(format_currency_short(y_min)),
        Span::raw(format_currency_short((y_min + y_max) / 2.0)),
        Span::raw(format_currency_short(y_max)),
    ];

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::LightRed))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .x_axis(
            Axis::default()
                .bounds([x_min, x_max])
                .labels(x_labels)
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([y_min, y_max])
                .labels(y_labels)
                .style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(chart, split[0]);

    let readout = Paragraph::new(chart_readout_text(series, view_data.chart_cursor))
        .style(Style::default().fg(Color::Gray));
    frame.render_widget(readout, split[1]);
}

/// The terminal's tooltip: the cursor point's UTC time, cumulative total,
/// and step value.
fn chart_readout_text(series: &[CumulativePoint], cursor: usize) -> String {
    let Some(point) = series.get(cursor.min(series.len().saturating_sub(1))) else {
        return String::new();
    };
    format!(
        "{}  cum {}  step {}  [{}/{}]",
        format_timestamp_utc(point.dt),
        format_currency_short(point.el_cum),
        format_currency_short(point.el_total),
        cursor.min(series.len() - 1) + 1,
        series.len()
    )
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
