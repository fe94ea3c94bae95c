//! Ratatui-based terminal UI.
//!
//! Two tabs, each with its own filters:
//! - Explore: group by one or two dimensions and show the recommended chart
//!   (year range and gender filters)
//! - Forecast: pick a dimension value and project its yearly counts forward
//!   (year range plus a multi-select for every dimension with few values)
//!
//! Every key press recomputes the active views synchronously from the cached
//! catalog.

use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs},
};

use crate::app::pipeline::{ExploreView, ForecastView, run_explore, run_forecast};
use crate::domain::{
    Aggregation, ChartKind, CountSeries, CountTable, DashboardConfig, DimValue, Dimension, ExploreQuery,
    ForecastQuery, DEFAULT_HORIZON, MAX_HORIZON,
};
use crate::error::{AppError, NoDataError};
use crate::io::cache::CatalogCache;
use crate::io::ingest::IngestedCatalog;
use crate::query::filter::{FilterSelection, FilteredView, MAX_FILTER_CHOICES};

mod plotters_chart;

use plotters_chart::{TrendLine, TrendPlottersChart};

/// Series colours (RGB), shared by the plotters lines and the ratatui legend.
const PALETTE: [(u8, u8, u8); 8] = [
    (0, 255, 255),
    (255, 215, 0),
    (0, 255, 0),
    (255, 0, 255),
    (255, 99, 71),
    (135, 206, 250),
    (255, 165, 0),
    (200, 200, 200),
];

/// Start the TUI.
pub fn run(config: DashboardConfig) -> Result<(), AppError> {
    // Load before touching the terminal so load errors print normally.
    let mut app = App::new(config)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Explore,
    Forecast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    GroupBy,
    CompareBy,
    ForecastDim,
    ForecastValue,
    Horizon,
    YearMin,
    YearMax,
    /// Multi-select over the values of one dimension.
    Filter(Dimension),
}

/// Every categorical dimension can be forecast, however many values it has.
const FORECAST_DIMS: [Dimension; 7] = [
    Dimension::Gender,
    Dimension::MasterCategory,
    Dimension::SubCategory,
    Dimension::ArticleType,
    Dimension::BaseColour,
    Dimension::Season,
    Dimension::Usage,
];

struct App {
    config: DashboardConfig,
    cache: CatalogCache,
    ingest: Arc<IngestedCatalog>,
    tab: Tab,
    selected_field: usize,

    /// Explore filters: year range and gender.
    explore_filter: FilterSelection,
    /// Forecast filters: year range and every dimension in `filter_dims`.
    forecast_filter: FilterSelection,
    year_bounds: (i32, i32),
    /// Categorical dimensions narrow enough to offer as multi-select filters.
    filter_dims: Vec<Dimension>,
    /// Selectable values per filter dimension (gender is always present).
    choices: BTreeMap<Dimension, Vec<DimValue>>,
    cursors: BTreeMap<Dimension, usize>,

    group_by: Dimension,
    compare_by: Option<Dimension>,

    forecast_dim: Dimension,
    /// Sorted values of `forecast_dim` present under `forecast_filter`.
    forecast_values: Vec<DimValue>,
    value_idx: usize,
    horizon: u32,

    explore: Option<ExploreView>,
    forecast: Result<ForecastView, NoDataError>,
    status: String,
}

impl App {
    fn new(config: DashboardConfig) -> Result<Self, AppError> {
        let mut cache = CatalogCache::new();
        let ingest = cache.get_or_load(&config.catalog_path)?;

        let mut app = Self {
            config,
            cache,
            ingest,
            tab: Tab::Explore,
            selected_field: 0,
            explore_filter: FilterSelection::new(),
            forecast_filter: FilterSelection::new(),
            year_bounds: (0, 0),
            filter_dims: Vec::new(),
            choices: BTreeMap::new(),
            cursors: BTreeMap::new(),
            group_by: Dimension::Year,
            compare_by: Some(Dimension::BaseColour),
            forecast_dim: Dimension::BaseColour,
            forecast_values: Vec::new(),
            value_idx: 0,
            horizon: DEFAULT_HORIZON,
            explore: None,
            forecast: Err(NoDataError::new("nothing selected")),
            status: String::new(),
        };
        app.reset_choices();
        app.recompute();
        app.status = "Ready.".to_string();
        Ok(app)
    }

    /// Rebuild everything that depends on the catalog contents.
    ///
    /// Filters start with every choice selected. The selection is stored as an
    /// explicit set, so records without a value in a filtered dimension are
    /// left out from the start.
    fn reset_choices(&mut self) {
        let all = FilteredView::all(&self.ingest.catalog);
        self.year_bounds = self.ingest.catalog.year_bounds().unwrap_or((0, 0));
        self.filter_dims = all
            .filterable_dimensions(MAX_FILTER_CHOICES)
            .into_iter()
            .filter(|d| !d.is_temporal())
            .collect();

        let mut choices = BTreeMap::new();
        for dim in std::iter::once(Dimension::Gender).chain(self.filter_dims.iter().copied()) {
            choices.insert(dim, all.distinct_values(dim));
        }
        self.choices = choices;
        self.cursors.clear();

        let (lo, hi) = self.year_bounds;
        let mut explore = FilterSelection::new().with_year_range(Some(lo), Some(hi));
        explore.set_allowed(Dimension::Gender, self.choices_for(Dimension::Gender).to_vec());
        let mut forecast = FilterSelection::new().with_year_range(Some(lo), Some(hi));
        for dim in &self.filter_dims {
            forecast.set_allowed(*dim, self.choices_for(*dim).to_vec());
        }
        self.explore_filter = explore;
        self.forecast_filter = forecast;

        self.forecast_values.clear();
        self.value_idx = 0;
    }

    fn choices_for(&self, dim: Dimension) -> &[DimValue] {
        self.choices.get(&dim).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Recompute the value choices from the current forecast selection, keeping
    /// the chosen value while it is still available.
    fn refresh_forecast_values(&mut self) {
        let current = self.forecast_values.get(self.value_idx).cloned();
        self.forecast_values = self
            .forecast_filter
            .apply(&self.ingest.catalog)
            .distinct_values(self.forecast_dim);
        self.value_idx = current
            .and_then(|v| self.forecast_values.iter().position(|x| *x == v))
            .unwrap_or(0);
    }

    fn recompute(&mut self) {
        self.refresh_forecast_values();
        let catalog = &self.ingest.catalog;

        let explore = ExploreQuery {
            filter: self.explore_filter.clone(),
            group_by: self.group_by,
            compare_by: self.compare_by,
            max_series: self.config.max_series,
        };
        self.explore = Some(run_explore(catalog, &explore));

        self.forecast = match self.forecast_values.get(self.value_idx) {
            Some(value) => run_forecast(
                catalog,
                &ForecastQuery {
                    filter: self.forecast_filter.clone(),
                    dimension: self.forecast_dim,
                    value: value.clone(),
                    horizon: self.horizon,
                },
            ),
            None => Err(NoDataError::new(format!("no {} values", self.forecast_dim))),
        };
    }

    fn fields(&self) -> Vec<Field> {
        match self.tab {
            Tab::Explore => vec![
                Field::GroupBy,
                Field::CompareBy,
                Field::YearMin,
                Field::YearMax,
                Field::Filter(Dimension::Gender),
            ],
            Tab::Forecast => {
                let mut fields = vec![
                    Field::ForecastDim,
                    Field::ForecastValue,
                    Field::Horizon,
                    Field::YearMin,
                    Field::YearMax,
                ];
                fields.extend(self.filter_dims.iter().map(|d| Field::Filter(*d)));
                fields
            }
        }
    }

    fn selected(&self) -> Option<Field> {
        self.fields().get(self.selected_field).copied()
    }

    fn active_filter(&self) -> &FilterSelection {
        match self.tab {
            Tab::Explore => &self.explore_filter,
            Tab::Forecast => &self.forecast_filter,
        }
    }

    fn active_filter_mut(&mut self) -> &mut FilterSelection {
        match self.tab {
            Tab::Explore => &mut self.explore_filter,
            Tab::Forecast => &mut self.forecast_filter,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab | KeyCode::BackTab => {
                self.tab = match self.tab {
                    Tab::Explore => Tab::Forecast,
                    Tab::Forecast => Tab::Explore,
                };
                self.selected_field = 0;
            }
            KeyCode::Up => {
                self.selected_field = self.selected_field.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_field + 1 < self.fields().len() {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_selected(),
            KeyCode::Char('c') => {
                self.reset_choices();
                self.recompute();
                self.status = "Filters cleared.".to_string();
            }
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
        false
    }

    fn adjust_field(&mut self, delta: i32) {
        let forward = delta >= 0;
        let Some(field) = self.selected() else {
            return;
        };

        match field {
            Field::GroupBy => {
                self.group_by = if forward { self.group_by.next() } else { self.group_by.prev() };
                self.status = format!("group by: {}", self.group_by.display_name());
            }
            Field::CompareBy => {
                self.compare_by = cycle_optional(self.compare_by, forward);
                self.status = format!(
                    "compare by: {}",
                    self.compare_by.map(Dimension::display_name).unwrap_or("none")
                );
            }
            Field::ForecastDim => {
                self.forecast_dim = cycle_choice(&FORECAST_DIMS, self.forecast_dim, forward);
                self.forecast_values.clear();
                self.value_idx = 0;
                self.status = format!("forecast dimension: {}", self.forecast_dim.display_name());
            }
            Field::ForecastValue => {
                let n = self.forecast_values.len();
                if n > 0 {
                    self.value_idx = if forward { (self.value_idx + 1) % n } else { (self.value_idx + n - 1) % n };
                }
            }
            Field::Horizon => {
                self.horizon = if forward {
                    (self.horizon + 1).min(MAX_HORIZON)
                } else {
                    self.horizon.saturating_sub(1).max(1)
                };
                self.status = format!("horizon: {}y", self.horizon);
            }
            Field::YearMin => {
                let (lo, hi_bound) = self.year_bounds;
                let filter = self.active_filter_mut();
                let hi = filter.year_max.unwrap_or(hi_bound);
                let cur = filter.year_min.unwrap_or(lo);
                filter.year_min = Some((cur + delta.signum()).clamp(lo, hi));
            }
            Field::YearMax => {
                let (lo_bound, hi) = self.year_bounds;
                let filter = self.active_filter_mut();
                let lo = filter.year_min.unwrap_or(lo_bound);
                let cur = filter.year_max.unwrap_or(hi);
                filter.year_max = Some((cur + delta.signum()).clamp(lo, hi));
            }
            Field::Filter(dim) => {
                let n = self.choices_for(dim).len();
                if n > 0 {
                    let cursor = self.cursors.entry(dim).or_insert(0);
                    *cursor = if forward { (*cursor + 1) % n } else { (*cursor + n - 1) % n };
                }
                return;
            }
        }
        self.recompute();
    }

    /// Flip the value under the cursor of the selected filter field.
    fn toggle_selected(&mut self) {
        let Some(Field::Filter(dim)) = self.selected() else {
            return;
        };
        let cursor = self.cursors.get(&dim).copied().unwrap_or(0);
        let universe = self.choices_for(dim).to_vec();
        let Some(value) = universe.get(cursor).cloned() else {
            return;
        };

        let filter = self.active_filter_mut();
        filter.toggle(dim, &value, &universe);
        let state = if filter.is_allowed(dim, &value) { "on" } else { "off" };
        self.status = format!("{} {value}: {state}", dim.display_name());
        self.recompute();
    }

    fn reload(&mut self) {
        let before = self.cache.loads();
        match self.cache.get_or_load(&self.config.catalog_path) {
            Ok(ingest) => {
                self.ingest = ingest;
                if self.cache.loads() > before {
                    self.reset_choices();
                    self.status = "Catalog reloaded.".to_string();
                } else {
                    self.status = "Catalog unchanged.".to_string();
                }
                self.recompute();
            }
            Err(err) => {
                self.status = format!("Reload failed: {err}");
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_tabs(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_tabs(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let selected = match self.tab {
            Tab::Explore => 0,
            Tab::Forecast => 1,
        };
        let tabs = Tabs::new(vec!["Explore", "Forecast"])
            .select(selected)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(Span::styled("ft - fashion trends", Style::default().fg(Color::Cyan))),
            )
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(34), Constraint::Min(0)])
            .split(area);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(columns[1]);

        self.draw_settings(frame, columns[0]);
        match self.tab {
            Tab::Explore => self.draw_explore(frame, right[0]),
            Tab::Forecast => self.draw_forecast(frame, right[0]),
        }
        self.draw_insight(frame, right[1]);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .fields()
            .into_iter()
            .map(|field| ListItem::new(self.field_line(field)))
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn field_line(&self, field: Field) -> Line<'static> {
        let text = match field {
            Field::GroupBy => format!("Group by: {}", self.group_by.display_name()),
            Field::CompareBy => format!(
                "Compare by: {}",
                self.compare_by.map(Dimension::display_name).unwrap_or("none")
            ),
            Field::ForecastDim => format!("Dimension: {}", self.forecast_dim.display_name()),
            Field::ForecastValue => format!(
                "Value: {}",
                self.forecast_values
                    .get(self.value_idx)
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "-".to_string())
            ),
            Field::Horizon => format!("Horizon: {}y", self.horizon),
            Field::YearMin => format!("Year from: {}", fmt_opt_year(self.active_filter().year_min)),
            Field::YearMax => format!("Year to: {}", fmt_opt_year(self.active_filter().year_max)),
            Field::Filter(dim) => {
                let values = self.choices_for(dim);
                let filter = self.active_filter();
                let selected = values.iter().filter(|v| filter.is_allowed(dim, v)).count();
                let cursor = self.cursors.get(&dim).copied().unwrap_or(0);
                let mut spans = vec![Span::raw(format!("{}: ", dim.display_name()))];
                if let Some(value) = values.get(cursor) {
                    let style = if filter.is_allowed(dim, value) {
                        Style::default().fg(Color::Green)
                    } else {
                        Style::default().fg(Color::DarkGray)
                    };
                    spans.push(Span::styled(format!("‹{value}›"), style.add_modifier(Modifier::UNDERLINED)));
                }
                spans.push(Span::raw(format!(" {selected}/{}", values.len())));
                return Line::from(spans);
            }
        };
        Line::from(text)
    }

    fn draw_explore(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(view) = &self.explore else {
            return;
        };
        let title = format!(
            "{} | {} products | chart: {}",
            match view.compare_by {
                Some(d2) => format!("{} x {}", view.group_by.display_name(), d2.display_name()),
                None => view.group_by.display_name().to_string(),
            },
            view.filtered_rows,
            view.chart.display_name()
        );
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        if view.aggregation.is_empty() {
            draw_no_data(frame, inner);
            return;
        }

        match (&view.aggregation, view.chart) {
            (Aggregation::Single(series), ChartKind::Line) => {
                let mut points: Vec<(f64, f64)> = series
                    .entries
                    .iter()
                    .filter_map(|(k, c)| year_value(k).map(|y| (y, *c as f64)))
                    .collect();
                points.sort_by(|a, b| a.0.total_cmp(&b.0));
                let lines = vec![TrendLine {
                    points,
                    color: plotters_color(0),
                    markers: true,
                }];
                draw_trend_chart(frame, inner, &lines, &[]);
            }
            (Aggregation::Pair(table), ChartKind::Line) => {
                let (lines, legend) = pair_lines(table);
                draw_trend_chart(frame, inner, &lines, &legend);
            }
            (Aggregation::Single(series), ChartKind::Pie) => draw_shares(frame, inner, series),
            (Aggregation::Single(series), ChartKind::Bar) => draw_bars(frame, inner, series),
            (Aggregation::Pair(table), _) => {
                let width = inner.width as usize;
                let text = crate::plot::render_stacked_bars(table, width);
                frame.render_widget(Paragraph::new(text), inner);
            }
        }
    }

    fn draw_forecast(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let view = match &self.forecast {
            Ok(view) => view,
            Err(_) => {
                let block = Block::default().title("Forecast").borders(Borders::ALL);
                let inner = block.inner(area);
                frame.render_widget(block, area);
                draw_no_data(frame, inner);
                return;
            }
        };

        let block = Block::default()
            .title(format!(
                "{} = '{}' | +{}y | trend: {}",
                view.dimension.display_name(),
                view.value,
                view.horizon,
                view.direction.label()
            ))
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let observed: Vec<(f64, f64)> = view.history.iter().map(|(&y, &c)| (y as f64, c as f64)).collect();
        let mut projected: Vec<(f64, f64)> = observed.last().copied().into_iter().collect();
        projected.extend(view.forecast.iter().map(|(&y, &c)| (y as f64, c as f64)));

        let lines = vec![
            TrendLine {
                points: observed,
                color: plotters_color(0),
                markers: true,
            },
            TrendLine {
                points: projected,
                color: plotters_color(1),
                markers: true,
            },
        ];
        let legend = vec![
            ("historical".to_string(), ratatui_color(0)),
            ("forecast".to_string(), ratatui_color(1)),
        ];
        draw_trend_chart(frame, inner, &lines, &legend);
    }

    fn draw_insight(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let (text, style) = match self.tab {
            Tab::Explore => match self.explore.as_ref().and_then(|v| v.insight.clone()) {
                Some(insight) => (insight, Style::default().fg(Color::White)),
                None => (no_data_message(), Style::default().fg(Color::Yellow)),
            },
            Tab::Forecast => match &self.forecast {
                Ok(view) => (view.insight.clone(), Style::default().fg(Color::White)),
                Err(err) => (err.to_string(), Style::default().fg(Color::Yellow)),
            },
        };
        let p = Paragraph::new(text)
            .style(style)
            .block(Block::default().title("Insight").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "Tab view  ↑/↓ select  ←/→ adjust  Space toggle  c clear  r reload  q quit";
        let load = &self.ingest;
        let diagnostics = format!(
            "rows {} | used {} | skipped {}",
            load.rows_read,
            load.rows_used,
            load.rows_skipped()
        );
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(diagnostics, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn cycle_optional(cur: Option<Dimension>, forward: bool) -> Option<Dimension> {
    let first = Dimension::ALL[0];
    let last = Dimension::ALL[Dimension::ALL.len() - 1];
    match (cur, forward) {
        (None, true) => Some(first),
        (None, false) => Some(last),
        (Some(d), true) if d == last => None,
        (Some(d), false) if d == first => None,
        (Some(d), true) => Some(d.next()),
        (Some(d), false) => Some(d.prev()),
    }
}

/// Step through `choices`, wrapping at both ends. A `cur` outside `choices` moves to the first entry.
fn cycle_choice(choices: &[Dimension], cur: Dimension, forward: bool) -> Dimension {
    let n = choices.len();
    match choices.iter().position(|d| *d == cur) {
        _ if n == 0 => cur,
        None => choices[0],
        Some(i) if forward => choices[(i + 1) % n],
        Some(i) => choices[(i + n - 1) % n],
    }
}

fn no_data_message() -> String {
    NoDataError::new("current filters").to_string()
}

fn draw_no_data(frame: &mut ratatui::Frame<'_>, area: Rect) {
    let msg = Paragraph::new(no_data_message())
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center);
    frame.render_widget(msg, area);
}

fn fmt_opt_year(y: Option<i32>) -> String {
    y.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string())
}

fn year_value(value: &DimValue) -> Option<f64> {
    match value {
        DimValue::Year(y) => Some(*y as f64),
        DimValue::Text(_) => None,
    }
}

fn plotters_color(i: usize) -> RGBColor {
    let (r, g, b) = PALETTE[i % PALETTE.len()];
    RGBColor(r, g, b)
}

fn ratatui_color(i: usize) -> Color {
    let (r, g, b) = PALETTE[i % PALETTE.len()];
    Color::Rgb(r, g, b)
}

/// One coloured line per column value of a year-by-dimension table.
fn pair_lines(table: &CountTable) -> (Vec<TrendLine>, Vec<(String, Color)>) {
    let mut lines = Vec::with_capacity(table.columns.len());
    let mut legend = Vec::with_capacity(table.columns.len());
    for (col, value) in table.columns.iter().enumerate() {
        let points = table
            .column_series(col)
            .iter()
            .filter_map(|(k, c)| year_value(k).map(|y| (y, *c as f64)))
            .collect();
        lines.push(TrendLine {
            points,
            color: plotters_color(col),
            markers: false,
        });
        legend.push((value.to_string(), ratatui_color(col)));
    }
    (lines, legend)
}

fn draw_trend_chart(frame: &mut ratatui::Frame<'_>, area: Rect, lines: &[TrendLine], legend: &[(String, Color)]) {
    let (chart_area, legend_area) = if legend.is_empty() {
        (area, None)
    } else {
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(area);
        (parts[0], Some(parts[1]))
    };

    let (x_bounds, y_bounds) = chart_bounds(lines);
    let (chart_rect, insets) = chart_layout(chart_area);
    let widget = TrendPlottersChart {
        lines,
        x_bounds,
        y_bounds,
        x_label: "year",
        y_label: "products",
        fmt_x: fmt_axis_year,
        fmt_y: fmt_axis_count,
    };
    frame.render_widget(widget, chart_rect);
    if let Some(insets) = insets {
        draw_axis_ticks(frame, chart_area, chart_rect, insets, x_bounds, y_bounds);
    }

    if let Some(rect) = legend_area {
        let spans: Vec<Span> = legend
            .iter()
            .flat_map(|(label, color)| {
                [
                    Span::styled("■ ", Style::default().fg(*color)),
                    Span::raw(format!("{label}  ")),
                ]
            })
            .collect();
        frame.render_widget(Paragraph::new(Line::from(spans)), rect);
    }
}

/// X/Y bounds over every line, with flat ranges widened and Y padded by 5%.
fn chart_bounds(lines: &[TrendLine]) -> ([f64; 2], [f64; 2]) {
    let (mut x0, mut x1) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y0, mut y1) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in lines.iter().flat_map(|l| l.points.iter()) {
        x0 = x0.min(x);
        x1 = x1.max(x);
        y0 = y0.min(y);
        y1 = y1.max(y);
    }

    if !x0.is_finite() || !x1.is_finite() {
        (x0, x1) = (0.0, 1.0);
    } else if x1 <= x0 {
        (x0, x1) = (x0 - 1.0, x1 + 1.0);
    }
    if !y0.is_finite() || !y1.is_finite() {
        (y0, y1) = (0.0, 1.0);
    } else if y1 <= y0 {
        (y0, y1) = (y0 - 1.0, y1 + 1.0);
    }

    let pad = ((y1 - y0).abs() * 0.05).max(1e-12);
    ([x0, x1], [y0 - pad, y1 + pad])
}

/// Pie slices as a list of share bars.
fn draw_shares(frame: &mut ratatui::Frame<'_>, area: Rect, series: &CountSeries) {
    let total = series.total().max(1);
    let bar_room = (area.width as usize).saturating_sub(32).max(5);
    let lines: Vec<Line> = series
        .entries
        .iter()
        .enumerate()
        .map(|(i, (key, count))| {
            let share = *count as f64 / total as f64;
            let len = (share * bar_room as f64).round() as usize;
            Line::from(vec![
                Span::raw(format!("{:<18} ", crate::report::format::truncate(&key.to_string(), 18))),
                Span::styled("█".repeat(len), Style::default().fg(ratatui_color(i))),
                Span::raw(format!(" {:>5.1}% ({count})", share * 100.0)),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(Text::from(lines)), area);
}

fn draw_bars(frame: &mut ratatui::Frame<'_>, area: Rect, series: &CountSeries) {
    let bars: Vec<Bar> = series
        .entries
        .iter()
        .map(|(key, count)| {
            Bar::default()
                .value(*count)
                .label(Line::from(crate::report::format::truncate(&key.to_string(), 16)))
                .style(Style::default().fg(Color::Cyan))
        })
        .collect();
    let chart = BarChart::default()
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

fn fmt_axis_year(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_count(v: f64) -> String {
    format!("{v:.0}")
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = fmt_axis_year(x_val);
        let label_len = label.len() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = fmt_axis_count(y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("year")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new("count")
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}
