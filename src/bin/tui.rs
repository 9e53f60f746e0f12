use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use crossterm::{event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Frame, Terminal, widgets::{Block, Borders, List, ListItem, Paragraph, ListState, Wrap}, layout::{Layout, Constraint, Direction}, style::{Style, Modifier, Color}, text::{Line, Span}};

use please_do::{
    application::todo_service::{TodoService, TodoServiceImpl},
    config::Config,
    domain::{
        analytics::{AnalyticsReport, CompletionSeries, TimeWindow},
        todo::{Category, DueStatus, EditTodo, NewTodo, Priority, Todo},
        view::{Progress, StatusFilter, TodoFilter},
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_logging()?;
    let config = Config::from_env()?;
    let repo = config.storage.open().await?;
    let service = TodoServiceImpl::open(repo).await;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, service).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

/// Logs go to the file named by `PLEASE_DO_LOG`; the alternate screen owns stdout.
fn init_logging() -> Result<()> {
    let Ok(path) = std::env::var("PLEASE_DO_LOG") else { return Ok(()) };
    let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode { View, Create, Edit, Subtask }

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field { Text, Priority, Category, Due }

impl Field {
    fn next(self, mode: Mode) -> Self {
        match (mode, self) {
            (Mode::Edit, Field::Text) => Field::Due,
            (Mode::Edit, _) => Field::Text,
            (_, Field::Text) => Field::Priority,
            (_, Field::Priority) => Field::Category,
            (_, Field::Category) => Field::Due,
            (_, Field::Due) => Field::Text,
        }
    }

    fn label(self) -> &'static str {
        match self { Field::Text => "Text", Field::Priority => "Priority", Field::Category => "Category", Field::Due => "Due (YYYY-MM-DD)" }
    }
}

struct Draft {
    text: String,
    priority: Priority,
    category: Category,
    due: String,
}

impl Default for Draft {
    fn default() -> Self { Self { text: String::new(), priority: Priority::Medium, category: Category::Personal, due: String::new() } }
}

struct App<S: TodoService> {
    service: S,
    items: Vec<Todo>,
    progress: Progress,
    selected: usize,
    subtask_selected: usize,
    last_tick: Instant,
    mode: Mode,
    list_state: ListState,
    filter: TodoFilter,
    category_focus: Option<usize>,
    field: Field,
    draft: Draft,
    show_analytics: bool,
    window: TimeWindow,
    report: Option<AnalyticsReport>,
    message: String,
}

impl<S: TodoService> App<S> {
    fn new(service: S) -> Self {
        App {
            service,
            items: vec![],
            progress: Progress { completed: 0, total: 0, percent: 0.0 },
            selected: 0,
            subtask_selected: 0,
            last_tick: Instant::now(),
            mode: Mode::View,
            list_state: ListState::default(),
            filter: TodoFilter::default(),
            category_focus: None,
            field: Field::Text,
            draft: Draft::default(),
            show_analytics: false,
            window: TimeWindow::SevenDays,
            report: None,
            message: String::new(),
        }
    }

    async fn load(&mut self) {
        self.items = self.service.visible(&self.filter).await;
        self.progress = self.service.progress().await;
        self.report = if self.show_analytics { Some(self.service.analytics(self.window).await) } else { None };
        // Clamp selection within visible bounds
        let len = self.items.len();
        if len == 0 { self.selected = 0; self.list_state.select(None); }
        else { if self.selected >= len { self.selected = len - 1; } self.list_state.select(Some(self.selected)); }
        let subtasks = self.selected_todo().map_or(0, |t| t.subtasks.len());
        if self.subtask_selected >= subtasks { self.subtask_selected = subtasks.saturating_sub(1); }
    }

    fn selected_todo(&self) -> Option<&Todo> { self.items.get(self.selected) }

    fn category_label(&self) -> String {
        match self.category_focus { None => "all".to_string(), Some(i) => Category::ALL[i].to_string() }
    }

    fn cycle_category_filter(&mut self) {
        self.category_focus = match self.category_focus {
            None => Some(0),
            Some(i) if i + 1 < Category::ALL.len() => Some(i + 1),
            Some(_) => None,
        };
        self.filter.categories = match self.category_focus {
            None => Category::ALL.into_iter().collect(),
            Some(i) => [Category::ALL[i]].into_iter().collect(),
        };
    }

    fn start_form(&mut self, mode: Mode) {
        self.mode = mode;
        self.field = Field::Text;
        self.draft = Draft::default();
        if mode == Mode::Edit {
            if let Some(todo) = self.selected_todo() {
                let text = todo.text.clone();
                let due = todo.due_date.map(|d| d.with_timezone(&Local).format("%Y-%m-%d").to_string()).unwrap_or_default();
                self.draft.text = text;
                self.draft.due = due;
            }
        }
    }

    /// Returns `true` when the user asked to quit.
    async fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.mode {
            Mode::View => return self.handle_view_key(key).await,
            Mode::Create | Mode::Edit | Mode::Subtask => self.handle_form_key(key).await,
        }
        false
    }

    async fn handle_view_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => { if self.selected > 0 { self.selected -= 1; self.subtask_selected = 0; } }
            KeyCode::Down => { if self.selected + 1 < self.items.len() { self.selected += 1; self.subtask_selected = 0; } }
            KeyCode::Enter => {
                if let Some(id) = self.selected_todo().map(|t| t.id) {
                    self.service.toggle(id).await;
                    self.load().await;
                }
            }
            KeyCode::Char('n') => self.start_form(Mode::Create),
            KeyCode::Char('e') => { if self.selected_todo().is_some() { self.start_form(Mode::Edit); } }
            KeyCode::Char('s') => { if self.selected_todo().is_some() { self.start_form(Mode::Subtask); } }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_todo().map(|t| t.id) {
                    self.service.remove(id).await;
                    if self.selected > 0 { self.selected -= 1; }
                    self.load().await;
                }
            }
            KeyCode::Tab => {
                let len = self.selected_todo().map_or(0, |t| t.subtasks.len());
                if len > 0 { self.subtask_selected = (self.subtask_selected + 1) % len; }
            }
            KeyCode::Char('x') | KeyCode::Char('X') => {
                let target = self.selected_todo().and_then(|t| t.subtasks.get(self.subtask_selected).map(|s| (t.id, s.id)));
                if let Some((id, subtask_id)) = target {
                    if key.code == KeyCode::Char('x') { self.service.toggle_subtask(id, subtask_id).await; }
                    else { self.service.remove_subtask(id, subtask_id).await; }
                    self.load().await;
                }
            }
            KeyCode::Char('f') => {
                self.filter.status = match self.filter.status { StatusFilter::All => StatusFilter::Pending, StatusFilter::Pending => StatusFilter::Completed, StatusFilter::Completed => StatusFilter::All };
                self.load().await;
            }
            KeyCode::Char('c') => { self.cycle_category_filter(); self.load().await; }
            KeyCode::Char('a') => { self.show_analytics = !self.show_analytics; self.load().await; }
            KeyCode::Char('w') => { self.window = self.window.next(); self.load().await; }
            _ => {}
        }
        false
    }

    async fn handle_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => { self.mode = Mode::View; self.message.clear(); }
            KeyCode::Enter => {
                self.submit().await;
                self.load().await;
            }
            KeyCode::Tab => { if self.mode != Mode::Subtask { self.field = self.field.next(self.mode); } }
            KeyCode::Left | KeyCode::Right => {
                let forward = key.code == KeyCode::Right;
                match self.field {
                    Field::Priority => self.draft.priority = cycle(&Priority::ALL, self.draft.priority, forward),
                    Field::Category => self.draft.category = cycle(&Category::ALL, self.draft.category, forward),
                    Field::Text | Field::Due => {}
                }
            }
            KeyCode::Backspace => { if let Some(buf) = self.active_buffer() { buf.pop(); } }
            KeyCode::Char(c) => { if let Some(buf) = self.active_buffer() { buf.push(c); } }
            _ => {}
        }
    }

    fn active_buffer(&mut self) -> Option<&mut String> {
        match self.field { Field::Text => Some(&mut self.draft.text), Field::Due => Some(&mut self.draft.due), _ => None }
    }

    async fn submit(&mut self) {
        let due_date = match parse_due(&self.draft.due) {
            Ok(due) => due,
            Err(()) => { self.message = format!("could not read due date `{}`", self.draft.due.trim()); return; }
        };
        let text = self.draft.text.clone();
        match self.mode {
            Mode::Create => {
                let input = NewTodo { text, priority: self.draft.priority, category: self.draft.category, due_date };
                if let Some(todo) = self.service.add(input).await { self.message = format!("added \"{}\"", todo.text); }
            }
            Mode::Edit => {
                if let Some(id) = self.selected_todo().map(|t| t.id) {
                    self.service.edit(id, EditTodo { text, due_date }).await;
                }
            }
            Mode::Subtask => {
                if let Some(id) = self.selected_todo().map(|t| t.id) {
                    self.service.add_subtask(id, text).await;
                }
            }
            Mode::View => {}
        }
        self.mode = Mode::View;
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let idx = all.iter().position(|v| *v == current).unwrap_or(0);
    let next = if forward { (idx + 1) % all.len() } else { (idx + all.len() - 1) % all.len() };
    all[next]
}

/// Blank input clears the due date; otherwise a local calendar date.
fn parse_due(raw: &str) -> Result<Option<DateTime<Utc>>, ()> {
    let raw = raw.trim();
    if raw.is_empty() { return Ok(None); }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ())?;
    let midnight = date.and_hms_opt(0, 0, 0).ok_or(())?;
    let local = Local.from_local_datetime(&midnight).earliest().ok_or(())?;
    Ok(Some(local.with_timezone(&Utc)))
}

fn due_color(status: DueStatus) -> Color {
    match status {
        DueStatus::Overdue => Color::Red,
        DueStatus::Today => Color::Yellow,
        DueStatus::Tomorrow => Color::Blue,
        DueStatus::Upcoming | DueStatus::None => Color::Gray,
    }
}

fn priority_color(priority: Priority) -> Color {
    match priority { Priority::High => Color::Red, Priority::Medium => Color::Yellow, Priority::Low => Color::Green }
}

fn draw<S: TodoService>(f: &mut Frame, app: &mut App<S>) {
    let now = Local::now();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(f.size());

    let header = Paragraph::new(format!(
        "{} / {} completed ({:.0}%)  |  n new, Enter toggle, e edit, d delete, s subtask, Tab/x/X subtasks, f status, c category, a analytics, w window, q quit",
        app.progress.completed, app.progress.total, app.progress.percent
    ))
    .block(Block::default().borders(Borders::ALL).title("Please Do"));
    f.render_widget(header, chunks[0]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    let list_items: Vec<ListItem> = app.items.iter().map(|t| {
        let mark = if t.completed { "[x]" } else { "[ ]" };
        let mut spans = vec![
            Span::raw(format!("{} ", mark)),
            Span::styled(format!("{:<6} ", t.priority), Style::default().fg(priority_color(t.priority))),
            Span::raw(t.text.clone()),
        ];
        if let Some(due) = t.due_date {
            if !t.completed {
                let label = format!("  due {}", due.with_timezone(&Local).format("%b %-d"));
                spans.push(Span::styled(label, Style::default().fg(due_color(t.due_status(&now)))));
            }
        }
        let (done, total) = t.subtask_progress();
        if total > 0 { spans.push(Span::raw(format!("  {}/{}", done, total))); }
        ListItem::new(Line::from(spans))
    }).collect();
    if app.items.is_empty() { app.list_state.select(None); } else { app.list_state.select(Some(app.selected)); }
    let list = List::new(list_items)
        .block(Block::default().borders(Borders::ALL).title(format!("tasks [status: {}, category: {}]", app.filter.status.as_str(), app.category_label())))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::REVERSED))
        .highlight_symbol(">> ");
    f.render_stateful_widget(list, middle[0], &mut app.list_state);

    let side = match &app.report {
        Some(report) => analytics_text(report),
        None => detail_text(app.selected_todo(), app.subtask_selected, &now),
    };
    let side_title = if app.report.is_some() { format!("analytics ({})", app.window.label()) } else { "details".to_string() };
    let details = Paragraph::new(side)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(side_title));
    f.render_widget(details, middle[1]);

    let footer_text = match app.mode {
        Mode::View if !app.message.is_empty() => app.message.clone(),
        Mode::View => format!("DATABASE_URL={}", std::env::var("DATABASE_URL").unwrap_or_default()),
        Mode::Subtask => format!("Subtask: {}_  |  (Enter to add, Esc to cancel)", app.draft.text),
        Mode::Create | Mode::Edit => {
            let value = match app.field {
                Field::Text => format!("{}_", app.draft.text),
                Field::Priority => format!("< {} >", app.draft.priority),
                Field::Category => format!("< {} >", app.draft.category),
                Field::Due => format!("{}_", app.draft.due),
            };
            format!("{}: {}  |  (Tab to switch, Left/Right to choose, Enter to save, Esc to cancel)", app.field.label(), value)
        }
    };
    let footer = Paragraph::new(footer_text)
        .block(Block::default().borders(Borders::ALL).title(match app.mode { Mode::View => "info", Mode::Create => "create", Mode::Edit => "edit", Mode::Subtask => "subtask" }));
    f.render_widget(footer, chunks[2]);
}

fn detail_text(todo: Option<&Todo>, subtask_selected: usize, now: &DateTime<Local>) -> Vec<Line<'static>> {
    let Some(t) = todo else { return vec![Line::from("No tasks match your filters. Time to chill?")] };
    let mut lines = vec![
        Line::from(t.text.clone()),
        Line::from(""),
        Line::from(format!("Status:   {}", if t.completed { "done" } else { "pending" })),
        Line::from(format!("Priority: {}", t.priority)),
        Line::from(format!("Category: {}", t.category)),
        Line::from(format!("Created:  {}", t.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"))),
    ];
    if let Some(done) = t.completed_at {
        lines.push(Line::from(format!("Done at:  {}", done.with_timezone(&Local).format("%Y-%m-%d %H:%M"))));
    }
    if let Some(due) = t.due_date {
        lines.push(Line::from(Span::styled(
            format!("Due:      {}", due.with_timezone(&Local).format("%Y-%m-%d")),
            Style::default().fg(due_color(t.due_status(now))),
        )));
    }
    if !t.subtasks.is_empty() {
        let (done, total) = t.subtask_progress();
        lines.push(Line::from(""));
        lines.push(Line::from(format!("Subtasks {}/{}", done, total)));
        for (i, s) in t.subtasks.iter().enumerate() {
            let cursor = if i == subtask_selected { ">" } else { " " };
            let mark = if s.completed { "[x]" } else { "[ ]" };
            lines.push(Line::from(format!("{} {} {}", cursor, mark, s.text)));
        }
    }
    lines
}

fn analytics_text(report: &AnalyticsReport) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(format!("Completed:  {} of {}", report.completed, report.total)),
        Line::from(format!("Rate:       {:.1}%", report.completion_rate)),
        Line::from(format!("Streak:     {} day(s)", report.streak)),
        Line::from(""),
    ];
    match &report.series {
        CompletionSeries::Daily { days } => {
            for day in days {
                lines.push(Line::from(format!("{}  {}", day.date.format("%b %d"), "#".repeat(day.completed))));
            }
        }
        CompletionSeries::Totals { completed, pending } => {
            lines.push(Line::from(format!("Completed {}  Pending {}", completed, pending)));
        }
    }
    lines.push(Line::from(""));
    if report.categories.is_empty() {
        lines.push(Line::from("No completed tasks in any category for this period."));
    }
    for c in &report.categories {
        lines.push(Line::from(format!("{:<9} {}", c.category, c.completed)));
    }
    lines
}

async fn run_app<S: TodoService>(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, service: S) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut app = App::new(service);
    app.load().await;

    loop {
        terminal.draw(|f| draw(f, &mut app))?;

        let timeout = tick_rate.saturating_sub(app.last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                // Only act on key presses; ignore repeats and releases to prevent duplicate input
                if key.kind != KeyEventKind::Press { continue; }
                if app.handle_key(key).await { break; }
            }
        }
        if app.last_tick.elapsed() >= tick_rate {
            app.last_tick = Instant::now();
        }
    }
    Ok(())
}
