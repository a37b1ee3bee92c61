use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

use parkwatch::{
    format_timestamp, now_string, ExitOutcome, ExitReceipt, NewEntry, ParkingLot, SlotStatus,
    VehicleRecord,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Vehicles,
    Entry,
    Exit,
    Layout,
    Analytics,
}

impl Page {
    const ALL: [Page; 5] = [
        Page::Vehicles,
        Page::Entry,
        Page::Exit,
        Page::Layout,
        Page::Analytics,
    ];

    pub fn next(&self) -> Self {
        match self {
            Page::Vehicles => Page::Entry,
            Page::Entry => Page::Exit,
            Page::Exit => Page::Layout,
            Page::Layout => Page::Analytics,
            Page::Analytics => Page::Vehicles,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Vehicles => Page::Analytics,
            Page::Entry => Page::Vehicles,
            Page::Exit => Page::Entry,
            Page::Layout => Page::Exit,
            Page::Analytics => Page::Layout,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Vehicles => "Vehicles",
            Page::Entry => "Add Entry",
            Page::Exit => "Exit & Rent",
            Page::Layout => "Layout",
            Page::Analytics => "Analytics",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Editing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Success(String),
    Warning(String),
    Error(String),
}

// ============================================================================
// FORMS
// ============================================================================

const ENTRY_FIELDS: [&str; 5] = ["Token", "License Number", "Vehicle Type", "Entry Time", "Slot Number"];
const TYPE_FIELD: usize = 2;

#[derive(Debug, Clone)]
pub struct EntryForm {
    pub token: String,
    pub license: String,
    pub type_index: usize,
    pub entry_time: String,
    pub slot: String,
    pub focus: usize,
}

impl EntryForm {
    fn new() -> Self {
        Self {
            token: String::new(),
            license: String::new(),
            type_index: 0,
            entry_time: now_string(),
            slot: String::new(),
            focus: 0,
        }
    }

    fn focused_text(&mut self) -> Option<&mut String> {
        match self.focus {
            0 => Some(&mut self.token),
            1 => Some(&mut self.license),
            3 => Some(&mut self.entry_time),
            4 => Some(&mut self.slot),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExitForm {
    pub token: String,
    pub exit_time: String,
    /// 0 = token, 1 = exit time
    pub focus: usize,
    pub found: Vec<VehicleRecord>,
    pub last_receipt: Option<ExitReceipt>,
}

impl ExitForm {
    fn new() -> Self {
        Self {
            token: String::new(),
            exit_time: now_string(),
            focus: 0,
            found: Vec::new(),
            last_receipt: None,
        }
    }

    fn focused_text(&mut self) -> &mut String {
        if self.focus == 0 {
            &mut self.token
        } else {
            &mut self.exit_time
        }
    }
}

// ============================================================================
// APP STATE
// ============================================================================

pub struct App {
    pub lot: ParkingLot,
    pub currency: String,
    pub current_page: Page,
    pub input_mode: InputMode,
    pub vehicles: Vec<VehicleRecord>,
    pub search_query: String,
    pub state: TableState,
    pub layout_state: TableState,
    pub entry_form: EntryForm,
    pub exit_form: ExitForm,
    pub message: Option<Message>,
}

impl App {
    pub fn new(lot: ParkingLot, currency: String) -> Self {
        let vehicles = lot.ledger().records().to_vec();

        let mut state = TableState::default();
        if !vehicles.is_empty() {
            state.select(Some(0));
        }

        let mut layout_state = TableState::default();
        if !lot.layout_rows().is_empty() {
            layout_state.select(Some(0));
        }

        Self {
            lot,
            currency,
            current_page: Page::Vehicles,
            input_mode: InputMode::Normal,
            vehicles,
            search_query: String::new(),
            state,
            layout_state,
            entry_form: EntryForm::new(),
            exit_form: ExitForm::new(),
            message: None,
        }
    }

    /// Re-run the current search (or show the whole ledger)
    pub fn refresh_vehicles(&mut self) {
        self.vehicles = if self.search_query.is_empty() {
            self.lot.ledger().records().to_vec()
        } else {
            self.lot.search(&self.search_query)
        };

        if self.vehicles.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    pub fn apply_search(&mut self) {
        self.refresh_vehicles();
        if !self.search_query.is_empty() && self.vehicles.is_empty() {
            self.message = Some(Message::Warning(
                "No vehicle found for the given input!".to_string(),
            ));
        }
    }

    pub fn clear_search(&mut self) {
        self.search_query.clear();
        self.refresh_vehicles();
    }

    pub fn selected_type(&self) -> Option<&str> {
        self.lot.vehicle_types().get(self.entry_form.type_index).copied()
    }

    pub fn cycle_type(&mut self, forward: bool) {
        let count = self.lot.vehicle_types().len();
        if count == 0 {
            return;
        }
        let i = self.entry_form.type_index;
        self.entry_form.type_index = if forward {
            (i + 1) % count
        } else {
            (i + count - 1) % count
        };
    }

    pub fn submit_entry(&mut self) {
        let form = &self.entry_form;
        let entry = NewEntry {
            token: form.token.trim().to_string(),
            license: form.license.trim().to_string(),
            vehicle_type: self.selected_type().unwrap_or_default().to_string(),
            entry_time: form.entry_time.trim().to_string(),
            slot: form.slot.trim().to_string(),
        };

        match self.lot.record_entry(entry) {
            Ok(record) => {
                self.message = Some(Message::Success(format!(
                    "Vehicle {} added to slot {}",
                    record.token, record.slot
                )));
                let type_index = self.entry_form.type_index;
                self.entry_form = EntryForm::new();
                self.entry_form.type_index = type_index;
                self.refresh_vehicles();
            }
            Err(e) => self.message = Some(Message::Error(e.to_string())),
        }
    }

    pub fn lookup_exit_token(&mut self) {
        let token = self.exit_form.token.trim().to_string();
        self.exit_form.found = self.lot.find_by_token(&token);
        if self.exit_form.found.is_empty() {
            self.message = Some(Message::Warning(
                "No vehicle found for the given token!".to_string(),
            ));
        } else {
            self.message = None;
            self.exit_form.focus = 1;
        }
    }

    pub fn submit_exit(&mut self) {
        let token = self.exit_form.token.trim().to_string();
        let exit_time = self.exit_form.exit_time.trim().to_string();

        match self.lot.record_exit(&token, &exit_time) {
            Ok(ExitOutcome::NoVehicle { .. }) => {
                self.message = Some(Message::Warning(
                    "No vehicle found for the given token!".to_string(),
                ));
            }
            Ok(ExitOutcome::AlreadyExited { record }) => {
                let at = record.exit_time.as_ref().map(format_timestamp).unwrap_or_default();
                self.message = Some(Message::Warning(format!(
                    "Vehicle {} already exited at {}",
                    record.token, at
                )));
            }
            Ok(ExitOutcome::Charged(receipt)) => {
                self.message = Some(Message::Success(format!(
                    "Total Rent: {}{}",
                    self.currency, receipt.quote.amount
                )));
                self.exit_form.found = self.lot.find_by_token(&token);
                self.exit_form.last_receipt = Some(receipt);
                self.refresh_vehicles();
            }
            Err(e) => self.message = Some(Message::Error(e.to_string())),
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    fn active_table(&mut self) -> (&mut TableState, usize) {
        match self.current_page {
            Page::Layout => {
                let len = self.lot.layout_rows().len();
                (&mut self.layout_state, len)
            }
            _ => (&mut self.state, self.vehicles.len()),
        }
    }

    pub fn next(&mut self) {
        let (state, len) = self.active_table();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let (state, len) = self.active_table();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(0) => len - 1,
            Some(i) => i - 1,
            None => 0,
        };
        state.select(Some(i));
    }

    /// Apply one key press; returns false when the app should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.input_mode {
            InputMode::Normal => return self.handle_normal_key(key),
            InputMode::Search => self.handle_search_key(key),
            InputMode::Editing => match self.current_page {
                Page::Entry => self.handle_entry_key(key),
                Page::Exit => self.handle_exit_key(key),
                _ => self.input_mode = InputMode::Normal,
            },
        }
        true
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Tab => self.next_page(),
            KeyCode::BackTab => self.previous_page(),
            KeyCode::Char('/') if self.current_page == Page::Vehicles => {
                self.input_mode = InputMode::Search;
                self.message = None;
            }
            KeyCode::Char('c') if self.current_page == Page::Vehicles => self.clear_search(),
            KeyCode::Enter | KeyCode::Char('e')
                if matches!(self.current_page, Page::Entry | Page::Exit) =>
            {
                self.input_mode = InputMode::Editing;
                self.message = None;
            }
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            _ => {}
        }
        true
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.input_mode = InputMode::Normal,
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                self.apply_search();
            }
            KeyCode::Backspace => {
                self.search_query.pop();
            }
            KeyCode::Char(c) => self.search_query.push(c),
            _ => {}
        }
    }

    fn handle_entry_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.input_mode = InputMode::Normal,
            KeyCode::Enter => self.submit_entry(),
            KeyCode::Down | KeyCode::Tab => {
                self.entry_form.focus = (self.entry_form.focus + 1) % ENTRY_FIELDS.len();
            }
            KeyCode::Up | KeyCode::BackTab => {
                self.entry_form.focus =
                    (self.entry_form.focus + ENTRY_FIELDS.len() - 1) % ENTRY_FIELDS.len();
            }
            KeyCode::Left if self.entry_form.focus == TYPE_FIELD => self.cycle_type(false),
            KeyCode::Right if self.entry_form.focus == TYPE_FIELD => self.cycle_type(true),
            KeyCode::Backspace => {
                if let Some(text) = self.entry_form.focused_text() {
                    text.pop();
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(text) = self.entry_form.focused_text() {
                    text.push(c);
                }
            }
            _ => {}
        }
    }

    fn handle_exit_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.input_mode = InputMode::Normal,
            KeyCode::Enter if self.exit_form.focus == 0 => self.lookup_exit_token(),
            KeyCode::Enter => self.submit_exit(),
            KeyCode::Down | KeyCode::Up | KeyCode::Tab | KeyCode::BackTab => {
                self.exit_form.focus = 1 - self.exit_form.focus;
            }
            KeyCode::Backspace => {
                self.exit_form.focused_text().pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.exit_form.focused_text().push(c);
            }
            _ => {}
        }
    }
}

// ============================================================================
// TERMINAL LOOP
// ============================================================================

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if !app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Vehicles => render_vehicles(f, chunks[1], app),
        Page::Entry => render_entry_form(f, chunks[1], app),
        Page::Exit => render_exit(f, chunks[1], app),
        Page::Layout => render_layout(f, chunks[1], app),
        Page::Analytics => render_analytics(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn header_style() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let analytics = app.lot.analytics();

    let mut tab_spans = vec![Span::styled(
        "🚗 Parkwatch  ",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    for (i, page) in Page::ALL.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }
        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Parked: {}", analytics.parked_vehicles),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("■ {}", analytics.occupied_slots),
        Style::default().fg(Color::Red),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("□ {}", analytics.vacant_slots),
        Style::default().fg(Color::Green),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn vehicle_table<'a>(records: &'a [VehicleRecord], title: &'a str) -> Table<'a> {
    let header_cells = ["Token", "License", "Type", "Entry Time", "Exit Time", "Slot"]
        .iter()
        .map(|h| Cell::from(*h).style(header_style()));

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = records.iter().map(|r| {
        let (exit, color) = match &r.exit_time {
            Some(ts) => (format_timestamp(ts), Color::DarkGray),
            None => ("parked".to_string(), Color::Green),
        };

        Row::new(vec![
            Cell::from(r.token.clone()),
            Cell::from(truncate(&r.license, 16)),
            Cell::from(r.vehicle_type.clone()),
            Cell::from(format_timestamp(&r.entry_time)),
            Cell::from(exit).style(Style::default().fg(color)),
            Cell::from(r.slot.clone()),
        ])
        .height(1)
    });

    Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(18),
            Constraint::Length(10),
            Constraint::Length(18),
            Constraint::Length(18),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ")
}

fn render_vehicles(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let searching = app.input_mode == InputMode::Search;
    let search_style = if searching {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    };
    let cursor = if searching { "▏" } else { "" };
    let search = Paragraph::new(format!(" {}{}", app.search_query, cursor)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(search_style)
            .title(" 🔍 Token or License Number "),
    );
    f.render_widget(search, chunks[0]);

    let title = if app.search_query.is_empty() {
        " Vehicles "
    } else {
        " Vehicle Details "
    };
    let table = vehicle_table(&app.vehicles, title);
    f.render_stateful_widget(table, chunks[1], &mut app.state);
}

fn form_line<'a>(label: &'a str, value: String, focused: bool, editing: bool) -> Line<'a> {
    let marker = if focused { "→ " } else { "  " };
    let value_style = if focused && editing {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let cursor = if focused && editing { "▏" } else { "" };

    Line::from(vec![
        Span::styled(marker, Style::default().fg(Color::Green)),
        Span::styled(format!("{:<16}", label), Style::default().fg(Color::Cyan)),
        Span::styled(format!("{}{}", value, cursor), value_style),
    ])
}

fn render_entry_form(f: &mut Frame, area: Rect, app: &App) {
    let form = &app.entry_form;
    let editing = app.input_mode == InputMode::Editing;
    let vehicle_type = app.selected_type().unwrap_or("(no rates loaded)");

    let values = [
        form.token.clone(),
        form.license.clone(),
        format!("◀ {} ▶", vehicle_type),
        form.entry_time.clone(),
        form.slot.clone(),
    ];

    let mut lines = vec![Line::from("")];
    for (i, (label, value)) in ENTRY_FIELDS.iter().zip(values).enumerate() {
        lines.push(form_line(label, value, form.focus == i, editing));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        "  Entry time format: YYYY-MM-DD HH:MM",
        Style::default().fg(Color::DarkGray),
    )));

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" 📝 Add Vehicle Entry "),
    );
    f.render_widget(panel, area);
}

fn render_exit(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Min(4),
            Constraint::Length(6),
        ])
        .split(area);

    let form = &app.exit_form;
    let editing = app.input_mode == InputMode::Editing;
    let lines = vec![
        Line::from(""),
        form_line("Token", form.token.clone(), form.focus == 0, editing),
        Line::from(""),
        form_line("Exit Time", form.exit_time.clone(), form.focus == 1, editing),
    ];
    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" 🚦 Vehicle Exit "),
    );
    f.render_widget(panel, chunks[0]);

    let table = vehicle_table(&app.exit_form.found, " Vehicle Found ");
    f.render_widget(table, chunks[1]);

    let receipt_lines = match &app.exit_form.last_receipt {
        Some(receipt) => vec![
            Line::from(vec![
                Span::raw("  Vehicle "),
                Span::styled(receipt.record.token.clone(), header_style()),
                Span::raw(format!(
                    " ({}) billed {} h × {}{} / h",
                    receipt.quote.vehicle_type,
                    receipt.quote.billable_hours,
                    app.currency,
                    receipt.quote.rate_per_hour
                )),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                format!("  Total Rent: {}{}", app.currency, receipt.quote.amount),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )),
        ],
        None => vec![Line::from(Span::styled(
            "  No exit recorded this session",
            Style::default().fg(Color::DarkGray),
        ))],
    };
    let receipt = Paragraph::new(receipt_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" 💰 Rent "),
    );
    f.render_widget(receipt, chunks[2]);
}

fn render_layout(f: &mut Frame, area: Rect, app: &mut App) {
    let header = Row::new(
        ["Slot", "Status"]
            .iter()
            .map(|h| Cell::from(*h).style(header_style())),
    )
    .style(Style::default().bg(Color::DarkGray))
    .height(1);

    let rows = app.lot.layout_rows().iter().map(|slot| {
        let color = match slot.status {
            SlotStatus::Occupied => Color::Red,
            SlotStatus::Vacant => Color::Green,
        };
        Row::new(vec![
            Cell::from(slot.slot_id.clone()),
            Cell::from(slot.status.as_str()).style(Style::default().fg(color)),
        ])
    });

    let table = Table::new(rows, [Constraint::Length(12), Constraint::Length(12)])
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" 🗺️  Parking Lot Layout "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.layout_state);
}

fn render_analytics(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let analytics = app.lot.analytics();
    let drift = app.lot.layout_drift().len();

    let stat = |label: &'static str, value: usize, color: Color| {
        Line::from(vec![
            Span::styled(format!("  {:<18}", label), Style::default().fg(Color::Cyan)),
            Span::styled(
                value.to_string(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ])
    };

    let mut lines = vec![
        Line::from(""),
        stat("Total Vehicles", analytics.total_vehicles, Color::White),
        stat("Parked Now", analytics.parked_vehicles, Color::White),
        stat("Occupied Slots", analytics.occupied_slots, Color::Red),
        stat("Vacant Slots", analytics.vacant_slots, Color::Green),
    ];
    if drift > 0 {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  ⚠ {} slot(s) differ from parked vehicles", drift),
            Style::default().fg(Color::Yellow),
        )));
    }

    let totals = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" 📊 Analytics "),
    );
    f.render_widget(totals, chunks[0]);

    let counts: Vec<(&str, u64)> = app
        .lot
        .status_counts()
        .into_iter()
        .map(|(status, count)| (status.as_str(), count as u64))
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Slot Status "),
        )
        .data(counts.as_slice())
        .bar_width(10)
        .bar_gap(4)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    f.render_widget(chart, chunks[1]);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let status_spans = match &app.message {
        Some(Message::Success(text)) => vec![Span::styled(
            format!(" ✅ {}", text),
            Style::default().fg(Color::Green),
        )],
        Some(Message::Warning(text)) => vec![Span::styled(
            format!(" ⚠️  {}", text),
            Style::default().fg(Color::Yellow),
        )],
        Some(Message::Error(text)) => vec![Span::styled(
            format!(" ❌ {}", text),
            Style::default().fg(Color::Red),
        )],
        None => key_help(app),
    };

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn key_help(app: &App) -> Vec<Span<'static>> {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    match (app.input_mode, app.current_page) {
        (InputMode::Search, _) => vec![
            key(" Enter"),
            Span::raw(" Search | "),
            key("Esc"),
            Span::raw(" Cancel"),
        ],
        (InputMode::Editing, Page::Entry) => vec![
            key(" ↑/↓"),
            Span::raw(" Field | "),
            key("←/→"),
            Span::raw(" Type | "),
            key("Enter"),
            Span::raw(" Add Vehicle | "),
            key("Esc"),
            Span::raw(" Done"),
        ],
        (InputMode::Editing, _) => vec![
            key(" ↑/↓"),
            Span::raw(" Field | "),
            key("Enter"),
            Span::raw(" Find / Calculate Rent | "),
            key("Esc"),
            Span::raw(" Done"),
        ],
        (InputMode::Normal, page) => {
            let mut spans = vec![key(" Tab"), Span::raw(" Page | ")];
            match page {
                Page::Vehicles => {
                    spans.extend([key("/"), Span::raw(" Search | "), key("c"), Span::raw(" Clear | ")]);
                }
                Page::Entry | Page::Exit => {
                    spans.extend([key("Enter"), Span::raw(" Edit | ")]);
                }
                _ => {}
            }
            spans.extend([
                key("↑/↓"),
                Span::raw(" Nav | "),
                Span::styled("q", Style::default().fg(Color::Red)),
                Span::raw(" Quit"),
            ]);
            spans
        }
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
