use std::{io, path::PathBuf, time::Duration};

use anyhow::Result;
use chrono::{Local, NaiveDate, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::error;

use lounge_core::{
    billing, summary, BillBreakdown, CsvLedger, EngineEvent, EngineEvents, LedgerRecord,
    LedgerStore, PendingOrderQueue, PriceConfig, ServiceCharge, SessionRegistry, SettingsForm,
    StationId,
};

const TICK_RATE: Duration = Duration::from_secs(1);
const EXPORT_FILE: &str = "lounge_export.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Stations,
    Pending,
    Ledger,
    Settings,
}

impl Tab {
    const ALL: [Tab; 4] = [Tab::Stations, Tab::Pending, Tab::Ledger, Tab::Settings];

    fn title(&self) -> &'static str {
        match self {
            Tab::Stations => "Stations",
            Tab::Pending => "Pending Orders",
            Tab::Ledger => "Ledger",
            Tab::Settings => "Settings",
        }
    }
}

/// Where a picked service should land.
#[derive(Debug, Clone, Copy)]
enum PickTarget {
    Station(StationId),
    Draft,
}

#[derive(Debug, Clone)]
enum Mode {
    Normal,
    /// Choosing a service from the configured menu.
    Picker {
        target: PickTarget,
        selected: usize,
    },
    /// Reviewing a station bill before committing or discarding it.
    Bill {
        station: StationId,
        bill: BillBreakdown,
        offer_chosen: bool,
    },
    /// Reviewing a pending order's bill before completing it.
    PendingBill { index: usize },
    /// Typing the walk-up customer's name.
    EditCustomer { buffer: String },
    /// Typing a ledger filter date.
    EditDate { buffer: String },
    /// Typing a settings field value.
    EditField { field: usize, buffer: String },
}

pub struct LoungeApp {
    registry: SessionRegistry,
    queue: PendingOrderQueue,
    config: PriceConfig,
    config_path: PathBuf,
    ledger: CsvLedger,
    event_rx: UnboundedReceiver<EngineEvent>,

    tab: Tab,
    mode: Mode,
    status: String,
    should_quit: bool,

    // Stations tab.
    station_idx: usize,
    charge_sel: usize,

    // Pending tab: the current-order builder plus queue selection.
    draft_customer: String,
    draft_charges: Vec<ServiceCharge>,
    queue_sel: usize,

    // Ledger tab: displayed rows paired with their position in read_all
    // order, so deleting a row from a filtered view removes the right one.
    ledger_rows: Vec<(usize, LedgerRecord)>,
    ledger_sel: usize,
    ledger_filter: Option<String>,

    // Settings tab.
    form: SettingsForm,
    field_sel: usize,

    // A bill whose ledger append failed; kept so the save can be retried
    // without recomputing anything.
    unsaved: Option<LedgerRecord>,
}

impl LoungeApp {
    pub fn new(
        config: PriceConfig,
        config_path: PathBuf,
        ledger: CsvLedger,
        events: EngineEvents,
        event_rx: UnboundedReceiver<EngineEvent>,
    ) -> Self {
        let form = config.to_form();
        let mut app = Self {
            registry: SessionRegistry::new(events),
            queue: PendingOrderQueue::new(),
            config,
            config_path,
            ledger,
            event_rx,
            tab: Tab::Stations,
            mode: Mode::Normal,
            status: "Welcome. Tab switches views, q quits.".to_string(),
            should_quit: false,
            station_idx: 0,
            charge_sel: 0,
            draft_customer: String::new(),
            draft_charges: Vec::new(),
            queue_sel: 0,
            ledger_rows: Vec::new(),
            ledger_sel: 0,
            ledger_filter: Some(today()),
            form,
            field_sel: 0,
            unsaved: None,
        };
        app.refresh_ledger();
        app
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            self.drain_engine_events();
            terminal.draw(|frame| self.render(frame))?;

            if event::poll(TICK_RATE)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }
            if self.should_quit {
                return Ok(());
            }
        }
    }

    fn drain_engine_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                EngineEvent::ConfigChanged => {
                    // Price labels shown in pickers and settings are stale.
                    self.form = self.config.to_form();
                    self.field_sel = self.field_sel.min(self.field_count().saturating_sub(1));
                }
                EngineEvent::SessionStarted(_) | EngineEvent::SessionClosed(_) => {}
            }
        }
    }

    // ---- key handling -----------------------------------------------------

    fn handle_key(&mut self, key: KeyEvent) {
        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        match mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Picker { target, selected } => self.handle_picker_key(key, target, selected),
            Mode::Bill {
                station,
                bill,
                offer_chosen,
            } => self.handle_bill_key(key, station, bill, offer_chosen),
            Mode::PendingBill { index } => self.handle_pending_bill_key(key, index),
            Mode::EditCustomer { buffer } => {
                self.handle_text_key(
                    key,
                    buffer,
                    |buffer| Mode::EditCustomer { buffer },
                    |app, value| {
                        app.draft_customer = value;
                        app.status = "Customer name set.".to_string();
                    },
                );
            }
            Mode::EditDate { buffer } => {
                self.handle_text_key(
                    key,
                    buffer,
                    |buffer| Mode::EditDate { buffer },
                    |app, value| match canonical_filter_date(&value) {
                        Some(date) => {
                            app.ledger_filter = Some(date);
                            app.refresh_ledger();
                        }
                        None => {
                            app.status = format!("'{value}' is not a valid YYYY-MM-DD date");
                        }
                    },
                );
            }
            Mode::EditField { field, buffer } => {
                self.handle_text_key(
                    key,
                    buffer,
                    move |buffer| Mode::EditField { field, buffer },
                    move |app, value| app.set_form_field(field, value),
                );
            }
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => self.next_tab(1),
            KeyCode::BackTab => self.next_tab(-1),
            KeyCode::Char('1') => self.tab = Tab::Stations,
            KeyCode::Char('2') => self.tab = Tab::Pending,
            KeyCode::Char('3') => self.tab = Tab::Ledger,
            KeyCode::Char('4') => self.tab = Tab::Settings,
            KeyCode::Char('P') => self.retry_unsaved(),
            _ => match self.tab {
                Tab::Stations => self.handle_stations_key(key),
                Tab::Pending => self.handle_pending_key(key),
                Tab::Ledger => self.handle_ledger_key(key),
                Tab::Settings => self.handle_settings_key(key),
            },
        }
    }

    fn handle_stations_key(&mut self, key: KeyEvent) {
        let station_id = StationId::ALL[self.station_idx];
        match key.code {
            KeyCode::Left => {
                self.station_idx = self.station_idx.saturating_sub(1);
                self.charge_sel = 0;
            }
            KeyCode::Right => {
                self.station_idx = (self.station_idx + 1).min(StationId::ALL.len() - 1);
                self.charge_sel = 0;
            }
            KeyCode::Up => self.charge_sel = self.charge_sel.saturating_sub(1),
            KeyCode::Down => {
                let len = self.registry.station(station_id).charges.len();
                self.charge_sel = (self.charge_sel + 1).min(len.saturating_sub(1));
            }
            KeyCode::Char('s') => {
                let result = self
                    .registry
                    .start(station_id)
                    .map(|_| format!("{station_id} started"));
                self.report(result);
            }
            KeyCode::Char('a') => {
                self.mode = Mode::Picker {
                    target: PickTarget::Station(station_id),
                    selected: 0,
                };
            }
            KeyCode::Char('d') => {
                let index = self.charge_sel;
                let result = self
                    .registry
                    .remove_charge(station_id, index)
                    .map(|_| format!("Charge removed from {station_id}"));
                self.report(result);
                self.charge_sel = self.charge_sel.saturating_sub(1);
            }
            KeyCode::Char('e') => match self.registry.end(station_id, &self.config) {
                Ok(bill) => {
                    let offer_chosen = bill.default_offer_choice();
                    self.mode = Mode::Bill {
                        station: station_id,
                        bill,
                        offer_chosen,
                    };
                }
                Err(err) => self.status = err.to_string(),
            },
            _ => {}
        }
    }

    fn handle_pending_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.queue_sel = self.queue_sel.saturating_sub(1),
            KeyCode::Down => {
                let len = self.queue.orders().len();
                self.queue_sel = (self.queue_sel + 1).min(len.saturating_sub(1));
            }
            KeyCode::Char('a') => {
                self.mode = Mode::Picker {
                    target: PickTarget::Draft,
                    selected: 0,
                };
            }
            KeyCode::Char('n') => {
                self.mode = Mode::EditCustomer {
                    buffer: self.draft_customer.clone(),
                };
            }
            KeyCode::Char('d') => {
                if self.draft_charges.pop().is_none() {
                    self.status = "Current order is empty.".to_string();
                }
            }
            KeyCode::Char('c') => {
                self.draft_charges.clear();
                self.draft_customer.clear();
                self.status = "Current order cleared.".to_string();
            }
            KeyCode::Enter => self.append_draft(),
            KeyCode::Char('b') => {
                if self.queue.orders().get(self.queue_sel).is_some() {
                    self.mode = Mode::PendingBill {
                        index: self.queue_sel,
                    };
                } else {
                    self.status = "No pending order selected.".to_string();
                }
            }
            KeyCode::Char('r') => {
                let result = self
                    .queue
                    .remove_at(self.queue_sel)
                    .map(|_| "Pending order removed.".to_string());
                self.report(result);
                self.queue_sel = self.queue_sel.saturating_sub(1);
            }
            KeyCode::Char('m') => self.reopen_selected(),
            _ => {}
        }
    }

    fn handle_ledger_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.ledger_sel = self.ledger_sel.saturating_sub(1),
            KeyCode::Down => {
                let len = self.ledger_rows.len();
                self.ledger_sel = (self.ledger_sel + 1).min(len.saturating_sub(1));
            }
            KeyCode::Char('t') => {
                self.ledger_filter = Some(today());
                self.refresh_ledger();
            }
            KeyCode::Char('A') => {
                self.ledger_filter = None;
                self.refresh_ledger();
            }
            KeyCode::Char('/') => {
                self.mode = Mode::EditDate {
                    buffer: self.ledger_filter.clone().unwrap_or_else(today),
                };
            }
            KeyCode::Char('R') => self.refresh_ledger(),
            KeyCode::Char('d') => self.delete_selected_row(),
            KeyCode::Char('x') => {
                let result = self
                    .ledger
                    .export_to(EXPORT_FILE)
                    .map(|_| format!("Ledger exported to {EXPORT_FILE}"));
                self.report(result);
            }
            _ => {}
        }
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.field_sel = self.field_sel.saturating_sub(1),
            KeyCode::Down => {
                self.field_sel = (self.field_sel + 1).min(self.field_count() - 1);
            }
            KeyCode::Enter => {
                if let Some(buffer) = self.form_field(self.field_sel) {
                    self.mode = Mode::EditField {
                        field: self.field_sel,
                        buffer,
                    };
                }
            }
            KeyCode::Char('o') => {
                self.form.offers_enabled = !self.form.offers_enabled;
            }
            KeyCode::Char('S') => {
                let form = self.form.clone();
                let result = self
                    .config
                    .apply(&form, &self.config_path, self.registry.events())
                    .map(|_| "Settings saved.".to_string());
                self.report(result);
            }
            KeyCode::Char('D') => {
                let result = self
                    .config
                    .reset(&self.config_path, self.registry.events())
                    .map(|_| "Settings reset to defaults.".to_string());
                self.report(result);
            }
            _ => {}
        }
    }

    fn handle_picker_key(&mut self, key: KeyEvent, target: PickTarget, selected: usize) {
        let services: Vec<(String, f64)> = self
            .config
            .services
            .iter()
            .map(|(name, price)| (name.clone(), *price))
            .collect();
        match key.code {
            KeyCode::Esc => {}
            KeyCode::Up => {
                self.mode = Mode::Picker {
                    target,
                    selected: selected.saturating_sub(1),
                };
            }
            KeyCode::Down => {
                self.mode = Mode::Picker {
                    target,
                    selected: (selected + 1).min(services.len().saturating_sub(1)),
                };
            }
            KeyCode::Enter => {
                if let Some((name, price)) = services.get(selected) {
                    match target {
                        PickTarget::Station(id) => {
                            let result = self
                                .registry
                                .add_charge(id, name, &self.config)
                                .map(|_| format!("{} added to {id}", title_case(name)));
                            self.report(result);
                        }
                        PickTarget::Draft => {
                            self.draft_charges
                                .push(ServiceCharge::new(name.clone(), *price, Utc::now()));
                            self.status = format!("{} added to current order", title_case(name));
                        }
                    }
                }
            }
            _ => {
                self.mode = Mode::Picker { target, selected };
            }
        }
    }

    fn handle_bill_key(
        &mut self,
        key: KeyEvent,
        station: StationId,
        bill: BillBreakdown,
        offer_chosen: bool,
    ) {
        match key.code {
            KeyCode::Char('o') => {
                self.mode = Mode::Bill {
                    station,
                    bill,
                    offer_chosen: !offer_chosen,
                };
            }
            KeyCode::Enter => {
                // Commit exactly the breakdown this modal displayed.
                match self.registry.finalize(station, &bill, offer_chosen) {
                    Ok(record) => self.save_record(record),
                    Err(err) => self.status = err.to_string(),
                }
            }
            KeyCode::Char('c') => {
                // Close without saving: the session is discarded with no
                // ledger row, preserving the historical behaviour.
                let result = self
                    .registry
                    .close(station)
                    .map(|_| format!("{station} closed without saving"));
                self.report(result);
            }
            KeyCode::Esc => {
                // Leave the session running.
                self.status = format!("{station} still running.");
            }
            _ => {
                self.mode = Mode::Bill {
                    station,
                    bill,
                    offer_chosen,
                };
            }
        }
    }

    fn handle_pending_bill_key(&mut self, key: KeyEvent, index: usize) {
        match key.code {
            KeyCode::Enter => match self.queue.finalize(index) {
                Ok(record) => {
                    self.save_record(record);
                    self.queue_sel = self.queue_sel.saturating_sub(1);
                }
                Err(err) => self.status = err.to_string(),
            },
            KeyCode::Esc => {}
            _ => {
                self.mode = Mode::PendingBill { index };
            }
        }
    }

    fn handle_text_key(
        &mut self,
        key: KeyEvent,
        mut buffer: String,
        restore: impl FnOnce(String) -> Mode,
        commit: impl FnOnce(&mut Self, String),
    ) {
        match key.code {
            KeyCode::Enter => commit(self, buffer),
            KeyCode::Esc => {}
            KeyCode::Backspace => {
                buffer.pop();
                self.mode = restore(buffer);
            }
            KeyCode::Char(ch) => {
                buffer.push(ch);
                self.mode = restore(buffer);
            }
            _ => self.mode = restore(buffer),
        }
    }

    // ---- engine actions ---------------------------------------------------

    fn append_draft(&mut self) {
        let charges = self.draft_charges.clone();
        let result = self
            .queue
            .append(&self.draft_customer, charges)
            .map(|_| format!("Order for {} queued", self.draft_customer.trim()));
        if result.is_ok() {
            self.draft_charges.clear();
            self.draft_customer.clear();
        }
        self.report(result);
    }

    fn reopen_selected(&mut self) {
        match self.queue.reopen(self.queue_sel) {
            Ok(order) => {
                self.status = format!(
                    "Order for {} loaded for editing; press Enter to re-queue it.",
                    order.customer
                );
                self.draft_customer = order.customer;
                self.draft_charges = order.charges;
                self.queue_sel = self.queue_sel.saturating_sub(1);
            }
            Err(err) => self.status = err.to_string(),
        }
    }

    fn delete_selected_row(&mut self) {
        match self.ledger_rows.get(self.ledger_sel) {
            Some((absolute, _)) => {
                let result = self
                    .ledger
                    .delete_at(*absolute)
                    .map(|_| "Record deleted.".to_string());
                self.report(result);
                self.refresh_ledger();
            }
            None => self.status = "No record selected.".to_string(),
        }
    }

    fn save_record(&mut self, record: LedgerRecord) {
        match self.ledger.append(&record) {
            Ok(()) => {
                self.status = format!("Saved: total ${}", billing::format_money(record.total_cost));
                self.unsaved = None;
                self.refresh_ledger();
            }
            Err(err) => {
                error!("ledger append failed: {err}");
                self.status = format!("{err} (press P to retry the save)");
                self.unsaved = Some(record);
            }
        }
    }

    fn retry_unsaved(&mut self) {
        match self.unsaved.take() {
            Some(record) => self.save_record(record),
            None => self.status = "Nothing waiting to be saved.".to_string(),
        }
    }

    fn refresh_ledger(&mut self) {
        let rows = match self.ledger.read_all() {
            Ok(rows) => rows,
            Err(err) => {
                self.status = err.to_string();
                return;
            }
        };
        self.ledger_rows = rows
            .into_iter()
            .enumerate()
            .filter(|(_, record)| match &self.ledger_filter {
                Some(date) => &record.date == date,
                None => true,
            })
            .collect();
        self.ledger_sel = self
            .ledger_sel
            .min(self.ledger_rows.len().saturating_sub(1));
    }

    fn report(&mut self, result: Result<String, lounge_core::EngineError>) {
        match result {
            Ok(message) => self.status = message,
            Err(err) => self.status = err.to_string(),
        }
    }

    // ---- settings form helpers -------------------------------------------

    fn field_count(&self) -> usize {
        // hourly rate + services + two tier rates + the offers toggle row.
        4 + self.form.services.len()
    }

    fn form_field(&self, index: usize) -> Option<String> {
        let services = self.form.services.len();
        match index {
            0 => Some(self.form.hourly_rate.clone()),
            i if i <= services => Some(self.form.services[i - 1].1.clone()),
            i if i == services + 1 => Some(self.form.tier2_rate.clone()),
            i if i == services + 2 => Some(self.form.tier3_rate.clone()),
            _ => None,
        }
    }

    fn set_form_field(&mut self, index: usize, value: String) {
        let services = self.form.services.len();
        match index {
            0 => self.form.hourly_rate = value,
            i if i <= services => self.form.services[i - 1].1 = value,
            i if i == services + 1 => self.form.tier2_rate = value,
            i if i == services + 2 => self.form.tier3_rate = value,
            _ => {}
        }
    }

    fn next_tab(&mut self, step: isize) {
        let current = Tab::ALL.iter().position(|tab| *tab == self.tab).unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(Tab::ALL.len() as isize) as usize;
        self.tab = Tab::ALL[next];
    }

    // ---- rendering --------------------------------------------------------

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .split(frame.size());

        let titles: Vec<Line> = Tab::ALL.iter().map(|tab| Line::from(tab.title())).collect();
        let selected = Tab::ALL.iter().position(|tab| *tab == self.tab).unwrap_or(0);
        let tabs = Tabs::new(titles)
            .select(selected)
            .block(Block::default().borders(Borders::ALL).title("Lounge"))
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, chunks[0]);

        match self.tab {
            Tab::Stations => self.render_stations(frame, chunks[1]),
            Tab::Pending => self.render_pending(frame, chunks[1]),
            Tab::Ledger => self.render_ledger(frame, chunks[1]),
            Tab::Settings => self.render_settings(frame, chunks[1]),
        }

        let status = Paragraph::new(self.status.as_str()).style(Style::default().fg(Color::Yellow));
        frame.render_widget(status, chunks[2]);

        match &self.mode {
            Mode::Picker { selected, .. } => self.render_picker(frame, *selected),
            Mode::Bill {
                station,
                bill,
                offer_chosen,
            } => self.render_bill(frame, *station, bill, *offer_chosen),
            Mode::PendingBill { index } => self.render_pending_bill(frame, *index),
            Mode::EditCustomer { buffer } => {
                self.render_input(frame, "Customer name", buffer);
            }
            Mode::EditDate { buffer } => {
                self.render_input(frame, "Date (YYYY-MM-DD)", buffer);
            }
            Mode::EditField { buffer, .. } => {
                self.render_input(frame, "New value", buffer);
            }
            Mode::Normal => {}
        }
    }

    fn render_stations(&mut self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(8), Constraint::Min(3)])
            .split(area);
        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(25); 4])
            .split(rows[0]);

        let now = Utc::now();
        for (i, id) in StationId::ALL.iter().enumerate() {
            let station = self.registry.station(*id);
            let (state, color) = if station.is_active() {
                ("In Use", Color::Red)
            } else {
                ("Available", Color::Green)
            };
            let elapsed = station.elapsed(now).num_seconds().max(0);
            let cost = self
                .registry
                .running_cost(*id, &self.config, now)
                .unwrap_or(0.0);

            let lines = vec![
                Line::from(Span::styled(state, Style::default().fg(color))),
                Line::from(format!(
                    "{:02}:{:02}:{:02}",
                    elapsed / 3600,
                    (elapsed % 3600) / 60,
                    elapsed % 60
                )),
                Line::from(format!("Cost: ${}", billing::format_money(cost))),
                Line::from(format!("Services: {}", station.charges.len())),
            ];
            let border = if i == self.station_idx {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            let panel = Paragraph::new(lines).alignment(Alignment::Center).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border)
                    .title(id.label()),
            );
            frame.render_widget(panel, panels[i]);
        }

        let selected_id = StationId::ALL[self.station_idx];
        let charges = &self.registry.station(selected_id).charges;
        let items: Vec<ListItem> = charges.iter().map(|c| ListItem::new(charge_line(c))).collect();
        let mut state = ListState::default();
        if !charges.is_empty() {
            state.select(Some(self.charge_sel.min(charges.len() - 1)));
        }
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(format!(
                "{selected_id} services: s start, a add, d remove, e end"
            )))
            .highlight_style(Style::default().bg(Color::DarkGray));
        frame.render_stateful_widget(list, rows[1], &mut state);
    }

    fn render_pending(&mut self, frame: &mut Frame, area: Rect) {
        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(area);

        let mut draft_lines = vec![Line::from(format!(
            "Customer: {}",
            if self.draft_customer.is_empty() {
                "<none, press n>"
            } else {
                &self.draft_customer
            }
        ))];
        for charge in &self.draft_charges {
            draft_lines.push(Line::from(format!("  {}", charge_line(charge))));
        }
        draft_lines.push(Line::from(format!(
            "Total: ${}",
            billing::format_money(billing::services_total(&self.draft_charges))
        )));
        let draft = Paragraph::new(draft_lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Current order: a add, n name, d undo, c clear, Enter queue"),
        );
        frame.render_widget(draft, halves[0]);

        let items: Vec<ListItem> = self
            .queue
            .orders()
            .iter()
            .map(|order| {
                let services = order
                    .charges
                    .iter()
                    .map(|c| title_case(&c.name))
                    .collect::<Vec<_>>()
                    .join(", ");
                ListItem::new(format!(
                    "{} | {} | ${} ({})",
                    order.customer,
                    services,
                    billing::format_money(order.total()),
                    order.created_at.with_timezone(&Local).format("%H:%M:%S")
                ))
            })
            .collect();
        let mut state = ListState::default();
        if !self.queue.orders().is_empty() {
            state.select(Some(self.queue_sel.min(self.queue.orders().len() - 1)));
        }
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Pending orders: b bill, r remove, m edit"),
            )
            .highlight_style(Style::default().bg(Color::DarkGray));
        frame.render_stateful_widget(list, halves[1], &mut state);
    }

    fn render_ledger(&mut self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);

        let records: Vec<LedgerRecord> =
            self.ledger_rows.iter().map(|(_, r)| r.clone()).collect();
        let totals = summary::summarize(&records);
        let scope = self
            .ledger_filter
            .clone()
            .unwrap_or_else(|| "All Dates".to_string());
        let summary_line = Paragraph::new(format!(
            "{scope}  |  Revenue ${}  Stations ${}  Services ${}  Sessions {}",
            billing::format_money(totals.total_revenue),
            billing::format_money(totals.station_revenue),
            billing::format_money(totals.services_revenue),
            totals.session_count
        ))
        .block(Block::default().borders(Borders::ALL).title("Daily summary"));
        frame.render_widget(summary_line, rows[0]);

        let items: Vec<ListItem> = self
            .ledger_rows
            .iter()
            .map(|(_, r)| {
                ListItem::new(format!(
                    "{} {}  {:<13} {:<10} {}  ${:<9} {}  ${:<9} ${}",
                    r.date,
                    r.time,
                    r.station,
                    r.customer,
                    r.duration,
                    billing::format_money(r.station_cost),
                    r.services,
                    billing::format_money(r.services_cost),
                    billing::format_money(r.total_cost)
                ))
            })
            .collect();
        let mut state = ListState::default();
        if !self.ledger_rows.is_empty() {
            state.select(Some(self.ledger_sel));
        }
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(
                "Ledger: t today, A all, / date, d delete, x export, R refresh",
            ))
            .highlight_style(Style::default().bg(Color::DarkGray));
        frame.render_stateful_widget(list, rows[1], &mut state);
    }

    fn render_settings(&mut self, frame: &mut Frame, area: Rect) {
        let mut items: Vec<ListItem> = Vec::new();
        items.push(ListItem::new(format!(
            "Station rate per hour: ${}",
            self.form.hourly_rate
        )));
        for (name, price) in &self.form.services {
            items.push(ListItem::new(format!("{}: ${price}", title_case(name))));
        }
        items.push(ListItem::new(format!(
            "2+ hour rate: ${}",
            self.form.tier2_rate
        )));
        items.push(ListItem::new(format!(
            "3+ hour rate: ${}",
            self.form.tier3_rate
        )));
        items.push(ListItem::new(format!(
            "Offers enabled: {} (press o)",
            if self.form.offers_enabled { "yes" } else { "no" }
        )));

        let mut state = ListState::default();
        state.select(Some(self.field_sel.min(items.len() - 1)));
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(
                "Settings: Enter edit, o toggle offers, S save, D defaults",
            ))
            .highlight_style(Style::default().bg(Color::DarkGray));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_picker(&self, frame: &mut Frame, selected: usize) {
        let area = centered_rect(40, 50, frame.size());
        let items: Vec<ListItem> = self
            .config
            .services
            .iter()
            .map(|(name, price)| {
                ListItem::new(format!(
                    "{}: ${}",
                    title_case(name),
                    billing::format_money(*price)
                ))
            })
            .collect();
        let count = items.len();
        let mut state = ListState::default();
        if count > 0 {
            state.select(Some(selected.min(count - 1)));
        }
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Add service: Enter add, Esc close"),
            )
            .highlight_style(Style::default().bg(Color::DarkGray));
        frame.render_widget(Clear, area);
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_bill(
        &self,
        frame: &mut Frame,
        station: StationId,
        bill: &BillBreakdown,
        offer_chosen: bool,
    ) {
        let area = centered_rect(55, 70, frame.size());
        let charges = &self.registry.station(station).charges;

        let mut lines = vec![
            Line::from(Span::styled(
                "GAMING LOUNGE BILL",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("Station: {station}")),
            Line::from(format!(
                "Date: {}",
                Local::now().format("%Y-%m-%d %H:%M")
            )),
            Line::from(format!("Duration: {}", bill.duration_label())),
            Line::from(format!(
                "Normal station cost: ${}",
                billing::format_money(bill.normal_station_cost)
            )),
        ];

        if let Some(offer) = &bill.offer {
            lines.push(Line::from(Span::styled(
                format!("{} available!", offer.tier.label()),
                Style::default().fg(Color::Green),
            )));
            lines.push(Line::from(format!(
                "Offer rate ${}/hour, with offer ${}, saving ${}",
                billing::format_money(offer.rate),
                billing::format_money(offer.station_cost),
                billing::format_money(offer.savings)
            )));
            lines.push(Line::from(format!(
                "[{}] Apply offer (press o)",
                if offer_chosen { "x" } else { " " }
            )));
        }

        lines.push(Line::from("Services:"));
        if charges.is_empty() {
            lines.push(Line::from("  No additional services"));
        } else {
            for charge in charges {
                lines.push(Line::from(format!("  {}", charge_line(charge))));
            }
        }
        lines.push(Line::from(format!(
            "Services total: ${}",
            billing::format_money(bill.services_cost)
        )));
        lines.push(Line::from(Span::styled(
            format!(
                "TOTAL: ${}",
                billing::format_money(bill.total(offer_chosen))
            ),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(
            "Enter save, c close without saving, Esc keep running",
        ));

        let paragraph = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Bill"));
        frame.render_widget(Clear, area);
        frame.render_widget(paragraph, area);
    }

    fn render_pending_bill(&self, frame: &mut Frame, index: usize) {
        let area = centered_rect(50, 60, frame.size());
        let Some(order) = self.queue.orders().get(index) else {
            return;
        };

        let mut lines = vec![
            Line::from(Span::styled(
                "SERVICES BILL",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("Customer: {}", order.customer)),
            Line::from(format!(
                "Order time: {}",
                order.created_at.with_timezone(&Local).format("%H:%M:%S")
            )),
        ];
        for charge in &order.charges {
            lines.push(Line::from(format!("  {}", charge_line(charge))));
        }
        lines.push(Line::from(Span::styled(
            format!("TOTAL: ${}", billing::format_money(order.total())),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from("Enter save & complete, Esc close"));

        let paragraph = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Bill"));
        frame.render_widget(Clear, area);
        frame.render_widget(paragraph, area);
    }

    fn render_input(&self, frame: &mut Frame, title: &str, buffer: &str) {
        let area = centered_rect(40, 12, frame.size());
        let paragraph = Paragraph::new(format!("{buffer}_"))
            .block(Block::default().borders(Borders::ALL).title(title.to_string()));
        frame.render_widget(Clear, area);
        frame.render_widget(paragraph, area);
    }
}

fn charge_line(charge: &ServiceCharge) -> String {
    format!(
        "{} - ${} ({})",
        title_case(&charge.name),
        billing::format_money(charge.unit_price),
        charge.added_at.with_timezone(&Local).format("%H:%M:%S")
    )
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Parse a user-typed filter date and normalize it to the `YYYY-MM-DD`
/// form used in ledger rows, so unpadded input still matches.
fn canonical_filter_date(input: &str) -> Option<String> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .ok()
        .map(|date| date.format("%Y-%m-%d").to_string())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_dates_are_validated_and_normalized() {
        assert_eq!(
            canonical_filter_date("2026-08-30").as_deref(),
            Some("2026-08-30")
        );
        assert_eq!(
            canonical_filter_date(" 2026-8-30 ").as_deref(),
            Some("2026-08-30")
        );
        assert_eq!(canonical_filter_date("2026-13-01"), None);
        assert_eq!(canonical_filter_date("2026-02-30"), None);
        assert_eq!(canonical_filter_date("yesterday"), None);
    }
}
