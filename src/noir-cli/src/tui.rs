//! Interactive TUI: search the catalog, inspect a game, download it.

use crate::catalog::Catalog;
use crate::credentials::CredentialStore;
use crate::details::{GameDetails, Platform};
use crate::download::DownloadRequest;
use crate::error::TaskError;
use crate::input::TextInput;
use crate::message::{Command, Message};
use crate::task::{Services, TaskRunner};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

/// How long an error stays on screen.
pub const ERROR_DISPLAY: Duration = Duration::from_secs(2);

/// Terminal poll timeout; also the spinner frame interval.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

const SEARCH_CHAR_LIMIT: usize = 100;
const USERNAME_CHAR_LIMIT: usize = 20;

const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];

// ============================================================================
// Public entry point
// ============================================================================

/// Run the TUI until the user quits.
pub fn run(services: Services, credentials: CredentialStore) -> Result<()> {
    App::new(credentials).run(services)
}

// ============================================================================
// App state
// ============================================================================

pub struct App {
    screen: Screen,
    catalog: Catalog,
    catalog_status: CatalogStatus,
    search: TextInput,
    error: Option<TransientError>,
    next_error_token: u64,
    spinner_frame: usize,
    credentials: CredentialStore,
    should_quit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CatalogStatus {
    Loading,
    Ready,
    Unavailable,
}

/// An error line that disappears once its timer with the same token fires.
struct TransientError {
    message: String,
    token: u64,
}

enum Screen {
    Search,
    Details(DetailsScreen),
}

struct DetailsScreen {
    id: u32,
    /// `None` until the fetch for `id` lands.
    details: Option<GameDetails>,
    /// Index into `platforms()`.
    focus_index: usize,
    mode: DetailsMode,
}

enum DetailsMode {
    Normal,
    LoginPrompt(TextInput),
    /// A download is running; only the quit key is handled.
    Waiting,
}

/// Clamped (non-wrapping) movement of an index within `0..count`.
fn clamped_nav(index: &mut usize, count: usize, forward: bool) {
    if forward {
        if *index < count.saturating_sub(1) {
            *index += 1;
        }
    } else {
        *index = index.saturating_sub(1);
    }
}

impl DetailsScreen {
    fn loading(id: u32) -> Self {
        Self {
            id,
            details: None,
            focus_index: 0,
            mode: DetailsMode::Normal,
        }
    }

    fn platforms(&self) -> Vec<Platform> {
        self.details
            .as_ref()
            .map(|d| d.platforms.supported())
            .unwrap_or_default()
    }

    fn focused_platform(&self) -> Option<Platform> {
        self.platforms().get(self.focus_index).copied()
    }

    fn download_request(&self, platform: Platform, username: String) -> DownloadRequest {
        DownloadRequest {
            id: self.id,
            platform,
            username,
        }
    }
}

// ============================================================================
// App implementation
// ============================================================================

impl App {
    pub fn new(credentials: CredentialStore) -> Self {
        Self {
            screen: Screen::Search,
            catalog: Catalog::default(),
            catalog_status: CatalogStatus::Loading,
            search: TextInput::new(SEARCH_CHAR_LIMIT),
            error: None,
            next_error_token: 0,
            spinner_frame: 0,
            credentials,
            should_quit: false,
        }
    }

    /// Commands to issue before the first frame.
    pub fn init(&self) -> Vec<Command> {
        vec![Command::LoadCatalog]
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn run(mut self, services: Services) -> Result<()> {
        // Install a panic hook that restores the terminal before printing the
        // panic message, so the user isn't left with a broken terminal.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = ratatui::try_restore();
            let _ = crossterm::execute!(std::io::stdout(), crossterm::cursor::Show);
            original_hook(info);
        }));

        let (tx, rx) = mpsc::channel();
        let mut runner = TaskRunner::new(services, tx);
        runner.execute_all(self.init());

        let result = self.run_inner(&mut runner, &rx);

        // Always restore the terminal, even if run_inner returned an error.
        ratatui::restore();
        let _ = crossterm::execute!(std::io::stdout(), crossterm::cursor::Show);
        let _ = std::panic::take_hook();

        runner.shutdown();
        result
    }

    fn run_inner(&mut self, runner: &mut TaskRunner, rx: &Receiver<Message>) -> Result<()> {
        let mut terminal = ratatui::init();

        loop {
            // Fold every result that arrived since the last frame, in arrival
            // order. Task results never block the loop.
            while let Ok(message) = rx.try_recv() {
                let commands = self.update(message);
                runner.execute_all(commands);
            }

            terminal.draw(|frame| self.render(frame))?;

            let message = if event::poll(POLL_INTERVAL)? {
                match event::read()? {
                    // Windows compatibility: only handle Press events
                    Event::Key(key) if key.kind == KeyEventKind::Press => Message::Key(key),
                    _ => continue,
                }
            } else {
                Message::Tick
            };
            let commands = self.update(message);
            runner.execute_all(commands);

            if self.should_quit {
                break;
            }
        }

        tracing::info!(pending = runner.pending(), "quitting");
        Ok(())
    }

    /// Fold one message into the state and return the work it asks for.
    pub fn update(&mut self, message: Message) -> Vec<Command> {
        match message {
            Message::Key(key) => self.handle_key(key),
            Message::Tick => {
                if let Screen::Details(state) = &self.screen
                    && matches!(state.mode, DetailsMode::Waiting)
                {
                    self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
                }
                Vec::new()
            }
            Message::CatalogLoaded(catalog) => {
                if catalog.is_empty() {
                    tracing::warn!("game list is empty");
                }
                self.search.set_suggestions(catalog.names());
                self.catalog = catalog;
                self.catalog_status = CatalogStatus::Ready;
                Vec::new()
            }
            Message::DetailsLoaded { id, details } => {
                match &mut self.screen {
                    Screen::Details(state) if state.id == id => {
                        if details.id != id {
                            tracing::debug!(id, payload_id = details.id, "store returned a different app id");
                        }
                        state.details = Some(details);
                        state.focus_index = 0;
                    }
                    _ => tracing::debug!(id, "discarding details for a closed screen"),
                }
                Vec::new()
            }
            Message::DownloadDone { id } => {
                tracing::info!(id, "download finished");
                if let Screen::Details(state) = &mut self.screen
                    && matches!(state.mode, DetailsMode::Waiting)
                {
                    state.mode = DetailsMode::Normal;
                }
                Vec::new()
            }
            Message::Failed(err) => self.handle_failure(err),
            Message::ErrorExpired(token) => {
                if self.error.as_ref().is_some_and(|e| e.token == token) {
                    self.error = None;
                }
                Vec::new()
            }
        }
    }

    fn handle_failure(&mut self, err: TaskError) -> Vec<Command> {
        match &err {
            TaskError::Catalog(_) => self.catalog_status = CatalogStatus::Unavailable,
            TaskError::Details { id, .. } => {
                let is_open = matches!(&self.screen, Screen::Details(state) if state.id == *id);
                if !is_open {
                    tracing::debug!(id, error = %err, "discarding failure for a closed screen");
                    return Vec::new();
                }
                self.screen = Screen::Search;
            }
            TaskError::Download { .. } => {
                if let Screen::Details(state) = &mut self.screen
                    && matches!(state.mode, DetailsMode::Waiting)
                {
                    state.mode = DetailsMode::Normal;
                }
            }
        }
        tracing::warn!(error = %err, "task failed");
        self.show_error(err.to_string())
    }

    fn show_error(&mut self, message: String) -> Vec<Command> {
        let token = self.next_error_token;
        self.next_error_token += 1;
        self.error = Some(TransientError { message, token });
        vec![Command::ExpireError {
            token,
            after: ERROR_DISPLAY,
        }]
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Command> {
        // Ctrl+C quits from anywhere, including while a download runs
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Vec::new();
        }

        if matches!(self.screen, Screen::Search) {
            self.handle_search_key(key.code)
        } else {
            self.handle_details_key(key.code)
        }
    }

    fn handle_search_key(&mut self, key: KeyCode) -> Vec<Command> {
        if key != KeyCode::Enter {
            self.search.handle_key(key);
            return Vec::new();
        }

        match self.catalog.resolve(self.search.value()) {
            Ok(id) => {
                tracing::info!(id, name = self.search.value(), "opening details");
                self.screen = Screen::Details(DetailsScreen::loading(id));
                vec![Command::FetchDetails(id)]
            }
            Err(e) => {
                tracing::debug!(text = self.search.value(), "search text not in catalog");
                self.show_error(e.to_string())
            }
        }
    }

    fn handle_details_key(&mut self, key: KeyCode) -> Vec<Command> {
        // Extract needed data to avoid borrow conflicts
        enum Action {
            None,
            Back,
            Focus { forward: bool },
            Download,
            PromptKey(KeyCode),
            PromptSubmit,
            PromptCancel,
        }

        let action = match &self.screen {
            Screen::Search => Action::None,
            Screen::Details(state) => match (&state.mode, key) {
                (DetailsMode::Waiting, _) => Action::None,
                (DetailsMode::LoginPrompt(_), KeyCode::Enter) => Action::PromptSubmit,
                (DetailsMode::LoginPrompt(_), KeyCode::Esc) => Action::PromptCancel,
                (DetailsMode::LoginPrompt(_), other) => Action::PromptKey(other),
                (DetailsMode::Normal, KeyCode::Esc) => Action::Back,
                (DetailsMode::Normal, KeyCode::Left) => Action::Focus { forward: false },
                (DetailsMode::Normal, KeyCode::Right) => Action::Focus { forward: true },
                (DetailsMode::Normal, KeyCode::Enter) => Action::Download,
                (DetailsMode::Normal, _) => Action::None,
            },
        };

        if let Action::Back = action {
            self.screen = Screen::Search;
            return Vec::new();
        }

        let Screen::Details(state) = &mut self.screen else {
            return Vec::new();
        };

        match action {
            Action::None | Action::Back => {}
            Action::Focus { forward } => {
                let count = state.platforms().len();
                clamped_nav(&mut state.focus_index, count, forward);
            }
            Action::Download => {
                let Some(platform) = state.focused_platform() else {
                    return Vec::new();
                };
                match self.credentials.cached_username() {
                    Some(username) => {
                        state.mode = DetailsMode::Waiting;
                        return vec![Command::Download(state.download_request(platform, username))];
                    }
                    None => {
                        state.mode = DetailsMode::LoginPrompt(TextInput::new(USERNAME_CHAR_LIMIT));
                    }
                }
            }
            Action::PromptKey(code) => {
                if let DetailsMode::LoginPrompt(input) = &mut state.mode {
                    input.handle_key(code);
                }
            }
            Action::PromptCancel => state.mode = DetailsMode::Normal,
            Action::PromptSubmit => {
                let DetailsMode::LoginPrompt(input) = &state.mode else {
                    return Vec::new();
                };
                let username = input.value().trim().to_string();
                if username.is_empty() {
                    return Vec::new();
                }
                let Some(platform) = state.focused_platform() else {
                    state.mode = DetailsMode::Normal;
                    return Vec::new();
                };
                self.credentials.save_username(&username);
                state.mode = DetailsMode::Waiting;
                return vec![Command::Download(state.download_request(platform, username))];
            }
        }

        Vec::new()
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    fn render(&self, frame: &mut Frame) {
        let error = self.error.as_ref().map(|e| e.message.as_str());
        match &self.screen {
            Screen::Search => render_search(
                frame,
                &self.search,
                self.catalog_status,
                self.catalog.len(),
                error,
            ),
            Screen::Details(state) => {
                render_details(frame, state, error, SPINNER_FRAMES[self.spinner_frame])
            }
        }
    }
}

// ============================================================================
// Screen renderers
// ============================================================================

fn error_line(error: Option<&str>) -> Paragraph<'_> {
    Paragraph::new(error.unwrap_or("")).style(
        Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::BOLD),
    )
}

fn footer(text: &str) -> Paragraph<'_> {
    Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .centered()
}

fn render_search(
    frame: &mut Frame,
    input: &TextInput,
    status: CatalogStatus,
    game_count: usize,
    error: Option<&str>,
) {
    let area = frame.area();

    let [error_area, title, _, input_area, status_area, _, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(area);

    frame.render_widget(error_line(error), error_area);
    frame.render_widget(Paragraph::new("Select a game:"), title);

    let prompt = "# ";
    let mut spans = vec![
        Span::styled(prompt, Style::default().fg(Color::Blue)),
        Span::raw(input.value()),
    ];
    if let Some(hint) = input.completion_hint() {
        spans.push(Span::styled(hint, Style::default().fg(Color::DarkGray)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), input_area);

    let status_text = match status {
        CatalogStatus::Loading => "Loading game list...".to_string(),
        CatalogStatus::Ready => format!("{} games", game_count),
        CatalogStatus::Unavailable => "Game list unavailable".to_string(),
    };
    frame.render_widget(
        Paragraph::new(status_text).style(Style::default().fg(Color::DarkGray)),
        status_area,
    );

    frame.render_widget(
        footer("Enter Select | Tab Complete | ↑↓ Suggestions | Ctrl+C Quit"),
        footer_area,
    );

    let cursor_x = input_area.x.saturating_add(cursor_offset(prompt, input));
    frame.set_cursor_position(Position::new(cursor_x, input_area.y));
}

fn render_loading(frame: &mut Frame, message: &str) {
    let area = frame.area();
    let text = Paragraph::new(message)
        .style(Style::default().fg(Color::Cyan))
        .centered();

    let vertical = Layout::vertical([Constraint::Length(1)]).flex(Flex::Center);
    let [center] = vertical.areas(area);
    frame.render_widget(text, center);
}

fn platform_buttons(platforms: &[Platform], focus_index: usize) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, platform) in platforms.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" | "));
        }
        let style = if i == focus_index {
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!("[ {} ]", platform.label()), style));
    }
    Line::from(spans)
}

fn render_details(frame: &mut Frame, state: &DetailsScreen, error: Option<&str>, spinner: &str) {
    let Some(details) = &state.details else {
        render_loading(frame, &format!("Loading app {}...", state.id));
        return;
    };
    let area = frame.area();

    let [error_area, header, _, main, buttons, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    frame.render_widget(error_line(error), error_area);
    frame.render_widget(
        Paragraph::new(Span::styled(
            details.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )),
        header,
    );

    let mut lines: Vec<Line> = Vec::new();
    if !details.description.is_empty() {
        lines.push(Line::styled(
            details.description.as_str(),
            Style::default().add_modifier(Modifier::ITALIC),
        ));
        lines.push(Line::from(""));
    }
    if !details.developers.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Developers: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(details.developers.join(", ")),
        ]));
    }
    let release = if details.release_date.coming_soon {
        format!("coming soon ({})", details.release_date.date)
    } else {
        details.release_date.date.clone()
    };
    if !release.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Released: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(release),
        ]));
    }
    if let Some(website) = details.website.as_deref().filter(|w| !w.is_empty()) {
        lines.push(Line::from(vec![
            Span::styled("Website: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(website),
        ]));
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), main);

    let platforms = state.platforms();
    if platforms.is_empty() {
        frame.render_widget(
            Paragraph::new("No downloadable platforms").style(Style::default().fg(Color::DarkGray)),
            buttons,
        );
    } else {
        frame.render_widget(
            Paragraph::new(platform_buttons(&platforms, state.focus_index)),
            buttons,
        );
    }

    frame.render_widget(
        footer("←→ Platform | Enter Download | Esc Back | Ctrl+C Quit"),
        footer_area,
    );

    match &state.mode {
        DetailsMode::Normal => {}
        DetailsMode::LoginPrompt(input) => render_login_prompt(frame, input),
        DetailsMode::Waiting => {
            render_popup(
                frame,
                " Download ",
                Text::from(format!("{}  Downloading...", spinner)),
                30,
                3,
            );
        }
    }
}

fn render_login_prompt(frame: &mut Frame, input: &TextInput) {
    let label = "Steam username: ";
    let text = Text::from(vec![
        Line::from(vec![Span::styled(label, Style::default().add_modifier(Modifier::BOLD)), Span::raw(input.value())]),
        Line::from(""),
        Line::styled("Enter Confirm | Esc Cancel", Style::default().fg(Color::DarkGray)),
    ]);
    let inner = render_popup(frame, " Login ", text, 44, 5);
    frame.set_cursor_position(Position::new(inner.x.saturating_add(cursor_offset(label, input)), inner.y));
}

/// Terminal columns between the start of `label` and the input cursor.
fn cursor_offset(label: &str, input: &TextInput) -> u16 {
    let width = Line::from(vec![Span::raw(label), Span::raw(input.before_cursor())]).width();
    u16::try_from(width).unwrap_or(u16::MAX)
}

/// Draw `text` in a bordered box centered over whatever is already on screen.
/// Returns the area inside the border.
fn render_popup(frame: &mut Frame, title: &str, text: Text, width: u16, height: u16) -> Rect {
    let popup_area = centered_rect(width, height, frame.area());

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::Black));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);
    frame.render_widget(Paragraph::new(text), inner);
    inner
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([Constraint::Length(height)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Length(width)]).flex(Flex::Center);
    let [v_area] = vertical.areas(area);
    let [h_area] = horizontal.areas(v_area);
    h_area
}
