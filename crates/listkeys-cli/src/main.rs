use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use listkeys_config::Config;
use listkeys_engine::input::TargetRange;
use listkeys_engine::{
    Document, Editor, EventLog, InputDispatcher, InputEvent, Key, Keystroke, ListKeymap, Modifiers,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::{
    env,
    fs::{File, OpenOptions},
    io::{Stdout, stdout},
    path::{Path, PathBuf},
    process,
};

struct App {
    editor: Editor,
    dispatcher: InputDispatcher,
    document_path: Option<PathBuf>,
    /// Simulated IME composition, toggled with Ctrl+K
    composing: bool,
    status: String,
}

impl App {
    fn new(document_path: Option<PathBuf>, config: &Config, keymap: ListKeymap) -> Result<Self> {
        let document = match &document_path {
            Some(path) if path.exists() => {
                let markdown = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                Document::from_markdown(&markdown)?
            }
            _ => Document::new(),
        };

        let mut dispatcher = InputDispatcher::with_list_rules(keymap);
        if config.event_log.enabled {
            dispatcher = dispatcher.with_event_log(EventLog::new(config.event_log.capacity));
        }

        Ok(Self {
            editor: Editor::new(document),
            dispatcher,
            document_path,
            composing: false,
            status: String::new(),
        })
    }

    /// Handle one terminal key press. Returns false when the app should quit.
    fn on_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return false,
            KeyCode::Char('s') if ctrl => {
                self.save();
                return true;
            }
            KeyCode::Char('b') if ctrl => {
                self.press("bulletedList");
                return true;
            }
            KeyCode::Char('n') if ctrl => {
                self.press("numberedList");
                return true;
            }
            KeyCode::Char('k') if ctrl => {
                self.toggle_composition();
                return true;
            }
            _ => {}
        }

        let Some(keystroke) = to_keystroke(&key) else {
            return true;
        };
        let mut key_down = InputEvent::key_down(keystroke);
        if self.composing {
            key_down = key_down.composing();
        }
        self.dispatcher.handle(&mut key_down, &mut self.editor);
        if key_down.is_default_prevented() {
            return true;
        }

        match self.before_input(&key) {
            Some(mut input) => {
                self.dispatcher.handle(&mut input, &mut self.editor);
                self.apply_default(&input);
            }
            None => self.apply_default(&key_down),
        }
        true
    }

    /// The before-input event a browser would fire after this key press
    fn before_input(&self, key: &KeyEvent) -> Option<InputEvent> {
        let word = key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        let (input_type, data) = match key.code {
            KeyCode::Char(c) if !word => ("insertText", Some(c.to_string())),
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                ("insertLineBreak", None)
            }
            KeyCode::Enter => ("insertParagraph", None),
            KeyCode::Backspace if word => ("deleteWordBackward", None),
            KeyCode::Backspace => ("deleteContentBackward", None),
            KeyCode::Delete if word => ("deleteWordForward", None),
            KeyCode::Delete => ("deleteContentForward", None),
            _ => return None,
        };

        let mut event = InputEvent::before_input(input_type, data);
        if let Some((start, end)) = self.editor.document().selection_range() {
            event = event.with_target_range(TargetRange { start, end });
        }
        if self.composing {
            event = event.composing();
        }
        Some(event)
    }

    fn apply_default(&mut self, event: &InputEvent) {
        if let Err(e) = self.editor.apply_default(event) {
            log::warn!("default action failed: {e}");
        }
    }

    fn press(&mut self, button: &str) {
        match self.editor.press(button) {
            Ok(()) => self.status = format!("{button} executed"),
            Err(e) => self.status = e.to_string(),
        }
    }

    fn toggle_composition(&mut self) {
        let mut event = if self.composing {
            InputEvent::composition_end(None)
        } else {
            InputEvent::composition_start()
        };
        self.dispatcher.handle(&mut event, &mut self.editor);
        self.composing = self.dispatcher.is_composing();
    }

    fn save(&mut self) {
        let Some(path) = &self.document_path else {
            self.status = "No file to save to; pass one on the command line".to_string();
            return;
        };
        match std::fs::write(path, self.editor.document().to_markdown()) {
            Ok(()) => {
                log::info!("saved {}", path.display());
                self.status = format!("Saved {}", path.display());
            }
            Err(e) => {
                log::error!("saving {} failed: {e}", path.display());
                self.status = format!("Save failed: {e}");
            }
        }
    }
}

fn to_keystroke(key: &KeyEvent) -> Option<Keystroke> {
    let mut modifiers = Modifiers {
        ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
        alt: key.modifiers.contains(KeyModifiers::ALT),
        shift: key.modifiers.contains(KeyModifiers::SHIFT),
        meta: key
            .modifiers
            .intersects(KeyModifiers::SUPER | KeyModifiers::META),
    };
    let key = match key.code {
        KeyCode::Tab => Key::Tab,
        // Terminals report Shift+Tab as BackTab, not always with the shift flag
        KeyCode::BackTab => {
            modifiers.shift = true;
            Key::Tab
        }
        KeyCode::Enter => Key::Enter,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::Char(c) => {
            if c.is_uppercase() {
                modifiers.shift = true;
            }
            Key::char(c)
        }
        _ => return None,
    };
    Some(Keystroke::new(key, modifiers))
}

fn open_log_file(log_path: &Path) -> Result<File> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("opening log file {}", log_path.display()))
}

fn init_logging(config: &Config) {
    // The terminal belongs to the UI, so logs only ever go to the file
    match open_log_file(&config.log_file_path()) {
        Ok(file) => {
            env_logger::Builder::from_default_env()
                .filter_level(log::LevelFilter::Info)
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        }
        Err(e) => eprintln!("Warning: logging disabled: {e:#}"),
    }
}

fn parse_keymap(config: &Config) -> Result<ListKeymap> {
    let indent = config
        .keystrokes
        .indent
        .parse::<Keystroke>()
        .with_context(|| format!("invalid indent keystroke '{}'", config.keystrokes.indent))?;
    let outdent = config
        .keystrokes
        .outdent
        .parse::<Keystroke>()
        .with_context(|| format!("invalid outdent keystroke '{}'", config.keystrokes.outdent))?;
    Ok(ListKeymap { indent, outdent })
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() > 2 {
        eprintln!("Usage: {} [document.md]", args[0]);
        process::exit(1);
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };
    init_logging(&config);
    log::info!("listkeys starting up");

    let keymap = match parse_keymap(&config) {
        Ok(keymap) => keymap,
        Err(e) => {
            eprintln!("Error: {e:#} in {}", Config::config_path().display());
            process::exit(1);
        }
    };

    let document_path = args
        .get(1)
        .map(PathBuf::from)
        .or_else(|| config.document_path.clone());
    let mut app = App::new(document_path, &config, keymap)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && !app.on_key(key)
        {
            return Ok(());
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    // Toolbar
    let mut buttons = Vec::new();
    for button in app.editor.ui().buttons() {
        let mut style = Style::default();
        if button.is_on {
            style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
        }
        if !button.is_enabled {
            style = style.fg(Color::DarkGray);
        }
        buttons.push(Span::styled(format!(" {} ", button.label), style));
        buttons.push(Span::raw(" "));
    }
    let toolbar = Paragraph::new(Line::from(buttons))
        .block(Block::default().borders(Borders::ALL).title("Lists"));
    f.render_widget(toolbar, rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[1]);

    // Document, with the selection marked as [] or [...]
    let title = match &app.document_path {
        Some(path) => format!("Document - {}", path.display()),
        None => "Document (unsaved)".to_string(),
    };
    let document_lines: Vec<Line> = app
        .editor
        .document()
        .to_fixture()
        .lines()
        .map(|line| Line::from(line.to_string()))
        .collect();
    let document =
        Paragraph::new(document_lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(document, columns[0]);

    // Event log, newest at the bottom
    let height = usize::from(columns[1].height.saturating_sub(2));
    let log_lines: Vec<Line> = match app.dispatcher.event_log() {
        Some(log) => {
            let mut lines: Vec<Line> = log
                .entries()
                .rev()
                .take(height)
                .map(|entry| Line::from(entry.to_string()))
                .collect();
            lines.reverse();
            lines
        }
        None => vec![Line::from("Event log disabled")],
    };
    let event_log =
        Paragraph::new(log_lines).block(Block::default().borders(Borders::ALL).title("Input events"));
    f.render_widget(event_log, columns[1]);

    // Status and help
    let mut help = vec![Span::raw(
        "Esc: Quit | Tab/Shift+Tab: Indent | ^B/^N: Lists | ^K: Composition | ^S: Save",
    )];
    if app.composing {
        help.push(Span::styled(" | composing", Style::default().fg(Color::Green)));
    }
    if !app.status.is_empty() {
        help.push(Span::styled(
            format!(" | {}", app.status),
            Style::default().fg(Color::Yellow),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(help)), rows[2]);
}
