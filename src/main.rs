use clap::{error::ErrorKind, ArgGroup, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use dangerwrite::{
    app_dirs::AppDirs,
    clock::{Clock, SystemClock},
    config::{Config, ConfigStore, FileConfigStore},
    controller::{Notice, SessionController, StartError},
    document::{Document, TextBuffer},
    goal::{parse_minutes, parse_word_target, SessionConfig, SessionGoal},
    logging,
    runtime::{CrosstermEventSource, EditorEvent, EventSource, FixedTicker, Runner, Ticker},
    ui::{status_bar::StatusBar, EditorView},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs,
    io::{self, stdin},
    path::PathBuf,
};

/// dangerous writing: keep typing or lose what you wrote
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal editor for dangerous writing sessions. Pick a time or word goal; stop typing for too long and everything you wrote this session is deleted."
)]
#[clap(group(ArgGroup::new("goal").required(true).args(["timer", "words"])))]
pub struct Cli {
    /// session length in minutes (decimals allowed, up to 180)
    #[clap(short = 't', long, value_name = "MINUTES", value_parser = parse_minutes)]
    timer: Option<SessionGoal>,

    /// number of new words to write (up to 10000)
    #[clap(short = 'w', long, value_name = "COUNT", value_parser = parse_word_target)]
    words: Option<SessionGoal>,

    /// seconds without typing before the warning starts (overrides config)
    #[clap(short = 'i', long, value_name = "SECS")]
    inactivity: Option<u32>,

    /// seconds of warning before your text is deleted (overrides config)
    #[clap(short = 'c', long, value_name = "SECS")]
    countdown: Option<u32>,

    /// persist --inactivity / --countdown as the new defaults
    #[clap(long)]
    save_config: bool,

    /// file to write in; text already in it is never deleted
    file: Option<PathBuf>,
}

impl Cli {
    fn goal(&self) -> Option<SessionGoal> {
        self.timer.or(self.words)
    }

    fn apply_overrides(&self, settings: &mut Config) {
        if let Some(secs) = self.inactivity {
            settings.inactivity_threshold = secs;
        }
        if let Some(secs) = self.countdown {
            settings.delete_countdown = secs;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    None,
    SessionStarted,
    Quit,
}

pub struct App<C: Clock + Clone> {
    pub buffer: TextBuffer,
    pub controller: SessionController<C, StatusBar>,
    pub goal: SessionGoal,
    pub notice: Option<Notice>,
    pub file: Option<PathBuf>,
    clock: C,
    confirm_replace: bool,
}

impl<C: Clock + Clone> App<C> {
    pub fn new(
        goal: SessionGoal,
        settings: Config,
        buffer: TextBuffer,
        file: Option<PathBuf>,
        clock: C,
    ) -> Self {
        Self {
            buffer,
            controller: SessionController::new(settings),
            goal,
            notice: None,
            file,
            clock,
            confirm_replace: false,
        }
    }

    /// Start a session on the buffer. Returns true if one started.
    fn start_session(&mut self, replace: bool) -> bool {
        let result = self.controller.start(
            self.goal,
            Some(&self.buffer),
            self.clock.clone(),
            StatusBar::new(),
            replace,
        );
        match result {
            Ok(notice) => {
                self.notice = Some(notice);
                true
            }
            Err(StartError::AlreadyActive) => {
                self.confirm_replace = true;
                self.notice = Some(Notice::info(
                    "A session is already active. Press Ctrl+N again to stop it and start a new one.",
                ));
                false
            }
            Err(err) => {
                tracing::warn!(%err, "session did not start");
                self.notice = Some(Notice::error(err.to_string()));
                false
            }
        }
    }

    fn on_tick(&mut self) {
        if let Some(outcome) = self.controller.on_tick(&mut self.buffer) {
            self.notice = Notice::for_outcome(&outcome);
        }
    }

    fn on_edit(&mut self) {
        let id = self.buffer.id();
        if let Some(outcome) = self.controller.on_document_change(id, &self.buffer) {
            self.notice = Notice::for_outcome(&outcome);
        }
    }

    fn save(&mut self) {
        let Some(path) = self.file.as_ref() else {
            self.notice = Some(Notice::error(
                "Nothing to save to: start with a FILE argument.",
            ));
            return;
        };
        self.notice = Some(match fs::write(path, self.buffer.text()) {
            Ok(()) => Notice::info(format!("Saved {}", path.display())),
            Err(err) => {
                tracing::error!(path = %path.display(), %err, "save failed");
                Notice::error(format!("Could not save {}: {err}", path.display()))
            }
        });
    }

    /// Host teardown: the document goes away with the editor.
    fn close(&mut self) {
        self.controller.on_document_closed(self.buffer.id());
        self.controller.shutdown();
        if self.file.is_some() {
            self.save();
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let replace = std::mem::take(&mut self.confirm_replace);

        if ctrl {
            return match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => Action::Quit,
                KeyCode::Char('s') => {
                    self.save();
                    Action::None
                }
                KeyCode::Char('n') => {
                    if self.start_session(replace) {
                        Action::SessionStarted
                    } else {
                        Action::None
                    }
                }
                _ => Action::None,
            };
        }

        let edited = match key.code {
            KeyCode::Esc => {
                if !self.controller.is_active() {
                    return Action::Quit;
                }
                self.notice = Some(self.controller.stop());
                false
            }
            KeyCode::Char(c) => {
                self.buffer.insert_char(c);
                true
            }
            KeyCode::Enter => {
                self.buffer.insert_newline();
                true
            }
            KeyCode::Tab => {
                self.buffer.insert_char('\t');
                true
            }
            KeyCode::Backspace => self.buffer.backspace(),
            KeyCode::Delete => self.buffer.delete_forward(),
            KeyCode::Left => {
                self.buffer.move_left();
                false
            }
            KeyCode::Right => {
                self.buffer.move_right();
                false
            }
            KeyCode::Home => {
                self.buffer.move_home();
                false
            }
            KeyCode::End => {
                self.buffer.move_end();
                false
            }
            _ => false,
        };

        if edited {
            self.on_edit();
        }
        Action::None
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let _log_guard = AppDirs::log_path().and_then(|path| logging::init_file_logging(&path).ok());

    let store = FileConfigStore::new();
    let mut settings = store.load();
    cli.apply_overrides(&mut settings);

    let Some(goal) = cli.goal() else {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::MissingRequiredArgument, "either --timer or --words is required")
            .exit();
    };
    if let Err(err) = SessionConfig::new(goal, &settings) {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::InvalidValue, err).exit();
    }
    if cli.save_config {
        store.save(&settings)?;
        tracing::info!(path = %store.path().display(), "saved config");
    }

    let buffer = match cli.file.as_ref() {
        Some(path) => match fs::read_to_string(path) {
            Ok(text) => TextBuffer::from_text(text),
            Err(err) if err.kind() == io::ErrorKind::NotFound => TextBuffer::new(),
            Err(err) => return Err(err.into()),
        },
        None => TextBuffer::new(),
    };

    let mut app = App::new(goal, settings, buffer, cli.file.clone(), SystemClock);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    let result = start_tui(&mut terminal, &mut app, runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, C: Clock + Clone, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App<C>,
    mut runner: Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    if app.start_session(false) {
        runner.start_ticking();
    }

    loop {
        terminal.draw(|f| ui(app, f))?;

        let Some(event) = runner.step() else {
            break;
        };
        match event {
            EditorEvent::Tick => app.on_tick(),
            EditorEvent::Resize => {}
            EditorEvent::Key(key) => match app.handle_key(key) {
                Action::Quit => break,
                Action::SessionStarted => runner.start_ticking(),
                Action::None => {}
            },
        }

        // The clock lives exactly as long as the session.
        if !app.controller.is_active() {
            runner.stop_ticking();
        }
    }

    app.close();
    Ok(())
}

fn ui<C: Clock + Clone>(app: &App<C>, f: &mut Frame) {
    let session = app.controller.active();
    let view = EditorView {
        buffer: &app.buffer,
        session_start: session.map(|s| s.runtime().start_text_len),
        status: session.map(|s| s.presenter()),
        notice: app.notice.as_ref(),
    };
    f.render_widget(view, f.area());
}
