mod ui;

use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use chrono::{DateTime, Utc};
use clap::{error::ErrorKind, CommandFactory, Parser};
use coach::{
    app_dirs::AppDirs,
    assistant::{spawn_answer, Assistant, Reply, Spoken},
    config::{Config, ConfigStore, FileConfigStore},
    gemini::GeminiClient,
    logging,
    playback::RodioPlayer,
    runtime::{CoachEvent, CoachEventSource, CrosstermEventSource, FixedTicker, Runner, Ticker},
    schedule::{Phase, PhaseStatus, ScheduleError},
    session::SessionContext,
    speech::GoogleTts,
    tutor::{build_instruction, StudentClass, Subject, TutorError, TutorRequest},
};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::ui::ui;

const TICK_RATE_MS: u64 = 250;
const SCROLL_STEP: u16 = 5;

pub const MISSING_KEY_NOTICE: &str =
    "Enter an API key (--api-key or GEMINI_API_KEY) to ask questions.";

/// terminal study coach: ask commerce doubts while a 30m study / 5m break timer runs
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal study coach for CBSE commerce students. Ask doubts to a hosted tutor model, hear replies read aloud, and follow a 3-hour schedule of 30 minute study blocks and 5 minute breaks."
)]
pub struct Cli {
    /// Gemini API key
    #[clap(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// student name the tutor addresses
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// class the student is in
    #[clap(short = 'c', long, value_enum)]
    class: Option<StudentClass>,

    /// subject to start with
    #[clap(short = 's', long, value_enum)]
    subject: Option<Subject>,

    /// read replies aloud
    #[clap(long)]
    voice: bool,

    /// ask for short revision-style answers
    #[clap(long)]
    concise: bool,

    /// model to use instead of the first one that supports generateContent
    #[clap(short = 'm', long)]
    model: Option<String>,

    /// path of the settings file
    #[clap(long)]
    config: Option<PathBuf>,

    /// also keep spoken replies as MP3 files in this directory
    #[clap(long)]
    speech_dir: Option<PathBuf>,
}

impl Cli {
    /// Layer command line values over the stored settings
    fn apply(&self, mut config: Config) -> Config {
        if let Some(name) = &self.name {
            config.profile.name = name.clone();
        }
        if let Some(class) = self.class {
            config.profile.class = class;
        }
        if let Some(subject) = self.subject {
            config.subject = subject;
        }
        if self.voice {
            config.voice = true;
        }
        if self.concise {
            config.concise = true;
        }
        if let Some(model) = &self.model {
            config.model = Some(model.clone());
        }
        config
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// One-line message under the chat; collaborator failures end up here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug)]
pub enum Command {
    Continue,
    Quit,
    Ask(TutorRequest),
}

#[derive(Debug)]
pub struct App {
    pub config: Config,
    pub session: SessionContext,
    pub input: String,
    pub notice: Option<Notice>,
    pub pending: bool,
    pub can_ask: bool,
    /// Chat lines scrolled up from the bottom; clamped while rendering.
    pub scroll_back: u16,
    pub now: DateTime<Utc>,
    last_phase: Phase,
}

impl App {
    pub fn new(config: Config, can_ask: bool, now: DateTime<Utc>) -> Self {
        let session = SessionContext::new(config.plan, config.subject);
        Self {
            config,
            session,
            input: String::new(),
            notice: None,
            pending: false,
            can_ask,
            scroll_back: 0,
            now,
            last_phase: Phase::NotStarted,
        }
    }

    pub fn status(&self) -> Result<PhaseStatus, ScheduleError> {
        self.session.status(self.now)
    }

    pub fn tick(&mut self, now: DateTime<Utc>) {
        self.now = now;
        match self.status() {
            Ok(status) if status.phase != self.last_phase => {
                log::info!("phase {:?} -> {:?}", self.last_phase, status.phase);
                self.last_phase = status.phase;
            }
            Ok(_) => {}
            Err(e) => log::warn!("{}", e),
        }
    }

    /// Effective settings to persist on exit.
    pub fn settings(&self) -> Config {
        Config {
            subject: self.session.subject,
            ..self.config.clone()
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Command {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return Command::Quit,
            KeyCode::Char('c') if ctrl => return Command::Quit,
            KeyCode::Char('t') if ctrl => self.toggle_study(),
            KeyCode::Char('r') if ctrl => self.reset_study(),
            KeyCode::Char('l') if ctrl => {
                self.session.clear_chat();
                self.scroll_back = 0;
            }
            KeyCode::Char('v') if ctrl => {
                self.config.voice = !self.config.voice;
                self.notice = Some(Notice::info(if self.config.voice {
                    format!("Voice on ({} accent)", self.config.voice_locale.accent())
                } else {
                    "Voice off".to_string()
                }));
            }
            KeyCode::Char('o') if ctrl => {
                self.config.concise = !self.config.concise;
                self.notice = Some(Notice::info(if self.config.concise {
                    "Concise / revision mode on"
                } else {
                    "Detailed answers on"
                }));
            }
            KeyCode::Tab => self.session.subject = self.session.subject.next(),
            KeyCode::BackTab => self.session.subject = self.session.subject.previous(),
            KeyCode::Enter => return self.submit(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::PageUp => self.scroll_back = self.scroll_back.saturating_add(SCROLL_STEP),
            KeyCode::PageDown => self.scroll_back = self.scroll_back.saturating_sub(SCROLL_STEP),
            KeyCode::Char(c) if !ctrl => self.input.push(c),
            _ => {}
        }
        Command::Continue
    }

    pub fn submit(&mut self) -> Command {
        let prompt = self.input.trim().to_string();
        if prompt.is_empty() {
            return Command::Continue;
        }
        if !self.can_ask {
            self.notice = Some(Notice::error(MISSING_KEY_NOTICE));
            return Command::Continue;
        }
        if self.pending {
            self.notice = Some(Notice::warning("Still thinking about your last question..."));
            return Command::Continue;
        }

        self.session.push_user(prompt.clone());
        self.input.clear();
        self.pending = true;
        self.scroll_back = 0;
        self.notice = None;

        Command::Ask(TutorRequest {
            prompt,
            instruction: build_instruction(
                &self.config.profile,
                self.session.subject,
                self.config.concise,
            ),
            voice: self
                .config
                .voice
                .then(|| self.config.voice_locale.clone()),
        })
    }

    pub fn on_reply(&mut self, result: Result<Reply, TutorError>) {
        self.pending = false;
        match result {
            Ok(reply) => {
                self.session.push_assistant(reply.text);
                self.scroll_back = 0;
                self.notice = match reply.speech {
                    Some(Ok(Spoken {
                        saved_to: Some(path),
                    })) => Some(Notice::info(format!(
                        "Spoken reply saved to {}",
                        path.display()
                    ))),
                    Some(Err(e)) => Some(Notice::warning(format!("Voice error: {}", e))),
                    Some(Ok(_)) | None => None,
                };
            }
            Err(TutorError::MissingApiKey) => {
                self.notice = Some(Notice::error(MISSING_KEY_NOTICE));
            }
            Err(e) => {
                self.notice = Some(Notice::error(format!("Error: {}", e)));
            }
        }
    }

    fn toggle_study(&mut self) {
        match self.status() {
            Ok(status) if status.phase == Phase::NotStarted => {
                self.session.start_study(self.now);
                self.notice = Some(Notice::info(format!(
                    "Study session started. {}",
                    self.session.plan.goal_summary()
                )));
            }
            _ => {
                self.session.stop_study();
                self.notice = Some(Notice::info("Study session stopped."));
            }
        }
    }

    fn reset_study(&mut self) {
        self.notice = Some(match self.session.reset_study(self.now) {
            Ok(true) => Notice::info("Session reset. Ready for another round."),
            Ok(false) if self.session.is_studying() => {
                Notice::warning("Session still in progress; Ctrl-T stops it.")
            }
            Ok(false) => Notice::warning("No finished session to reset."),
            Err(e) => Notice::error(format!("Timer error: {}", e)),
        });
    }
}

fn build_assistant(cli: &Cli, config: &Config) -> Result<Option<Arc<Assistant>>, Box<dyn Error>> {
    let Some(api_key) = cli.api_key.clone().filter(|k| !k.trim().is_empty()) else {
        log::warn!("no API key configured; questions are disabled");
        return Ok(None);
    };
    let generator = GeminiClient::new(api_key, config.model.clone())?;
    let synthesizer = GoogleTts::new()?;
    let assistant = Assistant::new(
        Box::new(generator),
        Box::new(synthesizer),
        Box::new(RodioPlayer::new()),
    )
    .with_speech_dir(cli.speech_dir.clone());
    Ok(Some(Arc::new(assistant)))
}

fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(path) = AppDirs::log_path() {
        if let Err(e) = logging::init(&path) {
            eprintln!("logging disabled: {}", e);
        }
    }

    let store = cli.config_store();
    let config = cli.apply(store.load());
    config.plan.validate()?;
    let assistant = build_assistant(&cli, &config)?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, assistant.is_some(), Utc::now());
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = run_app(&mut terminal, &mut app, &runner, assistant);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    if let Err(e) = store.save(&app.settings()) {
        log::warn!("could not save settings to {}: {}", store.path().display(), e);
    }

    result
}

fn run_app<B: Backend, E: CoachEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
    assistant: Option<Arc<Assistant>>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui(app, f))?;

    loop {
        let event = runner.step();
        app.tick(Utc::now());

        match event {
            CoachEvent::Tick | CoachEvent::Resize => {}
            CoachEvent::Reply(result) => app.on_reply(result),
            CoachEvent::Key(key) => match app.handle_key(key) {
                Command::Quit => break,
                Command::Continue => {}
                Command::Ask(request) => match &assistant {
                    Some(assistant) => {
                        spawn_answer(Arc::clone(assistant), request, runner.sender());
                    }
                    None => app.on_reply(Err(TutorError::MissingApiKey)),
                },
            },
        }

        terminal.draw(|f| ui(app, f))?;
    }

    Ok(())
}
