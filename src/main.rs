pub mod app_dirs;
pub mod bank;
pub mod exam;
pub mod history;
pub mod runtime;
pub mod save_code;
pub mod scoring;
pub mod session;
pub mod ui;
pub mod util;

use crate::bank::Question;
use crate::exam::Exam;
use crate::history::ResultsLog;
use crate::runtime::{AppEvent, CrosstermEvents, EventSource};
use crate::session::{Mode, Phase, SessionConfig};
use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
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
use std::{
    error::Error,
    io::{self, stdin},
    time::Duration,
};

const TICK_RATE_MS: u64 = 250;

/// exam practice tui with immediate or simulated grading
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "An exam-practice TUI that drills multiple-choice question banks with per-question feedback or end-of-exam simulation grading, optional timers, stars and notes, and portable save codes for pause and resume."
)]
pub struct Cli {
    /// question bank: a JSON file path or the name of an embedded bank
    #[clap(short = 'b', long, default_value = "sample")]
    bank: String,

    /// number of questions to draw for the session
    #[clap(short = 'n', long, default_value_t = 20)]
    count: usize,

    /// grading mode
    #[clap(short = 'm', long, value_enum, default_value_t = GradingMode::Immediate)]
    mode: GradingMode,

    /// time limit in minutes (0 disables the timer)
    #[clap(short = 't', long, default_value_t = 0)]
    minutes: u64,

    /// keep questions in bank order instead of shuffling
    #[clap(long)]
    no_shuffle: bool,

    /// disable the previous-question control
    #[clap(long)]
    no_back: bool,

    /// resume straight from a save code instead of the home screen
    #[clap(short = 'r', long)]
    resume: Option<String>,
}

#[derive(Debug, Copy, Clone, ValueEnum, strum_macros::Display)]
pub enum GradingMode {
    Immediate,
    Simulation,
}

impl GradingMode {
    fn as_mode(&self) -> Mode {
        match self {
            GradingMode::Immediate => Mode::Immediate,
            GradingMode::Simulation => Mode::Simulation,
        }
    }
}

impl Cli {
    /// Session config from CLI args, with the question count clamped to the
    /// size of the loaded bank.
    fn to_session_config(&self, bank_size: usize) -> SessionConfig {
        SessionConfig {
            shuffle: !self.no_shuffle,
            count: self.count.clamp(1, bank_size.max(1)),
            mode: self.mode.as_mode(),
            allow_back: !self.no_back,
            time_limit_secs: self.minutes.saturating_mul(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Exam,
    Summary,
    Review,
}

/// Text-entry overlays: note editing during a session, save-code entry at
/// home. While one is open, keys feed the buffer instead of the controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    None,
    Note,
    LoadCode,
}

#[derive(Debug)]
pub struct App {
    pub bank: Vec<Question>,
    pub exam: Exam,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub input_buffer: String,
    pub notice: Option<String>,
    pub save_code: Option<String>,
    pub review_scroll: u16,
}

impl App {
    pub fn new(config: SessionConfig, bank: Vec<Question>) -> Self {
        Self {
            bank,
            exam: Exam::new(config),
            screen: Screen::Home,
            input_mode: InputMode::None,
            input_buffer: String::new(),
            notice: None,
            save_code: None,
            review_scroll: 0,
        }
    }

    pub fn start_exam(&mut self) {
        match self.exam.start(&self.bank) {
            Ok(()) => {
                self.screen = Screen::Exam;
                self.notice = None;
                self.save_code = None;
            }
            Err(e) => self.notice = Some(e.to_string()),
        }
    }

    /// Resumes from a pasted save code. On failure the current state is left
    /// untouched and the user just sees a notice.
    fn load_save_code(&mut self, code: &str) {
        match save_code::decode(code) {
            Ok(mut exam) => {
                exam.attach_log(ResultsLog::new());
                self.exam = exam;
                self.screen = Screen::Exam;
                self.notice = None;
            }
            Err(_) => self.notice = Some("Invalid code".to_string()),
        }
    }

    /// Timer poll between keypresses. The session clock only matters while
    /// the exam screen is up.
    pub fn on_tick(&mut self) {
        if self.screen == Screen::Exam && self.exam.check_timeout() {
            self.screen = Screen::Summary;
            self.notice = Some("Time is up! Exam submitted automatically.".to_string());
        }
    }

    /// Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }
        if self.input_mode != InputMode::None {
            self.handle_input_key(key);
            return false;
        }
        match self.screen {
            Screen::Home => self.handle_home_key(key),
            Screen::Exam => {
                self.handle_exam_key(key);
                false
            }
            Screen::Summary => {
                self.handle_summary_key(key);
                false
            }
            Screen::Review => {
                self.handle_review_key(key);
                false
            }
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::None;
                self.input_buffer.clear();
            }
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            KeyCode::Enter => {
                let text = std::mem::take(&mut self.input_buffer);
                let mode = self.input_mode;
                self.input_mode = InputMode::None;
                match mode {
                    InputMode::Note => {
                        let index = self.exam.state.current_index;
                        let _ = self.exam.set_note(index, text);
                    }
                    InputMode::LoadCode => self.load_save_code(&text),
                    InputMode::None => {}
                }
            }
            KeyCode::Char(c) => self.input_buffer.push(c),
            _ => {}
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Enter | KeyCode::Char('s') => {
                self.start_exam();
                false
            }
            KeyCode::Char('l') => {
                self.input_buffer.clear();
                self.input_mode = InputMode::LoadCode;
                false
            }
            KeyCode::Char('q') | KeyCode::Esc => true,
            _ => false,
        }
    }

    fn handle_exam_key(&mut self, key: KeyEvent) {
        // Any keypress counts as an interaction for the timer poll
        if self.exam.check_timeout() {
            self.screen = Screen::Summary;
            self.notice = Some("Time is up! Exam submitted automatically.".to_string());
            return;
        }
        if key.code != KeyCode::Char('v') {
            self.save_code = None;
        }

        let index = self.exam.state.current_index;
        let immediate = self.exam.config.mode == Mode::Immediate;
        let locked = self.exam.state.is_locked(index);

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.exam.to_home();
                self.screen = Screen::Home;
                self.notice = None;
            }
            KeyCode::Left => self.exam.retreat(),
            KeyCode::Right => self.advance_or_warn(immediate, locked),
            KeyCode::Enter => {
                if immediate && !locked {
                    match self.exam.submit(index) {
                        Ok(()) => self.notice = None,
                        Err(e) => self.notice = Some(e.to_string()),
                    }
                } else {
                    self.advance_or_warn(immediate, locked);
                }
            }
            KeyCode::Char('m') => {
                let _ = self.exam.toggle_star(index);
            }
            KeyCode::Char('e') => {
                self.input_buffer = self
                    .exam
                    .state
                    .notes
                    .get(&index)
                    .cloned()
                    .unwrap_or_default();
                self.input_mode = InputMode::Note;
            }
            KeyCode::Char('v') => {
                self.save_code = Some(save_code::encode(&self.exam));
            }
            KeyCode::Char(c) => {
                let label = c.to_ascii_uppercase().to_string();
                let known = self
                    .exam
                    .state
                    .current_question()
                    .is_some_and(|q| q.options.contains_key(&label));
                if known {
                    let _ = self.exam.select_answer(index, &label);
                    self.notice = None;
                }
            }
            _ => {}
        }

        if self.exam.phase == Phase::Finished {
            self.screen = Screen::Summary;
        }
    }

    /// Immediate mode requires a submission before moving on; simulation
    /// mode (and an already-locked question) advances freely.
    fn advance_or_warn(&mut self, immediate: bool, locked: bool) {
        if immediate && !locked {
            self.notice = Some("Submit an answer first".to_string());
            return;
        }
        let _ = self.exam.advance();
        self.notice = None;
    }

    fn handle_summary_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('h') | KeyCode::Esc | KeyCode::Char('q') => {
                self.exam.to_home();
                self.screen = Screen::Home;
                self.notice = None;
            }
            KeyCode::Char('n') => {
                self.exam.new_exam();
                self.screen = Screen::Home;
                self.notice = None;
            }
            KeyCode::Char('r') => match self.exam.retry_missed() {
                Ok(()) => {
                    self.screen = Screen::Exam;
                    self.notice = None;
                }
                Err(e) => self.notice = Some(e.to_string()),
            },
            KeyCode::Char('v') | KeyCode::Enter => {
                self.review_scroll = 0;
                self.screen = Screen::Review;
            }
            _ => {}
        }
    }

    fn handle_review_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.review_scroll = self.review_scroll.saturating_sub(1),
            KeyCode::Down => self.review_scroll = self.review_scroll.saturating_add(1),
            KeyCode::PageUp => self.review_scroll = self.review_scroll.saturating_sub(10),
            KeyCode::PageDown => self.review_scroll = self.review_scroll.saturating_add(10),
            KeyCode::Char('b') | KeyCode::Backspace | KeyCode::Esc => {
                self.screen = Screen::Summary;
            }
            _ => {}
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let questions = bank::load_bank(&cli.bank)?;
    let config = cli.to_session_config(questions.len());
    let mut app = App::new(config, questions);

    if let Some(code) = cli.resume.as_deref() {
        match save_code::decode(code) {
            Ok(mut exam) => {
                exam.attach_log(ResultsLog::new());
                app.exam = exam;
                app.screen = Screen::Exam;
            }
            Err(e) => return Err(Box::new(e)),
        }
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app, &mut CrosstermEvents);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run<B: Backend, E: EventSource>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    events: &mut E,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        match events.next(Duration::from_millis(TICK_RATE_MS))? {
            AppEvent::Tick => app.on_tick(),
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if app.handle_key(key) {
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
impl App {
    /// App over a small deterministic bank with result logging disabled.
    pub fn sample(mode: Mode, count: usize) -> Self {
        use std::collections::BTreeMap;

        let bank: Vec<Question> = (0..count + 2)
            .map(|n| Question {
                question_text: format!("question {n}"),
                options: BTreeMap::from([
                    ("A".to_string(), "first".to_string()),
                    ("B".to_string(), "second".to_string()),
                    ("C".to_string(), "third".to_string()),
                ]),
                answer_key: "A".to_string(),
                rationale: format!("rationale {n}"),
            })
            .collect();
        let config = SessionConfig {
            shuffle: false,
            count,
            mode,
            allow_back: true,
            time_limit_secs: 0,
        };
        Self {
            bank,
            exam: Exam::with_log(config, None),
            screen: Screen::Home,
            input_mode: InputMode::None,
            input_buffer: String::new(),
            notice: None,
            save_code: None,
            review_scroll: 0,
        }
    }
}
