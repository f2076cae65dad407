pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use speedy_words::{
    config::{FileSettingsStore, Settings, SettingsStore},
    engine::{RoundEngine, ROUND_CHOICES},
    logging,
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    GameStatus,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

const FRAME_RATE_MS: u64 = 100;

/// wacky reaction game: hit the key for the word before the countdown runs out
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A wacky reaction game for the terminal. Each round shows a word; press its key within three seconds. Fast hits score up to 1000 points, wrong keys cost 100 and timeouts cost 75."
)]
pub struct Cli {
    /// number of rounds per game: 10, 20, 30 or 50 (defaults to your last choice)
    #[clap(short = 'r', long, value_parser = parse_round_count)]
    rounds: Option<u32>,

    /// write logs to this file (filter with RUST_LOG)
    #[clap(long)]
    log_file: Option<PathBuf>,
}

fn parse_round_count(s: &str) -> Result<u32, String> {
    let rounds: u32 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if ROUND_CHOICES.contains(&rounds) {
        Ok(rounds)
    } else {
        Err(format!("rounds must be one of {:?}", ROUND_CHOICES))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ExitType {
    Continue,
    Quit,
}

pub struct App {
    pub engine: RoundEngine,
    settings_store: Option<Box<dyn SettingsStore>>,
}

impl App {
    pub fn new(total_rounds: u32) -> Self {
        Self {
            engine: RoundEngine::new(total_rounds),
            settings_store: None,
        }
    }

    pub fn with_settings_store<S: SettingsStore + 'static>(mut self, store: S) -> Self {
        self.settings_store = Some(Box::new(store));
        self
    }

    /// Step the menu's round count through the offered choices
    fn cycle_rounds(&mut self, forward: bool) {
        let current = ROUND_CHOICES
            .iter()
            .position(|&n| n == self.engine.total_rounds())
            .unwrap_or(0);
        let len = ROUND_CHOICES.len();
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        self.engine.set_total_rounds(ROUND_CHOICES[next]);
    }

    fn start(&mut self) {
        let total_rounds = self.engine.total_rounds();
        if let Some(store) = &self.settings_store {
            if let Err(err) = store.save(&Settings { total_rounds }) {
                log::warn!("could not save settings: {}", err);
            }
        }
        self.engine.start_game(total_rounds);
    }

    fn handle_key(&mut self, key: KeyEvent) -> ExitType {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return ExitType::Quit;
        }

        match self.engine.status() {
            GameStatus::NotStarted => match key.code {
                KeyCode::Left | KeyCode::Char('h') => self.cycle_rounds(false),
                KeyCode::Right | KeyCode::Char('l') => self.cycle_rounds(true),
                KeyCode::Enter | KeyCode::Char(' ') => self.start(),
                _ => {}
            },
            GameStatus::Playing => {
                if let KeyCode::Char(c) = key.code {
                    self.engine.on_key_press(&c.to_string());
                }
            }
            GameStatus::Finished => match key.code {
                KeyCode::Enter | KeyCode::Char('p') => self.engine.reset_to_menu(),
                KeyCode::Char('r') => self.start(),
                _ => {}
            },
        }

        ExitType::Continue
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    logging::init(cli.log_file.as_deref())?;

    let store = FileSettingsStore::new();
    let total_rounds = cli.rounds.unwrap_or_else(|| store.load().total_rounds);
    log::info!(
        "launching with {} rounds, settings at {}",
        total_rounds,
        store.path().display()
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(total_rounds).with_settings_store(store);
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(FRAME_RATE_MS)),
    );

    terminal.draw(|f| ui(app, f))?;

    loop {
        match runner.step(app.engine.next_tick_due()) {
            GameEvent::Tick => {
                app.engine.poll_tick();
            }
            GameEvent::Key(key) => {
                if app.handle_key(key) == ExitType::Quit {
                    break;
                }
            }
            GameEvent::Resize | GameEvent::Frame => {}
        }
        terminal.draw(|f| ui(app, f))?;
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}
