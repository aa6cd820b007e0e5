use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::OpenOptions,
    io::{self, stdin},
    path::PathBuf,
    sync::mpsc,
    time::Duration,
};
use whackamole::{
    app::App,
    clock::{Clock, SystemClock},
    completion::{ChannelSink, JsonLinesSink},
    config::{ConfigStore, FileConfigStore},
    logging::init_logging,
    runtime::{CrosstermEventSource, GameEvent, Runner},
    Session, Settings, TICK_RATE_MS,
};

/// whack the moles before the clock runs out
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal whack-a-mole. Moles pop up in a 3x3 grid of holes; hit them with the number keys before they duck back down. Each finished session prints a completion record as JSON."
)]
pub struct Cli {
    /// seed for mole placement and timing (same seed, same game)
    #[clap(long)]
    seed: Option<u64>,

    /// settings file (json); defaults to the platform config directory
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// append every completion record to this file as a JSON line
    #[clap(long)]
    completion_log: Option<PathBuf>,

    /// write logs to this file
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// log verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// milliseconds between screen refreshes
    #[clap(long, default_value_t = TICK_RATE_MS)]
    tick_ms: u64,

    /// write the default settings to the config file and exit
    #[clap(long)]
    write_default_config: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let store = cli
        .config
        .as_ref()
        .map(FileConfigStore::with_path)
        .unwrap_or_default();
    if cli.write_default_config {
        store.save(&Settings::default())?;
        println!("{}", store.path().display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }
    if cli.tick_ms == 0 {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, "--tick-ms must be at least 1")
            .exit();
    }

    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let settings = store.load();
    if let Err(err) = settings.validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, err).exit();
    }

    let mut session = match cli.seed {
        Some(seed) => Session::seeded(settings, seed),
        None => Session::new(settings),
    };

    let (tx, rx) = mpsc::channel();
    session.subscribe(Box::new(ChannelSink::new(tx)));
    if let Some(path) = &cli.completion_log {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        session.subscribe(Box::new(JsonLinesSink::new(file)));
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session);
    let result = start_tui(&mut terminal, &mut app, Duration::from_millis(cli.tick_ms));

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result?;

    // Completion records go out once the normal screen is back.
    for record in rx.try_iter() {
        println!("{}", record.to_json()?);
    }

    Ok(())
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    tick: Duration,
) -> Result<(), Box<dyn Error>> {
    let clock = SystemClock::new();
    let runner = Runner::new(CrosstermEventSource::new(), tick);

    loop {
        terminal.draw(|f| ui(app, f))?;

        match runner.step() {
            GameEvent::Tick => app.on_tick(clock.now()),
            GameEvent::Resize => {}
            GameEvent::Key(key) => app.on_key(key, clock.now()),
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}
