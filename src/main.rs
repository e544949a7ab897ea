use std::{
    io::{self, stdin},
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Context;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{info, warn};

use typewise::{
    app::App,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore, Theme},
    history::ResultLog,
    keystroke::TabPolicy,
    logging,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    stats::{ErrorStats, MemoryErrorStats, SqliteErrorStats},
    texts::{TextSource, Topic},
};

const TICK_RATE_MS: u64 = 100;

/// terminal typing practice with glossed texts and live metrics
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type practice texts in the terminal. Annotated texts show a gloss for the word under the cursor, mistakes must be fixed before moving on, and every session ends with a WPM chart and an error map."
)]
pub struct Cli {
    /// built-in topic to practice
    #[clap(short = 't', long, value_enum)]
    topic: Option<Topic>,

    /// session length in seconds, 0 for unlimited
    #[clap(short = 's', long)]
    secs: Option<u64>,

    /// custom text to practice; `[word](gloss)` annotations allowed
    #[clap(short = 'p', long, conflicts_with_all = ["file", "csv"])]
    prompt: Option<String>,

    /// read the practice text from a file
    #[clap(short = 'f', long, conflicts_with = "csv")]
    file: Option<PathBuf>,

    /// import a `surface,gloss` vocabulary list
    #[clap(long)]
    csv: Option<PathBuf>,

    /// color theme
    #[clap(long, value_enum)]
    theme: Option<Theme>,

    /// check the spaces a Tab produces against the text
    #[clap(long)]
    strict_tab: bool,

    /// clear the stored per-character error counts before starting
    #[clap(long)]
    reset_stats: bool,
}

impl Cli {
    /// Command-line values win over the stored config.
    fn apply(&self, config: &mut Config) {
        if let Some(topic) = self.topic {
            config.topic = topic;
        }
        if let Some(secs) = self.secs {
            config.time_limit_secs = secs;
        }
        if let Some(theme) = self.theme {
            config.theme = theme;
        }
        if self.strict_tab {
            config.tab_policy = TabPolicy::Validate;
        }
    }

    fn text_source(&self, topic: Topic) -> typewise::error::Result<TextSource> {
        if let Some(prompt) = &self.prompt {
            return Ok(TextSource::custom("prompt", prompt.clone()));
        }
        if let Some(path) = &self.file {
            return TextSource::from_file(path);
        }
        if let Some(path) = &self.csv {
            return TextSource::from_csv(path);
        }
        TextSource::topic(topic)
    }
}

fn open_stats() -> Box<dyn ErrorStats> {
    let Some(path) = AppDirs::db_path() else {
        warn!("no state directory, error statistics kept in memory");
        return Box::new(MemoryErrorStats::new());
    };
    match SqliteErrorStats::open(&path) {
        Ok(stats) => Box::new(stats),
        Err(err) => {
            warn!(%err, path = %path.display(), "could not open stats database, using memory");
            Box::new(MemoryErrorStats::new())
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(path) = AppDirs::log_path() {
        logging::init(&path);
    }

    let store = FileConfigStore::new();
    let mut config = store.load();
    cli.apply(&mut config);

    let source = cli
        .text_source(config.topic)
        .context("could not load practice text")?;

    let mut stats = open_stats();
    if cli.reset_stats {
        stats
            .reset_stats()
            .context("could not reset error statistics")?;
        info!("error statistics cleared");
    }

    let mut app = App::new(config, source, stats).with_config_store(Box::new(store));
    if let Some(path) = AppDirs::results_path() {
        app = app.with_result_log(ResultLog::new(path));
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    while !app.should_quit() {
        match runner.step_until(app.engine.next_deadline()) {
            AppEvent::Tick => app.on_tick(Instant::now()),
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                let now = Instant::now();
                app.on_key(key, now);
                app.on_tick(now);
            }
        }
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    }

    info!("quit");
    Ok(())
}
