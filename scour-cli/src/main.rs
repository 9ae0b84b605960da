use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use crossterm::{
    cursor::MoveTo,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
};
use scour::{
    search::DEBOUNCE, SearchMatch, SearchOptions, SearchResults, SearchService, SearchSession,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Live, concurrent, in-workspace substring search
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Text to search for (literal, case-insensitive)
    query: Option<String>,

    /// Root directory to search in
    #[arg(short = 'd', long, default_value = ".")]
    root: PathBuf,

    /// Extra glob patterns to exclude
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Maximum number of files with matches to keep (0 = unlimited)
    #[arg(long)]
    max_results: Option<usize>,

    /// Maximum matches kept per file (0 = unlimited)
    #[arg(long)]
    max_matches: Option<usize>,

    /// Maximum number of candidate files to consider (0 = unlimited)
    #[arg(long)]
    max_files: Option<usize>,

    /// Skip files larger than this many bytes
    #[arg(long)]
    max_file_size: Option<u64>,

    /// Number of files scanned concurrently per wave
    #[arg(long)]
    batch_size: Option<usize>,

    /// Configuration file (default: .scour.yaml, then the global config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write a default .scour.yaml into the current directory and exit
    #[arg(long)]
    init_config: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Show only the match and file counts
    #[arg(short, long)]
    stats: bool,

    /// Interactive mode: type to search, Up/Down to select, Enter to pick
    #[arg(short, long)]
    live: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Renders the flags as a SearchOptions for the CLI-over-file merge.
    /// Absent flags stay at the defaults so file values survive; an
    /// explicit 0 lifts the corresponding cap.
    fn override_options(&self) -> SearchOptions {
        let mut options = SearchOptions::default();
        if let Some(n) = self.max_results {
            options.max_results = (n > 0).then_some(n);
        }
        if let Some(n) = self.max_matches {
            options.max_matches_per_file = (n > 0).then_some(n);
        }
        if let Some(n) = self.max_files {
            options.max_files_to_search = (n > 0).then_some(n);
        }
        if let Some(n) = self.max_file_size {
            options.max_file_size = n;
        }
        if let Some(n) = self.batch_size {
            options.batch_size = n;
        }
        if !self.ignore.is_empty() {
            options.ignore_patterns = self.ignore.clone();
        }
        if let Some(level) = &self.log_level {
            options.log_level = level.clone();
        }
        options
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    if cli.init_config {
        let path = PathBuf::from(".scour.yaml");
        SearchOptions::default()
            .save(&path)
            .context("writing default configuration")?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let options = SearchOptions::load_from(cli.config.as_deref())
        .context("loading configuration")?
        .merge_with_cli(cli.override_options());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(options.log_level.clone())),
        )
        .with_writer(io::stderr)
        .init();

    let service = SearchService::with_root(&cli.root, options);

    if cli.live {
        return run_live(service);
    }

    let Some(query) = cli.query.as_deref() else {
        bail!("a query is required unless --live or --init-config is given");
    };

    let started = Instant::now();
    let results = service.search(query);
    tracing::debug!("Search took {:?}", started.elapsed());

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results.file_results)?);
    } else {
        print_results(&results, cli.stats);
    }
    Ok(())
}

fn print_results(results: &SearchResults, stats_only: bool) {
    if !stats_only {
        for file_result in &results.file_results {
            println!("\n{}", file_result.relative_path.blue());
            for m in &file_result.matches {
                println!("{}:{}: {}", m.line.to_string().green(), m.column, m.text);
            }
        }
        if !results.file_results.is_empty() {
            println!();
        }
    }
    println!(
        "Found {} matches in {} of {} files scanned",
        results.total_matches, results.files_with_matches, results.files_scanned
    );
}

/// Raw-terminal input loop over a [`SearchSession`]: keystrokes edit the
/// query, searches fire after the debounce quiet period, Enter picks the
/// selected match.
fn run_live(service: SearchService) -> Result<()> {
    let mut session = SearchSession::new(service);

    enable_raw_mode().context("entering raw mode")?;
    let picked = live_loop(&mut session);
    disable_raw_mode().context("leaving raw mode")?;
    println!();

    if let Ok(Some(m)) = &picked {
        println!("{}:{}:{}", m.relative_path, m.line, m.column);
    }
    picked.map(|_| ())
}

fn live_loop(session: &mut SearchSession) -> Result<Option<SearchMatch>> {
    let mut stdout = io::stdout();
    render(session, &mut stdout)?;

    loop {
        // Poll at the debounce interval so a pending query fires promptly
        // even with no further input
        if event::poll(DEBOUNCE)? {
            match event::read()? {
                Event::Key(KeyEvent {
                    code,
                    modifiers,
                    kind: KeyEventKind::Press,
                    ..
                }) => match code {
                    KeyCode::Esc => return Ok(None),
                    KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(None)
                    }
                    KeyCode::Enter => {
                        if let Some(m) = session.selected_match() {
                            return Ok(Some(m.clone()));
                        }
                    }
                    KeyCode::Up => session.select_prev(),
                    KeyCode::Down => session.select_next(),
                    KeyCode::Backspace => {
                        let mut query = session.query().to_string();
                        query.pop();
                        session.update_query(&query, Instant::now());
                    }
                    KeyCode::Char(c) => {
                        let query = format!("{}{}", session.query(), c);
                        session.update_query(&query, Instant::now());
                    }
                    _ => {}
                },
                _ => {}
            }
            render(session, &mut stdout)?;
        }

        if session.run_pending(Instant::now()) {
            render(session, &mut stdout)?;
        }
    }
}

const VISIBLE_MATCHES: usize = 15;

fn render(session: &SearchSession, stdout: &mut io::Stdout) -> Result<()> {
    execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;

    write!(stdout, "> {}\r\n", session.query().bold())?;
    if session.query().is_empty() {
        write!(stdout, "{}\r\n", "Start typing to search...".dimmed())?;
        return stdout.flush().map_err(Into::into);
    }
    write!(
        stdout,
        "{}\r\n",
        format!("{} matches", session.match_count()).dimmed()
    )?;

    let selected = session.selected_index().unwrap_or(0);
    // Keep the selection visible by scrolling the window over the
    // flattened match list
    let first = selected.saturating_sub(VISIBLE_MATCHES - 1);
    let mut index = 0usize;
    for file in session.results() {
        for m in &file.matches {
            if index >= first && index < first + VISIBLE_MATCHES {
                let line = format!("{}:{}: {}", m.relative_path, m.line, m.text);
                if Some(index) == session.selected_index() {
                    write!(stdout, "{}\r\n", line.reversed())?;
                } else {
                    write!(stdout, "{}\r\n", line)?;
                }
            }
            index += 1;
        }
    }

    stdout.flush()?;
    Ok(())
}
