mod app;
mod catalog;
mod fetch;
mod present;
mod settings;
mod state;
mod tmdb;
mod ui;

use app::{App, View};
use catalog::{SortDirection, SortKey};
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use fetch::Dispatcher;
use settings::{Overrides, Settings, Theme};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tmdb::{GenreId, ImageSize, MovieApi, MovieId, TmdbClient};
use tracing::{error, info};

const LOG_ENV: &str = "MOVIE_EXPLORER_LOG";

/// Browse TMDB's popular movies in the terminal
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// TMDB API key (v3) or read access token (v4) [env: TMDB_API_KEY]
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Response language, e.g. en-US [env: TMDB_LANGUAGE, default: pl-PL]
    #[arg(long, global = true)]
    language: Option<String>,

    /// Color theme for this session (not saved)
    #[arg(long, value_enum, global = true)]
    theme: Option<Theme>,

    /// Give up on a request after this many seconds [env: TMDB_TIMEOUT_SECS]
    #[arg(long, value_name = "SECS", global = true)]
    timeout: Option<u64>,

    /// Where to write the log file
    #[arg(long, value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse popular movies interactively (default)
    Browse,
    /// Print the popular movies list
    List {
        /// Only movies with this genre id
        #[arg(long)]
        genre: Option<GenreId>,
        #[arg(long, value_enum, default_value_t)]
        sort: SortKey,
        #[arg(long, value_enum, default_value_t)]
        order: SortDirection,
    },
    /// Print one movie's details
    Show {
        /// TMDB movie id
        id: MovieId,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let log_path = cli
        .log_file
        .clone()
        .unwrap_or_else(settings::default_log_path);
    if let Err(e) = init_logging(&log_path) {
        eprintln!("Warning: logging disabled ({}): {}", log_path.display(), e);
    }

    let overrides = Overrides {
        api_key: cli.api_key.clone(),
        language: cli.language.clone(),
        timeout_secs: cli.timeout,
        theme: cli.theme,
        ..Default::default()
    };
    let settings = match Settings::resolve(&overrides, |key| std::env::var(key).ok()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Startup aborted");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        language = %settings.tmdb.language,
        base_url = %settings.tmdb.base_url,
        "Starting movie-explorer"
    );

    let client = TmdbClient::new(settings.tmdb.clone())?;
    let api: Arc<dyn MovieApi> = Arc::new(client);

    match cli.command.unwrap_or(Commands::Browse) {
        Commands::Browse => run_tui(api, settings).await?,
        Commands::List { genre, sort, order } => {
            match present::catalog_report(api.as_ref(), genre, sort, order).await {
                Ok(text) => print!("{}", text),
                Err(e) => {
                    eprintln!("{}", e.user_message(fetch::Subject::Movies));
                    std::process::exit(1);
                }
            }
        }
        Commands::Show { id } => match present::detail_report(api.as_ref(), id).await {
            Ok(text) => print!("{}", text),
            Err(e) => {
                eprintln!("{}", e.user_message(fetch::Subject::MovieDetails));
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

/// The TUI owns the terminal, so logs go to a file.
fn init_logging(path: &Path) -> std::io::Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new("movie_explorer=info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .with(filter)
        .init();
    Ok(())
}

async fn run_tui(
    api: Arc<dyn MovieApi>,
    settings: Settings,
) -> Result<(), Box<dyn std::error::Error>> {
    let (dispatcher, inbox) = Dispatcher::new(api);
    let mut app = App::new(
        dispatcher,
        inbox,
        settings.theme,
        settings.preferences_path,
    );
    app.load_catalog();

    // Init terminal
    let mut terminal = ratatui::init();

    // Initial page size setup
    let size = terminal.size()?;
    app.update_page_size(size.height);

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    ratatui::restore();

    if let Err(e) = &result {
        error!(error = %e, "Terminal error");
    }
    info!("Exiting");
    result
}

async fn run_app(
    terminal: &mut ratatui::DefaultTerminal,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        app.pump();
        terminal.draw(|frame| ui::render(app, frame))?;

        if app.should_quit {
            return Ok(());
        }

        // Poll for events with a 250ms timeout
        if crossterm::event::poll(std::time::Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    handle_key(app, key);
                }
                Event::Resize(_, height) => {
                    app.update_page_size(height);
                }
                _ => {}
            }
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // Help toggle (global)
    if key.code == KeyCode::Char('?') {
        app.show_help = !app.show_help;
        return;
    }

    // If help is showing, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        KeyCode::Char('t') => app.toggle_theme(),
        KeyCode::Char('r') => app.retry(),
        _ => match app.view {
            View::Catalog => handle_catalog_key(app, key),
            View::Detail => handle_detail_key(app, key),
        },
    }
}

fn handle_catalog_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.list_next();
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.list_prev();
        }
        KeyCode::PageDown => {
            app.list_page_down();
        }
        KeyCode::PageUp => {
            app.list_page_up();
        }
        KeyCode::Char('g') | KeyCode::Home => {
            app.list_first();
        }
        KeyCode::Char('G') | KeyCode::End => {
            app.list_last();
        }
        KeyCode::Right | KeyCode::Char(']') => {
            app.next_genre();
        }
        KeyCode::Left | KeyCode::Char('[') => {
            app.prev_genre();
        }
        KeyCode::Char('0') | KeyCode::Char('a') => {
            app.select_genre(None);
        }
        KeyCode::Char('s') => {
            app.cycle_sort_key();
        }
        KeyCode::Char('o') => {
            app.toggle_direction();
        }
        KeyCode::Enter => {
            app.open_selected();
        }
        _ => {}
    }
}

fn handle_detail_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => {
            app.close_detail();
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.scroll_down();
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.scroll_up();
        }
        KeyCode::PageDown => {
            app.scroll_page_down();
        }
        KeyCode::PageUp => {
            app.scroll_page_up();
        }
        KeyCode::Char('y') => {
            if let Some(link) = app.detail_link() {
                app.status_msg = if copy_to_clipboard(&link) {
                    format!("Copied: {}", link)
                } else {
                    format!("Link: {} (clipboard not available)", link)
                };
            }
        }
        KeyCode::Char('p') => match app.poster_url(ImageSize::Original) {
            Some(url) => {
                app.status_msg = match open_in_browser(&url) {
                    Ok(()) => format!("Opened poster: {}", url),
                    Err(e) => format!("Could not open {}: {}", url, e),
                };
            }
            None => {
                app.status_msg = present::NO_IMAGE.to_string();
            }
        },
        _ => {}
    }
}

/// Pipe `text` into the first clipboard tool that starts (xclip, wl-copy).
fn copy_to_clipboard(text: &str) -> bool {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let candidates: [(&str, &[&str]); 2] = [
        ("xclip", &["-selection", "clipboard"]),
        ("wl-copy", &[]),
    ];
    for (program, args) in candidates {
        if let Ok(mut child) = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            if let Some(mut stdin) = child.stdin.take() {
                let _ = stdin.write_all(text.as_bytes());
            }
            return child.wait().map(|s| s.success()).unwrap_or(false);
        }
    }
    false
}

fn open_in_browser(url: &str) -> std::io::Result<()> {
    let program = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    std::process::Command::new(program)
        .arg(url)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map(|_| ())
}
