mod api;
mod client;
mod config;
mod db;
mod error;
mod models;
mod ui;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing_subscriber::EnvFilter;
use tui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::client::{CrmApi, HttpCrmApi};
use crate::ui::projects::ProjectsPage;
use crate::ui::screen::{render_projects, ProjectsScreen};

#[derive(Parser)]
#[command(name = "crm", about = "Customer, project and invoice management")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the JSON API
    Serve,
    /// Open the projects page in the terminal
    Projects {
        /// Write logs to this file while the page is open
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => {
            tracing_subscriber::fmt().with_env_filter(env_filter()).init();

            let config = config::init()?;
            let db = db::init(&config).await?;
            api::serve(&config, db).await
        }
        Command::Projects { log_file } => {
            // The terminal owns stdout, so logs go to a file or nowhere
            match log_file {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("cannot open log file {}", path.display()))?;
                    tracing_subscriber::fmt()
                        .with_env_filter(env_filter())
                        .with_ansi(false)
                        .with_writer(Mutex::new(file))
                        .init();
                }
                None => tracing_subscriber::fmt().with_writer(io::sink).init(),
            }

            let config = config::init()?;
            run_projects_page(HttpCrmApi::new(config.api_url())).await
        }
    }
}

async fn run_projects_page<A: CrmApi>(api: A) -> Result<()> {
    let mut page = ProjectsPage::new(api);
    page.load().await;
    let mut screen = ProjectsScreen::new(page);

    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut screen).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        tracing::error!("projects page failed: {}", err);
    }

    result
}

async fn run_app<B: Backend, A: CrmApi>(
    terminal: &mut Terminal<B>,
    screen: &mut ProjectsScreen<A>,
) -> Result<()> {
    loop {
        terminal.draw(|f| render_projects(f, screen))?;

        if let Event::Key(key) = event::read()? {
            if let Some(action) = screen.handle_key(key) {
                if screen.perform(action).await {
                    return Ok(());
                }
            }
        }
    }
}
