//! CLI binary for paperdesk-client.
//!
//! A thin shim over the library crate: maps subcommands to the session,
//! upload workflow and paper collection, and prints their alert text.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use indicatif::{ProgressBar, ProgressStyle};
use paperdesk_client::collection::EMPTY_COLLECTION_MESSAGE;
use paperdesk_client::{
    auth, ApiClient, ClientConfig, Paper, PaperCollection, RefreshStatus, Session,
    SharedObserver, UploadFile, UploadObserver, UploadOutcome, UploadStage, UploadWorkflow,
};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── Upload stage display using indicatif ─────────────────────────────────────

/// Renders the four-step stage display as a spinner with a step counter.
struct CliUploadObserver {
    bar: ProgressBar,
}

impl CliUploadObserver {
    fn new(file_name: &str) -> Arc<Self> {
        let bar = ProgressBar::new(3);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:24.green/238}] {pos}/{len}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix(file_name.to_string());
        bar.set_message(UploadStage::FileSelected.label());
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl UploadObserver for CliUploadObserver {
    fn on_stage(&self, stage: UploadStage) {
        self.bar.set_position(stage.step() as u64);
        self.bar.set_message(stage.label());
        if matches!(stage, UploadStage::Complete | UploadStage::Failed) {
            self.bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Create an account, then sign in
  paperdesk signup --email me@lab.org
  paperdesk login --email me@lab.org

  # Upload a paper and show the refreshed collection
  paperdesk upload attention.pdf

  # List, filter, inspect
  paperdesk list --filter vaswani
  paperdesk show 65a1b2c3d4e5f60718293a4b

  # Delete without the confirmation prompt
  paperdesk delete 65a1b2c3d4e5f60718293a4b --yes

  # Export every paper to ./extracted_papers.xlsx
  paperdesk export -o .

ENVIRONMENT VARIABLES:
  PAPERDESK_API_URL       Base URL of the PaperDesk service (required)
  PAPERDESK_SESSION_FILE  Where the login token is stored
  PAPERDESK_PASSWORD      Password for login/signup (otherwise prompted, without echo)
  RUST_LOG                Override log filtering (e.g. paperdesk_client=debug)
"#;

/// Upload research papers and manage the extracted records.
#[derive(Parser, Debug)]
#[command(
    name = "paperdesk",
    version,
    about = "Upload research paper PDFs and manage the extracted records",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Base URL of the PaperDesk service.
    #[arg(long, global = true, env = "PAPERDESK_API_URL")]
    api_url: Option<String>,

    /// File holding the persisted login token.
    #[arg(long, global = true, env = "PAPERDESK_SESSION_FILE")]
    session_file: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PAPERDESK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and requested data.
    #[arg(short, long, global = true, env = "PAPERDESK_QUIET")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account.
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PAPERDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Sign in and store the token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PAPERDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored token.
    Logout,
    /// Upload a PDF for processing.
    Upload {
        file: PathBuf,
        /// Do not list the collection afterwards.
        #[arg(long)]
        no_list: bool,
    },
    /// List papers, newest first.
    List {
        /// Only papers whose title or authors contain this text.
        #[arg(short, long, default_value = "")]
        filter: String,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Show one paper in full.
    Show { id: String },
    /// Delete a paper.
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Download the spreadsheet export.
    Export {
        /// Directory to save extracted_papers.xlsx into.
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;
    let session = Session::open_file(&config.session_path)
        .with_context(|| format!("Failed to open session at {:?}", config.session_path))?;
    let api = Arc::new(
        ApiClient::new(config.clone(), Arc::clone(&session)).context("Failed to build client")?,
    );

    match cli.command {
        Command::Signup {
            ref email,
            ref password,
        } => {
            let (password, confirm) = match password.clone() {
                Some(p) => (p.clone(), p),
                None => (prompt_secret("Password")?, prompt_secret("Confirm password")?),
            };
            let outcome = auth::signup(&*api, &session, email, &password, &confirm).await?;
            report(&cli, outcome.message.as_deref(), outcome.error.as_deref())?;
        }
        Command::Login {
            ref email,
            ref password,
        } => {
            let password = read_password(password.clone(), "Password")?;
            let outcome = auth::login(&*api, &session, email, &password).await?;
            if outcome.error.is_none() && !session.is_authenticated() {
                bail!("Login succeeded but the server returned no token");
            }
            let message = outcome.error.is_none().then_some("Logged in");
            report(&cli, message, outcome.error.as_deref())?;
        }
        Command::Logout => {
            auth::logout(&session).context("Failed to clear session")?;
            report(&cli, Some("Logged out"), None)?;
        }
        Command::Upload {
            ref file,
            no_list,
        } => {
            let upload_file = UploadFile::from_path(file)
                .await
                .with_context(|| format!("Cannot upload {:?}", file))?;

            let mut workflow = UploadWorkflow::new(api.clone(), &config);
            if !cli.quiet {
                let observer = CliUploadObserver::new(upload_file.name());
                workflow = workflow.with_observer(observer as SharedObserver);
            }
            workflow.select_file(upload_file);

            match workflow.start_upload().await {
                UploadOutcome::Completed {
                    message,
                    navigation,
                } => {
                    report(&cli, Some(&message), None)?;
                    if !no_list {
                        navigation.wait().await;
                        let mut collection = PaperCollection::new(api.clone());
                        collection.refresh().await;
                        print_collection(&collection, "", &cli)?;
                    }
                }
                UploadOutcome::Failed { message, .. } | UploadOutcome::Rejected { reason: message } => {
                    report(&cli, None, Some(&message))?;
                }
            }
        }
        Command::List {
            ref filter,
            json,
        } => {
            let mut collection = PaperCollection::new(api.clone());
            collection.refresh().await;
            if json {
                let hits = collection.filter(filter);
                println!(
                    "{}",
                    serde_json::to_string_pretty(&hits).context("Failed to serialise papers")?
                );
            } else {
                print_collection(&collection, filter, &cli)?;
            }
        }
        Command::Show { ref id } => {
            let mut collection = PaperCollection::new(api.clone());
            collection.refresh().await;
            warn_on_fetch_failure(&collection, &cli);
            match collection.get(id) {
                Some(paper) => print_paper(paper),
                None => bail!("No paper with id '{id}'"),
            }
        }
        Command::Delete { ref id, yes } => {
            if !yes && !confirm("Are you sure you want to delete this paper?")? {
                return Ok(());
            }
            let mut collection = PaperCollection::new(api.clone());
            match collection.remove(id).await {
                Ok(()) => report(&cli, Some("Paper deleted"), None)?,
                Err(_) => report(&cli, None, collection.alert())?,
            }
        }
        Command::Export { ref output } => {
            let mut collection = PaperCollection::new(api.clone());
            match collection.export_current().await {
                Ok(artifact) => {
                    let path = artifact
                        .save(output)
                        .await
                        .context("Failed to save export")?;
                    report(&cli, Some(&format!("Saved {}", path.display())), None)?;
                }
                Err(_) => report(&cli, None, collection.alert())?,
            }
        }
    }

    Ok(())
}

/// Map global CLI args to `ClientConfig`.
fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder();
    if let Some(ref url) = cli.api_url {
        builder = builder.base_url(url.clone());
    }
    if let Some(ref path) = cli.session_file {
        builder = builder.session_path(path.clone());
    }
    builder.build().context("Invalid configuration")
}

/// Print a success line or fail with the error alert.
fn report(cli: &Cli, message: Option<&str>, error: Option<&str>) -> Result<()> {
    if let Some(err) = error {
        bail!("{} {err}", red("✘"));
    }
    if let (Some(msg), false) = (message, cli.quiet) {
        eprintln!("{} {}", green("✔"), msg);
    }
    Ok(())
}

fn warn_on_fetch_failure(collection: &PaperCollection, cli: &Cli) {
    if cli.quiet || collection.status() != RefreshStatus::FetchFailed {
        return;
    }
    if let Some(err) = collection.last_fetch_error() {
        eprintln!("{} {}", cyan("⚠"), dim(&err.to_string()));
    }
}

fn print_collection(collection: &PaperCollection, filter: &str, cli: &Cli) -> Result<()> {
    warn_on_fetch_failure(collection, cli);

    let hits = collection.filter(filter);
    if hits.is_empty() {
        println!("{EMPTY_COLLECTION_MESSAGE}");
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(
        out,
        "{}",
        bold(&format!("{:<26} {:<40} {:<28} {}", "ID", "TITLE", "AUTHORS", "DATE"))
    )?;
    for p in hits {
        writeln!(
            out,
            "{:<26} {:<40} {:<28} {}",
            p.id,
            truncate(&p.title, 40),
            truncate(&p.authors_display(), 28),
            p.recency_label()
        )?;
    }
    Ok(())
}

fn print_paper(paper: &Paper) {
    println!("{}", bold(&paper.title));
    println!("Authors:  {}", paper.authors_display());
    println!("Date:     {}", paper.recency_label());
    if let Some(ref doi) = paper.doi {
        println!("DOI:      {doi}");
    }
    println!("ID:       {}", dim(&paper.id));
    if let Some(ref summary) = paper.summary {
        println!();
        println!("{}", bold("Summary"));
        println!("{summary}");
    }
}

/// Cut `s` to `width` characters, marking the cut with an ellipsis.
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let kept: String = s.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}\u{2026}")
}

fn prompt_line(prompt: &str) -> Result<String> {
    eprint!("{prompt}: ");
    io::stderr().flush().ok();
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn read_password(given: Option<String>, prompt: &str) -> Result<String> {
    match given {
        Some(p) => Ok(p),
        None => prompt_secret(prompt),
    }
}

/// Prompt for a secret without echoing it. Piped stdin is read as a plain
/// line.
fn prompt_secret(prompt: &str) -> Result<String> {
    if !io::stdin().is_terminal() {
        return prompt_line(prompt);
    }
    eprint!("{prompt}: ");
    io::stderr().flush().ok();

    terminal::enable_raw_mode().context("Failed to switch terminal to raw mode")?;
    let secret = read_secret_keys();
    terminal::disable_raw_mode().context("Failed to restore terminal mode")?;
    eprintln!();
    secret
}

/// Collect keystrokes until Enter. Raw mode must already be on.
fn read_secret_keys() -> Result<String> {
    let mut secret = String::new();
    loop {
        if let Event::Key(key) = event::read().context("Failed to read from terminal")? {
            match apply_secret_key(&mut secret, key) {
                SecretKey::Pending => {}
                SecretKey::Done => return Ok(secret),
                SecretKey::Interrupted => bail!("Interrupted"),
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SecretKey {
    Pending,
    Done,
    Interrupted,
}

/// Apply one keystroke to a secret being typed.
fn apply_secret_key(secret: &mut String, key: KeyEvent) -> SecretKey {
    if key.kind == KeyEventKind::Release {
        return SecretKey::Pending;
    }
    match key.code {
        KeyCode::Enter => SecretKey::Done,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            SecretKey::Interrupted
        }
        KeyCode::Char(c) => {
            secret.push(c);
            SecretKey::Pending
        }
        KeyCode::Backspace => {
            secret.pop();
            SecretKey::Pending
        }
        _ => SecretKey::Pending,
    }
}

fn confirm(question: &str) -> Result<bool> {
    let answer = prompt_line(&format!("{question} [y/N]"))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
