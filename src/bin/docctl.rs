//! CLI binary for doc-console.
//!
//! A thin shim over the library: one subcommand per console operation,
//! notices printed to stderr, downloads written to `--out`.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use doc_console::{
    AutoConfirm, Confirm, ConsoleConfig, ConsoleError, ConsoleEvents, ConvertFormat,
    DeleteOutcome, Document, DocumentConsole, Download, MetadataPatch, Notice, NoticeLevel,
    Route, SearchFilters, UploadFile,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::future::Future;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
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

// ── Console events for the terminal ──────────────────────────────────────────

/// Prints notices and collects downloads; downloads are written once the
/// command finishes so file I/O stays out of the callback.
struct CliEvents {
    quiet: bool,
    downloads: Mutex<Vec<Download>>,
}

impl CliEvents {
    fn new(quiet: bool) -> Arc<Self> {
        Arc::new(Self {
            quiet,
            downloads: Mutex::new(Vec::new()),
        })
    }

    fn take_downloads(&self) -> Vec<Download> {
        std::mem::take(&mut *self.downloads.lock().unwrap_or_else(|p| p.into_inner()))
    }
}

impl ConsoleEvents for CliEvents {
    fn on_notice(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Error => eprintln!("{} {}", red("✘"), notice.message),
            NoticeLevel::Success if !self.quiet => eprintln!("{} {}", green("✔"), notice.message),
            NoticeLevel::Success => {}
        }
    }

    fn on_navigate(&self, route: &Route) {
        if !self.quiet {
            eprintln!("{} open {}", cyan("→"), bold(&route.path()));
        }
    }

    fn on_download(&self, download: &Download) {
        self.downloads
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(download.clone());
    }
}

/// Yes/no prompt on stdin.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, message: &str) -> bool {
        // Blocking read; keep it off the async worker's hot path.
        tokio::task::block_in_place(|| {
            eprint!("{message} [y/N] ");
            io::stderr().flush().ok();
            let mut line = String::new();
            if io::stdin().lock().read_line(&mut line).is_err() {
                return false;
            }
            matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
        })
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # List documents
  docctl list

  # Upload, parse and convert
  docctl upload report.pdf
  docctl parse report.pdf
  docctl convert report.pdf --format markdown --out ./exports

  # Everything at once (zip archive)
  docctl convert-all report.pdf

  # Filtered search (blank text is fine when a filter is set)
  docctl search --author Kim --tags finance --from 2024-01-01

ENVIRONMENT VARIABLES:
  DOCCONSOLE_BASE_URL    Document service address (default http://localhost:8008)
  DOCCONSOLE_FILES_URL   Separate address for delete/download, if any
  DOCCONSOLE_TIMEOUT     Per-request timeout in seconds
  DOCCONSOLE_OUT         Directory for downloads (default .)
  RUST_LOG               Log filter, overrides --verbose/--quiet
"#;

/// Manage documents on a parsing/analysis/conversion service.
#[derive(Parser, Debug)]
#[command(
    name = "docctl",
    version,
    about = "Manage documents on a PDF parsing, analysis and conversion service",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Document service base URL.
    #[arg(long, global = true, env = "DOCCONSOLE_BASE_URL", default_value = doc_console::config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Address for delete and raw download, when the deployment splits them.
    #[arg(long, global = true, env = "DOCCONSOLE_FILES_URL")]
    files_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, env = "DOCCONSOLE_TIMEOUT")]
    timeout: Option<u64>,

    /// Directory where downloads are written.
    #[arg(short, long, global = true, env = "DOCCONSOLE_OUT", default_value = ".")]
    out: PathBuf,

    /// Answer yes to confirmation prompts.
    #[arg(short, long, global = true)]
    yes: bool,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[arg(short, long, global = true, env = "DOCCONSOLE_VERBOSE")]
    verbose: bool,

    #[arg(short, long, global = true, env = "DOCCONSOLE_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List documents in the registry.
    List,
    /// List every tag in use.
    Tags,
    /// Upload a PDF.
    Upload { path: PathBuf },
    /// Trigger parsing of an uploaded document.
    Parse { filename: String },
    /// Delete a document (asks for confirmation unless --yes).
    Delete { filename: String },
    /// Rename a document.
    Rename { filename: String, new_name: String },
    /// Update title, author or tags.
    Meta {
        filename: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        /// Comma-separated tags; replaces the existing set.
        #[arg(long)]
        tags: Option<String>,
    },
    /// List versions of a document.
    Versions { filename: String },
    /// Create a new version snapshot.
    Version {
        filename: String,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Keywords and summary.
    Analyze { filename: String },
    /// Summary only.
    Summary { filename: String },
    /// Named entities.
    Entities { filename: String },
    /// Convert to one format and download it.
    Convert {
        filename: String,
        #[arg(short, long, default_value = "markdown")]
        format: ConvertFormat,
    },
    /// Convert to every format and download the archive.
    ConvertAll { filename: String },
    /// Search documents by text and filters.
    Search {
        #[arg(default_value = "")]
        query: String,
        #[arg(long)]
        author: Option<String>,
        /// Comma-separated tags.
        #[arg(long)]
        tags: Option<String>,
        /// Earliest document date (YYYY-MM-DD).
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Latest document date (YYYY-MM-DD).
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Show a parsed document.
    Show { filename: String },
    /// Download the stored parse output.
    Download { filename: String },
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Run `fut` under a spinner unless quiet.
async fn with_spinner<T>(show: bool, label: &str, fut: impl Future<Output = T>) -> T {
    if !show {
        return fut.await;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message(label.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    let out = fut.await;
    bar.finish_and_clear();
    out
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialise output")?
    );
    Ok(())
}

fn print_documents(docs: &[Document]) {
    if docs.is_empty() {
        println!("{}", dim("(no documents)"));
        return;
    }
    for d in docs {
        let parsed = if d.is_parsed { green("parsed") } else { dim("not parsed") };
        let uploaded = d
            .uploaded()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{:<40} {:>10.2} KB  {:<16}  {}",
            bold(&d.filename),
            d.size_kib(),
            uploaded,
            parsed
        );
        for c in &d.converted_files {
            println!("    {} {}", dim("↳"), c.format.to_uppercase());
        }
    }
}

fn tags_from_csv(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Errors raised outside a console operation carry no notice; turn them
/// into plain messages so `main` prints them.
fn unreported(e: ConsoleError) -> anyhow::Error {
    anyhow::anyhow!("{e}")
}

// ── Main ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Console failures were already printed as notices.
            if e.downcast_ref::<ConsoleError>().is_none() {
                eprintln!("{} {e:#}", red("error:"));
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
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

    // ── Build console ────────────────────────────────────────────────────
    let mut builder = ConsoleConfig::builder().base_url(&cli.base_url);
    if let Some(ref url) = cli.files_url {
        builder = builder.files_service_url(url);
    }
    if let Some(secs) = cli.timeout {
        builder = builder.timeout_secs(secs);
    }
    let config = builder.build().map_err(unreported)?;

    let events = CliEvents::new(cli.quiet);
    let confirm: Arc<dyn Confirm> = if cli.yes {
        Arc::new(AutoConfirm(true))
    } else {
        Arc::new(StdinConfirm)
    };
    let console = DocumentConsole::connect(config)
        .map_err(unreported)?
        .with_events(events.clone())
        .with_confirm(confirm);

    let spin = !cli.quiet && !cli.json;

    // ── Dispatch ─────────────────────────────────────────────────────────
    match cli.command {
        Command::List => {
            let docs = with_spinner(spin, "Loading documents…", console.refresh()).await?;
            if cli.json {
                print_json(&docs)?;
            } else {
                print_documents(&docs);
            }
        }
        Command::Tags => {
            let tags = with_spinner(spin, "Loading tags…", console.refresh_tags()).await?;
            if cli.json {
                print_json(&tags)?;
            } else {
                for t in tags {
                    println!("{t}");
                }
            }
        }
        Command::Upload { path } => {
            let file = UploadFile::from_path(&path).await.map_err(unreported)?;
            with_spinner(spin, "Uploading…", console.upload(file)).await?;
        }
        Command::Parse { filename } => {
            with_spinner(spin, "Parsing…", console.trigger_parse(&filename)).await?;
        }
        Command::Delete { filename } => {
            if console.delete(&filename).await? == DeleteOutcome::Declined && !cli.quiet {
                eprintln!("{}", dim("Cancelled."));
            }
        }
        Command::Rename { filename, new_name } => {
            console.rename(&filename, &new_name).await?;
        }
        Command::Meta {
            filename,
            title,
            author,
            tags,
        } => {
            let patch = MetadataPatch {
                title,
                author,
                tags: tags.as_deref().map(tags_from_csv),
            };
            console.update_metadata(&filename, patch).await?;
        }
        Command::Versions { filename } => {
            let versions =
                with_spinner(spin, "Loading versions…", console.list_versions(&filename)).await?;
            if cli.json {
                print_json(&versions)?;
            } else if versions.is_empty() {
                println!("{}", dim("(no versions)"));
            } else {
                for v in versions {
                    let created = v
                        .created()
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default();
                    println!(
                        "v{:<6} {:<16}  {:.2} KB",
                        v.version,
                        created,
                        v.size as f64 / 1024.0
                    );
                }
            }
        }
        Command::Version { filename, note } => {
            console.set_version_note(&filename, &note);
            let version = console.create_version(&filename, &note).await?;
            if cli.json {
                print_json(&serde_json::json!({ "version": version }))?;
            }
        }
        Command::Analyze { filename } => {
            let analysis = with_spinner(spin, "Analysing…", console.analyze(&filename)).await?;
            if cli.json {
                print_json(&analysis)?;
            } else {
                println!("{}", bold("Keywords"));
                for k in &analysis.keywords {
                    println!("  {:<24} {}", k.word, dim(&k.count.to_string()));
                }
                println!("\n{}\n{}", bold("Summary"), analysis.summary);
            }
        }
        Command::Summary { filename } => {
            let summary = with_spinner(spin, "Summarising…", console.summary(&filename)).await?;
            if cli.json {
                print_json(&serde_json::json!({ "summary": summary }))?;
            } else {
                println!("{summary}");
            }
        }
        Command::Entities { filename } => {
            let entities =
                with_spinner(spin, "Extracting entities…", console.extract_entities(&filename))
                    .await?;
            if cli.json {
                print_json(&entities)?;
            } else {
                for (label, items) in [
                    ("Organizations", &entities.organizations),
                    ("Dates", &entities.dates),
                    ("Locations", &entities.locations),
                    ("Persons", &entities.persons),
                    ("Keywords", &entities.keywords),
                ] {
                    println!("{:<14} {}", bold(label), items.join(", "));
                }
            }
        }
        Command::Convert { filename, format } => {
            with_spinner(
                spin,
                &format!("Converting to {format}…"),
                console.convert_one(&filename, format),
            )
            .await?;
        }
        Command::ConvertAll { filename } => {
            with_spinner(spin, "Converting to all formats…", console.convert_all(&filename))
                .await?;
        }
        Command::Search {
            query,
            author,
            tags,
            from,
            to,
        } => {
            let filters = SearchFilters::default()
                .with_author(author.unwrap_or_default())
                .with_tags_csv(tags.as_deref().unwrap_or(""))
                .between(from, to);
            let results =
                with_spinner(spin, "Searching…", console.search(&query, filters)).await?;
            if cli.json {
                print_json(&results)?;
            } else if results.is_empty() {
                println!("{}", dim("(no results)"));
            } else {
                for r in results {
                    println!("{}  {}", bold(&r.title), dim(&r.filename));
                    println!("  {} · {}", r.author, r.date);
                    println!("  {}\n", r.snippet);
                }
            }
        }
        Command::Show { filename } => {
            let doc = with_spinner(spin, "Loading…", console.open_document(&filename)).await?;
            if cli.json {
                print_json(&doc)?;
            } else {
                println!("{}", bold(&doc.metadata.title));
                println!("{}", dim(&format!("{} · {}", doc.metadata.author, doc.metadata.date)));
                println!("\n{}", doc.content);
            }
        }
        Command::Download { filename } => {
            with_spinner(spin, "Downloading…", console.download_raw(&filename)).await?;
        }
    }

    // ── Write downloads ──────────────────────────────────────────────────
    let downloads = events.take_downloads();
    if !downloads.is_empty() {
        tokio::fs::create_dir_all(&cli.out)
            .await
            .with_context(|| format!("Cannot create {}", cli.out.display()))?;
    }
    for d in downloads {
        let path = d.save_to(&cli.out).await.map_err(unreported)?;
        if !cli.quiet {
            eprintln!(
                "{} saved {}  {}",
                green("✔"),
                bold(&path.display().to_string()),
                dim(&format!("{} bytes", d.bytes.len()))
            );
        }
    }
    Ok(())
}
