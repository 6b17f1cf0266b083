use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use dialoguer::Select;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use walkdir::WalkDir;

use crate::{
    cmd::tui::ViewerApp,
    config::Config,
    highlight::SegmentKind,
    pipeline::ExtractionPipeline,
    recent::{JsonFileStore, RecentUploads},
    session::{ExtractionOutcome, Session},
    types::FormatTag,
    utils::{is_supported, parse_format},
};

#[derive(Parser)]
#[command(name = "quickread")]
#[command(about = "Read PDF, Word, Excel, PowerPoint and text files as plain text and search inside them")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Recent uploads file
    #[arg(long, global = true, env = "QUICKREAD_STORE")]
    store: Option<PathBuf>,

    /// Do not add extracted documents to recent uploads
    #[arg(long, global = true, env = "QUICKREAD_NO_SAVE")]
    no_save: bool,

    /// Quiet mode (no status lines)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the normalized text of a document
    Extract {
        /// Path to document file
        file: PathBuf,
    },

    /// Highlight every occurrence of a term in a document
    Search {
        /// Path to document file
        file: PathBuf,

        /// Term to look for (case-insensitive, literal)
        query: String,

        /// 1-based match to mark as active
        #[arg(short, long)]
        active: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Open a document in the interactive viewer
    View {
        /// Path to document file
        file: PathBuf,
    },

    /// Pick a recent upload and open it in the viewer
    Open,

    /// List recent uploads
    Recent {
        /// Forget all recent uploads
        #[arg(long)]
        clear: bool,
    },

    /// Extract every supported file in a directory into recent uploads
    Ingest {
        /// Directory containing documents
        directory: PathBuf,

        /// File pattern (e.g., "*.pdf")
        #[arg(short, long, default_value = "*")]
        pattern: String,

        /// Recursive search
        #[arg(short, long)]
        recursive: bool,
    },

    /// Show file information
    Info {
        /// Path to document file
        file: PathBuf,
    },
}

pub struct CliApp {
    cli: Cli,
    config: Config,
}

impl CliApp {
    pub fn new() -> Self {
        Self::from_cli(Cli::parse())
    }

    fn from_cli(cli: Cli) -> Self {
        let config = Config {
            store_path: cli.store.clone().unwrap_or_else(Config::default_store_path),
            save_recent: !cli.no_save,
            quiet: cli.quiet,
            verbosity: cli.verbose,
        };
        Self { cli, config }
    }

    pub async fn run() -> Result<()> {
        let app = Self::new();
        app.init_tracing();

        match &app.cli.command {
            Commands::Extract { file } => app.run_extract(file).await,
            Commands::Search {
                file,
                query,
                active,
                format,
            } => app.run_search(file, query, *active, *format).await,
            Commands::View { file } => app.run_view(file).await,
            Commands::Open => app.run_open(),
            Commands::Recent { clear } => app.run_recent(*clear),
            Commands::Ingest {
                directory,
                pattern,
                recursive,
            } => app.run_ingest(directory, pattern, *recursive).await,
            Commands::Info { file } => app.run_info(file),
        }
    }

    fn init_tracing(&self) {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(self.config.log_filter())),
            )
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    fn session(&self) -> Result<Session> {
        let store = self.config.open_store().with_context(|| {
            format!(
                "Failed to open recent uploads: {}",
                self.config.store_path.display()
            )
        })?;
        Ok(Session::new(Arc::new(ExtractionPipeline::new()), store)?)
    }

    fn status(&self, message: String) {
        if !self.config.quiet {
            eprintln!("{}", message.blue());
        }
    }

    /// Read a file and make it the session's active document.
    async fn load(&self, session: &mut Session, path: &Path) -> Result<()> {
        let start = Instant::now();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = display_name(path);

        match session.open(&name, &bytes).await {
            Ok(ExtractionOutcome::Loaded) => {
                self.status(format!(
                    "Extracted {} in {} ms",
                    name,
                    start.elapsed().as_millis()
                ));
                Ok(())
            }
            Ok(ExtractionOutcome::Stale) => Err(anyhow::anyhow!("Extraction of {} was superseded", name)),
            Err(e) => {
                let message = e.user_message();
                Err(anyhow::Error::new(e).context(message))
            }
        }
    }

    async fn run_extract(&self, file: &Path) -> Result<()> {
        let mut session = self.session()?;
        self.load(&mut session, file).await?;

        if let Some(doc) = session.active() {
            println!("{}", doc.text);
        }
        Ok(())
    }

    async fn run_search(
        &self,
        file: &Path,
        query: &str,
        active: Option<usize>,
        format: OutputFormat,
    ) -> Result<()> {
        let mut session = self.session()?;
        self.load(&mut session, file).await?;

        let start = Instant::now();
        session.set_query(query);
        if let Some(active) = active {
            session.select_match(active.saturating_sub(1));
        }
        self.status(format!(
            "Search completed in {} ms",
            start.elapsed().as_millis()
        ));

        match format {
            OutputFormat::Json => Self::display_json_results(&session),
            OutputFormat::Text => {
                Self::display_text_results(&session);
                Ok(())
            }
        }
    }

    async fn run_view(&self, file: &Path) -> Result<()> {
        let mut session = self.session()?;
        self.load(&mut session, file).await?;
        ViewerApp::new(session).run()
    }

    fn run_open(&self) -> Result<()> {
        let mut session = self.session()?;
        if session.documents().is_empty() {
            println!("{}", "No uploads yet. Load a document first.".yellow());
            return Ok(());
        }

        let items: Vec<String> = session
            .documents()
            .iter()
            .map(|d| format!("{} ({})", d.name, d.format))
            .collect();
        let choice = Select::new()
            .with_prompt("Select a recent upload")
            .default(items.len() - 1)
            .items(&items)
            .interact()?;

        session.select(choice);
        ViewerApp::new(session).run()
    }

    fn run_recent(&self, clear: bool) -> Result<()> {
        if clear {
            // straight to the file: its contents may be what needs clearing
            JsonFileStore::new(self.config.store_path.clone())
                .clear()
                .with_context(|| {
                    format!(
                        "Failed to clear recent uploads: {}",
                        self.config.store_path.display()
                    )
                })?;
            println!("{}", "Recent uploads cleared.".green());
            return Ok(());
        }

        let session = self.session()?;

        if session.documents().is_empty() {
            println!("{}", "No uploads yet. Load a document first.".yellow());
            return Ok(());
        }

        println!("{}", "Recent Uploads".bold().blue());
        for (i, doc) in session.documents().iter().enumerate() {
            println!(
                "  {}: {} [{}] {} chars",
                i + 1,
                doc.name.cyan(),
                doc.format,
                doc.text.chars().count()
            );
        }
        Ok(())
    }

    async fn run_ingest(&self, directory: &Path, pattern: &str, recursive: bool) -> Result<()> {
        if !directory.is_dir() {
            return Err(anyhow::anyhow!("Directory not found: {}", directory.display()));
        }

        let files = Self::scan_directory(directory, pattern, recursive)?;
        self.status(format!("Found {} files to process", files.len()));

        let mut session = self.session()?;
        let start = Instant::now();
        let progress = ProgressBar::new(files.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("█▉▊▋▌▍▎▏ "),
        );
        if self.config.quiet {
            progress.set_draw_target(indicatif::ProgressDrawTarget::hidden());
        }

        let mut failures = Vec::new();
        for path in &files {
            progress.set_message(display_name(path));
            let result = match tokio::fs::read(path).await {
                Ok(bytes) => session
                    .open(&display_name(path), &bytes)
                    .await
                    .map_err(|e| e.user_message()),
                Err(e) => Err(e.to_string()),
            };
            if let Err(message) = result {
                tracing::warn!(file = %path.display(), error = %message, "ingest failed");
                failures.push((path.clone(), message));
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        println!(
            "{}",
            format!(
                "Ingested {} of {} files in {} ms",
                files.len() - failures.len(),
                files.len(),
                start.elapsed().as_millis()
            )
            .green()
        );
        for (path, message) in &failures {
            println!("  {} {}", path.display().to_string().red(), message);
        }
        Ok(())
    }

    fn run_info(&self, file: &Path) -> Result<()> {
        if !file.exists() {
            return Err(anyhow::anyhow!("File not found: {}", file.display()));
        }

        let format = parse_format(&file.to_string_lossy()).map_err(|e| anyhow::anyhow!(e.user_message()))?;
        println!("{}", "File Information".bold().blue());
        println!("File: {}", file.display());
        println!("Type: {}", Self::format_label(format));
        println!("Size: {} bytes", file.metadata()?.len());
        println!(
            "On decode failure: {}",
            match format.failure_policy() {
                crate::types::FailurePolicy::Propagate => "report error".to_string(),
                crate::types::FailurePolicy::Fallback(text) => format!("show \"{}\"", text),
            }
        );
        Ok(())
    }

    fn format_label(format: FormatTag) -> colored::ColoredString {
        match format {
            FormatTag::PlainText => format.label().white(),
            FormatTag::Pdf => format.label().red(),
            FormatTag::WordProcessor => format.label().blue(),
            FormatTag::Spreadsheet => format.label().green(),
            FormatTag::Presentation => format.label().yellow(),
        }
    }

    fn scan_directory(directory: &Path, pattern: &str, recursive: bool) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        if recursive {
            let matcher = glob::Pattern::new(pattern)
                .with_context(|| format!("Invalid file pattern: {}", pattern))?;
            for entry in WalkDir::new(directory)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                if matcher.matches(&entry.file_name().to_string_lossy()) {
                    files.push(entry.into_path());
                }
            }
        } else {
            let search_pattern = format!("{}/{}", directory.display(), pattern);
            for path in glob(&search_pattern)?.flatten() {
                if path.is_file() {
                    files.push(path);
                }
            }
        }

        files.retain(|file| is_supported(file));
        files.sort();
        Ok(files)
    }

    fn display_text_results(session: &Session) {
        match session.position_label() {
            Some(label) => println!("{}", format!("Match {}", label).green().bold()),
            None => println!("{}", "No matches found.".yellow()),
        }
        println!();

        for segment in session.segments() {
            match segment.kind {
                SegmentKind::Plain => print!("{}", segment.text),
                SegmentKind::Match { active: true, .. } => {
                    print!("{}", segment.text.black().on_bright_yellow().bold().underline())
                }
                SegmentKind::Match { .. } => print!("{}", segment.text.black().on_yellow()),
            }
        }
        println!();
    }

    fn display_json_results(session: &Session) -> Result<()> {
        let result = serde_json::json!({
            "document": session.active().map(|d| d.name.as_str()),
            "query": session.query(),
            "count": session.matches().len(),
            "cursor": session.cursor(),
            "position": session.position_label(),
            "matches": session.matches(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    }
}

/// File name shown to the user and stored with the document.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
