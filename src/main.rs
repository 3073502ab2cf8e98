use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use dialoguer::Confirm;
use issue_drafter::{
    AnthropicClient, Archive, Config, GhCli, ImgurClient, IssueType, RequestInput,
    ScreenshotOutcome, Submission, SystemBrowser, SystemClipboard,
};
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod interactive;

#[derive(Parser)]
#[command(name = "issue-drafter", version)]
#[command(about = "Draft a GitHub issue from a short bug report and file it with gh")]
#[command(after_help = "Examples:
  issue-drafter \"Traces don't load\" --url \"https://app.arize.com/...\" --space-id abc123
  issue-drafter \"Add export to PDF\" --type feature --url \"...\" --space-id \"...\"
  issue-drafter \"Dashboard broken\" --url \"...\" --customer \"Acme Corp\" --clipboard
  issue-drafter --interactive")]
struct Cli {
    /// Brief description of the bug or feature request
    summary: Option<String>,

    /// Platform URL where the issue occurred
    #[arg(short, long)]
    url: Option<String>,

    /// Space ID where the issue occurred (auto-detected from --url when possible)
    #[arg(short, long)]
    space_id: Option<String>,

    /// Issue type
    #[arg(short = 't', long = "type", value_enum, default_value_t = IssueType::Bug)]
    issue_type: IssueType,

    /// Customer name/identifier if customer-related
    #[arg(short, long)]
    customer: Option<String>,

    /// What you expected to happen (bugs only)
    #[arg(short, long)]
    expected: Option<String>,

    /// What actually happened (bugs only)
    #[arg(short, long)]
    actual: Option<String>,

    /// Path to a screenshot (repeatable)
    #[arg(long = "screenshot", visible_alias = "image")]
    screenshots: Vec<PathBuf>,

    /// Attach the image currently on the clipboard
    #[arg(short = 'p', long)]
    clipboard: bool,

    /// URL of a Loom/Zoom recording (repeatable)
    #[arg(long = "recording", visible_alias = "video")]
    recordings: Vec<String>,

    /// Additional GitHub labels (repeatable)
    #[arg(short, long)]
    labels: Vec<String>,

    /// Preview the issue without creating it
    #[arg(long)]
    dry_run: bool,

    /// Prompt for every field
    #[arg(short, long)]
    interactive: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Anthropic API key (or set ANTHROPIC_API_KEY)
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Messages API endpoint (or set ANTHROPIC_API_URL)
    #[arg(long, env = "ANTHROPIC_API_URL")]
    api_url: Option<String>,

    /// Model used to draft the issue (or set ANTHROPIC_MODEL)
    #[arg(long, env = "ANTHROPIC_MODEL")]
    model: Option<String>,

    /// GitHub repository to file into (or set ISSUE_DRAFTER_REPO)
    #[arg(long, env = "ISSUE_DRAFTER_REPO")]
    repo: Option<String>,

    /// Imgur client ID for anonymous uploads (or set IMGUR_CLIENT_ID)
    #[arg(long, env = "IMGUR_CLIENT_ID", hide_env_values = true)]
    imgur_client_id: Option<String>,

    /// Where screenshots are saved when upload fails (or set ISSUE_DRAFTER_ARCHIVE_DIR)
    #[arg(long, env = "ISSUE_DRAFTER_ARCHIVE_DIR")]
    archive_dir: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let mut config = Config::new(self.api_key.clone())?;
        if let Some(url) = &self.api_url {
            config = config.with_api_url(url);
        }
        if let Some(model) = &self.model {
            config = config.with_model(model);
        }
        if let Some(repo) = &self.repo {
            config = config.with_repo(repo);
        }
        if let Some(client_id) = &self.imgur_client_id {
            let url = config.imgur_url.clone();
            config = config.with_imgur(&url, client_id);
        }
        if let Some(dir) = &self.archive_dir {
            config = config.with_archive_dir(dir);
        }
        Ok(config)
    }

    fn into_input(self) -> RequestInput {
        RequestInput {
            summary: self.summary,
            url: self.url,
            space_id: self.space_id,
            issue_type: self.issue_type,
            customer: self.customer,
            expected: self.expected,
            actual: self.actual,
            screenshots: self.screenshots,
            clipboard: self.clipboard,
            recordings: self.recordings,
            labels: self.labels,
            dry_run: self.dry_run,
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Fail on a missing key before asking the user anything.
    let config = cli.config()?;
    let interactive = cli.interactive;

    let mut input = cli.into_input();
    if interactive {
        input = interactive::collect(input, &config.space_marker)?;
    }
    let space_id_given = input.space_id.is_some();
    let request = input.validate(&config.space_marker)?;
    if !space_id_given {
        println!("Space ID auto-detected: {}", request.space_id);
    }

    println!("Generating issue with AI...");
    let prompt = issue_drafter::build_prompt(&request);
    let draft = AnthropicClient::new(&config).draft_issue(&prompt)?;

    let outcomes = if request.screenshots.is_empty() {
        Vec::new()
    } else {
        println!("Processing {} screenshot(s)...", request.screenshots.len());
        let outcomes = issue_drafter::process_screenshots(
            &request.screenshots,
            &SystemClipboard::default(),
            &ImgurClient::new(&config),
            &Archive::new(&config.archive_dir),
        );
        report_screenshots(&outcomes);
        outcomes
    };

    let issue = issue_drafter::assemble(&request, draft, &outcomes);
    println!("{}", issue_drafter::render_preview(&issue));

    let manual: Vec<PathBuf> = outcomes
        .iter()
        .filter_map(|o| o.archived_path().map(PathBuf::from))
        .collect();

    let result = issue_drafter::submit(
        &issue,
        manual,
        request.dry_run,
        || {
            println!();
            Confirm::new()
                .with_prompt("Create this issue?")
                .default(true)
                .interact()
                .map_err(|e| std::io::Error::other(e.to_string()).into())
        },
        &GhCli::new(&config),
        &SystemBrowser,
    )?;

    match result {
        Submission::DryRun => println!("\n(dry run - issue not created)"),
        Submission::Cancelled => println!("Issue creation cancelled."),
        Submission::Created {
            url,
            manual_attachments,
        } => {
            println!("\nIssue created successfully!");
            println!("{}", url);
            if !manual_attachments.is_empty() {
                println!("\nScreenshots that need manual attachment:");
                for path in &manual_attachments {
                    println!("   {}", path.display());
                }
                println!("\nOpened the issue in your browser - edit it and drag the screenshots in.");
            }
            report_failed_screenshots(&outcomes);
        }
    }
    Ok(())
}

fn report_failed_screenshots(outcomes: &[ScreenshotOutcome]) {
    let failures = issue_drafter::failure_summary(outcomes);
    if failures.is_empty() {
        return;
    }
    eprintln!("\nScreenshots that could not be attached:");
    for line in failures {
        eprintln!("   {}", line);
    }
}

fn report_screenshots(outcomes: &[ScreenshotOutcome]) {
    for (i, outcome) in outcomes.iter().enumerate() {
        let n = i + 1;
        match outcome {
            ScreenshotOutcome::Uploaded { .. } => {
                println!("   ✓ Screenshot {} uploaded successfully", n)
            }
            ScreenshotOutcome::Archived { path, reason, .. } => println!(
                "   ⚠ Screenshot {} upload failed ({}), saved locally: {}",
                n,
                reason,
                path.display()
            ),
            ScreenshotOutcome::Failed { source, error } => {
                eprintln!("   ✗ Screenshot {} ({}) failed: {}", n, source, error)
            }
        }
    }
}
