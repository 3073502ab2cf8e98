//! Turn a one-line bug report into a well-formed GitHub issue.
//!
//! The pipeline runs strictly forward: validate the [`RequestInput`], build a
//! prompt, let the model draft a title and body, upload screenshots (archiving
//! them locally when the image host fails), assemble the final body and
//! labels, then file it through `gh`.
//!
//! ```no_run
//! use issue_drafter::*;
//!
//! let config = Config::new(std::env::var("ANTHROPIC_API_KEY").ok())?;
//! let request = RequestInput {
//!     summary: Some("Traces don't load".into()),
//!     url: Some("https://app.arize.com/spaces/abc123/traces".into()),
//!     ..Default::default()
//! }
//! .validate(&config.space_marker)?;
//!
//! let draft = AnthropicClient::new(&config).draft_issue(&build_prompt(&request))?;
//! let outcomes = process_screenshots(
//!     &request.screenshots,
//!     &NoClipboard,
//!     &ImgurClient::new(&config),
//!     &Archive::new(&config.archive_dir),
//! );
//! let issue = assemble(&request, draft, &outcomes);
//! let url = GhCli::new(&config).create_issue(&issue)?;
//! # Ok::<(), issue_drafter::Error>(())
//! ```

pub mod assemble;
pub mod attachments;
pub mod clipboard;
pub mod config;
pub mod formatter;
pub mod prompt;
pub mod request;
pub mod submit;

pub use assemble::{FinalIssue, assemble, compute_labels};
pub use attachments::{
    Archive, ImageHost, ImgurClient, RecordingKind, ScreenshotOutcome, failure_summary,
    process_screenshots, render_recordings,
};
pub use clipboard::{Clipboard, NoClipboard, SystemClipboard};
pub use config::Config;
pub use formatter::{AnthropicClient, DraftIssue, parse_draft};
pub use prompt::build_prompt;
pub use request::{IssueRequest, IssueType, RequestInput, ScreenshotSource, parse_space_id};
pub use submit::{Browser, GhCli, IssueTracker, Submission, SystemBrowser, render_preview, submit};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] ureq::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Config(String),
    #[error("{0}")]
    Validation(String),
    #[error("Completion API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Failed to parse response: {0}")]
    Parse(String),
    #[error("{message}: {raw}")]
    Formatting { message: String, raw: String },
    #[error("{0}")]
    Attachment(String),
    #[error("Failed to create GitHub issue (exit {status:?}): {stderr}")]
    Submission { status: Option<i32>, stderr: String },
}
