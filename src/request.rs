use std::fmt;
use std::path::PathBuf;

use regex::Regex;
use tracing::{info, warn};

use crate::Error;

/// What kind of issue is being filed. Drives the prompt sections, the title
/// prefix and the default label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum IssueType {
    #[default]
    Bug,
    Feature,
}

impl IssueType {
    pub fn label(self) -> &'static str {
        match self {
            IssueType::Bug => "bug",
            IssueType::Feature => "enhancement",
        }
    }

    pub fn title_prefix(self) -> &'static str {
        match self {
            IssueType::Bug => "[Bug]",
            IssueType::Feature => "[Internal Feature Request]",
        }
    }

    pub fn prompt_context(self) -> &'static str {
        match self {
            IssueType::Bug => "a bug report",
            IssueType::Feature => "an internal feature request",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IssueType::Bug => "bug",
            IssueType::Feature => "feature",
        })
    }
}

/// Where a screenshot comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenshotSource {
    File(PathBuf),
    Clipboard,
}

impl fmt::Display for ScreenshotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenshotSource::File(path) => write!(f, "{}", path.display()),
            ScreenshotSource::Clipboard => f.write_str("clipboard"),
        }
    }
}

/// Raw, possibly incomplete input as gathered from flags or prompts.
#[derive(Debug, Clone, Default)]
pub struct RequestInput {
    pub summary: Option<String>,
    pub url: Option<String>,
    pub space_id: Option<String>,
    pub issue_type: IssueType,
    pub customer: Option<String>,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub screenshots: Vec<PathBuf>,
    pub clipboard: bool,
    pub recordings: Vec<String>,
    pub labels: Vec<String>,
    pub dry_run: bool,
}

/// A validated request. Nothing downstream mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRequest {
    pub summary: String,
    pub url: String,
    pub space_id: String,
    pub issue_type: IssueType,
    pub customer: Option<String>,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub screenshots: Vec<ScreenshotSource>,
    pub recordings: Vec<String>,
    pub labels: Vec<String>,
    pub dry_run: bool,
}

impl RequestInput {
    /// Check required fields and resolve the space id, auto-detecting it from
    /// the URL when it wasn't given explicitly.
    pub fn validate(self, space_marker: &str) -> Result<IssueRequest, Error> {
        let summary = non_empty(self.summary).ok_or_else(|| {
            Error::Validation(
                "Summary is required. Provide it as an argument or use --interactive".into(),
            )
        })?;
        let url = non_empty(self.url).ok_or_else(|| {
            Error::Validation("--url is required. Provide the platform URL.".into())
        })?;

        let space_id = match non_empty(self.space_id) {
            Some(id) => id,
            None => {
                let id = parse_space_id(&url, space_marker).ok_or_else(|| {
                    Error::Validation(
                        "--space-id is required (could not auto-detect from URL).".into(),
                    )
                })?;
                info!(space_id = %id, "Space ID auto-detected from URL");
                id
            }
        };

        let (expected, actual) = match self.issue_type {
            IssueType::Bug => (non_empty(self.expected), non_empty(self.actual)),
            IssueType::Feature => {
                if self.expected.is_some() || self.actual.is_some() {
                    warn!("--expected/--actual only apply to bug reports; ignoring");
                }
                (None, None)
            }
        };

        let mut screenshots: Vec<ScreenshotSource> = self
            .screenshots
            .into_iter()
            .map(|p| ScreenshotSource::File(expand_home(p)))
            .collect();
        if self.clipboard {
            screenshots.push(ScreenshotSource::Clipboard);
        }

        Ok(IssueRequest {
            summary,
            url,
            space_id,
            issue_type: self.issue_type,
            customer: non_empty(self.customer),
            expected,
            actual,
            screenshots,
            recordings: self
                .recordings
                .into_iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect(),
            labels: self.labels,
            dry_run: self.dry_run,
        })
    }
}

/// Extract the path segment following `/<marker>/` in a URL.
///
/// ```
/// let url = "https://app.arize.com/organizations/x/spaces/U3BhY2U6MzY1NTU6aitIdg==/models";
/// assert_eq!(
///     issue_drafter::parse_space_id(url, "spaces").as_deref(),
///     Some("U3BhY2U6MzY1NTU6aitIdg=="),
/// );
/// ```
pub fn parse_space_id(url: &str, marker: &str) -> Option<String> {
    let pattern = format!(r"/{}/([^/?#]+)", regex::escape(marker));
    let re = Regex::new(&pattern).ok()?;
    re.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn expand_home(path: PathBuf) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path,
        },
        Err(_) => path,
    }
}
