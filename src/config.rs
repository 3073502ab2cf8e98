use std::path::PathBuf;
use std::time::Duration;

use crate::Error;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_MAX_TOKENS: u32 = 1024;
const IMGUR_UPLOAD_URL: &str = "https://api.imgur.com/3/image";
// Registered for anonymous uploads; not a secret.
const IMGUR_CLIENT_ID: &str = "546c25a59c58ad7";
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_REPO: &str = "Arize-ai/arize";
const DEFAULT_TRACKER_PROGRAM: &str = "gh";
const DEFAULT_SPACE_MARKER: &str = "spaces";
const ARCHIVE_DIR_NAME: &str = "arize-screenshots";

/// Everything the pipeline needs from the outside world.
///
/// Built once in `main` and handed to each component, so tests can point the
/// HTTP clients at a mock server and the archive at a scratch directory.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub imgur_url: String,
    pub imgur_client_id: String,
    pub upload_timeout: Duration,
    pub repo: String,
    pub tracker_program: String,
    pub archive_dir: PathBuf,
    pub space_marker: String,
}

impl Config {
    /// Create a config with default endpoints. Fails if the completion API key
    /// is missing or blank.
    pub fn new(api_key: Option<String>) -> Result<Self, Error> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "ANTHROPIC_API_KEY environment variable is required. \
                     Set it with: export ANTHROPIC_API_KEY='your-key'"
                        .into(),
                )
            })?;

        Ok(Self {
            api_key,
            api_url: ANTHROPIC_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            imgur_url: IMGUR_UPLOAD_URL.to_string(),
            imgur_client_id: IMGUR_CLIENT_ID.to_string(),
            upload_timeout: UPLOAD_TIMEOUT,
            repo: DEFAULT_REPO.to_string(),
            tracker_program: DEFAULT_TRACKER_PROGRAM.to_string(),
            archive_dir: default_archive_dir(),
            space_marker: DEFAULT_SPACE_MARKER.to_string(),
        })
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_imgur(mut self, url: &str, client_id: &str) -> Self {
        self.imgur_url = url.to_string();
        self.imgur_client_id = client_id.to_string();
        self
    }

    pub fn with_repo(mut self, repo: &str) -> Self {
        self.repo = repo.to_string();
        self
    }

    pub fn with_archive_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.archive_dir = dir.into();
        self
    }
}

/// `<Desktop>/arize-screenshots`, falling back to `~/Desktop` and finally the
/// current directory when no home is known.
pub fn default_archive_dir() -> PathBuf {
    dirs::desktop_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Desktop")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(ARCHIVE_DIR_NAME)
}
