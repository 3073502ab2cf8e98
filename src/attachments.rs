use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info, warn};

use crate::Error;
use crate::clipboard::Clipboard;
use crate::config::Config;
use crate::request::ScreenshotSource;

/// Longest slice of an image host error body kept for diagnostics.
const ERROR_SNIPPET_LEN: usize = 200;

/// Somewhere screenshots can be published. Returns the public URL.
pub trait ImageHost {
    fn upload(&self, image: &[u8]) -> Result<String, Error>;
}

/// Anonymous Imgur uploads.
pub struct ImgurClient {
    url: String,
    client_id: String,
    timeout: Duration,
}

impl ImgurClient {
    pub fn new(config: &Config) -> Self {
        Self {
            url: config.imgur_url.clone(),
            client_id: config.imgur_client_id.clone(),
            timeout: config.upload_timeout,
        }
    }
}

impl ImageHost for ImgurClient {
    fn upload(&self, image: &[u8]) -> Result<String, Error> {
        let encoded = STANDARD.encode(image);

        let resp = match ureq::post(&self.url)
            .timeout(self.timeout)
            .set("Authorization", &format!("Client-ID {}", self.client_id))
            .send_form(&[("image", encoded.as_str()), ("type", "base64")])
        {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                debug!(status = code, body = %snippet(&body), "Image upload rejected");
                return Err(Error::Attachment(format!(
                    "image host returned {}: {}",
                    code,
                    snippet(&body)
                )));
            }
            Err(e) => {
                return Err(Error::Attachment(format!("image upload failed: {}", e)));
            }
        };

        let status = resp.status();
        debug!(status, "Image host responded");
        let body = resp
            .into_string()
            .map_err(|e| Error::Attachment(format!("unreadable image host response: {}", e)))?;
        if status != 200 {
            return Err(Error::Attachment(format!(
                "image host returned {}: {}",
                status,
                snippet(&body)
            )));
        }

        let json: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            Error::Attachment(format!("malformed image host response ({}): {}", e, snippet(&body)))
        })?;
        if json["success"].as_bool() != Some(true) {
            return Err(Error::Attachment(format!(
                "image host reported failure: {}",
                snippet(&body)
            )));
        }
        json["data"]["link"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::Attachment("image host response missing data.link".into()))
    }
}

/// Local fallback for screenshots that couldn't be hosted.
pub struct Archive {
    dir: PathBuf,
}

impl Archive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Copy `source` into the archive as `screenshot_<timestamp>[_n].<ext>`,
    /// never overwriting an earlier copy.
    pub fn store(&self, source: &Path) -> Result<PathBuf, Error> {
        if !source.is_file() {
            return Err(Error::Attachment(format!(
                "Screenshot file not found: {}",
                source.display()
            )));
        }
        fs::create_dir_all(&self.dir)?;

        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("png");

        let mut n = 1;
        let dest = loop {
            let name = match n {
                1 => format!("screenshot_{}.{}", stamp, ext),
                _ => format!("screenshot_{}_{}.{}", stamp, n, ext),
            };
            let candidate = self.dir.join(name);
            if !candidate.exists() {
                break candidate;
            }
            n += 1;
        };

        fs::copy(source, &dest)?;
        info!(source = %source.display(), dest = %dest.display(), "Archived screenshot locally");
        Ok(dest)
    }
}

/// What happened to one screenshot source.
#[derive(Debug)]
pub enum ScreenshotOutcome {
    Uploaded {
        source: ScreenshotSource,
        url: String,
    },
    Archived {
        source: ScreenshotSource,
        path: PathBuf,
        reason: String,
    },
    Failed {
        source: ScreenshotSource,
        error: Error,
    },
}

impl ScreenshotOutcome {
    pub fn source(&self) -> &ScreenshotSource {
        match self {
            ScreenshotOutcome::Uploaded { source, .. }
            | ScreenshotOutcome::Archived { source, .. }
            | ScreenshotOutcome::Failed { source, .. } => source,
        }
    }

    /// Markdown image embed for uploaded screenshots.
    pub fn embed(&self) -> Option<String> {
        match self {
            ScreenshotOutcome::Uploaded { url, .. } => Some(format!("![Screenshot]({})", url)),
            _ => None,
        }
    }

    pub fn archived_path(&self) -> Option<&Path> {
        match self {
            ScreenshotOutcome::Archived { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Upload each screenshot in order, archiving it locally when the upload
/// fails. Always returns one outcome per source.
pub fn process_screenshots(
    sources: &[ScreenshotSource],
    clipboard: &dyn Clipboard,
    host: &dyn ImageHost,
    archive: &Archive,
) -> Vec<ScreenshotOutcome> {
    sources
        .iter()
        .map(|source| process_one(source, clipboard, host, archive))
        .collect()
}

fn process_one(
    source: &ScreenshotSource,
    clipboard: &dyn Clipboard,
    host: &dyn ImageHost,
    archive: &Archive,
) -> ScreenshotOutcome {
    let failed = |error: Error| {
        warn!(source = %source, error = %error, "Screenshot failed");
        ScreenshotOutcome::Failed {
            source: source.clone(),
            error,
        }
    };

    let path = match source {
        ScreenshotSource::File(path) => path.clone(),
        ScreenshotSource::Clipboard => match clipboard.capture_image() {
            Ok(Some(path)) => path,
            Ok(None) => {
                return failed(Error::Attachment(
                    "No image found in clipboard (copy a screenshot first)".into(),
                ));
            }
            Err(e) => return failed(Error::Attachment(format!("clipboard capture failed: {}", e))),
        },
    };

    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            return failed(Error::Attachment(format!(
                "Screenshot file not found: {} ({})",
                path.display(),
                e
            )));
        }
    };

    match host.upload(&bytes) {
        Ok(url) => {
            info!(source = %source, url = %url, "Uploaded screenshot");
            ScreenshotOutcome::Uploaded {
                source: source.clone(),
                url,
            }
        }
        Err(upload_err) => match archive.store(&path) {
            Ok(archived) => ScreenshotOutcome::Archived {
                source: source.clone(),
                path: archived,
                reason: upload_err.to_string(),
            },
            Err(e) => failed(e),
        },
    }
}

/// One `source: error` line per screenshot that ended in failure, in input
/// order.
pub fn failure_summary(outcomes: &[ScreenshotOutcome]) -> Vec<String> {
    outcomes
        .iter()
        .filter_map(|o| match o {
            ScreenshotOutcome::Failed { source, error } => Some(format!("{}: {}", source, error)),
            _ => None,
        })
        .collect()
}

/// Recording providers recognised by URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingKind {
    Loom,
    Zoom,
    Video,
}

impl RecordingKind {
    pub fn classify(url: &str) -> Self {
        let url = url.to_lowercase();
        if url.contains("loom.com") {
            RecordingKind::Loom
        } else if url.contains("zoom") {
            RecordingKind::Zoom
        } else {
            RecordingKind::Video
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RecordingKind::Loom => "Loom",
            RecordingKind::Zoom => "Zoom",
            RecordingKind::Video => "Video",
        }
    }
}

/// Markdown list items for recording links, numbered from 1 in input order.
pub fn render_recordings(urls: &[String]) -> Vec<String> {
    urls.iter()
        .enumerate()
        .map(|(i, url)| {
            let kind = RecordingKind::classify(url);
            format!("- [{} Recording {}]({})", kind.name(), i + 1, url)
        })
        .collect()
}

fn snippet(body: &str) -> &str {
    match body.char_indices().nth(ERROR_SNIPPET_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
