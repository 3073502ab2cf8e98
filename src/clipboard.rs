use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::Error;

const CAPTURE_FILE_NAME: &str = "clipboard_screenshot.png";

/// A source of clipboard images. `Ok(None)` means the clipboard held no
/// image, or the platform has no way to read one.
pub trait Clipboard {
    fn capture_image(&self) -> Result<Option<PathBuf>, Error>;
}

/// Platform without clipboard support.
pub struct NoClipboard;

impl Clipboard for NoClipboard {
    fn capture_image(&self) -> Result<Option<PathBuf>, Error> {
        Ok(None)
    }
}

/// Reads the macOS clipboard, first with `pngpaste` and then through an
/// AppleScript bridge. The capture lands in a fresh temp directory that is
/// left in place after the run.
pub struct SystemClipboard {
    paste_helper: String,
    script_runner: String,
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self {
            paste_helper: "pngpaste".into(),
            script_runner: "osascript".into(),
        }
    }
}

impl SystemClipboard {
    /// Override the helper programs, e.g. to point at wrappers.
    pub fn with_programs(paste_helper: &str, script_runner: &str) -> Self {
        Self {
            paste_helper: paste_helper.into(),
            script_runner: script_runner.into(),
        }
    }

    fn try_paste_helper(&self, dest: &Path) -> Result<bool, Error> {
        match Command::new(&self.paste_helper).arg(dest).output() {
            Ok(output) => {
                debug!(
                    helper = %self.paste_helper,
                    status = ?output.status.code(),
                    "Clipboard paste helper finished"
                );
                Ok(output.status.success() && dest.exists())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(helper = %self.paste_helper, "Clipboard paste helper not installed");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn try_script_bridge(&self, dest: &Path) -> Result<bool, Error> {
        let script = applescript(dest);
        match Command::new(&self.script_runner)
            .args(["-e", &script])
            .output()
        {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                debug!(runner = %self.script_runner, stdout = %stdout.trim(), "Clipboard script finished");
                Ok(stdout.contains("success") && dest.exists())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(runner = %self.script_runner, "Clipboard script runner not available");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Clipboard for SystemClipboard {
    fn capture_image(&self) -> Result<Option<PathBuf>, Error> {
        let dir = tempfile::Builder::new()
            .prefix("issue-drafter-")
            .tempdir()?
            .keep();
        let dest = dir.join(CAPTURE_FILE_NAME);

        if self.try_paste_helper(&dest)? || self.try_script_bridge(&dest)? {
            return Ok(Some(dest));
        }
        Ok(None)
    }
}

fn applescript(dest: &Path) -> String {
    let path = dest.display().to_string().replace('"', "\\\"");
    format!(
        r#"set theFile to POSIX file "{path}"
try
    set imageData to the clipboard as «class PNGf»
    set fileRef to open for access theFile with write permission
    write imageData to fileRef
    close access fileRef
    return "success"
on error errMsg
    try
        close access theFile
    end try
    return "error: " & errMsg
end try"#
    )
}
