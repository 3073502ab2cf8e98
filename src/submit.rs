use std::path::PathBuf;
use std::process::Command;

use tracing::{info, warn};

use crate::Error;
use crate::assemble::FinalIssue;
use crate::config::Config;

const RULE_WIDTH: usize = 60;

/// Render the issue for the terminal: title, body and labels verbatim.
pub fn render_preview(issue: &FinalIssue) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!(
        "\n{rule}\nISSUE PREVIEW\n{rule}\n\nTitle: {title}\n\nBody:\n\n{body}\n\n{rule}\nLabels: {labels}",
        title = issue.title,
        body = issue.body,
        labels = issue.labels.join(", "),
    )
}

/// Something that can file issues. Returns the created issue's location.
pub trait IssueTracker {
    fn create_issue(&self, issue: &FinalIssue) -> Result<String, Error>;
}

/// Files issues with `gh issue create`, reusing the user's gh login.
pub struct GhCli {
    program: String,
    repo: String,
}

impl GhCli {
    pub fn new(config: &Config) -> Self {
        Self {
            program: config.tracker_program.clone(),
            repo: config.repo.clone(),
        }
    }

    fn args(&self, issue: &FinalIssue) -> Vec<String> {
        let mut args: Vec<String> = [
            "issue",
            "create",
            "--repo",
            self.repo.as_str(),
            "--title",
            issue.title.as_str(),
            "--body",
            issue.body.as_str(),
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        for label in &issue.labels {
            args.push("--label".into());
            args.push(label.clone());
        }
        args
    }
}

impl IssueTracker for GhCli {
    fn create_issue(&self, issue: &FinalIssue) -> Result<String, Error> {
        let output = Command::new(&self.program)
            .args(self.args(issue))
            .output()
            .map_err(|e| Error::Submission {
                status: None,
                stderr: format!("failed to run `{}`: {}", self.program, e),
            })?;

        if !output.status.success() {
            return Err(Error::Submission {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!(repo = %self.repo, url = %url, "Created GitHub issue");
        Ok(url)
    }
}

/// Opens a location for the user.
pub trait Browser {
    fn open(&self, url: &str) -> Result<(), Error>;
}

/// The desktop's default browser.
pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&self, url: &str) -> Result<(), Error> {
        open::that(url)?;
        Ok(())
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    DryRun,
    Cancelled,
    Created {
        url: String,
        /// Screenshots the user still has to drag into the issue.
        manual_attachments: Vec<PathBuf>,
    },
}

/// Confirm and file the issue.
///
/// Dry runs return before `confirm` is asked. When screenshots had to be
/// archived locally, the created issue is opened in the browser; failing to
/// open it is only logged.
pub fn submit<F>(
    issue: &FinalIssue,
    manual_attachments: Vec<PathBuf>,
    dry_run: bool,
    confirm: F,
    tracker: &dyn IssueTracker,
    browser: &dyn Browser,
) -> Result<Submission, Error>
where
    F: FnOnce() -> Result<bool, Error>,
{
    if dry_run {
        info!("Dry run, not creating issue");
        return Ok(Submission::DryRun);
    }
    if !confirm()? {
        info!("Issue creation cancelled by user");
        return Ok(Submission::Cancelled);
    }

    let url = tracker.create_issue(issue)?;

    if !manual_attachments.is_empty() {
        if let Err(e) = browser.open(&url) {
            warn!(url = %url, error = %e, "Could not open issue in browser");
        }
    }

    Ok(Submission::Created {
        url,
        manual_attachments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingTracker {
        calls: RefCell<Vec<FinalIssue>>,
        fail_with: Option<String>,
    }

    impl IssueTracker for RecordingTracker {
        fn create_issue(&self, issue: &FinalIssue) -> Result<String, Error> {
            self.calls.borrow_mut().push(issue.clone());
            match &self.fail_with {
                Some(stderr) => Err(Error::Submission {
                    status: Some(1),
                    stderr: stderr.clone(),
                }),
                None => Ok("https://github.com/acme/widgets/issues/7".into()),
            }
        }
    }

    #[derive(Default)]
    struct RecordingBrowser {
        opened: RefCell<Vec<String>>,
        broken: bool,
    }

    impl Browser for RecordingBrowser {
        fn open(&self, url: &str) -> Result<(), Error> {
            self.opened.borrow_mut().push(url.to_string());
            if self.broken {
                return Err(Error::Io(std::io::Error::other("no display")));
            }
            Ok(())
        }
    }

    fn issue() -> FinalIssue {
        FinalIssue {
            title: "[Bug] Broken".into(),
            body: "## Description\n\nBroken.".into(),
            labels: vec!["bug".into(), "Customer Request".into()],
        }
    }

    #[test]
    fn test_preview_contains_everything() {
        let preview = render_preview(&issue());
        assert!(preview.contains("ISSUE PREVIEW"));
        assert!(preview.contains("Title: [Bug] Broken"));
        assert!(preview.contains("## Description\n\nBroken."));
        assert!(preview.ends_with("Labels: bug, Customer Request"));
    }

    #[test]
    fn test_dry_run_never_confirms_or_submits() {
        let tracker = RecordingTracker::default();
        let browser = RecordingBrowser::default();
        let result = submit(
            &issue(),
            vec![PathBuf::from("/tmp/a.png")],
            true,
            || panic!("confirm must not be called on a dry run"),
            &tracker,
            &browser,
        )
        .unwrap();

        assert_eq!(result, Submission::DryRun);
        assert!(tracker.calls.borrow().is_empty());
        assert!(browser.opened.borrow().is_empty());
    }

    #[test]
    fn test_declined_is_clean() {
        let tracker = RecordingTracker::default();
        let result = submit(
            &issue(),
            vec![],
            false,
            || Ok(false),
            &tracker,
            &RecordingBrowser::default(),
        )
        .unwrap();
        assert_eq!(result, Submission::Cancelled);
        assert!(tracker.calls.borrow().is_empty());
    }

    #[test]
    fn test_created_without_archived_screenshots() {
        let tracker = RecordingTracker::default();
        let browser = RecordingBrowser::default();
        let result = submit(&issue(), vec![], false, || Ok(true), &tracker, &browser).unwrap();

        assert_eq!(
            result,
            Submission::Created {
                url: "https://github.com/acme/widgets/issues/7".into(),
                manual_attachments: vec![],
            }
        );
        assert_eq!(*tracker.calls.borrow(), vec![issue()]);
        assert!(browser.opened.borrow().is_empty());
    }

    #[test]
    fn test_archived_screenshots_open_browser() {
        let tracker = RecordingTracker::default();
        let browser = RecordingBrowser {
            broken: true,
            ..Default::default()
        };
        let result = submit(
            &issue(),
            vec![PathBuf::from("/tmp/a.png")],
            false,
            || Ok(true),
            &tracker,
            &browser,
        )
        .unwrap();

        // A browser failure doesn't fail the run.
        assert!(matches!(result, Submission::Created { .. }));
        assert_eq!(
            *browser.opened.borrow(),
            vec!["https://github.com/acme/widgets/issues/7"]
        );
    }

    #[test]
    fn test_tracker_failure_surfaces_stderr() {
        let tracker = RecordingTracker {
            fail_with: Some("could not add label: 'p9' not found".into()),
            ..Default::default()
        };
        let browser = RecordingBrowser::default();
        let err = submit(
            &issue(),
            vec![PathBuf::from("/tmp/a.png")],
            false,
            || Ok(true),
            &tracker,
            &browser,
        )
        .unwrap_err();

        assert!(err.to_string().contains("'p9' not found"));
        assert!(browser.opened.borrow().is_empty());
    }

    #[test]
    fn test_gh_args() {
        let config = Config::new(Some("k".into())).unwrap().with_repo("acme/widgets");
        let args = GhCli::new(&config).args(&issue());
        assert_eq!(
            args,
            vec![
                "issue",
                "create",
                "--repo",
                "acme/widgets",
                "--title",
                "[Bug] Broken",
                "--body",
                "## Description\n\nBroken.",
                "--label",
                "bug",
                "--label",
                "Customer Request",
            ]
        );
    }

    #[test]
    fn test_gh_missing_program() {
        let mut config = Config::new(Some("k".into())).unwrap();
        config.tracker_program = "issue-drafter-no-such-gh".into();
        match GhCli::new(&config).create_issue(&issue()).unwrap_err() {
            Error::Submission { status, stderr } => {
                assert_eq!(status, None);
                assert!(stderr.contains("issue-drafter-no-such-gh"));
            }
            other => panic!("expected Submission error, got: {}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_gh_nonzero_exit() {
        let mut config = Config::new(Some("k".into())).unwrap();
        config.tracker_program = "false".into();
        match GhCli::new(&config).create_issue(&issue()).unwrap_err() {
            Error::Submission { status, .. } => assert_eq!(status, Some(1)),
            other => panic!("expected Submission error, got: {}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_gh_failure_captures_stderr() {
        let mut config = Config::new(Some("k".into())).unwrap();
        // `ls` rejects the gh flags and complains on stderr.
        config.tracker_program = "ls".into();
        let err = GhCli::new(&config).create_issue(&issue()).unwrap_err();
        let msg = err.to_string();
        match err {
            Error::Submission { status, stderr } => {
                let code = status.expect("ls exits with a code");
                assert_ne!(code, 0);
                assert!(!stderr.is_empty());
                assert!(stderr.contains("ls"));
                assert!(msg.contains(&format!("exit Some({})", code)));
                assert!(msg.contains(&stderr));
            }
            other => panic!("expected Submission error, got: {}", other),
        }
    }

    #[test]
    fn test_submission_error_shows_exit_code() {
        let err = Error::Submission {
            status: Some(4),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "Failed to create GitHub issue (exit Some(4)): ");
    }

    #[cfg(unix)]
    #[test]
    fn test_gh_stdout_is_location() {
        let mut config = Config::new(Some("k".into())).unwrap();
        config.tracker_program = "echo".into();
        let url = GhCli::new(&config).create_issue(&issue()).unwrap();
        assert!(url.starts_with("issue create --repo Arize-ai/arize --title [Bug] Broken"));
    }
}
