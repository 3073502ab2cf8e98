use tracing::debug;

use crate::attachments::{ScreenshotOutcome, render_recordings};
use crate::formatter::DraftIssue;
use crate::request::{IssueRequest, IssueType};

const CUSTOMER_REQUEST_LABEL: &str = "Customer Request";
const MANUAL_ATTACHMENT_NOTE: &str = "*Screenshots to be attached manually after issue creation*";

/// The issue exactly as it will be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalIssue {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// Merge the drafted issue with attachment sections and compute labels.
pub fn assemble(
    request: &IssueRequest,
    draft: DraftIssue,
    screenshots: &[ScreenshotOutcome],
) -> FinalIssue {
    let mut sections = Vec::new();

    let embeds: Vec<String> = screenshots.iter().filter_map(|o| o.embed()).collect();
    if !embeds.is_empty() {
        sections.push(format!("## Screenshots\n\n{}", embeds.join("\n\n")));
    } else if screenshots.iter().any(|o| o.archived_path().is_some()) {
        sections.push(format!("## Screenshots\n\n{}", MANUAL_ATTACHMENT_NOTE));
    }

    if !request.recordings.is_empty() {
        sections.push(format!(
            "## Video Recordings\n\n{}",
            render_recordings(&request.recordings).join("\n")
        ));
    }

    let mut body = draft.body;
    if !sections.is_empty() {
        body.push_str("\n\n");
        body.push_str(&sections.join("\n\n"));
    }

    let labels = compute_labels(request.issue_type, request.customer.as_deref(), &request.labels);
    debug!(?labels, sections = sections.len(), "Assembled issue");

    FinalIssue {
        title: draft.title,
        body,
        labels,
    }
}

/// Type label first, then customer labels, then user labels verbatim.
/// Duplicates are kept.
pub fn compute_labels(issue_type: IssueType, customer: Option<&str>, extra: &[String]) -> Vec<String> {
    let mut labels = vec![issue_type.label().to_string()];
    if let Some(customer) = customer {
        labels.push(format!("customer-{}", customer_slug(customer)));
        labels.push(CUSTOMER_REQUEST_LABEL.to_string());
    }
    labels.extend(extra.iter().cloned());
    labels
}

fn customer_slug(customer: &str) -> String {
    customer.to_lowercase().replace(' ', "-")
}
