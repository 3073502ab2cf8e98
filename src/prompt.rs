use crate::request::{IssueRequest, IssueType};

const BUG_SECTIONS: &str = r#"4. Steps to reproduce (if inferable from the description, otherwise use reasonable placeholders like "1. Navigate to [URL]", "2. Perform [action]", "3. Observe the issue")
5. Expected behavior
6. Actual behavior"#;

const FEATURE_SECTIONS: &str = "4. Use case / motivation
5. Proposed solution or behavior
6. Any additional context";

const NO_EXTRA_CONTEXT: &str = "(No additional context provided)";

/// Render the completion prompt for a request. Pure and deterministic.
pub fn build_prompt(request: &IssueRequest) -> String {
    let issue_type = request.issue_type;

    let extra_context = extra_context(request.expected.as_deref(), request.actual.as_deref());
    let customer_context = request
        .customer
        .as_deref()
        .map(|c| format!("Customer: {} (this is a customer-reported issue)", c))
        .unwrap_or_default();

    format!(
        "You are helping create a GitHub issue for {context} in the Arize observability platform.

User's description: {summary}
Platform URL: {url}
Space ID: {space_id}
{extra_context}
{customer_context}

Generate a well-structured GitHub issue with:
1. A clear, concise title (prefix with {prefix})
2. Description of the issue/request
3. Location context (include the URL and Space ID)
{sections}

Output ONLY valid JSON in this exact format (no markdown, no extra text):
{{\"title\": \"...\", \"body\": \"...\"}}

The body should be formatted as GitHub-flavored markdown with appropriate headers (##) for each section.",
        context = issue_type.prompt_context(),
        summary = request.summary,
        url = request.url,
        space_id = request.space_id,
        prefix = issue_type.title_prefix(),
        sections = sections(issue_type),
    )
}

fn sections(issue_type: IssueType) -> &'static str {
    match issue_type {
        IssueType::Bug => BUG_SECTIONS,
        IssueType::Feature => FEATURE_SECTIONS,
    }
}

fn extra_context(expected: Option<&str>, actual: Option<&str>) -> String {
    let mut parts = Vec::new();
    if let Some(expected) = expected {
        parts.push(format!("Expected behavior: {}", expected));
    }
    if let Some(actual) = actual {
        parts.push(format!("Actual behavior: {}", actual));
    }
    if parts.is_empty() {
        NO_EXTRA_CONTEXT.to_string()
    } else {
        parts.join("\n")
    }
}
