use anyhow::Result;
use dialoguer::{Confirm, Input, Select};
use issue_drafter::{IssueType, RequestInput, parse_space_id};

/// Walk the user through every field, one prompt at a time.
///
/// Answers replace the corresponding flags. Screenshot paths, recordings and
/// labels given on the command line are kept and extended.
pub fn collect(base: RequestInput, space_marker: &str) -> Result<RequestInput> {
    println!("\nIssue Reporter - Interactive Mode\n");

    let choice = Select::new()
        .with_prompt("Issue type")
        .items(&["Bug report", "Feature request"])
        .default(0)
        .interact()?;
    let issue_type = if choice == 0 {
        IssueType::Bug
    } else {
        IssueType::Feature
    };

    let noun = match issue_type {
        IssueType::Bug => "bug",
        IssueType::Feature => "feature request",
    };
    let summary = required(&format!("Describe the {}", noun))?;
    let url = required("Platform URL")?;

    let space_id = match parse_space_id(&url, space_marker) {
        Some(id) => {
            println!("   (Space ID auto-detected: {})", id);
            id
        }
        None => required("Space ID (could not auto-detect from URL)")?,
    };

    let customer = if Confirm::new()
        .with_prompt("Is this related to a specific customer?")
        .default(false)
        .interact()?
    {
        Some(required("Customer name/identifier (for tagging)")?)
    } else {
        None
    };

    let (expected, actual) = match issue_type {
        IssueType::Bug => (
            optional("What did you expect to happen?")?,
            optional("What actually happened?")?,
        ),
        IssueType::Feature => (None, None),
    };

    let mut clipboard = base.clipboard;
    if Confirm::new()
        .with_prompt("Do you have a screenshot to attach?")
        .default(false)
        .interact()?
    {
        // Only waits for Enter; the image is read from the clipboard later.
        optional("   Copy your screenshot to the clipboard, then press Enter")?;
        clipboard = true;
        println!("   ✓ Screenshot will be taken from the clipboard");
    }

    let mut recordings = base.recordings;
    if Confirm::new()
        .with_prompt("Do you have any video recordings (Loom/Zoom)?")
        .default(false)
        .interact()?
    {
        println!("   (Paste URLs, empty line to finish)");
        while let Some(url) = optional("Recording URL")? {
            recordings.push(url);
        }
    }

    Ok(RequestInput {
        summary: Some(summary),
        url: Some(url),
        space_id: Some(space_id),
        issue_type,
        customer,
        expected,
        actual,
        clipboard,
        recordings,
        ..base
    })
}

fn required(prompt: &str) -> Result<String> {
    let value: String = Input::new()
        .with_prompt(prompt)
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            if input.trim().is_empty() {
                Err("This field is required")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    Ok(value.trim().to_string())
}

fn optional(prompt: &str) -> Result<Option<String>> {
    let value: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    let trimmed = value.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}
