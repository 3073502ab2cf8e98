use tracing::debug;

use crate::Error;
use crate::config::Config;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Title and body as drafted by the model, before attachments are added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftIssue {
    pub title: String,
    pub body: String,
}

/// A client for the Anthropic Messages API.
pub struct AnthropicClient {
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(config: &Config) -> Self {
        Self {
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    /// Send a single-turn prompt and return the text of the first text block.
    pub fn complete(&self, prompt: &str) -> Result<String, Error> {
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        });

        let resp_str = match ureq::post(&self.api_url)
            .set("x-api-key", &self.api_key)
            .set("anthropic-version", ANTHROPIC_VERSION)
            .set("Content-Type", "application/json")
            .send_string(&body.to_string())
        {
            Ok(resp) => resp
                .into_string()
                .map_err(|e| Error::Parse(e.to_string()))?,
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                return Err(Error::Api { status: code, body });
            }
            Err(e) => return Err(e.into()),
        };

        let resp: serde_json::Value =
            serde_json::from_str(&resp_str).map_err(|e| Error::Parse(e.to_string()))?;

        let text = resp["content"]
            .as_array()
            .and_then(|blocks| {
                blocks
                    .iter()
                    .find(|b| b["type"] == "text")
                    .and_then(|b| b["text"].as_str())
            })
            .ok_or_else(|| {
                Error::Parse(format!("completion response has no text content: {}", resp))
            })?;

        debug!(
            model = %self.model,
            stop_reason = resp["stop_reason"].as_str().unwrap_or("unknown"),
            "Completion received"
        );
        Ok(text.trim().to_string())
    }

    /// Ask the model to draft the issue and parse its answer.
    pub fn draft_issue(&self, prompt: &str) -> Result<DraftIssue, Error> {
        let raw = self.complete(prompt)?;
        parse_draft(&raw)
    }
}

/// Parse a model response into a [`DraftIssue`].
///
/// The trimmed text is first parsed as JSON as-is. If that fails, the first
/// balanced `{...}` region is extracted and parsed instead. Either way the
/// object must carry non-empty `title` and `body` strings.
pub fn parse_draft(raw: &str) -> Result<DraftIssue, Error> {
    let trimmed = raw.trim();

    let value = match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value) => value,
        Err(strict_err) => {
            debug!(error = %strict_err, "Strict parse failed, extracting JSON object");
            let region = first_object(trimmed).ok_or_else(|| Error::Formatting {
                message: "Failed to parse AI response as JSON".into(),
                raw: raw.to_string(),
            })?;
            serde_json::from_str(region).map_err(|e| Error::Formatting {
                message: format!("Failed to parse AI response as JSON ({})", e),
                raw: raw.to_string(),
            })?
        }
    };

    let field = |name: &str| {
        value[name]
            .as_str()
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };

    match (field("title"), field("body")) {
        (Some(title), Some(body)) => Ok(DraftIssue { title, body }),
        _ => Err(Error::Formatting {
            message: "AI response missing required fields".into(),
            raw: raw.to_string(),
        }),
    }
}

/// Slice out the first balanced brace region, skipping braces inside JSON
/// string literals.
fn first_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r###"{"title": "[Bug] Traces fail to load", "body": "## Description\n\nTraces {never} load."}"###;

    fn expected() -> DraftIssue {
        DraftIssue {
            title: "[Bug] Traces fail to load".into(),
            body: "## Description\n\nTraces {never} load.".into(),
        }
    }

    #[test]
    fn test_parse_pure_json() {
        assert_eq!(parse_draft(JSON).unwrap(), expected());
        assert_eq!(parse_draft(&format!("\n  {}  \n", JSON)).unwrap(), expected());
    }

    #[test]
    fn test_parse_json_in_prose() {
        let raw = format!(
            "Here is the issue you asked for:\n\n{}\n\nLet me know if you want {{changes}}.",
            JSON
        );
        assert_eq!(parse_draft(&raw).unwrap(), expected());
    }

    #[test]
    fn test_parse_json_in_code_fence() {
        let raw = format!("```json\n{}\n```", JSON);
        assert_eq!(parse_draft(&raw).unwrap(), expected());
    }

    #[test]
    fn test_parse_no_json() {
        let raw = "Sorry, I can't help with that.";
        match parse_draft(raw).unwrap_err() {
            Error::Formatting { raw: got, .. } => assert_eq!(got, raw),
            other => panic!("expected Formatting error, got: {}", other),
        }
        assert!(parse_draft(raw).unwrap_err().to_string().contains(raw));
    }

    #[test]
    fn test_parse_keeps_fields_verbatim() {
        let draft =
            parse_draft(r#"{"title": " T ", "body": "    let x = 1;\n\n## Description\n"}"#)
                .unwrap();
        assert_eq!(draft.title, " T ");
        assert_eq!(draft.body, "    let x = 1;\n\n## Description\n");

        assert!(matches!(
            parse_draft(r#"{"title": "T", "body": "   \n"}"#),
            Err(Error::Formatting { .. })
        ));
    }

    #[test]
    fn test_parse_unbalanced() {
        let raw = r#"prefix {"title": "x", "body": "y""#;
        assert!(matches!(parse_draft(raw), Err(Error::Formatting { .. })));
    }

    #[test]
    fn test_parse_missing_fields() {
        let err = parse_draft(r#"{"title": "only a title"}"#).unwrap_err();
        assert!(err.to_string().contains("missing required fields"));
        assert!(err.to_string().contains("only a title"));

        assert!(matches!(
            parse_draft(r#"{"title": "", "body": "b"}"#),
            Err(Error::Formatting { .. })
        ));
        assert!(matches!(
            parse_draft(r#"{"title": 1, "body": "b"}"#),
            Err(Error::Formatting { .. })
        ));
    }

    #[test]
    fn test_first_object_skips_string_braces() {
        let text = r#"noise {"a": "}{", "b": {"c": "\"}"}} trailing }"#;
        assert_eq!(
            first_object(text),
            Some(r#"{"a": "}{", "b": {"c": "\"}"}}"#)
        );
        assert_eq!(first_object("no braces"), None);
    }

    fn client(server: &mockito::Server) -> AnthropicClient {
        let config = Config::new(Some("sk-test".into()))
            .unwrap()
            .with_api_url(&format!("{}/v1/messages", server.url()))
            .with_model("test-model");
        AnthropicClient::new(&config)
    }

    #[test]
    fn test_draft_issue_success() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "sk-test")
            .match_header("anthropic-version", ANTHROPIC_VERSION)
            .match_header("Content-Type", "application/json")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "test-model",
                "max_tokens": 1024,
                "messages": [{ "role": "user", "content": "the prompt" }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "id": "msg_1",
                    "type": "message",
                    "role": "assistant",
                    "stop_reason": "end_turn",
                    "content": [{ "type": "text", "text": format!("Sure!\n{}", JSON) }]
                })
                .to_string(),
            )
            .create();

        let draft = client(&server).draft_issue("the prompt").unwrap();
        assert_eq!(draft, expected());
        mock.assert();
    }

    #[test]
    fn test_complete_api_error() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(401)
            .with_body(r#"{"type":"error","error":{"type":"authentication_error"}}"#)
            .create();

        match client(&server).complete("p").unwrap_err() {
            Error::Api { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("authentication_error"));
            }
            other => panic!("expected Api error, got: {}", other),
        }
        mock.assert();
    }

    #[test]
    fn test_complete_without_text_block() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::json!({ "content": [] }).to_string())
            .create();

        assert!(matches!(
            client(&server).complete("p"),
            Err(Error::Parse(_))
        ));
        mock.assert();
    }
}
