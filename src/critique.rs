//! Curator-style critique of an image from the Gemini `generateContent` API.
//!
//! Failures never reach the caller: every error is logged and reported as
//! "no critique".

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::thread;
use thiserror::Error;
use winit::event_loop::EventLoopProxy;

use crate::loader::{LoadError, UserEvent, fetch_bytes};

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

const PROMPT: &str = "Analyze this image as a professional art curator. Provide a detailed \
critique, describe the mood, and offer hypothetical historical context.";

const FALLBACK_MIME: &str = "image/jpeg";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CuratorResponse {
    pub critique: String,
    pub mood: String,
    pub historical_context: String,
}

#[derive(Debug, Error)]
pub enum CritiqueError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("could not fetch image: {0}")]
    Image(#[from] LoadError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("response contained no text")]
    EmptyResponse,
    #[error("malformed critique: {0}")]
    Parse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// MIME type of the encoded image, falling back to JPEG when unknown.
fn mime_type(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or(FALLBACK_MIME)
}

fn request_body(image: &[u8]) -> Value {
    json!({
        "contents": [{
            "parts": [
                { "text": PROMPT },
                {
                    "inlineData": {
                        "mimeType": mime_type(image),
                        "data": STANDARD.encode(image),
                    }
                }
            ]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "critique": { "type": "STRING" },
                    "mood": { "type": "STRING" },
                    "historicalContext": { "type": "STRING" }
                },
                "required": ["critique", "mood", "historicalContext"]
            }
        }
    })
}

/// Concatenated text of the first candidate, if it has any.
fn response_text(response: &GenerateContentResponse) -> Option<String> {
    let content = response.candidates.first()?.content.as_ref()?;
    let text: String = content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn parse_critique(text: &str) -> Result<CuratorResponse, CritiqueError> {
    Ok(serde_json::from_str(text.trim())?)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct CritiqueClient {
    http: Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl CritiqueClient {
    pub fn new(http: Client, api_key: Option<String>, model: String, endpoint: String) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            log::info!("No API key configured; critiques are unavailable");
        }
        Self {
            http,
            api_key,
            model,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    /// Requests a critique of the image at `image_url`. Any failure yields `None`.
    pub fn critique(&self, image_url: &str) -> Option<CuratorResponse> {
        match self.try_critique(image_url) {
            Ok(response) => Some(response),
            Err(e) => {
                log::error!("Critique of {} failed: {}", image_url, e);
                None
            }
        }
    }

    fn try_critique(&self, image_url: &str) -> Result<CuratorResponse, CritiqueError> {
        let key = self.api_key.as_deref().ok_or(CritiqueError::MissingApiKey)?;
        let image = fetch_bytes(&self.http, image_url)?;

        log::debug!("[critique] {} ({} bytes) -> {}", image_url, image.len(), self.model);
        let response: GenerateContentResponse = self
            .http
            .post(self.url())
            .header("x-goog-api-key", key)
            .json(&request_body(&image))
            .send()?
            .error_for_status()?
            .json()?;

        let text = response_text(&response).ok_or(CritiqueError::EmptyResponse)?;
        parse_critique(&text)
    }
}

/// Runs a critique on a background thread and posts the outcome to the event loop.
pub fn spawn_critique(
    client: Arc<CritiqueClient>,
    index: usize,
    image_url: String,
    proxy: EventLoopProxy<UserEvent>,
) {
    thread::spawn(move || {
        let critique = client.critique(&image_url);
        let _ = proxy.send_event(UserEvent::CritiqueReady { index, critique });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn response(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn body_carries_prompt_image_and_schema() {
        let body = request_body(PNG_MAGIC);
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], PROMPT);
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], STANDARD.encode(PNG_MAGIC));

        let config = &body["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(
            config["responseSchema"]["required"],
            json!(["critique", "mood", "historicalContext"])
        );
    }

    #[test]
    fn unknown_images_are_sent_as_jpeg() {
        assert_eq!(mime_type(b"????"), "image/jpeg");
    }

    #[test]
    fn text_is_joined_from_first_candidate() {
        let r = response(
            r#"{"candidates":[{"content":{"parts":[{"text":" {\"critique\":"},{"text":"1} "}]}},
                {"content":{"parts":[{"text":"ignored"}]}}]}"#,
        );
        assert_eq!(response_text(&r).as_deref(), Some("{\"critique\":1}"));
    }

    #[test]
    fn missing_text_is_none() {
        assert_eq!(response_text(&response(r#"{"candidates":[]}"#)), None);
        assert_eq!(response_text(&response(r#"{}"#)), None);
        assert_eq!(response_text(&response(r#"{"candidates":[{}]}"#)), None);
        assert_eq!(
            response_text(&response(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#)),
            None
        );
    }

    #[test]
    fn parses_critique_json() {
        let text = r#"{"critique":"Bold","mood":"Calm","historicalContext":"Bauhaus"}"#;
        assert_eq!(
            parse_critique(text).unwrap(),
            CuratorResponse {
                critique: "Bold".to_string(),
                mood: "Calm".to_string(),
                historical_context: "Bauhaus".to_string(),
            }
        );
    }

    #[test]
    fn malformed_critique_is_an_error() {
        assert!(matches!(parse_critique("not json"), Err(CritiqueError::Parse(_))));
        assert!(matches!(
            parse_critique(r#"{"critique":"x","mood":"y"}"#),
            Err(CritiqueError::Parse(_))
        ));
    }

    #[test]
    fn missing_key_fails_soft() {
        let client = CritiqueClient::new(
            Client::new(),
            Some("   ".to_string()),
            DEFAULT_MODEL.to_string(),
            DEFAULT_ENDPOINT.to_string(),
        );
        assert!(!client.is_configured());
        assert_eq!(client.critique("https://example.invalid/a.png"), None);
    }

    #[test]
    fn unreadable_image_fails_soft() {
        let client = CritiqueClient::new(
            Client::new(),
            Some("key".to_string()),
            DEFAULT_MODEL.to_string(),
            format!("{}/", DEFAULT_ENDPOINT),
        );
        assert_eq!(
            client.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-flash-preview:generateContent"
        );
        assert_eq!(client.critique("/definitely/not/here.png"), None);
    }
}
