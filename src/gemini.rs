//! Gemini generate-content client.
//!
//! One outbound POST per invocation, no retry, no batching, no streaming. The
//! transport's own defaults are the only timeout. Completions are posted back
//! to the UI thread over the app event channel.

use crate::event::AppEvent;
use crate::panel::{GenerationDispatch, RequestKind};
use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{debug, error};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Everything a panel can receive from one generation call.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationPayload {
    Text(String),
    /// `data:{mime};base64,{payload}` with the payload exactly as reported.
    Image { data_uri: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    /// Local precondition; never reaches the network.
    #[error("Missing API Key.")]
    MissingCredential,
    /// The remote call failed or was rejected; carries the remote description
    /// when one was available, otherwise the kind-scoped fallback message.
    #[error("{0}")]
    Upstream(String),
    /// The image call itself succeeded but no part carried inline image data.
    #[error("No image data returned.")]
    EmptyImageResult,
}

impl RequestKind {
    fn model(self) -> &'static str {
        match self {
            RequestKind::EvidenceImage => "gemini-2.5-flash-image",
            _ => "gemini-3-flash-preview",
        }
    }

    fn system_instruction(self) -> Option<&'static str> {
        match self {
            RequestKind::PsychAnalysis => Some("You are an elite FBI behavioral analyst."),
            _ => None,
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            RequestKind::PsychAnalysis => "Failed to analyze.",
            RequestKind::ScriptConstruction => "Failed to generate script.",
            RequestKind::EvidenceImage => "Failed to generate image.",
            RequestKind::SeoStrategy => "Failed to generate SEO.",
            RequestKind::MarketFunnel => "Failed to generate market funnel.",
        }
    }

    /// Shown as a successful result when the remote call returns no text.
    fn empty_text_placeholder(self) -> &'static str {
        match self {
            RequestKind::PsychAnalysis => "No analysis generated.",
            RequestKind::ScriptConstruction => "No script generated.",
            RequestKind::EvidenceImage => "",
            RequestKind::SeoStrategy => "No SEO data generated.",
            RequestKind::MarketFunnel => "No market data generated.",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Thin wrapper over the generate-content endpoint. Cloneable; the HTTP
/// client, runtime handle, and UI-channel sender are all cheap to share.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    runtime: Handle,
    tx: mpsc::Sender<AppEvent>,
}

impl GeminiClient {
    pub fn new(runtime: Handle, tx: mpsc::Sender<AppEvent>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
            runtime,
            tx,
        })
    }

    /// Run one generation call on the runtime and post the outcome back to the
    /// UI channel as a `GenerationFinished` event.
    pub fn spawn_generate(&self, kind: RequestKind, api_key: String, prompt: String) {
        let client = self.clone();
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let outcome = client.generate(kind, &api_key, &prompt).await;
            if let Err(err) = &outcome {
                debug!(?kind, "generation failed: {err}");
            }
            let _ = tx.send(AppEvent::GenerationFinished { kind, outcome });
        });
    }

    /// Issue exactly one generate-content request. An absent credential fails
    /// here, before any network I/O.
    pub async fn generate(
        &self,
        kind: RequestKind,
        api_key: &str,
        prompt: &str,
    ) -> Result<GenerationPayload, GenerationError> {
        if api_key.is_empty() {
            return Err(GenerationError::MissingCredential);
        }

        let body = request_body(kind, prompt);
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url,
            kind.model(),
            api_key
        );
        debug!(?kind, model = kind.model(), "sending generate request");

        // reqwest errors can echo the URL, which embeds the key; strip it.
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|err| upstream_from_transport(kind, err))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| upstream_from_transport(kind, err))?;

        if !status.is_success() {
            error!(?kind, %status, "generate request rejected");
            let message = serde_json::from_str::<ApiErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| kind.failure_message().to_string());
            return Err(GenerationError::Upstream(message));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text).map_err(|err| {
            error!(?kind, "malformed generate response: {err}");
            GenerationError::Upstream(kind.failure_message().to_string())
        })?;

        extract_payload(kind, parsed)
    }
}

impl GenerationDispatch for GeminiClient {
    fn dispatch(&self, kind: RequestKind, api_key: &str, prompt: String) {
        self.spawn_generate(kind, api_key.to_string(), prompt);
    }
}

fn upstream_from_transport(kind: RequestKind, err: reqwest::Error) -> GenerationError {
    let err = err.without_url();
    error!(?kind, "generate request transport failure: {err}");
    GenerationError::Upstream(err.to_string())
}

fn request_body(kind: RequestKind, prompt: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![RequestPart {
                text: prompt.to_string(),
            }],
        }],
        system_instruction: kind.system_instruction().map(|instruction| Content {
            parts: vec![RequestPart {
                text: instruction.to_string(),
            }],
        }),
    }
}

fn extract_payload(
    kind: RequestKind,
    response: GenerateContentResponse,
) -> Result<GenerationPayload, GenerationError> {
    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts)
        .unwrap_or_default();

    if kind == RequestKind::EvidenceImage {
        for part in parts {
            if let Some(inline) = part.inline_data {
                return Ok(GenerationPayload::Image {
                    data_uri: format!("data:{};base64,{}", inline.mime_type, inline.data),
                });
            }
        }
        return Err(GenerationError::EmptyImageResult);
    }

    let text: String = parts.into_iter().filter_map(|part| part.text).collect();
    if text.is_empty() {
        return Ok(GenerationPayload::Text(
            kind.empty_text_placeholder().to_string(),
        ));
    }
    Ok(GenerationPayload::Text(text))
}

/// Split a `data:{mime};base64,{payload}` URI into its MIME type and payload.
pub fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("data:")?;
    rest.split_once(";base64,")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_response(texts: &[&str]) -> GenerateContentResponse {
        GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(CandidateContent {
                    parts: texts
                        .iter()
                        .map(|text| ResponsePart {
                            text: Some(text.to_string()),
                            inline_data: None,
                        })
                        .collect(),
                }),
            }],
        }
    }

    #[test]
    fn text_parts_are_concatenated() {
        let payload =
            extract_payload(RequestKind::PsychAnalysis, text_response(&["HOOK", "..."])).unwrap();
        assert_eq!(payload, GenerationPayload::Text("HOOK...".to_string()));
    }

    #[test]
    fn empty_text_success_yields_kind_placeholder() {
        let payload = extract_payload(RequestKind::PsychAnalysis, text_response(&[])).unwrap();
        assert_eq!(
            payload,
            GenerationPayload::Text("No analysis generated.".to_string())
        );

        let payload =
            extract_payload(RequestKind::SeoStrategy, GenerateContentResponse { candidates: vec![] })
                .unwrap();
        assert_eq!(
            payload,
            GenerationPayload::Text("No SEO data generated.".to_string())
        );
    }

    #[test]
    fn first_inline_part_becomes_a_data_uri() {
        let response = GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(CandidateContent {
                    parts: vec![
                        ResponsePart {
                            text: Some("caption".to_string()),
                            inline_data: None,
                        },
                        ResponsePart {
                            text: None,
                            inline_data: Some(InlineData {
                                mime_type: "image/png".to_string(),
                                data: "aGVsbG8=".to_string(),
                            }),
                        },
                    ],
                }),
            }],
        };

        let payload = extract_payload(RequestKind::EvidenceImage, response).unwrap();
        assert_eq!(
            payload,
            GenerationPayload::Image {
                data_uri: "data:image/png;base64,aGVsbG8=".to_string()
            }
        );
    }

    #[test]
    fn image_success_without_inline_data_is_a_distinct_outcome() {
        let err = extract_payload(RequestKind::EvidenceImage, text_response(&["just words"]))
            .unwrap_err();
        assert_eq!(err, GenerationError::EmptyImageResult);
        assert_ne!(
            err,
            GenerationError::Upstream("Failed to generate image.".to_string())
        );
    }

    #[test]
    fn response_wire_format_uses_camel_case() {
        let raw = r#"{
            "candidates": [{
                "content": {
                    "parts": [{
                        "inlineData": { "mimeType": "image/jpeg", "data": "QUJD" }
                    }]
                },
                "finishReason": "STOP"
            }]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let payload = extract_payload(RequestKind::EvidenceImage, parsed).unwrap();
        assert_eq!(
            payload,
            GenerationPayload::Image {
                data_uri: "data:image/jpeg;base64,QUJD".to_string()
            }
        );
    }

    #[test]
    fn request_body_carries_system_instruction_only_for_profiling() {
        let body = serde_json::to_value(request_body(RequestKind::PsychAnalysis, "p")).unwrap();
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "You are an elite FBI behavioral analyst."
        );

        let body = serde_json::to_value(request_body(RequestKind::SeoStrategy, "p")).unwrap();
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn api_error_message_is_preferred_over_the_fallback() {
        let envelope: ApiErrorEnvelope =
            serde_json::from_str(r#"{"error":{"code":429,"message":"quota exhausted","status":"RESOURCE_EXHAUSTED"}}"#)
                .unwrap();
        assert_eq!(envelope.error.message, "quota exhausted");
    }

    #[test]
    fn data_uri_splits_back_into_mime_and_payload() {
        let (mime, payload) = split_data_uri("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(payload, "aGVsbG8=");
        assert!(split_data_uri("image/png;aGVsbG8=").is_none());
    }

    #[tokio::test]
    async fn generate_without_a_key_fails_before_any_network_call() {
        let (tx, _rx) = mpsc::channel();
        let client = GeminiClient::new(Handle::current(), tx).unwrap();
        let err = client
            .generate(RequestKind::PsychAnalysis, "", "prompt")
            .await
            .unwrap_err();
        assert_eq!(err, GenerationError::MissingCredential);
    }
}
