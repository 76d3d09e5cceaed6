//! Gemini chat client.
//!
//! A [`ChatSession`] is an explicit caller-owned object: create it from a
//! [`GeminiClient`], call `send` per user turn, drop (or `dispose`) it to
//! tear the conversation down.  There is no process-wide singleton; the API
//! itself is stateless, so the session keeps the turn history locally and
//! replays it on every request.
//!
//! One attempt per user message — no retry, no backoff, no rate limiting.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Model every session is created against.
pub const GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Environment variable carrying the API credential.  Its absence is a
/// recoverable condition, not a crash.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Persona and factual limits, supplied once at session creation.
pub const SYSTEM_INSTRUCTION: &str = "\
You are a knowledgeable, respectful, and spiritual companion for a user listening to Live Gurbani from the Golden Temple (Darbar Sahib).
Your purpose is to answer questions about Sikhism, the history of the Gurus, the Golden Temple, and the meanings of common Gurbani concepts.
Keep your tone serene, respectful, and educational.
If asked about the specific shabad playing right now, politely explain that you cannot hear the live audio stream directly, but you can explain the general importance of the time of day (Amrit Vela, Rehras Sahib, etc.) or general Sikh concepts.
Concise answers are preferred as the user is listening to audio.";

// Fixed user-facing strings.  Every failure path resolves to one of these;
// no assistant error ever propagates past the chat surface.
pub const APOLOGY_NO_CREDENTIAL: &str =
    "I am currently unable to connect to the knowledge base. Please check your API key configuration.";
pub const FALLBACK_EMPTY_REPLY: &str = "I'm sorry, I didn't catch that.";
pub const FALLBACK_TRANSPORT: &str =
    "I'm having trouble connecting right now. Please try again later.";

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("{API_KEY_ENV} is not set")]
    MissingCredential,
    #[error("assistant request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("assistant returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("assistant reply was empty")]
    EmptyReply,
}

impl AssistantError {
    /// The fixed chat-bubble text shown for this failure.
    pub fn user_facing(&self) -> &'static str {
        match self {
            AssistantError::MissingCredential => APOLOGY_NO_CREDENTIAL,
            AssistantError::EmptyReply => FALLBACK_EMPTY_REPLY,
            AssistantError::Transport(_) | AssistantError::Status(_) => FALLBACK_TRANSPORT,
        }
    }
}

// ── wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

impl Content {
    fn turn(role: &str, text: &str) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: [PartRef<'a>; 1],
}

#[derive(Debug, Serialize)]
struct PartRef<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    system_instruction: SystemInstruction<'a>,
    contents: &'a [Content],
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text = content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

// ── client / session ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Build a client from [`API_KEY_ENV`].
    pub fn from_env(model: impl Into<String>) -> Result<Self, AssistantError> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AssistantError::MissingCredential)?;
        Ok(Self::new(api_key, model))
    }

    /// Create a fresh multi-turn session shaped by `system_instruction`.
    pub fn start_session(&self, system_instruction: impl Into<String>) -> ChatSession {
        ChatSession {
            client: self.clone(),
            system_instruction: system_instruction.into(),
            history: Vec::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", API_BASE, self.model)
    }
}

/// Opaque, stateful handle to an ongoing exchange.  Reused for all turns;
/// never persisted across runs.
pub struct ChatSession {
    client: GeminiClient,
    system_instruction: String,
    history: Vec<Content>,
}

impl ChatSession {
    /// Forward one user message and return the model's reply text verbatim.
    ///
    /// On any failure the user turn is removed again, so the history never
    /// records a turn the service did not answer.
    pub async fn send(&mut self, message: &str) -> Result<String, AssistantError> {
        self.history.push(Content::turn("user", message));

        let result = self.request().await;
        match result {
            Ok(reply) => {
                self.history.push(Content::turn("model", &reply));
                debug!("assistant: {} turns in session", self.turns());
                Ok(reply)
            }
            Err(e) => {
                self.history.pop();
                warn!("assistant: send failed: {}", e);
                Err(e)
            }
        }
    }

    async fn request(&self) -> Result<String, AssistantError> {
        let body = GenerateRequest {
            system_instruction: SystemInstruction {
                parts: [PartRef {
                    text: &self.system_instruction,
                }],
            },
            contents: &self.history,
        };

        let response = self
            .client
            .client
            .post(self.client.endpoint())
            .query(&[("key", self.client.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AssistantError::Status(response.status()));
        }

        let parsed: GenerateResponse = response.json().await?;
        parsed.into_text().ok_or(AssistantError::EmptyReply)
    }

    /// Number of turns (user + model) recorded so far.
    pub fn turns(&self) -> usize {
        self.history.len()
    }

    /// Explicit teardown.  Dropping the session is equivalent; this exists
    /// so call sites can make the end of a conversation visible.
    pub fn dispose(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let history = vec![Content::turn("user", "What is Hukamnama?")];
        let body = GenerateRequest {
            system_instruction: SystemInstruction {
                parts: [PartRef { text: "persona" }],
            },
            contents: &history,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["system_instruction"]["parts"][0]["text"], "persona");
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(
            json["contents"][0]["parts"][0]["text"],
            "What is Hukamnama?"
        );
    }

    #[test]
    fn response_text_extraction() {
        let raw = r#"{
            "candidates": [
                { "content": { "role": "model", "parts": [
                    { "text": "The Hukamnama is " },
                    { "text": "the daily edict." }
                ] } }
            ]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.into_text().unwrap(),
            "The Hukamnama is the daily edict."
        );
    }

    #[test]
    fn empty_candidates_mean_empty_reply() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.into_text().is_none());

        let blank = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"  "}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(blank).unwrap();
        assert!(parsed.into_text().is_none());
    }

    #[test]
    fn from_env_without_credential_is_missing_credential() {
        // Single test for both triggers so the env var is never mutated
        // from two tests racing in parallel.
        std::env::remove_var(API_KEY_ENV);
        assert!(matches!(
            GeminiClient::from_env(GEMINI_MODEL),
            Err(AssistantError::MissingCredential)
        ));

        std::env::set_var(API_KEY_ENV, "   ");
        assert!(matches!(
            GeminiClient::from_env(GEMINI_MODEL),
            Err(AssistantError::MissingCredential)
        ));

        std::env::set_var(API_KEY_ENV, "test-key");
        assert!(GeminiClient::from_env(GEMINI_MODEL).is_ok());
        std::env::remove_var(API_KEY_ENV);
    }

    #[test]
    fn turns_counts_recorded_history() {
        let mut session = GeminiClient::new("k", "m").start_session("persona");
        assert_eq!(session.turns(), 0);
        session.history.push(Content::turn("user", "hello"));
        session.history.push(Content::turn("model", "sat sri akal"));
        assert_eq!(session.turns(), 2);
    }

    #[test]
    fn error_maps_to_fixed_strings() {
        assert_eq!(
            AssistantError::MissingCredential.user_facing(),
            APOLOGY_NO_CREDENTIAL
        );
        assert_eq!(AssistantError::EmptyReply.user_facing(), FALLBACK_EMPTY_REPLY);
    }
}
