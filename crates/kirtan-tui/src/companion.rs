//! Background worker that owns the Gemini chat session.
//!
//! The TUI never holds the HTTP client: prompts go in on an mpsc channel,
//! replies come back on another.  The session (and with it the credential
//! check) is created lazily on the first prompt, so launching the app
//! without `GEMINI_API_KEY` only surfaces when the user actually asks
//! something.

use kirtan_core::assistant::{AssistantError, ChatSession, GeminiClient, SYSTEM_INSTRUCTION};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// A reply surfaced to the chat panel.  `is_error` styles the bubble; the
/// text itself is always ready to display verbatim.
#[derive(Debug, Clone)]
pub struct CompanionReply {
    pub text: String,
    pub is_error: bool,
}

/// Spawn the companion worker.  Returns the prompt sender; replies arrive
/// on `reply_tx` in prompt order.
pub fn spawn(model: String, reply_tx: mpsc::Sender<CompanionReply>) -> mpsc::Sender<String> {
    let (prompt_tx, mut prompt_rx) = mpsc::channel::<String>(8);

    tokio::spawn(async move {
        let mut session: Option<ChatSession> = None;

        while let Some(prompt) = prompt_rx.recv().await {
            let reply = respond(&mut session, &model, prompt).await;
            if reply_tx.send(reply).await.is_err() {
                break;
            }
        }
        info!("companion: prompt channel closed, worker exiting");
    });

    prompt_tx
}

async fn respond(
    session: &mut Option<ChatSession>,
    model: &str,
    prompt: String,
) -> CompanionReply {
    let active = match session {
        Some(s) => s,
        None => match GeminiClient::from_env(model) {
            Ok(client) => {
                info!("companion: starting chat session (model {})", model);
                session.insert(client.start_session(SYSTEM_INSTRUCTION))
            }
            Err(e) => {
                warn!("companion: {}", e);
                return CompanionReply {
                    text: e.user_facing().to_string(),
                    is_error: true,
                };
            }
        },
    };

    match active.send(&prompt).await {
        Ok(text) => CompanionReply {
            text,
            is_error: false,
        },
        Err(e) => {
            warn!("companion: request failed: {}", e);
            // An empty model reply gets the gentle canned line rather than
            // error styling; transport and auth failures are shown as errors.
            let is_error = !matches!(e, AssistantError::EmptyReply);
            CompanionReply {
                text: e.user_facing().to_string(),
                is_error,
            }
        }
    }
}
