use std::time::Instant;

use axum::extract::{Form, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::info;

use crate::state::AppState;
use crate::utils::error::ApiError;
use crate::utils::metrics;

/// Inbound message webhook as posted by the WhatsApp gateway. The sender
/// address doubles as the session key, so each phone number keeps its own
/// conversation.
#[derive(Debug, Deserialize)]
pub struct WhatsAppWebhook {
    #[serde(rename = "Body")]
    pub body: String,
    #[serde(rename = "From")]
    pub from: String,
}

pub async fn whatsapp_handler(
    State(state): State<AppState>,
    Form(webhook): Form<WhatsAppWebhook>,
) -> Result<Response, ApiError> {
    let started = Instant::now();

    let message = webhook.body.trim();
    let from = webhook.from.trim();
    if message.is_empty() || from.is_empty() {
        return Err(ApiError::BadRequest(
            "parameters 'Body' or 'From' missing".to_string(),
        ));
    }

    info!(session = %from, chars = message.len(), "whatsapp request");

    let answer = state.conversation.handle_turn(from, message).await?;

    let twiml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>\n  <Message>{}</Message>\n</Response>",
        escape_xml(&answer)
    );

    metrics::WHATSAPP_HANDLER_LATENCY.observe(started.elapsed().as_millis() as f64);
    Ok(([(header::CONTENT_TYPE, "application/xml")], twiml).into_response())
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
