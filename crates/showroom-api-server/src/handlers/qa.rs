use std::time::Instant;

use axum::extract::{Query, State};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use tracing::info;

use crate::state::AppState;
use crate::utils::error::ApiError;
use crate::utils::metrics;

const SESSION_COOKIE: &str = "session_id";

#[derive(Debug, Deserialize)]
pub struct QaParams {
    q: String,
}

/// Browser-facing Q&A endpoint. The session rides on a `session_id`
/// cookie, minted on first contact; the reply is the plain-text assistant
/// answer.
pub async fn qa_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<QaParams>,
) -> Result<(CookieJar, String), ApiError> {
    let started = Instant::now();

    let question = params.q.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest("missing q parameter".to_string()));
    }

    let (jar, session_key) = match jar.get(SESSION_COOKIE) {
        Some(cookie) => {
            let key = cookie.value().to_string();
            (jar, key)
        }
        None => {
            let key = uuid::Uuid::new_v4().to_string();
            let jar = jar.add(Cookie::build((SESSION_COOKIE, key.clone())).path("/"));
            (jar, key)
        }
    };

    info!(session = %session_key, chars = question.len(), "qa request");

    let answer = state
        .conversation
        .handle_turn(&session_key, question)
        .await?;

    metrics::QA_HANDLER_LATENCY.observe(started.elapsed().as_millis() as f64);
    Ok((jar, answer))
}
