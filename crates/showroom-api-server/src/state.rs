use std::sync::Arc;

use crate::config::Settings;
use crate::services::conversation::ConversationManager;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub conversation: Arc<ConversationManager>,
    pub settings: Settings,
}
