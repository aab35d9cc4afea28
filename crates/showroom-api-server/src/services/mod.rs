pub mod company_info;
pub mod conversation;
pub mod embedding_service;
pub mod llm_service;

pub use embedding_service::{EmbeddingProvider, OpenAiEmbeddingService};
pub use llm_service::OpenAiChatService;
