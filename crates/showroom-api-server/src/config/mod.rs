pub mod settings;

pub use settings::{
    CatalogConfig, CompanyConfig, EmbeddingConfig, LlmConfig, OpenAiConfig, ServerConfig,
    Settings,
};
