use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::catalog::{CatalogIndex, SearchHit};
use crate::models::chat::ChatMessage;
use crate::utils::error::{ApiError, ProviderError};
use crate::utils::metrics;

use super::prompt::build_system_prompt;
use super::store::SessionStore;

/// Seam to the chat model. Production uses the hosted chat-completions
/// API; tests substitute a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, ProviderError>;
}

/// Drives one conversation turn: seed new sessions, query the catalog,
/// grow the transcript, ask the model, remember the answer.
///
/// Both transport handlers (`/qa` and `/whatsapp`) funnel into
/// `handle_turn`; they differ only in how they derive the session key and
/// shape the response body.
pub struct ConversationManager {
    store: SessionStore,
    catalog: Arc<CatalogIndex>,
    llm: Arc<dyn LlmProvider>,
    system_prompt: String,
    company_info: String,
    top_k: usize,
}

impl ConversationManager {
    pub fn new(
        store: SessionStore,
        catalog: Arc<CatalogIndex>,
        llm: Arc<dyn LlmProvider>,
        company_name: &str,
        company_info: String,
        top_k: usize,
    ) -> Self {
        info!(company = company_name, top_k, "initializing conversation manager");
        Self {
            store,
            catalog,
            llm,
            system_prompt: build_system_prompt(company_name),
            company_info,
            top_k,
        }
    }

    /// Run one full turn for the session and return the assistant answer.
    ///
    /// A catalog-search failure returns before this turn appends anything;
    /// an LLM failure leaves the already-appended recommendation block and
    /// user message in place. Neither is retried here.
    pub async fn handle_turn(
        &self,
        session_key: &str,
        user_text: &str,
    ) -> Result<String, ApiError> {
        if self.store.history(session_key).is_empty() {
            debug!(session = session_key, "seeding new session");
            self.store
                .append(session_key, ChatMessage::system(self.system_prompt.clone()));
            self.store.append(
                session_key,
                ChatMessage::assistant(format!(
                    "Información de la empresa (propuesta de valor y sucursales):\n{}",
                    self.company_info
                )),
            );
        }

        let search_started = Instant::now();
        let hits = self.catalog.search(user_text, self.top_k).await?;
        metrics::CATALOG_SEARCH_LATENCY.observe(search_started.elapsed().as_millis() as f64);

        let recommendations = self.recommendation_block(session_key, &hits);
        if let Some(top) = hits.first() {
            self.store
                .set_last_vehicle(session_key, top.vehicle.clone());
        }
        self.store
            .append(session_key, ChatMessage::assistant(recommendations));
        self.store.append(session_key, ChatMessage::user(user_text));

        let transcript = self.store.history(session_key);
        let llm_started = Instant::now();
        let answer = self.llm.chat(&transcript).await?;
        metrics::LLM_CHAT_LATENCY.observe(llm_started.elapsed().as_millis() as f64);

        self.store
            .append(session_key, ChatMessage::assistant(answer.clone()));
        Ok(answer)
    }

    /// Evict all state for the session.
    pub fn end_session(&self, session_key: &str) {
        self.store.remove(session_key);
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// The context block the model reads each turn: the vehicle still
    /// under discussion (if any) plus the fresh top-K recommendations.
    fn recommendation_block(&self, session_key: &str, hits: &[SearchHit]) -> String {
        let mut block = String::new();

        if let Some(last) = self.store.last_vehicle(session_key) {
            block.push_str("Último auto recomendado:\n");
            block.push_str(&last.describe());
            block.push_str("\n\n");
        }

        if hits.is_empty() {
            block.push_str(
                "Nuevas recomendaciones: por ahora no hay autos que coincidan con la consulta.",
            );
        } else {
            block.push_str("Nuevas recomendaciones basadas en tu mensaje:\n");
            for (i, hit) in hits.iter().enumerate() {
                block.push_str(&format!("{}) {}\n", i + 1, hit.vehicle.describe()));
            }
        }

        block.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Role;
    use crate::services::embedding_service::MockEmbeddingProvider;

    const FEED: &str = "\
stock_id,km,price,make,model,year,version,bluetooth,length,width,height,car_play
B1,10000,200000,Breeze,Hatch,2019,Base,No,4.0,1.8,1.5,No
A1,20000,300000,Aurora,Sedan,2020,Full,Sí,4.5,1.8,1.4,Sí
";

    /// Queries and the Aurora row share an axis; the Breeze row is
    /// orthogonal, so Aurora always ranks first.
    fn stub_embedder(fail_marker: &'static str) -> Arc<MockEmbeddingProvider> {
        let mut provider = MockEmbeddingProvider::new();
        provider.expect_embed().returning(move |text| {
            if text.contains(fail_marker) {
                Err(ProviderError::Request("connection refused".to_string()))
            } else if text.contains("Breeze") {
                Ok(vec![0.0, 1.0])
            } else {
                Ok(vec![1.0, 0.0])
            }
        });
        Arc::new(provider)
    }

    fn answering_llm(answer: &'static str) -> Arc<MockLlmProvider> {
        let mut llm = MockLlmProvider::new();
        llm.expect_chat()
            .returning(move |_| Ok(answer.to_string()));
        Arc::new(llm)
    }

    async fn manager_with(
        feed: &str,
        embedder: Arc<MockEmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> ConversationManager {
        let catalog = Arc::new(
            CatalogIndex::from_reader(feed.as_bytes(), embedder)
                .await
                .unwrap(),
        );
        ConversationManager::new(
            SessionStore::new(),
            catalog,
            llm,
            "Kavak",
            "Propuesta de valor y sucursales.".to_string(),
            3,
        )
    }

    #[tokio::test]
    async fn test_first_turn_shapes_the_transcript() {
        let manager = manager_with(
            FEED,
            stub_embedder("<never>"),
            answering_llm("¡Con gusto!"),
        )
        .await;

        let answer = manager
            .handle_turn("wa:+5215550001", "¿Qué sedán tienen?")
            .await
            .unwrap();
        assert_eq!(answer, "¡Con gusto!");

        let history = manager.store().history("wa:+5215550001");
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].role, Role::System);
        assert!(history[0].content.contains("Kavak"));
        assert_eq!(history[1].role, Role::Assistant);
        assert!(history[1].content.contains("Propuesta de valor"));
        assert!(history[2].content.contains("Nuevas recomendaciones"));
        assert!(history[2].content.contains("1) Aurora Sedan Full (2020)"));
        assert_eq!(history[3].role, Role::User);
        assert_eq!(history[4].content, "¡Con gusto!");

        // top hit becomes the vehicle under discussion
        let last = manager.store().last_vehicle("wa:+5215550001").unwrap();
        assert_eq!(last.stock_id, "A1");
    }

    #[tokio::test]
    async fn test_second_turn_surfaces_last_recommended() {
        let manager = manager_with(
            FEED,
            stub_embedder("<never>"),
            answering_llm("Claro que sí."),
        )
        .await;

        manager.handle_turn("s1", "¿Qué sedán tienen?").await.unwrap();
        manager.handle_turn("s1", "¿A cuánto cuesta?").await.unwrap();

        let history = manager.store().history("s1");
        assert_eq!(history.len(), 8);
        // second turn's recommendation block carries the prior reference
        assert!(history[5].content.contains("Último auto recomendado:"));
        assert!(history[5].content.contains("Aurora Sedan Full (2020)"));
    }

    #[tokio::test]
    async fn test_failed_search_appends_nothing() {
        let manager = manager_with(
            FEED,
            stub_embedder("pregunta-rota"),
            answering_llm("nunca llega"),
        )
        .await;

        let err = manager
            .handle_turn("s1", "pregunta-rota")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Provider(_)));

        // only the session seeds survive a failed search
        let history = manager.store().history("s1");
        assert_eq!(history.len(), 2);
        assert!(manager.store().last_vehicle("s1").is_none());
    }

    #[tokio::test]
    async fn test_failed_llm_keeps_turn_context() {
        let mut llm = MockLlmProvider::new();
        llm.expect_chat()
            .returning(|_| Err(ProviderError::Timeout(15)));
        let manager = manager_with(FEED, stub_embedder("<never>"), Arc::new(llm)).await;

        let err = manager.handle_turn("s1", "¿Qué autos hay?").await.unwrap_err();
        assert!(matches!(err, ApiError::Provider(_)));

        // recommendation block and user message stay; no answer was added
        let history = manager.store().history("s1");
        assert_eq!(history.len(), 4);
        assert_eq!(history[3].role, Role::User);
    }

    #[tokio::test]
    async fn test_empty_catalog_still_converses() {
        let header = "stock_id,km,price,make,model,year,version,bluetooth,length,width,height,car_play\n";
        let manager = manager_with(
            header,
            stub_embedder("<never>"),
            answering_llm("Por ahora no tenemos opciones."),
        )
        .await;

        manager.handle_turn("s1", "¿Qué autos hay?").await.unwrap();

        let history = manager.store().history("s1");
        assert!(history[2].content.contains("no hay autos"));
        assert!(manager.store().last_vehicle("s1").is_none());
    }

    #[tokio::test]
    async fn test_end_session_forgets_everything() {
        let manager = manager_with(FEED, stub_embedder("<never>"), answering_llm("ok")).await;

        manager.handle_turn("s1", "¿Qué sedán tienen?").await.unwrap();
        manager.end_session("s1");

        assert!(manager.store().last_vehicle("s1").is_none());
        assert!(manager.store().history("s1").is_empty());
    }
}
