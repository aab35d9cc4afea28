use once_cell::sync::Lazy;
use prometheus::{exponential_buckets, Histogram, HistogramOpts};

fn register_histogram(name: &str, help: &str, start: f64) -> Histogram {
    let opts = HistogramOpts::new(name, help)
        .buckets(exponential_buckets(start, 2.0, 8).expect("static bucket layout"));
    let histogram = Histogram::with_opts(opts).expect("static histogram opts");
    prometheus::register(Box::new(histogram.clone())).expect("duplicate metric registration");
    histogram
}

/// Time (ms) for a catalog similarity search, including the query embedding.
pub static CATALOG_SEARCH_LATENCY: Lazy<Histogram> = Lazy::new(|| {
    register_histogram(
        "catalog_search_latency_ms",
        "Time (ms) for CatalogIndex::search",
        10.0,
    )
});

/// Time (ms) for one chat-completion round trip.
pub static LLM_CHAT_LATENCY: Lazy<Histogram> = Lazy::new(|| {
    register_histogram(
        "llm_chat_latency_ms",
        "Time (ms) for a chat completion call",
        100.0,
    )
});

/// Time (ms) for the /qa handler end to end.
pub static QA_HANDLER_LATENCY: Lazy<Histogram> = Lazy::new(|| {
    register_histogram("qa_latency_ms", "Time (ms) for the /qa handler", 100.0)
});

/// Time (ms) for the /whatsapp handler end to end.
pub static WHATSAPP_HANDLER_LATENCY: Lazy<Histogram> = Lazy::new(|| {
    register_histogram(
        "whatsapp_request_latency_ms",
        "Time (ms) for the /whatsapp handler",
        100.0,
    )
});

/// Force registration of every collector before the first request lands.
pub fn init() {
    Lazy::force(&CATALOG_SEARCH_LATENCY);
    Lazy::force(&LLM_CHAT_LATENCY);
    Lazy::force(&QA_HANDLER_LATENCY);
    Lazy::force(&WHATSAPP_HANDLER_LATENCY);
}
