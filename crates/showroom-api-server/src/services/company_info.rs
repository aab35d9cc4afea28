use anyhow::{anyhow, Context, Result};
use scraper::{Html, Selector};
use tracing::{debug, info};

/// Download the configured company page and pull out its paragraph text.
/// The result seeds every new conversation with up-to-date company facts
/// (value proposition, branches, opening hours).
///
/// Startup-only: a failure here is fatal, the assistant refuses to serve
/// without its briefing.
pub async fn fetch(url: &str) -> Result<String> {
    info!(url, "fetching company briefing");

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .build()
        .context("failed to create HTTP client")?;

    let response = client
        .get(url)
        .send()
        .await
        .context("failed to download company page")?;

    if !response.status().is_success() {
        return Err(anyhow!("company page returned status {}", response.status()));
    }

    let body = response
        .text()
        .await
        .context("failed to read company page body")?;

    let content = extract_paragraphs(&body)
        .ok_or_else(|| anyhow!("no usable paragraph text found on company page"))?;

    debug!(chars = content.len(), "company briefing extracted");
    Ok(content)
}

/// Paragraph extraction with a selector cascade: article body first, two
/// common blog-layout containers next, any paragraph as a last resort.
fn extract_paragraphs(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    for selector in ["article p", "div.post-content p", "div.blog-post-content p", "p"] {
        let selector = Selector::parse(selector).ok()?;
        let content: Vec<String> = document
            .select(&selector)
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
            .collect();

        if !content.is_empty() {
            return Some(content.join("\n"));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_article_paragraphs() {
        let html = "<html><body>\
            <p>footer noise</p>\
            <article><p>Somos la primera plataforma.</p><p>Garantía de 12 meses.</p></article>\
            </body></html>";
        let content = extract_paragraphs(html).unwrap();
        assert_eq!(content, "Somos la primera plataforma.\nGarantía de 12 meses.");
    }

    #[test]
    fn test_falls_back_to_any_paragraph() {
        let html = "<html><body><div><p>Sucursales en tres ciudades.</p></div></body></html>";
        let content = extract_paragraphs(html).unwrap();
        assert_eq!(content, "Sucursales en tres ciudades.");
    }

    #[test]
    fn test_empty_page_yields_none() {
        assert!(extract_paragraphs("<html><body><div>sin parrafos</div></body></html>").is_none());
    }
}
