//! Language normalization for transcript bodies.
//!
//! Detection is local (whatlang). Text detected in another language is sent
//! through a [`Translator`]; anything that goes wrong leaves the text as is.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};
use whatlang::Lang;

use crate::pipeline::traits::{TextNormalizer, Translator};

/// Characters of input looked at when detecting.
const DETECT_SAMPLE_CHARS: usize = 2_000;

const TRANSLATE_URL: &str = "https://translate.googleapis.com";

/// Upper bound on characters per translation request.
const MAX_CHUNK_CHARS: usize = 4_500;

/// Language of `text`, when whatlang is confident about it.
pub fn detect(text: &str) -> Option<Lang> {
    let sample = match text.char_indices().nth(DETECT_SAMPLE_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    };
    whatlang::detect(sample)
        .filter(|info| info.is_reliable())
        .map(|info| info.lang())
}

pub struct LanguageNormalizer {
    target: Lang,
    /// ISO 639-1 code handed to the translator.
    target_code: String,
    translator: Arc<dyn Translator>,
}

impl LanguageNormalizer {
    pub fn new(target: Lang, target_code: impl Into<String>, translator: Arc<dyn Translator>) -> Self {
        Self {
            target,
            target_code: target_code.into(),
            translator,
        }
    }

    pub fn english(translator: Arc<dyn Translator>) -> Self {
        Self::new(Lang::Eng, "en", translator)
    }
}

#[async_trait]
impl TextNormalizer for LanguageNormalizer {
    async fn normalize(&self, text: &str) -> String {
        let detected = match detect(text) {
            Some(lang) if lang != self.target => lang,
            _ => return text.to_string(),
        };

        debug!(detected = detected.code(), target = self.target_code.as_str(), "Translating body");
        match self.translator.translate(text, &self.target_code).await {
            Ok(translated) if !translated.trim().is_empty() => translated,
            Ok(_) => text.to_string(),
            Err(e) => {
                warn!(detected = detected.code(), error = %e, "Translation failed, keeping original text");
                text.to_string()
            }
        }
    }
}

/// Google's public `translate_a/single` endpoint.
pub struct GoogleTranslator {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleTranslator {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: TRANSLATE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn translate_chunk(&self, chunk: &str, target: &str) -> Result<String> {
        let resp = self
            .client
            .get(format!("{}/translate_a/single", self.base_url))
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target),
                ("dt", "t"),
                ("q", chunk),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("translate returned status {status}"));
        }
        let body: Value = resp.json().await?;
        translated_text(&body).ok_or_else(|| anyhow!("unexpected translate response shape"))
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target: &str) -> Result<String> {
        let mut parts = Vec::new();
        for chunk in chunks(text, MAX_CHUNK_CHARS) {
            parts.push(self.translate_chunk(&chunk, target).await?);
        }
        Ok(parts.join(" "))
    }
}

/// Concatenate the translated segments of a `[[["out","in",..],..],..]` response.
fn translated_text(body: &Value) -> Option<String> {
    let segments = body.get(0)?.as_array()?;
    let text: String = segments
        .iter()
        .filter_map(|seg| seg.get(0)?.as_str())
        .collect();
    Some(text)
}

/// Split on whitespace into pieces of at most `max_chars` characters.
/// A single word longer than the limit becomes its own piece.
fn chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;
    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        if current_chars > 0 && current_chars + 1 + word_chars > max_chars {
            out.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        if current_chars > 0 {
            current.push(' ');
            current_chars += 1;
        }
        current.push_str(word);
        current_chars += word_chars;
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const FRENCH: &str = "Le gouvernement a présenté hier un nouveau budget qui prévoit une forte \
        hausse des dépenses publiques pour les écoles et les hôpitaux du pays.";
    const ENGLISH: &str = "The government presented a new budget yesterday that plans a sharp \
        increase in public spending on the schools and hospitals of the country.";

    #[derive(Default)]
    struct RecordingTranslator {
        calls: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl Translator for RecordingTranslator {
        async fn translate(&self, text: &str, target: &str) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((text.to_string(), target.to_string()));
            if self.fail {
                return Err(anyhow!("service down"));
            }
            Ok("translated text".to_string())
        }
    }

    #[test]
    fn detects_confident_languages_only() {
        assert_eq!(detect(FRENCH), Some(Lang::Fra));
        assert_eq!(detect(ENGLISH), Some(Lang::Eng));
        assert_eq!(detect(""), None);
    }

    #[tokio::test]
    async fn text_in_target_language_is_untouched() {
        let translator = Arc::new(RecordingTranslator::default());
        let normalizer = LanguageNormalizer::english(translator.clone());

        assert_eq!(normalizer.normalize(ENGLISH).await, ENGLISH);
        assert!(translator.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn foreign_text_is_translated_to_target() {
        let translator = Arc::new(RecordingTranslator::default());
        let normalizer = LanguageNormalizer::english(translator.clone());

        assert_eq!(normalizer.normalize(FRENCH).await, "translated text");
        let calls = translator.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "en");
    }

    #[tokio::test]
    async fn translation_failure_keeps_original() {
        let translator = Arc::new(RecordingTranslator {
            fail: true,
            ..Default::default()
        });
        let normalizer = LanguageNormalizer::english(translator);

        assert_eq!(normalizer.normalize(FRENCH).await, FRENCH);
    }

    #[test]
    fn chunks_respect_the_limit_on_word_boundaries() {
        assert_eq!(chunks("aa bb cc dd", 5), vec!["aa bb", "cc dd"]);
        assert_eq!(chunks("averylongword x", 4), vec!["averylongword", "x"]);
        assert!(chunks("   ", 10).is_empty());
    }

    #[test]
    fn response_segments_are_concatenated() {
        let body = serde_json::json!([
            [["Hello world. ", "Bonjour le monde. ", null, null, 10], ["Bye.", "Au revoir.", null, null, 10]],
            null,
            "fr"
        ]);
        assert_eq!(translated_text(&body).as_deref(), Some("Hello world. Bye."));
        assert_eq!(translated_text(&serde_json::json!({"error": 1})), None);
    }
}
