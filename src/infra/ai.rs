//! Client for the hosted multimodal model that infers a receipt layout from a
//! sample image. Malformed or failed replies surface as [`ExtractError`]; the
//! layout service substitutes the default layout in both cases.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::application::layouts::{ExtractError, LayoutExtractor};
use crate::config::AiSettings;
use crate::domain::layout::LayoutSchema;

const LAYOUT_EXTRACTION_PROMPT: &str = r#"You are an expert document layout analysis engine. Analyze the receipt image provided and extract its structural layout.

Your task is to examine the receipt and identify:
1. Page dimensions and margins
2. Header section (logo position, business name, address, contact info)
3. Table structure (columns, alignment, spacing)
4. Totals section (subtotal, tax, total positioning)
5. Footer (thank you message, additional info)
6. Typography (approximate font sizes, weights)
7. Colors (if any distinctive colors are used)
8. Spacing and alignment patterns

Output ONLY a valid JSON object with this exact structure (no markdown, no explanations):

{
  "page": {
    "width": <number in pixels, typically 384 for receipt>,
    "padding": <number in pixels>
  },
  "header": {
    "alignment": "center|left|right",
    "fontSize": <number>,
    "fontWeight": "normal|bold",
    "fields": ["businessName", "businessAddress", "businessPhone", ...],
    "logoPosition": "top|left|right" (optional)
  },
  "table": {
    "columns": [
      {"label": "Item", "width": <percentage>, "alignment": "left|center|right"},
      {"label": "Qty", "width": <percentage>, "alignment": "left|center|right"},
      {"label": "Price", "width": <percentage>, "alignment": "right"},
      {"label": "Total", "width": <percentage>, "alignment": "right"}
    ],
    "rowHeight": <number in pixels>,
    "showBorders": <boolean>,
    "headerBold": <boolean>
  },
  "totals": {
    "position": "right|left",
    "fontSize": <number>,
    "fields": ["subtotal", "tax", "total"]
  },
  "footer": {
    "text": "<default footer text if visible>",
    "fontSize": <number>,
    "alignment": "center|left|right"
  },
  "colors": {
    "primary": "<hex color if distinctive>",
    "secondary": "<hex color>",
    "text": "<hex color>"
  },
  "fonts": {
    "primary": "<suggested font name>",
    "secondary": "<suggested font name>"
  }
}

Be precise with measurements. Analyze the visual hierarchy carefully. Output ONLY the JSON, nothing else."#;

#[derive(Debug, Clone)]
pub struct GeminiLayoutExtractor {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiLayoutExtractor {
    /// Build the extractor when an API key is configured; `None` disables
    /// extraction and the layout service serves the default layout.
    pub fn from_settings(settings: &AiSettings) -> Option<Self> {
        let api_key = settings.api_key.clone()?;
        Some(Self {
            client: reqwest::Client::new(),
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            api_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl LayoutExtractor for GeminiLayoutExtractor {
    async fn extract(&self, image: &[u8], mime: &str) -> Result<LayoutSchema, ExtractError> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );

        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {
                        "inline_data": {
                            "mime_type": mime,
                            "data": BASE64.encode(image)
                        }
                    },
                    {"text": LAYOUT_EXTRACTION_PROMPT}
                ]
            }]
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|err| ExtractError::Upstream(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ExtractError::Upstream(format!(
                "status {status}: {}",
                detail.chars().take(200).collect::<String>()
            )));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| ExtractError::Malformed(err.to_string()))?;

        let text = payload
            .candidates
            .first()
            .and_then(|candidate| candidate.content.parts.first())
            .map(|part| part.text.as_str())
            .ok_or_else(|| ExtractError::Malformed("empty model reply".to_string()))?;

        parse_layout_reply(text)
    }
}

/// Parse the model's reply, tolerating markdown code fences around the JSON.
fn parse_layout_reply(text: &str) -> Result<LayoutSchema, ExtractError> {
    let trimmed = text.trim();
    let stripped = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_start())
        .unwrap_or(trimmed);
    let stripped = stripped.strip_suffix("```").unwrap_or(stripped).trim();

    debug!(
        target = "recibo::ai",
        bytes = stripped.len(),
        "parsing layout reply"
    );

    serde_json::from_str(stripped).map_err(|err| ExtractError::Malformed(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_REPLY: &str = r#"{
        "page": {"width": 384, "padding": 20},
        "header": {
            "alignment": "center",
            "fontSize": 20,
            "fontWeight": "bold",
            "fields": ["businessName"]
        },
        "table": {
            "columns": [{"label": "Item", "width": 100}],
            "rowHeight": 20
        },
        "totals": {"position": "right", "fontSize": 14, "fields": ["total"]},
        "footer": {"text": "Thanks"}
    }"#;

    #[test]
    fn parses_bare_json_reply() {
        let layout = parse_layout_reply(VALID_REPLY).expect("parse");
        assert_eq!(layout.page.width, 384.0);
    }

    #[test]
    fn strips_markdown_fences() {
        let fenced = format!("```json\n{VALID_REPLY}\n```");
        let layout = parse_layout_reply(&fenced).expect("parse");
        assert_eq!(layout.header.font_size, 20.0);
    }

    #[test]
    fn rejects_reply_missing_required_sections() {
        let error = parse_layout_reply(r#"{"page": {"width": 384, "padding": 20}}"#)
            .expect_err("must fail");
        assert!(matches!(error, ExtractError::Malformed(_)));
    }
}
