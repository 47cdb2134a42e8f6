//! Gemini `generateContent` client

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::schema::{FormalSchema, FormalizedSpec};
use crate::{prompt, FormalizerError, FormalizerSettings, SpecFormalizer};

/// Formalizer backed by the Gemini REST API
pub struct GeminiFormalizer {
    client: Client,
    settings: FormalizerSettings,
}

impl GeminiFormalizer {
    pub fn new(settings: FormalizerSettings) -> Self {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, settings }
    }

    pub fn settings(&self) -> &FormalizerSettings {
        &self.settings
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }
}

/// Request body for one formalization
pub fn request_body(schema: FormalSchema, description: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt::render(schema, description) }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": schema.response_schema()
        }
    })
}

/// Pull the JSON document out of a `generateContent` response
pub fn extract_document(
    schema: FormalSchema,
    response: &Value,
) -> Result<FormalizedSpec, FormalizerError> {
    let text = response["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .ok_or(FormalizerError::EmptyResponse)?;
    schema.parse_document(text)
}

#[async_trait]
impl SpecFormalizer for GeminiFormalizer {
    #[instrument(
        skip(self, description),
        fields(model = %self.settings.model, schema = %self.settings.schema)
    )]
    async fn formalize(&self, description: &str) -> Result<FormalizedSpec, FormalizerError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(FormalizerError::MissingApiKey)?;

        let body = request_body(self.settings.schema, description);
        let res = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let detail = res.text().await.unwrap_or_default();
            return Err(FormalizerError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let json: Value = res.json().await?;
        let spec = extract_document(self.settings.schema, &json)?;
        debug!(title = spec.title(), "Formalized description");
        Ok(spec)
    }
}
