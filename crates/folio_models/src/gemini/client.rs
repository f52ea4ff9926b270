//! Gemini REST client implementing the text and image gateways.

use super::wire::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
};
use super::GeminiResult;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use folio_core::{CompletionRequest, GeneratedImage, ImagePart};
use folio_error::{FolioResult, ModelError, ModelErrorKind};
use folio_interface::{ImageModel, TextModel};
use std::env;
use tracing::{debug, instrument, warn};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// Client for the Google Gemini REST API.
///
/// Implements [`TextModel`] (completion with optional assistant prefill) and
/// [`ImageModel`] (image generation with inline reference images). Transient
/// provider failures are retried with exponential backoff and jitter; the
/// backoff parameters are derived from the error classification in
/// [`ModelErrorKind::retry_strategy_params`].
///
/// # Examples
///
/// ```no_run
/// use folio_models::GeminiClient;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Reads GEMINI_API_KEY from the environment.
/// let client = GeminiClient::new()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    text_model: String,
    image_model: String,
    no_retry: bool,
    max_retries: Option<usize>,
    retry_backoff_ms: Option<u64>,
}

impl GeminiClient {
    /// Create a new client, reading the API key from `GEMINI_API_KEY`.
    #[instrument(name = "gemini_client_new")]
    pub fn new() -> FolioResult<Self> {
        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| ModelError::new(ModelErrorKind::MissingApiKey))?;
        Ok(Self::with_api_key(api_key))
    }

    /// Create a new client with an explicit API key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            no_retry: false,
            max_retries: None,
            retry_backoff_ms: None,
        }
    }

    /// Override the default text model.
    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    /// Override the default image model.
    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    /// Configure retry behavior.
    ///
    /// # Arguments
    ///
    /// * `no_retry` - Disable automatic retry entirely
    /// * `max_retries` - Override maximum retry attempts
    /// * `retry_backoff_ms` - Override initial backoff delay
    pub fn with_retry(
        mut self,
        no_retry: bool,
        max_retries: Option<usize>,
        retry_backoff_ms: Option<u64>,
    ) -> Self {
        self.no_retry = no_retry;
        self.max_retries = max_retries;
        self.retry_backoff_ms = retry_backoff_ms;
        self
    }

    /// Issue one `generateContent` call and decode the response.
    async fn generate_content(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> GeminiResult<GenerateContentResponse> {
        let url = format!("{}/{}:generateContent", GEMINI_API_BASE, model);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                ModelError::new(ModelErrorKind::ApiRequest(format!("Request failed: {}", e)))
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::new(ModelErrorKind::HttpStatus {
                status_code: status,
                message: body,
            }));
        }

        response.json::<GenerateContentResponse>().await.map_err(|e| {
            ModelError::new(ModelErrorKind::Decode(format!(
                "Failed to parse response: {}",
                e
            )))
        })
    }

    /// Run an operation with bounded exponential backoff on retryable errors.
    ///
    /// The first failure supplies the strategy parameters; non-retryable
    /// errors fail immediately.
    async fn with_backoff<T, F, Fut>(&self, op: F) -> GeminiResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = GeminiResult<T>>,
    {
        use tokio_retry2::strategy::{jitter, ExponentialBackoff};
        use tokio_retry2::{Retry, RetryError};

        let first = op().await;
        let err = match first {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if self.no_retry || !err.is_retryable() {
            if !err.is_retryable() {
                warn!(error = %err, "Permanent model error, failing immediately");
            }
            return Err(err);
        }

        let (mut initial_ms, mut max_retries, max_delay_secs) = err.kind.retry_strategy_params();
        if let Some(override_backoff) = self.retry_backoff_ms {
            initial_ms = override_backoff;
        }
        if let Some(override_retries) = self.max_retries {
            max_retries = override_retries;
        }

        debug!(
            error = %err,
            initial_backoff_ms = initial_ms,
            max_retries,
            max_delay_secs,
            "Model call failed, retrying with configured strategy"
        );

        let strategy = ExponentialBackoff::from_millis(initial_ms)
            .factor(2)
            .max_delay(std::time::Duration::from_secs(max_delay_secs))
            .map(jitter)
            .take(max_retries);

        Retry::spawn(strategy, || async {
            match op().await {
                Ok(value) => Ok(value),
                Err(e) => {
                    if e.is_retryable() {
                        warn!(error = %e, "Model call failed, will retry");
                        Err(RetryError::Transient {
                            err: e,
                            retry_after: None,
                        })
                    } else {
                        warn!(error = %e, "Permanent model error, failing immediately");
                        Err(RetryError::Permanent(e))
                    }
                }
            }
        })
        .await
    }

    /// Concatenate the text parts of the first candidate.
    fn extract_text(response: &GenerateContentResponse) -> GeminiResult<String> {
        let text: String = response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ModelError::new(ModelErrorKind::EmptyResponse));
        }
        Ok(text)
    }

    /// Find the first inline image in the first candidate.
    fn extract_image(response: &GenerateContentResponse) -> GeminiResult<GeneratedImage> {
        let inline = response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|content| content.parts.iter().find_map(|p| p.inline_data.as_ref()))
            .ok_or_else(|| ModelError::new(ModelErrorKind::EmptyResponse))?;

        let bytes = BASE64.decode(&inline.data).map_err(|e| {
            ModelError::new(ModelErrorKind::Base64Decode(e.to_string()))
        })?;

        Ok(GeneratedImage {
            bytes,
            mime: inline.mime_type.clone(),
        })
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    #[instrument(skip(self, req), fields(model = req.model.as_deref().unwrap_or(&self.text_model), prefill = req.prefill.is_some()))]
    async fn complete(&self, req: &CompletionRequest) -> FolioResult<String> {
        let model = req.model.as_deref().unwrap_or(&self.text_model).to_string();

        let mut contents = vec![Content::text(Some("user"), &req.user)];
        if let Some(prefill) = &req.prefill {
            // Trailing model turn biases the completion toward a valid
            // continuation of the prefill.
            contents.push(Content::text(Some("model"), prefill));
        }

        let body = GenerateContentRequest {
            system_instruction: (!req.system.is_empty())
                .then(|| Content::text(None, &req.system)),
            contents,
            generation_config: Some(GenerationConfig {
                temperature: req.temperature,
                max_output_tokens: req.max_tokens.map(|t| t as i32),
                response_modalities: None,
            }),
        };

        let response = self
            .with_backoff(|| self.generate_content(&model, &body))
            .await?;
        let continuation = Self::extract_text(&response)?;

        // The response continues the prefill turn; callers expect the full
        // document.
        Ok(match &req.prefill {
            Some(prefill) => format!("{}{}", prefill, continuation),
            None => continuation,
        })
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.text_model
    }
}

#[async_trait]
impl ImageModel for GeminiClient {
    #[instrument(skip(self, parts), fields(part_count = parts.len()))]
    async fn generate_image(&self, parts: &[ImagePart]) -> FolioResult<GeneratedImage> {
        let wire_parts: Vec<Part> = parts
            .iter()
            .map(|part| match part {
                ImagePart::Text(text) => Part {
                    text: Some(text.clone()),
                    inline_data: None,
                },
                ImagePart::Image { mime, bytes } => Part {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: mime.clone(),
                        data: BASE64.encode(bytes),
                    }),
                },
            })
            .collect();

        let body = GenerateContentRequest {
            system_instruction: None,
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: wire_parts,
            }],
            generation_config: Some(GenerationConfig {
                temperature: None,
                max_output_tokens: None,
                response_modalities: Some(vec!["IMAGE".to_string(), "TEXT".to_string()]),
            }),
        };

        let response = self
            .with_backoff(|| self.generate_content(&self.image_model, &body))
            .await?;
        Ok(Self::extract_image(&response)?)
    }
}
