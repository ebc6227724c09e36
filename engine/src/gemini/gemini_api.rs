use std::time::Duration;

use log::{debug, info};
use reqwest::header::{self, HeaderValue};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

mod error;
pub use error::ApiError;

use crate::{
    error::Result,
    options::{AspectRatio, EditMode, ImageSize, UpscaleFactor},
};

#[derive(Debug, Clone)]
pub struct Endpoint<'a> {
    pub api_base: &'a str,
    pub api_key: &'a str,
    pub timeout: Duration,
}

//
// ===== generateContent =====
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user".into()),
            parts,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn inline_data(mime_type: impl Into<String>, data: String) -> Self {
        Self {
            inline_data: Some(Blob {
                mime_type: mime_type.into(),
                data,
            }),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    /// base64
    pub data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_count: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,

    /// Only for image capable models
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub response_modalities: Vec<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<ImageSize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u64,
    #[serde(default)]
    pub candidates_token_count: u64,
    #[serde(default)]
    pub total_token_count: u64,
}

impl GenerateContentResponse {
    /// All text parts of the first candidate, concatenated.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect()
            })
            .unwrap_or_default()
    }
}

//
// ===== predict (Imagen) =====
//

#[derive(Debug, Serialize)]
pub struct PredictRequest {
    pub instances: Vec<Instance>,
    pub parameters: Parameters,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EncodedImage>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reference_images: Vec<ReferenceImage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    pub bytes_base64_encoded: String,
    pub mime_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceImage {
    pub reference_type: &'static str,
    pub reference_id: u32,
    pub reference_image: EncodedImage,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_image_config: Option<MaskImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskImageConfig {
    pub mask_mode: &'static str,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_count: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_image_size: Option<ImageSize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub upscale_config: Option<UpscaleConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_mode: Option<EditMode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_options: Option<OutputOptions>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpscaleConfig {
    pub upscale_factor: UpscaleFactor,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_quality: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub bytes_base64_encoded: Option<String>,
    pub mime_type: Option<String>,
    pub rai_filtered_reason: Option<String>,
}

//
// ===== transport =====
//

pub fn model_url(api_base: &str, model: &str, method: &str) -> String {
    let model = model.trim();
    let model = model.strip_prefix("models/").unwrap_or(model);
    format!("{}/models/{model}:{method}", api_base.trim_end_matches('/'))
}

pub async fn generate_content(
    endpoint: &Endpoint<'_>,
    model: &str,
    body: &GenerateContentRequest,
    client: &reqwest::Client,
) -> Result<GenerateContentResponse> {
    post(endpoint, &model_url(endpoint.api_base, model, "generateContent"), body, client).await
}

pub async fn predict(
    endpoint: &Endpoint<'_>,
    model: &str,
    body: &PredictRequest,
    client: &reqwest::Client,
) -> Result<PredictResponse> {
    post(endpoint, &model_url(endpoint.api_base, model, "predict"), body, client).await
}

async fn post<B: Serialize, R: DeserializeOwned>(
    endpoint: &Endpoint<'_>,
    url: &str,
    body: &B,
    client: &reqwest::Client,
) -> Result<R> {
    info!("POST {url}");
    debug!("Json-data: {}", elide_payloads(body));

    let res = client
        .post(url)
        .timeout(endpoint.timeout)
        .header("x-goog-api-key", endpoint.api_key)
        .header(header::ACCEPT, HeaderValue::from_static("application/json"))
        .json(body)
        .send()
        .await?;

    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        return Err(ApiError::from_response(status.as_u16(), &text).into());
    }

    debug!("Response: {} bytes", text.len());
    serde_json::from_str(&text).map_err(|e| {
        crate::Error::RemoteCall(format!("Unexpected response from Gemini: {e}"))
    })
}

/// Renders a request body for the log with base64 blobs shortened.
pub fn elide_payloads(body: &impl Serialize) -> String {
    fn walk(v: &mut Value) {
        match v {
            Value::Object(map) => {
                for (key, value) in map.iter_mut() {
                    match value {
                        Value::String(s) if key == "data" || key == "bytesBase64Encoded" => {
                            *s = format!("<{} base64 chars>", s.len());
                        }
                        other => walk(other),
                    }
                }
            }
            Value::Array(items) => items.iter_mut().for_each(walk),
            _ => {}
        }
    }

    let mut value = serde_json::to_value(body).unwrap_or(Value::Null);
    walk(&mut value);
    value.to_string()
}
