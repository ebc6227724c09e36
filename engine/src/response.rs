use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use log::warn;
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    gemini::gemini_api::{GenerateContentResponse, PredictResponse, UsageMetadata},
    image_payload::DEFAULT_CONTENT_TYPE,
};

pub const SVG_CONTENT_TYPE: &str = "image/svg+xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub prompt_units: u64,
    pub completion_units: u64,
    pub total_units: u64,
}

impl From<UsageMetadata> for Usage {
    fn from(u: UsageMetadata) -> Self {
        Self {
            prompt_units: u.prompt_token_count,
            completion_units: u.candidates_token_count,
            total_units: u.total_token_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub data: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Default)]
pub struct ServiceResponse {
    pub artifacts: Vec<Artifact>,
    /// Model commentary
    pub text: Option<String>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationMask {
    pub label: String,
    pub bounding_box: [f64; 4],
    pub mask_image: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct Segmentation {
    pub masks: Vec<SegmentationMask>,
    pub usage: Option<Usage>,
}

fn decode(data: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(data.trim())
        .map_err(|e| Error::RemoteCall(format!("Gemini returned invalid base64 data: {e}")))
}

impl ServiceResponse {
    pub fn from_text(res: GenerateContentResponse) -> Self {
        let text = res.text();
        Self {
            artifacts: vec![],
            text: Some(text),
            usage: res.usage_metadata.map(Usage::from),
        }
    }

    /// Every inline image of every candidate, plus whatever text came along. A reply without a
    /// single image is an error.
    pub fn from_content(res: GenerateContentResponse) -> Result<Self> {
        let mut artifacts = vec![];
        for candidate in &res.candidates {
            let Some(content) = &candidate.content else {
                continue;
            };
            for blob in content.parts.iter().filter_map(|p| p.inline_data.as_ref()) {
                artifacts.push(Artifact {
                    data: decode(&blob.data)?,
                    content_type: blob.mime_type.clone(),
                });
            }
        }

        let text = res.text();
        if artifacts.is_empty() {
            let finish_reason = res
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref())
                .unwrap_or("unknown");
            let mut message = format!("Gemini returned no images (finish reason: {finish_reason})");
            if !text.trim().is_empty() {
                message.push_str(": ");
                message.push_str(text.trim());
            }
            return Err(Error::RemoteCall(message));
        }

        Ok(Self {
            artifacts,
            text: (!text.trim().is_empty()).then_some(text),
            usage: res.usage_metadata.map(Usage::from),
        })
    }

    pub fn from_predictions(res: PredictResponse) -> Result<Self> {
        let mut artifacts = vec![];
        let mut filtered = vec![];

        for prediction in res.predictions {
            match prediction.bytes_base64_encoded {
                Some(data) => artifacts.push(Artifact {
                    data: decode(&data)?,
                    content_type: prediction
                        .mime_type
                        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.into()),
                }),
                None => {
                    warn!("Prediction without image: {:?}", prediction.rai_filtered_reason);
                    filtered.extend(prediction.rai_filtered_reason);
                }
            }
        }

        if artifacts.is_empty() {
            return Err(Error::RemoteCall(if filtered.is_empty() {
                "Gemini returned no images".into()
            } else {
                format!("Gemini returned no images: {}", filtered.join("; "))
            }));
        }

        Ok(Self {
            artifacts,
            ..Default::default()
        })
    }

    /// Pulls the SVG document out of a text response, dropping any prose or code fences around
    /// it.
    pub fn from_svg_text(res: GenerateContentResponse) -> Result<Self> {
        let text = res.text();
        let svg = extract_svg(&text)
            .ok_or_else(|| Error::RemoteCall("Gemini response did not contain SVG markup".into()))?;

        Ok(Self {
            artifacts: vec![Artifact {
                data: svg.as_bytes().to_vec(),
                content_type: SVG_CONTENT_TYPE.into(),
            }],
            text: None,
            usage: res.usage_metadata.map(Usage::from),
        })
    }
}

pub fn extract_svg(text: &str) -> Option<&str> {
    let start = text.find("<svg")?;
    let end = text.rfind("</svg>")? + "</svg>".len();
    (start < end).then(|| &text[start..end])
}

#[derive(Debug, Deserialize)]
struct RawMask {
    box_2d: [f64; 4],
    mask: String,
    label: String,
}

fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // skip the language tag
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

impl Segmentation {
    pub fn from_content(res: GenerateContentResponse) -> Result<Self> {
        let text = res.text();
        let raw: Vec<RawMask> = serde_json::from_str(strip_code_fence(&text)).map_err(|e| {
            Error::RemoteCall(format!("Could not parse segmentation response: {e}\n{text}"))
        })?;

        let masks = raw
            .into_iter()
            .map(|m| {
                let data = m.mask.split_once("base64,").map_or(m.mask.as_str(), |(_, d)| d);
                Ok(SegmentationMask {
                    mask_image: decode(data)?,
                    label: m.label,
                    bounding_box: m.box_2d,
                })
            })
            .collect::<Result<_>>()?;

        Ok(Self {
            masks,
            usage: res.usage_metadata.map(Usage::from),
        })
    }
}
