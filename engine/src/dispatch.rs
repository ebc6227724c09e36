//! Maps a validated [`InvocationRequest`] onto the service's request shape and performs the
//! single outbound call.

use indoc::indoc;
use log::{info, warn};

use crate::{
    config::Models,
    error::Result,
    gemini::{
        Service,
        gemini_api::{
            Content, EncodedImage, GenerateContentRequest, GenerationConfig, ImageConfig, Instance,
            MaskImageConfig, OutputOptions, Parameters, Part, PredictRequest, ReferenceImage,
            ThinkingConfig, UpscaleConfig,
        },
    },
    image_payload::ImagePayload,
    options::OutputFormat,
    request::{
        EditRequest, GenerateRequest, ImageRequest, InvocationRequest, SegmentRequest, SvgRequest,
        UpscaleRequest,
    },
    response::{Segmentation, ServiceResponse},
};

pub const DEFAULT_SVG_INSTRUCTIONS: &str = indoc! {"
    You are an expert SVG designer. Reply with a single, complete, self-contained SVG document
    and nothing else: no explanations and no Markdown. Always include a viewBox attribute,
    prefer simple shapes and paths over embedded raster images, and do not reference external
    resources.
"};

pub const DEFAULT_SEGMENT_PROMPT: &str = indoc! {r#"
    Give the segmentation masks for the objects in the image. Output a JSON list of
    segmentation masks where each entry contains the 2D bounding box in the key "box_2d",
    the segmentation mask in key "mask", and the text label in the key "label". Use
    descriptive labels.
"#};

#[derive(Debug)]
pub enum Outcome {
    Response(ServiceResponse),
    Segmentation(Segmentation),
}

pub async fn dispatch<S: Service + ?Sized>(
    request: &InvocationRequest,
    models: &Models,
    service: &S,
) -> Result<Outcome> {
    let kind = request.kind();
    info!("Dispatching {kind} request");

    Ok(match request {
        InvocationRequest::Generate(req) => {
            let model = req.model.as_deref().unwrap_or(models.for_kind(kind));
            let res = service.generate_content(model, &generate_body(req)).await?;
            Outcome::Response(ServiceResponse::from_text(res))
        }
        InvocationRequest::Image(req) => {
            let model = models.for_kind(kind);
            if is_native_image_model(model) {
                let res = service
                    .generate_content(model, &native_image_body(req))
                    .await?;
                Outcome::Response(ServiceResponse::from_content(res)?)
            } else {
                let res = service.predict(model, &image_body(req)).await?;
                Outcome::Response(ServiceResponse::from_predictions(res)?)
            }
        }
        InvocationRequest::Upscale(req) => {
            let res = service.predict(models.for_kind(kind), &upscale_body(req)).await?;
            Outcome::Response(ServiceResponse::from_predictions(res)?)
        }
        InvocationRequest::Edit(req) => {
            let res = service.predict(models.for_kind(kind), &edit_body(req)).await?;
            Outcome::Response(ServiceResponse::from_predictions(res)?)
        }
        InvocationRequest::Svg(req) => {
            let res = service
                .generate_content(models.for_kind(kind), &svg_body(req))
                .await?;
            Outcome::Response(ServiceResponse::from_svg_text(res)?)
        }
        InvocationRequest::Segment(req) => {
            let res = service
                .generate_content(models.for_kind(kind), &segment_body(req))
                .await?;
            Outcome::Segmentation(Segmentation::from_content(res)?)
        }
    })
}

fn inline_part(image: &ImagePayload) -> Part {
    Part::inline_data(image.content_type(), image.to_base64())
}

fn encoded(image: &ImagePayload) -> EncodedImage {
    EncodedImage {
        bytes_base64_encoded: image.to_base64(),
        mime_type: image.content_type().into(),
    }
}

fn output_options(format: Option<OutputFormat>, quality: Option<u8>) -> Option<OutputOptions> {
    (format.is_some() || quality.is_some()).then(|| OutputOptions {
        mime_type: format.map(|f| f.content_type()),
        compression_quality: quality,
    })
}

pub fn generate_body(req: &GenerateRequest) -> GenerateContentRequest {
    let mut parts: Vec<Part> = req.images.iter().map(inline_part).collect();
    parts.push(Part::text(&req.prompt));

    let generation_config = (req.temperature.is_some() || req.max_tokens.is_some()).then(|| {
        GenerationConfig {
            temperature: req.temperature,
            max_output_tokens: req.max_tokens,
            ..Default::default()
        }
    });

    GenerateContentRequest {
        contents: vec![Content::user(parts)],
        system_instruction: req.instructions.as_deref().map(Content::system),
        generation_config,
    }
}

/// Gemini models that answer `generateContent` with inline images, as opposed to Imagen's
/// `predict`.
pub fn is_native_image_model(model: &str) -> bool {
    let model = model.trim();
    model.strip_prefix("models/").unwrap_or(model).starts_with("gemini")
}

pub fn native_image_body(req: &ImageRequest) -> GenerateContentRequest {
    if req.negative.is_some() || req.guidance.is_some() {
        warn!("--negative and --guidance are ignored by Gemini image models");
    }

    let mut parts: Vec<Part> = req.input.iter().map(inline_part).collect();
    parts.push(Part::text(&req.prompt));

    GenerateContentRequest {
        contents: vec![Content::user(parts)],
        system_instruction: None,
        generation_config: Some(GenerationConfig {
            candidate_count: req.count,
            seed: req.seed,
            response_modalities: vec!["TEXT", "IMAGE"],
            image_config: (req.aspect.is_some() || req.size.is_some()).then_some(ImageConfig {
                aspect_ratio: req.aspect,
                image_size: req.size,
            }),
            ..Default::default()
        }),
    }
}

pub fn image_body(req: &ImageRequest) -> PredictRequest {
    PredictRequest {
        instances: vec![Instance {
            prompt: Some(req.prompt.clone()),
            image: req.input.as_ref().map(encoded),
            ..Default::default()
        }],
        parameters: Parameters {
            sample_count: req.count,
            aspect_ratio: req.aspect,
            sample_image_size: req.size,
            negative_prompt: req.negative.clone(),
            guidance_scale: req.guidance,
            seed: req.seed,
            ..Default::default()
        },
    }
}

pub fn upscale_body(req: &UpscaleRequest) -> PredictRequest {
    PredictRequest {
        instances: vec![Instance {
            image: Some(encoded(&req.image)),
            ..Default::default()
        }],
        parameters: Parameters {
            mode: Some("upscale"),
            upscale_config: Some(UpscaleConfig {
                upscale_factor: req.factor,
            }),
            output_options: output_options(req.format, req.quality),
            ..Default::default()
        },
    }
}

pub fn edit_body(req: &EditRequest) -> PredictRequest {
    let mut reference_images = vec![ReferenceImage {
        reference_type: "REFERENCE_TYPE_RAW",
        reference_id: 1,
        reference_image: encoded(&req.image),
        mask_image_config: None,
    }];

    if let Some(mask) = &req.mask {
        reference_images.push(ReferenceImage {
            reference_type: "REFERENCE_TYPE_MASK",
            reference_id: 2,
            reference_image: encoded(mask),
            mask_image_config: Some(MaskImageConfig {
                mask_mode: "MASK_MODE_USER_PROVIDED",
            }),
        });
    }

    PredictRequest {
        instances: vec![Instance {
            prompt: Some(req.prompt.clone()),
            reference_images,
            ..Default::default()
        }],
        parameters: Parameters {
            edit_mode: req.mode,
            sample_count: req.count,
            negative_prompt: req.negative.clone(),
            guidance_scale: req.guidance,
            seed: req.seed,
            output_options: output_options(req.format, req.quality),
            ..Default::default()
        },
    }
}

pub fn svg_body(req: &SvgRequest) -> GenerateContentRequest {
    let instructions = req
        .instructions
        .as_deref()
        .unwrap_or(DEFAULT_SVG_INSTRUCTIONS);

    GenerateContentRequest {
        contents: vec![Content::user(vec![Part::text(&req.prompt)])],
        system_instruction: Some(Content::system(instructions)),
        generation_config: None,
    }
}

pub fn segment_body(req: &SegmentRequest) -> GenerateContentRequest {
    let prompt = req.prompt.as_deref().unwrap_or(DEFAULT_SEGMENT_PROMPT);

    GenerateContentRequest {
        contents: vec![Content::user(vec![
            inline_part(&req.image),
            Part::text(prompt),
        ])],
        system_instruction: None,
        generation_config: Some(GenerationConfig {
            response_mime_type: Some("application/json".into()),
            thinking_config: Some(ThinkingConfig { thinking_budget: 0 }),
            ..Default::default()
        }),
    }
}

#[cfg(test)]
mod test {
    use std::{path::PathBuf, sync::Mutex};

    use expect_test::expect;
    use serde_json::json;

    use super::*;
    use crate::{
        gemini::{
            ServiceFuture,
            gemini_api::{GenerateContentResponse, PredictResponse},
        },
        options::{EditMode, ImageSize, UpscaleFactor},
    };

    /// Records what was asked and answers with canned JSON.
    #[derive(Default)]
    struct FakeService {
        calls: Mutex<Vec<(String, String)>>,
        content: serde_json::Value,
        predictions: serde_json::Value,
    }

    impl Service for FakeService {
        fn generate_content<'a>(
            &'a self,
            model: &'a str,
            body: &'a GenerateContentRequest,
        ) -> ServiceFuture<'a, GenerateContentResponse> {
            self.calls
                .lock()
                .unwrap()
                .push((model.into(), serde_json::to_string(body).unwrap()));
            let res = serde_json::from_value(self.content.clone()).unwrap();
            Box::pin(async move { Ok(res) })
        }

        fn predict<'a>(
            &'a self,
            model: &'a str,
            body: &'a PredictRequest,
        ) -> ServiceFuture<'a, PredictResponse> {
            self.calls
                .lock()
                .unwrap()
                .push((model.into(), serde_json::to_string(body).unwrap()));
            let res = serde_json::from_value(self.predictions.clone()).unwrap();
            Box::pin(async move { Ok(res) })
        }
    }

    fn png() -> ImagePayload {
        ImagePayload::new(vec![1, 2, 3], "image/png")
    }

    #[test]
    fn edit_body_with_mask() {
        let req = EditRequest {
            image: png(),
            prompt: "add a moon".into(),
            mask: Some(ImagePayload::new(vec![4, 5], "image/png")),
            mode: Some(EditMode::Inpaint),
            format: Some(OutputFormat::Jpeg),
            quality: Some(90),
            negative: None,
            count: None,
            guidance: None,
            seed: Some(7),
            output: None,
        };

        let expect = expect![[r#"{"instances":[{"prompt":"add a moon","referenceImages":[{"referenceType":"REFERENCE_TYPE_RAW","referenceId":1,"referenceImage":{"bytesBase64Encoded":"AQID","mimeType":"image/png"}},{"referenceType":"REFERENCE_TYPE_MASK","referenceId":2,"referenceImage":{"bytesBase64Encoded":"BAU=","mimeType":"image/png"},"maskImageConfig":{"maskMode":"MASK_MODE_USER_PROVIDED"}}]}],"parameters":{"seed":7,"editMode":"EDIT_MODE_INPAINT_INSERTION","outputOptions":{"mimeType":"image/jpeg","compressionQuality":90}}}"#]];
        expect.assert_eq(&serde_json::to_string(&edit_body(&req)).unwrap());
    }

    #[test]
    fn upscale_body_defaults() {
        let req = UpscaleRequest {
            image: png(),
            factor: UpscaleFactor::default(),
            format: None,
            quality: None,
            output: None,
        };

        let expect = expect![[r#"{"instances":[{"image":{"bytesBase64Encoded":"AQID","mimeType":"image/png"}}],"parameters":{"mode":"upscale","upscaleConfig":{"upscaleFactor":"x2"}}}"#]];
        expect.assert_eq(&serde_json::to_string(&upscale_body(&req)).unwrap());
    }

    #[test]
    fn segment_body_requests_json() {
        let req = SegmentRequest {
            image: png(),
            prompt: Some("find cats".into()),
            output_dir: None,
        };

        let expect = expect![[r#"{"contents":[{"role":"user","parts":[{"inlineData":{"mimeType":"image/png","data":"AQID"}},{"text":"find cats"}]}],"generationConfig":{"responseMimeType":"application/json","thinkingConfig":{"thinkingBudget":0}}}"#]];
        expect.assert_eq(&serde_json::to_string(&segment_body(&req)).unwrap());
    }

    #[tokio::test]
    async fn image_request_makes_one_predict_call() -> Result<()> {
        let service = FakeService {
            predictions: json!({"predictions": [
                {"bytesBase64Encoded": "AQID", "mimeType": "image/png"},
                {"bytesBase64Encoded": "BAU=", "mimeType": "image/png"}
            ]}),
            ..Default::default()
        };
        let req = InvocationRequest::Image(ImageRequest {
            prompt: "a red cube".into(),
            input: None,
            size: Some(ImageSize::Size4096),
            aspect: None,
            negative: None,
            count: Some(2),
            guidance: None,
            seed: None,
            output: Some(PathBuf::from("cube.png")),
        });

        let Outcome::Response(res) = dispatch(&req, &Models::default(), &service).await? else {
            panic!("expected images");
        };
        assert_eq!(res.artifacts.len(), 2);

        let calls = service.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "imagen-4.0-generate-001");
        assert!(calls[0].1.contains(r#""sampleCount":2"#));
        Ok(())
    }

    #[tokio::test]
    async fn gemini_image_models_use_generate_content() -> Result<()> {
        let service = FakeService {
            content: json!({"candidates": [{"content": {"parts": [
                {"text": "A cube, as requested."},
                {"inlineData": {"mimeType": "image/png", "data": "AQID"}}
            ]}}]}),
            ..Default::default()
        };
        let models = Models {
            image: "gemini-2.5-flash-image".into(),
            ..Default::default()
        };
        let req = InvocationRequest::Image(ImageRequest {
            prompt: "a red cube".into(),
            input: None,
            size: None,
            aspect: Some(crate::options::AspectRatio::Ratio16x9),
            negative: None,
            count: None,
            guidance: None,
            seed: None,
            output: None,
        });

        let Outcome::Response(res) = dispatch(&req, &models, &service).await? else {
            panic!("expected images");
        };
        assert_eq!(res.text.as_deref(), Some("A cube, as requested."));
        assert_eq!(res.artifacts[0].data, vec![1, 2, 3]);

        let calls = service.calls.lock().unwrap();
        let expect = expect![[r#"{"contents":[{"role":"user","parts":[{"text":"a red cube"}]}],"generationConfig":{"responseModalities":["TEXT","IMAGE"],"imageConfig":{"aspectRatio":"16:9"}}}"#]];
        expect.assert_eq(&calls[0].1);
        Ok(())
    }

    #[tokio::test]
    async fn gemini_image_reply_without_images_fails() {
        let service = FakeService {
            content: json!({"candidates": [{
                "content": {"parts": [{"text": "I can't generate that."}]},
                "finishReason": "STOP"
            }]}),
            ..Default::default()
        };
        let models = Models {
            image: "gemini-2.5-flash-image".into(),
            ..Default::default()
        };
        let req = InvocationRequest::Image(ImageRequest {
            prompt: "something".into(),
            input: None,
            size: None,
            aspect: None,
            negative: None,
            count: None,
            guidance: None,
            seed: None,
            output: None,
        });

        let err = dispatch(&req, &models, &service).await.unwrap_err();
        assert!(matches!(err, crate::Error::RemoteCall(_)));
        assert_eq!(
            err.to_string(),
            "Gemini returned no images (finish reason: STOP): I can't generate that."
        );
    }

    #[test]
    fn native_image_model_names() {
        assert!(is_native_image_model("gemini-2.5-flash-image"));
        assert!(is_native_image_model("models/gemini-3-pro-image-preview"));
        assert!(!is_native_image_model("imagen-4.0-generate-001"));
    }

    #[tokio::test]
    async fn generate_uses_model_override() -> Result<()> {
        let service = FakeService {
            content: json!({"candidates": [{"content": {"parts": [{"text": "Recursion is..."}]}}]}),
            ..Default::default()
        };
        let req = InvocationRequest::Generate(GenerateRequest {
            prompt: "Explain recursion".into(),
            images: vec![png()],
            model: Some("gemini-2.5-pro".into()),
            instructions: None,
            max_tokens: None,
            temperature: Some(0.7),
        });

        let Outcome::Response(res) = dispatch(&req, &Models::default(), &service).await? else {
            panic!("expected text");
        };
        assert_eq!(res.text.as_deref(), Some("Recursion is..."));

        let calls = service.calls.lock().unwrap();
        assert_eq!(calls[0].0, "gemini-2.5-pro");
        assert!(calls[0].1.contains(r#""temperature":0.7"#));
        Ok(())
    }
}
