//! One validated record per operation kind. Everything a handler needs is checked here, before
//! the credential is looked at and before anything goes over the network.

use std::path::PathBuf;

use log::debug;
use strum::{Display, EnumIter, EnumString};

use crate::{
    args::{self, OptionSpec, ParsedArgs, ScanMode, Schema, ValueKind},
    error::{Error, Result},
    image_payload::ImagePayload,
    options::{AspectRatio, EditMode, ImageSize, OutputFormat, UpscaleFactor},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum OperationKind {
    Generate,
    Image,
    Upscale,
    Edit,
    Svg,
    Segment,
}

const OUTPUT: OptionSpec = OptionSpec::new("output", ValueKind::Path);
const NEGATIVE: OptionSpec = OptionSpec::new("negative", ValueKind::Text);
const COUNT: OptionSpec = OptionSpec::new("count", ValueKind::Integer);
const GUIDANCE: OptionSpec = OptionSpec::new("guidance", ValueKind::Float);
const SEED: OptionSpec = OptionSpec::new("seed", ValueKind::Integer);
const FORMAT: OptionSpec = OptionSpec::new("format", ValueKind::Text);
const QUALITY: OptionSpec = OptionSpec::new("quality", ValueKind::Integer);
const INSTRUCTIONS: OptionSpec = OptionSpec::new("instructions", ValueKind::Text);

const GENERATE_OPTIONS: &[OptionSpec] = &[
    OptionSpec::new("image", ValueKind::Image).with_short("-i"),
    OptionSpec::new("model", ValueKind::Text),
    INSTRUCTIONS,
    OptionSpec::new("max-tokens", ValueKind::Integer),
    OptionSpec::new("temperature", ValueKind::Float),
];

const IMAGE_OPTIONS: &[OptionSpec] = &[
    OptionSpec::new("size", ValueKind::Text),
    OptionSpec::new("aspect", ValueKind::Text),
    NEGATIVE,
    COUNT,
    GUIDANCE,
    SEED,
    OptionSpec::new("input", ValueKind::Path),
    OUTPUT,
];

const UPSCALE_OPTIONS: &[OptionSpec] = &[
    OptionSpec::new("factor", ValueKind::Text),
    FORMAT,
    QUALITY,
    OUTPUT,
];

const EDIT_OPTIONS: &[OptionSpec] = &[
    OptionSpec::new("mask", ValueKind::Path),
    OptionSpec::new("mode", ValueKind::Text),
    FORMAT,
    QUALITY,
    NEGATIVE,
    COUNT,
    GUIDANCE,
    SEED,
    OUTPUT,
];

const SVG_OPTIONS: &[OptionSpec] = &[INSTRUCTIONS, OUTPUT];
const SEGMENT_OPTIONS: &[OptionSpec] = &[OptionSpec::new("prompt", ValueKind::Text), OUTPUT];

impl OperationKind {
    pub fn schema(&self) -> Schema {
        let options = match self {
            OperationKind::Generate => GENERATE_OPTIONS,
            OperationKind::Image => IMAGE_OPTIONS,
            OperationKind::Upscale => UPSCALE_OPTIONS,
            OperationKind::Edit => EDIT_OPTIONS,
            OperationKind::Svg => SVG_OPTIONS,
            OperationKind::Segment => SEGMENT_OPTIONS,
        };

        Schema {
            options,
            detect_images: *self == OperationKind::Generate,
        }
    }

    /// File name prefix used when no output path is given.
    pub fn output_prefix(&self) -> &'static str {
        match self {
            OperationKind::Upscale => "upscaled",
            OperationKind::Edit => "edited",
            _ => "output",
        }
    }
}

#[derive(Debug)]
pub enum InvocationRequest {
    Generate(GenerateRequest),
    Image(ImageRequest),
    Upscale(UpscaleRequest),
    Edit(EditRequest),
    Svg(SvgRequest),
    Segment(SegmentRequest),
}

#[derive(Debug)]
pub struct GenerateRequest {
    pub prompt: String,
    pub images: Vec<ImagePayload>,
    pub model: Option<String>,
    pub instructions: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug)]
pub struct ImageRequest {
    pub prompt: String,
    /// Source image for image-to-image generation
    pub input: Option<ImagePayload>,
    pub size: Option<ImageSize>,
    pub aspect: Option<AspectRatio>,
    pub negative: Option<String>,
    pub count: Option<u32>,
    pub guidance: Option<f32>,
    pub seed: Option<i64>,
    pub output: Option<PathBuf>,
}

#[derive(Debug)]
pub struct UpscaleRequest {
    pub image: ImagePayload,
    pub factor: UpscaleFactor,
    pub format: Option<OutputFormat>,
    pub quality: Option<u8>,
    pub output: Option<PathBuf>,
}

#[derive(Debug)]
pub struct EditRequest {
    pub image: ImagePayload,
    pub prompt: String,
    pub mask: Option<ImagePayload>,
    pub mode: Option<EditMode>,
    pub format: Option<OutputFormat>,
    pub quality: Option<u8>,
    pub negative: Option<String>,
    pub count: Option<u32>,
    pub guidance: Option<f32>,
    pub seed: Option<i64>,
    pub output: Option<PathBuf>,
}

#[derive(Debug)]
pub struct SvgRequest {
    pub prompt: String,
    pub instructions: Option<String>,
    pub output: PathBuf,
}

#[derive(Debug)]
pub struct SegmentRequest {
    pub image: ImagePayload,
    pub prompt: Option<String>,
    /// Masks are only written when this is set
    pub output_dir: Option<PathBuf>,
}

pub const MAX_COUNT: u32 = 4;
pub const DEFAULT_SVG_OUTPUT: &str = "output.svg";

impl InvocationRequest {
    /// Normalizes `tokens` with the kind's schema, validates every option, and loads the input
    /// images.
    pub fn parse(kind: OperationKind, tokens: &[String], mode: ScanMode) -> Result<Self> {
        let parsed = args::parse(tokens, &kind.schema(), mode)?;

        let request = match kind {
            OperationKind::Generate => Self::Generate(GenerateRequest::from_args(&parsed)?),
            OperationKind::Image => Self::Image(ImageRequest::from_args(&parsed)?),
            OperationKind::Upscale => Self::Upscale(UpscaleRequest::from_args(&parsed)?),
            OperationKind::Edit => Self::Edit(EditRequest::from_args(&parsed)?),
            OperationKind::Svg => Self::Svg(SvgRequest::from_args(&parsed)?),
            OperationKind::Segment => Self::Segment(SegmentRequest::from_args(&parsed)?),
        };

        debug!("Request: {request:#?}");
        Ok(request)
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Generate(_) => OperationKind::Generate,
            Self::Image(_) => OperationKind::Image,
            Self::Upscale(_) => OperationKind::Upscale,
            Self::Edit(_) => OperationKind::Edit,
            Self::Svg(_) => OperationKind::Svg,
            Self::Segment(_) => OperationKind::Segment,
        }
    }

    /// Where the user asked for the result to go, if anywhere.
    pub fn output(&self) -> Option<&std::path::Path> {
        match self {
            Self::Generate(_) => None,
            Self::Image(r) => r.output.as_deref(),
            Self::Upscale(r) => r.output.as_deref(),
            Self::Edit(r) => r.output.as_deref(),
            Self::Svg(r) => Some(&r.output),
            Self::Segment(r) => r.output_dir.as_deref(),
        }
    }
}

fn required_prompt(parsed: &ParsedArgs) -> Result<String> {
    let prompt = parsed.prompt_text();
    if prompt.trim().is_empty() {
        Err(Error::invalid("Prompt required"))
    } else {
        Ok(prompt)
    }
}

fn required_input(parsed: &ParsedArgs) -> Result<PathBuf> {
    parsed
        .positional
        .first()
        .map(PathBuf::from)
        .ok_or_else(|| Error::invalid("Input image path required"))
}

fn load_optional(path: Option<PathBuf>) -> Result<Option<ImagePayload>> {
    path.map(ImagePayload::load).transpose()
}

fn count(parsed: &ParsedArgs) -> Result<Option<u32>> {
    match parsed.integer::<u32>("count")? {
        Some(n) if !(1..=MAX_COUNT).contains(&n) => Err(Error::invalid(format!(
            "--count must be between 1 and {MAX_COUNT}, got {n}"
        ))),
        n => Ok(n),
    }
}

fn quality(parsed: &ParsedArgs) -> Result<Option<u8>> {
    match parsed.integer::<u8>("quality")? {
        Some(q) if !(1..=100).contains(&q) => Err(Error::invalid(format!(
            "--quality must be between 1 and 100, got {q}"
        ))),
        q => Ok(q),
    }
}

fn guidance(parsed: &ParsedArgs) -> Result<Option<f32>> {
    Ok(parsed.float("guidance")?.map(|g| g as f32))
}

impl GenerateRequest {
    fn from_args(parsed: &ParsedArgs) -> Result<Self> {
        let prompt = required_prompt(parsed)?;

        let temperature = match parsed.float("temperature")? {
            Some(t) if !(0.0..=2.0).contains(&t) => {
                return Err(Error::invalid(format!(
                    "--temperature must be between 0.0 and 2.0, got {t}"
                )));
            }
            t => t.map(|t| t as f32),
        };

        let max_tokens = match parsed.integer::<u32>("max-tokens")? {
            Some(0) => return Err(Error::invalid("--max-tokens must be positive")),
            n => n,
        };

        Ok(Self {
            prompt,
            images: parsed
                .images
                .iter()
                .map(ImagePayload::load)
                .collect::<Result<_>>()?,
            model: parsed.text("model")?.map(String::from),
            instructions: parsed.text("instructions")?.map(String::from),
            max_tokens,
            temperature,
        })
    }
}

impl ImageRequest {
    fn from_args(parsed: &ParsedArgs) -> Result<Self> {
        let prompt = required_prompt(parsed)?;

        Ok(Self {
            size: parsed.choice("size")?,
            aspect: parsed.choice("aspect")?,
            negative: parsed.text("negative")?.map(String::from),
            count: count(parsed)?,
            guidance: guidance(parsed)?,
            seed: parsed.integer("seed")?,
            output: parsed.path("output")?,
            input: load_optional(parsed.path("input")?)?,
            prompt,
        })
    }
}

impl UpscaleRequest {
    fn from_args(parsed: &ParsedArgs) -> Result<Self> {
        let input = required_input(parsed)?;

        Ok(Self {
            factor: parsed.choice("factor")?.unwrap_or_default(),
            format: parsed.choice("format")?,
            quality: quality(parsed)?,
            output: parsed.path("output")?,
            image: ImagePayload::load(input)?,
        })
    }
}

impl EditRequest {
    fn from_args(parsed: &ParsedArgs) -> Result<Self> {
        let (Some(input), Some(_)) = (parsed.positional.first(), parsed.positional.get(1)) else {
            return Err(Error::invalid("Input image and prompt required"));
        };
        let prompt = parsed.positional[1..].join(" ");

        Ok(Self {
            mode: parsed.choice("mode")?,
            format: parsed.choice("format")?,
            quality: quality(parsed)?,
            negative: parsed.text("negative")?.map(String::from),
            count: count(parsed)?,
            guidance: guidance(parsed)?,
            seed: parsed.integer("seed")?,
            output: parsed.path("output")?,
            image: ImagePayload::load(input)?,
            mask: load_optional(parsed.path("mask")?)?,
            prompt,
        })
    }
}

impl SvgRequest {
    fn from_args(parsed: &ParsedArgs) -> Result<Self> {
        Ok(Self {
            prompt: required_prompt(parsed)?,
            instructions: parsed.text("instructions")?.map(String::from),
            output: parsed
                .path("output")?
                .unwrap_or_else(|| DEFAULT_SVG_OUTPUT.into()),
        })
    }
}

impl SegmentRequest {
    fn from_args(parsed: &ParsedArgs) -> Result<Self> {
        let input = required_input(parsed)?;

        Ok(Self {
            prompt: parsed.text("prompt")?.map(String::from),
            output_dir: parsed.path("output")?,
            image: ImagePayload::load(input)?,
        })
    }
}
