//! Option translation tables. Each CLI token maps to a named constant, and each constant
//! serializes to the value the service expects.

use serde::Serialize;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, clap::ValueEnum, Serialize)]
pub enum ImageSize {
    #[value(name = "1K")]
    #[serde(rename = "1K")]
    Size1024,
    #[value(name = "2K")]
    #[serde(rename = "2K")]
    Size2048,
    #[value(name = "4K")]
    #[serde(rename = "4K")]
    Size4096,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, clap::ValueEnum, Serialize)]
pub enum AspectRatio {
    #[value(name = "1:1")]
    #[serde(rename = "1:1")]
    Ratio1x1,
    #[value(name = "16:9")]
    #[serde(rename = "16:9")]
    Ratio16x9,
    #[value(name = "9:16")]
    #[serde(rename = "9:16")]
    Ratio9x16,
    #[value(name = "4:3")]
    #[serde(rename = "4:3")]
    Ratio4x3,
    #[value(name = "3:4")]
    #[serde(rename = "3:4")]
    Ratio3x4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, clap::ValueEnum)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpeg,
    Webp,
}

impl OutputFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Webp => "image/webp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, clap::ValueEnum, Serialize)]
pub enum EditMode {
    #[serde(rename = "EDIT_MODE_INPAINT_INSERTION")]
    Inpaint,
    #[serde(rename = "EDIT_MODE_OUTPAINT")]
    Outpaint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, clap::ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UpscaleFactor {
    #[default]
    X2,
    X4,
}
