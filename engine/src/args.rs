//! Turns raw command-line tokens into positional values, named options and image paths.
//!
//! Every command describes its options with a static [`Schema`]. Typed values (`Integer`,
//! `Float`) are checked while scanning, so a handler only ever sees well-formed numbers.

use std::{collections::BTreeMap, path::PathBuf};

use clap::ValueEnum;
use log::debug;

use crate::{
    MAX_IMAGES,
    error::{Error, Result},
    image_payload::has_image_extension,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Never consumes the following token
    Switch,
    Text,
    Path,
    Integer,
    Float,
    /// Repeatable, every occurrence adds to [`ParsedArgs::images`]
    Image,
}

#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub name: &'static str,
    pub short: Option<&'static str>,
    pub kind: ValueKind,
}

impl OptionSpec {
    pub const fn new(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            short: None,
            kind,
        }
    }

    pub const fn with_short(mut self, short: &'static str) -> Self {
        self.short = Some(short);
        self
    }
}

/// Where the prompt starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// Scan every token; the prompt is whatever positional tokens remain.
    #[default]
    Exhaustive,
    /// The first token that is neither an option nor an image path starts the prompt, and
    /// everything from there on belongs to it.
    StopAtPrompt,
}

#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub options: &'static [OptionSpec],
    /// Treat bare tokens with an image extension as image paths
    pub detect_images: bool,
}

impl Schema {
    fn lookup(&self, token: &str) -> Option<&OptionSpec> {
        if let Some(long) = token.strip_prefix("--") {
            self.options.iter().find(|o| o.name == long)
        } else {
            self.options.iter().find(|o| o.short == Some(token))
        }
    }

    fn is_short(&self, token: &str) -> bool {
        self.options.iter().any(|o| o.short == Some(token))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// The option was given without a value
    Flag,
    Text(String),
    Integer(i64),
    Float(f64),
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedArgs {
    pub positional: Vec<String>,
    /// Only set in [`ScanMode::StopAtPrompt`]
    pub prompt: Option<String>,
    pub images: Vec<PathBuf>,
    pub options: BTreeMap<&'static str, OptionValue>,
}

pub fn parse(tokens: &[String], schema: &Schema, mode: ScanMode) -> Result<ParsedArgs> {
    let mut parsed = ParsedArgs::default();
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];

        if token.starts_with("--") || schema.is_short(token) {
            let spec = schema
                .lookup(token)
                .ok_or_else(|| Error::invalid(format!("Unknown option: {token}")))?;

            let next = tokens.get(i + 1).filter(|t| !t.starts_with("--"));
            let value = match (spec.kind, next) {
                (ValueKind::Switch, _) | (_, None) => None,
                (_, Some(v)) => {
                    i += 1;
                    Some(v.as_str())
                }
            };

            match (spec.kind, value) {
                (ValueKind::Image, Some(path)) => parsed.images.push(path.into()),
                (ValueKind::Image, None) => {
                    return Err(Error::invalid(format!("--{} requires a value", spec.name)));
                }
                (_, None) => {
                    parsed.options.insert(spec.name, OptionValue::Flag);
                }
                (kind, Some(raw)) => {
                    let value = typed_value(spec.name, kind, raw)?;
                    parsed.options.insert(spec.name, value);
                }
            }
        } else if schema.detect_images && has_image_extension(token) {
            parsed.images.push(token.into());
        } else if mode == ScanMode::StopAtPrompt {
            parsed.prompt = Some(tokens[i..].join(" "));
            break;
        } else {
            parsed.positional.push(token.clone());
        }

        i += 1;
    }

    if parsed.images.len() > MAX_IMAGES {
        return Err(Error::invalid(format!(
            "Maximum {MAX_IMAGES} images supported per request. You provided {} images.",
            parsed.images.len()
        )));
    }

    debug!("Parsed arguments: {parsed:#?}");
    Ok(parsed)
}

fn typed_value(name: &str, kind: ValueKind, raw: &str) -> Result<OptionValue> {
    Ok(match kind {
        ValueKind::Integer => OptionValue::Integer(raw.parse().map_err(|_| {
            Error::invalid(format!("--{name} expects an integer, got '{raw}'"))
        })?),
        ValueKind::Float => OptionValue::Float(
            raw.parse()
                .map_err(|_| Error::invalid(format!("--{name} expects a number, got '{raw}'")))?,
        ),
        _ => OptionValue::Text(raw.to_string()),
    })
}

impl ParsedArgs {
    /// The prompt as the scan mode defines it: the captured tail, or all positionals joined.
    pub fn prompt_text(&self) -> String {
        match &self.prompt {
            Some(p) => p.clone(),
            None => self.positional.join(" "),
        }
    }

    pub fn flag(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    pub fn text(&self, name: &str) -> Result<Option<&str>> {
        match self.options.get(name) {
            None => Ok(None),
            Some(OptionValue::Text(t)) => Ok(Some(t.as_str())),
            Some(OptionValue::Flag) => Err(Error::invalid(format!("--{name} requires a value"))),
            Some(other) => Err(Error::invalid(format!(
                "--{name} expects text, got {other:?}"
            ))),
        }
    }

    pub fn path(&self, name: &str) -> Result<Option<PathBuf>> {
        Ok(self.text(name)?.map(PathBuf::from))
    }

    pub fn integer<T: TryFrom<i64>>(&self, name: &str) -> Result<Option<T>> {
        match self.options.get(name) {
            None => Ok(None),
            Some(OptionValue::Integer(n)) => T::try_from(*n)
                .map(Some)
                .map_err(|_| Error::invalid(format!("--{name} is out of range: {n}"))),
            Some(OptionValue::Flag) => Err(Error::invalid(format!("--{name} requires a value"))),
            Some(other) => Err(Error::invalid(format!(
                "--{name} expects an integer, got {other:?}"
            ))),
        }
    }

    pub fn float(&self, name: &str) -> Result<Option<f64>> {
        match self.options.get(name) {
            None => Ok(None),
            Some(OptionValue::Float(x)) => Ok(Some(*x)),
            Some(OptionValue::Integer(n)) => Ok(Some(*n as f64)),
            Some(OptionValue::Flag) => Err(Error::invalid(format!("--{name} requires a value"))),
            Some(other) => Err(Error::invalid(format!(
                "--{name} expects a number, got {other:?}"
            ))),
        }
    }

    /// Reads a text option and maps it through one of the option translation tables.
    pub fn choice<E: ValueEnum>(&self, name: &str) -> Result<Option<E>> {
        let Some(raw) = self.text(name)? else {
            return Ok(None);
        };

        E::from_str(raw, true).map(Some).map_err(|_| {
            let accepted = E::value_variants()
                .iter()
                .filter_map(|v| v.to_possible_value())
                .map(|v| v.get_name().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            Error::invalid(format!("Invalid --{name} '{raw}'. Expected one of: {accepted}"))
        })
    }
}
