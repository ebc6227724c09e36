use gemini_engine::request::OperationKind;
use indoc::indoc;
use strum::EnumString;

/// First token of a `gemini` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Command {
    Generate,
    Image,
    Upscale,
    Edit,
    Svg,
    Segment,
    #[strum(serialize = "help", serialize = "--help", serialize = "-h")]
    Help,
}

impl Command {
    pub fn operation(self) -> Option<OperationKind> {
        Some(match self {
            Command::Generate => OperationKind::Generate,
            Command::Image => OperationKind::Image,
            Command::Upscale => OperationKind::Upscale,
            Command::Edit => OperationKind::Edit,
            Command::Svg => OperationKind::Svg,
            Command::Segment => OperationKind::Segment,
            Command::Help => return None,
        })
    }
}

/// Printed to stderr while the request is in flight.
pub fn progress(kind: OperationKind) -> Option<&'static str> {
    match kind {
        OperationKind::Generate => None,
        OperationKind::Image => Some("Generating image..."),
        OperationKind::Upscale => Some("Upscaling image..."),
        OperationKind::Edit => Some("Editing image..."),
        OperationKind::Svg => Some("Generating SVG..."),
        OperationKind::Segment => Some("Segmenting image..."),
    }
}

pub const USAGE: &str = indoc! {r#"
    Gemini Operations CLI

    Usage: gemini <command> [options]

    Commands:
      generate <prompt>              Generate text content
      image <prompt> [options]       Generate images
      upscale <input> [options]      Upscale an image
      edit <input> <prompt> [opts]   Edit an image
      svg <prompt>                   Generate SVG
      segment <input>                Segment image objects
      help                           Show this message

    Text Generation:
      gemini generate "your prompt"
        --image, -i <path>           Attach an image (repeatable, up to 10)
        --model <model>              Model name (default: gemini-3-pro-preview)
        --instructions <text>        System instructions
        --max-tokens <n>             Max output tokens
        --temperature <n>            Temperature (0.0-2.0)

    Image Generation:
      gemini image "a sunset over mountains"
        --size <size>                Image size: 1K, 2K, 4K
        --aspect <ratio>             Aspect ratio: 1:1, 16:9, 9:16, 4:3, 3:4
        --negative <prompt>          Negative prompt
        --count <n>                  Number of images (1-4)
        --guidance <n>               Guidance scale
        --seed <n>                   Random seed
        --input <path>               Input image for img2img
        --output <path>              Output path (default: output_<timestamp>.png)

    Upscale:
      gemini upscale input.png
        --factor <x2|x4>             Upscale factor (default: x2)
        --format <fmt>               Output format: png, jpeg, webp
        --quality <n>                Compression quality (1-100)
        --output <path>              Output path (default: upscaled_<timestamp>.png)

    Edit:
      gemini edit input.png "add a sunset sky"
        --mask <path>                Mask image
        --mode <mode>                Edit mode: inpaint, outpaint
        --format <fmt>               Output format: png, jpeg, webp
        --quality <n>                Compression quality (1-100)
        --negative <prompt>          Negative prompt
        --count <n>                  Number of images (1-4)
        --guidance <n>               Guidance scale
        --seed <n>                   Random seed
        --output <path>              Output path (default: edited_<timestamp>.png)

    SVG:
      gemini svg "a minimalist mountain logo"
        --instructions <text>        Replace the default SVG instructions
        --output <path>              Output path (default: output.svg)

    Segmentation:
      gemini segment photo.png
        --prompt <text>              Replace the default segmentation prompt
        --output <dir>               Write one PNG mask per object into <dir>

    Environment:
      GEMINI_API_KEY                 Required
      GEMINI_API_BASE                Override the API endpoint
      RUST_LOG                       Log filter, e.g. RUST_LOG=debug
"#};

pub const ASK_USAGE: &str = indoc! {r#"
    Usage: ask-gemini [--image <path>]... <your question>

    Examples:
      ask-gemini 'What is the best color scheme for web3 sites?'
      ask-gemini --image screenshot.png 'Analyze this design'
      ask-gemini screenshot.png 'What Three.js elements are shown?'
      ask-gemini current.png target.png 'What are the differences?'

    Supports up to 10 images per request.
"#};

pub const IMAGE_USAGE: &str = indoc! {r#"
    Usage: gemini-image "prompt" [--size 1K|2K|4K] [--aspect 1:1|16:9|9:16|4:3|3:4]
                        [--negative <prompt>] [--count 1-4] [--guidance <n>] [--seed <n>]
                        [--input <path>] [--output <path>]
"#};

pub const UPSCALE_USAGE: &str = indoc! {"
    Usage: gemini-upscale <input> [--factor x2|x4] [--format png|jpeg|webp] [--quality 1-100]
                          [--output <path>]
"};

pub const EDIT_USAGE: &str = indoc! {r#"
    Usage: gemini-edit <input> "prompt" [--mask <path>] [--mode inpaint|outpaint]
                       [--format png|jpeg|webp] [--quality 1-100] [--negative <prompt>]
                       [--count 1-4] [--guidance <n>] [--seed <n>] [--output <path>]
"#};

pub const SVG_USAGE: &str = indoc! {r#"
    Usage: gemini-svg "prompt" [--instructions <text>] [--output <path>]
"#};

pub const SEGMENT_USAGE: &str = indoc! {"
    Usage: gemini-segment <input> [--prompt <text>] [--output <dir>]
"};

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn commands_parse() {
        assert_eq!(Command::from_str("image"), Ok(Command::Image));
        assert_eq!(Command::from_str("--help"), Ok(Command::Help));
        assert_eq!(Command::from_str("-h"), Ok(Command::Help));
        assert!(Command::from_str("paint").is_err());
        assert!(Command::from_str("").is_err());
    }

    #[test]
    fn every_operation_has_a_command() {
        for kind in OperationKind::iter() {
            let command = Command::from_str(&kind.to_string()).unwrap();
            assert_eq!(command.operation(), Some(kind));
        }
        assert_eq!(Command::Help.operation(), None);
    }
}
