use std::{env, io::Write, path::Path, process};

use color_eyre::Result;
use gemini_engine::{
    args::ScanMode,
    config::{Config, Models},
    credential::Credential,
    dispatch::{Outcome, dispatch},
    gemini::{GeminiClient, Service},
    request::{InvocationRequest, OperationKind},
    response::{Segmentation, ServiceResponse, Usage},
    writer,
};
use log::info;

pub mod cli;

/// Arguments of this process, minus the program name.
pub fn tokens() -> Vec<String> {
    env::args().skip(1).collect()
}

/// Shared `main` of the single-operation binaries: usage on `help`/no arguments, otherwise one
/// invocation.
pub async fn run_script(kind: OperationKind, usage: &str) -> Result<()> {
    let tokens = tokens();
    match tokens.first().map(String::as_str) {
        None => {
            eprint!("{usage}");
            process::exit(1);
        }
        Some("help" | "--help" | "-h") => {
            print!("{usage}");
            return Ok(());
        }
        _ => {}
    }

    let request = InvocationRequest::parse(kind, &tokens, ScanMode::Exhaustive)?;
    invoke(&request).await
}

/// Credential check, client construction and [`execute`] against the real service.
pub async fn invoke(request: &InvocationRequest) -> Result<()> {
    let config = Config::load()?;
    let credential = Credential::from_env()?;
    let client = GeminiClient::new(credential, &config);

    execute(request, &config.models, &client, &mut std::io::stdout()).await
}

/// Runs one request and reports the result on `out`. Files are written along the way.
pub async fn execute<S: Service + ?Sized>(
    request: &InvocationRequest,
    models: &Models,
    service: &S,
    out: &mut impl Write,
) -> Result<()> {
    if let Some(line) = cli::progress(request.kind()) {
        eprintln!("{line}\n");
    }

    match dispatch(request, models, service).await? {
        Outcome::Response(res) => report_response(request, res, out),
        Outcome::Segmentation(seg) => report_segmentation(request.output(), seg, out),
    }
}

fn report_response(
    request: &InvocationRequest,
    res: ServiceResponse,
    out: &mut impl Write,
) -> Result<()> {
    let kind = request.kind();
    if kind == OperationKind::Generate {
        writeln!(out, "{}", res.text.as_deref().unwrap_or_default())?;
    } else {
        if let Some(text) = res.text.as_deref().filter(|t| !t.trim().is_empty()) {
            writeln!(out, "Model comment: {text}\n")?;
        }

        let paths = writer::write_artifacts(&res.artifacts, request.output(), kind.output_prefix())?;
        info!("Wrote {} file(s)", paths.len());
        for path in paths {
            writeln!(out, "✓ Saved: {}", path.display())?;
        }
    }

    report_usage(res.usage, out)
}

fn report_segmentation(
    output_dir: Option<&Path>,
    seg: Segmentation,
    out: &mut impl Write,
) -> Result<()> {
    writeln!(out, "Found {} objects:\n", seg.masks.len())?;
    for (i, mask) in seg.masks.iter().enumerate() {
        let [a, b, c, d] = mask.bounding_box;
        writeln!(out, "{}. {}", i + 1, mask.label)?;
        writeln!(out, "   Box: [{a}, {b}, {c}, {d}]")?;
    }

    if let Some(dir) = output_dir {
        let paths = writer::write_masks(&seg.masks, dir)?;
        writeln!(out, "\n✓ Saved {} masks to: {}", paths.len(), dir.display())?;
    }

    report_usage(seg.usage, out)
}

fn report_usage(usage: Option<Usage>, out: &mut impl Write) -> Result<()> {
    if let Some(u) = usage {
        writeln!(out, "\n---")?;
        writeln!(
            out,
            "Tokens: {} prompt, {} completion, {} total",
            u.prompt_units, u.completion_units, u.total_units
        )?;
    }
    Ok(())
}
