use std::process;

use color_eyre::Result;
use gemini_engine::{
    args::ScanMode,
    request::{InvocationRequest, OperationKind},
};
use gemini_ops::cli::ASK_USAGE;

const DEFAULT_TEMPERATURE: f32 = 0.7;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    pretty_env_logger::init();

    let tokens = gemini_ops::tokens();
    match tokens.first().map(String::as_str) {
        None => {
            eprint!("{ASK_USAGE}");
            process::exit(1);
        }
        // a question may well start with the word "help"
        Some("--help" | "-h") => {
            print!("{ASK_USAGE}");
            return Ok(());
        }
        _ => {}
    }

    let mut request =
        InvocationRequest::parse(OperationKind::Generate, &tokens, ScanMode::StopAtPrompt)?;
    if let InvocationRequest::Generate(req) = &mut request {
        req.temperature.get_or_insert(DEFAULT_TEMPERATURE);
        if !req.images.is_empty() {
            eprintln!("Attaching {} image(s)...\n", req.images.len());
        }
    }

    gemini_ops::invoke(&request).await
}
