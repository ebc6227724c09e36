use std::{process, str::FromStr};

use color_eyre::Result;
use gemini_engine::{args::ScanMode, request::InvocationRequest};
use gemini_ops::cli::{Command, USAGE};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    pretty_env_logger::init();

    let tokens = gemini_ops::tokens();
    let Some((first, rest)) = tokens.split_first() else {
        eprintln!("No command given\n");
        eprint!("{USAGE}");
        process::exit(1);
    };

    let Ok(command) = Command::from_str(first) else {
        eprintln!("Unknown command: {first}\n");
        eprint!("{USAGE}");
        process::exit(1);
    };

    let Some(kind) = command.operation() else {
        print!("{USAGE}");
        return Ok(());
    };

    let request = InvocationRequest::parse(kind, rest, ScanMode::Exhaustive)?;
    gemini_ops::invoke(&request).await
}
