use color_eyre::Result;
use gemini_engine::request::OperationKind;
use gemini_ops::cli::SEGMENT_USAGE;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    pretty_env_logger::init();

    gemini_ops::run_script(OperationKind::Segment, SEGMENT_USAGE).await
}
