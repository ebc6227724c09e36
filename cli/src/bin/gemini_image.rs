use color_eyre::Result;
use gemini_engine::request::OperationKind;
use gemini_ops::cli::IMAGE_USAGE;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    pretty_env_logger::init();

    gemini_ops::run_script(OperationKind::Image, IMAGE_USAGE).await
}
