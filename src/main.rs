use std::path::Path;

use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "vision-assist-rust",
    version,
    about = "Describe, read and speak uploaded images for visually impaired users"
)]
struct Cli {
    /// Address to serve the web UI and API on (overrides settings)
    #[arg(short = 'a', long = "addr")]
    addr: Option<String>,

    /// API key file for the scene assistant (overrides settings)
    #[arg(short = 'k', long = "key-file")]
    key_file: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Show the languages the local OCR engine supports and exit
    #[arg(long = "show-ocr-languages")]
    show_ocr_languages: bool,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    vision_assist_rust::logging::init(cli.verbose)?;

    if cli.show_ocr_languages {
        for lang in vision_assist_rust::ocr::list_tesseract_languages()? {
            println!("{}", lang);
        }
        return Ok(());
    }

    let settings_path = cli.read_settings.as_deref().map(Path::new);
    let settings = vision_assist_rust::settings::load_settings(settings_path)?;

    let key_file = cli
        .key_file
        .as_deref()
        .unwrap_or(&settings.assistant_key_file)
        .to_string();
    let credential = vision_assist_rust::Credential::load(Path::new(&key_file))?;
    if credential.is_none() {
        eprintln!(
            "warning: API key file '{}' not found; scene description is disabled",
            key_file
        );
    }

    let addr = cli
        .addr
        .clone()
        .unwrap_or_else(|| settings.server_addr.clone());
    vision_assist_rust::run_server(settings, credential, addr).await
}
