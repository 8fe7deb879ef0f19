pub mod credential;
pub mod data;
pub mod describer;
pub mod logging;
pub mod ocr;
pub mod server;
pub mod settings;
pub mod tts;

pub use credential::Credential;
pub use data::UploadedImage;
pub use describer::SceneDescriber;
pub use server::run_server;
pub use tts::SpeechSynthesizer;
