use crate::describer::SceneDescriber;
use crate::settings::Settings;
use crate::tts::SpeechSynthesizer;

pub(crate) struct ServerState {
    pub(crate) settings: Settings,
    // None when no credential was loaded; the describer routes answer
    // "assistant unavailable" in that case.
    pub(crate) describer: Option<SceneDescriber>,
    pub(crate) synthesizer: SpeechSynthesizer,
}
