use anyhow::{Context, Result, anyhow};
use tracing::info;

const TTS_ENDPOINT: &str = "https://translate.google.com/translate_tts";

// The endpoint rejects long inputs, so text is synthesized chunk by chunk.
const MAX_CHUNK_CHARS: usize = 200;

/// Network text-to-speech client. Each chunk of text becomes one GET against
/// the translate endpoint; the MP3 streams come back in order and are
/// concatenated into a single clip.
#[derive(Debug, Clone)]
pub struct SpeechSynthesizer {
    lang: String,
}

impl SpeechSynthesizer {
    pub fn new(lang: impl Into<String>) -> Self {
        Self { lang: lang.into() }
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("cannot synthesize empty text"));
        }

        let client = reqwest::Client::new();
        let chunks = chunk_text(trimmed, MAX_CHUNK_CHARS);
        let total = chunks.len();
        info!("tts: synthesizing {} chunk(s)", total);

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let params = [
                ("ie", "UTF-8".to_string()),
                ("client", "tw-ob".to_string()),
                ("tl", self.lang.clone()),
                ("q", chunk.clone()),
                ("textlen", chunk.chars().count().to_string()),
                ("idx", idx.to_string()),
                ("total", total.to_string()),
            ];
            let response = client
                .get(TTS_ENDPOINT)
                .query(&params)
                .send()
                .await
                .with_context(|| "text-to-speech request failed")?;
            let status = response.status();
            if !status.is_success() {
                return Err(anyhow!("text-to-speech service error ({})", status));
            }
            let bytes = response
                .bytes()
                .await
                .with_context(|| "failed to read text-to-speech response")?;
            if !is_mp3_stream(&bytes) {
                return Err(anyhow!("text-to-speech service returned non-MP3 data"));
            }
            audio.extend_from_slice(&bytes);
        }
        Ok(audio)
    }
}

/// An MP3 stream starts with either an ID3 tag or a frame sync.
pub fn is_mp3_stream(bytes: &[u8]) -> bool {
    if bytes.len() < 3 {
        return false;
    }
    if bytes.starts_with(b"ID3") {
        return true;
    }
    bytes[0] == 0xff && (bytes[1] & 0xe0) == 0xe0
}

fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if word_len > max_chars {
            if count > 0 {
                chunks.push(std::mem::take(&mut current));
                count = 0;
            }
            // Hard-split an oversized token; the trailing piece keeps
            // accepting following words.
            let mut piece = String::new();
            let mut piece_len = 0usize;
            for ch in word.chars() {
                if piece_len == max_chars {
                    chunks.push(std::mem::take(&mut piece));
                    piece_len = 0;
                }
                piece.push(ch);
                piece_len += 1;
            }
            current = piece;
            count = piece_len;
            continue;
        }

        let sep = if count > 0 { 1 } else { 0 };
        if count + sep + word_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
        if count > 0 {
            current.push(' ');
            count += 1;
        }
        current.push_str(word);
        count += word_len;
    }

    if count > 0 {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::{chunk_text, is_mp3_stream};

    #[test]
    fn short_text_stays_in_one_chunk() {
        assert_eq!(chunk_text("exit here", 200), vec!["exit here"]);
    }

    #[test]
    fn chunks_break_on_word_boundaries_within_the_limit() {
        let text = "one two three four five six seven eight nine ten";
        let chunks = chunk_text(text, 18);
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 18));
        assert!(chunks.iter().all(|chunk| !chunk.is_empty()));
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn oversized_tokens_are_hard_split() {
        let token = "x".repeat(45);
        let chunks = chunk_text(&token, 20);
        assert_eq!(chunks, vec!["x".repeat(20), "x".repeat(20), "x".repeat(5)]);
    }

    #[test]
    fn trailing_piece_of_oversized_token_accepts_following_words() {
        let text = format!("{} tail", "y".repeat(25));
        let chunks = chunk_text(&text, 20);
        assert_eq!(chunks, vec!["y".repeat(20), format!("{} tail", "y".repeat(5))]);
    }

    #[test]
    fn mp3_detection_accepts_id3_and_frame_sync() {
        assert!(is_mp3_stream(b"ID3\x04\x00"));
        assert!(is_mp3_stream(&[0xff, 0xfb, 0x90, 0x64]));
    }

    #[test]
    fn mp3_detection_rejects_other_payloads() {
        assert!(!is_mp3_stream(b""));
        assert!(!is_mp3_stream(b"<html>rate limited</html>"));
        assert!(!is_mp3_stream(&[0xff, 0x1f, 0x00]));
    }
}
