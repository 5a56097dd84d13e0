use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Longest piece of text the translate_tts endpoint accepts per request.
pub const MAX_CHUNK_CHARS: usize = 100;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("nothing to speak")]
    Empty,
    #[error("speech request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not save speech: {0}")]
    Io(#[from] io::Error),
    #[error("could not play speech: {0}")]
    Playback(String),
}

/// Language plus regional host; the host selects the accent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceLocale {
    pub language: String,
    pub tld: String,
}

impl Default for VoiceLocale {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            tld: "co.in".to_string(),
        }
    }
}

impl VoiceLocale {
    pub fn accent(&self) -> &str {
        match self.tld.as_str() {
            "co.in" => "Indian",
            "com" | "us" => "American",
            "co.uk" => "British",
            "com.au" => "Australian",
            "ca" => "Canadian",
            other => other,
        }
    }
}

pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize(&self, text: &str, locale: &VoiceLocale) -> Result<Vec<u8>, SpeechError>;
}

/// Google Translate's speech endpoint, the same one gTTS uses.
pub struct GoogleTts {
    client: reqwest::blocking::Client,
}

impl GoogleTts {
    pub fn new() -> Result<Self, SpeechError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

impl SpeechSynthesizer for GoogleTts {
    fn synthesize(&self, text: &str, locale: &VoiceLocale) -> Result<Vec<u8>, SpeechError> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SpeechError::Empty);
        }

        let url = format!("https://translate.google.{}/translate_tts", locale.tld);
        let total = chunks.len().to_string();
        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let idx = idx.to_string();
            let textlen = chunk.chars().count().to_string();
            let bytes = self
                .client
                .get(&url)
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", locale.language.as_str()),
                    ("q", chunk.as_str()),
                    ("total", total.as_str()),
                    ("idx", idx.as_str()),
                    ("textlen", textlen.as_str()),
                ])
                .send()?
                .error_for_status()?
                .bytes()?;
            // MP3 frames concatenate into a valid stream
            audio.extend_from_slice(&bytes);
        }
        log::debug!("synthesized {} chunk(s), {} bytes", chunks.len(), audio.len());
        Ok(audio)
    }
}

/// Split text at whitespace into pieces of at most `max_chars` characters.
/// Words longer than `max_chars` are split mid-word.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() {
            word_len
        } else {
            current_len + 1 + word_len
        };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Keep a copy of synthesized audio in `dir` under a timestamped name.
pub fn save_speech(dir: &Path, audio: &[u8]) -> Result<PathBuf, SpeechError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!(
        "reply-{}.mp3",
        Utc::now().format("%Y%m%d-%H%M%S%.3f")
    ));
    fs::write(&path, audio)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn test_default_locale_is_indian_english() {
        let locale = VoiceLocale::default();
        assert_eq!(locale.language, "en");
        assert_eq!(locale.accent(), "Indian");
    }

    #[test]
    fn test_chunk_short_text() {
        assert_eq!(chunk_text("hello world", 100), vec!["hello world"]);
        assert!(chunk_text("", 100).is_empty());
        assert!(chunk_text("   ", 100).is_empty());
    }

    #[test]
    fn test_chunk_splits_at_whitespace() {
        let chunks = chunk_text("aaa bbb ccc ddd", 7);
        assert_eq!(chunks, vec!["aaa bbb", "ccc ddd"]);
    }

    #[test]
    fn test_chunk_long_word() {
        let chunks = chunk_text("hi abcdefghij yo", 4);
        assert_eq!(chunks, vec!["hi", "abcd", "efgh", "ij", "yo"]);
    }

    #[test]
    fn test_chunks_respect_limit() {
        let text = "Debit is what comes in and credit is what goes out. ".repeat(20);
        let chunks = chunk_text(&text, MAX_CHUNK_CHARS);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= MAX_CHUNK_CHARS);
        }
        assert_eq!(chunks.join(" "), text.trim());
    }

    #[test]
    fn test_chunk_counts_chars_not_bytes() {
        let chunks = chunk_text("₹₹₹ ₹₹₹", 7);
        assert_eq!(chunks, vec!["₹₹₹ ₹₹₹"]);
    }

    #[test]
    fn test_save_speech() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("speech");
        let path = save_speech(&target, b"ID3fake").unwrap();
        assert!(path.starts_with(&target));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("mp3"));
        assert_eq!(fs::read(&path).unwrap(), b"ID3fake");
    }

    #[test]
    fn test_save_speech_into_file_path_fails() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"x").unwrap();
        assert_matches!(save_speech(&blocker, b"audio"), Err(SpeechError::Io(_)));
    }
}
