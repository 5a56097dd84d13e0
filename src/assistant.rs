use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::playback::AudioPlayer;
use crate::runtime::CoachEvent;
use crate::speech::{self, SpeechError, SpeechSynthesizer};
use crate::speech_text::normalize_for_speech;
use crate::tutor::{TextGenerator, TutorError, TutorRequest};

/// A reply that was read aloud; `saved_to` is set when a copy was kept on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spoken {
    pub saved_to: Option<PathBuf>,
}

/// Generated answer plus the outcome of speaking it, when voice was on.
#[derive(Debug)]
pub struct Reply {
    pub text: String,
    pub speech: Option<Result<Spoken, SpeechError>>,
}

/// Pairs the text generator with the speech pipeline for one question.
pub struct Assistant {
    generator: Box<dyn TextGenerator>,
    synthesizer: Box<dyn SpeechSynthesizer>,
    player: Box<dyn AudioPlayer>,
    speech_dir: Option<PathBuf>,
}

impl Assistant {
    pub fn new(
        generator: Box<dyn TextGenerator>,
        synthesizer: Box<dyn SpeechSynthesizer>,
        player: Box<dyn AudioPlayer>,
    ) -> Self {
        Self {
            generator,
            synthesizer,
            player,
            speech_dir: None,
        }
    }

    /// Also write every spoken reply to `dir` as an MP3.
    pub fn with_speech_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.speech_dir = dir;
        self
    }

    pub fn answer(&self, request: &TutorRequest) -> Result<Reply, TutorError> {
        let text = self
            .generator
            .generate(&request.instruction, &request.prompt)?;
        log::info!("received reply of {} chars", text.chars().count());

        let speech = request
            .voice
            .as_ref()
            .map(|locale| -> Result<Spoken, SpeechError> {
                let spoken = normalize_for_speech(&text);
                if spoken.is_empty() {
                    return Err(SpeechError::Empty);
                }
                let audio = self.synthesizer.synthesize(&spoken, locale)?;
                let saved_to = match &self.speech_dir {
                    Some(dir) => Some(speech::save_speech(dir, &audio)?),
                    None => None,
                };
                self.player.play(audio)?;
                Ok(Spoken { saved_to })
            });
        if let Some(Err(e)) = &speech {
            log::warn!("speech failed: {}", e);
        }

        Ok(Reply { text, speech })
    }
}

/// Answer on a worker thread and post the result back to the event loop.
pub fn spawn_answer(
    assistant: Arc<Assistant>,
    request: TutorRequest,
    tx: Sender<CoachEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let result = assistant.answer(&request);
        if let Err(e) = &result {
            log::error!("tutor request failed: {}", e);
        }
        // receiver gone means the app is shutting down
        let _ = tx.send(CoachEvent::Reply(result));
    })
}
