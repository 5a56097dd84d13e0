use std::io::Cursor;
use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;
use std::thread;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use crate::speech::SpeechError;

/// Plays synthesized speech. `play` returns once playback has started.
pub trait AudioPlayer: Send + Sync {
    fn play(&self, audio: Vec<u8>) -> Result<(), SpeechError>;
}

struct PlayRequest {
    audio: Vec<u8>,
    started: Sender<Result<(), String>>,
}

/// Speaker output through rodio, straight from memory.
///
/// `OutputStream` is not `Send`, so the stream and the current sink live on a
/// dedicated thread spawned on first use. A new reply cuts off the previous
/// one if it is still playing.
pub struct RodioPlayer {
    tx: Mutex<Option<Sender<PlayRequest>>>,
}

impl RodioPlayer {
    pub fn new() -> Self {
        Self {
            tx: Mutex::new(None),
        }
    }

    fn ensure_thread(&self) -> Result<Sender<PlayRequest>, SpeechError> {
        let mut guard = self.tx.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<PlayRequest>();
        thread::Builder::new()
            .name("speech-audio".to_string())
            .spawn(move || {
                let mut output: Option<(OutputStream, OutputStreamHandle)> = None;
                let mut sink: Option<Sink> = None;

                while let Ok(request) = rx.recv() {
                    if let Some(old) = sink.take() {
                        old.stop();
                    }
                    let result = start(&mut output, request.audio).map(|started| {
                        sink = Some(started);
                    });
                    let _ = request.started.send(result);
                }
            })?;

        *guard = Some(tx.clone());
        Ok(tx)
    }

    fn forget_thread(&self) {
        *self.tx.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl Default for RodioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioPlayer for RodioPlayer {
    fn play(&self, audio: Vec<u8>) -> Result<(), SpeechError> {
        if audio.is_empty() {
            return Err(SpeechError::Empty);
        }
        let tx = self.ensure_thread()?;
        let (started_tx, started_rx) = mpsc::channel();
        let sent = tx.send(PlayRequest {
            audio,
            started: started_tx,
        });
        let started = match sent {
            Ok(()) => started_rx.recv().ok(),
            Err(_) => None,
        };
        match started {
            Some(result) => result.map_err(SpeechError::Playback),
            None => {
                // the audio thread died; spawn a fresh one next time
                self.forget_thread();
                Err(SpeechError::Playback("audio thread stopped".to_string()))
            }
        }
    }
}

/// Decode first so a bad payload is reported even without a sound device.
fn start(
    output: &mut Option<(OutputStream, OutputStreamHandle)>,
    audio: Vec<u8>,
) -> Result<Sink, String> {
    let source =
        Decoder::new(Cursor::new(audio)).map_err(|e| format!("could not decode audio: {}", e))?;

    if output.is_none() {
        let opened =
            OutputStream::try_default().map_err(|e| format!("no audio output: {}", e))?;
        *output = Some(opened);
    }
    let handle = match output.as_ref() {
        Some((_, handle)) => handle,
        None => return Err("no audio output".to_string()),
    };

    let sink = Sink::try_new(handle).map_err(|e| format!("could not open audio sink: {}", e))?;
    sink.append(source);
    log::debug!("speech playback started");
    Ok(sink)
}
