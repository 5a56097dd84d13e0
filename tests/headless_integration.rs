use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use coach::assistant::{spawn_answer, Assistant};
use coach::playback::AudioPlayer;
use coach::runtime::{CoachEvent, FixedTicker, Runner, TestEventSource};
use coach::schedule::{Phase, StudyPlan};
use coach::session::{Role, SessionContext};
use coach::speech::{SpeechError, SpeechSynthesizer, VoiceLocale};
use coach::tutor::{
    build_instruction, StudentProfile, Subject, TextGenerator, TutorError, TutorRequest,
};

struct ScriptedTutor {
    seen: Arc<Mutex<Vec<(String, String)>>>,
}

impl TextGenerator for ScriptedTutor {
    fn generate(&self, instruction: &str, prompt: &str) -> Result<String, TutorError> {
        self.seen
            .lock()
            .unwrap()
            .push((instruction.to_string(), prompt.to_string()));
        if prompt.contains("quota") {
            return Err(TutorError::Api {
                status: 429,
                message: "Resource has been exhausted".into(),
            });
        }
        Ok("### Golden Rules\n\n1. **Debit** the receiver\n2. _Credit_ the giver\n---".into())
    }
}

struct CapturingSynth {
    heard: Arc<Mutex<Vec<(String, VoiceLocale)>>>,
}

impl SpeechSynthesizer for CapturingSynth {
    fn synthesize(&self, text: &str, locale: &VoiceLocale) -> Result<Vec<u8>, SpeechError> {
        self.heard
            .lock()
            .unwrap()
            .push((text.to_string(), locale.clone()));
        Ok(b"ID3".to_vec())
    }
}

struct CapturingSpeaker {
    played: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl AudioPlayer for CapturingSpeaker {
    fn play(&self, audio: Vec<u8>) -> Result<(), SpeechError> {
        self.played.lock().unwrap().push(audio);
        Ok(())
    }
}

// Drive the lib pieces the binary wires together: a question goes out on a
// worker thread, the reply comes back through the runner's queue.
#[test]
fn headless_question_roundtrip_with_voice() {
    let dir = tempfile::tempdir().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let heard = Arc::new(Mutex::new(Vec::new()));
    let played = Arc::new(Mutex::new(Vec::new()));
    let assistant = Arc::new(
        Assistant::new(
            Box::new(ScriptedTutor { seen: seen.clone() }),
            Box::new(CapturingSynth {
                heard: heard.clone(),
            }),
            Box::new(CapturingSpeaker {
                played: played.clone(),
            }),
        )
        .with_speech_dir(Some(dir.path().join("speech"))),
    );

    let mut session = SessionContext::new(StudyPlan::default(), Subject::Accountancy);
    let runner = Runner::new(
        TestEventSource::new(),
        FixedTicker::new(Duration::from_millis(5)),
    );

    let prompt = "Explain the golden rules of accounting";
    session.push_user(prompt);
    let request = TutorRequest {
        prompt: prompt.into(),
        instruction: build_instruction(&StudentProfile::default(), session.subject, false),
        voice: Some(VoiceLocale::default()),
    };
    spawn_answer(assistant, request, runner.sender());

    let mut reply = None;
    for _ in 0..400u32 {
        if let CoachEvent::Reply(result) = runner.step() {
            reply = Some(result);
            break;
        }
    }
    let reply = reply.expect("no reply arrived").expect("reply failed");
    session.push_assistant(reply.text.clone());

    let (instruction, sent_prompt) = seen.lock().unwrap()[0].clone();
    assert_eq!(sent_prompt, prompt);
    assert!(instruction.starts_with("You are an Indian Commerce Tutor for Priya Sharma, Class 11."));

    let heard = heard.lock().unwrap();
    assert_eq!(
        heard[0].0,
        "Golden Rules 1. Debit the receiver 2. Credit the giver"
    );
    assert_eq!(heard[0].1.tld, "co.in");

    assert_eq!(played.lock().unwrap().as_slice(), [b"ID3".to_vec()]);
    let saved = reply.speech.unwrap().unwrap().saved_to.unwrap();
    assert_eq!(std::fs::read(saved).unwrap(), b"ID3");
    assert_eq!(session.messages.len(), 3);
    assert_eq!(session.messages[2].role, Role::Assistant);
}

#[test]
fn headless_failure_leaves_session_intact() {
    let assistant = Arc::new(Assistant::new(
        Box::new(ScriptedTutor {
            seen: Arc::new(Mutex::new(Vec::new())),
        }),
        Box::new(CapturingSynth {
            heard: Arc::new(Mutex::new(Vec::new())),
        }),
        Box::new(CapturingSpeaker {
            played: Arc::new(Mutex::new(Vec::new())),
        }),
    ));
    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let mut session = SessionContext::new(StudyPlan::default(), Subject::Economics);
    session.start_study(t0);
    session.push_user("over quota?");
    let before = session.messages.clone();

    let runner = Runner::new(
        TestEventSource::new(),
        FixedTicker::new(Duration::from_millis(5)),
    );
    spawn_answer(
        assistant,
        TutorRequest {
            prompt: "over quota?".into(),
            instruction: build_instruction(&StudentProfile::default(), Subject::Economics, true),
            voice: None,
        },
        runner.sender(),
    )
    .join()
    .unwrap();

    match runner.step() {
        CoachEvent::Reply(Err(TutorError::Api { status, .. })) => assert_eq!(status, 429),
        other => panic!("expected an API error, got {:?}", other),
    }
    assert_eq!(session.messages, before);
    let status = session.status(t0 + ChronoDuration::minutes(33)).unwrap();
    assert_eq!(status.phase, Phase::OnBreak);
}

#[test]
fn headless_ticks_keep_flowing_without_events() {
    let runner = Runner::new(
        TestEventSource::new(),
        FixedTicker::new(Duration::from_millis(2)),
    );
    for _ in 0..5 {
        assert!(matches!(runner.step(), CoachEvent::Tick));
    }
}
