use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::speech::VoiceLocale;

#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("request to the tutor service failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("tutor service returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("no model supporting generateContent is available")]
    NoModel,
    #[error("the tutor declined to answer ({0})")]
    Blocked(String),
    #[error("the tutor returned an empty answer")]
    EmptyResponse,
}

/// A hosted text model: role instruction plus user prompt in, text out.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, instruction: &str, prompt: &str) -> Result<String, TutorError>;
}

#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
pub enum Subject {
    #[default]
    Accountancy,
    Economics,
    #[strum(to_string = "Business Studies")]
    BusinessStudies,
}

impl Subject {
    pub const ALL: [Subject; 3] = [
        Subject::Accountancy,
        Subject::Economics,
        Subject::BusinessStudies,
    ];

    pub fn focus(&self) -> &'static str {
        match self {
            Subject::Accountancy => "Focus on Journal Entries, Ledgers. Use Tables.",
            Subject::Economics => "Focus on Graphs and differences.",
            Subject::BusinessStudies => "Focus on Case Studies and Keywords.",
        }
    }

    pub fn next(&self) -> Subject {
        let idx = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn previous(&self) -> Subject {
        let idx = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
pub enum StudentClass {
    #[default]
    #[strum(to_string = "Class 11")]
    #[value(name = "11")]
    Class11,
    #[strum(to_string = "Class 12")]
    #[value(name = "12")]
    Class12,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub name: String,
    pub class: StudentClass,
}

impl Default for StudentProfile {
    fn default() -> Self {
        Self {
            name: "Priya Sharma".to_string(),
            class: StudentClass::Class11,
        }
    }
}

pub const DETAILED_INSTRUCTION: &str = "Give detailed explanations with examples.";
pub const CONCISE_INSTRUCTION: &str = "BE EXTREMELY CONCISE. Summarize in less than 60 words.";

/// Role prefix sent with every question.
pub fn build_instruction(profile: &StudentProfile, subject: Subject, concise: bool) -> String {
    let length = if concise {
        CONCISE_INSTRUCTION
    } else {
        DETAILED_INSTRUCTION
    };
    format!(
        "You are an Indian Commerce Tutor for {}, {}.\n\
         SUBJECT: {}.\n\
         INSTRUCTION: {}\n\
         RULES: {} Strictly NCERT context.",
        profile.name,
        profile.class,
        subject,
        length,
        subject.focus()
    )
}

/// Everything a worker needs to answer one question, captured at submit time.
#[derive(Debug, Clone, PartialEq)]
pub struct TutorRequest {
    pub prompt: String,
    pub instruction: String,
    pub voice: Option<VoiceLocale>,
}
