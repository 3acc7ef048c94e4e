//! Scripted speech generator
//!
//! Returns a fixed payload (or a fixed failure) and records every
//! `(prompt, voice)` pair it was asked for.

use async_trait::async_trait;
use speakr_tts::audio::EncodedAudio;
use speakr_tts::generation::{GeneratedSpeech, SpeechGenerator};
use speakr_tts::{Error, Result};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
enum Reply {
    Audio {
        base64: String,
        mime_type: Option<String>,
    },
    Fail(String),
}

#[derive(Clone)]
pub struct FakeGenerator {
    reply: Reply,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeGenerator {
    pub fn returning(base64: &str) -> Self {
        Self::with_reply(Reply::Audio {
            base64: base64.to_string(),
            mime_type: Some("audio/L16;codec=pcm;rate=24000".to_string()),
        })
    }

    pub fn returning_with_mime(base64: &str, mime_type: &str) -> Self {
        Self::with_reply(Reply::Audio {
            base64: base64.to_string(),
            mime_type: Some(mime_type.to_string()),
        })
    }

    pub fn failing(message: &str) -> Self {
        Self::with_reply(Reply::Fail(message.to_string()))
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Recorded `(prompt, voice)` pairs
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str, voice_name: &str) -> Result<GeneratedSpeech> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), voice_name.to_string()));

        match &self.reply {
            Reply::Audio { base64, mime_type } => Ok(GeneratedSpeech::new(
                EncodedAudio::from(base64.as_str()),
                mime_type.clone(),
            )),
            Reply::Fail(message) => Err(Error::Generation(message.clone())),
        }
    }
}
