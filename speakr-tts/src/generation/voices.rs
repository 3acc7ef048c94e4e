//! Prebuilt voices and speaking styles
//!
//! A style is a natural-language prefix prepended to the text; the speech
//! model picks up the tone from it.

/// Speaking style shared by all voices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceStyle {
    /// Display name
    pub name: &'static str,
    /// Short command-line key
    pub key: &'static str,
    /// Prompt prefix ("" for the default style)
    pub prefix: &'static str,
}

impl VoiceStyle {
    /// Prepend this style's prefix to `text`
    pub fn compose_prompt(&self, text: &str) -> String {
        if self.prefix.is_empty() {
            text.to_string()
        } else {
            format!("{}{}", self.prefix, text)
        }
    }
}

/// Prebuilt voice of the speech API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voice {
    /// Display name
    pub name: &'static str,
    /// Voice name sent to the API
    pub value: &'static str,
    /// Available styles, first is the default
    pub styles: &'static [VoiceStyle],
}

impl Voice {
    /// First listed style
    pub fn default_style(&self) -> &'static VoiceStyle {
        self.styles.first().unwrap_or(&COMMON_STYLES[0])
    }

    /// Look up a style by key or display name (case-insensitive)
    pub fn find_style(&self, name: &str) -> Option<&'static VoiceStyle> {
        let name = name.trim();
        self.styles
            .iter()
            .find(|style| style.key.eq_ignore_ascii_case(name) || style.name.eq_ignore_ascii_case(name))
    }
}

pub const COMMON_STYLES: &[VoiceStyle] = &[
    VoiceStyle {
        name: "Default",
        key: "default",
        prefix: "",
    },
    VoiceStyle {
        name: "Santai (Cheerful)",
        key: "cheerful",
        prefix: "Say cheerfully: ",
    },
    VoiceStyle {
        name: "Profesional (Formal)",
        key: "formal",
        prefix: "Say in a formal and professional tone: ",
    },
    VoiceStyle {
        name: "Pembaca Berita (Newscaster)",
        key: "newscaster",
        prefix: "Say in a newscaster voice: ",
    },
    VoiceStyle {
        name: "Humoris (Humorous)",
        key: "humorous",
        prefix: "Say in a humorous and funny tone: ",
    },
    VoiceStyle {
        name: "Wartawan (Reporter)",
        key: "reporter",
        prefix: "Say in an urgent, reporting tone: ",
    },
];

pub const VOICES: &[Voice] = &[
    Voice {
        name: "Kore (Female)",
        value: "Kore",
        styles: COMMON_STYLES,
    },
    Voice {
        name: "Puck (Male)",
        value: "Puck",
        styles: COMMON_STYLES,
    },
    Voice {
        name: "Charon (Male)",
        value: "Charon",
        styles: COMMON_STYLES,
    },
    Voice {
        name: "Fenrir (Male)",
        value: "Fenrir",
        styles: COMMON_STYLES,
    },
    Voice {
        name: "Zephyr (Female)",
        value: "Zephyr",
        styles: COMMON_STYLES,
    },
];

/// First listed voice
pub fn default_voice() -> &'static Voice {
    &VOICES[0]
}

/// Look up a voice by its API value (case-insensitive)
pub fn find_voice(value: &str) -> Option<&'static Voice> {
    let value = value.trim();
    VOICES.iter().find(|voice| voice.value.eq_ignore_ascii_case(value))
}
