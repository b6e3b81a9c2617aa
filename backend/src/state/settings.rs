//! Assistant settings
//!
//! The flat key/value surface that the settings form edits and that every
//! interpreter call receives. Every field has a documented default, so a
//! partial JSON object deserializes into a complete snapshot.
//!
//! For server-level configuration (bind address, storage paths, bridge
//! command), see `config`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Highest accepted sampling temperature
pub const MAX_TEMPERATURE: f64 = 2.0;

/// Upper bound for `max_tokens` and `context_window`
pub const MAX_TOKEN_COUNT: u64 = 10_000_000;

/// Default model id
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default message sent back to the model while looping
pub const DEFAULT_LOOP_MESSAGE: &str = "Proceed. You CAN run code on my machine. If the entire task I asked for is done, say exactly 'The task is done.' If you need some specific information (like username or password) say EXACTLY 'Please provide more information.' If it's impossible, say 'The task is impossible.' (If I haven't provided a task, say exactly 'Let me know what you'd like to do next.') Otherwise keep going.";

/// Default phrases that end a loop
pub const DEFAULT_LOOP_BREAKERS: [&str; 4] = [
    "The task is done.",
    "The task is impossible.",
    "Let me know what you'd like to do next.",
    "Please provide more information.",
];

/// Errors raised while parsing or validating settings
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Value has the wrong shape or type (includes unknown enum values)
    #[error("Malformed settings: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A field is outside its accepted range
    #[error("Invalid setting `{field}`: {reason}")]
    OutOfRange {
        /// Setting name
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// Settings file could not be written
    #[error("Failed to persist settings: {0}")]
    Persistence(#[from] super::persistence::PersistenceError),
}

/// Execution-confirmation policy, enforced by the interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SafeMode {
    /// No confirmation or scanning
    #[default]
    Off,
    /// Ask before running code
    Ask,
    /// Scan code automatically before running it
    Auto,
}

/// Complete settings snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // LLM
    /// Model id passed to the LLM layer
    pub model: String,
    /// Sampling temperature, 0.0 to 2.0
    pub temperature: f64,
    /// API key (empty = use the interpreter's environment)
    pub api_key: String,
    /// API base URL (empty = provider default)
    pub api_base: String,
    /// Maximum tokens per completion (None = model default)
    pub max_tokens: Option<u64>,
    /// Context window size (None = model default)
    pub context_window: Option<u64>,

    // Execution
    /// Run code without asking for confirmation
    pub auto_run: bool,
    /// Verbose interpreter output
    pub verbose: bool,
    /// Interpreter debug mode
    pub debug: bool,
    /// Disable online features
    pub offline: bool,
    /// Maximum characters of console output kept per execution
    pub max_output: u64,
    /// Execution-confirmation policy
    pub safe_mode: SafeMode,

    // Display
    /// Downscale images before sending them to the model
    pub shrink_images: bool,
    /// Allow multi-line input
    pub multi_line: bool,
    /// Render output as plain text
    pub plain_text_display: bool,
    /// Highlight the line being executed
    pub highlight_active_line: bool,

    // Conversation
    /// Save conversations to the history directory
    pub conversation_history: bool,
    /// Fixed filename for the saved conversation (empty = generated)
    pub conversation_filename: String,
    /// Share conversations with the interpreter project
    pub contribute_conversation: bool,

    // Loop
    /// Keep prompting the model until a loop breaker appears
    #[serde(rename = "loop")]
    pub loop_enabled: bool,
    /// Message sent back to the model on each loop iteration
    pub loop_message: String,
    /// Phrases that end the loop
    pub loop_breakers: Vec<String>,

    // Advanced
    /// Disable anonymous telemetry
    pub disable_telemetry: bool,
    /// OS control mode
    pub os: bool,
    /// Read messages aloud
    pub speak_messages: bool,
    /// Sync the computer API state with the model
    pub sync_computer: bool,
    /// Import the computer API into the execution environment
    pub import_computer_api: bool,
    /// Import skills into the execution environment
    pub import_skills: bool,
    /// Skills directory (empty = interpreter default)
    pub skills_path: String,
    /// Extra instructions appended to the system message
    pub custom_instructions: String,
    /// System message override (empty = interpreter default)
    pub system_message: String,

    /// Keys this panel does not know about, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            api_key: String::new(),
            api_base: String::new(),
            max_tokens: None,
            context_window: None,
            auto_run: false,
            verbose: false,
            debug: false,
            offline: false,
            max_output: 2800,
            safe_mode: SafeMode::Off,
            shrink_images: true,
            multi_line: true,
            plain_text_display: false,
            highlight_active_line: true,
            conversation_history: true,
            conversation_filename: String::new(),
            contribute_conversation: false,
            loop_enabled: false,
            loop_message: DEFAULT_LOOP_MESSAGE.to_string(),
            loop_breakers: DEFAULT_LOOP_BREAKERS.iter().map(|s| s.to_string()).collect(),
            disable_telemetry: false,
            os: false,
            speak_messages: false,
            sync_computer: false,
            import_computer_api: false,
            import_skills: false,
            skills_path: String::new(),
            custom_instructions: String::new(),
            system_message: String::new(),
            extra: Map::new(),
        }
    }
}

impl Settings {
    /// Parse a (possibly partial) JSON object and validate it
    ///
    /// Omitted keys take their defaults; the result replaces a snapshot
    /// wholesale rather than merging into it.
    pub fn from_value(value: Value) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_value(value)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check numeric ranges. Enum fields are checked while parsing.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.temperature.is_finite()
            || self.temperature < 0.0
            || self.temperature > MAX_TEMPERATURE
        {
            return Err(SettingsError::OutOfRange {
                field: "temperature",
                reason: format!(
                    "{} is outside 0.0..={}",
                    self.temperature, MAX_TEMPERATURE
                ),
            });
        }
        check_token_count("max_tokens", self.max_tokens)?;
        check_token_count("context_window", self.context_window)?;
        if let (Some(max_tokens), Some(window)) = (self.max_tokens, self.context_window) {
            if max_tokens > window {
                return Err(SettingsError::OutOfRange {
                    field: "max_tokens",
                    reason: format!("{} exceeds context_window {}", max_tokens, window),
                });
            }
        }
        if self.max_output == 0 {
            return Err(SettingsError::OutOfRange {
                field: "max_output",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn check_token_count(field: &'static str, value: Option<u64>) -> Result<(), SettingsError> {
    match value {
        Some(0) => Err(SettingsError::OutOfRange {
            field,
            reason: "must be at least 1".to_string(),
        }),
        Some(n) if n > MAX_TOKEN_COUNT => Err(SettingsError::OutOfRange {
            field,
            reason: format!("{} exceeds {}", n, MAX_TOKEN_COUNT),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_object_fills_defaults() {
        let settings = Settings::from_value(json!({"auto_run": true})).unwrap();
        assert!(settings.auto_run);
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.max_output, 2800);
        assert_eq!(settings.loop_breakers.len(), 4);
        assert_eq!(settings.safe_mode, SafeMode::Off);
    }

    #[test]
    fn test_safe_mode_values() {
        for (raw, expected) in [
            ("off", SafeMode::Off),
            ("ask", SafeMode::Ask),
            ("auto", SafeMode::Auto),
        ] {
            let settings = Settings::from_value(json!({ "safe_mode": raw })).unwrap();
            assert_eq!(settings.safe_mode, expected);
            assert_eq!(serde_json::to_value(settings.safe_mode).unwrap(), json!(raw));
        }

        let result = Settings::from_value(json!({"safe_mode": "sometimes"}));
        assert!(matches!(result, Err(SettingsError::Malformed(_))));
    }

    #[test]
    fn test_temperature_out_of_range_is_rejected() {
        let result = Settings::from_value(json!({"temperature": 2.5}));
        match result {
            Err(SettingsError::OutOfRange { field, .. }) => assert_eq!(field, "temperature"),
            other => panic!("Expected OutOfRange, got: {:?}", other),
        }
        assert!(Settings::from_value(json!({"temperature": -0.1})).is_err());
        assert!(Settings::from_value(json!({"temperature": 2})).is_ok());
    }

    #[test]
    fn test_token_counts() {
        assert!(Settings::from_value(json!({"max_tokens": 0})).is_err());
        assert!(Settings::from_value(json!({"max_tokens": -5})).is_err());
        assert!(Settings::from_value(json!({"context_window": 0})).is_err());
        assert!(Settings::from_value(json!({"max_tokens": null})).is_ok());
        assert!(Settings::from_value(json!({"max_tokens": 4096, "context_window": 2048})).is_err());

        let settings =
            Settings::from_value(json!({"max_tokens": 1024, "context_window": 8192})).unwrap();
        assert_eq!(settings.max_tokens, Some(1024));
        assert_eq!(settings.context_window, Some(8192));
    }

    #[test]
    fn test_wrong_type_is_malformed() {
        let result = Settings::from_value(json!({"auto_run": "yes"}));
        assert!(matches!(result, Err(SettingsError::Malformed(_))));
        assert!(Settings::from_value(json!(["not", "an", "object"])).is_err());
    }

    #[test]
    fn test_loop_key_and_unknown_keys_round_trip() {
        let value = json!({"loop": true, "theme": "dark"});
        let settings = Settings::from_value(value).unwrap();
        assert!(settings.loop_enabled);
        assert_eq!(settings.extra.get("theme"), Some(&json!("dark")));

        let serialized = serde_json::to_value(&settings).unwrap();
        assert_eq!(serialized["loop"], json!(true));
        assert_eq!(serialized["theme"], json!("dark"));
        assert!(serialized.get("loop_enabled").is_none());
    }
}
