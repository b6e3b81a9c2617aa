//! Tests for the interpreter bridge JSON-lines protocol

use interpreter_web_gui::history::{MessageFormat, Role};
use interpreter_web_gui::interpreter::protocol::{BridgeEvent, BridgeRequest};
use interpreter_web_gui::interpreter::Chunk;
use interpreter_web_gui::state::Settings;
use serde_json::Value;

#[test]
fn test_chat_request_serialization() {
    let settings = Settings {
        model: "gpt-4o-mini".to_string(),
        auto_run: true,
        ..Settings::default()
    };
    let request = BridgeRequest::Chat {
        message: "print 2+2",
        settings: &settings,
    };

    let json = serde_json::to_string(&request).unwrap();

    // One line on the wire
    assert!(!json.contains('\n'));
    let parsed: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["type"], "chat");
    assert_eq!(parsed["message"], "print 2+2");
    assert_eq!(parsed["settings"]["model"], "gpt-4o-mini");
    assert_eq!(parsed["settings"]["auto_run"], true);
    assert_eq!(parsed["settings"]["safe_mode"], "off");
}

#[test]
fn test_execute_and_reset_requests() {
    let settings = Settings::default();
    let execute = BridgeRequest::Execute {
        language: "shell",
        code: "echo hi",
        settings: &settings,
    };
    let parsed: Value = serde_json::to_value(&execute).unwrap();
    assert_eq!(parsed["type"], "execute");
    assert_eq!(parsed["language"], "shell");
    assert_eq!(parsed["code"], "echo hi");

    let reset = serde_json::to_string(&BridgeRequest::Reset).unwrap();
    assert_eq!(reset, r#"{"type":"reset"}"#);
}

#[test]
fn test_event_deserialization() {
    let message: BridgeEvent = serde_json::from_str(
        r#"{"type":"message","role":"assistant","content":"**Hi**","format":"markdown"}"#,
    )
    .unwrap();
    assert_eq!(
        message,
        BridgeEvent::Message {
            role: Role::Assistant,
            content: "**Hi**".to_string(),
            format: MessageFormat::Markdown,
        }
    );

    let code: BridgeEvent =
        serde_json::from_str(r#"{"type":"code","language":"python","content":"print(4)"}"#)
            .unwrap();
    assert_eq!(
        code.into_chunk(),
        Some(Chunk::Code {
            language: "python".to_string(),
            content: "print(4)".to_string(),
        })
    );

    let done: BridgeEvent = serde_json::from_str(r#"{"type":"done"}"#).unwrap();
    assert_eq!(done, BridgeEvent::Done);
    assert_eq!(done.into_chunk(), None);

    let error: BridgeEvent =
        serde_json::from_str(r#"{"type":"error","message":"rate limited"}"#).unwrap();
    assert_eq!(
        error,
        BridgeEvent::Error {
            message: "rate limited".to_string()
        }
    );
}

#[test]
fn test_event_defaults() {
    // Missing role/format fall back to assistant text
    let message: BridgeEvent =
        serde_json::from_str(r#"{"type":"message","content":"hello"}"#).unwrap();
    assert_eq!(
        message.into_chunk(),
        Some(Chunk::Message {
            role: Role::Assistant,
            content: "hello".to_string(),
            format: MessageFormat::Text,
        })
    );

    // Missing language is python
    let code: BridgeEvent = serde_json::from_str(r#"{"type":"code","content":"x = 1"}"#).unwrap();
    assert!(matches!(code, BridgeEvent::Code { ref language, .. } if language == "python"));

    // Execution output may arrive labelled with role "computer"
    let computer: BridgeEvent =
        serde_json::from_str(r#"{"type":"message","role":"computer","content":"ok"}"#).unwrap();
    assert!(matches!(
        computer,
        BridgeEvent::Message {
            role: Role::System,
            ..
        }
    ));
}

#[test]
fn test_unrecognized_event_types_are_skippable() {
    for line in [
        r#"{"type":"telemetry"}"#,
        r#"{"type":"confirmation","content":{"type":"code","format":"python","content":"x"}}"#,
        r#"{"type":"image","format":"base64.png","content":"iVBOR"}"#,
    ] {
        let event: BridgeEvent = serde_json::from_str(line).unwrap();
        assert_eq!(event, BridgeEvent::Unknown);
        assert_eq!(event.into_chunk(), None);
    }
}

#[test]
fn test_invalid_events_rejected() {
    assert!(serde_json::from_str::<BridgeEvent>(r#"{"content":"no type"}"#).is_err());
    assert!(serde_json::from_str::<BridgeEvent>("not json").is_err());
    assert!(
        serde_json::from_str::<BridgeEvent>(r#"{"type":"message","format":"html"}"#).is_err()
    );
}
