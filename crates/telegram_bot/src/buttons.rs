//! Inline button payloads.
//!
//! Every button carries a small tagged JSON document naming the action and
//! the expense it targets. A payload whose action is not in this closed set
//! fails to decode and the click is rejected, never guessed at.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(crate) enum ButtonAction {
    Delete {
        chat_id: i64,
        message_id: i32,
    },
    Restore {
        chat_id: i64,
        message_id: i32,
    },
    EditCategory {
        chat_id: i64,
        message_id: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    EditType {
        chat_id: i64,
        message_id: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
}

pub(crate) fn encode(action: &ButtonAction) -> String {
    serde_json::to_string(action).unwrap_or_default()
}

pub(crate) fn decode(data: &str) -> Option<ButtonAction> {
    serde_json::from_str(data).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_round_trip() {
        let actions = [
            ButtonAction::Delete {
                chat_id: -100,
                message_id: 7,
            },
            ButtonAction::Restore {
                chat_id: -100,
                message_id: 7,
            },
            ButtonAction::EditCategory {
                chat_id: -100,
                message_id: 7,
                value: Some("food".to_string()),
            },
            ButtonAction::EditType {
                chat_id: -100,
                message_id: 7,
                value: None,
            },
        ];

        for action in actions {
            assert_eq!(decode(&encode(&action)), Some(action));
        }
    }

    #[test]
    fn tag_is_snake_case() {
        let encoded = encode(&ButtonAction::EditCategory {
            chat_id: 1,
            message_id: 2,
            value: None,
        });
        assert!(encoded.contains("\"action\":\"edit_category\""));
        // An absent value is omitted, not serialized as null.
        assert!(!encoded.contains("value"));
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert_eq!(
            decode(r#"{"action":"explode","chat_id":1,"message_id":2}"#),
            None
        );
        assert_eq!(decode("not even json"), None);
    }

    #[test]
    fn missing_value_defaults_to_none() {
        let decoded = decode(r#"{"action":"edit_type","chat_id":1,"message_id":2}"#);
        assert_eq!(
            decoded,
            Some(ButtonAction::EditType {
                chat_id: 1,
                message_id: 2,
                value: None,
            })
        );
    }
}
