// src/reload/message.rs

//! JSON messages pushed to connected browsers.
//!
//! ```json
//! {"type":"reload"}
//! {"type":"css","path":"static/css/screen.min.css"}
//! {"type":"connected","version":"0.1.0"}
//! ```

use serde::{Deserialize, Serialize};

/// What a task or stage wants connected browsers to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadEvent {
    /// Full page reload.
    Reload,
    /// Re-fetch the stylesheet whose URL ends with this path's file name.
    Css { path: String },
}

/// Wire format of a reload message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    Reload,
    Css { path: String },
    /// Sent once after the WebSocket handshake.
    Connected { version: String },
}

impl ReloadMessage {
    pub fn connected() -> Self {
        ReloadMessage::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn to_json(&self) -> String {
        // Serializing a tagged enum of strings cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }
}

impl From<&ReloadEvent> for ReloadMessage {
    fn from(event: &ReloadEvent) -> Self {
        match event {
            ReloadEvent::Reload => ReloadMessage::Reload,
            ReloadEvent::Css { path } => ReloadMessage::Css { path: path.clone() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_use_a_type_tag() {
        assert_eq!(ReloadMessage::Reload.to_json(), r#"{"type":"reload"}"#);
        assert_eq!(
            ReloadMessage::from(&ReloadEvent::Css {
                path: "css/screen.css".into()
            })
            .to_json(),
            r#"{"type":"css","path":"css/screen.css"}"#
        );
    }

    #[test]
    fn connected_carries_the_crate_version() {
        let json = ReloadMessage::connected().to_json();
        let back: ReloadMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back,
            ReloadMessage::Connected {
                version: env!("CARGO_PKG_VERSION").to_string()
            }
        );
    }
}
