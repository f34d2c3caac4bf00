//! Wire message exchanged between peers
//!
//! One message names one operation on one file. The payload is compact UTF-8
//! JSON; byte content travels as a base64 string so the whole object stays
//! text. Unknown `method` values survive decoding unchanged so newer peers
//! can speak to older ones.

use serde::{Deserialize, Serialize};

/// The only operation currently defined: "this path's content is now exactly
/// this byte sequence."
pub const CHANGE_FILE: &str = "ChangeFile";

/// One operation on the wire.
///
/// Messages are ephemeral: constructed, sent or consumed, then discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Slash-normalized path relative to the synchronized root, no leading
    /// separator
    pub id: String,
    /// Operation tag; values other than [`CHANGE_FILE`] are inert
    pub method: String,
    /// Full new file content; present only for [`CHANGE_FILE`]
    #[serde(with = "content_b64", default)]
    pub content: Option<Vec<u8>>,
}

impl Message {
    /// Build a `ChangeFile` message carrying a whole-file snapshot.
    #[must_use]
    pub fn change_file(id: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            method: CHANGE_FILE.to_string(),
            content: Some(content),
        }
    }

    /// Whether this message carries the one operation we act on.
    #[must_use]
    pub fn is_change_file(&self) -> bool {
        self.method == CHANGE_FILE
    }

    /// Encode to the UTF-8 JSON payload carried inside one frame.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn encode(&self) -> color_eyre::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode from one frame's payload.
    ///
    /// # Errors
    /// Returns an error if the payload is not a valid message object.
    pub fn decode(payload: &[u8]) -> color_eyre::Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }
}

/// Byte content as a base64 string (or null) inside the JSON payload.
mod content_b64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|encoded| STANDARD.decode(encoded).map_err(serde::de::Error::custom))
            .transpose()
    }
}
