//! Data model of an exported chat.
//!
//! Every scalar is optional: absence means "unknown" and must survive all the
//! way to the database as NULL. Enrichment only ever moves media fields from
//! `None` to `Some`.

use serde::{Deserialize, Deserializer, Serialize};

/// MIME type WhatsApp uses for voice notes.
pub const MIME_TYPE_OPUS: &str = "audio/ogg; codecs=opus";

/// A single exported conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    /// Conversation identifier
    pub chat_id: Option<i64>,
    /// Contact or group the chat is with
    pub chat_title: Option<ChatTitle>,
    /// Messages in conversation order. `null` entries in the export are kept
    /// as `None` so positions are preserved.
    #[serde(default)]
    pub messages: Vec<Option<Message>>,
}

impl Chat {
    /// Iterate over the messages that are actually present.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().flatten()
    }

    /// Mutable counterpart of [`Chat::messages`].
    pub fn messages_mut(&mut self) -> impl Iterator<Item = &mut Message> {
        self.messages.iter_mut().flatten()
    }
}

/// Who the conversation is with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTitle {
    /// Display name, if known
    pub name: Option<String>,
    /// Phone number
    pub number: Option<String>,
    /// WhatsApp JID as exported
    pub raw_string_jid: Option<String>,
}

impl ChatTitle {
    /// Best human-readable label: name, then number, then the raw JID.
    pub fn display(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or(self.number.as_deref())
            .or(self.raw_string_jid.as_deref())
    }
}

/// One exported message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message identifier, unique within the export
    pub message_id: Option<i64>,
    /// Conversation the message belongs to
    pub chat_id: Option<i64>,
    /// Sent by the owner of the exported account
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub from_me: Option<bool>,
    /// WhatsApp message key
    pub key_id: Option<String>,
    /// Unix timestamp as exported
    pub timestamp: Option<i64>,
    /// Message body
    pub text_data: Option<String>,
    /// Key of the message this one answers
    pub reply_to: Option<String>,
    /// Shared location
    pub geo_position: Option<GeoPosition>,
    /// Attachment, if any
    pub media: Option<Media>,
    /// Author in group chats
    pub sender_contact: Option<SenderContact>,
}

impl Message {
    /// Media attached to this message that points at a file.
    pub fn media_with_path(&self) -> Option<&Media> {
        self.media.as_ref().filter(|m| m.file_path.is_some())
    }
}

/// Attachment metadata. The file itself is only referenced, never owned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Media {
    /// Path relative to the export's working directory
    pub file_path: Option<String>,
    /// MIME type reported by the export
    pub mime_type: Option<String>,
    /// Export job identifier
    pub media_job_uuid: Option<String>,
    /// Owning message
    pub message_id: Option<i64>,
    /// Voice note transcript, trimmed
    pub transcription: Option<String>,
    /// Playback length of audio media
    pub audio_length_seconds: Option<f64>,
    /// Size of the referenced file
    pub file_size_byte: Option<i64>,
}

impl Media {
    /// Voice notes are the only media we transcribe.
    pub fn is_opus(&self) -> bool {
        self.mime_type.as_deref() == Some(MIME_TYPE_OPUS)
    }

    /// Any audio asset; these get a duration probe.
    pub fn is_audio(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|mime| mime.trim_start().to_ascii_lowercase().starts_with("audio/"))
    }
}

/// Location shared in a message
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    /// Degrees north
    pub latitude: Option<f32>,
    /// Degrees east
    pub longitude: Option<f32>,
    /// Owning message
    pub message_id: Option<i64>,
}

impl GeoPosition {
    /// Coordinates are only meaningful as a pair.
    pub fn coordinates(&self) -> Option<(f32, f32)> {
        self.latitude.zip(self.longitude)
    }
}

/// Author of a message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderContact {
    /// Display name, if known
    pub name: Option<String>,
    /// Phone number
    pub number: Option<String>,
    /// WhatsApp JID as exported
    pub raw_string_jid: Option<String>,
}

/// Exports encode `from_me` as 0/1; accept booleans as well.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(Option::<Flag>::deserialize(deserializer)?.map(|flag| match flag {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_chat() {
        let json = r#"{
            "chat_id": 7,
            "chat_title": {"name": null, "number": "+491234", "raw_string_jid": "491234@s.whatsapp.net"},
            "messages": [
                {"message_id": 1, "from_me": 1, "text_data": "hi", "timestamp": 1600000000},
                null,
                {"message_id": 2, "from_me": false,
                 "media": {"file_path": "Media/voice.opus", "mime_type": "audio/ogg; codecs=opus"}}
            ]
        }"#;

        let chat: Chat = serde_json::from_str(json).unwrap();
        assert_eq!(chat.messages.len(), 3);
        assert_eq!(chat.messages().count(), 2);
        assert_eq!(chat.chat_title.as_ref().and_then(ChatTitle::display), Some("+491234"));

        let first = chat.messages().next().unwrap();
        assert_eq!(first.from_me, Some(true));
        assert!(first.media.is_none());

        let voice = chat.messages().nth(1).unwrap().media.as_ref().unwrap();
        assert!(voice.is_opus());
        assert!(voice.is_audio());
        assert_eq!(voice.file_size_byte, None);
        assert_eq!(voice.audio_length_seconds, None);
    }

    #[test]
    fn test_missing_from_me_stays_unknown() {
        let message: Message = serde_json::from_str(r#"{"message_id": 3}"#).unwrap();
        assert_eq!(message.from_me, None);
    }

    #[test]
    fn test_audio_classification() {
        let image = Media {
            mime_type: Some("image/jpeg".into()),
            ..Media::default()
        };
        let mp3 = Media {
            mime_type: Some("audio/mpeg".into()),
            ..Media::default()
        };
        assert!(!image.is_audio());
        assert!(!image.is_opus());
        assert!(mp3.is_audio());
        assert!(!mp3.is_opus());
        assert!(!Media::default().is_audio());
    }

    #[test]
    fn test_coordinates_require_both_values() {
        let half = GeoPosition {
            latitude: Some(1.0),
            ..GeoPosition::default()
        };
        assert_eq!(half.coordinates(), None);

        let full = GeoPosition {
            latitude: Some(1.0),
            longitude: Some(2.0),
            message_id: None,
        };
        assert_eq!(full.coordinates(), Some((1.0, 2.0)));
    }
}
