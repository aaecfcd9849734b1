//! Database schema definitions
//!
//! Table and column names of the flat `chat` relation, one row per message.

/// Enriched messages, keyed by message identifier
pub mod chat {
    /// Table name
    pub const TABLE: &str = "chat";
    /// Message identifier, primary key
    pub const ID: &str = "id";
    /// 1 when sent by the export owner
    pub const FROM_ME: &str = "from_me";
    /// Shared location latitude
    pub const LATITUDE: &str = "latitude";
    /// Shared location longitude
    pub const LONGITUDE: &str = "longitude";
    /// WhatsApp message key
    pub const KEY_ID: &str = "key_id";
    /// Media path relative to the export directory
    pub const MEDIA_FILEPATH: &str = "media_filepath";
    /// Export job identifier
    pub const MEDIA_JOB_UUID: &str = "media_job_uuid";
    /// Media MIME type
    pub const MEDIA_MIME_TYPE: &str = "media_mime_type";
    /// Voice note transcript
    pub const MEDIA_TRANSCRIPTION: &str = "media_transcription";
    /// Audio duration in seconds
    pub const MEDIA_AUDIO_LENGTH_SECONDS: &str = "media_audio_length_seconds";
    /// Media file size in bytes
    pub const MEDIA_FILE_SIZE_BYTE: &str = "media_file_size_byte";
    /// Conversation identifier
    pub const CHAT_ID: &str = "chat_id";
    /// Key of the quoted message
    pub const REPLY_TO: &str = "reply_to";
    /// Sender display name
    pub const SENDER_CONTACT_NAME: &str = "sender_contact_name";
    /// Sender phone number
    pub const SENDER_CONTACT_NUMBER: &str = "sender_contact_number";
    /// Sender JID
    pub const SENDER_CONTACT_RAW_STRING_JID: &str = "sender_contact_raw_string_jid";
    /// Message body
    pub const TEXT_DATA: &str = "text_data";
    /// Unix timestamp of the message
    pub const TIMESTAMP: &str = "timestamp";

    /// Insert order used by the sink.
    pub const COLUMNS: [&str; 18] = [
        ID,
        FROM_ME,
        LATITUDE,
        LONGITUDE,
        KEY_ID,
        MEDIA_FILEPATH,
        MEDIA_JOB_UUID,
        MEDIA_MIME_TYPE,
        MEDIA_TRANSCRIPTION,
        MEDIA_AUDIO_LENGTH_SECONDS,
        MEDIA_FILE_SIZE_BYTE,
        CHAT_ID,
        REPLY_TO,
        SENDER_CONTACT_NAME,
        SENDER_CONTACT_NUMBER,
        SENDER_CONTACT_RAW_STRING_JID,
        TEXT_DATA,
        TIMESTAMP,
    ];
}
