//! Typed Telegram entities produced by the decoder.
//!
//! Every entity keeps the wire keys it does not model in `extra`, so schema
//! additions on the platform side survive decoding untouched.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::{ChatId, MessageId, MessageRef};

pub type Extra = Map<String, Value>;

/// Anything that can be addressed by a numeric Telegram id (chats, users).
pub trait Identity {
    fn id(&self) -> i64;
}

#[derive(Clone, Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
    /// Wire `type`: private, group, supergroup or channel.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Chat {
    pub fn chat_id(&self) -> ChatId {
        ChatId(self.id)
    }
}

impl Identity for Chat {
    fn id(&self) -> i64 {
        self.id
    }
}

impl From<&Chat> for ChatId {
    fn from(chat: &Chat) -> Self {
        chat.chat_id()
    }
}

impl PartialEq for Chat {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Chat {}

#[derive(Clone, Debug, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl User {
    /// The private chat with this user.
    pub fn chat_id(&self) -> ChatId {
        ChatId(self.id)
    }
}

impl Identity for User {
    fn id(&self) -> i64 {
        self.id
    }
}

impl From<&User> for ChatId {
    fn from(user: &User) -> Self {
        user.chat_id()
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

/// Fields shared by every downloadable attachment.
///
/// Flattened into each attachment ahead of its `extra` map, so the `file_*`
/// keys are claimed here first.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FileRef {
    #[serde(rename = "file_id")]
    pub id: String,
    #[serde(rename = "file_unique_id", default)]
    pub unique_id: String,
    #[serde(rename = "file_size")]
    pub size: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PhotoSize {
    #[serde(flatten)]
    pub file: FileRef,
    pub width: i64,
    pub height: i64,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct StickerFile {
    #[serde(flatten)]
    pub file: FileRef,
    pub width: i64,
    pub height: i64,
    pub emoji: Option<String>,
    pub set_name: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AudioFile {
    #[serde(flatten)]
    pub file: FileRef,
    pub duration: i64,
    pub performer: Option<String>,
    pub title: Option<String>,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    /// Older API versions call it `thumb`.
    #[serde(alias = "thumb")]
    pub thumbnail: Option<PhotoSize>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Document {
    #[serde(flatten)]
    pub file: FileRef,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A span annotation over a message's text (link, mention, bold...).
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TextEntity {
    pub offset: i64,
    pub length: i64,
    /// Wire `type`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The annotated slice of the parent text.
    #[serde(skip)]
    pub text: String,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Fields every message carries, whatever its content kind.
#[derive(Clone, Debug)]
pub struct MessageCore {
    pub id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub date: Option<i64>,
    /// Message text, or the caption for media.
    pub text: Option<String>,
    pub entities: Vec<TextEntity>,
    pub reply_to: Option<Box<UpdateContent>>,
    /// Attachments the decoder does not classify (documents, videos, ...)
    /// stay here along with any other unmodelled key.
    pub extra: Extra,
}

impl MessageCore {
    pub fn message_ref(&self) -> MessageRef {
        MessageRef {
            chat_id: self.chat.chat_id(),
            message_id: MessageId(self.id),
        }
    }

    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        self.date.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }

    /// File attachment of a generic message, decoded on demand.
    pub fn document(&self) -> Option<crate::Result<Document>> {
        self.extra.get("document").map(crate::decode::document)
    }
}

#[derive(Clone, Debug)]
pub struct PhotoMessage {
    pub message: MessageCore,
    pub thumbnail: PhotoSize,
    pub photo: PhotoSize,
}

#[derive(Clone, Debug)]
pub struct StickerMessage {
    pub message: MessageCore,
    pub sticker: StickerFile,
}

#[derive(Clone, Debug)]
pub struct AudioMessage {
    pub message: MessageCore,
    pub audio: AudioFile,
}

#[derive(Clone, Debug)]
pub struct CallbackQuery {
    pub id: String,
    pub from: Option<User>,
    /// The message the pressed button was attached to.
    pub original_message: Box<UpdateContent>,
    pub chat_instance: Option<String>,
    pub data: Option<String>,
    pub text: Option<String>,
    pub entities: Vec<TextEntity>,
    pub extra: Extra,
}

impl CallbackQuery {
    pub fn chat(&self) -> &Chat {
        &self.original_message.message().chat
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    Text,
    Photo,
    Sticker,
    Audio,
    CallbackQuery,
    GenericMessage,
}

/// Decoded content of one update, one variant per content kind.
#[derive(Clone, Debug)]
pub enum UpdateContent {
    Text(MessageCore),
    Photo(PhotoMessage),
    Sticker(StickerMessage),
    Audio(AudioMessage),
    CallbackQuery(CallbackQuery),
    Generic(MessageCore),
}

impl UpdateContent {
    pub fn kind(&self) -> UpdateKind {
        match self {
            UpdateContent::Text(_) => UpdateKind::Text,
            UpdateContent::Photo(_) => UpdateKind::Photo,
            UpdateContent::Sticker(_) => UpdateKind::Sticker,
            UpdateContent::Audio(_) => UpdateKind::Audio,
            UpdateContent::CallbackQuery(_) => UpdateKind::CallbackQuery,
            UpdateContent::Generic(_) => UpdateKind::GenericMessage,
        }
    }

    /// The message this content belongs to. For callback queries this is the
    /// message carrying the pressed button.
    pub fn message(&self) -> &MessageCore {
        match self {
            UpdateContent::Text(m) | UpdateContent::Generic(m) => m,
            UpdateContent::Photo(p) => &p.message,
            UpdateContent::Sticker(s) => &s.message,
            UpdateContent::Audio(a) => &a.message,
            UpdateContent::CallbackQuery(q) => q.original_message.message(),
        }
    }

    pub fn sender(&self) -> Option<&User> {
        match self {
            UpdateContent::CallbackQuery(q) => q.from.as_ref(),
            other => other.message().from.as_ref(),
        }
    }

    /// Id used for mailbox filtering: the sending user, falling back to the
    /// chat for anonymous posts (channels).
    pub fn sender_id(&self) -> i64 {
        self.sender()
            .map(|u| u.id)
            .unwrap_or_else(|| self.message().chat.id)
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            UpdateContent::CallbackQuery(q) => q.text.as_deref(),
            other => other.message().text.as_deref(),
        }
    }
}

/// Top-level envelope key an update's content was found under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerKey {
    Message,
    EditedMessage,
    ChannelPost,
    EditedChannelPost,
    CallbackQuery,
    Result,
}

impl ContainerKey {
    /// Lookup order used by the decoder.
    pub const PRIORITY: [ContainerKey; 6] = [
        ContainerKey::Message,
        ContainerKey::EditedMessage,
        ContainerKey::ChannelPost,
        ContainerKey::EditedChannelPost,
        ContainerKey::CallbackQuery,
        ContainerKey::Result,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContainerKey::Message => "message",
            ContainerKey::EditedMessage => "edited_message",
            ContainerKey::ChannelPost => "channel_post",
            ContainerKey::EditedChannelPost => "edited_channel_post",
            ContainerKey::CallbackQuery => "callback_query",
            ContainerKey::Result => "result",
        }
    }
}

/// One update as stored in the mailbox.
#[derive(Clone, Debug)]
pub struct DecodedUpdate {
    pub id: i64,
    pub container: ContainerKey,
    pub content: UpdateContent,
    /// The envelope exactly as received.
    pub raw: Value,
}

impl DecodedUpdate {
    pub fn kind(&self) -> UpdateKind {
        self.content.kind()
    }

    pub fn sender_id(&self) -> i64 {
        self.content.sender_id()
    }
}
