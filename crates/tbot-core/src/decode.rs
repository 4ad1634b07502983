//! Classification of raw update envelopes into typed content.
//!
//! Envelopes are inspected for one container key (see
//! [`ContainerKey::PRIORITY`]); inside the container the content kind is
//! picked by field presence, in order: `text`, `photo`, nested `message`
//! (callback query), `sticker`, `audio`, and finally a generic message.
//! Text wins over every attachment so captioned media never shadows it.
//!
//! Entities deserialize through serde; only the presence checks and the
//! recursion into `reply_to_message` / callback messages walk raw JSON.

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{Map, Value};

use crate::{
    entities::{
        AudioFile, AudioMessage, CallbackQuery, Chat, ContainerKey, DecodedUpdate, Document,
        Extra, MessageCore, PhotoMessage, PhotoSize, StickerFile, StickerMessage, TextEntity,
        UpdateContent, User,
    },
    errors::Error,
    Result,
};

/// Reply chains and callback messages are shallow on the platform; anything
/// deeper than this is treated as hostile input.
pub const MAX_DEPTH: usize = 8;

/// Decode an envelope (`{"message": {...}}`, `{"result": {...}}`, ...) into
/// its content and the container key it was found under.
pub fn decode(envelope: &Value) -> Result<(UpdateContent, ContainerKey)> {
    decode_at(envelope, 0)
}

/// Decode a full `getUpdates` item, keeping the envelope as `raw`.
pub fn decode_update(raw: Value) -> Result<DecodedUpdate> {
    let id = update_id(&raw).ok_or_else(|| Error::malformed("update is missing update_id"))?;
    let (content, container) = decode(&raw)?;
    Ok(DecodedUpdate {
        id,
        container,
        content,
        raw,
    })
}

pub fn update_id(raw: &Value) -> Option<i64> {
    raw.get("update_id").and_then(Value::as_i64)
}

/// Result of decoding one `getUpdates` batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub decoded: Vec<DecodedUpdate>,
    pub skipped: usize,
    /// Highest `update_id` readable on the wire, decoded or not.
    pub last_raw_id: Option<i64>,
    /// First decode failure when the batch was aborted (safe mode off).
    pub failure: Option<Error>,
}

impl BatchOutcome {
    /// Offset to request next, or `None` when the cursor must stay put.
    ///
    /// A completed batch moves past everything the platform sent, including
    /// skipped items; otherwise a malformed update would be fetched forever.
    /// An aborted batch only moves past what was actually stored.
    pub fn next_offset(&self) -> Option<i64> {
        let last_decoded = self.decoded.last().map(|u| u.id);
        let last = if self.failure.is_some() {
            last_decoded
        } else {
            last_decoded.max(self.last_raw_id)
        };
        last.map(|id| id + 1)
    }
}

pub fn decode_batch(raws: Vec<Value>, safe_mode: bool) -> BatchOutcome {
    let mut out = BatchOutcome {
        last_raw_id: raws.iter().filter_map(update_id).max(),
        ..BatchOutcome::default()
    };

    for raw in raws {
        let id = update_id(&raw);
        match decode_update(raw) {
            Ok(u) => out.decoded.push(u),
            Err(e) if safe_mode => {
                tracing::warn!(update_id = ?id, error = %e, "skipping malformed update");
                out.skipped += 1;
            }
            Err(e) => {
                out.failure = Some(e);
                break;
            }
        }
    }

    out
}

fn decode_at(envelope: &Value, depth: usize) -> Result<(UpdateContent, ContainerKey)> {
    let obj = envelope
        .as_object()
        .ok_or_else(|| Error::malformed(format!("expected an object, got {envelope}")))?;

    for key in ContainerKey::PRIORITY {
        if let Some(container) = obj.get(key.as_str()) {
            return Ok((classify(container, depth)?, key));
        }
    }

    let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
    Err(Error::malformed(format!(
        "no known container key in update (keys: {})",
        keys.join(", ")
    )))
}

fn classify(container: &Value, depth: usize) -> Result<UpdateContent> {
    if depth > MAX_DEPTH {
        return Err(Error::malformed(format!(
            "message nesting deeper than {MAX_DEPTH} levels"
        )));
    }

    let mut map = container
        .as_object()
        .cloned()
        .ok_or_else(|| Error::malformed(format!("message: expected an object, got {container}")))?;

    if map.contains_key("text") {
        return Ok(UpdateContent::Text(message_core(map, depth)?));
    }

    if let Some(sizes) = map.remove("photo") {
        let (thumbnail, photo) = photo_pair(sizes)?;
        return Ok(UpdateContent::Photo(PhotoMessage {
            message: message_core(map, depth)?,
            thumbnail,
            photo,
        }));
    }

    if map.contains_key("message") {
        return callback_query(map, depth).map(UpdateContent::CallbackQuery);
    }

    if let Some(sticker) = map.remove("sticker") {
        let sticker: StickerFile = parse(sticker, "sticker")?;
        return Ok(UpdateContent::Sticker(StickerMessage {
            message: message_core(map, depth)?,
            sticker,
        }));
    }

    if let Some(audio) = map.remove("audio") {
        let audio: AudioFile = parse(audio, "audio")?;
        return Ok(UpdateContent::Audio(AudioMessage {
            message: message_core(map, depth)?,
            audio,
        }));
    }

    Ok(UpdateContent::Generic(message_core(map, depth)?))
}

/// Wire shape of a message once its attachment key has been taken out.
#[derive(Deserialize)]
struct MessageFields {
    message_id: i64,
    chat: Chat,
    from: Option<User>,
    date: Option<i64>,
    text: Option<String>,
    entities: Option<Value>,
    caption: Option<String>,
    caption_entities: Option<Value>,
    reply_to_message: Option<Value>,
    #[serde(flatten)]
    extra: Extra,
}

#[derive(Deserialize)]
struct CallbackFields {
    id: String,
    from: Option<User>,
    message: Value,
    chat_instance: Option<String>,
    data: Option<String>,
    text: Option<String>,
    entities: Option<Value>,
    #[serde(flatten)]
    extra: Extra,
}

fn message_core(map: Map<String, Value>, depth: usize) -> Result<MessageCore> {
    let mut m: MessageFields = parse(Value::Object(map), "message")?;

    // Plain text and media captions share the same slot; whichever pair is
    // not used goes back to `extra`.
    let (text, entities) = if let Some(text) = m.text {
        keep(&mut m.extra, "caption", m.caption.map(Value::String));
        keep(&mut m.extra, "caption_entities", m.caption_entities);
        (Some(text), m.entities)
    } else if let Some(caption) = m.caption {
        keep(&mut m.extra, "entities", m.entities);
        (Some(caption), m.caption_entities)
    } else {
        keep(&mut m.extra, "entities", m.entities);
        keep(&mut m.extra, "caption_entities", m.caption_entities);
        (None, None)
    };
    let entities = match &text {
        Some(t) => text_entities(entities, t)?,
        None => Vec::new(),
    };

    // Same procedure as a top-level `{"message": ...}` envelope.
    let reply_to = match m.reply_to_message {
        Some(r) => Some(Box::new(classify(&r, depth + 1)?)),
        None => None,
    };

    Ok(MessageCore {
        id: m.message_id,
        from: m.from,
        chat: m.chat,
        date: m.date,
        text,
        entities,
        reply_to,
        extra: m.extra,
    })
}

fn callback_query(map: Map<String, Value>, depth: usize) -> Result<CallbackQuery> {
    let mut q: CallbackFields = parse(Value::Object(map), "callback_query")?;
    let original_message = Box::new(classify(&q.message, depth + 1)?);
    let entities = match &q.text {
        Some(t) => text_entities(q.entities, t)?,
        None => {
            keep(&mut q.extra, "entities", q.entities);
            Vec::new()
        }
    };

    Ok(CallbackQuery {
        id: q.id,
        from: q.from,
        original_message,
        chat_instance: q.chat_instance,
        data: q.data,
        text: q.text,
        entities,
        extra: q.extra,
    })
}

fn parse<T: DeserializeOwned>(v: Value, ctx: &str) -> Result<T> {
    serde_json::from_value(v).map_err(|e| Error::malformed(format!("{ctx}: {e}")))
}

fn keep(extra: &mut Extra, key: &str, value: Option<Value>) {
    if let Some(v) = value {
        extra.insert(key.to_string(), v);
    }
}

/// The platform lists sizes smallest first: the first entry is the thumbnail,
/// the last one the full-resolution photo.
fn photo_pair(sizes: Value) -> Result<(PhotoSize, PhotoSize)> {
    let sizes: Vec<PhotoSize> = parse(sizes, "photo")?;
    match (sizes.first(), sizes.last()) {
        (Some(first), Some(last)) => Ok((first.clone(), last.clone())),
        _ => Err(Error::malformed("photo: empty size list")),
    }
}

pub(crate) fn document(v: &Value) -> Result<Document> {
    parse(v.clone(), "document")
}

fn text_entities(raw: Option<Value>, text: &str) -> Result<Vec<TextEntity>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let mut list: Vec<TextEntity> = parse(raw, "entities")?;

    let units: Vec<u16> = text.encode_utf16().collect();
    for e in &mut list {
        e.text = utf16_slice(&units, e.offset, e.length);
    }
    Ok(list)
}

/// Entity offsets count UTF-16 code units; out-of-range spans are clamped.
fn utf16_slice(units: &[u16], offset: i64, length: i64) -> String {
    let len = units.len() as i64;
    let start = offset.clamp(0, len);
    let end = offset.saturating_add(length).clamp(start, len);
    String::from_utf16_lossy(&units[start as usize..end as usize])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UpdateKind;
    use serde_json::json;

    fn msg(extra: Value) -> Value {
        let mut base = json!({
            "message_id": 10,
            "date": 1_700_000_000,
            "from": {"id": 7, "is_bot": false, "first_name": "Ada"},
            "chat": {"id": 7, "type": "private", "first_name": "Ada"},
        });
        if let (Some(b), Some(e)) = (base.as_object_mut(), extra.as_object()) {
            for (k, v) in e {
                b.insert(k.clone(), v.clone());
            }
        }
        base
    }

    fn photo_sizes() -> Value {
        json!([
            {"file_id": "small", "file_unique_id": "s", "file_size": 100, "width": 90, "height": 90},
            {"file_id": "mid", "file_unique_id": "m", "file_size": 900, "width": 320, "height": 320},
            {"file_id": "big", "file_unique_id": "b", "file_size": 9000, "width": 1280, "height": 1280},
        ])
    }

    fn kind_of(envelope: Value) -> UpdateKind {
        decode(&envelope).unwrap().0.kind()
    }

    #[test]
    fn classification_follows_priority_order() {
        let sticker = json!({"file_id": "st", "file_unique_id": "u", "width": 512, "height": 512});
        let audio = json!({"file_id": "au", "file_unique_id": "u", "duration": 3});

        assert_eq!(
            kind_of(json!({"message": msg(json!({"text": "hi", "photo": photo_sizes()}))})),
            UpdateKind::Text
        );
        assert_eq!(
            kind_of(json!({"message": msg(json!({"photo": photo_sizes(), "sticker": sticker}))})),
            UpdateKind::Photo
        );
        assert_eq!(
            kind_of(json!({"message": msg(json!({"sticker": sticker, "audio": audio}))})),
            UpdateKind::Sticker
        );
        assert_eq!(
            kind_of(json!({"message": msg(json!({"audio": audio}))})),
            UpdateKind::Audio
        );
        assert_eq!(
            kind_of(json!({"message": msg(json!({"document": {"file_id": "d"}}))})),
            UpdateKind::GenericMessage
        );
        assert_eq!(
            kind_of(json!({"callback_query": {
                "id": "cb1",
                "from": {"id": 7, "is_bot": false},
                "chat_instance": "42",
                "data": "yes",
                "message": msg(json!({"text": "pick one"})),
            }})),
            UpdateKind::CallbackQuery
        );
    }

    #[test]
    fn neighbouring_kinds_resolve_by_priority() {
        let sticker = json!({"file_id": "st", "file_unique_id": "u", "width": 512, "height": 512});
        let audio = json!({"file_id": "au", "file_unique_id": "u", "duration": 3});
        let inner = msg(json!({"text": "pick one"}));

        // Photo outranks a nested message.
        let photo_and_message = msg(json!({"photo": photo_sizes(), "message": inner}));
        assert_eq!(kind_of(json!({"message": photo_and_message})), UpdateKind::Photo);

        // A nested message outranks sticker and audio.
        let with_sticker = json!({"id": "cb", "message": inner, "sticker": sticker});
        assert_eq!(
            kind_of(json!({"callback_query": with_sticker})),
            UpdateKind::CallbackQuery
        );
        let with_audio = json!({"id": "cb", "message": inner, "audio": audio});
        let (content, _) = decode(&json!({"callback_query": with_audio})).unwrap();
        let UpdateContent::CallbackQuery(q) = content else {
            panic!("expected callback query");
        };
        assert_eq!(q.extra.get("audio"), Some(&audio));
    }

    #[test]
    fn attachment_extra_excludes_file_keys() {
        let env = json!({"message": msg(json!({
            "sticker": {"file_id": "st", "file_unique_id": "u1", "file_size": 12, "width": 1, "height": 1, "type": "regular"},
        }))});
        let UpdateContent::Sticker(s) = decode(&env).unwrap().0 else {
            panic!("expected sticker");
        };
        assert_eq!(s.sticker.file.unique_id, "u1");
        assert_eq!(s.sticker.file.size, Some(12));
        assert_eq!(s.sticker.extra.len(), 1);
        assert_eq!(s.sticker.extra.get("type"), Some(&json!("regular")));

        let env = json!({"message": msg(json!({"photo": [{"file_id": "p", "width": 1, "height": 1}]}))});
        let UpdateContent::Photo(p) = decode(&env).unwrap().0 else {
            panic!("expected photo");
        };
        assert_eq!(p.photo.file.unique_id, "");
        assert_eq!(p.photo.file.size, None);
        assert_eq!(p.thumbnail, p.photo);
        assert!(p.photo.extra.is_empty());
    }

    #[test]
    fn unused_caption_pair_stays_in_extra() {
        let env = json!({"message": msg(json!({
            "text": "body",
            "caption": "ignored",
            "caption_entities": [{"offset": 0, "length": 1, "type": "bold"}],
        }))});
        let (content, _) = decode(&env).unwrap();
        let m = content.message();
        assert_eq!(m.text.as_deref(), Some("body"));
        assert!(m.entities.is_empty());
        assert_eq!(m.extra.get("caption"), Some(&json!("ignored")));
        assert!(m.extra.contains_key("caption_entities"));
    }

    #[test]
    fn container_keys_are_tried_in_fixed_order() {
        let env = json!({
            "update_id": 1,
            "edited_message": msg(json!({"text": "edited"})),
            "message": msg(json!({"text": "fresh"})),
        });
        let (content, key) = decode(&env).unwrap();
        assert_eq!(key, ContainerKey::Message);
        assert_eq!(content.text(), Some("fresh"));

        let (_, key) = decode(&json!({"channel_post": msg(json!({"text": "c"}))})).unwrap();
        assert_eq!(key, ContainerKey::ChannelPost);

        let (_, key) = decode(&json!({"ok": true, "result": msg(json!({"text": "sent"}))})).unwrap();
        assert_eq!(key, ContainerKey::Result);
    }

    #[test]
    fn envelope_without_container_is_unrecognized() {
        for env in [
            json!({"update_id": 3, "poll": {"id": "p"}}),
            json!({}),
            json!([1, 2]),
        ] {
            let err = decode(&env).unwrap_err();
            assert!(matches!(err, Error::UnrecognizedPayload(_)), "{env}");
        }
    }

    #[test]
    fn raw_round_trips_unchanged() {
        let raw = json!({
            "update_id": 99,
            "message": msg(json!({
                "text": "see https://x.y",
                "entities": [{"offset": 4, "length": 11, "type": "url"}],
                "some_future_field": {"nested": [1, 2, 3]},
            })),
        });
        let decoded = decode_update(raw.clone()).unwrap();
        assert_eq!(decoded.raw, raw);
        assert_eq!(decoded.id, 99);
        assert_eq!(decoded.container, ContainerKey::Message);
    }

    #[test]
    fn unknown_keys_land_in_extra() {
        let env = json!({"message": msg(json!({
            "text": "hi",
            "via_bot": {"id": 5},
            "chat": {"id": 7, "type": "private", "is_forum": true},
        }))});
        let (content, _) = decode(&env).unwrap();
        let m = content.message();
        assert_eq!(m.extra.get("via_bot"), Some(&json!({"id": 5})));
        assert!(!m.extra.contains_key("text"));
        assert!(!m.extra.contains_key("chat"));
        assert_eq!(m.chat.extra.get("is_forum"), Some(&json!(true)));
        assert_eq!(m.from.as_ref().map(|u| u.first_name.as_deref()), Some(Some("Ada")));
    }

    #[test]
    fn text_entities_slice_parent_text() {
        let env = json!({"message": msg(json!({
            "text": "hello @bob and https://a.b",
            "entities": [
                {"offset": 6, "length": 4, "type": "mention"},
                {"offset": 15, "length": 11, "type": "url"},
            ],
        }))});
        let (content, _) = decode(&env).unwrap();
        let ents = &content.message().entities;
        assert_eq!(ents.len(), 2);
        assert_eq!(ents[0].text, "@bob");
        assert_eq!(ents[0].kind, "mention");
        assert_eq!(ents[1].text, "https://a.b");
    }

    #[test]
    fn entity_offsets_are_utf16_units() {
        // The emoji takes two UTF-16 code units.
        let env = json!({"message": msg(json!({
            "text": "😀 #tag",
            "entities": [{"offset": 3, "length": 4, "type": "hashtag"}],
        }))});
        let (content, _) = decode(&env).unwrap();
        assert_eq!(content.message().entities[0].text, "#tag");
    }

    #[test]
    fn out_of_range_entity_is_clamped() {
        let units: Vec<u16> = "abc".encode_utf16().collect();
        assert_eq!(utf16_slice(&units, 1, 100), "bc");
        assert_eq!(utf16_slice(&units, 10, 2), "");
        assert_eq!(utf16_slice(&units, -4, 2), "");
    }

    #[test]
    fn photo_uses_first_as_thumbnail_and_last_as_photo_with_caption() {
        let env = json!({"message": msg(json!({
            "photo": photo_sizes(),
            "caption": "look #cat",
            "caption_entities": [{"offset": 5, "length": 4, "type": "hashtag"}],
        }))});
        let (content, _) = decode(&env).unwrap();
        let UpdateContent::Photo(p) = content else {
            panic!("expected photo");
        };
        assert_eq!(p.thumbnail.file.id, "small");
        assert_eq!(p.photo.file.id, "big");
        assert_eq!(p.photo.width, 1280);
        assert_eq!(p.message.text.as_deref(), Some("look #cat"));
        assert_eq!(p.message.entities[0].text, "#cat");
    }

    #[test]
    fn empty_photo_list_is_malformed() {
        let env = json!({"message": msg(json!({"photo": []}))});
        assert!(matches!(
            decode(&env).unwrap_err(),
            Error::UnrecognizedPayload(_)
        ));
    }

    #[test]
    fn sticker_and_audio_carry_attachment_fields() {
        let env = json!({"message": msg(json!({
            "sticker": {"file_id": "st", "file_unique_id": "u1", "file_size": 12, "width": 512, "height": 256, "emoji": "👍", "is_animated": false},
        }))});
        let UpdateContent::Sticker(s) = decode(&env).unwrap().0 else {
            panic!("expected sticker");
        };
        assert_eq!(s.sticker.file.id, "st");
        assert_eq!(s.sticker.height, 256);
        assert_eq!(s.sticker.emoji.as_deref(), Some("👍"));
        assert_eq!(s.sticker.extra.get("is_animated"), Some(&json!(false)));
        assert!(!s.message.extra.contains_key("sticker"));

        let env = json!({"message": msg(json!({
            "audio": {
                "file_id": "au", "file_unique_id": "u2", "duration": 215,
                "performer": "Band", "title": "Song", "mime_type": "audio/mpeg",
                "thumb": {"file_id": "t", "file_unique_id": "t", "width": 90, "height": 90},
            },
        }))});
        let UpdateContent::Audio(a) = decode(&env).unwrap().0 else {
            panic!("expected audio");
        };
        assert_eq!(a.audio.duration, 215);
        assert_eq!(a.audio.title.as_deref(), Some("Song"));
        assert_eq!(a.audio.thumbnail.as_ref().map(|t| t.file.id.as_str()), Some("t"));
    }

    #[test]
    fn reply_to_message_is_decoded_recursively() {
        let original = msg(json!({"message_id": 3, "photo": photo_sizes()}));
        let env = json!({"message": msg(json!({"text": "nice", "reply_to_message": original}))});
        let (content, _) = decode(&env).unwrap();
        let reply = content.message().reply_to.as_deref().unwrap();
        assert_eq!(reply.kind(), UpdateKind::Photo);
        assert_eq!(reply.message().id, 3);
        assert!(!content.message().extra.contains_key("reply_to_message"));
    }

    #[test]
    fn callback_query_decodes_original_message() {
        let env = json!({"callback_query": {
            "id": "cb1",
            "from": {"id": 11, "is_bot": false, "username": "carol"},
            "chat_instance": "-55",
            "data": "vote:1",
            "game_short_name": "g",
            "message": msg(json!({"message_id": 40, "text": "vote?"})),
        }});
        let (content, key) = decode(&env).unwrap();
        assert_eq!(key, ContainerKey::CallbackQuery);
        let UpdateContent::CallbackQuery(q) = &content else {
            panic!("expected callback query");
        };
        assert_eq!(q.id, "cb1");
        assert_eq!(q.data.as_deref(), Some("vote:1"));
        assert_eq!(q.original_message.kind(), UpdateKind::Text);
        assert_eq!(q.original_message.message().id, 40);
        assert_eq!(q.chat().id, 7);
        assert_eq!(q.extra.get("game_short_name"), Some(&json!("g")));
        // The presser, not the author of the original message.
        assert_eq!(content.sender_id(), 11);
    }

    #[test]
    fn excessive_nesting_is_rejected() {
        let mut m = msg(json!({"text": "leaf"}));
        for i in 0..(MAX_DEPTH + 2) {
            m = msg(json!({"message_id": i, "text": "r", "reply_to_message": m}));
        }
        let err = decode(&json!({"message": m})).unwrap_err();
        assert!(err.to_string().contains("nesting"));
    }

    #[test]
    fn missing_required_fields_name_the_field() {
        let err = decode(&json!({"message": {"message_id": 1, "text": "x"}})).unwrap_err();
        assert!(err.to_string().contains("`chat`"), "{err}");

        let err = decode(&json!({"message": {"message_id": 1, "chat": {"id": 1}, "photo": [{"width": 1, "height": 1}]}}))
            .unwrap_err();
        assert!(err.to_string().contains("`file_id`"), "{err}");

        let err = decode(&json!({"message": {"message_id": "1", "chat": {"id": 1}, "text": "x"}}))
            .unwrap_err();
        assert!(matches!(err, Error::UnrecognizedPayload(_)));
        assert!(err.to_string().contains("invalid type"), "{err}");

        let err = decode_update(json!({"message": msg(json!({"text": "x"}))})).unwrap_err();
        assert!(err.to_string().contains("update_id"));
    }

    #[test]
    fn channel_posts_fall_back_to_chat_for_sender() {
        let post = json!({
            "message_id": 1,
            "chat": {"id": -100123, "type": "channel", "title": "News"},
            "text": "breaking",
        });
        let (content, _) = decode(&json!({"channel_post": post})).unwrap();
        assert!(content.sender().is_none());
        assert_eq!(content.sender_id(), -100123);
    }

    #[test]
    fn batch_skips_bad_items_in_safe_mode() {
        let raws = vec![
            json!({"update_id": 1, "message": msg(json!({"text": "a"}))}),
            json!({"update_id": 2, "unknown": {}}),
            json!({"update_id": 3, "message": msg(json!({"text": "c"}))}),
        ];
        let out = decode_batch(raws, true);
        assert_eq!(out.decoded.len(), 2);
        assert_eq!(out.skipped, 1);
        assert!(out.failure.is_none());
        assert_eq!(out.next_offset(), Some(4));
    }

    #[test]
    fn batch_aborts_on_first_failure_without_safe_mode() {
        let raws = vec![
            json!({"update_id": 1, "message": msg(json!({"text": "a"}))}),
            json!({"update_id": 2, "unknown": {}}),
            json!({"update_id": 3, "message": msg(json!({"text": "c"}))}),
        ];
        let out = decode_batch(raws, false);
        assert_eq!(out.decoded.len(), 1);
        assert!(matches!(out.failure, Some(Error::UnrecognizedPayload(_))));
        // Only past what was stored.
        assert_eq!(out.next_offset(), Some(2));
    }

    #[test]
    fn fully_skipped_batch_still_advances() {
        let raws = vec![json!({"update_id": 8, "nope": 1}), json!({"update_id": 9, "nope": 2})];
        let out = decode_batch(raws, true);
        assert!(out.decoded.is_empty());
        assert_eq!(out.next_offset(), Some(10));

        assert_eq!(decode_batch(Vec::new(), true).next_offset(), None);
    }

    #[test]
    fn document_helper_reads_generic_attachment() {
        let env = json!({"result": msg(json!({
            "document": {"file_id": "doc", "file_unique_id": "d", "file_name": "a.pdf", "mime_type": "application/pdf"},
        }))});
        let (content, _) = decode(&env).unwrap();
        let doc = content.message().document().unwrap().unwrap();
        assert_eq!(doc.file_name.as_deref(), Some("a.pdf"));
        assert_eq!(doc.file.id, "doc");
    }
}
