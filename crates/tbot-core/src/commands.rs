//! Outbound Bot API methods.
//!
//! Arguments are checked before any network I/O. Optional method parameters
//! go through `extra` and may not replace the ones a method sets itself.

use serde_json::{json, Value};

use crate::{
    bot::Bot,
    decode::decode,
    domain::{ChatId, MessageId, MessageRef},
    entities::UpdateContent,
    errors::Error,
    transport::{ApiResponse, InputFile, Params},
    Result,
};

/// Result of [`Bot::edit_message_text`].
#[derive(Clone, Debug)]
pub enum EditOutcome {
    Edited(UpdateContent),
    /// The new text equals the current one; the platform left it untouched.
    NotModified,
}

impl Bot {
    pub async fn send_message(
        &self,
        chat: impl Into<ChatId>,
        text: &str,
        extra: Params,
    ) -> Result<UpdateContent> {
        self.ensure_bootstrapped()?;
        require_non_empty("text", text)?;
        let params = Params::new()
            .text("chat_id", chat.into().0)
            .text("text", text)
            .with_extra(extra)?;
        self.message_call("sendMessage", params).await
    }

    /// Re-send a photo already on the platform, by file id.
    pub async fn send_photo(
        &self,
        chat: impl Into<ChatId>,
        photo_file_id: &str,
        extra: Params,
    ) -> Result<UpdateContent> {
        self.ensure_bootstrapped()?;
        require_non_empty("photo file id", photo_file_id)?;
        let params = Params::new()
            .text("chat_id", chat.into().0)
            .text("photo", photo_file_id)
            .with_extra(extra)?;
        self.message_call("sendPhoto", params).await
    }

    pub async fn send_sticker(
        &self,
        chat: impl Into<ChatId>,
        sticker_file_id: &str,
        extra: Params,
    ) -> Result<UpdateContent> {
        self.ensure_bootstrapped()?;
        require_non_empty("sticker file id", sticker_file_id)?;
        let params = Params::new()
            .text("chat_id", chat.into().0)
            .text("sticker", sticker_file_id)
            .with_extra(extra)?;
        self.message_call("sendSticker", params).await
    }

    /// Upload `file` as a document (multipart body).
    pub async fn send_document(
        &self,
        chat: impl Into<ChatId>,
        file: InputFile,
        extra: Params,
    ) -> Result<UpdateContent> {
        self.ensure_bootstrapped()?;
        require_non_empty("document file name", &file.file_name)?;
        if file.bytes.is_empty() {
            return Err(Error::ArgumentType("document body is empty".to_string()));
        }
        let params = Params::new()
            .text("chat_id", chat.into().0)
            .file("document", file)
            .with_extra(extra)?;
        self.message_call("sendDocument", params).await
    }

    /// Replace the text of a message the bot sent. An edit that changes
    /// nothing is reported as [`EditOutcome::NotModified`], not as an error.
    pub async fn edit_message_text(
        &self,
        message: MessageRef,
        text: &str,
        extra: Params,
    ) -> Result<EditOutcome> {
        self.ensure_bootstrapped()?;
        require_non_empty("text", text)?;
        let params = Params::new()
            .text("chat_id", message.chat_id.0)
            .text("message_id", message.message_id.0)
            .text("text", text)
            .with_extra(extra)?;

        let resp = self.call("editMessageText", params).await?;
        if resp.is_not_modified() {
            return Ok(EditOutcome::NotModified);
        }
        message_content("editMessageText", resp).map(EditOutcome::Edited)
    }

    pub async fn delete_message(&self, message: MessageRef) -> Result<bool> {
        self.ensure_bootstrapped()?;
        let params = Params::new()
            .text("chat_id", message.chat_id.0)
            .text("message_id", message.message_id.0);
        let resp = self.call("deleteMessage", params).await?;
        Ok(flag(&resp))
    }

    pub async fn forward_message(
        &self,
        to: impl Into<ChatId>,
        from: impl Into<ChatId>,
        message_id: impl Into<MessageId>,
    ) -> Result<UpdateContent> {
        self.ensure_bootstrapped()?;
        let params = Params::new()
            .text("chat_id", to.into().0)
            .text("from_chat_id", from.into().0)
            .text("message_id", message_id.into().0);
        self.message_call("forwardMessage", params).await
    }

    /// Acknowledge a callback query, optionally showing `text` to the user.
    pub async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<bool> {
        self.ensure_bootstrapped()?;
        require_non_empty("callback query id", callback_id)?;
        let mut params = Params::new().text("callback_query_id", callback_id);
        if let Some(text) = text {
            params = params.text("text", text);
        }
        let resp = self.call("answerCallbackQuery", params).await?;
        Ok(flag(&resp))
    }

    async fn call(&self, method: &str, params: Params) -> Result<ApiResponse> {
        self.inner.ingest.transport.call(method, &params).await
    }

    async fn message_call(&self, method: &str, params: Params) -> Result<UpdateContent> {
        let resp = self.call(method, params).await?;
        message_content(method, resp)
    }
}

fn require_non_empty(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::ArgumentType(format!("{what} must not be empty")));
    }
    Ok(())
}

/// Decode the message object a method returned.
fn message_content(method: &str, resp: ApiResponse) -> Result<UpdateContent> {
    match resp.result {
        Some(result @ Value::Object(_)) => decode(&json!({ "result": result })).map(|(c, _)| c),
        other => Err(Error::malformed(format!(
            "{method}: expected a message result, got {}",
            other.unwrap_or(Value::Null)
        ))),
    }
}

fn flag(resp: &ApiResponse) -> bool {
    resp.ok && resp.result.as_ref().and_then(Value::as_bool).unwrap_or(false)
}
