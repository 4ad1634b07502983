use std::fmt;

use crate::{errors::Error, Result};

/// Required length of a bot token as issued by BotFather.
pub const TOKEN_LEN: usize = 46;

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i64);

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        ChatId(id)
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        MessageId(id)
    }
}

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Bot token, validated once and immutable afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct BotCredential(String);

impl BotCredential {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        let len = token.chars().count();
        if len != TOKEN_LEN {
            return Err(Error::Token(format!(
                "invalid token length, should be {TOKEN_LEN} and it's {len}"
            )));
        }
        Ok(Self(token))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BotCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keep the numeric bot id visible, hide the secret half.
        let id = self.0.split(':').next().unwrap_or("");
        write!(f, "BotCredential({id}:***)")
    }
}

#[cfg(test)]
pub(crate) const TEST_TOKEN: &str = "1234567890:AAbbCCddEEffGGhhIIjjKKllMMnnOOppQQr";
