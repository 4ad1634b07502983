use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::{errors::Error, Result};

/// A file uploaded as a multipart part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    File(InputFile),
}

/// Ordered method parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, ParamValue)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key.into(), ParamValue::Text(value.to_string()));
        self
    }

    pub fn file(mut self, key: impl Into<String>, file: InputFile) -> Self {
        self.set(key.into(), ParamValue::File(file));
        self
    }

    fn set(&mut self, key: String, value: ParamValue) {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn has_files(&self) -> bool {
        self.0.iter().any(|(_, v)| matches!(v, ParamValue::File(_)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append caller-supplied optional parameters. They may not replace the
    /// ones the method already set.
    pub fn with_extra(mut self, extra: Params) -> Result<Self> {
        for (key, value) in extra.0 {
            if self.contains(&key) {
                return Err(Error::ArgumentType(format!(
                    "extra parameter `{key}` would override a required parameter"
                )));
            }
            self.0.push((key, value));
        }
        Ok(self)
    }
}

/// One HTTP attempt against the Bot API.
#[derive(Clone, Copy, Debug)]
pub struct ApiRequest<'a> {
    pub method: &'a str,
    pub params: &'a Params,
    pub timeout: Duration,
}

/// Hexagonal port for the wire.
///
/// Implementations perform exactly one exchange and return the decoded JSON
/// body whatever the HTTP status (the platform reports rejections in-band).
/// Timeouts and connection failures must map to [`Error::Transient`]; the
/// [`Transport`](super::Transport) retries only those.
#[async_trait]
pub trait ApiBackend: Send + Sync {
    async fn post(&self, req: ApiRequest<'_>) -> Result<Value>;
}
