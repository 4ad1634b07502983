//! reqwest adapter for the Bot API transport port.
//!
//! One POST per attempt to `{base}/bot{token}/{method}`: form-encoded when all
//! parameters are text, multipart as soon as one of them is a file. The body is
//! decoded as JSON whatever the HTTP status, since the platform reports
//! rejections in-band.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use tbot_core::{
    domain::BotCredential,
    errors::Error,
    transport::{ApiBackend, ApiRequest, ParamValue, Params},
    Bot, Config, Result,
};

#[derive(Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
    credential: BotCredential,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url)
            .field("credential", &self.credential)
            .finish()
    }
}

impl HttpBackend {
    pub fn new(base_url: &str, credential: BotCredential) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::External(format!("http client build error: {e}")))?;
        Ok(Self::with_client(http, base_url, credential))
    }

    pub fn with_client(http: reqwest::Client, base_url: &str, credential: BotCredential) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credential,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.credential.expose(), method)
    }
}

#[async_trait]
impl ApiBackend for HttpBackend {
    async fn post(&self, req: ApiRequest<'_>) -> Result<Value> {
        let builder = self
            .http
            .post(self.method_url(req.method))
            .timeout(req.timeout);
        let builder = if req.params.has_files() {
            builder.multipart(multipart_form(req.params)?)
        } else {
            builder.form(&form_pairs(req.params))
        };

        tracing::trace!(method = req.method, params = req.params.len(), "bot api request");
        let resp = builder.send().await.map_err(classify)?;
        let status = resp.status();
        let body: Value = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                classify(e)
            } else {
                Error::External(format!("{}: undecodable body ({status}): {}", req.method, e.without_url()))
            }
        })?;
        Ok(body)
    }
}

/// Build a bot talking to the real API (or `cfg.api_base_url`).
pub fn connect(cfg: Config) -> Result<Bot> {
    let credential = BotCredential::new(cfg.token.as_str())?;
    let backend = HttpBackend::new(&cfg.api_base_url, credential)?;
    Bot::new(cfg, Arc::new(backend))
}

/// Timeouts and connection failures are retried by the transport; everything
/// else is surfaced. The URL carries the token, so it is stripped.
fn classify(e: reqwest::Error) -> Error {
    let transient = e.is_timeout() || e.is_connect();
    let e = e.without_url();
    if transient {
        Error::Transient(e.to_string())
    } else {
        Error::External(format!("http request error: {e}"))
    }
}

fn form_pairs(params: &Params) -> Vec<(&str, &str)> {
    params
        .iter()
        .filter_map(|(k, v)| match v {
            ParamValue::Text(s) => Some((k, s.as_str())),
            ParamValue::File(_) => None,
        })
        .collect()
}

fn multipart_form(params: &Params) -> Result<Form> {
    let mut form = Form::new();
    for (key, value) in params.iter() {
        form = match value {
            ParamValue::Text(s) => form.text(key.to_string(), s.clone()),
            ParamValue::File(f) => {
                let part = Part::bytes(f.bytes.clone())
                    .file_name(f.file_name.clone())
                    .mime_str(&f.mime_type)
                    .map_err(|e| Error::ArgumentType(format!("invalid mime type `{}`: {e}", f.mime_type)))?;
                form.part(key.to_string(), part)
            }
        };
    }
    Ok(form)
}
