//! Long-poll chat-API client (Telegram-compatible bot HTTP API).
//!
//! Implements both transport ports: [`EventSource`] by long-polling
//! `getUpdates`, and [`ChatPort`] via `sendMessage` / `sendPhoto`. The rest
//! of the engine never sees this wire format.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use armory_domain::UserId;
use armory_shared::{ChoiceOption, Envelope, InboundEvent, Keyboard};

use crate::infrastructure::ports::{ChatError, ChatPort, EventSource};

/// Default bot API base URL.
pub const DEFAULT_BOT_API_BASE_URL: &str = "https://api.telegram.org";

/// Long-poll wait, in seconds. The request timeout must exceed this.
const POLL_TIMEOUT_SECS: u64 = 25;

#[derive(Clone)]
pub struct BotApiClient {
    client: Client,
    base_url: String,
    token: String,
    offset: std::sync::Arc<AtomicI64>,
}

impl BotApiClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            offset: std::sync::Arc::new(AtomicI64::new(0)),
        }
    }

    /// Create client from environment variables.
    ///
    /// Uses `BOT_API_URL` and `BOT_TOKEN`, falling back to the public API
    /// host when no URL is set.
    pub fn from_env() -> Result<Self, ChatError> {
        let base_url =
            std::env::var("BOT_API_URL").unwrap_or_else(|_| DEFAULT_BOT_API_BASE_URL.to_string());
        let token = std::env::var("BOT_TOKEN")
            .map_err(|_| ChatError::RequestFailed("BOT_TOKEN is not set".to_string()))?;
        Ok(Self::new(&base_url, &token))
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.base_url, self.token, file_path)
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        payload: serde_json::Value,
    ) -> Result<T, ChatError> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&payload)
            .send()
            .await
            .map_err(|e| ChatError::RequestFailed(e.to_string()))?;

        let api: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;
        api.into_result()
    }

    async fn answer_callback(&self, callback_id: &str) {
        // Best effort: failing to dismiss the client-side spinner is harmless.
        let result: Result<bool, ChatError> = self
            .call("answerCallbackQuery", json!({ "callback_query_id": callback_id }))
            .await;
        if let Err(e) = result {
            tracing::debug!("answerCallbackQuery failed: {e}");
        }
    }

    async fn map_update(&self, update: Update) -> Option<Envelope> {
        if let Some(cq) = update.callback_query {
            self.answer_callback(&cq.id).await;
            let value = cq.data?;
            return Some(Envelope::new(
                UserId::new(cq.from.id),
                cq.from.display_name(),
                InboundEvent::Choice { value },
            ));
        }

        let message = update.message?;
        let from = message.from?;
        let user = UserId::new(from.id);
        let name = from.display_name();

        if let Some(text) = message.text {
            if let Some(stripped) = text.strip_prefix('/') {
                // "/status@armory_bot arg" -> "status"
                let name_token = stripped
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .split('@')
                    .next()
                    .unwrap_or_default()
                    .to_string();
                return Some(Envelope::new(user, name, InboundEvent::Command { name: name_token }));
            }
            return Some(Envelope::new(user, name, InboundEvent::Text { content: text }));
        }

        // Largest photo size comes last.
        if let Some(photo) = message.photo.and_then(|sizes| sizes.into_iter().last()) {
            return Some(Envelope::new(
                user,
                name,
                InboundEvent::Image { asset: photo.file_id },
            ));
        }

        if let Some(doc) = message.document {
            if doc
                .mime_type
                .as_deref()
                .is_some_and(|m| m.starts_with("image/"))
            {
                return Some(Envelope::new(
                    user,
                    name,
                    InboundEvent::Image { asset: doc.file_id },
                ));
            }
        }

        None
    }
}

fn reply_markup(keyboard: Option<&Keyboard>) -> Option<serde_json::Value> {
    keyboard.map(|kb| {
        let rows: Vec<Vec<serde_json::Value>> = kb
            .rows
            .iter()
            .map(|row| row.iter().map(|b| json!({ "text": b })).collect())
            .collect();
        json!({ "keyboard": rows, "resize_keyboard": true })
    })
}

#[async_trait]
impl EventSource for BotApiClient {
    async fn next_batch(&self) -> Result<Vec<Envelope>, ChatError> {
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                json!({
                    "offset": self.offset.load(Ordering::SeqCst),
                    "timeout": POLL_TIMEOUT_SECS,
                }),
            )
            .await?;

        let mut events = Vec::with_capacity(updates.len());
        for update in updates {
            let next = update.update_id + 1;
            self.offset.fetch_max(next, Ordering::SeqCst);
            if let Some(envelope) = self.map_update(update).await {
                events.push(envelope);
            }
        }
        Ok(events)
    }
}

#[async_trait]
impl ChatPort for BotApiClient {
    async fn send_text<'a>(
        &self,
        user: UserId,
        body: &str,
        keyboard: Option<&'a Keyboard>,
    ) -> Result<(), ChatError> {
        let mut payload = json!({ "chat_id": user.as_i64(), "text": body });
        if let Some(markup) = reply_markup(keyboard) {
            payload["reply_markup"] = markup;
        }
        let _: Message = self.call("sendMessage", payload).await?;
        Ok(())
    }

    async fn send_image<'a>(
        &self,
        user: UserId,
        asset: &str,
        caption: &str,
        keyboard: Option<&'a Keyboard>,
    ) -> Result<(), ChatError> {
        let bytes = tokio::fs::read(asset)
            .await
            .map_err(|e| ChatError::RequestFailed(format!("read {asset}: {e}")))?;

        let mut form = Form::new()
            .text("chat_id", user.as_i64().to_string())
            .text("caption", caption.to_string())
            .part("photo", Part::bytes(bytes).file_name("build.jpg"));
        if let Some(markup) = reply_markup(keyboard) {
            form = form.text("reply_markup", markup.to_string());
        }

        let response = self
            .client
            .post(self.method_url("sendPhoto"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ChatError::RequestFailed(e.to_string()))?;
        let api: ApiResponse<Message> = response
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;
        api.into_result().map(|_| ())
    }

    async fn present_choices(
        &self,
        user: UserId,
        prompt: &str,
        options: &[ChoiceOption],
    ) -> Result<(), ChatError> {
        let rows: Vec<Vec<serde_json::Value>> = options
            .iter()
            .map(|o| vec![json!({ "text": o.label, "callback_data": o.value })])
            .collect();
        let payload = json!({
            "chat_id": user.as_i64(),
            "text": prompt,
            "reply_markup": { "inline_keyboard": rows },
        });
        let _: Message = self.call("sendMessage", payload).await?;
        Ok(())
    }

    async fn fetch_asset(&self, handle: &str) -> Result<Vec<u8>, ChatError> {
        let info: FileInfo = self.call("getFile", json!({ "file_id": handle })).await?;
        let file_path = info
            .file_path
            .ok_or_else(|| ChatError::InvalidResponse("getFile returned no path".to_string()))?;

        let response = self
            .client
            .get(self.file_url(&file_path))
            .send()
            .await
            .map_err(|e| ChatError::RequestFailed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ChatError::RequestFailed(format!(
                "file download failed with status {}",
                response.status()
            )));
        }
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| ChatError::RequestFailed(e.to_string()))
    }
}

// =============================================================================
// Wire DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, ChatError> {
        if !self.ok {
            return Err(ChatError::RequestFailed(
                self.description.unwrap_or_else(|| "request rejected".to_string()),
            ));
        }
        self.result
            .ok_or_else(|| ChatError::InvalidResponse("missing result".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<Message>,
    #[serde(default)]
    callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    from: Option<User>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    photo: Option<Vec<PhotoSize>>,
    #[serde(default)]
    document: Option<Document>,
}

#[derive(Debug, Deserialize)]
struct User {
    id: i64,
    first_name: String,
    #[serde(default)]
    last_name: Option<String>,
}

impl User {
    fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {last}", self.first_name),
            None => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PhotoSize {
    file_id: String,
}

#[derive(Debug, Deserialize)]
struct Document {
    file_id: String,
    #[serde(default)]
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    id: String,
    from: User,
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    #[serde(default)]
    file_path: Option<String>,
}
