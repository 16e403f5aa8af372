//! High score service client
//!
//! Builds requests and parses responses without doing any I/O. The browser
//! transport lives in `platform::web`; `MemoryScoreStore` answers the same
//! protocol in-process for native runs and tests.

use serde_json::{Value, json};

use crate::highscores::{Leaderboard, ScoreEntry, ScoreError, sanitize_markup};

/// Path of the high score resource below the API base
const HIGHSCORES_PATH: &str = "/highscores";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Transport-agnostic HTTP request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// JSON body, POST only
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    fn json(status: u16, value: Value) -> Self {
        Self {
            status,
            body: value.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Client for `{base}/highscores`
#[derive(Debug, Clone)]
pub struct ScoreClient {
    base: String,
}

impl ScoreClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    fn url(&self) -> String {
        format!("{}{}", self.base.trim_end_matches('/'), HIGHSCORES_PATH)
    }

    /// POST a new entry
    pub fn submit_request(&self, entry: &ScoreEntry) -> HttpRequest {
        let body = json!({ "name": entry.name, "score": entry.score });
        HttpRequest {
            method: Method::Post,
            url: self.url(),
            body: Some(body.to_string()),
        }
    }

    /// GET every stored entry
    pub fn fetch_request(&self) -> HttpRequest {
        HttpRequest {
            method: Method::Get,
            url: self.url(),
            body: None,
        }
    }

    pub fn parse_submit_response(&self, response: &HttpResponse) -> Result<(), ScoreError> {
        check_status(response)?;
        let value: Value = serde_json::from_str(&response.body)
            .map_err(|e| ScoreError::Malformed(e.to_string()))?;
        match value.get("success").and_then(Value::as_bool) {
            Some(true) => Ok(()),
            _ => Err(ScoreError::Malformed(format!(
                "expected success flag, got {}",
                response.body
            ))),
        }
    }

    /// Parse the stored entries into a ranked leaderboard
    pub fn parse_fetch_response(&self, response: &HttpResponse) -> Result<Leaderboard, ScoreError> {
        check_status(response)?;
        let entries: Vec<ScoreEntry> = serde_json::from_str(&response.body)
            .map_err(|e| ScoreError::Malformed(e.to_string()))?;
        Ok(Leaderboard::from_entries(entries))
    }
}

/// Message from an error body (`{"error": ...}` or `{"err": ...}`)
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;
    object
        .get("error")
        .or_else(|| object.get("err"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// The service reports some errors with a 200 status, so an error body
/// counts as a rejection whatever the status
fn check_status(response: &HttpResponse) -> Result<(), ScoreError> {
    if let Some(message) = error_message(&response.body) {
        return Err(ScoreError::Rejected {
            status: response.status,
            message,
        });
    }
    if !response.is_success() {
        return Err(ScoreError::Rejected {
            status: response.status,
            message: response.body.clone(),
        });
    }
    Ok(())
}

/// In-process, append-only score store speaking the service protocol
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    rows: Vec<ScoreEntry>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored rows, in insertion order
    pub fn rows(&self) -> &[ScoreEntry] {
        &self.rows
    }

    /// Answer one request. Unknown paths get a 200 with `{"err": "404"}`,
    /// as the deployed service does.
    pub fn handle(&mut self, request: &HttpRequest) -> HttpResponse {
        if !request.url.ends_with(HIGHSCORES_PATH) {
            return HttpResponse::json(200, json!({ "err": "404" }));
        }
        match request.method {
            Method::Get => match serde_json::to_value(&self.rows) {
                Ok(rows) => HttpResponse::json(200, rows),
                Err(e) => HttpResponse::json(500, json!({ "error": e.to_string() })),
            },
            Method::Post => self.insert(request.body.as_deref().unwrap_or_default()),
        }
    }

    fn insert(&mut self, body: &str) -> HttpResponse {
        let invalid = || HttpResponse::json(400, json!({ "error": "Invalid input" }));
        let Ok(value) = serde_json::from_str::<Value>(body) else {
            return invalid();
        };
        let name = value.get("name").and_then(Value::as_str).unwrap_or_default();
        let score = value.get("score").and_then(Value::as_u64).unwrap_or_default();
        if name.is_empty() || score == 0 {
            return invalid();
        }

        let entry = ScoreEntry {
            name: sanitize_markup(name),
            score,
            score_date: None,
        };
        log::info!("Stored score {} for {}", entry.score, entry.name);
        self.rows.push(entry);
        HttpResponse::json(200, json!({ "success": true }))
    }
}
