//! JokeAPI importer.
//!
//! Fetches jokes in batches of at most [`MAX_JOKES_PER_REQUEST`] until the
//! target is reached or JokeAPI returns an empty batch, drops jokes without an
//! id or with an id already seen, and upserts the rest into `jokes`.
//!
//! The HTTP side sits behind [`JokeSource`] so the fetch loop can run against
//! a scripted source in tests.

pub mod store;

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::logs::{log_info, log_success};
use crate::error::{JokeError, JokeResult};
use crate::models::{ImportCounts, Joke};

pub use store::{ensure_schema, fetch_stored_jokes, upsert_jokes, upsert_jokes_at};

/// Default upstream endpoint.
pub const JOKE_API_BASE_URL: &str = "https://v2.jokeapi.dev/joke";

/// JokeAPI caps `amount` at 10.
pub const MAX_JOKES_PER_REQUEST: u32 = 10;

pub const DEFAULT_TARGET_JOKES: u32 = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A joke as JokeAPI sends it. Everything is optional so odd payloads still
/// deserialize; [`normalize_jokes`] decides what survives.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawJoke {
    pub id: Option<i64>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub joke: Option<String>,
    pub setup: Option<String>,
    pub delivery: Option<String>,
    #[serde(default)]
    pub flags: RawFlags,
    pub safe: Option<bool>,
    pub lang: Option<String>,
}

/// Content flags. Only the ones we store are read.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawFlags {
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub political: bool,
    #[serde(default)]
    pub sexist: bool,
}

/// Where jokes come from.
pub trait JokeSource {
    /// Fetch up to `amount` jokes in one request.
    fn fetch_batch(&self, amount: u32) -> impl Future<Output = JokeResult<Vec<RawJoke>>> + Send;
}

/// JokeAPI over HTTP.
#[derive(Clone)]
pub struct HttpJokeSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpJokeSource {
    pub fn new(base_url: impl Into<String>) -> JokeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| JokeError::Upstream(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl JokeSource for HttpJokeSource {
    async fn fetch_batch(&self, amount: u32) -> JokeResult<Vec<RawJoke>> {
        let response = self
            .client
            .get(format!("{}/Any", self.base_url))
            .query(&[("amount", amount.to_string()), ("safe-mode", String::new())])
            .send()
            .await
            .map_err(|e| JokeError::Upstream(e.to_string()))?
            .error_for_status()
            .map_err(|e| JokeError::Upstream(e.to_string()))?;

        let payload: Value = response
            .json()
            .await
            .map_err(|e| JokeError::InvalidPayload(e.to_string()))?;

        parse_batch(payload)
    }
}

/// Interpret one JokeAPI response body.
///
/// Multi-joke responses carry a `jokes` array; single-joke responses are the
/// joke itself.
pub fn parse_batch(payload: Value) -> JokeResult<Vec<RawJoke>> {
    if payload.get("error").and_then(Value::as_bool).unwrap_or(false) {
        let message = payload
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(JokeError::UpstreamReported(message));
    }

    let parsed = match payload.get("jokes") {
        Some(jokes) => serde_json::from_value(jokes.clone()),
        None => serde_json::from_value(payload).map(|joke| vec![joke]),
    };

    parsed.map_err(|e| JokeError::InvalidPayload(e.to_string()))
}

/// Collect up to `target` raw jokes.
///
/// Stops early when the source returns an empty batch. Duplicates count
/// toward the target, so fewer distinct jokes may come back.
pub async fn fetch_jokes<S: JokeSource>(source: &S, target: u32) -> JokeResult<Vec<RawJoke>> {
    let mut jokes: Vec<RawJoke> = Vec::new();

    while jokes.len() < target as usize {
        let remaining = target - jokes.len() as u32;
        let batch = source.fetch_batch(MAX_JOKES_PER_REQUEST.min(remaining)).await?;
        if batch.is_empty() {
            break;
        }
        jokes.extend(batch);
    }

    Ok(jokes)
}

/// Map one raw joke to its stored shape. `None` without an id.
///
/// `joke` is only kept for `single` jokes, `setup`/`delivery` only for
/// `twopart` ones.
pub fn transform_joke(raw: RawJoke) -> Option<Joke> {
    let joke_id = raw.id?;
    let kind = raw.kind.unwrap_or_default();

    let (joke, setup, delivery) = match kind.as_str() {
        "single" => (raw.joke, None, None),
        "twopart" => (None, raw.setup, raw.delivery),
        _ => (None, None, None),
    };

    Some(Joke {
        joke_id,
        category: raw.category.unwrap_or_default(),
        kind,
        flag_nsfw: raw.flags.nsfw,
        flag_political: raw.flags.political,
        flag_sexist: raw.flags.sexist,
        safe: raw.safe.unwrap_or(true),
        lang: raw.lang.unwrap_or_default(),
        joke,
        setup,
        delivery,
    })
}

/// Drop id-less jokes and repeated ids (first occurrence wins), then transform.
pub fn normalize_jokes(raw: Vec<RawJoke>) -> Vec<Joke> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .filter_map(transform_joke)
        .filter(|joke| seen.insert(joke.joke_id))
        .collect()
}

/// Fetch, deduplicate and upsert jokes into the database at `database_path`.
///
/// # Errors
/// [`JokeError::InvalidTarget`] when `target < 1`, before any request is made.
pub async fn import_jokes<S: JokeSource>(
    source: &S,
    target: i64,
    database_path: PathBuf,
) -> JokeResult<ImportCounts> {
    let requested = u32::try_from(target)
        .ok()
        .filter(|t| *t >= 1)
        .ok_or(JokeError::InvalidTarget(target))?;

    log_info(format!("🃏 Fetching {} jokes...", requested));
    let raw = fetch_jokes(source, requested).await?;
    let jokes = normalize_jokes(raw);
    log_success(format!("{} distinct jokes", jokes.len()));

    let fetched = jokes.len();
    let (inserted, updated) =
        tokio::task::spawn_blocking(move || upsert_jokes_at(&database_path, &jokes))
            .await
            .map_err(|e| JokeError::Task(e.to_string()))??;

    log_success(format!("{} inserted, {} updated", inserted, updated));

    Ok(ImportCounts {
        requested,
        fetched,
        inserted,
        updated,
    })
}
