use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::Config;
use crate::error::{GameError, GameResult};
use crate::types::Player;

/// Remote table of players keyed by identity: `{id, score, updated_at}`.
#[async_trait]
pub trait PlayerBackend: Send + Sync {
    /// Inserts a new row with the given score and returns the backend-assigned identity.
    async fn create_player(&self, initial_score: i64) -> GameResult<Player>;

    /// `None` when no row exists for `id`.
    async fn read_player(&self, id: &str) -> GameResult<Option<Player>>;

    async fn update_score(&self, id: &str, score: i64, updated_at: DateTime<Utc>) -> GameResult<()>;
}

#[derive(Debug, Serialize)]
struct NewPlayer {
    score: i64,
}

#[derive(Debug, Serialize)]
struct ScoreUpdate {
    score: i64,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlayerRow {
    id: serde_json::Value,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: Option<String>,
}

/// Ids may be uuid strings or bigint sequences depending on the table definition.
fn id_to_string(id: &serde_json::Value) -> Option<String> {
    match id {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First row of a PostgREST representation, `None` when the result set is empty.
pub(crate) fn parse_player(body: &str, op: &str) -> GameResult<Option<Player>> {
    let rows: Vec<PlayerRow> = serde_json::from_str(body)
        .map_err(|e| GameError::Backend(format!("unexpected {op} response: {e}")))?;
    let Some(row) = rows.into_iter().next() else {
        return Ok(None);
    };
    let id = id_to_string(&row.id)
        .ok_or_else(|| GameError::Backend(format!("{op} returned invalid id {}", row.id)))?;
    Ok(Some(Player { id, score: row.score, updated_at: row.updated_at }))
}

pub(crate) fn parse_created(body: &str) -> GameResult<Player> {
    parse_player(body, "create")?.ok_or_else(|| GameError::Backend("create returned no rows".into()))
}

/// Human-readable error from a failed PostgREST call; falls back to the raw body.
pub(crate) fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<PostgrestError>(body) {
        Ok(PostgrestError { message: Some(msg) }) => msg,
        _ if body.trim().is_empty() => format!("backend returned {status}"),
        _ => format!("backend returned {status}: {body}"),
    }
}

/// Supabase REST (PostgREST) client for the players table
#[derive(Debug, Clone)]
pub struct SupabaseBackend {
    http_client: reqwest::Client,
    table_url: Url,
    anon_key: String,
}

impl SupabaseBackend {
    pub fn new(http_client: reqwest::Client, config: &Config) -> GameResult<Self> {
        let table_url = table_url(&config.supabase_url, &config.players_table)?;
        Ok(Self {
            http_client,
            table_url,
            anon_key: config.supabase_anon_key.clone(),
        })
    }

    fn headers(&self) -> GameResult<HeaderMap> {
        let bad_key = |e: reqwest::header::InvalidHeaderValue| {
            GameError::Backend(format!("invalid access key: {e}"))
        };
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(&self.anon_key).map_err(bad_key)?);
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {}", self.anon_key)).map_err(bad_key)?,
        );
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    pub(crate) fn row_url(&self, id: &str) -> Url {
        let mut url = self.table_url.clone();
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        url
    }

    async fn send(&self, req: reqwest::RequestBuilder, op: &str) -> GameResult<String> {
        let resp = req
            .send()
            .await
            .map_err(|e| GameError::Backend(format!("{op} request failed: {e}")))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| GameError::Backend(format!("{op} response unreadable: {e}")))?;

        if !status.is_success() {
            tracing::warn!(op, status = %status, body, "backend HTTP error");
            return Err(GameError::Backend(error_message(status, &body)));
        }
        Ok(body)
    }
}

pub(crate) fn table_url(base: &str, table: &str) -> GameResult<Url> {
    let raw = format!("{}/rest/v1/{}", base.trim_end_matches('/'), table);
    Url::parse(&raw).map_err(|e| GameError::Backend(format!("invalid backend URL {raw}: {e}")))
}

#[async_trait]
impl PlayerBackend for SupabaseBackend {
    async fn create_player(&self, initial_score: i64) -> GameResult<Player> {
        let req = self
            .http_client
            .post(self.table_url.clone())
            .headers(self.headers()?)
            .header("Prefer", "return=representation")
            .json(&[NewPlayer { score: initial_score }]);

        let body = self.send(req, "create player").await?;
        let player = parse_created(&body)?;
        tracing::info!(player_id = %player.id, "player created");
        Ok(player)
    }

    async fn read_player(&self, id: &str) -> GameResult<Option<Player>> {
        let mut url = self.row_url(id);
        url.query_pairs_mut().append_pair("select", "id,score,updated_at");

        let req = self.http_client.get(url).headers(self.headers()?);
        let body = self.send(req, "read player").await?;
        parse_player(&body, "read")
    }

    async fn update_score(&self, id: &str, score: i64, updated_at: DateTime<Utc>) -> GameResult<()> {
        let req = self
            .http_client
            .patch(self.row_url(id))
            .headers(self.headers()?)
            .header("Prefer", "return=minimal")
            .json(&ScoreUpdate { score, updated_at });

        self.send(req, "update score").await?;
        tracing::info!(player_id = id, score, "score persisted");
        Ok(())
    }
}
