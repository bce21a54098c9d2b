//! HTTP implementation of the remote store, speaking a PostgREST-style
//! relational API: equality filters in the query string, `order` + `limit`
//! for pagination, and upsert via `on_conflict` + `Prefer` headers.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::rows::{
    RemoteSessionRow, RemoteSettingsRow, RemoteStatsRow, RemoteTagRow, RemoteTimerStateRow,
};
use super::{RemoteError, RemoteResult, RemoteStore, TimerStateFeed};

pub struct HttpRemoteStore {
    client: Client,
    base_url: String,
    api_key: String,
    subscribe_poll: Duration,
}

impl HttpRemoteStore {
    pub fn new(base_url: &str, api_key: &str, subscribe_poll: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            subscribe_poll,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
    }

    async fn check(&self, response: Response) -> RemoteResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(RemoteError::Auth(message)),
            StatusCode::CONFLICT => Err(RemoteError::UniqueViolation(message)),
            _ => Err(RemoteError::Api {
                status: status.as_u16(),
                message,
            }),
        }
    }

    async fn insert_returning<T>(&self, table: &str, row: &T) -> RemoteResult<T>
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
    {
        let response = self
            .with_auth(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await?;
        let response = self.check(response).await?;
        let mut rows: Vec<T> = response.json().await?;
        rows.pop().ok_or_else(|| RemoteError::Api {
            status: 200,
            message: format!("insert into {table} returned no rows"),
        })
    }

    async fn insert_only<T: serde::Serialize>(&self, table: &str, row: &T) -> RemoteResult<()> {
        let response = self
            .with_auth(self.client.post(self.table_url(table)))
            .json(&[row])
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    async fn upsert_by_user<T: serde::Serialize>(&self, table: &str, row: &T) -> RemoteResult<()> {
        let url = format!("{}?on_conflict=user_id", self.table_url(table));
        let response = self
            .with_auth(self.client.post(url))
            .header("Prefer", "resolution=merge-duplicates")
            .json(&[row])
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    async fn select_for_user<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        user_id: &str,
        extra: &str,
    ) -> RemoteResult<Vec<T>> {
        let url = format!(
            "{}?user_id=eq.{}{}",
            self.table_url(table),
            user_id,
            extra
        );
        let response = self.with_auth(self.client.get(url)).send().await?;
        let response = self.check(response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn insert_session(&self, row: RemoteSessionRow) -> RemoteResult<RemoteSessionRow> {
        self.insert_returning("sessions", &row).await
    }

    async fn recent_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> RemoteResult<Vec<RemoteSessionRow>> {
        self.select_for_user(
            "sessions",
            user_id,
            &format!("&order=created_at.desc&limit={limit}"),
        )
        .await
    }

    async fn insert_tag(&self, row: RemoteTagRow) -> RemoteResult<RemoteTagRow> {
        self.insert_returning("tags", &row).await
    }

    async fn tags_for_user(&self, user_id: &str) -> RemoteResult<Vec<RemoteTagRow>> {
        self.select_for_user("tags", user_id, "").await
    }

    async fn fetch_settings(&self, user_id: &str) -> RemoteResult<Option<RemoteSettingsRow>> {
        let mut rows: Vec<RemoteSettingsRow> = self
            .select_for_user("user_settings", user_id, "&limit=1")
            .await?;
        Ok(rows.pop())
    }

    async fn upsert_settings(&self, row: RemoteSettingsRow) -> RemoteResult<()> {
        self.upsert_by_user("user_settings", &row).await
    }

    async fn insert_settings(&self, row: RemoteSettingsRow) -> RemoteResult<()> {
        self.insert_only("user_settings", &row).await
    }

    async fn fetch_timer_state(
        &self,
        user_id: &str,
    ) -> RemoteResult<Option<RemoteTimerStateRow>> {
        let mut rows: Vec<RemoteTimerStateRow> = self
            .select_for_user("active_timer_state", user_id, "&limit=1")
            .await?;
        Ok(rows.pop())
    }

    async fn upsert_timer_state(&self, row: RemoteTimerStateRow) -> RemoteResult<()> {
        self.upsert_by_user("active_timer_state", &row).await
    }

    async fn insert_timer_state(&self, row: RemoteTimerStateRow) -> RemoteResult<()> {
        self.insert_only("active_timer_state", &row).await
    }

    /// The API's change-subscription mechanism is modeled as a polling loop:
    /// the row's `updated_at` is compared each period and only changes are
    /// forwarded. The feed closes when cancelled or when the receiver drops.
    async fn subscribe_timer_state(&self, user_id: &str) -> RemoteResult<TimerStateFeed> {
        let (tx, rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let api_key = self.api_key.clone();
        let poll = self.subscribe_poll;
        let user_id = user_id.to_string();
        let task_cancel = cancel.clone();

        tokio::spawn(async move {
            let store = HttpRemoteStore {
                client,
                base_url,
                api_key,
                subscribe_poll: poll,
            };
            let mut last_seen: Option<String> = None;
            let mut interval = tokio::time::interval(poll);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    _ = interval.tick() => {}
                }

                match store.fetch_timer_state(&user_id).await {
                    Ok(Some(row)) => {
                        if row.updated_at != last_seen {
                            last_seen = row.updated_at.clone();
                            if tx.send(row).await.is_err() {
                                break;
                            }
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        // Transient poll failures are retried on the next tick.
                        warn!("Timer-state poll failed for {user_id}: {err}");
                    }
                }
            }
            debug!("Timer-state subscription for {user_id} closed");
        });

        Ok(TimerStateFeed::new(rx, cancel))
    }

    async fn fetch_stats(&self, user_id: &str) -> RemoteResult<RemoteStatsRow> {
        let url = format!("{}/rest/v1/rpc/session_stats", self.base_url);
        let response = self
            .with_auth(self.client.post(url))
            .json(&serde_json::json!({ "uid": user_id }))
            .send()
            .await?;
        let response = self.check(response).await?;
        Ok(response.json().await?)
    }
}
