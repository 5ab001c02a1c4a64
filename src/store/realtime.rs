use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder};
use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::events::{EventStreamParser, StreamEvent};
use super::tree;
use super::{DataStore, Subscription};
use crate::{FleetError, Result};

/// REST client for a Firebase-style realtime database.
///
/// Every path maps to `{database_url}/{path}.json`. Live subscriptions use the
/// server-sent-events variant of the same URL.
#[derive(Debug, Clone)]
pub struct RealtimeStore {
    client: Client,
    database_url: String,
    auth_token: Option<String>,
}

impl RealtimeStore {
    pub fn new(database_url: impl Into<String>, auth_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            database_url: database_url.into().trim_end_matches('/').to_string(),
            auth_token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.database_url, path.trim_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.query(&[("auth", token.as_str())]),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, operation: &str, path: &str) -> Result<reqwest::Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| FleetError::persistence(format!("{operation} {path}"), e))?;
        response
            .error_for_status()
            .map_err(|e| FleetError::persistence(format!("{operation} {path}"), e))
    }
}

#[async_trait]
impl DataStore for RealtimeStore {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        let response = self.send(self.client.get(self.url(path)), "get", path).await?;
        let value: Value = response.json().await?;
        Ok(tree::snapshot(&value, &[]))
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription> {
        let initial = self.get(path).await?;
        let (sender, receiver) = watch::channel(initial.clone());

        let request = self
            .authorized(self.client.get(self.url(path)))
            .header(ACCEPT, "text/event-stream");
        let watched = path.to_string();
        let feeder = tokio::spawn(async move {
            if let Err(e) = stream_events(request, initial.unwrap_or(Value::Null), sender).await {
                warn!(path = %watched, error = %e, "Realtime subscription ended with error");
            }
        });

        info!(path = %path, "Subscribed to realtime path");
        Ok(Subscription::new(path, receiver).with_feeder(feeder))
    }

    async fn set(&self, path: &str, value: Value) -> Result<()> {
        self.send(self.client.put(self.url(path)).json(&value), "set", path)
            .await?;
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<()> {
        self.send(self.client.patch(self.url(path)).json(&fields), "update", path)
            .await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        self.send(self.client.delete(self.url(path)), "remove", path)
            .await?;
        Ok(())
    }
}

async fn stream_events(
    request: RequestBuilder,
    mut cache: Value,
    sender: watch::Sender<Option<Value>>,
) -> Result<()> {
    let response = request.send().await?.error_for_status()?;
    let mut body = response.bytes_stream();
    let mut parser = EventStreamParser::new();

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        for raw in parser.feed(&chunk) {
            let event = match StreamEvent::decode(&raw) {
                Ok(event) => event,
                Err(e) => {
                    error!(event = %raw.event, error = %e, "Undecodable stream event");
                    continue;
                }
            };
            if let StreamEvent::Closed { reason } = &event {
                info!(reason = %reason, "Realtime stream closed by server");
                return Ok(());
            }
            if event.apply(&mut cache) {
                let snapshot = tree::snapshot(&cache, &[]);
                sender.send_if_modified(|current| {
                    if *current == snapshot {
                        false
                    } else {
                        *current = snapshot;
                        true
                    }
                });
            }
            if sender.is_closed() {
                debug!("All subscribers dropped, stopping stream");
                return Ok(());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_path_with_json_suffix() {
        let store = RealtimeStore::new("https://fleet.example.com/", None);
        assert_eq!(
            store.url("/motorcycles/m1"),
            "https://fleet.example.com/motorcycles/m1.json"
        );
        assert_eq!(store.url(""), "https://fleet.example.com/.json");
    }
}
