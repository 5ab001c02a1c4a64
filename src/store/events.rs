// Server-sent events as emitted by the realtime database streaming endpoint

use serde::Deserialize;
use serde_json::{Map, Value};

use super::tree::{self, segments};

/// One raw `event:` / `data:` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEvent {
    pub event: String,
    pub data: String,
}

/// Incremental parser; chunks may split events anywhere, including inside UTF-8 sequences.
#[derive(Debug, Default)]
pub struct EventStreamParser {
    buffer: Vec<u8>,
}

impl EventStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ServerEvent> {
        self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = find_blank_line(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(event) = parse_block(&String::from_utf8_lossy(&block)) {
                events.push(event);
            }
        }
        events
    }
}

fn find_blank_line(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

fn parse_block(block: &str) -> Option<ServerEvent> {
    let mut event = None;
    let mut data: Vec<&str> = Vec::new();
    for line in block.lines() {
        if let Some(rest) = line.strip_prefix("event:") {
            event = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            data.push(rest.trim_start());
        }
    }
    Some(ServerEvent {
        event: event?,
        data: data.join("\n"),
    })
}

#[derive(Debug, Deserialize)]
struct PathData {
    path: String,
    data: Value,
}

/// Decoded stream event
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Put { path: String, data: Value },
    Patch { path: String, data: Map<String, Value> },
    KeepAlive,
    /// Server closed the stream (`cancel` or `auth_revoked`)
    Closed { reason: String },
    Unknown(String),
}

impl StreamEvent {
    pub fn decode(raw: &ServerEvent) -> Result<Self, serde_json::Error> {
        Ok(match raw.event.as_str() {
            "put" => {
                let PathData { path, data } = serde_json::from_str(&raw.data)?;
                StreamEvent::Put { path, data }
            }
            "patch" => {
                let PathData { path, data } = serde_json::from_str(&raw.data)?;
                let data = match data {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                StreamEvent::Patch { path, data }
            }
            "keep-alive" => StreamEvent::KeepAlive,
            "cancel" | "auth_revoked" => StreamEvent::Closed {
                reason: raw.event.clone(),
            },
            other => StreamEvent::Unknown(other.to_string()),
        })
    }

    /// Apply to the cached value of the subscribed path. Returns true when the cache changed.
    pub fn apply(self, cache: &mut Value) -> bool {
        match self {
            StreamEvent::Put { path, data } => {
                tree::set_at(cache, &segments(&path), data);
                true
            }
            StreamEvent::Patch { path, data } => {
                tree::update_at(cache, &segments(&path), data);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_events_split_across_chunks() {
        let mut parser = EventStreamParser::new();
        let first = parser.feed(b"event: put\ndata: {\"path\":\"/\",");
        assert!(first.is_empty());

        let second = parser.feed(b"\"data\":{\"m1\":{\"name\":\"Biz\"}}}\r\n\r\nevent: keep-alive\ndata: null\n\n");
        assert_eq!(second.len(), 2);
        assert_eq!(second[0].event, "put");
        assert_eq!(second[1].event, "keep-alive");
    }

    #[test]
    fn test_put_and_patch_update_cache() {
        let mut cache = Value::Null;
        let put = ServerEvent {
            event: "put".into(),
            data: r#"{"path":"/","data":{"m1":{"name":"Biz","isAvailable":true}}}"#.into(),
        };
        assert!(StreamEvent::decode(&put).unwrap().apply(&mut cache));

        let patch = ServerEvent {
            event: "patch".into(),
            data: r#"{"path":"/m1","data":{"client":"Ana","isAvailable":false}}"#.into(),
        };
        assert!(StreamEvent::decode(&patch).unwrap().apply(&mut cache));
        assert_eq!(
            cache,
            json!({"m1": {"name": "Biz", "client": "Ana", "isAvailable": false}})
        );

        let delete = ServerEvent {
            event: "put".into(),
            data: r#"{"path":"/m1","data":null}"#.into(),
        };
        StreamEvent::decode(&delete).unwrap().apply(&mut cache);
        assert_eq!(tree::snapshot(&cache, &[]), None);
    }

    #[test]
    fn test_cancel_closes_stream() {
        let raw = ServerEvent {
            event: "auth_revoked".into(),
            data: "credential is no longer valid".into(),
        };
        assert!(matches!(
            StreamEvent::decode(&raw).unwrap(),
            StreamEvent::Closed { .. }
        ));
    }

    #[test]
    fn test_block_without_event_name_is_skipped() {
        let mut parser = EventStreamParser::new();
        assert!(parser.feed(b": comment\n\n").is_empty());
    }
}
