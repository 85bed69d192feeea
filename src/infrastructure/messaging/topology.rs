//! Exchange/queue/binding layout that routes car events to consumers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Exchange routing style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeKind {
    Direct,
    Fanout,
    Topic,
}

impl ExchangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeKind::Direct => "direct",
            ExchangeKind::Fanout => "fanout",
            ExchangeKind::Topic => "topic",
        }
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named exchange + durable queue + binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pub exchange: String,
    pub kind: ExchangeKind,
    pub queue: String,
    routing_key: String,
}

impl Topology {
    pub fn new(exchange: String, kind: ExchangeKind, queue: String, routing_key: String) -> Self {
        Self {
            exchange,
            kind,
            queue,
            routing_key,
        }
    }

    /// Key used for both binding and publishing. Fanout exchanges ignore
    /// routing keys, so the empty key is used there.
    pub fn routing_key(&self) -> &str {
        match self.kind {
            ExchangeKind::Fanout => "",
            ExchangeKind::Direct | ExchangeKind::Topic => &self.routing_key,
        }
    }
}
