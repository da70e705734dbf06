use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Wire envelope for a published event: `{type, timestamp, data}`.
///
/// `data` is the full company snapshot for created/updated events and
/// `{"id": "<identifier>"}` for deleted events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    event_type: String,
    timestamp: DateTime<Utc>,
    data: JsonValue,
}

impl EventEnvelope {
    pub fn new(event_type: impl Into<String>, timestamp: DateTime<Utc>, data: JsonValue) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp,
            data,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn data(&self) -> &JsonValue {
        &self.data
    }

    pub fn into_data(self) -> JsonValue {
        self.data
    }
}
