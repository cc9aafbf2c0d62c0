//! # Envelope
//!
//! The wire unit of the composition bus.
//!
//! ```json
//! {
//!   "type":   "SmartComposition.message",
//!   "origin": "SmartComposition.4fzyo82mvyr8w3a",
//!   "token":  "k1m2n3o4p5q6r7s8t",
//!   "data":   { "topic": "move-tile", "data": { "client": "b" } }
//! }
//! ```
//!
//! The `type` marker separates bus traffic from unrelated broadcasts on the
//! same transport. The payload is opaque: the bus only reads `data.topic`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::EnvelopeError;
use crate::identity::{BusId, Token};

/// Name of the field holding the payload of a `(topic, data)` publish.
pub const DATA_FIELD: &str = "data";

/// Name of the routing field inside a message.
pub const TOPIC_FIELD: &str = "topic";

/// The `data` object of an envelope: a topic plus arbitrary fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Routing topic. At dispatch time this is rewritten to the remainder
    /// below the subscriber's level.
    pub topic: String,

    /// Everything else in the object, untouched by the bus.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Message {
    /// Message for a `(topic, data)` publish.
    #[must_use]
    pub fn new(topic: impl Into<String>, data: Value) -> Self {
        let mut fields = Map::new();
        fields.insert(DATA_FIELD.to_string(), data);
        Self {
            topic: topic.into(),
            fields,
        }
    }

    /// Message from a pre-built object that must carry a string `topic`.
    ///
    /// # Errors
    ///
    /// `EnvelopeError::InvalidTopic` when the value is not an object or its
    /// `topic` is missing or not a string.
    pub fn from_object(value: Value) -> Result<Self, EnvelopeError> {
        let Value::Object(mut fields) = value else {
            return Err(EnvelopeError::InvalidTopic {
                found: kind_of(&value).to_string(),
            });
        };
        match fields.remove(TOPIC_FIELD) {
            Some(Value::String(topic)) => Ok(Self { topic, fields }),
            Some(other) => Err(EnvelopeError::InvalidTopic {
                found: kind_of(&other).to_string(),
            }),
            None => Err(EnvelopeError::InvalidTopic {
                found: "nothing".to_string(),
            }),
        }
    }

    /// Payload of a `(topic, data)` publish.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.fields.get(DATA_FIELD)
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Copy of this message with the topic replaced.
    #[must_use]
    pub fn with_topic(&self, topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            fields: self.fields.clone(),
        }
    }
}

/// A full bus message with routing metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Protocol marker, `<namespace>.message`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Id of the publishing bus instance. Foreign publishers may omit it.
    #[serde(default)]
    pub origin: Option<BusId>,

    /// Per-publish token. Foreign publishers may omit it.
    #[serde(default)]
    pub token: Option<Token>,

    /// Topic and payload.
    pub data: Message,
}

impl Envelope {
    /// Marker suffix appended to the namespace.
    pub const MARKER_SUFFIX: &'static str = "message";

    /// The type marker for a namespace.
    #[must_use]
    pub fn marker(namespace: &str) -> String {
        format!("{namespace}.{}", Self::MARKER_SUFFIX)
    }

    #[must_use]
    pub fn new(marker: String, origin: BusId, token: Token, data: Message) -> Self {
        Self {
            kind: marker,
            origin: Some(origin),
            token: Some(token),
            data,
        }
    }

    /// Validate a raw frame against `marker` and decode it.
    ///
    /// # Errors
    ///
    /// - `MissingType` when there is no string `type`
    /// - `ForeignMarker` when `type` belongs to something else
    /// - `Malformed` when the remaining shape is wrong
    pub fn parse(frame: &Value, marker: &str) -> Result<Self, EnvelopeError> {
        let object = frame
            .as_object()
            .ok_or_else(|| EnvelopeError::Malformed(format!("frame is {}", kind_of(frame))))?;

        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or(EnvelopeError::MissingType)?;

        if kind != marker {
            return Err(EnvelopeError::ForeignMarker {
                found: kind.to_string(),
            });
        }

        serde_json::from_value(frame.clone()).map_err(|e| EnvelopeError::Malformed(e.to_string()))
    }

    /// Encode for the transport.
    ///
    /// # Errors
    ///
    /// Only fails if a payload value cannot be represented as JSON.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.data.topic
    }

    /// The token, treating an empty string as absent.
    #[must_use]
    pub fn effective_token(&self) -> Option<&Token> {
        self.token.as_ref().filter(|t| !t.is_empty())
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
