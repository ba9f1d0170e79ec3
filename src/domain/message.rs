use super::level::Level;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Where a message was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Console,
    Uncaught,
    Custom,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageKind::Console => "console",
            MessageKind::Uncaught => "uncaught",
            MessageKind::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// The triggering error or value of a message.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Error { name: String, message: String },
    Value(Value),
}

impl Payload {
    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Payload::Error {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        Payload::error("Error", err.to_string())
    }

    /// Human readable text carried in the wire record's `message` field.
    pub fn describe(&self) -> String {
        match self {
            Payload::Error { name, message } if name.is_empty() => message.clone(),
            Payload::Error { name, message } if message.is_empty() => name.clone(),
            Payload::Error { name, message } => format!("{name}: {message}"),
            Payload::Value(Value::String(text)) => text.clone(),
            Payload::Value(Value::Object(fields)) => match fields.get("message") {
                Some(Value::String(text)) => text.clone(),
                _ => Value::Object(fields.clone()).to_string(),
            },
            Payload::Value(other) => other.to_string(),
        }
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Value(Value::String(text.to_string()))
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Value(Value::String(text))
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Value(value)
    }
}

/// An error that escaped to the runtime, with the location it was raised at when known.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEvent {
    pub error: Payload,
    pub filename: Option<String>,
    pub lineno: Option<u32>,
    pub colno: Option<u32>,
}

impl ErrorEvent {
    pub fn new(error: Payload) -> Self {
        Self {
            error,
            filename: None,
            lineno: None,
            colno: None,
        }
    }

    pub fn at(mut self, filename: impl Into<String>, lineno: u32, colno: u32) -> Self {
        self.filename = Some(filename.into());
        self.lineno = Some(lineno);
        self.colno = Some(colno);
        self
    }
}

/// A captured message. Immutable once handed to a source.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    kind: MessageKind,
    level: Option<Level>,
    payload: Payload,
    params: Vec<Value>,
    extra: BTreeMap<String, Value>,
}

impl Message {
    pub fn console(level: Level, payload: impl Into<Payload>, params: Vec<Value>) -> Self {
        Self {
            kind: MessageKind::Console,
            level: Some(level),
            payload: payload.into(),
            params,
            extra: BTreeMap::new(),
        }
    }

    pub fn uncaught(event: ErrorEvent) -> Self {
        let mut extra = BTreeMap::new();
        if let Some(filename) = event.filename {
            extra.insert("filename".to_string(), Value::String(filename));
        }
        if let Some(lineno) = event.lineno {
            extra.insert("lineno".to_string(), Value::from(lineno));
        }
        if let Some(colno) = event.colno {
            extra.insert("colno".to_string(), Value::from(colno));
        }

        Self {
            kind: MessageKind::Uncaught,
            level: None,
            payload: event.error,
            params: Vec::new(),
            extra,
        }
    }

    pub fn custom(payload: impl Into<Payload>, params: Vec<Value>) -> Self {
        Self {
            kind: MessageKind::Custom,
            level: None,
            payload: payload.into(),
            params,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn level(&self) -> Option<Level> {
        self.level
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn extra(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }

    /// Canonical wire record.
    ///
    /// Console messages carry `level` and `params`, custom messages carry `params`,
    /// uncaught errors carry neither. Extra keys never shadow the canonical ones.
    pub fn to_wire_record(&self) -> Value {
        let mut record: Map<String, Value> = self
            .extra
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        record.insert("type".to_string(), Value::String(self.kind.to_string()));
        record.insert(
            "message".to_string(),
            Value::String(self.payload.describe()),
        );

        match self.kind {
            MessageKind::Console => {
                if let Some(level) = self.level {
                    record.insert("level".to_string(), Value::String(level.to_string()));
                }
                record.insert("params".to_string(), Value::Array(self.params.clone()));
            }
            MessageKind::Custom => {
                record.insert("params".to_string(), Value::Array(self.params.clone()));
            }
            MessageKind::Uncaught => {}
        }

        Value::Object(record)
    }
}
