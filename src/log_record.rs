//! Event record captured for each log call.
//!
//! A [`HecLogRecord`] is built once on the caller's thread, handed to a
//! payload transformer, and dropped. It never crosses into the batch queue;
//! only the transformer's output string does.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::level::HecLevel;
use crate::timestamp;

/// Identifier attached to a log call, optionally named.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EventId {
    pub id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EventId {
    pub fn new(id: i32) -> Self {
        Self { id, name: None }
    }

    pub fn named(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }
}

impl From<i32> for EventId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for EventId {
    /// Shows the name when present, otherwise the numeric id.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.id),
        }
    }
}

/// Owned snapshot of an error and its `source()` chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExceptionInfo {
    pub type_name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ExceptionInfo {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            causes: Vec::new(),
        }
    }

    /// Capture `err` and walk its source chain.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: StdError + ?Sized,
    {
        let mut causes = Vec::new();
        let mut next = err.source();
        while let Some(cause) = next {
            causes.push(cause.to_string());
            next = cause.source();
        }
        Self {
            type_name: short_type_name::<E>(),
            message: err.to_string(),
            causes,
        }
    }
}

fn short_type_name<E: ?Sized>() -> String {
    let full = std::any::type_name::<E>();
    // Keep generic arguments intact; only strip the leading module path.
    let head = full.split('<').next().unwrap_or(full);
    let base = head.rsplit("::").next().unwrap_or(head);
    format!("{base}{}", &full[head.len()..])
}

impl fmt::Display for ExceptionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)?;
        for cause in &self.causes {
            write!(f, "\n ---> Caused by: {cause}")?;
        }
        Ok(())
    }
}

/// Immutable data captured for one log call.
#[derive(Clone, Debug, Serialize)]
pub struct HecLogRecord {
    /// Rendered timestamp (epoch seconds or the configured pattern).
    pub timestamp: String,
    #[serde(skip)]
    pub created: DateTime<Utc>,
    pub category: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
    #[serde(skip)]
    pub scope_fields: BTreeMap<String, String>,
    pub level: HecLevel,
    pub event: EventId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<ExceptionInfo>,
}

impl HecLogRecord {
    /// Build a record stamped with the current time.
    pub fn new(category: &str, level: HecLevel, message: &str) -> Self {
        Self::at(Utc::now(), None, category, level, message)
    }

    /// Build a record for `created`, rendering the timestamp with `format`.
    pub fn at(
        created: DateTime<Utc>,
        format: Option<&str>,
        category: &str,
        level: HecLevel,
        message: &str,
    ) -> Self {
        Self {
            timestamp: timestamp::format_timestamp(created, format),
            created,
            category: category.to_owned(),
            scopes: Vec::new(),
            scope_fields: BTreeMap::new(),
            level,
            event: EventId::default(),
            message: (!message.is_empty()).then(|| message.to_owned()),
            exception: None,
        }
    }

    pub fn with_event(mut self, event: EventId) -> Self {
        self.event = event;
        self
    }

    pub fn with_exception(mut self, exception: Option<ExceptionInfo>) -> Self {
        self.exception = exception;
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>, fields: BTreeMap<String, String>) -> Self {
        self.scopes = scopes;
        self.scope_fields = fields;
        self
    }

    /// A record with no message and no exception carries nothing to ship.
    pub fn is_empty(&self) -> bool {
        self.message.is_none() && self.exception.is_none()
    }
}

impl fmt::Display for HecLogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.level,
            self.message.as_deref().unwrap_or_default()
        )
    }
}
