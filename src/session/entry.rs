//! Session entries and their durable log line format.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{Result, SessionStoreError};

/// A single session: caller-supplied id, absolute expiry and opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    /// Caller-supplied identifier, unique among live entries.
    pub id: String,
    /// Instant after which the entry is dead.
    pub expiry: DateTime<Utc>,
    /// Opaque payload, never interpreted by the store.
    pub payload: String,
}

impl SessionEntry {
    /// Create a new entry.
    pub fn new(id: impl Into<String>, expiry: DateTime<Utc>, payload: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            expiry,
            payload: payload.into(),
        }
    }

    /// Whether the entry is still valid at `now`.
    ///
    /// An entry whose expiry equals `now` is already dead.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expiry > now
    }

    /// Encode as one durable log line (without the trailing newline).
    ///
    /// Format: `<id> <expiry> <payload>` where `expiry` is RFC 3339 UTC
    /// with nanosecond precision and both text fields are escaped.
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {}",
            escape_field(&self.id),
            format_expiry(self.expiry),
            escape_field(&self.payload)
        )
    }

    /// Decode a durable log line produced by [`SessionEntry::to_line`].
    pub fn parse_line(line: &str) -> Result<Self> {
        let mut fields = line.splitn(3, ' ');

        let id = match fields.next() {
            Some(raw) if !raw.is_empty() => unescape_field(raw)?,
            _ => return Err(parse_error("missing id field")),
        };
        let expiry = match fields.next() {
            Some(raw) if !raw.is_empty() => parse_expiry(raw)?,
            _ => return Err(parse_error("missing expiry field")),
        };
        // Snapshots always write the separator, but tolerate a bare two-field line
        let payload = match fields.next() {
            Some(raw) => unescape_field(raw)?,
            None => String::new(),
        };

        Ok(Self {
            id,
            expiry,
            payload,
        })
    }
}

/// Format an expiry the way the durable log stores it.
pub fn format_expiry(expiry: DateTime<Utc>) -> String {
    expiry.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse an expiry written by [`format_expiry`].
pub fn parse_expiry(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| SessionStoreError::InvalidTimestamp(format!("{raw}: {e}")))
}

fn parse_error(reason: &str) -> SessionStoreError {
    // Line number is filled in by the log reader
    SessionStoreError::Parse {
        line: 0,
        reason: reason.to_string(),
    }
}

/// Escape a text field so it contains no separators or line breaks.
fn escape_field(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ' ' => out.push_str("\\s"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_field(raw: &str) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('s') => out.push(' '),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            _ => return Err(SessionStoreError::InvalidEscape(raw.to_string())),
        }
    }
    Ok(out)
}
