//! Logging setup and log forwarding.
//!
//! [`init_tracing`] installs the global subscriber once per process.
//! [`LogForwardLayer`] copies log records at or above a level into a tokio
//! channel, so a front end can surface warnings such as generator failures
//! next to the reaction stream.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Console log rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// A forwarded log record.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    /// Module path of the call site, e.g. `podium_execution::scheduler`
    pub target: String,
    pub level: String,
    pub message: String,
    /// Structured fields such as `room_id` and `bot_id`
    pub fields: HashMap<String, Value>,
    pub timestamp: String,
}

/// Layer that forwards log records to a channel.
pub struct LogForwardLayer {
    sender: mpsc::UnboundedSender<LogRecord>,
    min_level: Level,
}

impl LogForwardLayer {
    /// Forwards records at `min_level` or more severe.
    pub fn new(sender: mpsc::UnboundedSender<LogRecord>, min_level: Level) -> Self {
        Self { sender, min_level }
    }
}

impl<S> Layer<S> for LogForwardLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // More severe levels compare as smaller.
        if *event.metadata().level() > self.min_level {
            return;
        }

        let mut fields = HashMap::new();
        event.record(&mut FieldVisitor(&mut fields));
        let message = fields
            .remove("message")
            .map(|value| match value {
                Value::String(text) => text,
                other => other.to_string(),
            })
            .unwrap_or_default();

        let record = LogRecord {
            target: event.metadata().target().to_string(),
            level: event.metadata().level().to_string(),
            message,
            fields,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        // Receiver may be gone during shutdown
        let _ = self.sender.send(record);
    }
}

struct FieldVisitor<'a>(&'a mut HashMap<String, Value>);

impl tracing::field::Visit for FieldVisitor<'_> {
    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(format!("{value:?}")));
    }
}

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `default_directive`. Logs go to stderr so stdout stays
/// free for event output. Returns `false` when a subscriber was already set.
pub fn init_tracing(format: LogFormat, default_directive: &str, forward: Option<LogForwardLayer>) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let registry = tracing_subscriber::registry().with(filter).with(forward);

    let result = match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
    result.is_ok()
}
