//! A request logger that emits dumps as tracing events.

use tessera_verifier::{DumpKind, DumpRecord, RequestLogger};
use tracing::Level;

/// Emits every request and response dump as a `tracing` event.
///
/// Events carry the exchange `sequence`, the dump `kind` and the `dump`
/// text, under the `tessera::requests` target.
#[derive(Debug, Clone, Copy)]
pub struct TracingRequestLogger {
    level: Level,
}

impl Default for TracingRequestLogger {
    fn default() -> Self {
        Self::new(Level::DEBUG)
    }
}

impl TracingRequestLogger {
    /// Log at the given level.
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// The level events are emitted at.
    pub fn level(&self) -> Level {
        self.level
    }
}

fn kind_str(kind: DumpKind) -> &'static str {
    match kind {
        DumpKind::Request => "request",
        DumpKind::Response => "response",
    }
}

macro_rules! emit {
    ($level:expr, $record:ident) => {
        tracing::event!(
            target: "tessera::requests",
            $level,
            sequence = $record.sequence,
            kind = kind_str($record.kind),
            dump = %$record.text,
            "recorded exchange"
        )
    };
}

impl RequestLogger for TracingRequestLogger {
    fn log(&self, record: &DumpRecord) {
        // `event!` needs a constant level.
        if self.level == Level::ERROR {
            emit!(Level::ERROR, record);
        } else if self.level == Level::WARN {
            emit!(Level::WARN, record);
        } else if self.level == Level::INFO {
            emit!(Level::INFO, record);
        } else if self.level == Level::DEBUG {
            emit!(Level::DEBUG, record);
        } else {
            emit!(Level::TRACE, record);
        }
    }
}
