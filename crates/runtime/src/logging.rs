use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLogEventKind {
    PositionOpened,
    PositionsClosed,
    BearishWithoutOpenPositions,
}

impl RunLogEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PositionOpened => "position_opened",
            Self::PositionsClosed => "positions_closed",
            Self::BearishWithoutOpenPositions => "bearish_without_open_positions",
        }
    }
}

/// One ledger mutation (or deliberate non-mutation) during a simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunLogEvent {
    pub step: usize,
    pub timestamp: OffsetDateTime,
    pub kind: RunLogEventKind,
    pub price: f64,
    pub positions: usize,
}

impl RunLogEvent {
    pub fn new(
        step: usize,
        timestamp: OffsetDateTime,
        kind: RunLogEventKind,
        price: f64,
        positions: usize,
    ) -> Self {
        Self {
            step,
            timestamp,
            kind,
            price,
            positions,
        }
    }
}

pub trait RunLogWriter {
    fn write(&mut self, event: RunLogEvent);
}

#[derive(Debug, Default)]
pub struct InMemoryRunLogWriter {
    events: Vec<RunLogEvent>,
}

impl InMemoryRunLogWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[RunLogEvent] {
        &self.events
    }
}

impl RunLogWriter for InMemoryRunLogWriter {
    fn write(&mut self, event: RunLogEvent) {
        self.events.push(event);
    }
}

/// Forwards run events to the `tracing` subscriber at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRunLogWriter;

impl RunLogWriter for TracingRunLogWriter {
    fn write(&mut self, event: RunLogEvent) {
        tracing::debug!(
            step = event.step,
            timestamp = %event.timestamp,
            kind = event.kind.as_str(),
            price = event.price,
            positions = event.positions,
            "ledger event"
        );
    }
}
