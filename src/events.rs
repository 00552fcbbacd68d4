use tracing::info;

/// Discrete usage events the pipeline emits for whoever keeps counters.
/// The engine owns no counter state itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageEvent {
    PhotoUploaded,
    BackgroundRemoved,
    PhotoExported,
}

impl UsageEvent {
    pub fn name(self) -> &'static str {
        match self {
            UsageEvent::PhotoUploaded => "photo_uploaded",
            UsageEvent::BackgroundRemoved => "background_removed",
            UsageEvent::PhotoExported => "photo_exported",
        }
    }
}

pub trait UsageSink {
    fn record(&self, event: UsageEvent);
}

/// Default sink: structured log lines, ready to be scraped or replaced by a
/// real counter backend.
pub struct LogSink;

impl UsageSink for LogSink {
    fn record(&self, event: UsageEvent) {
        info!(target: "photosheet::usage", event = event.name(), "usage event");
    }
}
