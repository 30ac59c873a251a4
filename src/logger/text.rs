use super::Delivery;
use crate::domain::{DeliveryError, LogEntry};
use parking_lot::Mutex;
use std::io::{self, Stderr, Stdout, Write};

/// Direct write strategy: one formatted block per entry on a text stream.
///
/// The mutex only makes `Write` usable through `&self`; it does not order
/// deliveries coming from different loggers. Wrap in
/// [`SynchronizedDelivery`](super::SynchronizedDelivery) for that.
pub struct TextDelivery<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> TextDelivery<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl TextDelivery<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl TextDelivery<Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> Delivery for TextDelivery<W> {
    fn deliver(&self, entry: &LogEntry) -> Result<(), DeliveryError> {
        let mut writer = self.writer.lock();
        writeln!(writer)?;
        writeln!(writer, "{}", format_entry(entry))?;
        writer.flush()?;
        Ok(())
    }
}

/// `[timestamp] [CATEGORY] [PRIORITY] [TAG] message`, tag omitted when absent.
pub fn format_entry(entry: &LogEntry) -> String {
    let mut line = format!(
        "[{}] [{}] [{}]",
        entry.timestamp().to_rfc3339(),
        entry.category(),
        entry.priority()
    );
    if let Some(tag) = entry.tag() {
        line.push_str(&format!(" [{tag}]"));
    }
    line.push(' ');
    line.push_str(&entry.message_text());
    line
}
