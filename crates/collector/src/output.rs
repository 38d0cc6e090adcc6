//! Default event handler
//!
//! Writes every received event to stdout as a text or JSON line, or into
//! the collector's own log. Sessions call the handler concurrently, so
//! writes go through a mutex and each event stays on one line.

use std::io::{self, Write};
use std::sync::Mutex;

use lumberjack_config::OutputFormat;
use lumberjack_protocol::FileEvent;
use lumberjack_server::EventHandler;

/// Handler that prints events
pub struct EventPrinter<W> {
    format: OutputFormat,
    out: Mutex<W>,
}

impl EventPrinter<io::Stdout> {
    /// Print to the process's stdout
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(format, io::stdout())
    }
}

impl<W: Write + Send> EventPrinter<W> {
    pub fn new(format: OutputFormat, out: W) -> Self {
        Self {
            format,
            out: Mutex::new(out),
        }
    }

    /// Recover the writer
    #[cfg(test)]
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_event(&self, event: &FileEvent) -> io::Result<()> {
        let line = match self.format {
            OutputFormat::Text => format_text(event),
            OutputFormat::Json => serde_json::to_string(event)?,
            OutputFormat::Log => {
                tracing::info!(
                    host = %event.host,
                    source = %event.source,
                    offset = event.offset,
                    fields = ?event.fields,
                    "{}",
                    event.text
                );
                return Ok(());
            }
        };

        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        writeln!(out, "{line}")?;
        out.flush()
    }
}

impl<W: Write + Send> EventHandler for EventPrinter<W> {
    fn handle(&self, event: FileEvent) {
        if let Err(e) = self.write_event(&event) {
            tracing::warn!(error = %e, "failed to write event");
        }
    }
}

/// `host source:offset text [key=value ...]`, extra fields sorted by key
fn format_text(event: &FileEvent) -> String {
    let mut line = format!(
        "{} {}:{} {}",
        event.host, event.source, event.offset, event.text
    );

    let mut fields: Vec<_> = event.fields.iter().collect();
    fields.sort_unstable();
    for (key, value) in fields {
        line.push(' ');
        line.push_str(key);
        line.push('=');
        line.push_str(value);
    }
    line
}
