//! Diagnostic sinks.

use std::io::Write;

use super::DiagnosticSink;

/// Prints `location: message` lines to stdout, interleaved with action
/// output.
pub struct ConsoleDiagnostics;

impl DiagnosticSink for ConsoleDiagnostics {
    fn report(&mut self, message: &str, location: Option<&str>) {
        let line = format_diagnostic(message, location);
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        if let Err(e) = writeln!(lock, "{}", line) {
            tracing::warn!("dropped diagnostic \"{}\": {}", line, e);
        }
    }
}

/// Keeps every diagnostic, formatted like [`ConsoleDiagnostics`] prints it.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    pub messages: Vec<String>,
}

impl DiagnosticSink for CollectingDiagnostics {
    fn report(&mut self, message: &str, location: Option<&str>) {
        self.messages.push(format_diagnostic(message, location));
    }
}

pub fn format_diagnostic(message: &str, location: Option<&str>) -> String {
    match location {
        Some(loc) => format!("{}: {}", loc, message),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink_formats_like_console() {
        let mut sink = CollectingDiagnostics::default();
        sink.report("cannot resolve pkg.Missing", Some("A.java:3:8"));
        sink.report("no sources found", None);
        assert_eq!(
            sink.messages,
            vec!["A.java:3:8: cannot resolve pkg.Missing", "no sources found"]
        );
    }
}
