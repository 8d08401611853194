//! Diagnostic output
//!
//! Guest diagnostics (log text, abort and sanitizer reports) go to the
//! output stream; harness errors go to the error stream. Both sinks are
//! shared between the store's host state and the driver.

use colored::Colorize;
use std::cell::RefCell;
use std::io::{IsTerminal, Write};
use std::rc::Rc;

type Sink = Rc<RefCell<Box<dyn Write>>>;

/// Whether each stream gets colored output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamColors {
    pub out: bool,
    pub err: bool,
}

impl StreamColors {
    pub fn both(color: bool) -> Self {
        Self { out: color, err: color }
    }

    /// Color each process stream that is a terminal, unless `NO_COLOR` is set
    pub fn detect() -> Self {
        if std::env::var_os("NO_COLOR").is_some() {
            return Self::default();
        }
        Self {
            out: std::io::stdout().is_terminal(),
            err: std::io::stderr().is_terminal(),
        }
    }
}

/// Colorized writer pair used for every diagnostic the harness emits
#[derive(Clone)]
pub struct Console {
    out: Sink,
    err: Sink,
    colors: StreamColors,
}

impl Console {
    pub fn new(out: Box<dyn Write>, err: Box<dyn Write>, colors: StreamColors) -> Self {
        Self {
            out: Rc::new(RefCell::new(out)),
            err: Rc::new(RefCell::new(err)),
            colors,
        }
    }

    /// Guest log text, written verbatim
    pub fn guest_log(&self, text: &str) {
        let text = if self.colors.out {
            text.truecolor(255, 135, 0).to_string()
        } else {
            text.to_string()
        };
        write_to(&self.out, &text);
    }

    /// A guest-reported fatal condition, terminated with a newline
    pub fn guest_fatal(&self, line: &str) {
        let line = if self.colors.out { line.red().to_string() } else { line.to_string() };
        write_to(&self.out, &format!("{line}\n"));
    }

    /// A harness-level error
    pub fn error(&self, line: &str) {
        let line = if self.colors.err { line.red().to_string() } else { line.to_string() };
        write_to(&self.err, &format!("{line}\n"));
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").field("colors", &self.colors).finish()
    }
}

// Diagnostics are best effort: a closed pipe must not turn a guest result
// into a different fault.
fn write_to(sink: &Sink, text: &str) {
    let mut writer = sink.borrow_mut();
    if let Err(e) = writer.write_all(text.as_bytes()).and_then(|_| writer.flush()) {
        tracing::warn!("failed to write diagnostic: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn colored_console(colors: StreamColors) -> (Console, Arc<Mutex<Vec<u8>>>, Arc<Mutex<Vec<u8>>>) {
        let out = Arc::new(Mutex::new(Vec::new()));
        let err = Arc::new(Mutex::new(Vec::new()));
        let console = Console::new(Box::new(Captured(out.clone())), Box::new(Captured(err.clone())), colors);
        (console, out, err)
    }

    fn captured_console() -> (Console, Arc<Mutex<Vec<u8>>>, Arc<Mutex<Vec<u8>>>) {
        colored_console(StreamColors::default())
    }

    #[test]
    fn test_guest_log_is_verbatim() {
        let (console, out, err) = captured_console();

        console.guest_log("no newline");
        console.guest_log("");
        console.guest_log(" then more\n");

        assert_eq!(&*out.lock().unwrap(), b"no newline then more\n");
        assert!(err.lock().unwrap().is_empty());
    }

    #[test]
    fn test_streams_are_separate() {
        let (console, out, err) = captured_console();

        console.guest_fatal("[ABORT] at line 7");
        console.error("VM error: unreachable");

        assert_eq!(String::from_utf8_lossy(&out.lock().unwrap()), "[ABORT] at line 7\n");
        assert_eq!(String::from_utf8_lossy(&err.lock().unwrap()), "VM error: unreachable\n");
    }

    #[test]
    fn test_clones_share_sinks() {
        let (console, out, _) = captured_console();
        let other = console.clone();

        console.guest_log("a");
        other.guest_log("b");

        assert_eq!(&*out.lock().unwrap(), b"ab");
    }

    #[test]
    fn test_streams_are_colored_independently() {
        colored::control::set_override(true);
        let (console, out, err) = colored_console(StreamColors { out: false, err: true });

        console.guest_fatal("[ABORT] at line 7");
        console.error("VM error: unreachable");

        assert_eq!(String::from_utf8_lossy(&out.lock().unwrap()), "[ABORT] at line 7\n");
        let err = String::from_utf8_lossy(&err.lock().unwrap()).to_string();
        assert!(err.starts_with("\x1b["), "err: {err:?}");
        assert!(err.contains("VM error: unreachable"), "err: {err:?}");
    }
}
