//! Presentation boundary
//!
//! Front ends only render lines; everything else goes through
//! `natter_net::Client`.

use std::io::{self, Write};

/// Sink for rendered text
pub trait Presenter {
    fn output(&mut self, line: &str);
}

/// Plain terminal output
pub struct Terminal<W: Write> {
    out: W,
}

impl Terminal<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Terminal<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for Terminal<W> {
    fn output(&mut self, line: &str) {
        // Broken stdout leaves nothing useful to report to
        let _ = writeln!(self.out, "{}", line);
        let _ = self.out.flush();
    }
}

/// Collects lines in memory
#[cfg(test)]
#[derive(Debug, Default)]
pub struct Transcript {
    pub lines: Vec<String>,
}

#[cfg(test)]
impl Presenter for Transcript {
    fn output(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Forwards lines to a channel so tests can await each one
#[cfg(test)]
pub struct Recorder(pub tokio::sync::mpsc::UnboundedSender<String>);

#[cfg(test)]
impl Presenter for Recorder {
    fn output(&mut self, line: &str) {
        let _ = self.0.send(line.to_string());
    }
}
