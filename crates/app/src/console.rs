//! Operator console for the server process

use std::io::{self, BufRead, Write};
use std::thread;

use tracing::warn;

/// Command that stops the server
pub const EXIT_COMMAND: &str = "EXIT";

/// Read operator lines until `EXIT`. Returns false if input ended first.
pub fn wait_for_exit<R: BufRead, W: Write>(input: R, out: &mut W) -> bool {
    for line in input.lines() {
        match line {
            Ok(line) if line.trim() == EXIT_COMMAND => return true,
            Ok(_) => {
                let _ = writeln!(out, "Invalid input, please type EXIT to quit");
            }
            Err(e) => {
                warn!(error = %e, "Failed to read operator input");
                return false;
            }
        }
    }
    false
}

/// Watch stdin on a dedicated thread and call `on_exit` when the operator types `EXIT`
pub fn spawn<F>(on_exit: F) -> io::Result<thread::JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name("operator-console".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            if wait_for_exit(stdin.lock(), &mut io::stdout()) {
                on_exit();
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_exit_after_invalid_input() {
        let mut out = Vec::new();
        let seen = wait_for_exit(Cursor::new("hello\nEXIT\nignored\n"), &mut out);
        assert!(seen);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Invalid input, please type EXIT to quit\n"
        );
    }

    #[test]
    fn test_end_of_input_without_exit() {
        let mut out = Vec::new();
        assert!(!wait_for_exit(Cursor::new("exit\n"), &mut out));
        assert!(!out.is_empty());
    }
}
