//! JSON-or-human dual-mode printer.
//!
//! The global flag is the same shape `signia-cli::output` uses (one
//! process-wide "are we in JSON mode" switch, set once from `Cli::json` at
//! startup and read everywhere downstream), backed by an `AtomicBool`
//! rather than a bare `static mut` so reading it from multiple commands
//! racing on stdout is not undefined behavior.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use termcolor::{ColorChoice, StandardStream};

static JSON_MODE: AtomicBool = AtomicBool::new(false);

pub fn init(json: bool) {
    JSON_MODE.store(json, Ordering::Relaxed);
}

pub fn is_json() -> bool {
    JSON_MODE.load(Ordering::Relaxed)
}

/// Print `value` as pretty JSON. Always available regardless of mode, since
/// every command's JSON payload is also a valid one-shot human summary.
pub fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    println!("{s}");
    Ok(())
}

/// Print `value` as JSON in JSON mode, or run `human` to print a
/// colorized, prose summary otherwise.
pub fn emit<T: Serialize>(value: &T, human: impl FnOnce(&mut StandardStream) -> io::Result<()>) -> anyhow::Result<()> {
    if is_json() {
        return print(value);
    }
    let mut out = stdout();
    human(&mut out)?;
    Ok(())
}

pub fn eprintln_line(msg: &str) {
    let _ = writeln!(io::stderr(), "{msg}");
}

pub fn stdout() -> StandardStream {
    StandardStream::stdout(ColorChoice::Auto)
}
