//! The interposer's decision log. Kept deliberately to a single-line plain
//! text format rather than JSONL: `serde_json` is not worth linking into a
//! `cdylib` that every `getenv` call in the process touches, unlike
//! `dotnope-mediator`'s `tracing` usage where the binary already pays that
//! cost once.

use std::fs::OpenOptions;
use std::io::Write;
use std::sync::{Mutex, OnceLock};

static LOG_PATH: OnceLock<Option<String>> = OnceLock::new();
static LOG_FILE: OnceLock<Mutex<Option<std::fs::File>>> = OnceLock::new();

fn log_path() -> Option<&'static str> {
    LOG_PATH
        .get_or_init(|| crate::hook::read_raw("DOTNOPE_LOG"))
        .as_deref()
}

pub fn record(variable: &str, allowed: bool) {
    let Some(path) = log_path() else { return };

    let mutex = LOG_FILE.get_or_init(|| {
        let file = OpenOptions::new().create(true).append(true).open(path).ok();
        Mutex::new(file)
    });

    let Ok(mut guard) = mutex.lock() else { return };
    let Some(file) = guard.as_mut() else { return };

    let _ = writeln!(
        file,
        "component=interposer variable={} decision={}",
        variable,
        if allowed { "allow" } else { "deny" }
    );
}
