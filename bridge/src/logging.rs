use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};

/// Installs the process logger: one `<ISO-8601 timestamp>: <message>` line
/// per record on standard output. `RUST_LOG` overrides the default level.
pub fn init(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stdout)
        .format(|buf, record| writeln!(buf, "{}", format_line(Utc::now(), record.args())))
        .init();
}

pub fn format_line(at: DateTime<Utc>, message: &dyn std::fmt::Display) -> String {
    format!(
        "{}: {}",
        at.to_rfc3339_opts(SecondsFormat::Millis, true),
        message
    )
}
