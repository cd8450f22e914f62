use std::sync::OnceLock;

use owo_colors::OwoColorize;
use supports_color::Stream;
use tracing_subscriber::EnvFilter;

// Label colors key off stdout; the subscriber decides for stderr on
// its own, so redirecting one stream never miscolors the other.
static ANSI_ENABLED: OnceLock<bool> = OnceLock::new();

// Diagnostics go to stderr so they never interleave with the output
// pane on stdout.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let _ = ANSI_ENABLED.set(detect_ansi(Stream::Stdout));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(detect_ansi(Stream::Stderr))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|err| std::io::Error::other(err.to_string()))?;
    Ok(())
}

pub fn module_label(name: &str) -> String {
    if ansi_enabled() {
        format!("{}", name.bright_green().bold())
    } else {
        name.to_string()
    }
}

pub fn selected_marker() -> String {
    if ansi_enabled() {
        format!("{}", "*".bright_yellow().bold())
    } else {
        "*".to_string()
    }
}

pub fn time_label(text: &str) -> String {
    if ansi_enabled() {
        format!("{}", text.bright_cyan())
    } else {
        text.to_string()
    }
}

pub fn field_label(text: &str) -> String {
    if ansi_enabled() {
        format!("{}", text.bright_blue())
    } else {
        text.to_string()
    }
}

fn ansi_enabled() -> bool {
    *ANSI_ENABLED.get_or_init(|| detect_ansi(Stream::Stdout))
}

fn detect_ansi(stream: Stream) -> bool {
    ansi_choice(
        std::env::var_os("NO_COLOR").is_some(),
        std::env::var_os("FORCE_COLOR").is_some(),
        supports_color::on_cached(stream).is_some(),
    )
}

// NO_COLOR beats FORCE_COLOR beats what the stream reports.
fn ansi_choice(no_color: bool, force_color: bool, stream_supports: bool) -> bool {
    if no_color {
        return false;
    }
    if force_color {
        return true;
    }
    stream_supports
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_color_wins_over_everything() {
        assert!(!ansi_choice(true, true, true));
        assert!(!ansi_choice(true, false, true));
    }

    #[test]
    fn force_color_overrides_an_unsupported_stream() {
        assert!(ansi_choice(false, true, false));
    }

    #[test]
    fn otherwise_the_stream_decides() {
        assert!(ansi_choice(false, false, true));
        assert!(!ansi_choice(false, false, false));
    }
}
