use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

fn enabled() -> bool {
    if std::env::var_os("UPDATE_DENSITIES_FORCE_PROGRESS").is_some() {
        return true;
    }
    if std::env::var_os("NO_PROGRESS").is_some() {
        return false;
    }
    std::io::stderr().is_terminal()
}

pub fn spinner(msg: &str) -> Option<ProgressBar> {
    if !enabled() {
        return None;
    }
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .ok()?
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb.set_style(style);
    pb.set_message(msg.to_string());
    Some(pb)
}

/// Runs `f` behind a spinner, clearing it whatever the outcome.
pub fn while_waiting<T>(msg: &str, f: impl FnOnce() -> T) -> T {
    let spinner = spinner(msg);
    let out = f();
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    out
}
