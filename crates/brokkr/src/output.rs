//! Styled terminal messages shared by every subcommand

use console::{style, Emoji};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

static OK: Emoji<'_, '_> = Emoji("✔", "ok");
static FAIL: Emoji<'_, '_> = Emoji("✘", "error");
static CAUTION: Emoji<'_, '_> = Emoji("!", "warning");
static NOTE: Emoji<'_, '_> = Emoji("·", "-");

pub fn success(msg: &str) {
    println!("{} {}", style(OK).green().bold(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", style(FAIL).red().bold(), msg);
}

pub fn warning(msg: &str) {
    eprintln!("{} {}", style(CAUTION).yellow().bold(), msg);
}

pub fn info(msg: &str) {
    println!("{} {}", style(NOTE).cyan().bold(), msg);
}

/// Section heading for multi-line reports
pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

pub fn kv(key: &str, value: &str) {
    println!("  {} {}", style(format!("{}:", key)).dim(), value);
}

/// Spinner shown while a transaction runs; the caller finishes it with
/// `finish_and_clear` before printing the outcome
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap()
            .tick_strings(&["-", "\\", "|", "/", " "]),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
