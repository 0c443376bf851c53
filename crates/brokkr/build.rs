//! Embeds the build date and, when available, the git revision

use std::process::Command;

fn main() {
    println!(
        "cargo:rustc-env=BUILD_DATE={}",
        chrono::Utc::now().format("%Y-%m-%d")
    );

    // GIT_SHA stays unset outside a checkout, e.g. in a crates.io build
    if let Some(sha) = git_sha() {
        println!("cargo:rustc-env=GIT_SHA={}", sha);
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
}

fn git_sha() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=10", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let sha = String::from_utf8(output.stdout).ok()?;
    let sha = sha.trim();
    (!sha.is_empty()).then(|| sha.to_string())
}
