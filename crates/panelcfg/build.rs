use std::process::Command;

// Build provenance for `panelcfg version --extended`. Values that cannot be
// determined are left unset and print as "unknown".
fn main() {
    if let Ok(target) = std::env::var("TARGET") {
        println!("cargo:rustc-env=PANELCFG_BUILD_TARGET={target}");
    }

    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    if let Some(version) = command_output(&rustc, &["--version"]) {
        println!("cargo:rustc-env=RUSTC_VERSION={version}");
    }

    // Release tarballs carry no .git; CI can pass the hash in instead.
    let git_hash = std::env::var("PANELCFG_GIT_HASH")
        .ok()
        .or_else(|| command_output("git", &["rev-parse", "--short=12", "HEAD"]));
    if let Some(hash) = git_hash {
        println!("cargo:rustc-env=GIT_HASH={hash}");
    }

    println!("cargo:rerun-if-env-changed=TARGET");
    println!("cargo:rerun-if-env-changed=PANELCFG_GIT_HASH");
}

fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
