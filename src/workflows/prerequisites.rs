use anyhow::{bail, Context, Result};
use regex::{Captures, Regex};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Fails when the cookie file is missing; only warns about a missing archive.
pub fn check_prerequisites(cookies_file: &Path, archive_file: &Path) -> Result<()> {
    println!("--- Checking Prerequisites ---");

    if !cookies_file.exists() {
        bail!(
            "Cookies file not found: {}\n\
             You must export your cookies in Netscape format and save them to that path \
             (or pass --cookies).\n\
             Cannot proceed without cookies.",
            absolute(cookies_file).display()
        );
    }
    println!("[OK] Cookies found: {}", cookies_file.display());

    if archive_file.exists() {
        println!("[OK] Archive found: {}", archive_file.display());
    } else {
        println!(
            "\n[WARNING] Archive file not found: {}",
            absolute(archive_file).display()
        );
        println!("yt-dlp will NOT be able to skip previously downloaded videos.");
        println!("A new archive file will be created after this run.");
        println!("If this is your first run, you can ignore this warning.");
    }
    println!("------------------------------\n");
    Ok(())
}

/// Expands `~` and `$VAR`/`${VAR}`, resolves relative paths against `cwd`,
/// and creates the directory.
pub fn prepare_output_dir(raw: &str, cwd: &Path) -> Result<PathBuf> {
    let expanded = PathBuf::from(expand_path(raw));
    let output_dir = if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    };

    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
    Ok(output_dir)
}

fn expand_path(raw: &str) -> String {
    let home = env::var("HOME").ok();
    let with_home = match (raw.strip_prefix('~'), &home) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with(['/', '\\']) => {
            format!("{home}{rest}")
        }
        _ => raw.to_string(),
    };

    // Unset variables are left as written.
    let re = Regex::new(r"\$(?:\{(\w+)\}|(\w+))").unwrap();
    re.replace_all(&with_home, |caps: &Captures| {
        let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        env::var(name).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
