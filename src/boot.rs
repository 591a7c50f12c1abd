use log::{error, info, warn};
use std::fs;
use std::path::Path;
use std::process;

/// Run all boot checks. Call this before Rocket launches.
/// Creates the database directory if missing and aborts when it
/// cannot be written to.
pub fn run(db_path: &str) {
    info!("kinpost boot check starting...");

    let mut warnings = 0u32;
    let mut errors = 0u32;

    // ── 1. Database directory ──────────────────────────
    let db_dir = Path::new(db_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty());

    if let Some(dir) = db_dir {
        if !dir.exists() {
            match fs::create_dir_all(dir) {
                Ok(_) => info!("  Created directory: {}", dir.display()),
                Err(e) => {
                    error!("  FAILED to create directory {}: {}", dir.display(), e);
                    errors += 1;
                }
            }
        }

        // ── 2. Database directory writable ─────────────
        if dir.exists() {
            let test_file = dir.join(".write_test");
            match fs::write(&test_file, "test") {
                Ok(_) => {
                    let _ = fs::remove_file(&test_file);
                }
                Err(e) => {
                    error!("  Database directory not writable: {}", e);
                    errors += 1;
                }
            }
        }
    }

    // ── 3. Rocket.toml exists ───────────────────────────
    if !Path::new("Rocket.toml").exists() {
        warn!("  Rocket.toml not found, using default config");
        warnings += 1;
    }

    // ── Summary ─────────────────────────────────────────
    if errors > 0 {
        error!(
            "Boot check FAILED: {} error(s), {} warning(s). Aborting.",
            errors, warnings
        );
        process::exit(1);
    }

    if warnings > 0 {
        warn!("Boot check passed with {} warning(s).", warnings);
    } else {
        info!("Boot check passed.");
    }
}
