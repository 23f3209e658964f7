use std::{env, env::VarError};

/// There's no real CLI for the sync process, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // COINS_API_KEY and COINS_API_SECRET are deliberately missing from this list
    const DISPLAY_ENVS: [&str; 13] = [
        "RUST_LOG",
        "LSYNC_DATABASE_URL",
        "LSYNC_SYNC_INTERVAL_SECS",
        "LSYNC_RUN_ONCE",
        "LSYNC_INITIAL_PAGE_SIZE",
        "LSYNC_INCREMENTAL_PAGE_SIZE",
        "LSYNC_MAX_PAGES",
        "LSYNC_MAX_DEFERRALS",
        "LSYNC_LOCK_TIMEOUT_SECS",
        "LSYNC_RETRY_ATTEMPTS",
        "LSYNC_RETRY_BASE_DELAY_MS",
        "LSYNC_RETRY_MAX_DELAY_MS",
        "COINS_API_URL",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
