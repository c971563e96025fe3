use std::{
    io::{self, Write},
    time::SystemTime,
};

use oscbridge_engine::{Engine, Filter, seconds_ago, unix_seconds};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Read commands from stdin until `exit` or end of input. Every handler is a
/// thin wrapper over the engine; validation failures are printed and the
/// loop keeps running.
pub async fn run(engine: Engine) {
    println!("oscbridge command shell - type 'help' for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if !line.is_empty() && !dispatch(&engine, line).await {
            return;
        }
        prompt();
    }
}

/// Print the input prompt.
fn prompt() {
    print!("> ");
    io::stdout().flush().ok();
}

/// Handle one command line. Returns `false` to leave the loop.
async fn dispatch(engine: &Engine, line: &str) -> bool {
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "help" => print_help(),
        "exit" | "quit" => {
            println!("Exiting.");
            return false;
        }
        "print" | "/" => match engine.toggle_printing().await {
            Ok(on) => println!(
                "Message printing {}",
                if on { "ENABLED" } else { "DISABLED" }
            ),
            Err(e) => println!("{e}"),
        },
        "add" => match require(rest, "add <pattern>") {
            Some(pattern) => report(engine.add_filter(pattern).await, || {
                format!("Added filter: '{pattern}'")
            }),
            None => {}
        },
        "remove" => match require(rest, "remove <pattern>") {
            Some(pattern) => report(engine.remove_filter(pattern).await, || {
                format!("Removed filter: '{pattern}'")
            }),
            None => {}
        },
        "list" => list_filters(engine).await,
        "clear" => report(engine.clear_filters().await, || {
            "All filters cleared".to_string()
        }),
        "reset" => report(engine.reset_counts().await, || {
            "All filter counts and rate limits reset".to_string()
        }),
        "enable" => match require(rest, "enable <pattern>") {
            Some(pattern) => report(engine.set_enabled(pattern, true).await, || {
                format!("Filter '{pattern}' enabled")
            }),
            None => {}
        },
        "disable" => match require(rest, "disable <pattern>") {
            Some(pattern) => report(engine.set_enabled(pattern, false).await, || {
                format!("Filter '{pattern}' disabled")
            }),
            None => {}
        },
        "action" => match rest.split_once(char::is_whitespace) {
            Some((pattern, action)) => {
                let action = action.trim();
                report(engine.set_action(pattern, action).await, || {
                    format!("Set action for filter '{pattern}': {action}")
                });
            }
            None => println!("Usage: action <pattern> <command>"),
        },
        "toggle" => match require(rest, "toggle <pattern>") {
            Some(pattern) => match engine.toggle_action(pattern).await {
                Ok(on) => println!(
                    "Filter '{pattern}' action {}",
                    if on { "enabled" } else { "disabled" }
                ),
                Err(e) => println!("{e}"),
            },
            None => {}
        },
        "rate" => set_rate(engine, rest).await,
        "rate-list" => rate_list(engine).await,
        "rate-reset" => match require(rest, "rate-reset <pattern>") {
            Some(pattern) => report(engine.reset_rate(pattern).await, || {
                format!("Rate limit for '{pattern}' reset to defaults")
            }),
            None => {}
        },
        "status" => status(engine).await,
        "media-status" => {
            let state = engine.media().refresh_state().await;
            println!("Media player status: {state}");
        }
        "test-media" => {
            println!("Toggling media play/pause...");
            engine.media().play_pause().await;
            println!("Media state now: {}", engine.media().state());
        }
        "defaults" => match engine.install_default_filters().await {
            Ok(n) => println!("Installed {n} default filter(s)"),
            Err(e) => println!("{e}"),
        },
        "show-defaults" => show_defaults(),
        "actions" => print_actions(),
        "keys" => list_keys(engine),
        "key-examples" => print_key_examples(),
        "test-key" => match require(rest, "test-key <keystring>") {
            Some(expr) => match engine.test_key(expr).await {
                Ok(description) => println!("Sent: {description}"),
                Err(e) => println!("Key action failed: {e}"),
            },
            None => {}
        },
        "save" => report(engine.save().await, || "Configuration saved".to_string()),
        "load" => match engine.load().await {
            Ok(Some(n)) => println!("Loaded {n} filter(s) from config"),
            Ok(None) => println!("No config file found"),
            Err(e) => println!("{e}"),
        },
        "hash-stats" => hash_stats(engine),
        _ => println!("Unknown command '{command}' - type 'help' for commands"),
    }
    true
}

/// Return the argument or print a usage line.
fn require<'a>(rest: &'a str, usage: &str) -> Option<&'a str> {
    if rest.is_empty() {
        println!("Usage: {usage}");
        None
    } else {
        Some(rest)
    }
}

/// Print either a success message or the error.
fn report<T>(result: oscbridge_engine::Result<T>, ok: impl FnOnce() -> String) {
    match result {
        Ok(_) => println!("{}", ok()),
        Err(e) => println!("{e}"),
    }
}

/// `rate <pattern> <count> <seconds>`.
async fn set_rate(engine: &Engine, rest: &str) {
    let mut parts = rest.split_whitespace();
    let (Some(pattern), Some(count), Some(seconds)) = (parts.next(), parts.next(), parts.next())
    else {
        println!("Usage: rate <pattern> <count> <seconds>");
        println!("  rate discordmute 2 1     - Require 2 counts and 1 second");
        println!("  rate discordmute 1 0     - Execute on every message (no rate limit)");
        return;
    };
    let (Ok(count), Ok(seconds)) = (count.parse::<u32>(), seconds.parse::<u32>()) else {
        println!("Count and seconds must be non-negative integers");
        return;
    };
    report(engine.set_rate(pattern, count, seconds).await, || {
        format!("Rate limit for '{pattern}' set to {count} count(s) / {seconds} second(s)")
    });
}

/// Render "Ns ago" or "Never".
fn ago(seconds: Option<u64>) -> String {
    match seconds {
        Some(s) => format!("{s}s ago"),
        None => "Never".to_string(),
    }
}

/// The `list` table.
async fn list_filters(engine: &Engine) {
    let filters = engine.filters().await;
    if filters.is_empty() {
        println!("No parameter filters configured");
        return;
    }
    let now = SystemTime::now();
    let now_unix = unix_seconds(Some(now));
    println!(
        "{:<40} {:<8} {:<8} {:<8} {:<8} {:<14} {:<14} Command",
        "Pattern", "Count", "Status", "Action", "Rate", "Last Received", "Last Executed"
    );
    for f in &filters {
        println!(
            "{:<40} {:<8} {:<8} {:<8} {:<8} {:<14} {:<14} {}",
            f.pattern,
            f.count,
            if f.enabled { "ON" } else { "OFF" },
            if f.trigger_action { "ON" } else { "OFF" },
            f.limiter.display_compact(),
            ago(seconds_ago(f.last_received, now)),
            last_executed(f, now_unix),
            if f.action.is_empty() { "None" } else { &f.action },
        );
    }
}

/// Render a filter's last execution as "Ns ago" or "Never".
fn last_executed(filter: &Filter, now_unix: u64) -> String {
    let (_, exec_unix) = filter.limiter.execution_snapshot();
    if exec_unix == 0 {
        "Never".to_string()
    } else {
        format!("{}s ago", now_unix.saturating_sub(exec_unix))
    }
}

/// The `rate-list` table.
async fn rate_list(engine: &Engine) {
    let filters = engine.filters().await;
    let (count, seconds) = engine.default_limits().await;
    println!("Default rate limit: {count} count(s) / {seconds} second(s)");
    if filters.is_empty() {
        println!("No parameter filters configured");
        return;
    }
    println!("{:<40} {:<10} Default", "Pattern", "Rate");
    for f in &filters {
        println!(
            "{:<40} {:<10} {}",
            f.pattern,
            f.limiter.display_compact(),
            if f.limiter.is_default() { "yes" } else { "no" },
        );
    }
}

/// The `status` summary.
async fn status(engine: &Engine) {
    let filters = engine.filters().await;
    let enabled = filters.iter().filter(|f| f.enabled).count();
    let armed = filters.iter().filter(|f| f.trigger_action).count();
    println!("Filters: {} ({enabled} enabled, {armed} armed)", filters.len());
    println!(
        "Message printing: {}",
        if engine.printing().await { "ON" } else { "OFF" }
    );
    println!("Media state: {}", engine.media().state());
    println!("Config file: {}", engine.config_path().display());
}

/// The `show-defaults` table.
fn show_defaults() {
    println!("{:<40} {:<16} Description", "Pattern", "Action");
    for seed in oscbridge_config::DEFAULT_FILTERS {
        println!(
            "{:<40} {:<16} {}",
            seed.pattern, seed.action, seed.description
        );
    }
    println!("\nUse 'defaults' to add all default filters.");
}

/// The `keys` listing.
fn list_keys(engine: &Engine) {
    let catalog = engine.catalog();
    println!("Available keys for key actions (total: {}):\n", catalog.len());
    println!("Letters: a-z");
    println!("Numbers: 0-9");
    println!("Function keys: f1-f12");
    println!("Arrows: up, down, left, right");
    println!("Modifiers: ctrl, alt, shift, super/win");
    println!("Special: space, enter, tab, escape, backspace, delete");
    println!("Navigation: home, end, pageup, pagedown, insert");
    println!("Symbols: minus, equal, comma, dot, slash, ...\n");
    println!("Full list of supported keys:");
    for (i, mapping) in catalog.iter().enumerate() {
        if i % 6 == 0 {
            println!();
        }
        print!("{:<12}", mapping.name);
    }
    println!();
}

/// The `hash-stats` diagnostic.
fn hash_stats(engine: &Engine) {
    let stats = engine.catalog().stats();
    println!("=== Key Catalog Statistics ===");
    println!("Total entries: {}", stats.entries);
    println!("Table size: {} buckets", stats.buckets);
    println!(
        "Used buckets: {} ({:.1}%)",
        stats.used_buckets,
        stats.used_buckets as f64 / stats.buckets as f64 * 100.0
    );
    println!(
        "Load factor: {:.3}",
        stats.entries as f64 / stats.buckets as f64
    );
    println!("Max chain length: {}", stats.max_chain);
}

/// The `actions` listing.
fn print_actions() {
    println!("Built-in actions:");
    println!("  @media-play               - Play/pause media");
    println!("  @media-stop               - Stop media");
    println!("  @media-next               - Next track");
    println!("  @media-prev               - Previous track");
    println!("  @copy @paste @cut         - Clipboard shortcuts");
    println!("  @undo @redo @select-all   - Editing shortcuts");
    println!("  @alt-tab @screenshot      - Window/system shortcuts");
    println!("  @key:<expression>         - Arbitrary key action (see key-examples)");
    println!("\nAny other action string is run as a shell command.");
}

/// The `key-examples` listing.
fn print_key_examples() {
    println!("Key action examples:\n");
    println!("Single keys:");
    println!("  @key:a                    - Press 'a'");
    println!("  @key:f1                   - Press F1");
    println!("  @key:space                - Press space\n");
    println!("Combinations (pressed together, released in reverse):");
    println!("  @key:ctrl+c               - Ctrl+C (copy)");
    println!("  @key:ctrl+shift+esc       - Ctrl+Shift+Esc\n");
    println!("Sequences (one after another; single key names only):");
    println!("  @key:a b c                - Press a, then b, then c\n");
    println!("Holds:");
    println!("  @key:hold:space:1000      - Hold space for 1000ms");
    println!("  @key:hold:w               - Hold 'w' for the default 500ms\n");
    println!("Usage:");
    println!("  action discordmute @key:ctrl+shift+m");
    println!("  action screenshot @key:printscreen");
}

/// The `help` listing.
fn print_help() {
    println!("Commands:");
    println!("  add <pattern>              - Add a new filter pattern");
    println!("  remove <pattern>           - Remove a filter pattern");
    println!("  list                       - List all filters");
    println!("  clear                      - Clear all filters");
    println!("  reset                      - Reset all filter counts");
    println!("  enable <pattern>           - Enable a filter");
    println!("  disable <pattern>          - Disable a filter");
    println!("  action <pattern> <command> - Set action command for filter");
    println!("  toggle <pattern>           - Toggle action execution for filter");
    println!("  rate <pattern> <count> <seconds> - Set rate limit for filter");
    println!("  rate-list                  - Show rate limiting settings");
    println!("  rate-reset <pattern>       - Reset filter rate limit to defaults");
    println!("  print (or /)               - Toggle message printing on/off");
    println!("  status                     - Show system status");
    println!("  media-status               - Show current media player status");
    println!("  test-media                 - Test media controls");
    println!("  defaults                   - Install default media control filters");
    println!("  show-defaults              - Show available default filters");
    println!("  actions                    - Show built-in actions");
    println!("  keys                       - List available keys for key actions");
    println!("  key-examples               - Show key action examples");
    println!("  test-key <keystring>       - Test a key action");
    println!("  save                       - Save current config");
    println!("  load                       - Reload config from file");
    println!("  hash-stats                 - Show key catalog statistics");
    println!("  help                       - Show this help");
    println!("  exit                       - Exit");
}
