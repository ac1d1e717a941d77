//! Check command implementation.
//!
//! Validates proc filesystem access and configuration.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::collectors::sockets::{parse_connection_table, CONNECTION_TABLE};
use crate::config::{validate_effective_config, Config, ScanSettings};
use crate::procfs::{collect_proc_entries, fd_targets};
use crate::startup_checks::check_user_privileges;

/// Runs all checks and prints a report to stdout. Returns `true` when every check passed.
pub fn command_check(config: &Config) -> anyhow::Result<bool> {
    let settings = ScanSettings::from_config(config);
    let root = settings.proc_root.as_path();

    println!("🔍 SockMap - System Check");
    println!("=========================");

    let mut all_ok = true;

    println!("\n📁 Checking {} ...", root.display());
    match collect_proc_entries(root, Some(5)) {
        Ok(entries) if !entries.is_empty() => {
            println!("   ✅ Can read {} process entries", entries.len());
        }
        Ok(_) => {
            println!("   ❌ No process entries found under {}", root.display());
            all_ok = false;
        }
        Err(e) => {
            println!("   ❌ Cannot read {}: {}", root.display(), e);
            all_ok = false;
        }
    }

    println!("\n🔌 Checking connection table...");
    all_ok &= check_connection_table(root);

    println!("\n🧠 Checking own process listings...");
    all_ok &= check_own_process(root);

    println!("\n👤 Checking privileges...");
    if check_user_privileges() {
        println!("   ✅ Running as root");
    } else {
        println!("   ⚠️  Not running as root - other users' sockets stay unresolved");
    }

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
    } else {
        println!("   ❌ Some checks failed - please review warnings");
    }
    Ok(all_ok)
}

fn check_connection_table(root: &Path) -> bool {
    let path = root.join(CONNECTION_TABLE);
    let parsed = File::open(&path)
        .map_err(|e| e.to_string())
        .and_then(|f| parse_connection_table(BufReader::new(f), &path).map_err(|e| e.to_string()));
    match parsed {
        Ok(entries) => {
            println!("   ✅ {} readable ({} entries)", path.display(), entries.len());
            true
        }
        Err(e) => {
            println!("   ❌ {}", e);
            false
        }
    }
}

fn check_own_process(root: &Path) -> bool {
    let own = root.join(std::process::id().to_string());
    let mut ok = true;

    if File::open(own.join("maps")).is_ok() {
        println!("   ✅ maps readable");
    } else {
        println!("   ❌ {} not readable", own.join("maps").display());
        ok = false;
    }

    match fd_targets(&own) {
        Ok(targets) => println!("   ✅ fd directory readable ({} descriptors)", targets.len()),
        Err(e) => {
            println!("   ❌ {}: {}", own.join("fd").display(), e);
            ok = false;
        }
    }
    ok
}
