//! Check command implementation.
//!
//! Validates system requirements and configuration.

use psinfo::{generate_snapshot, ProcfsSource, StateCategory};

use crate::config::{validate_effective_config, Config};

/// Validates system requirements and configuration.
pub fn command_check(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 psinfo - System Check");
    println!("========================");

    let mut all_ok = true;

    // Check the process table
    let proc_root = config.proc_root();
    println!("\n📁 Checking {}...", proc_root.display());
    match generate_snapshot(&ProcfsSource::new(&proc_root)) {
        Ok(snapshot) if snapshot.total_count() == 0 => {
            println!("   ❌ No processes visible");
            all_ok = false;
        }
        Ok(snapshot) => {
            println!("   ✅ {} processes visible", snapshot.total_count());
            for category in StateCategory::ALL {
                println!("      ├─ {}: {}", category, snapshot.count(category));
            }
            println!("      └─ zombie: {}", snapshot.zombie_count());
        }
        Err(e) => {
            println!("   ❌ {}", e);
            all_ok = false;
        }
    }

    // Check socket location
    if config.enable_socket.unwrap_or(true) {
        let socket_path = config.socket_path();
        println!("\n🔌 Checking socket path {}...", socket_path.display());
        let dir_ok = socket_path
            .parent()
            .map(|d| d.as_os_str().is_empty() || d.is_dir())
            .unwrap_or(true);
        if dir_ok {
            println!("   ✅ Socket directory exists");
        } else {
            println!("   ❌ Socket directory does not exist");
            all_ok = false;
        }
    }

    // Check configuration
    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => {
            println!("   ✅ Configuration is valid");
        }
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
