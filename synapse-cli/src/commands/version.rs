//! Version command - show version information.

use anyhow::Result;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run the version command.
pub fn run() -> Result<()> {
    println!("Synapse - self-organizing dataflow engine");
    println!();
    println!("Version:     {}", VERSION);
    println!(
        "Platform:    {} / {}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    println!(
        "Redis:       {}",
        if cfg!(feature = "storage-redis") {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!();
    println!("Components:");
    println!("  synapse-core     Payloads, storage contract, permutation, gateways");
    println!("  synapse-network  Activator, forwarder, tracker, dispatcher, CLGs");
    println!("  synapse-cli      Command-line interface");

    Ok(())
}
