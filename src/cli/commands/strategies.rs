//! List strategies command.

use anyhow::Result;
use barlab_strategies::StrategyRegistry;

pub fn run(json: bool) -> Result<()> {
    let registry = StrategyRegistry::new();

    if json {
        println!("{}", serde_json::to_string_pretty(&registry.list())?);
        return Ok(());
    }

    println!("Available Strategies");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for info in registry.list() {
        println!("  {} ", info.name);
        println!("  ───────────────────────────────────────────────────────");
        println!("  {}", info.description);
        println!("  entry: {}", info.entry);
        println!("  exit:  {}", info.exit);
        println!();
    }

    println!("Use --strategy <name> to select a strategy.");
    println!();
    println!("Strategy names: {}", registry.names().join(", "));

    Ok(())
}
