//! List commands implementation

use pyrateflash_flash::available_programmers;

/// List all compiled-in programmers
pub fn list_programmers() {
    let programmers = available_programmers();
    if programmers.is_empty() {
        println!("No programmers compiled in (recompile with --features dummy,buspirate)");
        return;
    }

    println!("Supported programmers:");
    println!();
    for info in programmers {
        let aliases = if info.aliases.is_empty() {
            String::new()
        } else {
            format!(" (alias: {})", info.aliases.join(", "))
        };
        println!("  {:<10} - {}{}", info.name, info.description, aliases);
    }
}
