//! Programmer listing

use crate::programmers;

/// Print the available programmer backends
pub fn list_programmers() {
    let programmers = programmers::available_programmers();

    if programmers.is_empty() {
        println!("No programmers available (recompile with backend features enabled)");
        return;
    }

    println!("Available programmers:");
    for info in programmers {
        if info.aliases.is_empty() {
            println!("  {:12} - {}", info.name, info.description);
        } else {
            println!(
                "  {:12} - {} (aliases: {})",
                info.name,
                info.description,
                info.aliases.join(", ")
            );
        }
    }
}
