//! `gitward list` command.

use std::io::Write;

use crate::commands::Invocation;
use crate::error::Result;
use crate::render::Table;

/// Execute the `list` command.
///
/// Prints the configured repositories with their paths and configured
/// users, marking the one containing the current directory.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn run(invocation: &Invocation) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write!(out, "{}", render(invocation))?;
    Ok(())
}

fn render(invocation: &Invocation) -> String {
    let entries = invocation.registry.entries();
    if entries.is_empty() {
        return "No repositories configured.\n".to_string();
    }
    let current = invocation.registry.current().map(|e| e.name.as_str());
    let mut table = Table::new(["NAME", "PATH", "USER"]);
    for entry in entries {
        let name = if current == Some(entry.name.as_str()) {
            format!("{} (.)", entry.name)
        } else {
            entry.name.clone()
        };
        let user = entry.owning_user.clone().unwrap_or_else(|| "(owner)".to_string());
        table.push([name, entry.path.display().to_string(), user]);
    }
    table.render()
}
