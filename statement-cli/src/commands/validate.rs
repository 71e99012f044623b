//! `statement validate` - load and compile a bank profile file without
//! parsing any statement, surfacing `MalformedProfile` errors up front.

use std::error::Error;
use std::path::PathBuf;

use statement_core::config;

use crate::output;

pub fn run(profile_path: PathBuf) -> Result<(), Box<dyn Error>> {
    let book = config::load_profiles(&profile_path)?;

    let mut keys: Vec<&String> = book.banks.keys().collect();
    keys.sort();

    output::success(&format!("{} loaded successfully", profile_path.display()));
    println!("{} parser key(s):", keys.len());
    for key in keys {
        let bank = &book.banks[key];
        let mut formats: Vec<&str> = bank.formats.keys().map(|k| k.as_str()).collect();
        formats.sort();
        let status = if bank.enabled { "enabled" } else { "disabled" };
        println!("  - {key} ({status}): {}", formats.join(", "));
    }

    Ok(())
}
