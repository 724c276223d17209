//! `kiosk inspect`: show each repair stage for a raw scan.

use clap::Args;
use kiosk_scanner::{ScanCode, canonicalize, sanitize};

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Raw scan text, exactly as the scanner typed it
    pub raw: String,
}

pub fn execute(args: &InspectArgs) -> anyhow::Result<()> {
    println!("raw:        {:?}", args.raw);

    let Some(code) = ScanCode::new(args.raw.trim()) else {
        println!("scan code:  (empty)");
        return Ok(());
    };
    println!("sanitized:  {:?}", sanitize(code.as_str()));

    match canonicalize(code) {
        Some(identifier) => println!("identifier: {identifier}"),
        None => println!("identifier: (none)"),
    }
    Ok(())
}
