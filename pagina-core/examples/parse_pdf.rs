//! Example: Parse an existing file
//!
//! Prints the version, the revision history and the catalog of a document.

use pagina::{Document, Object};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <pdf-file>", args[0]);
        std::process::exit(1);
    }

    let pdf_path = &args[1];
    println!("Parsing: {pdf_path}");

    let doc = Document::open(pdf_path)?;
    println!("Version: {}", doc.version());
    println!("Objects: {} (table size {})", doc.len(), doc.size());
    if doc.header_offset() > 0 {
        println!("Header found at byte {}", doc.header_offset());
    }

    println!("\nRevisions (newest first):");
    for (i, trailer) in doc.trailers().iter().enumerate() {
        println!(
            "  {}: xref at {}, Size {}",
            i,
            trailer.xref_offset,
            trailer.size()
        );
    }

    if let Some(info) = doc.info().and_then(|id| doc.get_object(id)).and_then(Object::as_dict) {
        println!("\nInformation:");
        for (key, value) in info.iter() {
            if let Some(text) = value.as_string() {
                println!("  {key}: {}", String::from_utf8_lossy(text));
            }
        }
    }

    let catalog = doc.catalog()?;
    println!("\nCatalog:");
    for key in catalog.keys() {
        println!("  /{key}");
    }

    Ok(())
}
