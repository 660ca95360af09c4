use remlines::{Document, Envelope};
use std::{error::Error, ffi::OsStr, path::Path};
use walkdir::WalkDir;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_target(false).init();

    let input = std::env::args()
        .nth(1)
        .expect("expected an .rm/.rmdoc file, or a directory of them.");
    let path = Path::new(&input);

    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry?;

            if let Some("rm" | "rmdoc") = entry.path().extension().and_then(OsStr::to_str) {
                print_input(entry.path())?;
            }
        }

        return Ok(());
    }

    print_input(path)
}

fn print_input(path: &Path) -> Result<(), Box<dyn Error>> {
    if path.extension().and_then(OsStr::to_str) == Some("rmdoc") {
        let envelope = Envelope::open_path(path)?;

        println!(
            "{} ({}, {} page(s))",
            envelope.visible_name().unwrap_or("<unnamed>"),
            envelope.uuid(),
            envelope.page_count(),
        );

        for (page_uuid, document) in envelope.decode_all() {
            match document {
                Ok(document) => {
                    println!("page {page_uuid}");
                    print_document(&document);
                }
                // Already on the log; keep the listing going.
                Err(err) => println!("page {page_uuid}: {err}"),
            }
        }

        return Ok(());
    }

    let document = Document::from_path(path)?;
    println!("{}", path.display());
    print_document(&document);

    Ok(())
}

fn print_document(document: &Document) {
    print!("{document}");
    println!(
        "version {}, {} stroke(s), {} point(s), {} dropped",
        document.version,
        document.line_count(),
        document.point_count(),
        document.dropped_lines,
    );
}
