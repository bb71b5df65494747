//! Interactive inspector
//!
//! One command per line:
//!
//! ```text
//! v          version
//! l          object count and table size
//! r          catalog
//! t          every trailer, newest first
//! x<N>       xref entry of object N
//! <N>        object N
//! w <path>   record pagina as Creator and save to <path>
//! q          quit
//! ```

use anyhow::{anyhow, Context, Result};
use pagina::parser::XRefEntry;
use pagina::writer::object_to_string;
use pagina::{Document, Object, ObjectId};
use std::io::{BufRead, Write};

const PROMPT: &str = "pagina> ";

const HELP: &str = "v: version  l: length  r: root  t: trailers  x<N>: xref entry  \
<N>: object  w <path>: write  q: quit";

enum Command {
    Version,
    Length,
    Root,
    Trailer,
    Xref(u32),
    Show(u32),
    Write(String),
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let command = match line {
        "v" => Command::Version,
        "l" => Command::Length,
        "r" => Command::Root,
        "t" => Command::Trailer,
        "q" => Command::Quit,
        "h" | "?" => Command::Help,
        _ if line.starts_with('w') => {
            let path = line[1..].trim();
            if path.is_empty() {
                return Err(anyhow!("Usage: w <path>"));
            }
            Command::Write(path.to_string())
        }
        _ if line.starts_with('x') => Command::Xref(
            line[1..]
                .trim()
                .parse()
                .map_err(|_| anyhow!("Usage: x<object number>"))?,
        ),
        _ => Command::Show(
            line.parse()
                .map_err(|_| anyhow!("Unknown command '{line}' (h for help)"))?,
        ),
    };
    Ok(Some(command))
}

/// `number offset generation flag`, the columns of an xref table line
pub fn format_xref_entry(number: u32, entry: &XRefEntry) -> String {
    format!(
        "{:>6} {:010} {:05} {}",
        number,
        entry.offset,
        entry.generation,
        if entry.in_use { 'n' } else { 'f' }
    )
}

/// Run commands from `input` until `q` or end of input. Command failures
/// are reported on `out` and do not end the session.
pub fn run<R: BufRead, W: Write>(doc: &mut Document, input: R, out: &mut W) -> Result<()> {
    write!(out, "{PROMPT}")?;
    out.flush()?;

    for line in input.lines() {
        let line = line.context("Failed to read command")?;
        match parse_command(&line) {
            Ok(Some(Command::Quit)) => return Ok(()),
            Ok(Some(command)) => {
                if let Err(e) = execute(doc, command, out) {
                    writeln!(out, "Error: {e:#}")?;
                }
            }
            Ok(None) => {}
            Err(e) => writeln!(out, "Error: {e}")?,
        }
        write!(out, "{PROMPT}")?;
        out.flush()?;
    }

    writeln!(out)?;
    Ok(())
}

fn execute<W: Write>(doc: &mut Document, command: Command, out: &mut W) -> Result<()> {
    match command {
        Command::Version => writeln!(out, "{}", doc.version())?,
        Command::Length => writeln!(out, "{} objects (Size {})", doc.len(), doc.size())?,
        Command::Root => {
            let root = doc.root().ok_or_else(|| anyhow!("Trailer has no /Root"))?;
            let catalog = doc.catalog()?;
            writeln!(
                out,
                "{root}\n{}",
                object_to_string(&Object::Dictionary(catalog.clone()))
            )?;
        }
        Command::Trailer => {
            for trailer in doc.trailers().iter() {
                writeln!(
                    out,
                    "{}",
                    object_to_string(&Object::Dictionary(trailer.dict.clone()))
                )?;
            }
        }
        Command::Xref(number) => {
            let entry = doc
                .xref()
                .get(number)
                .ok_or_else(|| anyhow!("No xref entry for object {number}"))?;
            writeln!(out, "{}", format_xref_entry(number, entry))?;
        }
        Command::Show(number) => {
            let id = ObjectId::new(number, doc.generation(number));
            let object = doc
                .get_object(id)
                .ok_or_else(|| anyhow!("Object {number} is not present"))?;
            writeln!(out, "{}", crate::render(object))?;
        }
        Command::Write(path) => {
            doc.set_info_creator()?;
            doc.save(&path)
                .with_context(|| format!("Failed to write {path}"))?;
            writeln!(out, "Wrote {path}")?;
        }
        Command::Help => writeln!(out, "{HELP}")?,
        Command::Quit => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagina::Dictionary;

    fn document() -> Document {
        let mut doc = Document::new();
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name("Catalog".to_string()));
        doc.add_object(dict);
        doc.add_object(Object::Integer(42));
        doc
    }

    fn session(doc: &mut Document, script: &str) -> String {
        let mut out = Vec::new();
        run(doc, script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert!(matches!(parse_command("v"), Ok(Some(Command::Version))));
        assert!(matches!(parse_command("  l "), Ok(Some(Command::Length))));
        assert!(matches!(parse_command("x12"), Ok(Some(Command::Xref(12)))));
        assert!(matches!(parse_command("x 3"), Ok(Some(Command::Xref(3)))));
        assert!(matches!(parse_command("7"), Ok(Some(Command::Show(7)))));
        assert!(matches!(
            parse_command("w out.pdf"),
            Ok(Some(Command::Write(path))) if path == "out.pdf"
        ));
        assert!(matches!(parse_command(""), Ok(None)));
        assert!(parse_command("w").is_err());
        assert!(parse_command("xyz").is_err());
        assert!(parse_command("zap").is_err());
    }

    #[test]
    fn test_format_xref_entry() {
        assert_eq!(
            format_xref_entry(3, &XRefEntry::in_use(1234, 0)),
            "     3 0000001234 00000 n"
        );
        assert_eq!(
            format_xref_entry(0, &XRefEntry::free(0, 65535)),
            "     0 0000000000 65535 f"
        );
    }

    #[test]
    fn test_session() {
        let mut doc = document();
        let output = session(&mut doc, "v\nl\n2\nx1\nt\nq\nv\n");

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "pagina> 1.7");
        assert_eq!(lines[1], "pagina> 2 objects (Size 3)");
        assert_eq!(lines[2], "pagina> 42");
        assert_eq!(lines[3], "pagina>      1 0000000000 00000 n");
        assert_eq!(lines[4], "pagina> << /Size 3 >>");
        // Nothing runs after q
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[5], "pagina> ");
    }

    #[test]
    fn test_errors_do_not_end_session() {
        let mut doc = document();
        let output = session(&mut doc, "9\nr\nbogus\nv\n");

        assert!(output.contains("Error: Object 9 is not present"));
        assert!(output.contains("Error: Trailer has no /Root"));
        assert!(output.contains("Error: Unknown command 'bogus'"));
        assert!(output.contains("pagina> 1.7"));
    }

    #[test]
    fn test_write_command() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("written.pdf");
        let mut doc = document();

        let output = session(&mut doc, &format!("w {}\n", path.display()));
        assert!(output.contains("Wrote"));

        let reread = Document::open(&path).unwrap();
        let info = reread.info().and_then(|id| reread.get_object(id)).unwrap();
        assert_eq!(
            info.as_dict().and_then(|d| d.get("Creator")),
            Some(&Object::from("pagina"))
        );
    }
}
