use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use pagina::page_labels::parse_page_label_spec;
use pagina::parser::ParseOptions;
use pagina::writer::object_to_string;
use pagina::{Document, FlateCodec, Object, ObjectId};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod repl;

#[derive(Parser)]
#[command(
    name = "pagina",
    about = "Inspect and rewrite PDF-style documents",
    version,
    author
)]
struct Cli {
    /// Log parser progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Largest stream payload accepted, in bytes
    #[arg(long, global = true)]
    max_stream_length: Option<u64>,

    /// Deepest array/dictionary nesting accepted
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version, object count, catalog and revision history
    Info {
        /// Input file
        input: PathBuf,
    },

    /// Print one indirect object
    Show {
        /// Input file
        input: PathBuf,

        /// Object number
        object: u32,
    },

    /// Print cross-reference entries
    Xref {
        /// Input file
        input: PathBuf,

        /// Only this object number
        object: Option<u32>,
    },

    /// Print every trailer, newest first
    Trailers {
        /// Input file
        input: PathBuf,
    },

    /// Print the catalog
    Root {
        /// Input file
        input: PathBuf,
    },

    /// Parse a page label specification (e.g. "r_4D")
    Labels {
        /// Specification text
        spec: String,

        /// Also print the labels of this many pages
        #[arg(short, long)]
        pages: Option<u32>,
    },

    /// Write the document back as a single revision
    Rewrite {
        /// Input file
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Record pagina as the document's Creator
        #[arg(long)]
        creator: bool,

        /// Install page labels from a specification
        #[arg(long)]
        page_labels: Option<String>,

        /// Unpack object streams into plain objects
        #[arg(long)]
        expand_object_streams: bool,
    },

    /// Interactive inspector
    Repl {
        /// Input file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut options = ParseOptions::default();
    if let Some(length) = cli.max_stream_length {
        options = options.with_max_stream_length(length);
    }
    if let Some(depth) = cli.max_depth {
        options = options.with_max_nesting_depth(depth);
    }

    match cli.command {
        Commands::Info { input } => {
            let doc = open(&input, options)?;

            println!("Document: {}", input.display());
            println!("Version: {}", doc.version());
            println!("Objects: {} (Size {})", doc.len(), doc.size());
            println!("Revisions: {}", doc.trailers().len());
            if doc.header_offset() > 0 {
                println!("Header offset: {}", doc.header_offset());
            }
            println!("Root: {}", describe_reference(doc.root()));
            println!("Info: {}", describe_reference(doc.info()));
        }

        Commands::Show { input, object } => {
            let doc = open(&input, options)?;
            let id = ObjectId::new(object, doc.generation(object));
            let value = doc
                .get_object(id)
                .ok_or_else(|| anyhow!("Object {object} is not present"))?;
            println!("{} {} obj", id.number(), id.generation());
            println!("{}", render(value));
        }

        Commands::Xref { input, object } => {
            let doc = open(&input, options)?;
            match object {
                Some(number) => {
                    let entry = doc
                        .xref()
                        .get(number)
                        .ok_or_else(|| anyhow!("No xref entry for object {number}"))?;
                    println!("{}", repl::format_xref_entry(number, entry));
                }
                None => {
                    for (number, entry) in doc.xref().iter() {
                        println!("{}", repl::format_xref_entry(number, entry));
                    }
                }
            }
        }

        Commands::Trailers { input } => {
            let doc = open(&input, options)?;
            for (i, trailer) in doc.trailers().iter().enumerate() {
                println!("Revision {} (xref at {}):", i, trailer.xref_offset);
                println!("{}", object_to_string(&Object::Dictionary(trailer.dict.clone())));
            }
        }

        Commands::Root { input } => {
            let doc = open(&input, options)?;
            let root = doc.root().ok_or_else(|| anyhow!("Trailer has no /Root"))?;
            let catalog = doc.catalog().context("Failed to read catalog")?;
            println!("{} {} obj", root.number(), root.generation());
            println!("{}", object_to_string(&Object::Dictionary(catalog.clone())));
        }

        Commands::Labels { spec, pages } => {
            let tree = parse_page_label_spec(&spec)
                .with_context(|| format!("Invalid page label specification '{spec}'"))?;
            println!("{}", object_to_string(&Object::Dictionary(tree.to_dict())));
            if let Some(pages) = pages {
                for (index, label) in tree.get_all_labels(pages).iter().enumerate() {
                    println!("{index}: {label}");
                }
            }
        }

        Commands::Rewrite {
            input,
            output,
            creator,
            page_labels,
            expand_object_streams,
        } => {
            let mut doc = open(&input, options)?;

            if expand_object_streams {
                let count = doc
                    .expand_all_object_streams(&FlateCodec)
                    .context("Failed to expand object streams")?;
                debug!("{} objects unpacked from object streams", count);
            }
            if let Some(spec) = page_labels {
                let tree = parse_page_label_spec(&spec)
                    .with_context(|| format!("Invalid page label specification '{spec}'"))?;
                doc.set_page_labels(tree.to_dict())
                    .context("Failed to install page labels")?;
            }
            if creator {
                doc.set_info_creator()?;
            }

            doc.save(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "✓ Wrote {} objects to {}",
                doc.len(),
                output.display()
            );
        }

        Commands::Repl { input } => {
            let mut doc = open(&input, options)?;
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            repl::run(&mut doc, stdin.lock(), &mut stdout)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open(path: &Path, options: ParseOptions) -> Result<Document> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Document::from_reader_with_options(BufReader::new(file), options)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn describe_reference(id: Option<ObjectId>) -> String {
    id.map_or_else(|| "none".to_string(), |id| id.to_string())
}

/// Streams show their dictionary and payload size instead of the payload
pub(crate) fn render(object: &Object) -> String {
    match object {
        Object::Stream(stream) => format!(
            "{}\nstream ({} bytes)",
            object_to_string(&Object::Dictionary(stream.dictionary().clone())),
            stream.data().len()
        ),
        other => object_to_string(other),
    }
}
