//! flowdoc - HTML to flow-document converter

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use flowdoc::doc::NodeKind;
use flowdoc::{ConvertOptions, Document, NodeId, convert_file};

#[derive(Parser)]
#[command(name = "flowdoc")]
#[command(version, about = "Convert styled HTML into a flow-document tree", long_about = None)]
#[command(after_help = "EXAMPLES:
    flowdoc page.html              Convert and print the document tree
    flowdoc --fragment clip.html   Extract the marked clipboard fragment")]
struct Cli {
    /// Input HTML file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Extract the StartFragment/EndFragment region only
    #[arg(long)]
    fragment: bool,

    /// Suppress the tree dump; useful to just check the input converts
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let options = ConvertOptions {
        extract_fragment: cli.fragment,
        ..ConvertOptions::default()
    };
    let doc = convert_file(&cli.input, &options).map_err(|e| e.to_string())?;

    if !cli.quiet {
        dump(&doc, doc.root(), 0);
    }
    Ok(())
}

fn dump(doc: &Document, node: NodeId, depth: usize) {
    let indent = "  ".repeat(depth);
    let kind = doc.kind(node);
    match kind {
        NodeKind::Run { text } => println!("{indent}run {:?}", text),
        NodeKind::Hyperlink { uri, .. } => println!("{indent}hyperlink -> {uri}"),
        NodeKind::Image { source, .. } => println!("{indent}image -> {source}"),
        NodeKind::Cell { col_span, row_span } => {
            println!("{indent}cell (span {col_span}x{row_span})")
        }
        NodeKind::Table { columns } => println!("{indent}table {columns:?}"),
        other => println!("{indent}{}", other.name()),
    }
    for &child in doc.children(node) {
        dump(doc, child, depth + 1);
    }
}
