//! human-map16 CLI
//!
//! Convert .map16 files to directories of text files and back.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use human_map16::directory::page_file_name;
use human_map16::{Decoder, Encoder, Map16Document};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "human-map16")]
#[command(version)]
#[command(about = "Convert between .map16 files and human-readable text directories")]
#[command(args_conflicts_with_subcommands = true, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// A .map16 file or a page directory; the direction follows from its kind
    path: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a .map16 file into a directory of page files
    #[command(name = "from-map16", long_flag = "from-map16")]
    FromMap16 {
        /// Input .map16 file
        input: PathBuf,

        /// Output directory (must not exist or be empty)
        output: PathBuf,

        /// List the page files written
        #[arg(short, long)]
        verbose: bool,
    },

    /// Convert a directory of page files into a .map16 file
    #[command(name = "to-map16", long_flag = "to-map16")]
    ToMap16 {
        /// Input page directory
        input: PathBuf,

        /// Output .map16 file
        output: PathBuf,

        /// Replace the output file if it exists
        #[arg(short, long)]
        force: bool,

        /// List the page files read
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            let code = err
                .downcast_ref::<human_map16::Error>()
                .map_or(1, |e| e.kind().exit_code());
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match (cli.command, cli.path) {
        (Some(Commands::FromMap16 { input, output, verbose }), _) => from_map16(&input, &output, verbose),
        (Some(Commands::ToMap16 { input, output, force, verbose }), _) => {
            to_map16(&input, &output, force, verbose)
        }
        (None, Some(path)) => drag_and_drop(&path),
        (None, None) => bail!("no input given, try --help for usage"),
    }
}

fn from_map16(input: &Path, output: &Path, verbose: bool) -> Result<()> {
    let doc = Decoder::new().decode(input, output)?;

    if verbose {
        list_pages(&doc, "Wrote");
    }
    println!("{:?} successfully converted to {:?}", input, output);
    Ok(())
}

fn to_map16(input: &Path, output: &Path, force: bool, verbose: bool) -> Result<()> {
    let doc = Encoder::new().with_overwrite(force).encode(input, output)?;

    if verbose {
        list_pages(&doc, "Read");
    }
    println!("{:?} successfully converted to {:?}", input, output);
    Ok(())
}

/// A directory becomes `<stem>.map16`, a file becomes directory `<stem>`
fn drag_and_drop(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("path {:?} does not exist", path);
    }
    let Some(stem) = path.file_stem() else {
        bail!("cannot derive an output name from {:?}", path);
    };

    if path.is_dir() {
        let mut output = PathBuf::from(stem);
        output.set_extension("map16");
        to_map16(path, &output, false, false)
    } else {
        from_map16(path, Path::new(stem), false)
    }
}

fn list_pages(doc: &Map16Document, verb: &str) {
    for index in 0..doc.page_count() {
        println!("{}: {}", verb, page_file_name(index));
    }
}
