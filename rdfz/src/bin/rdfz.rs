use clap::{Args, Parser, Subcommand};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use rdfz::PacketReader;

#[derive(Parser)]
#[command(name = "rdfz", version, about = "Inspect RDFZ packet streams")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print header flags and triple/prefix counts
    Stat(StatArgs),
    /// Decode a stream to N-Triples on stdout
    Dump(DumpArgs),
}

#[derive(Args)]
struct StatArgs {
    #[arg(long = "file")]
    file: PathBuf,
    #[arg(long = "verbose", default_value_t = false)]
    verbose: bool,
}

#[derive(Args)]
struct DumpArgs {
    #[arg(long = "file")]
    file: PathBuf,
}

fn open(file: &PathBuf) -> PacketReader<File> {
    let opened = File::open(file)
        .map_err(rdfz::RdfzError::from)
        .and_then(PacketReader::new);
    match opened {
        Ok(r) => r,
        Err(e) => {
            eprintln!("rdfz: failed to open '{}': {}", file.display(), e);
            std::process::exit(2);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Stat(args) => {
            let mut r = open(&args.file);
            let h = *r.header();
            if args.verbose {
                eprintln!(
                    "header.magic='{}' version={} flags=0x{:04x} crc={} zstd={}",
                    std::str::from_utf8(&h.magic).unwrap_or("????"),
                    h.version_u16,
                    h.flags_u16,
                    h.has_crc(),
                    h.is_zstd()
                );
            }
            let start = Instant::now();
            let mut n_triples = 0u64;
            let mut subjects = HashSet::new();
            for t in r.by_ref() {
                let (s, _, _) = t?;
                subjects.insert(s);
                n_triples += 1;
            }
            eprintln!(
                "triples: {} subjects: {} prefixes: {} in {:?}",
                n_triples,
                subjects.len(),
                r.prefixes().len(),
                start.elapsed()
            );
            if args.verbose {
                for (i, p) in r.prefixes().iter().enumerate() {
                    eprintln!("  [{}] {}", i, p);
                }
            }
        }
        Commands::Dump(args) => {
            let r = open(&args.file);
            let stdout = std::io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            for t in r {
                let (s, p, o) = t?;
                writeln!(out, "{} {} {} .", s, p, o)?;
            }
            out.flush()?;
        }
    }
    Ok(())
}
