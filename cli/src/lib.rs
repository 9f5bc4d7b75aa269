use anyhow::{anyhow, Error, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use trine::codec::ntriples::parse_term;
use trine::config::{Config, StoreKind};
use trine::format::{self, Format};
use trine::loader::{LoadReport, Loader};
use trine::{AppendStore, Graph, Store, Term};

#[derive(Debug, Parser)]
#[command(name = "trine")]
#[command(about = "Convert, inspect and filter RDF files")]
#[command(version)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Verbose mode - sets the RUST_LOG level to info, defaults to warning level
    #[clap(long, short, action, default_value = "false", global = true)]
    verbose: bool,
    /// Debug mode - sets the RUST_LOG level to debug, defaults to warning level
    #[clap(long, action, default_value = "false", global = true)]
    debug: bool,
    /// Store implementation backing the graph: 'append' or 'index'
    #[clap(long, global = true)]
    store: Option<StoreKind>,
    /// JSON configuration file (store, prefixes, include/exclude globs, strict)
    #[clap(long, short, global = true)]
    config: Option<PathBuf>,
    /// Strict mode - fail on the first input that cannot be loaded
    #[clap(long, action, default_value = "false", global = true)]
    strict: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert RDF files to another format
    Convert {
        /// Input files, directories or http(s) URLs; '-' reads STDIN (requires --from)
        #[clap(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        /// Input format id; guessed from each file extension if omitted
        #[clap(long, short)]
        from: Option<String>,
        /// Output format id; guessed from --output, defaults to 'ntriples'
        #[clap(long, short)]
        to: Option<String>,
        /// Output file path; if omitted, writes to STDOUT
        #[clap(long, short)]
        output: Option<PathBuf>,
    },
    /// Print triple, subject and predicate counts
    Stat {
        #[clap(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        #[clap(long, short)]
        from: Option<String>,
        /// Output JSON instead of text
        #[clap(long, action, default_value = "false")]
        json: bool,
    },
    /// Print the triples matching a pattern. Terms use N-Triples syntax
    /// (`<http://...>`, `_:b0`, `"text"@en`) or a bound prefix (`rdf:type`).
    Filter {
        #[clap(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        #[clap(long, short)]
        from: Option<String>,
        #[clap(long, short)]
        subject: Option<String>,
        #[clap(long, short)]
        predicate: Option<String>,
        #[clap(long, short)]
        object: Option<String>,
        /// Output format id, defaults to 'ntriples'
        #[clap(long, short)]
        to: Option<String>,
    },
    /// List the supported formats
    Formats,
}

pub fn run() -> Result<()> {
    trine::init_logging();
    let cmd = Cli::parse();
    execute(cmd)
}

pub fn run_from_args<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    trine::init_logging();
    let cmd = Cli::try_parse_from(args).map_err(Error::from)?;
    execute(cmd)
}

fn execute(cmd: Cli) -> Result<()> {
    // CLI flags take precedence over RUST_LOG (or TRINE_LOG via init_logging)
    if cmd.debug {
        std::env::set_var("RUST_LOG", "debug");
    } else if cmd.verbose {
        std::env::set_var("RUST_LOG", "info");
    } else if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "warn");
    }
    let _ = env_logger::try_init();

    let mut config = match &cmd.config {
        Some(path) => Config::from_file(path)?,
        None => Config::builder().build()?,
    };
    if let Some(store) = cmd.store {
        config.store = store;
    }
    if cmd.strict {
        config.strict = true;
    }

    match cmd.command {
        Commands::Convert {
            inputs,
            from,
            to,
            output,
        } => {
            let (graph, _) = load(&config, &inputs, from.as_deref())?;
            let format = output_format(to.as_deref(), output.as_deref())?;
            write_graph(&graph, format, output.as_deref())?;
        }
        Commands::Stat { inputs, from, json } => {
            let (graph, report) = load(&config, &inputs, from.as_deref())?;
            let (subjects, predicates) = graph.with_store(|store| {
                let mut subjects = BTreeSet::new();
                let mut predicates = BTreeSet::new();
                for t in store.iter() {
                    subjects.insert(t.subject);
                    predicates.insert(t.predicate);
                }
                (subjects.len(), predicates.len())
            });
            if json {
                let sources: Vec<serde_json::Value> = report
                    .loaded
                    .iter()
                    .map(|(path, n)| serde_json::json!({"source": path, "triples": n}))
                    .collect();
                let obj = serde_json::json!({
                    "triples": graph.count(),
                    "subjects": subjects,
                    "predicates": predicates,
                    "sources": sources,
                    "failed": report.failed.len(),
                });
                println!("{}", serde_json::to_string_pretty(&obj)?);
            } else {
                println!("Sources: {}", report.loaded.len());
                for (path, n) in &report.loaded {
                    println!("  {}: {} triples", path.display(), n);
                }
                println!("Triples: {}", graph.count());
                println!("Subjects: {}", subjects);
                println!("Predicates: {}", predicates);
            }
        }
        Commands::Filter {
            inputs,
            from,
            subject,
            predicate,
            object,
            to,
        } => {
            let (graph, _) = load(&config, &inputs, from.as_deref())?;
            let s = pattern_term(&graph, subject.as_deref())?;
            let p = pattern_term(&graph, predicate.as_deref())?;
            let o = pattern_term(&graph, object.as_deref())?;

            let matches: Graph<AppendStore> = Graph::new();
            for (base, name) in graph.prefixes().iter() {
                matches.bind(base, name);
            }
            let n = graph.filter_subset(&matches, s.as_ref(), p.as_ref(), o.as_ref())?;
            info!("{} triples match", n);
            write_graph(&matches, output_format(to.as_deref(), None)?, None)?;
        }
        Commands::Formats => {
            println!(
                "{:<10} {:<16} {:<6} {:<6} {:<12} MIME TYPES",
                "ID", "NAME", "READ", "WRITE", "EXTENSIONS"
            );
            for f in format::all() {
                let extensions: Vec<&str> = f.extensions().collect();
                let mime_types: Vec<&str> = f.mime_types().collect();
                println!(
                    "{:<10} {:<16} {:<6} {:<6} {:<12} {}",
                    f.id,
                    f.name,
                    yes_no(f.parser.is_some()),
                    yes_no(f.serializer.is_some()),
                    extensions.join(","),
                    mime_types.join(", ")
                );
            }
        }
    }

    Ok(())
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

fn load(
    config: &Config,
    inputs: &[PathBuf],
    from: Option<&str>,
) -> Result<(Graph<Box<dyn Store>>, LoadReport)> {
    let graph = Graph::from_config(config);
    let mut loader = Loader::new(config);
    if let Some(id) = from {
        loader = loader.with_format(format::require(id)?);
    } else if inputs.iter().any(|p| p.as_os_str() == "-") {
        return Err(anyhow!("reading STDIN requires --from"));
    }
    let report = loader.load(&graph, inputs)?;
    for (path, err) in &report.failed {
        eprintln!("Skipped {}: {}", path.display(), err);
    }
    info!(
        "Loaded {} triples from {} sources into {}",
        report.total(),
        report.loaded.len(),
        config.store
    );
    Ok((graph, report))
}

fn output_format(to: Option<&str>, output: Option<&Path>) -> Result<&'static Format> {
    if let Some(id) = to {
        return Ok(format::require(id)?);
    }
    if let Some(format) = output.and_then(|p| format::from_filename(p)) {
        return Ok(format);
    }
    Ok(format::require("ntriples")?)
}

fn write_graph<S: Store>(graph: &Graph<S>, format: &Format, output: Option<&Path>) -> Result<()> {
    let serializer = format.serialize_fn()?;
    match output {
        Some(path) => {
            let file = BufWriter::new(File::create(path)?);
            graph.serialize(&serializer, file)?.flush()?;
            info!("Wrote {} as {}", path.display(), format.id);
        }
        None => {
            let stdout = BufWriter::new(std::io::stdout());
            graph.serialize(&serializer, stdout)?.flush()?;
        }
    }
    Ok(())
}

/// Parse a pattern term, accepting `name:local` for bound prefixes.
fn pattern_term<S: Store>(graph: &Graph<S>, text: Option<&str>) -> Result<Option<Term>> {
    let Some(text) = text else {
        return Ok(None);
    };
    match parse_term(text) {
        Ok(term) => Ok(Some(term)),
        Err(err) => graph
            .prefixes()
            .expand(text.trim())
            .map(|uri| Some(Term::Resource(uri)))
            .ok_or_else(|| anyhow!("invalid term '{}': {}", text, err)),
    }
}
