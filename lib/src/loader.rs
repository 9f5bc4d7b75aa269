//! Loading many files (or whole directories) into one graph.

use crate::config::{self, Config};
use crate::errors::{Error, Result};
#[cfg(feature = "http")]
use crate::fetch::{self, FetchOptions};
use crate::format::{self, Format};
use crate::graph::Graph;
use crate::store::Store;
use log::{debug, info, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Outcome of [`Loader::load`]: per-source triple counts and failures.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<(PathBuf, usize)>,
    pub failed: Vec<(PathBuf, Error)>,
}

impl LoadReport {
    /// Triples added across all sources.
    pub fn total(&self) -> usize {
        self.loaded.iter().map(|(_, n)| n).sum()
    }
}

pub struct Loader<'a> {
    config: &'a Config,
    format: Option<&'static Format>,
    #[cfg(feature = "http")]
    fetch: FetchOptions,
}

impl<'a> Loader<'a> {
    pub fn new(config: &'a Config) -> Self {
        Loader {
            config,
            format: None,
            #[cfg(feature = "http")]
            fetch: FetchOptions::default(),
        }
    }

    #[cfg(feature = "http")]
    pub fn with_fetch_options(mut self, opts: FetchOptions) -> Self {
        self.fetch = opts;
        self
    }

    /// Parse every source as `format` instead of guessing from its name.
    pub fn with_format(mut self, format: &'static Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Expand `inputs` into sources. Files and URLs named explicitly are
    /// always kept; directories are walked and filtered by the include and
    /// exclude globs.
    pub fn sources(&self, inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let (include_set, exclude_set) = self.config.build_globsets()?;
        let includes_empty = self.config.includes.is_empty();

        let mut files = Vec::new();
        for input in inputs {
            if !input.is_dir() {
                files.push(input.clone());
                continue;
            }
            for entry in WalkDir::new(input).follow_links(true).sort_by_file_name() {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        if self.config.strict {
                            return Err(std::io::Error::from(err).into());
                        }
                        warn!(
                            "Skipping entry under {} due to filesystem error: {}",
                            input.display(),
                            err
                        );
                        continue;
                    }
                };
                let path = entry.path();
                let rel = path.strip_prefix(input).unwrap_or(path);
                if entry.file_type().is_file()
                    && config::matches(&include_set, &exclude_set, includes_empty, rel)
                {
                    files.push(path.to_path_buf());
                }
            }
        }
        debug!("{} sources from {} inputs", files.len(), inputs.len());
        Ok(files)
    }

    fn format_for(&self, path: &Path) -> Result<&'static Format> {
        match self.format {
            Some(format) => Ok(format),
            None => format::from_filename(path)
                .ok_or_else(|| Error::UnknownFormat(path.display().to_string())),
        }
    }

    fn load_one<S: Store>(&self, graph: &Graph<S>, path: &Path) -> Result<usize> {
        let format = self.format_for(path)?;
        #[cfg(feature = "http")]
        if let Some(url) = path.to_str().filter(|s| fetch::is_url(s)) {
            return graph.parse_url(url, format, &self.fetch);
        }
        let parser = format.parse_fn()?;
        if path == Path::new("-") {
            return graph.parse(&parser, std::io::stdin());
        }
        let file = BufReader::new(File::open(path)?);
        graph.parse(&parser, file)
    }

    /// Load every source into `graph`.
    ///
    /// A failed source is recorded and the rest still load, unless the config
    /// is strict. Fails with [`Error::AllSourcesFailed`] when no source loaded.
    pub fn load<S: Store>(&self, graph: &Graph<S>, inputs: &[PathBuf]) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        for path in self.sources(inputs)? {
            match self.load_one(graph, &path) {
                Ok(n) => {
                    info!("Loaded {} triples from {}", n, path.display());
                    report.loaded.push((path, n));
                }
                Err(e) => {
                    if self.config.strict {
                        return Err(e);
                    }
                    warn!("Failed to load {}: {}", path.display(), e);
                    report.failed.push((path, e));
                }
            }
        }
        if report.loaded.is_empty() && !report.failed.is_empty() {
            return Err(Error::AllSourcesFailed(report.failed.len()));
        }
        Ok(report)
    }
}
