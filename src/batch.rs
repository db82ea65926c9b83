//! Converting many message files into one document
//!
//! Two modes exist. [`SharedBatch`] streams every source against one
//! open-tag stack that starts with a container element, exactly like a
//! single long source would be parsed. [`convert_batch`] parses every source
//! into its own document and grafts the results under the container in
//! input order, which allows skipping broken files and parsing on several
//! threads.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::thread;

use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::dom::{Document, NodeId};
use crate::error::{ErrorKind, ParseError, Result};
use crate::parser::{ParserConfig, ParsingContext, VmsgParser};
use crate::source::LineReader;

/// Tag of the element wrapping every message of a batch
pub const DEFAULT_CONTAINER_TAG: &str = "bjf:messages";
/// Namespace declaration placed on the container
pub const DEFAULT_CONTAINER_NAMESPACE: (&str, &str) =
    ("xmlns:bjf", "http://bjf.id.au/vmsgreader");
/// File extension picked up when a directory is given as input
pub const MESSAGE_EXTENSION: &str = "vmg";

/// What a batch does when one source fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnError {
    /// Stop and return the failure
    #[default]
    Abort,
    /// Log the failure, leave the source out and carry on
    Skip,
}

/// Configuration for batch conversion
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub parser: ParserConfig,
    pub container_tag: String,
    pub container_attributes: Vec<(String, String)>,
    pub on_error: OnError,
    /// Worker threads for [`convert_batch`]; 0 and 1 both mean sequential
    pub jobs: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        let (name, uri) = DEFAULT_CONTAINER_NAMESPACE;
        Self {
            parser: ParserConfig::default(),
            container_tag: DEFAULT_CONTAINER_TAG.to_string(),
            container_attributes: vec![(name.to_string(), uri.to_string())],
            on_error: OnError::Abort,
            jobs: 1,
        }
    }
}

/// One input of a batch
#[derive(Debug, Clone)]
pub enum BatchSource {
    File(PathBuf),
    Memory { label: String, contents: Vec<u8> },
}

impl BatchSource {
    pub fn memory(label: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self::Memory {
            label: label.into(),
            contents: contents.into(),
        }
    }

    /// Name used in logs and error context
    pub fn label(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Memory { label, .. } => label.clone(),
        }
    }

    fn open(&self) -> Result<Box<dyn Read + '_>> {
        match self {
            Self::File(path) => {
                let file = File::open(path)
                    .map_err(|e| ParseError::new(ErrorKind::SourceReadFailure(e)))?;
                Ok(Box::new(file))
            }
            Self::Memory { contents, .. } => Ok(Box::new(contents.as_slice())),
        }
    }

    fn parse(&self, parser: &VmsgParser) -> Result<Document> {
        self.open()
            .and_then(|reader| parser.parse_reader(reader))
            .map_err(|e| e.with_context(self.label()))
    }
}

impl From<PathBuf> for BatchSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

/// Result of [`convert_batch`]
#[derive(Debug)]
pub struct BatchReport {
    pub document: Document,
    /// Number of sources merged into the document
    pub converted: usize,
    /// Sources left out under [`OnError::Skip`], in input order
    pub failures: Vec<ParseError>,
}

fn create_container(document: &mut Document, config: &BatchConfig) -> Result<NodeId> {
    let container = document.create_element(config.container_tag.as_str())?;
    for (name, value) in &config.container_attributes {
        document.set_attribute(container, name.as_str(), value.as_str())?;
    }
    document.append_child(document.root(), container)?;
    Ok(container)
}

/// Batch that parses every source against one persistent stack
///
/// A failed source leaves whatever it built in the tree, so the batch
/// should be dropped after an error.
#[derive(Debug)]
pub struct SharedBatch {
    parser: VmsgParser,
    document: Document,
    context: ParsingContext,
    container: NodeId,
    sources: usize,
}

impl SharedBatch {
    pub fn new(config: &BatchConfig) -> Result<Self> {
        let parser = VmsgParser::with_config(config.parser.clone())?;
        let mut document = Document::new();
        let container = create_container(&mut document, config)?;
        let context = ParsingContext::within(document.root(), container);
        Ok(Self {
            parser,
            document,
            context,
            container,
            sources: 0,
        })
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    /// Number of sources pushed successfully
    pub fn sources(&self) -> usize {
        self.sources
    }

    /// Streams one line source into the batch
    pub fn push_source<I, S>(&mut self, source: I) -> Result<()>
    where
        I: IntoIterator<Item = io::Result<S>>,
        S: AsRef<str>,
    {
        self.parser
            .parse_into(&mut self.document, &mut self.context, source)?;
        self.sources += 1;
        Ok(())
    }

    /// Streams one [`BatchSource`] into the batch
    pub fn push(&mut self, source: &BatchSource) -> Result<()> {
        debug!(source = %source.label(), "adding source to shared batch");
        let reader = source.open().map_err(|e| e.with_context(source.label()))?;
        self.push_source(LineReader::new(reader))
            .map_err(|e| e.with_context(source.label()))
    }

    pub fn finish(self) -> Document {
        self.document
    }
}

/// Parses every source on its own and merges the results under a container
#[instrument(skip_all, fields(sources = sources.len(), jobs = config.jobs))]
pub fn convert_batch(sources: &[BatchSource], config: &BatchConfig) -> Result<BatchReport> {
    let parser = VmsgParser::with_config(config.parser.clone())?;
    let mut merger = Merger::new(config)?;

    if config.jobs > 1 && sources.len() > 1 {
        for (index, result) in parse_parallel(sources, &parser, config.jobs) {
            let label = sources.get(index).map(BatchSource::label);
            merger.add(label, result)?;
        }
    } else {
        for source in sources {
            merger.add(Some(source.label()), source.parse(&parser))?;
        }
    }

    info!(
        converted = merger.converted,
        skipped = merger.failures.len(),
        "batch finished"
    );
    Ok(merger.finish())
}

/// Parses contiguous chunks of `sources` on scoped worker threads
///
/// Each worker builds independent documents; results come back sorted by
/// input position.
fn parse_parallel(
    sources: &[BatchSource],
    parser: &VmsgParser,
    jobs: usize,
) -> Vec<(usize, Result<Document>)> {
    let chunk_size = sources.len().div_ceil(jobs).max(1);
    let results = Mutex::new(Vec::with_capacity(sources.len()));

    thread::scope(|scope| {
        for (chunk_index, chunk) in sources.chunks(chunk_size).enumerate() {
            let results = &results;
            scope.spawn(move || {
                let parsed: Vec<(usize, Result<Document>)> = chunk
                    .iter()
                    .enumerate()
                    .map(|(offset, source)| {
                        (chunk_index * chunk_size + offset, source.parse(parser))
                    })
                    .collect();
                results.lock().extend(parsed);
            });
        }
    });

    let mut results = results.into_inner();
    results.sort_by_key(|(index, _)| *index);
    results
}

struct Merger<'a> {
    config: &'a BatchConfig,
    document: Document,
    container: NodeId,
    converted: usize,
    failures: Vec<ParseError>,
}

impl<'a> Merger<'a> {
    fn new(config: &'a BatchConfig) -> Result<Self> {
        let mut document = Document::new();
        let container = create_container(&mut document, config)?;
        Ok(Self {
            config,
            document,
            container,
            converted: 0,
            failures: Vec::new(),
        })
    }

    fn add(&mut self, label: Option<String>, result: Result<Document>) -> Result<()> {
        match result {
            Ok(parsed) => {
                for &child in parsed.children(parsed.root()) {
                    self.document
                        .import_subtree(self.container, &parsed, child)?;
                }
                self.converted += 1;
                Ok(())
            }
            Err(e) if self.config.on_error == OnError::Skip => {
                warn!(source = label.as_deref().unwrap_or("?"), "skipping: {}", e);
                self.failures.push(e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn finish(self) -> BatchReport {
        BatchReport {
            document: self.document,
            converted: self.converted,
            failures: self.failures,
        }
    }
}

/// Expands inputs into message files
///
/// Files are kept as given. A directory contributes its `*.vmg` entries
/// (case-insensitive, not recursive), sorted by path.
pub fn expand_inputs<P: AsRef<Path>>(inputs: &[P]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        if input.is_dir() {
            let mut entries = Vec::new();
            for entry in fs::read_dir(input)? {
                let path = entry?.path();
                if path.is_file() && has_message_extension(&path) {
                    entries.push(path);
                }
            }
            entries.sort();
            debug!(dir = %input.display(), files = entries.len(), "scanned directory");
            files.extend(entries);
        } else {
            files.push(input.to_path_buf());
        }
    }
    Ok(files)
}

fn has_message_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(MESSAGE_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_container() -> Result<()> {
        let mut doc = Document::new();
        let container = create_container(&mut doc, &BatchConfig::default())?;
        assert_eq!(doc.tag_name(container), Some("bjf:messages"));
        assert_eq!(
            doc.attribute(container, "xmlns:bjf"),
            Some("http://bjf.id.au/vmsgreader")
        );
        Ok(())
    }

    #[test]
    fn test_message_extension_case_insensitive() {
        assert!(has_message_extension(Path::new("inbox/0001.vmg")));
        assert!(has_message_extension(Path::new("inbox/0001.VMG")));
        assert!(!has_message_extension(Path::new("inbox/notes.txt")));
        assert!(!has_message_extension(Path::new("inbox/vmg")));
    }

    #[test]
    fn test_parallel_results_sorted() {
        let sources: Vec<BatchSource> = (0..7)
            .map(|i| {
                BatchSource::memory(format!("m{i}"), format!("BEGIN:M{i}\nEND:M{i}\n"))
            })
            .collect();
        let parser = VmsgParser::new();
        let results = parse_parallel(&sources, &parser, 3);
        let indices: Vec<usize> = results.iter().map(|(index, _)| *index).collect();
        assert_eq!(indices, (0..7).collect::<Vec<_>>());
        assert!(results.iter().all(|(_, result)| result.is_ok()));
    }
}
