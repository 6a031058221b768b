//! EAD finding-aid export.
//!
//! The [`EadExporter`] holds everything that stays fixed for the lifetime of
//! an export: options, label table and the formatting strategies selected by
//! the [`ExportProfile`]. Calling [`EadExporter::stream`] walks a resource
//! tree and yields the document as a sequence of chunks.
//!
//! # Example
//!
//! ```
//! use bhl_ead::export::{EadExporter, ExportOptions};
//! use bhl_ead::model::{Extent, RecordNode, Resource, ResourceTree};
//!
//! let mut resource = Resource::new("Smith Papers");
//! resource.record.extents.push(Extent::new("1", "boxes"));
//! let mut tree = ResourceTree::new(resource);
//! tree.add_component(None, RecordNode::new("Correspondence").with_level("series"))?;
//!
//! let exporter = EadExporter::new().with_options(ExportOptions::default());
//! let xml = exporter.export_to_string(&tree)?;
//! assert!(xml.contains("<extent>1 box</extent>"));
//! # Ok::<(), bhl_ead::Error>(())
//! ```

use std::collections::BTreeSet;
use std::io::Write;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::labels::LabelTable;
use crate::model::{NodeSource, ResourceStore};
use crate::restrictions::RestrictionCategory;
use crate::sanitize::Sanitizer;
use crate::util::export_nonce;

mod controlaccess;
mod did;
mod extents;
mod header;
mod metadata;
mod notes;
mod stream;
mod walker;
mod writer;

pub use controlaccess::{BhlControlAccess, ControlAccessFormatter, PlainControlAccess, TermKind};
pub use extents::{CombinedExtents, ExtentFormatter, Scope, SplitExtents, singularize_extent};
pub use metadata::{ExportFormat, ExportMetadata, export_metadata};
pub use stream::{EadStream, ExportSummary};
pub use walker::{EXPORT_ERROR_MARKER, ExportDiagnostic, NodeLocation};

use writer::EadWriter;

/// Options resolved once per export request.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Include records and notes whose publish flag is off.
    pub include_unpublished: bool,
    /// Write `<dao>` elements for digital object instances.
    pub include_daos: bool,
    /// Use `<c01>`, `<c02>`, ... instead of `<c>`.
    pub numbered_c_tags: bool,
    /// University restriction categories present in the collection.
    pub restriction_types: BTreeSet<RestrictionCategory>,
    /// Prefix for component and note ids.
    pub id_prefix: String,
    /// Timestamp for the creation statement; `None` means now.
    pub generated_at: Option<DateTime<Utc>>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_unpublished: false,
            include_daos: false,
            numbered_c_tags: false,
            restriction_types: BTreeSet::new(),
            id_prefix: "aspace_".to_string(),
            generated_at: None,
        }
    }
}

impl ExportOptions {
    pub fn with_unpublished(mut self, include: bool) -> Self {
        self.include_unpublished = include;
        self
    }

    pub fn with_daos(mut self, include: bool) -> Self {
        self.include_daos = include;
        self
    }

    pub fn with_numbered_c_tags(mut self, numbered: bool) -> Self {
        self.numbered_c_tags = numbered;
        self
    }

    pub fn with_restriction_types(
        mut self,
        types: impl IntoIterator<Item = RestrictionCategory>,
    ) -> Self {
        self.restriction_types = types.into_iter().collect();
        self
    }

    pub fn with_generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }

    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }
}

/// Which set of formatting strategies to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportProfile {
    /// Bentley Historical Library finding aids.
    #[default]
    Bhl,
    /// The host's stock EAD with the library's extent and heading tweaks.
    Standard,
}

impl ExportProfile {
    fn sanitizer(self) -> Sanitizer {
        match self {
            ExportProfile::Bhl => Sanitizer::bhl(),
            ExportProfile::Standard => Sanitizer::standard(),
        }
    }

    fn extent_formatter(self) -> Box<dyn ExtentFormatter> {
        match self {
            ExportProfile::Bhl => Box::new(SplitExtents),
            ExportProfile::Standard => Box::new(CombinedExtents),
        }
    }

    fn controlaccess_formatter(self) -> Box<dyn ControlAccessFormatter> {
        match self {
            ExportProfile::Bhl => Box::new(BhlControlAccess),
            ExportProfile::Standard => Box::new(PlainControlAccess),
        }
    }
}

impl std::str::FromStr for ExportProfile {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bhl" => Ok(ExportProfile::Bhl),
            "standard" | "ead" => Ok(ExportProfile::Standard),
            other => Err(crate::Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Streaming EAD exporter.
///
/// Configuration is held in the struct; each call to [`stream`](Self::stream)
/// is an independent export with its own fragment buffers and restriction
/// state, so one exporter can serve concurrent exports.
pub struct EadExporter {
    options: ExportOptions,
    labels: LabelTable,
    sanitizer: Sanitizer,
    extents: Box<dyn ExtentFormatter>,
    controlaccess: Box<dyn ControlAccessFormatter>,
}

impl EadExporter {
    /// Create an exporter with the BHL profile and default options.
    pub fn new() -> Self {
        Self::with_profile(ExportProfile::Bhl)
    }

    pub fn with_profile(profile: ExportProfile) -> Self {
        Self {
            options: ExportOptions::default(),
            labels: LabelTable::english(),
            sanitizer: profile.sanitizer(),
            extents: profile.extent_formatter(),
            controlaccess: profile.controlaccess_formatter(),
        }
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_labels(mut self, labels: LabelTable) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_extent_formatter(mut self, formatter: impl ExtentFormatter + 'static) -> Self {
        self.extents = Box::new(formatter);
        self
    }

    pub fn with_controlaccess_formatter(
        mut self,
        formatter: impl ControlAccessFormatter + 'static,
    ) -> Self {
        self.controlaccess = Box::new(formatter);
        self
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Start streaming the finding aid for `source`.
    pub fn stream<'a, S: NodeSource + ?Sized>(&'a self, source: &'a S) -> EadStream<'a, S> {
        EadStream::new(self.context(), source)
    }

    /// Look up a resource by id and start streaming it.
    ///
    /// Fails with [`Error::NotFound`](crate::Error::NotFound) before any
    /// output is produced when the id is unknown.
    pub fn stream_by_id<'a>(
        &'a self,
        store: &'a ResourceStore,
        id: u64,
    ) -> Result<EadStream<'a, crate::model::ResourceTree>> {
        let tree = store.get(id)?;
        Ok(self.stream(tree))
    }

    /// Stream the whole document into `writer`.
    pub fn export_to_writer<S, W>(&self, source: &S, writer: &mut W) -> Result<ExportSummary>
    where
        S: NodeSource + ?Sized,
        W: Write,
    {
        let mut stream = self.stream(source);
        for chunk in stream.by_ref() {
            writer.write_all(&chunk)?;
        }
        writer.flush()?;
        Ok(stream.summary())
    }

    /// Export into a string.
    pub fn export_to_string<S: NodeSource + ?Sized>(&self, source: &S) -> Result<String> {
        let mut out = Vec::new();
        self.export_to_writer(source, &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn context(&self) -> Context<'_> {
        Context {
            options: &self.options,
            labels: &self.labels,
            sanitizer: self.sanitizer,
            extents: self.extents.as_ref(),
            controlaccess: self.controlaccess.as_ref(),
            nonce: export_nonce(),
        }
    }
}

impl Default for EadExporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-export state shared by all serializers.
#[derive(Clone, Copy)]
pub(crate) struct Context<'a> {
    pub options: &'a ExportOptions,
    pub labels: &'a LabelTable,
    pub sanitizer: Sanitizer,
    pub extents: &'a dyn ExtentFormatter,
    pub controlaccess: &'a dyn ControlAccessFormatter,
    pub nonce: u64,
}

impl Context<'_> {
    /// A fresh writer for one output chunk.
    pub fn writer(&self) -> EadWriter {
        EadWriter::new(self.nonce, self.sanitizer)
    }

    /// Whether content with this publish flag is written.
    pub fn shows(&self, publish: bool) -> bool {
        publish || self.options.include_unpublished
    }

    /// Prefix an id with the configured prefix unless it already has it.
    pub fn prefix_id(&self, id: Option<&str>) -> Option<String> {
        let id = id?;
        if id.is_empty() || id == "null" {
            return None;
        }
        if id.starts_with(&self.options.id_prefix) {
            Some(id.to_string())
        } else {
            Some(format!("{}{}", self.options.id_prefix, id))
        }
    }
}

/// Where in the tree a serializer is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Level {
    Resource,
    Child,
}

impl From<Level> for Scope {
    fn from(level: Level) -> Self {
        match level {
            Level::Resource => Scope::Resource,
            Level::Child => Scope::Component,
        }
    }
}
