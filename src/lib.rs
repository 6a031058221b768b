//! # bhl-ead
//!
//! Streaming EAD 2002 export of archival resource trees, with the Bentley
//! Historical Library's customizations.
//!
//! ## Features
//!
//! - Depth-first walk that yields the document in chunks, one component at a time
//! - Mixed-content sanitizer that wraps or strips paragraphs and falls back to CDATA
//! - Inherited access restrictions and University records boilerplate
//! - Per-component error markers instead of aborting the whole export
//!
//! ## Quick Start
//!
//! ```no_run
//! use bhl_ead::{EadExporter, ExportOptions, ResourceTree};
//!
//! let tree = ResourceTree::from_path("resource.json")?;
//! let exporter = EadExporter::new().with_options(ExportOptions::default().with_daos(true));
//!
//! let mut out = std::fs::File::create("resource_ead.xml")?;
//! let summary = exporter.export_to_writer(&tree, &mut out)?;
//! if summary.has_errors() {
//!     eprintln!("{} components could not be exported", summary.degraded());
//! }
//! # Ok::<(), bhl_ead::Error>(())
//! ```
//!
//! ## Streaming
//!
//! [`EadExporter::stream`] returns an iterator of byte chunks, so a host can
//! forward output as it is produced:
//!
//! ```
//! use bhl_ead::{EadExporter, RecordNode, Resource, ResourceTree};
//!
//! let mut tree = ResourceTree::new(Resource::new("Jones Family Papers"));
//! tree.add_component(None, RecordNode::new("Diaries").with_level("series"))?;
//!
//! let exporter = EadExporter::new();
//! let chunks: Vec<Vec<u8>> = exporter.stream(&tree).collect();
//! assert!(chunks.len() >= 3);
//! # Ok::<(), bhl_ead::Error>(())
//! ```

pub mod error;
pub mod export;
pub mod fragments;
pub mod labels;
pub mod model;
pub mod restrictions;
pub mod sanitize;
pub(crate) mod util;

pub use error::{Error, Result};
pub use export::{
    EadExporter, EadStream, ExportDiagnostic, ExportFormat, ExportMetadata, ExportOptions,
    ExportProfile, ExportSummary, export_metadata,
};
pub use labels::LabelTable;
pub use model::{NodeId, NodeSource, RecordNode, Resource, ResourceStore, ResourceTree};
pub use restrictions::RestrictionCategory;
pub use sanitize::{ParagraphMode, Sanitizer};
