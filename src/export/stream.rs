//! Pull-based output of a finding aid.
//!
//! [`EadStream`] walks the tree depth first with an explicit stack. Each call
//! to `next` yields one chunk: the prologue, a component's own content, a
//! component's closing tag, a diagnostic, or the epilogue. Only the path from
//! the root to the current component is held in memory.

use std::sync::Arc;

use crate::error::Result;
use crate::model::{NodeId, NodeSource, Note};

use super::Context;
use super::walker::{
    ExportDiagnostic, NodeLocation, NodeOutcome, own_restriction, render_diagnostic,
    render_epilogue, render_failed_document, render_failed_epilogue, render_prologue,
    visit_component,
};

/// Counts collected while streaming.
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    /// Components written.
    pub rendered: usize,
    /// Components left out by the publish or suppressed flags.
    pub hidden: usize,
    /// Nodes replaced by an inline diagnostic.
    pub diagnostics: Vec<ExportDiagnostic>,
}

impl ExportSummary {
    pub fn degraded(&self) -> usize {
        self.diagnostics.len()
    }

    /// Whether the document contains embedded error markers.
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Prologue,
    Body,
    Epilogue,
    Done,
}

struct Frame {
    children: std::vec::IntoIter<NodeId>,
    depth: u32,
    restriction: Option<Arc<Note>>,
    close: Option<Vec<u8>>,
}

/// Lazy, forward-only sequence of output chunks.
///
/// The stream cannot be restarted; to export again, call
/// [`EadExporter::stream`](super::EadExporter::stream) again.
pub struct EadStream<'a, S: ?Sized> {
    ctx: Context<'a>,
    source: &'a S,
    stage: Stage,
    stack: Vec<Frame>,
    summary: ExportSummary,
}

impl<'a, S: NodeSource + ?Sized> EadStream<'a, S> {
    pub(crate) fn new(ctx: Context<'a>, source: &'a S) -> Self {
        let resource = source.resource();
        tracing::info!(
            resource = resource.id,
            title = resource.record.title.as_deref().unwrap_or(""),
            "starting EAD export"
        );
        Self {
            ctx,
            source,
            stage: Stage::Prologue,
            stack: Vec::new(),
            summary: ExportSummary::default(),
        }
    }

    /// Counts so far; complete once the stream is exhausted.
    pub fn summary(&self) -> ExportSummary {
        self.summary.clone()
    }

    fn prologue(&mut self) -> Vec<u8> {
        let source = self.source;
        let resource = source.resource();
        match render_prologue(&self.ctx, resource) {
            Ok(chunk) => {
                self.stack.push(Frame {
                    children: resource.record.children.clone().into_iter(),
                    depth: 0,
                    restriction: own_restriction(&resource.record).cloned().map(Arc::new),
                    close: None,
                });
                self.stage = Stage::Body;
                chunk
            }
            Err(err) => {
                let diagnostic = ExportDiagnostic::from_error(NodeLocation::Resource, &err);
                self.stage = Stage::Done;
                let chunk = render_failed_document(&self.ctx, resource, &diagnostic);
                self.degrade(diagnostic);
                self.emit(chunk)
            }
        }
    }

    /// Advance the walk until it produces a chunk or runs out of nodes.
    fn body(&mut self) -> Option<Vec<u8>> {
        let source = self.source;
        loop {
            let frame = self.stack.last_mut()?;
            let Some(id) = frame.children.next() else {
                let frame = self.stack.pop()?;
                if self.stack.is_empty() {
                    self.stage = Stage::Epilogue;
                }
                return frame.close;
            };
            let depth = frame.depth + 1;
            let inherited = frame.restriction.clone();

            let node = match source.component(id) {
                Ok(node) => node,
                Err(err) => {
                    let diagnostic = ExportDiagnostic::from_error(
                        NodeLocation::Component { id, depth },
                        &err,
                    );
                    return Some(self.degraded_chunk(diagnostic));
                }
            };

            match visit_component(&self.ctx, id, &node, depth, inherited.as_deref()) {
                NodeOutcome::Hidden => {
                    self.summary.hidden += 1;
                    tracing::debug!(id = id.0, depth, "component not published, skipping subtree");
                }
                NodeOutcome::Degraded(diagnostic) => {
                    return Some(self.degraded_chunk(diagnostic));
                }
                NodeOutcome::Rendered(rendered) => {
                    self.summary.rendered += 1;
                    let restriction = match own_restriction(&node) {
                        Some(own) => Some(Arc::new(own.clone())),
                        None => inherited,
                    };
                    self.stack.push(Frame {
                        children: node.children.clone().into_iter(),
                        depth,
                        restriction,
                        close: Some(rendered.close),
                    });
                    return Some(rendered.open);
                }
            }
        }
    }

    fn epilogue(&mut self) -> Vec<u8> {
        self.stage = Stage::Done;
        let source = self.source;
        let resource = source.resource();
        let chunk = match render_epilogue(&self.ctx, resource) {
            Ok(chunk) => chunk,
            Err(err) => {
                let diagnostic = ExportDiagnostic::from_error(NodeLocation::Resource, &err);
                let chunk = render_failed_epilogue(&self.ctx, &diagnostic);
                self.degrade(diagnostic);
                self.emit(chunk)
            }
        };
        tracing::info!(
            rendered = self.summary.rendered,
            hidden = self.summary.hidden,
            degraded = self.summary.degraded(),
            "finished EAD export"
        );
        chunk
    }

    fn degraded_chunk(&mut self, diagnostic: ExportDiagnostic) -> Vec<u8> {
        let chunk = render_diagnostic(&self.ctx, &diagnostic);
        self.degrade(diagnostic);
        self.emit(chunk)
    }

    fn degrade(&mut self, diagnostic: ExportDiagnostic) {
        tracing::warn!(
            location = %diagnostic.location,
            message = %diagnostic.message,
            "node could not be exported, writing diagnostic"
        );
        self.summary.diagnostics.push(diagnostic);
    }

    /// Unwrap a fallback chunk. Writing into memory only fails if the
    /// writer itself is broken, in which case an empty chunk is emitted.
    fn emit(&self, chunk: Result<Vec<u8>>) -> Vec<u8> {
        chunk.unwrap_or_else(|err| {
            tracing::error!(%err, "could not write diagnostic");
            Vec::new()
        })
    }
}

impl<S: NodeSource + ?Sized> Iterator for EadStream<'_, S> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        loop {
            match self.stage {
                Stage::Prologue => return Some(self.prologue()),
                Stage::Body => {
                    if let Some(chunk) = self.body() {
                        return Some(chunk);
                    }
                    if self.stack.is_empty() {
                        self.stage = Stage::Epilogue;
                    }
                }
                Stage::Epilogue => return Some(self.epilogue()),
                Stage::Done => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{EadExporter, ExportOptions};
    use crate::model::{RecordNode, Resource, ResourceTree};

    fn tree() -> ResourceTree {
        let mut tree = ResourceTree::new(Resource::new("Smith Papers"));
        let series = tree.add_component(None, RecordNode::new("Series 1")).unwrap();
        tree.add_component(Some(series), RecordNode::new("File A")).unwrap();
        tree.add_component(None, RecordNode::new("Series 2")).unwrap();
        tree
    }

    #[test]
    fn test_chunk_sequence() {
        let exporter = EadExporter::new();
        let tree = tree();
        let chunks: Vec<String> = exporter
            .stream(&tree)
            .map(|c| String::from_utf8(c).unwrap())
            .collect();

        // prologue, series 1, file a, </c>, </c>, series 2, </c>, epilogue
        assert_eq!(chunks.len(), 8);
        assert!(chunks[0].ends_with("<dsc type=\"combined\">"));
        assert!(chunks[1].contains("Series 1"));
        assert!(chunks[2].contains("File A"));
        assert_eq!(chunks[3], "</c>");
        assert_eq!(chunks[4], "</c>");
        assert!(chunks[5].contains("Series 2"));
        assert_eq!(chunks[7], "</dsc></archdesc></ead>");
    }

    #[test]
    fn test_stream_is_exhausted_once() {
        let exporter = EadExporter::new();
        let tree = tree();
        let mut stream = exporter.stream(&tree);
        assert!(stream.by_ref().count() > 0);
        assert!(stream.next().is_none());
        assert_eq!(stream.summary().rendered, 3);
    }

    #[test]
    fn test_missing_child_degrades() {
        let mut tree = tree();
        tree.resource.record.children.insert(1, NodeId(99));
        let exporter = EadExporter::new();
        let mut stream = exporter.stream(&tree);
        let xml: String = stream
            .by_ref()
            .map(|c| String::from_utf8(c).unwrap())
            .collect();
        let summary = stream.summary();
        assert_eq!(summary.degraded(), 1);
        assert!(xml.contains("component 99 at depth 1"));
        assert!(xml.contains("Series 2"));
        assert!(xml.ends_with("</dsc></archdesc></ead>"));
    }

    #[test]
    fn test_unpublished_branch_skipped() {
        let mut tree = tree();
        let hidden = tree.resource.record.children[0];
        tree.components.get_mut(&hidden).unwrap().publish = false;
        let exporter = EadExporter::new().with_options(ExportOptions::default());
        let mut stream = exporter.stream(&tree);
        let xml: String = stream
            .by_ref()
            .map(|c| String::from_utf8(c).unwrap())
            .collect();
        assert!(!xml.contains("Series 1"));
        assert!(!xml.contains("File A"));
        assert_eq!(stream.summary().hidden, 1);
        assert_eq!(stream.summary().rendered, 1);
    }
}
