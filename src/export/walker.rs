//! Per-node rendering for the tree walk.
//!
//! Every visited component produces a [`NodeOutcome`]. A component that
//! fails to serialize is reported as [`NodeOutcome::Degraded`]; its partial
//! output is dropped and the stream writes a diagnostic in its place, so one
//! malformed record never aborts the rest of the finding aid.

use std::error::Error as _;
use std::fmt;

use crate::error::Result;
use crate::model::{Note, NodeId, NoteType, RecordNode, Resource};

use super::controlaccess::write_controlaccess;
use super::did::{write_component_did, write_resource_did};
use super::header::{write_eadheader, write_frontmatter};
use super::notes::{
    has_add_section, write_add_notes, write_admin_notes, write_bibliographies, write_indexes,
    write_nondid_notes, write_note,
};
use super::writer::{Attrs, EadWriter};
use super::{Context, Level};

/// Text every embedded error block starts with.
pub const EXPORT_ERROR_MARKER: &str = "EXPORT ERROR : YOU HAVE A PROBLEM WITH YOUR EXPORT";

const EAD_DOCTYPE: &str = "ead PUBLIC \"+//ISBN 1-931666-00-8//DTD ead.dtd (Encoded Archival Description (EAD) Version 2002)//EN\" \"ead.dtd\"";

/// Where in the tree a failure happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeLocation {
    Resource,
    Component { id: NodeId, depth: u32 },
}

impl fmt::Display for NodeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeLocation::Resource => f.write_str("resource"),
            NodeLocation::Component { id, depth } => {
                write!(f, "component {} at depth {}", id.0, depth)
            }
        }
    }
}

/// Description of a node that could not be serialized.
#[derive(Debug, Clone)]
pub struct ExportDiagnostic {
    pub location: NodeLocation,
    pub message: String,
    /// The error's source chain, outermost first.
    pub trace: Vec<String>,
}

impl ExportDiagnostic {
    pub fn from_error(location: NodeLocation, err: &crate::Error) -> Self {
        let mut trace = vec![location.to_string()];
        let mut source = err.source();
        while let Some(cause) = source {
            trace.push(cause.to_string());
            source = cause.source();
        }
        Self {
            location,
            message: err.to_string(),
            trace,
        }
    }

    /// The block of text written into the document.
    pub fn text(&self) -> String {
        let subject = match self.location {
            NodeLocation::Resource => "YOUR RESOURCE",
            NodeLocation::Component { .. } => "ARCHIVAL OBJECTS",
        };
        format!(
            "{EXPORT_ERROR_MARKER} OF {subject}. THE FOLLOWING INFORMATION MAY HELP:\n\nMESSAGE: {:?}\n\nTRACE: {:?}\n",
            self.message, self.trace
        )
    }
}

impl fmt::Display for ExportDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Markup for one component, split around its children.
#[derive(Debug)]
pub(crate) struct RenderedNode {
    /// Start tag and the component's own content.
    pub open: Vec<u8>,
    pub close: Vec<u8>,
}

/// Result of visiting one component.
#[derive(Debug)]
pub(crate) enum NodeOutcome {
    Rendered(RenderedNode),
    /// Filtered out by the publish or suppressed flags; children not visited.
    Hidden,
    Degraded(ExportDiagnostic),
}

/// Render a component's own content.
///
/// `inherited` is the nearest ancestor's access restriction; it is written
/// when the component has none of its own.
pub(crate) fn visit_component(
    ctx: &Context<'_>,
    id: NodeId,
    node: &RecordNode,
    depth: u32,
    inherited: Option<&Note>,
) -> NodeOutcome {
    if !node.is_visible(ctx.options.include_unpublished) {
        return NodeOutcome::Hidden;
    }
    match render_component(ctx, node, depth, inherited) {
        Ok(rendered) => NodeOutcome::Rendered(rendered),
        Err(err) => NodeOutcome::Degraded(ExportDiagnostic::from_error(
            NodeLocation::Component { id, depth },
            &err,
        )),
    }
}

fn component_tag(ctx: &Context<'_>, depth: u32) -> String {
    if ctx.options.numbered_c_tags {
        format!("c{depth:02}")
    } else {
        "c".to_string()
    }
}

fn render_component(
    ctx: &Context<'_>,
    node: &RecordNode,
    depth: u32,
    inherited: Option<&Note>,
) -> Result<RenderedNode> {
    let tag = component_tag(ctx, depth);
    let id = ctx.prefix_id(node.ref_id.as_deref());
    let attrs = Attrs::new()
        .opt("level", node.level.as_deref())
        .opt("otherlevel", node.other_level.as_deref())
        .opt("id", id.as_deref())
        .internal_if(!node.publish);

    let mut w = ctx.writer();
    w.start(&tag, &attrs)?;
    write_component_did(&mut w, ctx, node)?;
    write_nondid_notes(&mut w, ctx, node, Level::Child)?;
    if let Some(restriction) = inherited
        && own_restriction(node).is_none()
    {
        write_note(&mut w, ctx, restriction, Level::Child)?;
    }
    write_bibliographies(&mut w, ctx, node)?;
    write_indexes(&mut w, ctx, node)?;

    let mut close = ctx.writer();
    close.end(&tag)?;
    Ok(RenderedNode {
        open: w.finish(),
        close: close.finish(),
    })
}

/// The access restriction a node passes down to its descendants.
pub(crate) fn own_restriction(node: &RecordNode) -> Option<&Note> {
    node.notes_of(NoteType::Accessrestrict).next()
}

/// Everything up to and including `<dsc type="combined">`.
pub(crate) fn render_prologue(ctx: &Context<'_>, resource: &Resource) -> Result<Vec<u8>> {
    let record = &resource.record;
    let mut w = ctx.writer();
    open_document(&mut w, resource)?;
    write_eadheader(&mut w, ctx, resource)?;
    write_frontmatter(&mut w, resource)?;

    let attrs = Attrs::new()
        .opt("level", record.level.as_deref())
        .opt("otherlevel", record.other_level.as_deref());
    w.start("archdesc", &attrs)?;
    write_resource_did(&mut w, ctx, resource)?;
    w.element("descgrp", &Attrs::new().with("type", "admin"), |w| {
        write_admin_notes(w, ctx, record)
    })?;
    write_nondid_notes(&mut w, ctx, record, Level::Resource)?;
    write_bibliographies(&mut w, ctx, record)?;
    write_controlaccess(&mut w, ctx.controlaccess, resource)?;
    w.start("dsc", &Attrs::new().with("type", "combined"))?;
    Ok(w.finish())
}

/// A complete document holding only the diagnostic, used when the
/// collection itself cannot be serialized.
pub(crate) fn render_failed_document(
    ctx: &Context<'_>,
    resource: &Resource,
    diagnostic: &ExportDiagnostic,
) -> Result<Vec<u8>> {
    let mut w = ctx.writer();
    open_document(&mut w, resource)?;
    w.text(&diagnostic.text())?;
    w.end("ead")?;
    Ok(w.finish())
}

fn open_document(w: &mut EadWriter, resource: &Resource) -> Result<()> {
    w.declaration()?;
    w.doctype(EAD_DOCTYPE)?;
    w.start("ead", &Attrs::new().internal_if(!resource.record.publish))
}

/// `</dsc>`, the additional-material group and the closing tags.
pub(crate) fn render_epilogue(ctx: &Context<'_>, resource: &Resource) -> Result<Vec<u8>> {
    let record = &resource.record;
    let mut w = ctx.writer();
    w.end("dsc")?;
    if has_add_section(record) {
        w.element("descgrp", &Attrs::new().with("type", "add"), |w| {
            write_add_notes(w, ctx, record)?;
            write_indexes(w, ctx, record)
        })?;
    }
    w.end("archdesc")?;
    w.end("ead")?;
    Ok(w.finish())
}

/// Closing tags after a failed epilogue, with the diagnostic between them.
pub(crate) fn render_failed_epilogue(
    ctx: &Context<'_>,
    diagnostic: &ExportDiagnostic,
) -> Result<Vec<u8>> {
    let mut w = ctx.writer();
    w.end("dsc")?;
    w.text(&diagnostic.text())?;
    w.end("archdesc")?;
    w.end("ead")?;
    Ok(w.finish())
}

/// Diagnostic text in place of a component.
pub(crate) fn render_diagnostic(ctx: &Context<'_>, diagnostic: &ExportDiagnostic) -> Result<Vec<u8>> {
    let mut w = ctx.writer();
    w.text(&diagnostic.text())?;
    Ok(w.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::export::{EadExporter, ExportOptions};
    use crate::model::{Instance, InstanceLink, SubContainer};

    fn visit(options: ExportOptions, node: &RecordNode, inherited: Option<&Note>) -> NodeOutcome {
        let exporter = EadExporter::new().with_options(options);
        let ctx = exporter.context();
        visit_component(&ctx, NodeId(1), node, 2, inherited)
    }

    fn rendered(outcome: NodeOutcome) -> (String, String) {
        match outcome {
            NodeOutcome::Rendered(node) => (
                String::from_utf8(node.open).unwrap(),
                String::from_utf8(node.close).unwrap(),
            ),
            other => panic!("expected rendered node, got {other:?}"),
        }
    }

    #[test]
    fn test_component_tags() {
        let mut node = RecordNode::new("Folder").with_level("file");
        node.ref_id = Some("abc".into());
        let (open, close) = rendered(visit(ExportOptions::default(), &node, None));
        assert!(open.starts_with("<c level=\"file\" id=\"aspace_abc\"><did><unittitle>Folder</unittitle></did>"));
        assert_eq!(close, "</c>");

        let numbered = ExportOptions::default().with_numbered_c_tags(true);
        let (open, close) = rendered(visit(numbered, &node, None));
        assert!(open.starts_with("<c02 "));
        assert_eq!(close, "</c02>");
    }

    #[test]
    fn test_hidden() {
        let mut node = RecordNode::new("Draft");
        node.publish = false;
        assert!(matches!(visit(ExportOptions::default(), &node, None), NodeOutcome::Hidden));

        let (open, _) = rendered(visit(ExportOptions::default().with_unpublished(true), &node, None));
        assert!(open.starts_with("<c audience=\"internal\">"));

        node.suppressed = true;
        assert!(matches!(
            visit(ExportOptions::default().with_unpublished(true), &node, None),
            NodeOutcome::Hidden
        ));
    }

    #[test]
    fn test_inherited_restriction() {
        let inherited = Note::new(NoteType::Accessrestrict, "Closed until 2050.");
        let (open, _) = rendered(visit(
            ExportOptions::default(),
            &RecordNode::new("Folder"),
            Some(&inherited),
        ));
        assert!(open.contains("<accessrestrict><p>Closed until 2050.</p></accessrestrict>"));

        let own = RecordNode::new("Folder")
            .with_note(Note::new(NoteType::Accessrestrict, "Open."));
        let (open, _) = rendered(visit(ExportOptions::default(), &own, Some(&inherited)));
        assert!(open.contains("Open."));
        assert!(!open.contains("2050"));
    }

    #[test]
    fn test_degraded() {
        let node = RecordNode::new("Broken").with_instance(Instance {
            instance_type: "text".into(),
            link: InstanceLink::SubContainer(SubContainer::default()),
        });
        match visit(ExportOptions::default(), &node, None) {
            NodeOutcome::Degraded(diagnostic) => {
                assert_eq!(
                    diagnostic.location,
                    NodeLocation::Component { id: NodeId(1), depth: 2 }
                );
                let text = diagnostic.text();
                assert!(text.starts_with(EXPORT_ERROR_MARKER));
                assert!(text.contains("ARCHIVAL OBJECTS"));
                assert!(text.contains("no top container"));
            }
            other => panic!("expected degraded node, got {other:?}"),
        }
    }

    #[test]
    fn test_diagnostic_trace_includes_location() {
        let err = Error::InvalidRecord("bad".into());
        let diagnostic = ExportDiagnostic::from_error(NodeLocation::Resource, &err);
        assert_eq!(diagnostic.trace, vec!["resource".to_string()]);
        assert!(diagnostic.text().contains("YOUR RESOURCE"));
    }
}
