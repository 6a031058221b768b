//! Extent statements.

use crate::error::Result;
use crate::labels::LabelTable;
use crate::model::Extent;
use crate::sanitize::ParagraphMode;

use super::Context;
use super::writer::{Attrs, EadWriter};

/// Which part of the tree the extents belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Resource,
    Component,
}

/// Turns a node's extents into physical-description statements.
///
/// Each returned string becomes one `<physdesc><extent>` block.
pub trait ExtentFormatter: Send + Sync {
    fn statements(
        &self,
        extents: &[Extent],
        scope: Scope,
        include_unpublished: bool,
        labels: &LabelTable,
    ) -> Vec<String>;
}

/// One block per extent at resource level, a single comma-joined block for
/// components. Unit names are written as stored.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitExtents;

impl ExtentFormatter for SplitExtents {
    fn statements(
        &self,
        extents: &[Extent],
        scope: Scope,
        include_unpublished: bool,
        _labels: &LabelTable,
    ) -> Vec<String> {
        let statements: Vec<String> = visible(extents, include_unpublished)
            .map(|e| extent_statement(e, singularize_for(e)))
            .collect();
        match scope {
            Scope::Resource => statements,
            Scope::Component => join_nonempty(statements),
        }
    }
}

/// A single comma-joined block at every level, with unit names resolved
/// through the label table.
#[derive(Debug, Clone, Copy, Default)]
pub struct CombinedExtents;

impl ExtentFormatter for CombinedExtents {
    fn statements(
        &self,
        extents: &[Extent],
        _scope: Scope,
        include_unpublished: bool,
        labels: &LabelTable,
    ) -> Vec<String> {
        join_nonempty(
            visible(extents, include_unpublished)
                .map(|e| extent_statement(e, labels.resolve("extent_extent_type", singularize_for(e))))
                .collect(),
        )
    }
}

fn visible(extents: &[Extent], include_unpublished: bool) -> impl Iterator<Item = &Extent> {
    extents
        .iter()
        .filter(move |e| e.publish || include_unpublished)
}

fn join_nonempty(statements: Vec<String>) -> Vec<String> {
    if statements.is_empty() {
        statements
    } else {
        vec![statements.join(", ")]
    }
}

fn singularize_for(extent: &Extent) -> &str {
    if extent.value() == 1.0 {
        singularize_extent(&extent.extent_type)
    } else {
        &extent.extent_type
    }
}

/// Singular form of a plural unit name. Unknown units are returned as is.
pub fn singularize_extent(unit: &str) -> &str {
    match unit {
        "linear feet" => "linear foot",
        "oversize folders" => "oversize folder",
        "oversize volumes" => "oversize volume",
        "volumes" => "volume",
        "folders" => "folder",
        "videotapes" => "videotape",
        "audiotapes" => "audiotape",
        "boxes" => "box",
        other => other,
    }
}

/// `<number> <unit>` followed by the details in parentheses.
fn extent_statement(extent: &Extent, unit: &str) -> String {
    let mut statement = format!("{} {}", extent.number, unit);
    let details = extent.details();
    if !details.is_empty() {
        statement.push_str(" (");
        statement.push_str(&details.join("; "));
        statement.push(')');
    }
    statement
}

pub(crate) fn write_extents(
    w: &mut EadWriter,
    ctx: &Context<'_>,
    extents: &[Extent],
    scope: Scope,
) -> Result<()> {
    let statements = ctx.extents.statements(
        extents,
        scope,
        ctx.options.include_unpublished,
        ctx.labels,
    );
    for statement in statements {
        w.element("physdesc", &Attrs::new(), |w| {
            w.element("extent", &Attrs::new(), |w| {
                w.mixed(&statement, ParagraphMode::Strip)
            })
        })?;
    }
    Ok(())
}
