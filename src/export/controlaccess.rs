//! Controlled-access headings.

use crate::error::{Error, Result};
use crate::model::{AccessTerm, AgentLink, Resource};
use crate::sanitize::ParagraphMode;

use super::writer::{Attrs, EadWriter};

/// Elements allowed inside `<controlaccess>`.
const TERM_ELEMENTS: &[&str] = &[
    "corpname",
    "famname",
    "function",
    "genreform",
    "geogname",
    "name",
    "occupation",
    "persname",
    "subject",
    "title",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    Subject,
    Agent,
}

/// Formatting policy for the `<controlaccess>` section.
pub trait ControlAccessFormatter: Send + Sync {
    /// `href` of an `<extptr>` written before the headings.
    fn pointer(&self) -> Option<&str> {
        None
    }

    /// Display text for one heading.
    fn heading(&self, content: &str, kind: TermKind) -> String {
        match kind {
            TermKind::Subject => terminate(content.trim()),
            TermKind::Agent => terminate(&join_agent_pieces(content.trim())),
        }
    }
}

/// Headings preceded by the `accnote` pointer.
#[derive(Debug, Clone, Copy, Default)]
pub struct BhlControlAccess;

impl ControlAccessFormatter for BhlControlAccess {
    fn pointer(&self) -> Option<&str> {
        Some("accnote")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainControlAccess;

impl ControlAccessFormatter for PlainControlAccess {}

/// Append a period unless the heading already ends in `.`, `)` or `-`.
fn terminate(content: &str) -> String {
    if content.ends_with(['.', ')', '-']) {
        content.to_string()
    } else {
        format!("{content}.")
    }
}

/// Drop the trailing period of every ` -- ` piece except the last.
fn join_agent_pieces(content: &str) -> String {
    if !content.contains(" -- ") {
        return content.to_string();
    }
    let pieces: Vec<&str> = content.split(" -- ").collect();
    let last = pieces.len() - 1;
    pieces
        .into_iter()
        .enumerate()
        .map(|(i, piece)| {
            if i < last {
                piece.strip_suffix('.').unwrap_or(piece)
            } else {
                piece
            }
        })
        .collect::<Vec<_>>()
        .join(" -- ")
}

pub(crate) fn write_controlaccess(
    w: &mut EadWriter,
    formatter: &dyn ControlAccessFormatter,
    resource: &Resource,
) -> Result<()> {
    let linked: Vec<AccessTerm> = resource
        .record
        .subject_agents()
        .filter_map(agent_term)
        .collect();
    if resource.subjects.is_empty() && resource.agent_terms.is_empty() && linked.is_empty() {
        return Ok(());
    }

    w.element("controlaccess", &Attrs::new(), |w| {
        if let Some(href) = formatter.pointer() {
            w.element("p", &Attrs::new(), |w| {
                w.empty(
                    "extptr",
                    &Attrs::new()
                        .with("href", href)
                        .with("show", "embed")
                        .with("actuate", "onload"),
                )
            })?;
        }
        for term in &resource.subjects {
            write_term(w, formatter, term, TermKind::Subject)?;
        }
        for term in resource.agent_terms.iter().chain(&linked) {
            write_term(w, formatter, term, TermKind::Agent)?;
        }
        Ok(())
    })
}

/// Heading for a subject-role agent, named by its display name.
fn agent_term(link: &AgentLink) -> Option<AccessTerm> {
    let name = &link.agent.display_name;
    let Some(element) = link.agent.agent_type.name_element() else {
        tracing::warn!(
            agent = %name.sort_name,
            "skipping {:?} subject agent in controlaccess",
            link.agent.agent_type
        );
        return None;
    };
    Some(AccessTerm {
        source: name.source.clone(),
        rules: name.rules.clone(),
        role: link.relator.clone(),
        authfilenumber: name.authority_id.clone(),
        ..AccessTerm::new(element, name.sort_name.as_str())
    })
}

fn write_term(
    w: &mut EadWriter,
    formatter: &dyn ControlAccessFormatter,
    term: &AccessTerm,
    kind: TermKind,
) -> Result<()> {
    let element = TERM_ELEMENTS
        .iter()
        .find(|e| **e == term.element)
        .ok_or_else(|| {
            Error::InvalidRecord(format!("unknown controlaccess element '{}'", term.element))
        })?;
    let attrs = Attrs::new()
        .opt("source", term.source.as_deref())
        .opt("rules", term.rules.as_deref())
        .opt("role", term.role.as_deref())
        .opt("authfilenumber", term.authfilenumber.as_deref());
    let heading = formatter.heading(&term.content, kind);
    w.mixed_element(element, &attrs, &heading, ParagraphMode::Strip)
}
