//! The top-level resource and its finding-aid metadata.

use serde::{Deserialize, Serialize};

use super::note::{Note, NoteType};
use super::record::RecordNode;

/// The collection being described.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub id: u64,
    #[serde(flatten)]
    pub record: RecordNode,
    #[serde(default)]
    pub id_0: Option<String>,
    #[serde(default)]
    pub id_1: Option<String>,
    #[serde(default)]
    pub id_2: Option<String>,
    #[serde(default)]
    pub id_3: Option<String>,
    #[serde(default)]
    pub repository: Repository,
    #[serde(default)]
    pub ead_id: Option<String>,
    #[serde(default)]
    pub ead_location: Option<String>,
    #[serde(default)]
    pub finding_aid_title: Option<String>,
    #[serde(default)]
    pub finding_aid_filing_title: Option<String>,
    #[serde(default)]
    pub finding_aid_subtitle: Option<String>,
    #[serde(default)]
    pub finding_aid_author: Option<String>,
    #[serde(default)]
    pub finding_aid_sponsor: Option<String>,
    #[serde(default)]
    pub finding_aid_edition_statement: Option<String>,
    #[serde(default)]
    pub finding_aid_series_statement: Option<String>,
    #[serde(default)]
    pub finding_aid_note: Option<String>,
    #[serde(default)]
    pub finding_aid_date: Option<String>,
    #[serde(default)]
    pub finding_aid_status: Option<String>,
    #[serde(default)]
    pub finding_aid_language: Option<String>,
    #[serde(default)]
    pub finding_aid_description_rules: Option<String>,
    #[serde(default)]
    pub revision_statements: Vec<RevisionStatement>,
    /// Subject headings for `<controlaccess>`.
    #[serde(default)]
    pub subjects: Vec<AccessTerm>,
    /// Agent headings (subject-role agents) for `<controlaccess>`.
    #[serde(default)]
    pub agent_terms: Vec<AccessTerm>,
}

impl Resource {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            record: RecordNode::new(title),
            ..Default::default()
        }
    }

    /// Identifier parts joined with `.`, e.g. `851234 Aa 2`.
    pub fn call_number(&self) -> String {
        [&self.id_0, &self.id_1, &self.id_2, &self.id_3]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Bibliography notes, which are written in their own section.
    pub fn bibliographies(&self) -> impl Iterator<Item = &Note> {
        self.record.notes_of(NoteType::Bibliography)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub org_code: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevisionStatement {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A controlled-access heading, already flattened to display text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTerm {
    /// Element to write: `subject`, `geogname`, `persname`, `corpname`, ...
    pub element: String,
    pub content: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub rules: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub authfilenumber: Option<String>,
}

impl AccessTerm {
    pub fn new(element: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            content: content.into(),
            source: None,
            rules: None,
            role: None,
            authfilenumber: None,
        }
    }
}
