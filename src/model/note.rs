//! Notes and the fixed note-type vocabulary.
//!
//! Every note type maps to exactly one output element and one grouping.
//! Both are table lookups on [`NoteType`]; nothing is derived from strings at
//! serialization time.

use serde::{Deserialize, Serialize};

/// Note types known to the host's EAD vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    Abstract,
    Accessrestrict,
    Accruals,
    Acqinfo,
    Altformavail,
    Appraisal,
    Arrangement,
    Bibliography,
    Bioghist,
    Custodhist,
    Dimensions,
    Fileplan,
    Index,
    Langmaterial,
    Legalstatus,
    Materialspec,
    Odd,
    Originalsloc,
    Otherfindaid,
    Physdesc,
    Physfacet,
    Physloc,
    Phystech,
    Prefercite,
    Processinfo,
    Relatedmaterial,
    Scopecontent,
    Separatedmaterial,
    Userestrict,
}

/// Where a note lands in the finding aid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteGroup {
    /// `<descgrp type="admin">` at resource level.
    Admin,
    /// `<descgrp type="add">` at resource level.
    Additional,
    /// Written with the rest of the description.
    Inline,
}

impl NoteType {
    /// Element name for this note type.
    pub fn element(self) -> &'static str {
        match self {
            NoteType::Abstract => "abstract",
            NoteType::Accessrestrict => "accessrestrict",
            NoteType::Accruals => "accruals",
            NoteType::Acqinfo => "acqinfo",
            NoteType::Altformavail => "altformavail",
            NoteType::Appraisal => "appraisal",
            NoteType::Arrangement => "arrangement",
            NoteType::Bibliography => "bibliography",
            NoteType::Bioghist => "bioghist",
            NoteType::Custodhist => "custodhist",
            NoteType::Dimensions => "dimensions",
            NoteType::Fileplan => "fileplan",
            NoteType::Index => "index",
            NoteType::Langmaterial => "langmaterial",
            NoteType::Legalstatus => "legalstatus",
            NoteType::Materialspec => "materialspec",
            NoteType::Odd => "odd",
            NoteType::Originalsloc => "originalsloc",
            NoteType::Otherfindaid => "otherfindaid",
            NoteType::Physdesc => "physdesc",
            NoteType::Physfacet => "physfacet",
            NoteType::Physloc => "physloc",
            NoteType::Phystech => "phystech",
            NoteType::Prefercite => "prefercite",
            NoteType::Processinfo => "processinfo",
            NoteType::Relatedmaterial => "relatedmaterial",
            NoteType::Scopecontent => "scopecontent",
            NoteType::Separatedmaterial => "separatedmaterial",
            NoteType::Userestrict => "userestrict",
        }
    }

    /// Grouping used at resource level.
    pub fn group(self) -> NoteGroup {
        match self {
            NoteType::Accessrestrict
            | NoteType::Userestrict
            | NoteType::Prefercite
            | NoteType::Acqinfo
            | NoteType::Custodhist
            | NoteType::Processinfo
            | NoteType::Appraisal
            | NoteType::Accruals
            | NoteType::Altformavail => NoteGroup::Admin,
            NoteType::Relatedmaterial
            | NoteType::Separatedmaterial
            | NoteType::Otherfindaid
            | NoteType::Originalsloc => NoteGroup::Additional,
            _ => NoteGroup::Inline,
        }
    }

    /// Notes written inside `<did>`.
    pub fn is_did_note(self) -> bool {
        matches!(
            self,
            NoteType::Abstract
                | NoteType::Dimensions
                | NoteType::Physdesc
                | NoteType::Langmaterial
                | NoteType::Physloc
                | NoteType::Materialspec
                | NoteType::Physfacet
        )
    }

    /// Notes written after `<did>` as part of the description.
    pub fn is_archdesc_note(self) -> bool {
        !self.is_did_note() && !matches!(self, NoteType::Bibliography | NoteType::Index)
    }

    /// Whether free text in this note should be split into paragraphs.
    pub fn include_p(self) -> bool {
        !self.is_did_note() && self != NoteType::Legalstatus
    }

    /// Notes that never get a `<head>`.
    pub fn is_headless(self) -> bool {
        matches!(self, NoteType::Langmaterial | NoteType::Legalstatus) || self.is_did_note()
    }
}

/// A typed free-text annotation on a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "type")]
    pub note_type: NoteType,
    /// Markup-bearing body text.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub subnotes: Vec<Subnote>,
    /// Bibliography references or index entries.
    #[serde(default)]
    pub items: Vec<NoteItem>,
    #[serde(default = "default_true")]
    pub publish: bool,
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub persistent_id: Option<String>,
}

impl Note {
    pub fn new(note_type: NoteType, content: impl Into<String>) -> Self {
        Self {
            note_type,
            content: Some(content.into()),
            label: None,
            subnotes: Vec::new(),
            items: Vec::new(),
            publish: true,
            internal: false,
            persistent_id: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_subnote(mut self, subnote: Subnote) -> Self {
        self.subnotes.push(subnote);
        self
    }

    pub fn unpublished(mut self) -> Self {
        self.publish = false;
        self
    }

    /// All text content of the note: the body followed by every visible text
    /// subnote, separated by blank lines.
    pub fn text(&self, include_unpublished: bool) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(content) = self.content.as_deref() {
            parts.push(content);
        }
        for sn in &self.subnotes {
            if let Subnote::Text { content, publish } = sn
                && (*publish || include_unpublished)
            {
                parts.push(content);
            }
        }
        parts.join("\n\n")
    }
}

/// Structured body parts of a multipart note.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "jsonmodel_type", rename_all = "snake_case")]
pub enum Subnote {
    #[serde(rename = "note_text")]
    Text {
        content: String,
        #[serde(default = "default_true")]
        publish: bool,
    },
    #[serde(rename = "note_chronology")]
    Chronology {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        items: Vec<ChronItem>,
        #[serde(default = "default_true")]
        publish: bool,
    },
    #[serde(rename = "note_orderedlist")]
    OrderedList {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        enumeration: Option<String>,
        #[serde(default)]
        items: Vec<String>,
        #[serde(default = "default_true")]
        publish: bool,
    },
    #[serde(rename = "note_definedlist")]
    DefinedList {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        items: Vec<DefItem>,
        #[serde(default = "default_true")]
        publish: bool,
    },
}

impl Subnote {
    pub fn text(content: impl Into<String>) -> Self {
        Subnote::Text {
            content: content.into(),
            publish: true,
        }
    }

    pub fn publish(&self) -> bool {
        match self {
            Subnote::Text { publish, .. }
            | Subnote::Chronology { publish, .. }
            | Subnote::OrderedList { publish, .. }
            | Subnote::DefinedList { publish, .. } => *publish,
        }
    }

    /// Text body, for subnotes that have one.
    pub fn content(&self) -> Option<&str> {
        match self {
            Subnote::Text { content, .. } => Some(content),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChronItem {
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub events: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefItem {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

/// An entry of a bibliography (plain reference) or index (typed term).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NoteItem {
    Reference(String),
    IndexEntry(IndexItem),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexItem {
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub reference_text: Option<String>,
}

impl IndexItem {
    /// Element used for the index term, if the item type is known.
    pub fn element(&self) -> Option<&'static str> {
        let element = match self.item_type.as_deref()? {
            "name" => "name",
            "person" => "persname",
            "family" => "famname",
            "corporate_entity" => "corpname",
            "subject" => "subject",
            "function" => "function",
            "occupation" => "occupation",
            "genre_form" => "genreform",
            "title" => "title",
            "geographic_name" => "geogname",
            _ => return None,
        };
        Some(element)
    }
}

pub(crate) fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_table() {
        assert_eq!(NoteType::Accessrestrict.group(), NoteGroup::Admin);
        assert_eq!(NoteType::Processinfo.group(), NoteGroup::Admin);
        assert_eq!(NoteType::Relatedmaterial.group(), NoteGroup::Additional);
        assert_eq!(NoteType::Scopecontent.group(), NoteGroup::Inline);
        assert_eq!(NoteType::Abstract.group(), NoteGroup::Inline);
    }

    #[test]
    fn test_did_and_archdesc_are_disjoint() {
        for t in [
            NoteType::Abstract,
            NoteType::Dimensions,
            NoteType::Physloc,
            NoteType::Bioghist,
            NoteType::Odd,
            NoteType::Index,
        ] {
            assert!(!(t.is_did_note() && t.is_archdesc_note()), "{t:?}");
        }
        assert!(!NoteType::Bibliography.is_archdesc_note());
    }

    #[test]
    fn test_deserialize_multipart_note() {
        let json = r#"{
            "type": "accessrestrict",
            "persistent_id": "abc123",
            "subnotes": [
                {"jsonmodel_type": "note_text", "content": "Closed until 2030."},
                {"jsonmodel_type": "note_orderedlist", "enumeration": "arabic", "items": ["one", "two"]}
            ]
        }"#;
        let note: Note = serde_json::from_str(json).unwrap();
        assert_eq!(note.note_type, NoteType::Accessrestrict);
        assert!(note.publish);
        assert_eq!(note.subnotes.len(), 2);
        assert_eq!(note.text(false), "Closed until 2030.");
    }

    #[test]
    fn test_note_text_skips_unpublished_subnotes() {
        let note = Note::new(NoteType::Odd, "Body").with_subnote(Subnote::Text {
            content: "Hidden".into(),
            publish: false,
        });
        assert_eq!(note.text(false), "Body");
        assert_eq!(note.text(true), "Body\n\nHidden");
    }

    #[test]
    fn test_index_item_elements() {
        let item = IndexItem {
            item_type: Some("corporate_entity".into()),
            ..Default::default()
        };
        assert_eq!(item.element(), Some("corpname"));
        let unknown = IndexItem {
            item_type: Some("spaceship".into()),
            ..Default::default()
        };
        assert_eq!(unknown.element(), None);
    }
}
