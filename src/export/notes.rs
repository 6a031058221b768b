//! Note serialization.
//!
//! Which element a note becomes and where it is written is decided by
//! [`NoteType`] tables. This module handles the per-type special cases:
//! restriction boilerplate on the collection's access note, the
//! `digitalproc` pointer on processing notes, arrangement notes rendered as
//! `<odd>` inside components, and the parenthesized single-paragraph notes.

use crate::error::Result;
use crate::model::{Note, NoteGroup, NoteItem, NoteType, RecordNode, Subnote};
use crate::restrictions::{
    BOILERPLATE_CONTENTS_LIST, BOILERPLATE_FOIA, BOILERPLATE_INTRO, CATEGORIES_HEADING,
    HEADER_TEXT, RestrictionCategory,
};
use crate::sanitize::ParagraphMode;

use super::writer::{Attrs, EadWriter};
use super::{Context, Level};

/// Notes that belong inside `<did>`.
pub(crate) fn write_did_notes(
    w: &mut EadWriter,
    ctx: &Context<'_>,
    node: &RecordNode,
    level: Level,
) -> Result<()> {
    for note in &node.notes {
        if !ctx.shows(note.publish) || !note.note_type.is_did_note() {
            continue;
        }

        let mut content = note.text(ctx.options.include_unpublished);
        if note.note_type == NoteType::Abstract && level == Level::Child {
            content = format!("({})", content.trim());
        }

        let id = ctx.prefix_id(note.persistent_id.as_deref());
        let id_attrs = Attrs::new().opt("id", id.as_deref());
        let mode = ParagraphMode::wrap_if(note.note_type.include_p());
        let element = note.note_type.element();

        match note.note_type {
            NoteType::Dimensions | NoteType::Physfacet => {
                w.element("physdesc", &Attrs::new().internal_if(!note.publish), |w| {
                    w.mixed_element(element, &id_attrs, &content, mode)
                })?;
            }
            _ => {
                let attrs = id_attrs.internal_if(!note.publish);
                w.mixed_element(element, &attrs, &content, mode)?;
            }
        }
    }
    Ok(())
}

/// Collection-level notes that go in `<descgrp type="admin">`.
pub(crate) fn write_admin_notes(
    w: &mut EadWriter,
    ctx: &Context<'_>,
    node: &RecordNode,
) -> Result<()> {
    write_group(w, ctx, node, NoteGroup::Admin)
}

/// Collection-level notes that go in `<descgrp type="add">`.
pub(crate) fn write_add_notes(w: &mut EadWriter, ctx: &Context<'_>, node: &RecordNode) -> Result<()> {
    write_group(w, ctx, node, NoteGroup::Additional)
}

fn write_group(
    w: &mut EadWriter,
    ctx: &Context<'_>,
    node: &RecordNode,
    group: NoteGroup,
) -> Result<()> {
    for note in &node.notes {
        if !ctx.shows(note.publish) || note.internal || note.note_type.group() != group {
            continue;
        }
        write_note(w, ctx, note, Level::Resource)?;
    }
    Ok(())
}

/// Whether the collection needs a `<descgrp type="add">` section.
pub(crate) fn has_add_section(node: &RecordNode) -> bool {
    node.notes.iter().any(|n| {
        n.note_type.group() == NoteGroup::Additional || n.note_type == NoteType::Index
    })
}

/// Descriptive notes written after `<did>`.
///
/// At collection level the grouped notes are skipped here since they are
/// written in their `<descgrp>` sections.
pub(crate) fn write_nondid_notes(
    w: &mut EadWriter,
    ctx: &Context<'_>,
    node: &RecordNode,
    level: Level,
) -> Result<()> {
    for note in &node.notes {
        if !ctx.shows(note.publish) || note.internal || !note.note_type.is_archdesc_note() {
            continue;
        }
        if level == Level::Resource && note.note_type.group() != NoteGroup::Inline {
            continue;
        }

        if note.note_type == NoteType::Legalstatus {
            w.element("accessrestrict", &Attrs::new().internal_if(!note.publish), |w| {
                write_note(w, ctx, note, level)
            })?;
        } else {
            write_note(w, ctx, note, level)?;
        }
    }
    Ok(())
}

/// One note with its head, body and subnotes.
pub(crate) fn write_note(
    w: &mut EadWriter,
    ctx: &Context<'_>,
    note: &Note,
    level: Level,
) -> Result<()> {
    if !ctx.shows(note.publish) {
        return Ok(());
    }

    let note_type = note.note_type;
    let (content, head) =
        extract_head_text(note.content.as_deref().unwrap_or(""), note.label.as_deref());
    let element = if note_type == NoteType::Arrangement && level == Level::Child {
        "odd"
    } else {
        note_type.element()
    };
    let mode = ParagraphMode::wrap_if(note_type.include_p());

    w.element(element, &Attrs::new().internal_if(!note.publish), |w| {
        if let Some(head) = head.as_deref()
            && !note_type.is_headless()
        {
            w.mixed_element("head", &Attrs::new(), head, ParagraphMode::Strip)?;
        }
        if !content.is_empty() {
            w.mixed(&content, mode)?;
        }
        write_subnotes(w, ctx, note, mode, level)?;

        match note_type {
            NoteType::Accessrestrict if level == Level::Resource => {
                write_restriction_boilerplate(w, ctx)?;
            }
            NoteType::Processinfo => {
                let mentions_pointer = note
                    .subnotes
                    .iter()
                    .filter_map(Subnote::content)
                    .any(|c| c.contains("digitalproc"));
                if !mentions_pointer {
                    w.element("p", &Attrs::new(), |w| {
                        w.empty(
                            "extptr",
                            &Attrs::new()
                                .with("href", "digitalproc")
                                .with("show", "embed")
                                .with("actuate", "onload"),
                        )
                    })?;
                }
            }
            _ => {}
        }
        Ok(())
    })
}

fn write_subnotes(
    w: &mut EadWriter,
    ctx: &Context<'_>,
    note: &Note,
    mode: ParagraphMode,
    level: Level,
) -> Result<()> {
    let sole = note.subnotes.len() == 1;

    for subnote in &note.subnotes {
        if !ctx.shows(subnote.publish()) {
            continue;
        }
        let audience = Attrs::new().internal_if(!subnote.publish());

        match subnote {
            Subnote::Text { content, .. } => {
                let content = if level == Level::Child && sole {
                    enclose_single_paragraph(content, note.note_type)
                } else {
                    content.clone()
                };
                w.mixed(&content, mode)?;
            }
            Subnote::Chronology { title, items, .. } => {
                w.element("chronlist", &audience, |w| {
                    write_list_head(w, title.as_deref())?;
                    for item in items {
                        w.element("chronitem", &Attrs::new(), |w| {
                            if let Some(date) = &item.event_date {
                                w.mixed_element("date", &Attrs::new(), date, ParagraphMode::Strip)?;
                            }
                            if !item.events.is_empty() {
                                w.element("eventgrp", &Attrs::new(), |w| {
                                    for event in &item.events {
                                        w.mixed_element(
                                            "event",
                                            &Attrs::new(),
                                            event,
                                            ParagraphMode::Strip,
                                        )?;
                                    }
                                    Ok(())
                                })?;
                            }
                            Ok(())
                        })?;
                    }
                    Ok(())
                })?;
            }
            Subnote::OrderedList {
                title,
                enumeration,
                items,
                ..
            } => {
                let attrs = Attrs::new()
                    .with("type", "ordered")
                    .opt("numeration", enumeration.as_deref())
                    .internal_if(!subnote.publish());
                w.element("list", &attrs, |w| {
                    write_list_head(w, title.as_deref())?;
                    for item in items {
                        w.mixed_element("item", &Attrs::new(), item, ParagraphMode::Preserve)?;
                    }
                    Ok(())
                })?;
            }
            Subnote::DefinedList { title, items, .. } => {
                let attrs = Attrs::new()
                    .with("type", "deflist")
                    .internal_if(!subnote.publish());
                w.element("list", &attrs, |w| {
                    write_list_head(w, title.as_deref())?;
                    for item in items {
                        w.element("defitem", &Attrs::new(), |w| {
                            if let Some(label) = &item.label {
                                w.mixed_element("label", &Attrs::new(), label, ParagraphMode::Strip)?;
                            }
                            if let Some(value) = &item.value {
                                w.mixed_element("item", &Attrs::new(), value, ParagraphMode::Strip)?;
                            }
                            Ok(())
                        })?;
                    }
                    Ok(())
                })?;
            }
        }
    }
    Ok(())
}

fn write_list_head(w: &mut EadWriter, title: Option<&str>) -> Result<()> {
    match title {
        Some(title) => w.mixed_element("head", &Attrs::new(), title, ParagraphMode::Strip),
        None => Ok(()),
    }
}

/// Component-level miscellaneous notes are parenthesized and access notes
/// bracketed when they are a single paragraph that is not already enclosed.
fn enclose_single_paragraph(content: &str, note_type: NoteType) -> String {
    let (open, close) = match note_type {
        NoteType::Odd => ('(', ')'),
        NoteType::Accessrestrict => ('[', ']'),
        _ => return content.to_string(),
    };
    let trimmed = content.trim();
    let enclosed = trimmed.starts_with(['[', '(']);
    let paragraphs = content.split("\n\n").filter(|b| !b.is_empty()).count();
    if enclosed || paragraphs != 1 {
        return content.to_string();
    }
    format!("{open}{trimmed}{close}")
}

/// University records restriction text for the categories present in the
/// collection.
fn write_restriction_boilerplate(w: &mut EadWriter, ctx: &Context<'_>) -> Result<()> {
    let present = &ctx.options.restriction_types;
    if present.is_empty() {
        return Ok(());
    }

    let none = Attrs::new();
    w.element("p", &none, |w| {
        w.element("blockquote", &none, |w| {
            w.element("p", &none, |w| {
                w.element("emph", &Attrs::new().with("render", "bold"), |w| {
                    w.text(HEADER_TEXT)
                })
            })?;
            w.element("p", &none, |w| w.text(BOILERPLATE_INTRO))?;
            w.element("p", &none, |w| {
                w.text(CATEGORIES_HEADING)?;
                w.element("list", &Attrs::new().with("type", "simple"), |w| {
                    for category in RestrictionCategory::ALL {
                        if present.contains(&category) {
                            w.mixed_element(
                                "item",
                                &none,
                                category.description(),
                                ParagraphMode::Strip,
                            )?;
                        }
                    }
                    Ok(())
                })
            })?;
            w.element("p", &none, |w| w.text(BOILERPLATE_CONTENTS_LIST))?;
            w.element("p", &none, |w| w.text(BOILERPLATE_FOIA))
        })
    })
}

pub(crate) fn write_bibliographies(
    w: &mut EadWriter,
    ctx: &Context<'_>,
    node: &RecordNode,
) -> Result<()> {
    for note in node.notes_of(NoteType::Bibliography) {
        if !ctx.shows(note.publish) {
            continue;
        }
        let content = note.text(ctx.options.include_unpublished);
        let head = note
            .label
            .as_deref()
            .unwrap_or_else(|| ctx.labels.resolve("_note_types", "bibliography"));
        let id = ctx.prefix_id(note.persistent_id.as_deref());
        let attrs = Attrs::new()
            .opt("id", id.as_deref())
            .internal_if(!note.publish);

        w.element("bibliography", &attrs, |w| {
            w.mixed_element("head", &Attrs::new(), head, ParagraphMode::Strip)?;
            w.mixed(&content, ParagraphMode::Wrap)?;
            for item in &note.items {
                if let NoteItem::Reference(reference) = item
                    && !reference.is_empty()
                {
                    w.mixed_element("bibref", &Attrs::new(), reference, ParagraphMode::Strip)?;
                }
            }
            Ok(())
        })?;
    }
    Ok(())
}

/// Index notes. These are written whatever their publish flag, since many
/// legacy indexes were imported unpublished.
pub(crate) fn write_indexes(
    w: &mut EadWriter,
    ctx: &Context<'_>,
    node: &RecordNode,
) -> Result<()> {
    for note in node.notes_of(NoteType::Index) {
        let text = note.text(ctx.options.include_unpublished);
        let (content, head) = extract_head_text(&text, note.label.as_deref());
        let id = ctx.prefix_id(note.persistent_id.as_deref());

        w.element("index", &Attrs::new().opt("id", id.as_deref()), |w| {
            if let Some(head) = head.as_deref() {
                w.mixed_element("head", &Attrs::new(), head, ParagraphMode::Strip)?;
            }
            w.mixed(&content, ParagraphMode::Wrap)?;

            for item in &note.items {
                let NoteItem::IndexEntry(entry) = item else {
                    continue;
                };
                let Some(element) = entry.element() else {
                    continue;
                };
                w.element("indexentry", &Attrs::new(), |w| {
                    if let Some(value) = &entry.value {
                        w.mixed_element(element, &Attrs::new(), value, ParagraphMode::Strip)?;
                    }
                    if let Some(text) = &entry.reference_text {
                        let target = ctx.prefix_id(entry.reference.as_deref());
                        let attrs = Attrs::new().opt("target", target.as_deref());
                        w.element("ref", &attrs, |w| {
                            w.element("list", &Attrs::new().with("type", "simple"), |w| {
                                w.mixed_element("item", &Attrs::new(), text, ParagraphMode::Strip)
                            })
                        })?;
                    }
                    Ok(())
                })?;
            }
            Ok(())
        })?;
    }
    Ok(())
}

/// Pull an embedded `<head>` out of note content.
///
/// Returns the content without the head element and the head text, or the
/// content unchanged and `backup` when there is no head.
pub fn extract_head_text(content: &str, backup: Option<&str>) -> (String, Option<String>) {
    match find_head(content.trim()) {
        Some((element, text)) => (content.replace(element, ""), Some(text.to_string())),
        None => (content.to_string(), backup.map(str::to_string)),
    }
}

/// Locate the first `<head ...>text</head>`; returns the whole element and
/// its text.
fn find_head(content: &str) -> Option<(&str, &str)> {
    let mut search = 0;
    while let Some(found) = content[search..].find("<head") {
        let start = search + found;
        let rest = &content[start + 5..];
        search = start + 5;

        let open_len = match rest.as_bytes().first() {
            Some(b'>') => 1,
            Some(b' ') => match rest.find(['<', '>']) {
                Some(i) if rest.as_bytes()[i] == b'>' => i + 1,
                _ => continue,
            },
            _ => continue,
        };
        let body_start = start + 5 + open_len;
        let Some(body_len) = content[body_start..].find("</head>") else {
            continue;
        };
        if body_len == 0 {
            continue;
        }
        let end = body_start + body_len + "</head>".len();
        return Some((&content[start..end], &content[body_start..body_start + body_len]));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{EadExporter, ExportOptions};
    use crate::model::{ChronItem, IndexItem};

    fn render<F>(options: ExportOptions, f: F) -> String
    where
        F: FnOnce(&mut EadWriter, &Context<'_>) -> Result<()>,
    {
        let exporter = EadExporter::new().with_options(options);
        let ctx = exporter.context();
        let mut w = ctx.writer();
        f(&mut w, &ctx).unwrap();
        String::from_utf8(w.finish()).unwrap()
    }

    fn note_xml(note: &Note, level: Level) -> String {
        render(ExportOptions::default(), |w, ctx| write_note(w, ctx, note, level))
    }

    #[test]
    fn test_head_only_with_label() {
        let plain = Note::new(NoteType::Scopecontent, "About the papers.");
        assert_eq!(
            note_xml(&plain, Level::Child),
            "<scopecontent><p>About the papers.</p></scopecontent>"
        );

        let labeled = plain.clone().with_label("Scope");
        assert_eq!(
            note_xml(&labeled, Level::Child),
            "<scopecontent><head>Scope</head><p>About the papers.</p></scopecontent>"
        );
    }

    #[test]
    fn test_embedded_head_is_extracted() {
        let note = Note::new(NoteType::Bioghist, "<head>Life</head>Born in 1900.");
        assert_eq!(
            note_xml(&note, Level::Child),
            "<bioghist><head>Life</head><p>Born in 1900.</p></bioghist>"
        );
    }

    #[test]
    fn test_extract_head_text() {
        assert_eq!(
            extract_head_text("<head type=\"x\">H</head>Body", None),
            ("Body".to_string(), Some("H".to_string()))
        );
        assert_eq!(
            extract_head_text("<header>no</header>", Some("B")),
            ("<header>no</header>".to_string(), Some("B".to_string()))
        );
        assert_eq!(extract_head_text("<head></head>x", None).1, None);
    }

    #[test]
    fn test_arrangement_in_component_is_odd() {
        let note = Note::new(NoteType::Arrangement, "Alphabetical.");
        assert_eq!(
            note_xml(&note, Level::Child),
            "<odd><p>Alphabetical.</p></odd>"
        );
        assert_eq!(
            note_xml(&note, Level::Resource),
            "<arrangement><p>Alphabetical.</p></arrangement>"
        );
    }

    #[test]
    fn test_processinfo_pointer() {
        let note = Note::new(NoteType::Processinfo, "Processed in 2020.");
        assert_eq!(
            note_xml(&note, Level::Resource),
            "<processinfo><p>Processed in 2020.</p><p><extptr href=\"digitalproc\" show=\"embed\" actuate=\"onload\"/></p></processinfo>"
        );

        let mut with_pointer = note.clone();
        with_pointer.content = None;
        with_pointer
            .subnotes
            .push(Subnote::text("Scans described under digitalproc."));
        assert!(!note_xml(&with_pointer, Level::Resource).contains("extptr"));
    }

    #[test]
    fn test_single_paragraph_enclosed_in_components() {
        let mut odd = Note::new(NoteType::Odd, "");
        odd.content = None;
        let odd = odd.with_subnote(Subnote::text("Oversize"));
        assert_eq!(note_xml(&odd, Level::Child), "<odd><p>(Oversize)</p></odd>");
        assert_eq!(note_xml(&odd, Level::Resource), "<odd><p>Oversize</p></odd>");

        let mut restrict = Note::new(NoteType::Accessrestrict, "");
        restrict.content = None;
        let restrict = restrict.with_subnote(Subnote::text("Closed until 2030"));
        assert_eq!(
            note_xml(&restrict, Level::Child),
            "<accessrestrict><p>[Closed until 2030]</p></accessrestrict>"
        );

        assert_eq!(enclose_single_paragraph("(done)", NoteType::Odd), "(done)");
        assert_eq!(
            enclose_single_paragraph("One\n\nTwo", NoteType::Odd),
            "One\n\nTwo"
        );
    }

    #[test]
    fn test_restriction_boilerplate() {
        let note = Note::new(NoteType::Accessrestrict, "Some files are closed.");
        let options = ExportOptions::default().with_restriction_types([
            RestrictionCategory::Executive,
            RestrictionCategory::Personnel,
        ]);
        let xml = render(options.clone(), |w, ctx| {
            write_note(w, ctx, &note, Level::Resource)
        });
        assert!(xml.contains(HEADER_TEXT));
        let pr = xml.find("Personnel-related files").unwrap();
        let er = xml.find("Executive records").unwrap();
        assert!(pr < er);
        assert!(!xml.contains("Student educational records"));
        assert!(xml.contains("<item><emph render=\"bold\">"));

        let child = render(options, |w, ctx| write_note(w, ctx, &note, Level::Child));
        assert!(!child.contains(HEADER_TEXT));
    }

    #[test]
    fn test_unpublished_note_hidden() {
        let node = RecordNode::new("x")
            .with_note(Note::new(NoteType::Scopecontent, "Secret").unpublished())
            .with_note(Note::new(NoteType::Bioghist, "Public"));
        let xml = render(ExportOptions::default(), |w, ctx| {
            write_nondid_notes(w, ctx, &node, Level::Child)
        });
        assert!(!xml.contains("Secret"));
        assert!(xml.contains("Public"));

        let xml = render(ExportOptions::default().with_unpublished(true), |w, ctx| {
            write_nondid_notes(w, ctx, &node, Level::Child)
        });
        assert!(xml.contains("<scopecontent audience=\"internal\"><p>Secret</p></scopecontent>"));
    }

    #[test]
    fn test_resource_level_skips_grouped_notes() {
        let node = RecordNode::new("x")
            .with_note(Note::new(NoteType::Acqinfo, "Gift"))
            .with_note(Note::new(NoteType::Relatedmaterial, "See also"))
            .with_note(Note::new(NoteType::Bioghist, "Life"));
        let inline = render(ExportOptions::default(), |w, ctx| {
            write_nondid_notes(w, ctx, &node, Level::Resource)
        });
        assert_eq!(inline, "<bioghist><p>Life</p></bioghist>");

        let admin = render(ExportOptions::default(), |w, ctx| write_admin_notes(w, ctx, &node));
        assert_eq!(admin, "<acqinfo><p>Gift</p></acqinfo>");
        assert!(has_add_section(&node));
    }

    #[test]
    fn test_legalstatus_wrapped() {
        let node = RecordNode::new("x").with_note(Note::new(NoteType::Legalstatus, "<p>Public</p>"));
        let xml = render(ExportOptions::default(), |w, ctx| {
            write_nondid_notes(w, ctx, &node, Level::Child)
        });
        assert_eq!(xml, "<accessrestrict><legalstatus>Public</legalstatus></accessrestrict>");
    }

    #[test]
    fn test_did_notes() {
        let mut abstract_note = Note::new(NoteType::Abstract, " Letters. ");
        abstract_note.persistent_id = Some("abc".into());
        let node = RecordNode::new("x")
            .with_note(abstract_note)
            .with_note(Note::new(NoteType::Dimensions, "30 cm"))
            .with_note(Note::new(NoteType::Scopecontent, "not here"));
        let xml = render(ExportOptions::default(), |w, ctx| {
            write_did_notes(w, ctx, &node, Level::Child)
        });
        assert_eq!(
            xml,
            "<abstract id=\"aspace_abc\">(Letters.)</abstract><physdesc><dimensions>30 cm</dimensions></physdesc>"
        );
    }

    #[test]
    fn test_subnote_lists() {
        let mut note = Note::new(NoteType::Odd, "");
        note.content = None;
        let note = note
            .with_subnote(Subnote::Chronology {
                title: Some("Timeline".into()),
                items: vec![ChronItem {
                    event_date: Some("1901".into()),
                    events: vec!["Born".into()],
                }],
                publish: true,
            })
            .with_subnote(Subnote::OrderedList {
                title: None,
                enumeration: Some("arabic".into()),
                items: vec!["<p>kept</p>".into()],
                publish: true,
            });
        assert_eq!(
            note_xml(&note, Level::Child),
            "<odd><chronlist><head>Timeline</head><chronitem><date>1901</date><eventgrp><event>Born</event></eventgrp></chronitem></chronlist>\
             <list type=\"ordered\" numeration=\"arabic\"><item><p>kept</p></item></list></odd>"
        );
    }

    #[test]
    fn test_bibliography_and_index() {
        let mut bib = Note::new(NoteType::Bibliography, "Works about Smith.");
        bib.items.push(NoteItem::Reference("Jones, 1990".into()));
        bib.items.push(NoteItem::Reference(String::new()));

        let mut index = Note::new(NoteType::Index, "Names").unpublished();
        index.items.push(NoteItem::IndexEntry(IndexItem {
            item_type: Some("person".into()),
            value: Some("Smith, John".into()),
            reference: Some("ref42".into()),
            reference_text: Some("Box 1".into()),
        }));

        let node = RecordNode::new("x").with_note(bib).with_note(index);
        let xml = render(ExportOptions::default(), |w, ctx| {
            write_bibliographies(w, ctx, &node)?;
            write_indexes(w, ctx, &node)
        });
        assert_eq!(
            xml,
            "<bibliography><head>Bibliography</head><p>Works about Smith.</p><bibref>Jones, 1990</bibref></bibliography>\
             <index><p>Names</p><indexentry><persname>Smith, John</persname>\
             <ref target=\"aspace_ref42\"><list type=\"simple\"><item>Box 1</item></list></ref></indexentry></index>"
        );
    }
}
