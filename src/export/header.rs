//! `<eadheader>` and `<frontmatter>`.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::Resource;
use crate::sanitize::ParagraphMode;

use super::Context;
use super::writer::{Attrs, EadWriter};

pub(crate) fn write_eadheader(
    w: &mut EadWriter,
    ctx: &Context<'_>,
    resource: &Resource,
) -> Result<()> {
    let attrs = Attrs::new()
        .opt("findaidstatus", resource.finding_aid_status.as_deref())
        .with("repositoryencoding", "iso15511")
        .with("countryencoding", "iso3166-1")
        .with("dateencoding", "iso8601")
        .with("langencoding", "iso639-2b");

    w.element("eadheader", &attrs, |w| {
        let eadid = Attrs::new()
            .opt("countrycode", resource.repository.country.as_deref())
            .opt("url", resource.ead_location.as_deref())
            .opt("mainagencycode", resource.repository.org_code.as_deref());
        w.element("eadid", &eadid, |w| {
            w.text(resource.ead_id.as_deref().unwrap_or(""))
        })?;

        w.element("filedesc", &Attrs::new(), |w| write_filedesc(w, resource))?;
        w.element("profiledesc", &Attrs::new(), |w| {
            write_profiledesc(w, resource, ctx.options.generated_at.unwrap_or_else(Utc::now))
        })?;
        write_revisiondesc(w, resource)
    })
}

fn write_filedesc(w: &mut EadWriter, resource: &Resource) -> Result<()> {
    w.element("titlestmt", &Attrs::new(), |w| {
        if let Some(filing) = &resource.finding_aid_filing_title {
            w.mixed_element(
                "titleproper",
                &Attrs::new().with("type", "filing"),
                filing,
                ParagraphMode::Strip,
            )?;
        }
        w.mixed_element(
            "titleproper",
            &Attrs::new(),
            title_proper(resource),
            ParagraphMode::Strip,
        )?;
        optional(w, "subtitle", resource.finding_aid_subtitle.as_deref())?;
        optional(w, "author", resource.finding_aid_author.as_deref())?;
        optional(w, "sponsor", resource.finding_aid_sponsor.as_deref())
    })?;

    if let Some(edition) = &resource.finding_aid_edition_statement {
        w.mixed_element("editionstmt", &Attrs::new(), edition, ParagraphMode::Wrap)?;
    }

    w.element("publicationstmt", &Attrs::new(), |w| {
        w.mixed_element(
            "publisher",
            &Attrs::new(),
            &resource.repository.name,
            ParagraphMode::Strip,
        )?;
        if let Some(image) = &resource.repository.image_url {
            w.element("p", &Attrs::new().with("id", "logostmt"), |w| {
                w.empty(
                    "extref",
                    &Attrs::new()
                        .with("href", image.as_str())
                        .with("actuate", "onload")
                        .with("show", "embed")
                        .with("type", "simple"),
                )
            })?;
        }
        if let Some(date) = &resource.finding_aid_date {
            w.element("p", &Attrs::new(), |w| {
                w.mixed_element("date", &Attrs::new(), date, ParagraphMode::Strip)
            })?;
        }
        Ok(())
    })?;

    if let Some(series) = &resource.finding_aid_series_statement {
        w.mixed_element("seriesstmt", &Attrs::new(), series, ParagraphMode::Wrap)?;
    }
    if let Some(note) = &resource.finding_aid_note {
        w.element("notestmt", &Attrs::new(), |w| {
            w.mixed_element("note", &Attrs::new(), note, ParagraphMode::Wrap)
        })?;
    }
    Ok(())
}

fn write_profiledesc(
    w: &mut EadWriter,
    resource: &Resource,
    generated_at: DateTime<Utc>,
) -> Result<()> {
    let creation = format!(
        "This finding aid was produced using ArchivesSpace on <date>{}</date>.",
        generated_at.format("%Y-%m-%d %H:%M:%S %z")
    );
    w.mixed_element("creation", &Attrs::new(), &creation, ParagraphMode::Strip)?;

    if let Some(language) = &resource.finding_aid_language {
        w.element("langusage", &Attrs::new(), |w| w.raw(language))?;
    }
    optional(w, "descrules", resource.finding_aid_description_rules.as_deref())
}

fn write_revisiondesc(w: &mut EadWriter, resource: &Resource) -> Result<()> {
    if resource.revision_statements.is_empty() {
        return Ok(());
    }

    w.element("revisiondesc", &Attrs::new(), |w| {
        for revision in &resource.revision_statements {
            match revision.description.as_deref() {
                Some(markup) if markup.trim_start().starts_with('<') => w.raw(markup)?,
                description => {
                    w.element("change", &Attrs::new(), |w| {
                        w.element("date", &Attrs::new(), |w| {
                            w.raw(revision.date.as_deref().unwrap_or(""))
                        })?;
                        match description {
                            Some(item) => w.element("item", &Attrs::new(), |w| w.raw(item)),
                            None => Ok(()),
                        }
                    })?;
                }
            }
        }
        Ok(())
    })
}

pub(crate) fn write_frontmatter(w: &mut EadWriter, resource: &Resource) -> Result<()> {
    w.element("frontmatter", &Attrs::new(), |w| {
        w.element("titlepage", &Attrs::new(), |w| {
            let publisher = format!("{} <lb/>University of Michigan", resource.repository.name);
            w.mixed_element("publisher", &Attrs::new(), &publisher, ParagraphMode::Strip)?;
            w.mixed_element(
                "titleproper",
                &Attrs::new(),
                title_proper(resource),
                ParagraphMode::Strip,
            )?;
            optional(w, "author", resource.finding_aid_author.as_deref())
        })
    })
}

/// The finding-aid title, or the resource title when there is none.
fn title_proper(resource: &Resource) -> &str {
    resource
        .finding_aid_title
        .as_deref()
        .or(resource.record.title.as_deref())
        .unwrap_or("")
}

fn optional(w: &mut EadWriter, name: &str, content: Option<&str>) -> Result<()> {
    match content {
        Some(content) => w.mixed_element(name, &Attrs::new(), content, ParagraphMode::Strip),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{EadExporter, ExportOptions};
    use crate::model::RevisionStatement;
    use chrono::TimeZone;

    fn resource() -> Resource {
        let mut resource = Resource::new("Smith Papers");
        resource.repository.name = "Bentley Historical Library".into();
        resource.repository.country = Some("US".into());
        resource.repository.org_code = Some("MiU-H".into());
        resource.ead_id = Some("umich-bhl-9812".into());
        resource.finding_aid_title = Some("Finding aid for Smith Papers".into());
        resource.finding_aid_language = Some("<language langcode=\"eng\">English</language>".into());
        resource
    }

    fn header_xml(resource: &Resource) -> String {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let exporter =
            EadExporter::new().with_options(ExportOptions::default().with_generated_at(at));
        let ctx = exporter.context();
        let mut w = ctx.writer();
        write_eadheader(&mut w, &ctx, resource).unwrap();
        String::from_utf8(w.finish()).unwrap()
    }

    #[test]
    fn test_eadheader() {
        let xml = header_xml(&resource());
        assert!(xml.starts_with(
            "<eadheader repositoryencoding=\"iso15511\" countryencoding=\"iso3166-1\" dateencoding=\"iso8601\" langencoding=\"iso639-2b\">"
        ));
        assert!(xml.contains("<eadid countrycode=\"US\" mainagencycode=\"MiU-H\">umich-bhl-9812</eadid>"));
        assert!(xml.contains("<titleproper>Finding aid for Smith Papers</titleproper>"));
        assert!(xml.contains(
            "<creation>This finding aid was produced using ArchivesSpace on <date>2024-05-01 12:00:00 +0000</date>.</creation>"
        ));
        assert!(xml.contains("<langusage><language langcode=\"eng\">English</language></langusage>"));
        assert!(!xml.contains("revisiondesc"));
    }

    #[test]
    fn test_revisions() {
        let mut resource = resource();
        resource.revision_statements = vec![
            RevisionStatement {
                date: Some("2020".into()),
                description: Some("Reprocessed".into()),
            },
            RevisionStatement {
                date: None,
                description: Some("<change><date>2021</date><item>Moved</item></change>".into()),
            },
        ];
        let xml = header_xml(&resource);
        assert!(xml.contains(
            "<revisiondesc><change><date>2020</date><item>Reprocessed</item></change><change><date>2021</date><item>Moved</item></change></revisiondesc>"
        ));
    }

    #[test]
    fn test_frontmatter() {
        let mut w = EadWriter::new(5, crate::sanitize::Sanitizer::bhl());
        let mut resource = resource();
        resource.finding_aid_title = None;
        write_frontmatter(&mut w, &resource).unwrap();
        assert_eq!(
            String::from_utf8(w.finish()).unwrap(),
            "<frontmatter><titlepage><publisher>Bentley Historical Library <lb/>University of Michigan</publisher><titleproper>Smith Papers</titleproper></titlepage></frontmatter>"
        );
    }
}
