//! The `<did>` block: identification, origination, dates, containers and
//! digital objects.

use crate::error::{Error, Result};
use crate::model::{
    AgentRole, Date, DigitalObject, InstanceLink, RecordNode, Resource, SubContainer,
};
use crate::sanitize::ParagraphMode;

use super::extents::{Scope, write_extents};
use super::notes::write_did_notes;
use super::writer::{Attrs, EadWriter};
use super::{Context, Level};

pub(crate) fn write_resource_did(
    w: &mut EadWriter,
    ctx: &Context<'_>,
    resource: &Resource,
) -> Result<()> {
    let record = &resource.record;
    w.element("did", &Attrs::new(), |w| {
        if !resource.repository.name.is_empty() {
            w.element("repository", &Attrs::new(), |w| {
                w.mixed_element(
                    "corpname",
                    &Attrs::new(),
                    &resource.repository.name,
                    ParagraphMode::Strip,
                )?;
                w.empty(
                    "extptr",
                    &Attrs::new()
                        .with("href", "bhladd")
                        .with("show", "embed")
                        .with("actuate", "onload"),
                )
            })?;
        }
        if let Some(title) = &record.title {
            w.mixed_element("unittitle", &Attrs::new(), title, ParagraphMode::Strip)?;
        }
        write_origination(w, record)?;
        w.element("unitid", &Attrs::new().with("type", "call number"), |w| {
            w.text(&resource.call_number())
        })?;
        write_extents(w, ctx, &record.extents, Scope::Resource)?;
        write_dates(w, ctx, &record.dates)?;
        write_did_notes(w, ctx, record, Level::Resource)
    })
}

pub(crate) fn write_component_did(
    w: &mut EadWriter,
    ctx: &Context<'_>,
    node: &RecordNode,
) -> Result<()> {
    w.element("did", &Attrs::new(), |w| {
        if let Some(title) = &node.title {
            w.mixed_element("unittitle", &Attrs::new(), title, ParagraphMode::Strip)?;
        }
        if let Some(id) = node.component_id.as_deref().filter(|id| !id.is_empty()) {
            w.element("unitid", &Attrs::new(), |w| w.text(&format!("[{id}]")))?;
        }
        write_origination(w, node)?;
        write_extents(w, ctx, &node.extents, Scope::Component)?;
        write_dates(w, ctx, &node.dates)?;
        write_did_notes(w, ctx, node, Level::Child)?;

        let mut has_physical = false;
        let mut has_digital = false;
        for instance in &node.instances {
            match &instance.link {
                InstanceLink::SubContainer(sub) => {
                    has_physical = true;
                    write_container(w, ctx, &instance.instance_type, sub)?;
                }
                InstanceLink::DigitalObject(dao) if ctx.options.include_daos => {
                    has_digital |= write_digital_object(w, ctx, dao)?;
                }
                InstanceLink::DigitalObject(_) => {}
            }
        }

        if has_digital && !has_physical {
            w.element("physloc", &Attrs::new(), |w| w.text("Online"))?;
        }
        Ok(())
    })
}

/// `<origination>` for each creator or source agent.
fn write_origination(w: &mut EadWriter, node: &RecordNode) -> Result<()> {
    for link in node.creators_and_sources() {
        let name = &link.agent.display_name;
        let element = link.agent.agent_type.name_element().ok_or_else(|| {
            Error::InvalidRecord(format!(
                "agent '{}' of type {:?} cannot be an originator",
                name.sort_name, link.agent.agent_type
            ))
        })?;
        let label = match link.role {
            AgentRole::Creator => "creator",
            AgentRole::Source => "source",
            AgentRole::Subject => "subject",
        };
        let attrs = Attrs::new()
            .opt("role", link.relator.as_deref())
            .opt("source", name.source.as_deref())
            .opt("rules", name.rules.as_deref())
            .opt("authfilenumber", name.authority_id.as_deref());

        w.element("origination", &Attrs::new().with("label", label), |w| {
            w.mixed_element(element, &attrs, &name.sort_name, ParagraphMode::Strip)
        })?;
    }
    Ok(())
}

fn write_dates(w: &mut EadWriter, ctx: &Context<'_>, dates: &[Date]) -> Result<()> {
    for date in dates.iter().filter(|d| ctx.shows(d.publish)) {
        let Some(content) = date.display() else {
            tracing::debug!(?date, "skipping date without expression or begin");
            continue;
        };
        let normal = date.normal();
        let attrs = Attrs::new()
            .opt("type", date.unitdate_type())
            .opt("normal", normal.as_deref())
            .opt("certainty", date.certainty.as_deref())
            .opt("era", date.era.as_deref())
            .opt("calendar", date.calendar.as_deref())
            .internal_if(!date.publish);
        w.mixed_element("unitdate", &attrs, &content, ParagraphMode::Strip)?;
    }
    Ok(())
}

/// Normalized `type` attribute for a container type.
///
/// Returns the token and whether the raw string was a special marker.
fn container_token(raw: &str) -> (String, bool) {
    if raw.contains("Roll") {
        ("reel".to_string(), true)
    } else if raw.contains("Con.") || raw.contains("No.") {
        ("othertype".to_string(), true)
    } else {
        (raw.to_lowercase(), false)
    }
}

/// First character upper case, the rest lower case.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn write_container(
    w: &mut EadWriter,
    ctx: &Context<'_>,
    instance_type: &str,
    sub: &SubContainer,
) -> Result<()> {
    let top = sub.top_container.as_ref().ok_or_else(|| {
        Error::InvalidRecord("container instance has no top container".to_string())
    })?;

    let (token, _) = container_token(&top.container_type);
    let label = ctx.labels.resolve("instance_instance_type", instance_type);
    w.mixed_element(
        "container",
        &Attrs::new().with("type", token).with("label", label),
        &top.indicator,
        ParagraphMode::Strip,
    )?;

    for (sub_type, indicator) in sub.sub_levels() {
        let (token, special) = container_token(sub_type);
        let label = if special {
            sub_type.to_string()
        } else {
            capitalize(sub_type)
        };
        let attrs = Attrs::new().with("type", token).with("label", label);
        w.mixed_element("container", &attrs, indicator.unwrap_or(""), ParagraphMode::Strip)?;
    }
    Ok(())
}

/// Write one `<dao>` per file version. Returns false when the object is
/// hidden.
fn write_digital_object(
    w: &mut EadWriter,
    ctx: &Context<'_>,
    dao: &DigitalObject,
) -> Result<bool> {
    if dao.suppressed || !ctx.shows(dao.publish) {
        return Ok(false);
    }

    let description = dao
        .notes
        .iter()
        .rev()
        .find(|n| n.note_type == "note")
        .and_then(|n| n.content.first())
        .map_or_else(|| "[access item]".to_string(), |c| format!("[{c}]"));

    let base = Attrs::new()
        .internal_if(!dao.publish)
        .opt("title", dao.title.as_deref());

    let links: Vec<(&str, String, &str)> = if dao.file_versions.is_empty() {
        vec![(dao.digital_object_id.as_str(), "onrequest".to_string(), "new")]
    } else {
        dao.file_versions
            .iter()
            .map(|v| {
                (
                    v.file_uri.as_deref().unwrap_or(&dao.digital_object_id),
                    v.xlink_actuate_attribute
                        .as_deref()
                        .map_or_else(|| "onrequest".to_string(), str::to_lowercase),
                    v.xlink_show_attribute.as_deref().unwrap_or("new"),
                )
            })
            .collect()
    };

    for (href, actuate, show) in links {
        let attrs = base
            .clone()
            .with("href", href)
            .with("actuate", actuate)
            .with("show", show);
        w.element("dao", &attrs, |w| {
            w.mixed_element("daodesc", &Attrs::new(), &description, ParagraphMode::Wrap)
        })?;
    }
    Ok(true)
}
