//! Record nodes and the entities hanging off them.

use serde::{Deserialize, Serialize};

use super::note::{Note, NoteType, default_true};
use super::tree::NodeId;

/// A node in the finding-aid hierarchy: the resource itself or a component.
///
/// Children are referenced by [`NodeId`] and fetched from a
/// [`NodeSource`](super::NodeSource) when the walker reaches them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordNode {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub other_level: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub ref_id: Option<String>,
    #[serde(default)]
    pub component_id: Option<String>,
    #[serde(default = "default_true")]
    pub publish: bool,
    #[serde(default)]
    pub suppressed: bool,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub extents: Vec<Extent>,
    #[serde(default)]
    pub dates: Vec<Date>,
    #[serde(default)]
    pub linked_agents: Vec<AgentLink>,
    #[serde(default)]
    pub instances: Vec<Instance>,
    #[serde(default)]
    pub children: Vec<NodeId>,
}

impl RecordNode {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            publish: true,
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn with_note(mut self, note: Note) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_extent(mut self, extent: Extent) -> Self {
        self.extents.push(extent);
        self
    }

    pub fn with_instance(mut self, instance: Instance) -> Self {
        self.instances.push(instance);
        self
    }

    /// Whether the node is written at all under the given setting.
    pub fn is_visible(&self, include_unpublished: bool) -> bool {
        !self.suppressed && (self.publish || include_unpublished)
    }

    /// Notes of a given type, in order.
    pub fn notes_of(&self, note_type: NoteType) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(move |n| n.note_type == note_type)
    }

    /// Agents with a creator or source role.
    pub fn creators_and_sources(&self) -> impl Iterator<Item = &AgentLink> {
        self.linked_agents
            .iter()
            .filter(|l| matches!(l.role, AgentRole::Creator | AgentRole::Source))
    }

    /// Agents the record is about.
    pub fn subject_agents(&self) -> impl Iterator<Item = &AgentLink> {
        self.linked_agents
            .iter()
            .filter(|l| l.role == AgentRole::Subject)
    }

    pub fn container_instances(&self) -> impl Iterator<Item = &SubContainer> {
        self.instances.iter().filter_map(|i| match &i.link {
            InstanceLink::SubContainer(sub) => Some(sub),
            InstanceLink::DigitalObject(_) => None,
        })
    }

    pub fn digital_objects(&self) -> impl Iterator<Item = &DigitalObject> {
        self.instances.iter().filter_map(|i| match &i.link {
            InstanceLink::DigitalObject(dao) => Some(dao),
            InstanceLink::SubContainer(_) => None,
        })
    }
}

/// A physical quantity statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extent {
    /// Kept as text, the host stores values like `"1"` and `"0.5"`.
    pub number: String,
    pub extent_type: String,
    #[serde(default)]
    pub container_summary: Option<String>,
    #[serde(default)]
    pub physical_details: Option<String>,
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default = "default_true")]
    pub publish: bool,
}

impl Extent {
    pub fn new(number: impl Into<String>, extent_type: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            extent_type: extent_type.into(),
            publish: true,
            ..Default::default()
        }
    }

    /// Numeric value of the leading number, so `"1abc"` reads as `1.0`.
    /// `0.0` when there is no leading number.
    pub fn value(&self) -> f64 {
        let s = self.number.trim_start();
        let mut end = 0;
        let mut seen_dot = false;
        for (i, c) in s.char_indices() {
            match c {
                '0'..='9' => end = i + 1,
                '.' if !seen_dot => seen_dot = true,
                '+' | '-' if i == 0 => {}
                _ => break,
            }
        }
        s[..end].parse().unwrap_or(0.0)
    }

    /// Container summary, physical details and dimensions, in that order.
    pub fn details(&self) -> Vec<&str> {
        [
            self.container_summary.as_deref(),
            self.physical_details.as_deref(),
            self.dimensions.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Date {
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub begin: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    /// `inclusive`, `bulk` or `single`.
    #[serde(default)]
    pub date_type: Option<String>,
    #[serde(default)]
    pub certainty: Option<String>,
    #[serde(default)]
    pub era: Option<String>,
    #[serde(default)]
    pub calendar: Option<String>,
    #[serde(default = "default_true")]
    pub publish: bool,
}

impl Default for Date {
    fn default() -> Self {
        Self {
            expression: None,
            begin: None,
            end: None,
            date_type: None,
            certainty: None,
            era: None,
            calendar: None,
            publish: true,
        }
    }
}

impl Date {
    /// Display text: the expression if present, else the begin/end range.
    pub fn display(&self) -> Option<String> {
        if let Some(expr) = &self.expression {
            return Some(expr.clone());
        }
        let begin = self.begin.as_deref()?;
        match self.end.as_deref() {
            Some(end) if end != begin => Some(format!("{begin}-{end}")),
            _ => Some(begin.to_string()),
        }
    }

    /// ISO 8601 interval for the `normal` attribute.
    pub fn normal(&self) -> Option<String> {
        let begin = self.begin.as_deref()?;
        let end = match self.end.as_deref() {
            Some(end) if self.date_type.as_deref() != Some("single") => end,
            _ => begin,
        };
        Some(format!("{begin}/{end}"))
    }

    /// The `type` attribute: inclusive or bulk, nothing for single dates.
    pub fn unitdate_type(&self) -> Option<&'static str> {
        match self.date_type.as_deref() {
            Some("inclusive") => Some("inclusive"),
            Some("single") => None,
            Some(_) => Some("bulk"),
            None => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Creator,
    Source,
    Subject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    AgentPerson,
    AgentFamily,
    AgentCorporateEntity,
    AgentSoftware,
}

impl AgentType {
    /// Name element for this agent type. Software agents have none.
    pub fn name_element(self) -> Option<&'static str> {
        match self {
            AgentType::AgentPerson => Some("persname"),
            AgentType::AgentFamily => Some("famname"),
            AgentType::AgentCorporateEntity => Some("corpname"),
            AgentType::AgentSoftware => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentLink {
    pub role: AgentRole,
    #[serde(default)]
    pub relator: Option<String>,
    pub agent: Agent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub agent_type: AgentType,
    pub display_name: DisplayName,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayName {
    pub sort_name: String,
    #[serde(default)]
    pub rules: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub authority_id: Option<String>,
}

/// Links a record to a physical container or a digital object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub instance_type: String,
    #[serde(flatten)]
    pub link: InstanceLink,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceLink {
    SubContainer(SubContainer),
    DigitalObject(DigitalObject),
}

/// Up to three nested containers: top container plus two sub-levels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubContainer {
    #[serde(default)]
    pub top_container: Option<TopContainer>,
    #[serde(default)]
    pub type_2: Option<String>,
    #[serde(default)]
    pub indicator_2: Option<String>,
    #[serde(default)]
    pub type_3: Option<String>,
    #[serde(default)]
    pub indicator_3: Option<String>,
}

impl SubContainer {
    /// Second and third level (type, indicator) pairs that are present.
    pub fn sub_levels(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        [
            (self.type_2.as_deref(), self.indicator_2.as_deref()),
            (self.type_3.as_deref(), self.indicator_3.as_deref()),
        ]
        .into_iter()
        .filter_map(|(t, i)| t.map(|t| (t, i)))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopContainer {
    #[serde(rename = "type")]
    pub container_type: String,
    pub indicator: String,
    #[serde(default)]
    pub barcode: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitalObject {
    pub digital_object_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_true")]
    pub publish: bool,
    #[serde(default)]
    pub suppressed: bool,
    #[serde(default)]
    pub file_versions: Vec<FileVersion>,
    #[serde(default)]
    pub notes: Vec<DigitalObjectNote>,
    #[serde(default)]
    pub dates: Vec<Date>,
}

impl Default for DigitalObject {
    fn default() -> Self {
        Self {
            digital_object_id: String::new(),
            title: None,
            publish: true,
            suppressed: false,
            file_versions: Vec::new(),
            notes: Vec::new(),
            dates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileVersion {
    #[serde(default)]
    pub file_uri: Option<String>,
    #[serde(default)]
    pub xlink_actuate_attribute: Option<String>,
    #[serde(default)]
    pub xlink_show_attribute: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DigitalObjectNote {
    #[serde(rename = "type")]
    pub note_type: String,
    #[serde(default)]
    pub content: Vec<String>,
}
