//! Read-only record snapshots consumed by the exporter.
//!
//! Everything here is built once per export from a tree the host has already
//! resolved and permission-filtered. Nothing is mutated during serialization.

mod note;
mod record;
mod resource;
mod tree;

pub use note::{ChronItem, DefItem, IndexItem, Note, NoteGroup, NoteItem, NoteType, Subnote};
pub use record::{
    Agent, AgentLink, AgentRole, AgentType, Date, DigitalObject, DigitalObjectNote, DisplayName,
    Extent, FileVersion, Instance, InstanceLink, RecordNode, SubContainer, TopContainer,
};
pub use resource::{AccessTerm, Repository, Resource, RevisionStatement};
pub use tree::{NodeId, NodeSource, ResourceStore, ResourceTree};
