//! Session file loading

use crate::Result;
use geofence_core::{
    Fence, FenceCategory, FenceMetadata, FenceStatus, NewFence, SurfaceBounds, TimeWindow,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Recorded authoring session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Surface size while the session was recorded; config default if absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<SurfaceBounds>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// One user interaction. Fences are referenced by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Click { x: f64, y: f64 },
    Finish,
    Metadata(FenceMetadata),
    Commit,
    Clear,
    Hide { fence: String },
    Show { fence: String },
    Remove { fence: String },
    Update { fence: String, edit: FenceEdit },
}

impl Action {
    /// Short label for logs and the rejection list
    pub fn label(&self) -> String {
        match self {
            Action::Click { x, y } => format!("click ({x}, {y})"),
            Action::Finish => "finish".to_string(),
            Action::Metadata(m) => format!("metadata '{}'", m.name),
            Action::Commit => "commit".to_string(),
            Action::Clear => "clear".to_string(),
            Action::Hide { fence } => format!("hide '{fence}'"),
            Action::Show { fence } => format!("show '{fence}'"),
            Action::Remove { fence } => format!("remove '{fence}'"),
            Action::Update { fence, .. } => format!("update '{fence}'"),
        }
    }
}

/// Field changes applied on top of an existing fence; unset fields are kept
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FenceEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<FenceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<FenceCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
}

impl FenceEdit {
    /// Full replacement record: the existing fence with this edit applied
    pub fn apply(&self, existing: &Fence) -> NewFence {
        NewFence {
            name: self.name.clone().unwrap_or_else(|| existing.name.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| existing.description.clone()),
            status: self.status.unwrap_or(existing.status),
            category: self.category.unwrap_or(existing.category),
            boundary: existing.boundary.clone(),
            restrictions: self
                .restrictions
                .clone()
                .unwrap_or_else(|| existing.restrictions.clone()),
            time_window: self.time_window.clone().or_else(|| existing.time_window.clone()),
            visible: existing.visible,
        }
    }
}

/// Load a session from a JSON file
pub fn load_session(path: impl AsRef<Path>) -> Result<Session> {
    let path = path.as_ref();
    info!("Loading session from {:?}", path);

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let session: Session = serde_json::from_reader(reader)?;

    info!("Loaded {} actions", session.actions.len());
    Ok(session)
}
