//! Session replay against the builder and registry

use crate::session::{Action, Session};
use crate::{ActionError, AuthorConfig, Result};
use geofence_core::render::{self, DraftOverlay, RenderedFence};
use geofence_core::{
    BuilderState, Fence, FenceId, FenceRegistry, FenceStats, PixelPoint, PolygonBuilder,
    SurfaceBounds,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Presentation-side owner of the builder and the registry
pub struct Replayer {
    builder: PolygonBuilder,
    registry: FenceRegistry,
    surface: SurfaceBounds,
}

/// Action the core refused, with the user-facing reason
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedAction {
    pub index: usize,
    pub action: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub fences: Vec<Fence>,
    pub stats: FenceStats,
    pub rendered: Vec<RenderedFence>,
    /// Uncommitted draft left at the end of the session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<DraftOverlay>,
    pub builder_state: BuilderState,
    pub surface: SurfaceBounds,
    pub actions_applied: usize,
    pub rejected: Vec<RejectedAction>,
    pub generated_at: String,
}

impl Replayer {
    pub fn new(config: &AuthorConfig, surface: Option<SurfaceBounds>) -> Result<Self> {
        let transform = config.transform()?;
        Ok(Self {
            builder: PolygonBuilder::new(transform),
            registry: FenceRegistry::new(),
            surface: surface.unwrap_or_else(|| config.surface()),
        })
    }

    pub fn builder(&self) -> &PolygonBuilder {
        &self.builder
    }

    pub fn registry(&self) -> &FenceRegistry {
        &self.registry
    }

    pub fn surface(&self) -> SurfaceBounds {
        self.surface
    }

    /// Apply one action. On error nothing has changed.
    pub fn apply(&mut self, action: &Action) -> std::result::Result<(), ActionError> {
        match action {
            Action::Click { x, y } => {
                let point = self
                    .builder
                    .add_vertex(PixelPoint::new(*x, *y), self.surface)?;
                debug!("Click ({}, {}) -> {}", x, y, point);
            }
            Action::Finish => self.builder.finish()?,
            Action::Metadata(metadata) => self.builder.set_metadata(metadata.clone())?,
            Action::Commit => {
                self.ensure_name_free(&self.builder.metadata().name, None)?;
                self.builder.commit(&mut self.registry)?;
            }
            Action::Clear => self.builder.clear(),
            Action::Hide { fence } => {
                let id = self.resolve(fence)?;
                self.registry.set_visibility(id, false)?;
            }
            Action::Show { fence } => {
                let id = self.resolve(fence)?;
                self.registry.set_visibility(id, true)?;
            }
            Action::Remove { fence } => {
                let id = self.resolve(fence)?;
                self.registry.remove(id)?;
            }
            Action::Update { fence, edit } => {
                let existing = self
                    .registry
                    .find_by_name(fence)
                    .ok_or_else(|| ActionError::UnknownFence(fence.clone()))?;
                let id = existing.id;
                let replacement = edit.apply(existing);
                self.ensure_name_free(&replacement.name, Some(id))?;
                self.registry.update(id, replacement)?;
            }
        }
        Ok(())
    }

    fn resolve(&self, name: &str) -> std::result::Result<FenceId, ActionError> {
        self.registry
            .find_by_name(name)
            .map(|f| f.id)
            .ok_or_else(|| ActionError::UnknownFence(name.to_string()))
    }

    /// Names are how sessions address fences, so they must stay unique.
    fn ensure_name_free(
        &self,
        name: &str,
        owner: Option<FenceId>,
    ) -> std::result::Result<(), ActionError> {
        match self.registry.find_by_name(name) {
            Some(other) if Some(other.id) != owner => {
                Err(ActionError::DuplicateName(name.trim().to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Replay every action, recording rejections instead of stopping.
    pub fn run(&mut self, session: &Session) -> Vec<RejectedAction> {
        let mut rejected = Vec::new();

        for (index, action) in session.actions.iter().enumerate() {
            if let Err(e) = self.apply(action) {
                warn!("Action #{} ({}) rejected: {}", index, action.label(), e);
                rejected.push(RejectedAction {
                    index,
                    action: action.label(),
                    reason: e.to_string(),
                });
            }
        }

        info!(
            "Replayed {} actions ({} rejected), {} fences in registry",
            session.actions.len(),
            rejected.len(),
            self.registry.len()
        );

        rejected
    }

    /// Snapshot the registry and draft for output.
    pub fn report(
        &self,
        actions_applied: usize,
        rejected: Vec<RejectedAction>,
    ) -> Result<SessionReport> {
        let transform = self.builder.transform();
        let rendered = render::render_fences(self.registry.list(), transform, self.surface)?;
        let draft = self.draft_overlay()?;

        Ok(SessionReport {
            fences: self.registry.list().to_vec(),
            stats: self.registry.stats(),
            rendered,
            draft,
            builder_state: self.builder.state(),
            surface: self.surface,
            actions_applied,
            rejected,
            generated_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    fn draft_overlay(&self) -> Result<Option<DraftOverlay>> {
        if self.builder.vertex_count() == 0 {
            return Ok(None);
        }
        Ok(Some(render::render_draft(&self.builder, self.surface)?))
    }

    pub fn svg(&self) -> Result<String> {
        let transform = self.builder.transform();
        let rendered = render::render_fences(self.registry.list(), transform, self.surface)?;
        let draft = self.draft_overlay()?;
        Ok(render::svg_document(&rendered, draft.as_ref(), self.surface))
    }
}

/// Replay `session` into a fresh registry and build the report.
pub fn replay_session(
    session: &Session,
    config: &AuthorConfig,
) -> Result<(Replayer, SessionReport)> {
    let mut replayer = Replayer::new(config, session.surface)?;
    let rejected = replayer.run(session);
    let applied = session.actions.len() - rejected.len();
    let report = replayer.report(applied, rejected)?;
    Ok((replayer, report))
}
