//! In-memory fence registry
//!
//! Ordered collection of fences keyed by [`FenceId`]. Insertion order is
//! render order only. Every operation either succeeds completely or leaves
//! the registry untouched.

use crate::{Fence, FenceCategory, FenceError, FenceId, FenceStatus, NewFence, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct FenceRegistry {
    fences: Vec<Fence>,
}

impl FenceRegistry {
    pub fn new() -> Self {
        Self { fences: Vec::new() }
    }

    /// Validate, assign a fresh identity and append.
    pub fn add(&mut self, fence: NewFence) -> Result<FenceId> {
        fence.validate()?;
        let fence = fence.normalized();

        let mut id = FenceId::new();
        while self.position(id).is_some() {
            id = FenceId::new();
        }

        info!(
            "Added fence {} '{}' ({}, {} points)",
            id,
            fence.name,
            fence.category,
            fence.boundary.len()
        );

        self.fences.push(Fence::from_new(id, fence, Utc::now()));
        Ok(id)
    }

    /// Replace the full record, keeping identity and creation time.
    pub fn update(&mut self, id: FenceId, fence: NewFence) -> Result<()> {
        let index = self.index_of(id)?;
        fence.validate()?;
        let fence = fence.normalized();

        let existing = &mut self.fences[index];
        let created_at = existing.created_at;
        *existing = Fence::from_new(id, fence, created_at);
        existing.updated_at = Utc::now();

        info!("Updated fence {} '{}'", id, existing.name);
        Ok(())
    }

    pub fn remove(&mut self, id: FenceId) -> Result<Fence> {
        let index = self.index_of(id)?;
        let removed = self.fences.remove(index);
        info!("Removed fence {} '{}'", id, removed.name);
        Ok(removed)
    }

    pub fn set_visibility(&mut self, id: FenceId, visible: bool) -> Result<()> {
        let index = self.index_of(id)?;
        let fence = &mut self.fences[index];
        fence.visible = visible;
        debug!("Fence {} visible={}", id, visible);
        Ok(())
    }

    pub fn get(&self, id: FenceId) -> Result<&Fence> {
        self.fences
            .iter()
            .find(|f| f.id == id)
            .ok_or(FenceError::NotFound(id))
    }

    /// First fence with exactly this (trimmed) name
    pub fn find_by_name(&self, name: &str) -> Option<&Fence> {
        let name = name.trim();
        self.fences.iter().find(|f| f.name == name)
    }

    /// Snapshot in insertion order
    pub fn list(&self) -> &[Fence] {
        &self.fences
    }

    pub fn visible(&self) -> impl Iterator<Item = &Fence> {
        self.fences.iter().filter(|f| f.visible)
    }

    pub fn len(&self) -> usize {
        self.fences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fences.is_empty()
    }

    pub fn stats(&self) -> FenceStats {
        FenceStats::from_fences(self.list())
    }

    fn position(&self, id: FenceId) -> Option<usize> {
        self.fences.iter().position(|f| f.id == id)
    }

    fn index_of(&self, id: FenceId) -> Result<usize> {
        self.position(id).ok_or(FenceError::NotFound(id))
    }
}

/// Counts derived from a fence list; recomputed on every call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FenceStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub visible: usize,
    pub hidden: usize,
    /// Fences whose restrictions only apply inside a time window
    pub time_restricted: usize,
    pub by_category: BTreeMap<FenceCategory, usize>,
}

impl FenceStats {
    pub fn from_fences(fences: &[Fence]) -> Self {
        let mut by_category: BTreeMap<FenceCategory, usize> =
            FenceCategory::ALL.iter().map(|c| (*c, 0)).collect();
        let mut active = 0;
        let mut visible = 0;
        let mut time_restricted = 0;

        for f in fences {
            *by_category.entry(f.category).or_insert(0) += 1;
            if f.status == FenceStatus::Active {
                active += 1;
            }
            if f.visible {
                visible += 1;
            }
            if f.time_window.is_some() {
                time_restricted += 1;
            }
        }

        Self {
            total: fences.len(),
            active,
            inactive: fences.len() - active,
            visible,
            hidden: fences.len() - visible,
            time_restricted,
            by_category,
        }
    }
}
