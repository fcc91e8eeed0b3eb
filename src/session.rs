//! Editing session: an immutable baseline plus a working copy.
//!
//! Every edit replaces the working copy with a new snapshot produced by the
//! level updaters. Saving and cancelling are whole-snapshot operations; the
//! caller owns the network round trip and hands the reloaded snapshot back
//! through [`PermissionsEditor::commit`].

use log::{debug, info, warn};

use crate::access::{Access, Level};
use crate::config::EditorConfig;
use crate::diff::{diff, PermissionsDiff};
use crate::error::{PermsError, Result};
use crate::grid::{apply_update, build_grid, EntityId, GridScope, PermissionsGrid, PostAction, Route};
use crate::topology::{Group, GroupId, Topology, TopologyProvider};
use crate::tree::{validate_changes, validate_state, PermissionsState};

pub struct PermissionsEditor<T: TopologyProvider = Topology> {
    topology: T,
    groups: Vec<Group>,
    original: PermissionsState,
    current: PermissionsState,
    config: EditorConfig,
    save_error: Option<String>,
}

impl<T: TopologyProvider> PermissionsEditor<T> {
    pub fn new(topology: T, groups: Vec<Group>, snapshot: PermissionsState, config: EditorConfig) -> Result<Self> {
        if config.validate_on_load {
            validate_state(&snapshot)?;
        }
        let groups = config.normalize_groups(groups);
        debug!("editor opened with {} groups, {} databases", groups.len(), topology.databases().len());
        Ok(Self {
            topology,
            groups,
            current: snapshot.clone(),
            original: snapshot,
            config,
            save_error: None,
        })
    }

    pub fn topology(&self) -> &T {
        &self.topology
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn original(&self) -> &PermissionsState {
        &self.original
    }

    pub fn current(&self) -> &PermissionsState {
        &self.current
    }

    pub fn grid(&self, scope: &GridScope) -> Result<PermissionsGrid> {
        build_grid(&self.topology, &self.groups, &self.current, scope)
    }

    /// Apply one cell edit. A rejected edit leaves the working copy as it was.
    pub fn update(
        &mut self,
        group: GroupId,
        entity: &EntityId,
        level: Level,
        value: Access,
    ) -> Result<Option<PostAction>> {
        match apply_update(&self.current, &self.topology, &self.groups, group, entity, level, value) {
            Ok(applied) => {
                self.current = applied.state;
                Ok(applied.post_action)
            }
            Err(e) => {
                warn!("rejected edit of {} for group {} on {:?}: {}", level, group, entity, e);
                Err(e)
            }
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.current != self.original
    }

    /// Changes of the working copy against the baseline
    pub fn diff(&self) -> PermissionsDiff {
        diff(&self.groups, self.topology.databases(), &self.current, &self.original)
    }

    /// Drop every pending edit
    pub fn cancel(&mut self) {
        if self.is_dirty() {
            info!("discarding pending permission edits");
        }
        self.current = self.original.clone();
        self.save_error = None;
    }

    /// Snapshot to send to the save endpoint. Only entries edited in this
    /// session are checked; the baseline is taken as the server sent it.
    pub fn prepare_save(&self) -> Result<&PermissionsState> {
        validate_changes(&self.current, &self.original).map_err(|e| PermsError::StaleSnapshot(e.to_string()))?;
        Ok(&self.current)
    }

    /// Replace baseline and working copy with the snapshot reloaded after a save
    pub fn commit(&mut self, reloaded: PermissionsState) -> Result<()> {
        if self.config.validate_on_load {
            validate_state(&reloaded)?;
        }
        info!("committed permissions, {} groups in new baseline", reloaded.0.len());
        self.current = reloaded.clone();
        self.original = reloaded;
        self.save_error = None;
        Ok(())
    }

    pub fn record_save_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("saving permissions failed: {}", message);
        self.save_error = Some(message);
    }

    pub fn save_error(&self) -> Option<&str> {
        self.save_error.as_deref()
    }

    /// URL of a route under the configured base
    pub fn route_path(&self, route: &Route) -> String {
        route.to_path(&self.config.route_base)
    }
}
