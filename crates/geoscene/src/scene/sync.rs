//! Sync planning.
//!
//! A sync validates the graph under a root, collects the payload of every
//! object that is new or changed (children before parents, so a parent's
//! handle references always point at uploaded objects), hands each entry
//! to an [`Uploader`] and marks it clean once uploaded.

use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::debug;

use crate::error::Error;
use crate::model::{Handle, ObjectKind};
use crate::scene::{DirtyPayload, Scene};

/// One object to transmit.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncEntry {
    pub handle: Handle,
    pub kind: ObjectKind,
    /// True if the object has never been transmitted; its payload is forced.
    pub is_new: bool,
    pub payload: DirtyPayload,
    /// Scene revision the payload was read at. Completing the entry clears
    /// only changes made up to this revision.
    pub revision: u64,
}

/// Ordered list of objects to transmit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    pub entries: Vec<SyncEntry>,
}

impl SyncPlan {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total size of all binary files in the plan.
    pub fn binary_len(&self) -> usize {
        self.entries.iter().map(|e| e.payload.binary_len()).sum()
    }
}

/// Transport that receives sync entries.
pub trait Uploader {
    type Error: std::error::Error + 'static;

    fn upload(&mut self, entry: &SyncEntry) -> Result<(), Self::Error>;
}

/// Failure of [`Scene::sync`].
#[derive(Debug, Error)]
pub enum SyncError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Scene(#[from] Error),

    #[error("upload of {kind} {handle} failed: {source}")]
    Upload {
        handle: Handle,
        kind: ObjectKind,
        #[source]
        source: E,
    },
}

impl Scene {
    /// Validates `root` and lists every owned object that is new or has
    /// changed fields.
    pub fn plan_sync(&mut self, root: Handle) -> Result<SyncPlan, Error> {
        self.validate_all(root)?;
        let mut order = Vec::new();
        let mut visited = FxHashSet::default();
        self.post_order(root, &mut visited, &mut order)?;

        let mut plan = SyncPlan::default();
        for handle in order {
            let node = self.node(handle)?;
            let is_new = !node.synced;
            if !is_new && node.dirty.iter().all(|r| *r == 0) {
                continue;
            }
            let payload = self.get_dirty_payload(handle, is_new)?;
            plan.entries.push(SyncEntry {
                handle,
                kind: node.kind,
                is_new,
                payload,
                revision: self.revision,
            });
        }
        debug!(
            root = %root,
            entries = plan.len(),
            binary_bytes = plan.binary_len(),
            "planned sync"
        );
        Ok(plan)
    }

    fn post_order(
        &self,
        handle: Handle,
        visited: &mut FxHashSet<Handle>,
        out: &mut Vec<Handle>,
    ) -> Result<(), Error> {
        if !visited.insert(handle) {
            return Ok(());
        }
        for child in self.owned_children(handle)? {
            self.post_order(child, visited, out)?;
        }
        out.push(handle);
        Ok(())
    }

    /// Marks every entry of `plan` as transmitted.
    ///
    /// Fields changed after the plan was made stay dirty for the next sync.
    pub fn complete_sync(&mut self, plan: &SyncPlan) -> Result<(), Error> {
        for entry in &plan.entries {
            self.complete_entry(entry)?;
        }
        Ok(())
    }

    fn complete_entry(&mut self, entry: &SyncEntry) -> Result<(), Error> {
        self.node(entry.handle)?;
        let node = &mut self.nodes[entry.handle.index()];
        for revision in node.dirty.iter_mut().filter(|r| **r <= entry.revision) {
            *revision = 0;
        }
        node.synced = true;
        Ok(())
    }

    /// Plans a sync of `root` and uploads each entry in order.
    ///
    /// Stops at the first upload error; entries not yet uploaded keep their
    /// dirty state. Returns the number of uploaded objects.
    pub fn sync<U: Uploader>(
        &mut self,
        root: Handle,
        uploader: &mut U,
    ) -> Result<usize, SyncError<U::Error>> {
        let plan = self.plan_sync(root)?;
        for entry in &plan.entries {
            uploader.upload(entry).map_err(|source| SyncError::Upload {
                handle: entry.handle,
                kind: entry.kind,
                source,
            })?;
            self.complete_entry(entry)?;
        }
        Ok(plan.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::SceneConfig;

    #[derive(Debug, Error)]
    #[error("connection reset")]
    struct Reset;

    #[derive(Default)]
    struct Recorder {
        uploaded: Vec<(Handle, ObjectKind)>,
        fail_on: Option<ObjectKind>,
    }

    impl Uploader for Recorder {
        type Error = Reset;

        fn upload(&mut self, entry: &SyncEntry) -> Result<(), Reset> {
            if self.fail_on == Some(entry.kind) {
                return Err(Reset);
            }
            self.uploaded.push((entry.handle, entry.kind));
            Ok(())
        }
    }

    fn project() -> (Scene, Handle, Handle, Handle) {
        let mut scene = Scene::with_config(SceneConfig::new().with_seed(8));
        let mesh = scene.create(ObjectKind::Mesh0D);
        scene.set(mesh, "vertices", vec![[0.0, 0.0, 0.0]; 3]).unwrap();
        let point = scene.create(ObjectKind::Point);
        scene.set(point, "mesh", mesh).unwrap();
        let project = scene.create(ObjectKind::Project);
        scene.set(project, "resources", vec![point]).unwrap();
        (scene, project, point, mesh)
    }

    #[test]
    fn test_children_planned_before_parents() {
        let (mut scene, project, point, mesh) = project();
        let plan = scene.plan_sync(project).unwrap();
        let order: Vec<Handle> = plan.entries.iter().map(|e| e.handle).collect();
        let pos = |h| order.iter().position(|x| *x == h).unwrap();
        assert!(pos(mesh) < pos(point));
        assert!(pos(point) < pos(project));
        assert_eq!(order.last(), Some(&project));
        assert!(plan.entries.iter().all(|e| e.is_new));
        let mesh_entry = &plan.entries[pos(mesh)];
        assert!(mesh_entry.payload.binary.contains_key("vertices"));
    }

    #[test]
    fn test_second_sync_sends_only_changes() {
        let (mut scene, project, point, mesh) = project();
        let mut recorder = Recorder::default();
        let sent = scene.sync(project, &mut recorder).unwrap();
        assert_eq!(sent, recorder.uploaded.len());
        assert!(!scene.is_dirty(project).unwrap());

        scene.set(point, "title", "wells").unwrap();
        let plan = scene.plan_sync(project).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.entries[0].handle, point);
        assert!(!plan.entries[0].is_new);
        assert_eq!(plan.entries[0].payload.json.len(), 1);
        scene.complete_sync(&plan).unwrap();
        assert!(scene.plan_sync(project).unwrap().is_empty());
        assert!(!scene.is_dirty(mesh).unwrap());
    }

    #[test]
    fn test_edits_after_planning_survive_completion() {
        let (mut scene, project, point, _) = project();
        scene.sync(project, &mut Recorder::default()).unwrap();

        scene.set(point, "title", "wells").unwrap();
        let plan = scene.plan_sync(project).unwrap();
        scene.set(point, "description", "edited later").unwrap();
        scene.set(point, "title", "renamed").unwrap();
        scene.complete_sync(&plan).unwrap();

        assert_eq!(scene.own_dirty_fields(point).unwrap(), vec!["title", "description"]);
        let next = scene.plan_sync(project).unwrap();
        assert_eq!(next.len(), 1);
        let json = &next.entries[0].payload.json;
        assert_eq!(json.get("title"), Some(&serde_json::json!("renamed")));
        assert_eq!(json.get("description"), Some(&serde_json::json!("edited later")));
    }

    #[test]
    fn test_new_object_edited_after_planning_stays_dirty() {
        let (mut scene, project, _, mesh) = project();
        let plan = scene.plan_sync(project).unwrap();
        scene.set(mesh, "vertices", vec![[1.0, 0.0, 0.0]; 3]).unwrap();
        scene.complete_sync(&plan).unwrap();

        let next = scene.plan_sync(project).unwrap();
        let entry = next.entries.iter().find(|e| e.handle == mesh).unwrap();
        assert!(!entry.is_new);
        assert!(entry.payload.binary.contains_key("vertices"));
    }

    #[test]
    fn test_failed_upload_keeps_remaining_dirty() {
        let (mut scene, project, point, mesh) = project();
        let mut recorder = Recorder {
            fail_on: Some(ObjectKind::Point),
            ..Default::default()
        };
        let err = scene.sync(project, &mut recorder).unwrap_err();
        assert!(matches!(err, SyncError::Upload { kind: ObjectKind::Point, .. }));
        assert!(recorder.uploaded.iter().any(|(h, _)| *h == mesh));
        assert!(scene.is_dirty(point).unwrap());

        let retry = scene.plan_sync(project).unwrap();
        assert!(retry.entries.iter().all(|e| e.handle != mesh));
        assert!(retry.entries.iter().any(|e| e.handle == point));
    }
}
