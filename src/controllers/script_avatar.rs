use std::cell::Cell;
use std::rc::Rc;

use glam::Vec3;
use hecs::Entity;
use tracing::{debug, info};

use crate::components::LocalTransform;
use crate::engine::lifecycle::ScriptComponent;
use crate::systems::skeleton::SkeletonSync;
use crate::wire::pose_mapper::{quat_to_local, quat_to_wire, vec_to_local, vec_to_wire};
use crate::wire::{AvatarData, AvatarLink};

use super::FrameContext;

/// Poses a remote avatar from the replicated data the network layer stages.
pub struct ScriptAvatarController {
    root: Entity,
    data: AvatarData,
    skeleton: SkeletonSync,
    skeleton_dirty: Rc<Cell<bool>>,
    scale_change: Rc<Cell<Option<f32>>>,
}

impl ScriptAvatarController {
    pub fn new(root: Entity) -> Self {
        Self {
            root,
            data: AvatarData::new(),
            skeleton: SkeletonSync::new(root),
            skeleton_dirty: Rc::new(Cell::new(false)),
            scale_change: Rc::new(Cell::new(None)),
        }
    }

    pub fn root(&self) -> Entity {
        self.root
    }

    /// Handle for the network side.
    pub fn link(&self) -> AvatarLink {
        self.data.link()
    }

    pub fn data(&self) -> &AvatarData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut AvatarData {
        &mut self.data
    }

    pub fn skeleton(&self) -> &SkeletonSync {
        &self.skeleton
    }
}

impl<'a> ScriptComponent<FrameContext<'a>> for ScriptAvatarController {
    fn name(&self) -> &str {
        "ScriptAvatarController"
    }

    fn on_initialize(&mut self, ctx: &mut FrameContext<'a>) {
        let dirty = self.skeleton_dirty.clone();
        self.data.skeleton_changed.connect(move |_| dirty.set(true));
        let scale = self.scale_change.clone();
        self.data.scale_changed.connect(move |s| scale.set(Some(*s)));

        // Hold the spawn pose until the network says otherwise.
        if let Ok(root) = ctx.world.get::<&LocalTransform>(self.root) {
            self.data.set_position(vec_to_wire(root.position));
            self.data.set_orientation(quat_to_wire(root.rotation));
        }

        let joints = self.skeleton.rebuild(ctx.world);
        info!(root = ?self.root, joints, "remote avatar attached");
    }

    fn on_update(&mut self, ctx: &mut FrameContext<'a>, _dt: f32) {
        self.data.apply_pending();

        if self.skeleton_dirty.replace(false) {
            debug!(root = ?self.root, joints = self.data.skeleton().len(), "wire skeleton replaced");
            self.skeleton.invalidate();
        }

        if let Ok(mut root) = ctx.world.get::<&mut LocalTransform>(self.root) {
            root.position = vec_to_local(self.data.position());
            root.rotation = quat_to_local(self.data.orientation());
            if let Some(scale) = self.scale_change.take() {
                root.scale = Vec3::splat(scale);
            }
        }

        self.skeleton.apply(ctx.world, &self.data);
    }

    fn on_stop(&mut self, _ctx: &mut FrameContext<'a>) {
        self.data.skeleton_changed.disconnect_all();
        self.data.scale_changed.disconnect_all();
        info!(root = ?self.root, "remote avatar detached");
    }
}
