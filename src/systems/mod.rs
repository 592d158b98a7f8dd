pub mod animation;
pub mod avatar;
pub mod interaction;
pub mod physics;
pub mod raycast;
pub mod skeleton;
pub mod transform;

pub use animation::{AnimationBlender, AnimationEvent, ClipLibrary};
pub use avatar::{update_locomotion, CameraView, LocomotionCtx};
pub use interaction::{find_sit_target, SitTarget};
pub use physics::{physics_step, EcsPhysics, PhysicsBackend};
pub use raycast::{raycast_static, RaycastHit};
pub use skeleton::{build_skeleton, SkeletonSync};
pub use transform::{transform_propagation_system, world_rotation};
