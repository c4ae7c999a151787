//! Surface navigation core: geodesic paths, path following, drag rotation and
//! surface gravity for bodies living on rotating spheres.
//!
//! Everything here is synchronous and frame-driven. A host calls, per frame:
//! gravity/containment, integration, movement, then rotation.

pub mod body;
pub mod config;
pub mod geometry;
pub mod gravity;
pub mod movement;
pub mod path;
pub mod protocol;
pub mod rotation;
pub mod sphere;

pub use body::{Body, BodyId, BodyKind, BodyRegistry};
pub use config::{GravityConfig, MovementConfig, NavigationConfig, PathConfig, RotationConfig};
pub use gravity::{apply_gravity_and_containment, ContainmentEvent};
pub use movement::{MovementController, MovementHooks, MovementStatus, TrailBuffer};
pub use path::{Path, PathFinder};
pub use rotation::{any_attached_rotation_in_progress, RotationController};
pub use sphere::{Sphere, SphereId};
