//! Logic crate for the Orion scene: static scene construction, the guide's
//! dialogue state machine, ray picking, and the camera controller. Everything
//! here runs headless; `orion_viewer` supplies the window and GPU surface.

pub mod camera;
pub mod dialogue;
pub mod input;
pub mod pick;
pub mod scene;

pub use camera::{CameraLens, CameraPose, FreeMoveController, OrbitRig};
pub use dialogue::{GuideMode, GuideState};
pub use input::{InputQueue, MoveKey, MovementIntent, PointerClick, SceneInput};
pub use pick::{Collider, Ray, RayHit, handle_click};
pub use scene::{ObjectKind, OrionScene, SceneConfig, SceneObject, SceneObjectId};
