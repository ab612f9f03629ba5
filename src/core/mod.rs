//! Window-manager core: the window collection, per-window interaction
//! controllers and the render contract. Free of any terminal code.

pub mod app;
pub mod controller;
pub mod events;
pub mod geometry;
pub mod manager;
pub mod presentation;
pub mod scene;
pub mod window;

pub use app::{AppCatalog, AppDefinition};
pub use controller::{ControllerConfig, Controllers, Gesture, InteractionController};
pub use events::{EventBus, Notification};
pub use geometry::{Bounds, Point, Size, Viewport};
pub use manager::{FocusOnClose, WindowManager, WmConfig};
pub use presentation::{Presentation, Transition};
pub use scene::{compose, hit_test, SceneWindow};
pub use window::{Window, WindowId};
