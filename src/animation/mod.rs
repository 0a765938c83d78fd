pub mod easing;
pub mod fade;
pub mod transition;

pub use easing::EasingType;
pub use fade::FadeScheduler;
pub use transition::CameraTransition;
