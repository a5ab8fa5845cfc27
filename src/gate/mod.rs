//! Content gate
//!
//! Decides, per piece of protected content, whether to show it, a neutral
//! placeholder, or a locked preview with sign-in actions.

pub mod descriptor;
pub mod navigator;
pub mod state;
pub mod view;

pub use descriptor::{GateDescriptor, GateType};
pub use navigator::Navigator;
pub use state::{ContentGate, GateState, REVEAL_DURATION_MS};
pub use view::{ActionButton, GateCard, GateView, ObscuredPreview};
