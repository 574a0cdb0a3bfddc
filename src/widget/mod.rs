//! widget
//!
//! The slug editing widget, independent of any rendering surface.
//!
//! # Modules
//!
//! - [`config`] - Instance configuration from host attributes
//! - [`state`] - The reducer: `apply(state, event) -> (state, effects)`
//! - [`render`] - Pure render model and slug splitting
//! - [`transport`] - Async proposal transport (HTTP and mock)
//! - [`runtime`] - Tokio driver that executes effects
//!
//! # Example
//!
//! ```
//! use slugsync::widget::{apply, WidgetConfig, WidgetEvent, WidgetState};
//!
//! let config = WidgetConfig::from_attributes([("value", "/shop/shoes"), ("last-segment-only", "")])
//!     .unwrap();
//! let (state, _effects) = apply(WidgetState::new(config), WidgetEvent::Activate);
//! assert_eq!(state.edit_buffer, "/shoes");
//! ```

pub mod config;
pub mod render;
pub mod runtime;
pub mod state;
pub mod transport;

pub use config::{WidgetConfig, WidgetConfigError, DEFAULT_SETTLE};
pub use render::{render, RenderModel, Split};
pub use runtime::WidgetRuntime;
pub use state::{
    apply, Conflict, Effect, Mode, Notice, Resolution, SideChannel, WidgetEvent, WidgetState,
};
pub use transport::{HttpTransport, MockTransport, ProposalTransport, TransportError};
