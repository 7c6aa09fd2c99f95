//! # Kinetic HTTP
//!
//! Binds the protocol to the `http` 1.x types: request headers become a
//! [`RequestIntent`](kinetic_core::RequestIntent), resolved pages become JSON
//! or HTML responses, and redirects get the status the client expects.

pub mod config;
pub mod error;
pub mod flash;
pub mod headers;
pub mod responder;
pub mod server;
pub mod service;
pub mod view;

pub use config::{ConfigError, KineticConfig, VersionSource};
pub use error::RenderError;
pub use flash::{FlashError, FlashStore, MemoryFlash};
pub use headers::parse_intent;
pub use responder::{ERRORS_PROP, Kinetic, KineticResponse, redirect_status};
pub use server::serve;
pub use service::KineticService;
pub use view::{DefaultRootView, FnView, RootView, root_element, view_fn};

pub mod prelude {
    pub use crate::config::{KineticConfig, VersionSource};
    pub use crate::error::RenderError;
    pub use crate::flash::{FlashStore, MemoryFlash};
    pub use crate::responder::{Kinetic, KineticResponse};
    pub use crate::view::{RootView, view_fn};
}
