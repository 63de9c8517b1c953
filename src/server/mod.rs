//! Server module for message handling
//!
//! This module contains the dispatcher, its registries, the resource URI
//! matcher, and the handler plumbing shared by them.

pub mod handlers;
pub mod registry;
pub mod server;
pub mod uri_template;

pub use handlers::{ BuiltinMethod, Handler, MethodHandler };
pub use server::{ DEFAULT_SERVER_VERSION, Server, ServerBuilder, ServerInfo };
pub use uri_template::UriTemplate;
