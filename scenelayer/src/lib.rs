//! SceneLayer - custom raster rendering and composite export for remote
//! image services.
//!
//! The library requests rendered imagery from an ArcGIS-style `exportImage`
//! endpoint, keeps the rendering-rule JSON in the field order the server
//! requires, composites several scenes with a selectable aggregation method,
//! and captures renderer thumbnails once the view has settled.
//!
//! # High-Level API
//!
//! [`session::RenderSession`] drives the whole pipeline for one view:
//!
//! ```ignore
//! use scenelayer::session::{RenderSession, RendererChoice};
//! use scenelayer::mosaic::{CompositeMethod, SceneSelection};
//!
//! let session = RenderSession::new(view, service, store, registry, fetch, capture);
//! session.select(
//!     &SceneSelection::from_ids([101u64, 102, 103]),
//!     Some(CompositeMethod::Min),
//!     RendererChoice::preset("Agriculture"),
//! )?;
//! session.render().await?;
//! ```

pub mod blob;
pub mod capture;
pub mod config;
pub mod decode;
pub mod fetch;
pub mod geo;
pub mod logging;
pub mod mosaic;
pub mod overlay;
pub mod registry;
pub mod rendering_rule;
pub mod service;
pub mod session;
pub mod storage;
pub mod view;

/// Version of the SceneLayer library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
