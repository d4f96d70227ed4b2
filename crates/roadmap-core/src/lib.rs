//! Roadmap Core
//!
//! Session layer over the graph, layout and stream crates:
//! - [`RoadmapWorkspace`]: one displayed roadmap, generated or loaded
//! - [`InteractionController`]: selection, save and load
//! - [`RoadmapStore`]: saved-roadmap API seam, with [`HttpRoadmapStore`]
//! - [`ClientConfig`] and [`UserPrefs`]: TOML config and the persisted user key
//!
//! # Example
//!
//! ```no_run
//! use roadmap_core::{ClientConfig, RoadmapWorkspace};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let workspace = RoadmapWorkspace::connect(ClientConfig::load(None)?)?;
//! workspace.generate("learn rust")?;
//! let status = workspace.wait_until_finished().await;
//! println!("{} concepts, {:?}", workspace.snapshot().node_count(), status.state);
//! workspace.persist().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod document;
pub mod error;
pub mod interaction;
pub mod persistence;
pub mod prefs;
pub mod workspace;

pub use config::ClientConfig;
pub use document::{NewRoadmap, PersistedNode, RoadmapDocument, RoadmapSummary, RoadmapUpdate};
pub use error::{ConfigError, PersistenceError, PrefsError, WorkspaceError};
pub use interaction::{InteractionController, PersistOutcome};
pub use persistence::{HttpRoadmapStore, RoadmapStore};
pub use prefs::{default_prefs_path, UserPrefs};
pub use workspace::{LoadOutcome, RoadmapWorkspace};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
