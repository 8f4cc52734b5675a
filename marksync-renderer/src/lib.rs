//! # marksync-renderer
//!
//! Section patcher: locates `<!-- NAME_START -->` … `<!-- NAME_END -->`
//! regions in a document and replaces them with a freshly rendered metadata
//! block.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use marksync_core::types::{ActivityFact, MarkerName};
//! use marksync_renderer::{PatchOutcome, SectionContext, SectionPatcher};
//!
//! fn refresh(document: &str) {
//!     let patcher = SectionPatcher::new().expect("embedded template");
//!     let ctx = SectionContext::new(&ActivityFact::now_local(), "success");
//!     let markers = [MarkerName::from("AUTO_SECTION")];
//!     match patcher.patch(document, "README.md", &markers, &ctx) {
//!         Ok(PatchOutcome::Changed { content }) => println!("{content}"),
//!         Ok(PatchOutcome::Unchanged) => println!("nothing to do"),
//!         Err(err) => eprintln!("{err}"),
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod patch;

pub use context::SectionContext;
pub use engine::SectionRenderer;
pub use error::PatchError;
pub use patch::{locate, locate_sections, replace_sections, PatchOutcome, SectionPatcher};
