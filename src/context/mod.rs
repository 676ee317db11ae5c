//! # Search Context
//!
//! Index mapping, the [`Document`] trait, and change replay.
//!
//! ```ignore
//! let mapping = IndexMapping::builder()
//!     .register::<User>()
//!     .register_as::<Order>("orders-v2")
//!     .build();
//! let ctx = SearchContext::new(transport, mapping);
//!
//! let active = ctx.set::<User>()?.filter(Predicate::eq("status", "active")).count()?;
//!
//! let mut changes = ChangeSet::new();
//! changes.create(&new_user)?;
//! let applied = ctx.save_changes(&changes, &cancel).await?;
//! ```

#[allow(clippy::module_inception)]
mod context;
mod mapping;
mod replay;

pub use context::SearchContext;
pub use mapping::{Document, IndexMapping, IndexMappingBuilder};
pub use replay::{ChangeKind, ChangeSet, PendingChange};
