//! ERL Linking
//!
//! Resolves mention queries to knowledge-base entities.
//!
//! # Architecture
//!
//! - [`Linker`]: always answers (or fails on a backend error)
//! - [`Resolver`]: may decline, so strategies can be chained
//! - [`ExactMatchLinker`]: exact name lookup with a fallback linker
//! - [`NilLinker`]: per-instance `NIL<n>` placeholder allocation
//! - [`LinkerChain`]: ordered resolvers, first answer wins
//!
//! # Examples
//!
//! ```
//! use erl_domain::{Entity, EntityType, Query};
//! use erl_linker::{Linker, LinkerChain};
//! use erl_store::{EntityStore, StoreConfig};
//!
//! let paris = Entity::builder("E1", "Paris", EntityType::GeoPolitical).build().unwrap();
//! let (store, _) = EntityStore::build_from_entities(":memory:", vec![Ok(paris)], &StoreConfig::default()).unwrap();
//!
//! let chain = LinkerChain::exact_then_nil(store);
//! let hit = chain.link(&Query::new("EL1", "Paris", "doc").unwrap()).unwrap();
//! let miss = chain.link(&Query::new("EL2", "Pariss", "doc").unwrap()).unwrap();
//! assert_eq!(hit.entity_id(), "E1");
//! assert_eq!(miss.entity_id(), "NIL1");
//! ```

#![warn(missing_docs)]

pub mod chain;
pub mod error;
pub mod exact;
pub mod nil;
pub mod output;
pub mod traits;

pub use chain::LinkerChain;
pub use error::LinkError;
pub use exact::ExactMatchLinker;
pub use nil::NilLinker;
pub use output::links_to_output_set;
pub use traits::{Linker, Resolver};
