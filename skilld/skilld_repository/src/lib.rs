//! # skilld repository
//!
//! An in-memory registry of skills (capabilities offered by snaps), slots
//! (places in snaps that consume them) and the grants connecting the two.
//! It enforces name uniqueness within a snap, type compatibility of grants,
//! and refuses to remove a skill or slot that still takes part in a grant.
//!
//! ## Usage Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use skilld_repository::{Repository, Skill, Slot, TestType};
//!
//! let repo = Repository::new();
//! repo.add_type(Arc::new(TestType::new("net"))).unwrap();
//! repo.add_skill(Skill::new("app1", "iface", "net")).unwrap();
//! repo.add_slot(Slot::new("app2", "uplink", "net")).unwrap();
//!
//! repo.grant("app1", "iface", "app2", "uplink").unwrap();
//! assert!(repo.remove_skill("app1", "iface").is_err());
//!
//! let granted = repo.granted_to("app2");
//! assert_eq!(granted[0].0.name, "uplink");
//! assert_eq!(granted[0].1[0].name, "iface");
//!
//! repo.revoke("app1", "iface", "app2", "uplink").unwrap();
//! repo.remove_skill("app1", "iface").unwrap();
//! ```

pub mod grants;
pub mod model;
pub mod repository;
pub mod skill_type;

pub use grants::GrantIndex;
pub use model::{Skill, Slot};
pub use repository::{Repository, SkillGrants, SlotGrants};
pub use skill_type::{SkillType, TestType};

pub use skilld_core::error::{EntityKind, ErrorClass, ErrorKind, Operation, RepositoryError};
pub use skilld_core::key::{SkillKey, SlotKey};
