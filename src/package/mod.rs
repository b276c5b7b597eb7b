//! Package layer
//! - identity.rs: `category/name-version[-rN]` splitting
//! - version.rs: version grammar and ordering
//! - query.rs: PackageQuery trait and PackageRecord
//! - index.rs: JSON file backed PackageQuery implementation

pub mod identity;
pub mod index;
pub mod query;
pub mod version;

pub use identity::PackageIdentity;
pub use index::PackageIndex;
pub use query::{PackageQuery, PackageRecord};
pub use version::Version;
