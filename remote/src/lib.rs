//! Remote access for gsync tools
//!
//! - [`resolver`]: turns `SITE:/logical/path` into a physical access URL using the
//!   site's `lfn-to-pfn` rules
//! - [`tool`]: runs the external transfer tools and captures their output
//! - [`gfal`]: the [`common::storage::Storage`] implementation used by the binaries

pub mod gfal;
pub mod resolver;
pub mod tool;

pub use gfal::GfalStorage;
pub use resolver::{Resolver, RuleTable, SiteRule};
