//! Author-name normalization and the variant-name / title lookup tables
//! used to match bibliographic records.

pub mod lookup;
pub mod normalize;

pub use lookup::{
    AuthorRecord, AuthorRow, Lookups, WorkRecord, WorkRow, build_lookups, load_lookups,
    read_authors, read_works,
};
pub use normalize::normalize_name;
