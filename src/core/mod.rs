pub mod record;
pub mod repository;
pub mod traits;

pub use record::Record;
pub use repository::{ListColumn, ListItem, Repository, ResourceQuery};
pub use traits::{Resource, relation_values};
