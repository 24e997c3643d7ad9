//! # Query translation
//!
//! Turns context options into Sea-ORM query clauses.
//!
//! ## Filters
//!
//! ```text
//! title            title LIKE '%v%'
//! title!           title = v
//! title|body!      title LIKE '%v%' OR body = v
//! first+last       CONCAT_WS(' ', first, last) LIKE '%v%'
//! user.name        EXISTS (SELECT 1 FROM users WHERE users.id = posts.user_id AND users.name LIKE '%v%')
//! posts.comments.body!   nested EXISTS, one per relation hop
//! ```
//!
//! List values match any element. Falsy values (`null`, `false`, `0`, `""`,
//! `"0"`, empty lists and maps) are ignored.
//!
//! ## Sorting
//!
//! `column` or `relation.column`; the latter orders by a correlated
//! `LIMIT 1` subquery against the related table.
//!
//! ## Eager loading
//!
//! Requested relation names are intersected with an allow-list and extended
//! with mandatory defaults.

pub mod conditions;
pub mod include;
pub mod path;
pub mod sort;

pub use conditions::filter_condition;
pub use include::{AllowedWith, eager_relations};
pub use path::{FieldPath, FilterKey, Matching, Target};
pub use sort::{SortOrder, apply_sort, sort_expression};
