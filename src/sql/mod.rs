//! Safe SQL construction: identifiers from schema/config only, values as parameters.

pub mod builder;
pub mod params;
pub mod row;

pub use builder::{delete, insert, order_by, qualified, quoted, select, select_page, update, SqlQuery};
pub use params::BindValue;
pub use row::record_from_row;
