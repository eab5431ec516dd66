//! Assertion helpers over captured responses and the database.
//!
//! These panic on mismatch, the way test assertions do.

mod database;
mod json;
mod response;

pub use database::{assert_row_count, assert_row_exists};
pub use json::{
    JsonShape, ShapeEntry, assert_json_structure, assert_json_structure_in, check_structure,
};
pub use response::{assert_header, assert_status};
