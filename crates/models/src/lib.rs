pub mod errors;
pub mod db;
pub mod fields;
pub mod category;
pub mod sub_category;
pub mod product;
