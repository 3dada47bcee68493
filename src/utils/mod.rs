pub mod address;
pub mod table;
