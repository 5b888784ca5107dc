pub mod rating;
pub mod row;
