pub mod duplicates;
pub mod handlers;
pub mod merge;
pub mod similarity;
