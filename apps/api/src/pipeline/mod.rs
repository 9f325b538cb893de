pub mod apply;
pub mod handlers;
pub mod ordering;
pub mod sync;
