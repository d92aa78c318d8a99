pub mod builder;
pub mod context;
pub mod cursor;
pub mod markers;
pub mod node;
pub mod transforms;
pub mod types;
pub mod visitor;
