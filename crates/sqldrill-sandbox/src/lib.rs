pub mod compare;
pub mod dialect;
pub mod errors;
pub mod model;
pub mod namespace;
pub mod providers;
pub mod sandbox;
pub mod schema;
pub mod validate;
