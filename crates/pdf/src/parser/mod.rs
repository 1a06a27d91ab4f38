pub mod backend;
pub mod flat;
pub mod layout;
pub mod normalize;
