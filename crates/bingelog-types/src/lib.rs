pub mod claim;
pub mod general;
pub mod utils;
