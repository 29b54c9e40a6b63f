pub mod recruiting;
pub mod visit;
