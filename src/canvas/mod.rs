pub mod geometry;
pub mod interaction;
pub mod viewport;
