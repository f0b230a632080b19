pub mod galaxy;
pub mod style;
