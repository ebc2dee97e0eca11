//! Load cases and load combinations

mod load_case;
mod load_combo;

pub use load_case::LoadCase;
pub use load_combo::LoadCombination;
