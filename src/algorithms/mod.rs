pub mod chains;
pub mod common;
pub mod distance_profile;
pub mod join;
pub mod motifs;
pub mod tiling;
