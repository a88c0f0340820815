pub mod matrix_profile;
pub mod normalization;
