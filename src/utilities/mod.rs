//! Small shared helpers.

pub mod string_utils;
