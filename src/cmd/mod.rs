pub mod prepare;
pub mod rules;
