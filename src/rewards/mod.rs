pub mod dto;
pub mod evaluator;
pub mod repo_types;
