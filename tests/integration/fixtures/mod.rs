pub mod git;
pub mod transcript;
