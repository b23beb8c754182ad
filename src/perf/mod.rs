pub mod benchmark;
pub mod measure;
