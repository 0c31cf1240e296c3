pub mod config;
pub mod qdldl;
