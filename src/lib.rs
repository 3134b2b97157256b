// biorank: rank biographical records against target and avoid taxonomies
//
// This is the library root. Each module corresponds to one stage of the
// scoring pipeline, leaves first.

pub mod config;
pub mod embeddings;
pub mod output;
pub mod pipeline;
pub mod records;
pub mod scoring;
pub mod status;
pub mod summary;
pub mod taxonomy;
pub mod text;
