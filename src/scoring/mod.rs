// Scoring engine: per-category signals and their aggregation.

pub mod aggregate;
pub mod category;
pub mod record;
