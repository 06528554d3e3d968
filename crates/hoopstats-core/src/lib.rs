// Library root: box-score data model, dataset loading, and the statistics
// derivation engine.

pub mod analytics;
pub mod cache;
pub mod dataset;
pub mod model;
pub mod roster;
