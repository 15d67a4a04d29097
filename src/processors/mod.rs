pub mod field_deriver;
pub mod partitioner;
pub mod pipeline;
pub mod run_report;
pub mod spatial_filter;

pub use field_deriver::{FieldDeriver, Measurements};
pub use partitioner::Partitioner;
pub use pipeline::GroupAndConvertPipeline;
pub use run_report::{CountrySummary, GroupSummary, RunReport};
pub use spatial_filter::{CountryMatch, SpatialFilter, StagingSelection};
