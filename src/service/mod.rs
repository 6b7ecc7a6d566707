pub mod analyzer;
pub mod award;
pub mod coverage;
pub mod mapping_store;
pub mod procurement;
pub mod recommender;
pub mod work_order;
pub mod workspace;

#[cfg(test)]
pub(crate) mod test_support;

pub use award::AwardManager;
pub use coverage::{MappingLookup, QuoteMappings};
pub use mapping_store::MappingStore;
pub use procurement::ProcurementService;
pub use workspace::{DivisionSummary, DivisionWorkspace};
