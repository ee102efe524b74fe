pub mod extraction_flow;
pub mod unit_ctx;

pub use extraction_flow::ExtractionFlow;
pub use unit_ctx::UnitCtx;
