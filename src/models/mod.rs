pub mod loaders;
pub mod mark_type;
pub mod markscheme;

pub use loaders::{load_all_units, load_unit, ExtractionUnit};
pub use mark_type::MarkType;
pub use markscheme::{CanonicalResponse, MarkSchemeSummary, MarkingPoint, Part, QuestionMap};
