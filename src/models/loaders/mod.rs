pub mod unit_loader;

pub use unit_loader::{load_all_units, load_unit, ExtractionUnit};
