//! Report generation port trait.

use crate::domain::error::StocklensError;
use crate::domain::report::ReportBundle;

/// Port for writing forecast reports.
pub trait ReportPort {
    fn write(&self, bundle: &ReportBundle, output_path: &str) -> Result<(), StocklensError>;
}
