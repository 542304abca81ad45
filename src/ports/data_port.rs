use crate::domain::error::EngineError;
use crate::domain::series::OhlcvSeries;

/// Supplies the bar table an execution runs over.
pub trait BarSource {
    fn load(&self) -> Result<OhlcvSeries, EngineError>;
}
