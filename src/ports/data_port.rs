//! Data access port trait.

use crate::domain::error::NavsimError;
use crate::domain::panel::{PricePanel, WeightSchedule};

/// Source of the two input tables. Gaps in price columns must already be
/// resolved for every actively weighted asset before a backtest runs.
pub trait DataPort {
    fn load_prices(&self) -> Result<PricePanel, NavsimError>;
    fn load_weights(&self) -> Result<WeightSchedule, NavsimError>;
}
