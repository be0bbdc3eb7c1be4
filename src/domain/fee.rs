//! Per-asset fee rates assigned by risk bucket.

use super::error::NavsimError;

/// Two disjoint asset name lists, each mapped to one scalar fee rate.
/// Every panel asset must land in exactly one bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeSchedule {
    pub high_risk: Vec<String>,
    pub high_risk_rate: f64,
    pub low_risk: Vec<String>,
    pub low_risk_rate: f64,
}

impl FeeSchedule {
    /// Uniform zero-fee schedule covering `assets`.
    pub fn zero(assets: &[String]) -> Self {
        FeeSchedule {
            high_risk: assets.to_vec(),
            high_risk_rate: 0.0,
            low_risk: Vec::new(),
            low_risk_rate: 0.0,
        }
    }

    /// Resolve one fee rate per asset, in `assets` order.
    ///
    /// Duplicate or missing membership is a hard configuration error,
    /// reported before any simulation work begins.
    pub fn rates_for(&self, assets: &[String]) -> Result<Vec<f64>, NavsimError> {
        let duplicates: Vec<&str> = self
            .high_risk
            .iter()
            .filter(|a| self.low_risk.contains(a))
            .map(|a| a.as_str())
            .collect();
        if !duplicates.is_empty() {
            return Err(NavsimError::DuplicateRiskAssignment {
                assets: duplicates.join(", "),
            });
        }

        let unassigned: Vec<&str> = assets
            .iter()
            .filter(|a| !self.high_risk.contains(a) && !self.low_risk.contains(a))
            .map(|a| a.as_str())
            .collect();
        if !unassigned.is_empty() {
            return Err(NavsimError::UnassignedRisk {
                assets: unassigned.join(", "),
            });
        }

        Ok(assets
            .iter()
            .map(|a| {
                if self.high_risk.contains(a) {
                    self.high_risk_rate
                } else {
                    self.low_risk_rate
                }
            })
            .collect())
    }
}
