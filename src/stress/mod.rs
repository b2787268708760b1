//! Post-hoc stress-factor adjustment of the EOL estimate.
//!
//! This is a simple scalar derating, not a physical model: faster charging
//! and hotter operation both shorten the estimated life by dividing the EOL
//! cycle count by
//!
//! `fast_charge_rate × (1 + 0.02 · (temperature_c − 25))`
//!
//! i.e. a 2% penalty per degree above the 25 °C reference, scaled by C-rate.
//! When no EOL crossing was found, the adjusted life is unavailable too; it
//! is never substituted with 0.

use crate::domain::{EolPrediction, StressFactors};
use crate::error::AppError;

/// Reference temperature at which no thermal derating applies.
pub const REFERENCE_TEMPERATURE_C: f64 = 25.0;

/// Thermal derating slope per degree Celsius above reference.
pub const TEMPERATURE_SLOPE: f64 = 0.02;

impl StressFactors {
    /// Combined derating divisor.
    pub fn derating_factor(&self) -> f64 {
        self.fast_charge_rate
            * (1.0 + TEMPERATURE_SLOPE * (self.temperature_c - REFERENCE_TEMPERATURE_C))
    }

    /// Validate the factors as they come from user input.
    ///
    /// The charge rate is a C-rate multiplier (>= 1), and the combined
    /// divisor must be positive for the adjustment to be meaningful.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.fast_charge_rate.is_finite() && self.fast_charge_rate >= 1.0) {
            return Err(AppError::contract(format!(
                "Invalid fast-charge rate {} (must be >= 1C).",
                self.fast_charge_rate
            )));
        }
        if !self.temperature_c.is_finite() {
            return Err(AppError::contract("Temperature must be finite."));
        }
        if !(self.derating_factor() > 0.0) {
            return Err(AppError::contract(format!(
                "Stress derating factor {:.3} is not positive; check temperature/rate inputs.",
                self.derating_factor()
            )));
        }
        Ok(())
    }
}

/// Adjusted cycle life under the given stress, or `None` when the EOL
/// prediction itself is unavailable.
pub fn adjusted_life(eol: &EolPrediction, stress: &StressFactors) -> Option<f64> {
    let cycle = eol.cycle()?;
    Some(f64::from(cycle) / stress.derating_factor())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_adjustment_value() {
        // 1000 cycles at 2C and 35 °C: 1000 / (2 × 1.2) ≈ 416.7.
        let stress = StressFactors {
            fast_charge_rate: 2.0,
            temperature_c: 35.0,
        };
        let adjusted = adjusted_life(&EolPrediction::Found { cycle: 1000 }, &stress).unwrap();
        assert!((adjusted - 1000.0 / 2.4).abs() < 1e-9);
        assert_eq!(adjusted.floor() as u32, 416);
    }

    #[test]
    fn no_derating_at_reference_conditions() {
        let stress = StressFactors {
            fast_charge_rate: 1.0,
            temperature_c: 25.0,
        };
        let adjusted = adjusted_life(&EolPrediction::Found { cycle: 500 }, &stress).unwrap();
        assert!((adjusted - 500.0).abs() < 1e-12);
    }

    #[test]
    fn unavailable_eol_stays_unavailable() {
        let stress = StressFactors {
            fast_charge_rate: 3.0,
            temperature_c: 45.0,
        };
        assert_eq!(adjusted_life(&EolPrediction::NotFound, &stress), None);
    }

    #[test]
    fn validation_rejects_sub_1c_rate_and_zero_divisor() {
        let slow = StressFactors {
            fast_charge_rate: 0.5,
            temperature_c: 25.0,
        };
        assert!(slow.validate().is_err());

        // 1 + 0.02·(T−25) hits zero at T = −25 °C.
        let frozen = StressFactors {
            fast_charge_rate: 1.0,
            temperature_c: -25.0,
        };
        assert!(frozen.validate().is_err());

        let ok = StressFactors {
            fast_charge_rate: 2.0,
            temperature_c: 35.0,
        };
        assert!(ok.validate().is_ok());
    }
}
