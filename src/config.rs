//! Tunable constants of the blocking scheme.
//!
//! None of these affect results beyond floating-point summation order;
//! they trade cache footprint against packing overhead and parallelism.

use crate::error::{GemmError, Result};

/// Row ceiling for one cache block of C (before rounding up to MR).
pub const DEFAULT_MC_CEILING: usize = 64;

/// Column ceiling for one cache block of C (before rounding up to NR).
pub const DEFAULT_NC_CEILING: usize = 240;

/// Bytes of packed A + packed B one K-chunk may occupy.
pub const DEFAULT_STORAGE_BYTES: usize = 1 << 20;

/// Scratch requests up to this many bytes live on the worker's stack.
pub const DEFAULT_MAX_STACK_BYTES: usize = 1 << 14;

/// KC never drops below this (unless K itself is smaller).
pub const DEFAULT_KC_MIN: usize = 8;

/// Micro-kernel calls per parallel stripe, roughly.
pub const DEFAULT_STRIPE_COST_UNIT: usize = 1024;

/// Upper bound on `mc_ceiling` and `nc_ceiling`. Keeps the blocking
/// arithmetic (`(MC + NC) * 4` and friends) far from overflow.
pub const MAX_CEILING: usize = 1 << 20;

/// Blocking and scheduling knobs for a [`Gemm`](crate::Gemm) engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GemmConfig {
    pub mc_ceiling: usize,
    pub nc_ceiling: usize,
    pub storage_bytes: usize,
    pub max_stack_bytes: usize,
    pub kc_min: usize,
    pub stripe_cost_unit: usize,
    /// Allow fanning tiles out over the rayon pool. When false every call
    /// runs on the calling thread.
    pub parallel: bool,
}

impl Default for GemmConfig {
    fn default() -> Self {
        Self {
            mc_ceiling: DEFAULT_MC_CEILING,
            nc_ceiling: DEFAULT_NC_CEILING,
            storage_bytes: DEFAULT_STORAGE_BYTES,
            max_stack_bytes: DEFAULT_MAX_STACK_BYTES,
            kc_min: DEFAULT_KC_MIN,
            stripe_cost_unit: DEFAULT_STRIPE_COST_UNIT,
            parallel: true,
        }
    }
}

impl GemmConfig {
    /// Same configuration, single-threaded.
    pub fn serial(self) -> Self {
        Self {
            parallel: false,
            ..self
        }
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("mc_ceiling", self.mc_ceiling),
            ("nc_ceiling", self.nc_ceiling),
            ("storage_bytes", self.storage_bytes),
            ("kc_min", self.kc_min),
            ("stripe_cost_unit", self.stripe_cost_unit),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(GemmError::InvalidConfig(format!("{name} must be positive")));
            }
        }
        let bounded = [("mc_ceiling", self.mc_ceiling), ("nc_ceiling", self.nc_ceiling)];
        for (name, value) in bounded {
            if value > MAX_CEILING {
                return Err(GemmError::InvalidConfig(format!(
                    "{name} is {value}, at most {MAX_CEILING} allowed"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(GemmConfig::default().validate().is_ok());
        assert!(!GemmConfig::default().serial().parallel);
    }

    #[test]
    fn test_zero_knob_rejected() {
        let cfg = GemmConfig {
            kc_min: 0,
            ..GemmConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(GemmError::InvalidConfig("kc_min must be positive".into()))
        );
    }

    #[test]
    fn test_huge_ceiling_rejected() {
        for cfg in [
            GemmConfig {
                mc_ceiling: usize::MAX / 4,
                ..GemmConfig::default()
            },
            GemmConfig {
                nc_ceiling: MAX_CEILING + 1,
                ..GemmConfig::default()
            },
        ] {
            assert!(matches!(cfg.validate(), Err(GemmError::InvalidConfig(_))));
        }

        let at_limit = GemmConfig {
            mc_ceiling: MAX_CEILING,
            nc_ceiling: MAX_CEILING,
            ..GemmConfig::default()
        };
        assert!(at_limit.validate().is_ok());
    }
}
