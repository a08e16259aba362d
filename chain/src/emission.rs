use crate::config::EmissionConfig;
use containers::Height;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmissionError {
    #[error("invalid block height: {0}")]
    InvalidHeight(String),
}

/// Conversion of a raw height into the absolute block height used by the
/// reward curve.
///
/// Signed and fractional inputs are normalised with an absolute value.
/// Non-finite floats cannot be normalised and are rejected.
pub trait IntoHeight {
    fn into_height(self) -> Result<Height, EmissionError>;
}

impl IntoHeight for u64 {
    fn into_height(self) -> Result<Height, EmissionError> {
        Ok(self)
    }
}

impl IntoHeight for i64 {
    fn into_height(self) -> Result<Height, EmissionError> {
        Ok(self.unsigned_abs())
    }
}

impl IntoHeight for f64 {
    fn into_height(self) -> Result<Height, EmissionError> {
        if !self.is_finite() {
            return Err(EmissionError::InvalidHeight(self.to_string()));
        }
        Ok(self.abs().trunc() as Height)
    }
}

/// Block reward schedule.
///
/// Rewards start at `offset` and step through `milestones`, each milestone
/// covering `distance` blocks. Past the last milestone its reward applies
/// forever.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmissionSchedule {
    milestones: Vec<u64>,
    distance: u64,
    offset: Height,
    total_amount: u64,
}

impl EmissionSchedule {
    /// Build a schedule. An empty milestone table is treated as a single zero
    /// reward and a zero distance as one block per milestone.
    pub fn new(config: &EmissionConfig) -> Self {
        let milestones = if config.milestones.is_empty() {
            vec![0]
        } else {
            config.milestones.clone()
        };

        Self {
            milestones,
            distance: config.distance.max(1),
            offset: config.offset,
            total_amount: config.total_amount,
        }
    }

    pub fn offset(&self) -> Height {
        self.offset
    }

    pub fn distance(&self) -> u64 {
        self.distance
    }

    /// Index of the milestone active at `height`.
    ///
    /// Heights below the offset map to the first milestone and heights past
    /// the table clamp to the last one.
    pub fn milestone_index(&self, height: impl IntoHeight) -> Result<usize, EmissionError> {
        let height = height.into_height()?;
        Ok(self.index_for(height))
    }

    /// Reward paid to the forger of the block at `height`.
    pub fn reward_at(&self, height: impl IntoHeight) -> Result<u64, EmissionError> {
        let height = height.into_height()?;

        if height < self.offset {
            return Ok(0);
        }
        Ok(self.milestones[self.index_for(height)])
    }

    /// Total coin supply once the chain has reached `height`.
    ///
    /// Every fully completed milestone contributes `distance * reward`; the
    /// milestone in progress contributes the blocks walked so far. Blocks
    /// beyond the end of the table accrue at the last milestone's reward.
    pub fn supply_at(&self, height: impl IntoHeight) -> Result<u64, EmissionError> {
        let height = height.into_height()?;

        if height < self.offset {
            return Ok(self.total_amount);
        }

        let milestone = self.index_for(height);
        let last = self.milestones.len() - 1;
        let mut remaining = height - self.offset;
        let mut supply = self.total_amount;

        for (index, reward) in self.milestones.iter().enumerate() {
            if index > milestone {
                break;
            }

            let amount = if remaining < self.distance {
                remaining % self.distance
            } else {
                remaining -= self.distance;
                if remaining > 0 && index == last {
                    self.distance + remaining
                } else {
                    self.distance
                }
            };

            supply = supply.saturating_add(amount.saturating_mul(*reward));
        }

        Ok(supply)
    }

    fn index_for(&self, height: Height) -> usize {
        let last = self.milestones.len() - 1;
        let location = height.saturating_sub(self.offset) / self.distance;
        usize::try_from(location).map_or(last, |location| location.min(last))
    }
}

impl From<&EmissionConfig> for EmissionSchedule {
    fn from(config: &EmissionConfig) -> Self {
        Self::new(config)
    }
}
