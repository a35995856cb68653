use super::ConfigError;

/// Largest number of doublings [`CapacityLadder::doubling`] will produce
pub const MAX_DOUBLINGS: u32 = 24;

/// The ordered set of bucket counts a table may have.
///
/// Steps are strictly increasing and never zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityLadder {
    steps: Vec<usize>,
}

impl CapacityLadder {
    /// Builds a ladder from arbitrary steps, sorting and deduplicating them
    pub fn new(steps: impl IntoIterator<Item = usize>) -> Result<Self, ConfigError> {
        let mut steps: Vec<usize> = steps.into_iter().collect();
        if steps.is_empty() {
            return Err(ConfigError::EmptyLadder);
        }
        if steps.contains(&0) {
            return Err(ConfigError::ZeroCapacity);
        }

        steps.sort_unstable();
        steps.dedup();

        Ok(Self { steps })
    }

    /// `initial, 2 * initial, 4 * initial, ...`, stopping after
    /// [`MAX_DOUBLINGS`] steps or before overflowing `isize::MAX`
    pub fn doubling(initial: usize) -> Result<Self, ConfigError> {
        if initial == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        let steps = std::iter::successors(Some(initial), |&cap| {
            cap.checked_mul(2).filter(|&next| next <= isize::MAX as usize)
        })
        .take(MAX_DOUBLINGS as usize + 1)
        .collect();

        Ok(Self { steps })
    }

    pub fn min(&self) -> usize {
        self.steps[0]
    }

    pub fn max(&self) -> usize {
        self.steps[self.steps.len() - 1]
    }

    pub fn steps(&self) -> &[usize] {
        &self.steps
    }

    pub fn contains(&self, capacity: usize) -> bool {
        self.steps.binary_search(&capacity).is_ok()
    }

    /// The step right above `capacity`, if there is one
    pub fn next_up(&self, capacity: usize) -> Option<usize> {
        let i = self.steps.partition_point(|&step| step <= capacity);
        self.steps.get(i).copied()
    }

    /// The step right below `capacity`, if there is one
    pub fn next_down(&self, capacity: usize) -> Option<usize> {
        let i = self.steps.partition_point(|&step| step < capacity);
        i.checked_sub(1).map(|i| self.steps[i])
    }
}

/// Everything needed to build a [`super::ChainedHashMap`]
#[derive(Debug, Clone, PartialEq)]
pub struct TableConfig {
    pub ladder: CapacityLadder,
    /// Starting bucket count, the smallest ladder step when `None`
    pub initial_capacity: Option<usize>,
    /// Grow one step once `size / capacity` goes above this
    pub upper_load_factor: f32,
    /// Shrink one step once `size / capacity` goes below this
    pub lower_load_factor: f32,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            ladder: CapacityLadder {
                steps: vec![209, 1021, 2039],
            },
            initial_capacity: None,
            upper_load_factor: 0.75,
            lower_load_factor: 0.20,
        }
    }
}

impl TableConfig {
    pub fn new(
        ladder: CapacityLadder,
        upper_load_factor: f32,
        lower_load_factor: f32,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            ladder,
            initial_capacity: None,
            upper_load_factor,
            lower_load_factor,
        };
        config.validate()?;
        Ok(config)
    }

    /// Starts the table at `initial` instead of the smallest step
    pub fn with_initial_capacity(mut self, initial: usize) -> Result<Self, ConfigError> {
        self.initial_capacity = Some(initial);
        self.validate()?;
        Ok(self)
    }

    /// Checks the invariants a table relies on:
    /// both load factors in `(0, 1)`, `lower < upper`, and a starting
    /// capacity that is one of the ladder steps
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_load_factor("upper", self.upper_load_factor)?;
        check_load_factor("lower", self.lower_load_factor)?;

        if self.upper_load_factor <= self.lower_load_factor {
            return Err(ConfigError::InvertedLoadFactors {
                upper: self.upper_load_factor,
                lower: self.lower_load_factor,
            });
        }

        match self.initial_capacity {
            Some(0) => Err(ConfigError::ZeroCapacity),
            Some(initial) if !self.ladder.contains(initial) => {
                Err(ConfigError::InitialCapacityNotInLadder { initial })
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn starting_capacity(&self) -> usize {
        self.initial_capacity.unwrap_or_else(|| self.ladder.min())
    }
}

fn check_load_factor(which: &'static str, value: f32) -> Result<(), ConfigError> {
    // also rejects NaN
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::LoadFactorOutOfRange { which, value })
    }
}

#[cfg(test)]
mod test {
    use super::{CapacityLadder, MAX_DOUBLINGS, TableConfig};
    use crate::hashmap::ConfigError;

    #[test]
    fn ladder_is_sorted_and_deduplicated() {
        let ladder = CapacityLadder::new([1021, 209, 2039, 209]).unwrap();
        assert_eq!(ladder.steps(), &[209, 1021, 2039]);
        assert_eq!(ladder.min(), 209);
        assert_eq!(ladder.max(), 2039);
    }

    #[test]
    fn ladder_rejects_bad_steps() {
        assert_eq!(CapacityLadder::new([]), Err(ConfigError::EmptyLadder));
        assert_eq!(CapacityLadder::new([4, 0]), Err(ConfigError::ZeroCapacity));
        assert_eq!(CapacityLadder::doubling(0), Err(ConfigError::ZeroCapacity));
    }

    #[test]
    fn ladder_walk() {
        let ladder = CapacityLadder::new([4, 8, 16]).unwrap();

        assert_eq!(ladder.next_up(4), Some(8));
        assert_eq!(ladder.next_up(8), Some(16));
        assert_eq!(ladder.next_up(16), None);

        assert_eq!(ladder.next_down(16), Some(8));
        assert_eq!(ladder.next_down(8), Some(4));
        assert_eq!(ladder.next_down(4), None);

        assert!(ladder.contains(8));
        assert!(!ladder.contains(5));
    }

    #[test]
    fn doubling_ladder() {
        let ladder = CapacityLadder::doubling(11).unwrap();
        assert_eq!(&ladder.steps()[..4], &[11, 22, 44, 88]);
        assert_eq!(ladder.steps().len(), MAX_DOUBLINGS as usize + 1);

        // stops before overflowing
        let huge = CapacityLadder::doubling(isize::MAX as usize / 2 + 1).unwrap();
        assert_eq!(huge.steps().len(), 1);
    }

    #[test]
    fn config_validation() {
        let ladder = CapacityLadder::new([4, 8]).unwrap();

        assert!(TableConfig::new(ladder.clone(), 0.75, 0.25).is_ok());
        assert_eq!(
            TableConfig::new(ladder.clone(), 0.25, 0.75),
            Err(ConfigError::InvertedLoadFactors {
                upper: 0.25,
                lower: 0.75
            })
        );
        assert_eq!(
            TableConfig::new(ladder.clone(), 0.5, 0.5),
            Err(ConfigError::InvertedLoadFactors {
                upper: 0.5,
                lower: 0.5
            })
        );
        assert_eq!(
            TableConfig::new(ladder.clone(), 1.0, 0.25),
            Err(ConfigError::LoadFactorOutOfRange {
                which: "upper",
                value: 1.0
            })
        );
        assert_eq!(
            TableConfig::new(ladder.clone(), 0.75, 0.0),
            Err(ConfigError::LoadFactorOutOfRange {
                which: "lower",
                value: 0.0
            })
        );
        assert!(matches!(
            TableConfig::new(ladder.clone(), f32::NAN, 0.25),
            Err(ConfigError::LoadFactorOutOfRange { which: "upper", .. })
        ));

        let config = TableConfig::new(ladder, 0.75, 0.25).unwrap();
        assert_eq!(
            config.clone().with_initial_capacity(5),
            Err(ConfigError::InitialCapacityNotInLadder { initial: 5 })
        );
        assert_eq!(
            config.clone().with_initial_capacity(0),
            Err(ConfigError::ZeroCapacity)
        );
        assert_eq!(
            config.with_initial_capacity(8).unwrap().starting_capacity(),
            8
        );
    }

    #[test]
    fn default_config_is_valid() {
        let config = TableConfig::default();
        config.validate().unwrap();
        assert_eq!(config.starting_capacity(), 209);
    }
}
