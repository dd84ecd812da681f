use crate::config::StrategyKind;

/// Contiguous strategy blocks covering a fixed round budget. Boundaries are
/// computed once; when the budget does not divide evenly the earliest blocks
/// take one extra round each.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RotationSchedule {
    total_rounds: usize,
    /// Exclusive end round index of each block, paired with its strategy.
    blocks: Vec<(usize, StrategyKind)>,
}

impl RotationSchedule {
    pub fn new(total_rounds: usize, strategies: &[StrategyKind]) -> Self {
        let mut blocks = Vec::with_capacity(strategies.len());
        if !strategies.is_empty() {
            let base = total_rounds / strategies.len();
            let extra = total_rounds % strategies.len();
            let mut end = 0;
            for (i, strategy) in strategies.iter().enumerate() {
                end += base + usize::from(i < extra);
                blocks.push((end, *strategy));
            }
        }

        Self {
            total_rounds,
            blocks,
        }
    }

    /// Closest, RandomTarget, then Ambush in equal thirds.
    pub fn three_way(total_rounds: usize) -> Self {
        Self::new(total_rounds, &StrategyKind::ROTATION)
    }

    pub fn total_rounds(&self) -> usize {
        self.total_rounds
    }

    /// Strategy for the 0-based `round`, or `None` past the budget.
    pub fn strategy_for(&self, round: usize) -> Option<StrategyKind> {
        self.blocks
            .iter()
            .find(|(end, _)| round < *end)
            .map(|(_, strategy)| *strategy)
    }

    /// Half-open round index range of each block.
    pub fn block_ranges(
        &self,
    ) -> impl Iterator<Item = (std::ops::Range<usize>, StrategyKind)> + '_ {
        let mut start = 0;
        self.blocks.iter().map(move |(end, strategy)| {
            let range = start..*end;
            start = *end;
            (range, *strategy)
        })
    }
}
