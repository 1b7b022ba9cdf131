//! Quota map: partition of `[0, N)` into per-category rank intervals.
//!
//! Category `c` owns `[offset(c), offset(c) + quota(c))`, where `offset` is the
//! prefix sum of the quotas ordered before it. Composing the keyed permutation
//! of `[0, N)` with this partition gives every item exactly one
//! `(category, rank)` and every category exactly `quota` items.

use crate::error::{ConfigError, RangeError};
use crate::{Assignment, Category, CategoryId, ItemIndex, Seed};
use qreveal_permute::{DomainError, FeistelPermutation};
use std::ops::Range;

/// Sorted cumulative boundaries over the category list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuotaMap {
    /// `starts[i]` = offset of `ids[i]`; `starts[0] == 0`.
    starts: Vec<u64>,
    ids: Vec<CategoryId>,
    quotas: Vec<u64>,
    total: u64,
}

impl QuotaMap {
    /// Build from categories in their canonical order.
    ///
    /// # Errors
    /// `EmptyCollection` for an empty list, `ZeroQuota` for a zero quota and
    /// `QuotaOverflow` when the quota sum exceeds `u64`.
    pub fn new(categories: &[Category]) -> Result<Self, ConfigError> {
        if categories.is_empty() {
            return Err(ConfigError::EmptyCollection);
        }
        let mut starts = Vec::with_capacity(categories.len());
        let mut ids = Vec::with_capacity(categories.len());
        let mut quotas = Vec::with_capacity(categories.len());
        let mut total = 0u64;
        for c in categories {
            if c.quota == 0 {
                return Err(ConfigError::ZeroQuota(c.id));
            }
            starts.push(total);
            ids.push(c.id);
            quotas.push(c.quota);
            total = total.checked_add(c.quota).ok_or(ConfigError::QuotaOverflow)?;
        }
        Ok(Self {
            starts,
            ids,
            quotas,
            total,
        })
    }

    /// Size of the permutation domain (sum of quotas).
    #[inline]
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Number of categories.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Always false for a constructed map.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn slot_of(&self, category: CategoryId) -> Option<usize> {
        self.ids.iter().position(|&id| id == category)
    }

    /// Rank interval owned by `category`.
    #[must_use]
    pub fn interval(&self, category: CategoryId) -> Option<Range<u64>> {
        let slot = self.slot_of(category)?;
        Some(self.starts[slot]..self.starts[slot] + self.quotas[slot])
    }

    /// Map a position in `[0, N)` to its category and rank.
    ///
    /// Binary search over the offsets: `O(log k)` for `k` categories.
    #[must_use]
    pub fn locate(&self, position: u64) -> Option<Assignment> {
        if position >= self.total {
            return None;
        }
        let slot = self.starts.partition_point(|&s| s <= position).checked_sub(1)?;
        Some(Assignment {
            category: self.ids[slot],
            rank: position - self.starts[slot],
        })
    }

    /// Inverse of [`Self::locate`].
    ///
    /// # Errors
    /// `UnknownCategory` or `RankOutOfQuota`.
    pub fn position_of(&self, assignment: Assignment) -> Result<u64, RangeError> {
        let slot = self
            .slot_of(assignment.category)
            .ok_or(RangeError::UnknownCategory(assignment.category))?;
        let quota = self.quotas[slot];
        if assignment.rank >= quota {
            return Err(RangeError::RankOutOfQuota {
                category: assignment.category,
                rank: assignment.rank,
                quota,
            });
        }
        Ok(self.starts[slot] + assignment.rank)
    }
}

/// Seed-bound view over a [`QuotaMap`]: the pure assignment function.
///
/// Build once per seed and query as often as needed; nothing is cached per item.
#[derive(Clone, Debug)]
pub struct Assigner<'a> {
    perm: FeistelPermutation,
    map: &'a QuotaMap,
}

impl<'a> Assigner<'a> {
    /// Bind `map` to `seed`.
    ///
    /// # Errors
    /// `EmptyCollection` if the map has no positions.
    pub fn new(seed: &Seed, map: &'a QuotaMap) -> Result<Self, ConfigError> {
        let perm = FeistelPermutation::new(seed, map.total())
            .map_err(|_| ConfigError::EmptyCollection)?;
        Ok(Self { perm, map })
    }

    /// `(category, rank)` of `index`.
    ///
    /// # Errors
    /// `OutsideCollection` when `index ≥ N`.
    pub fn category_of(&self, index: ItemIndex) -> Result<Assignment, RangeError> {
        let position = self.perm.permute(index).map_err(|e| outside(e, index))?;
        self.map.locate(position).ok_or(RangeError::OutsideCollection {
            index: position,
            size: self.map.total(),
        })
    }

    /// Item index holding `assignment`.
    ///
    /// # Errors
    /// `UnknownCategory` or `RankOutOfQuota`.
    pub fn item_of(&self, assignment: Assignment) -> Result<ItemIndex, RangeError> {
        let position = self.map.position_of(assignment)?;
        self.perm
            .unpermute(position)
            .map_err(|e| outside(e, position))
    }
}

fn outside(e: DomainError, index: u64) -> RangeError {
    match e {
        DomainError::OutOfRange { index, size } => RangeError::OutsideCollection { index, size },
        DomainError::Empty => RangeError::OutsideCollection { index, size: 0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AssetTemplate;

    fn cats(quotas: &[u64]) -> Vec<Category> {
        quotas
            .iter()
            .enumerate()
            .map(|(i, &q)| Category {
                id: i as CategoryId,
                name: format!("c{i}"),
                quota: q,
                asset_template: AssetTemplate::new(format!("ipfs://c{i}/")),
            })
            .collect()
    }

    #[test]
    fn locate_walks_boundaries() {
        let m = QuotaMap::new(&cats(&[3, 1, 2])).unwrap();
        assert_eq!(m.total(), 6);
        let got: Vec<(CategoryId, u64)> = (0..6)
            .map(|p| {
                let a = m.locate(p).unwrap();
                (a.category, a.rank)
            })
            .collect();
        assert_eq!(got, vec![(0, 0), (0, 1), (0, 2), (1, 0), (2, 0), (2, 1)]);
        assert!(m.locate(6).is_none());
        assert_eq!(m.interval(2), Some(4..6));
    }

    #[test]
    fn position_of_inverts_locate() {
        let m = QuotaMap::new(&cats(&[5, 7, 1])).unwrap();
        for p in 0..m.total() {
            assert_eq!(m.position_of(m.locate(p).unwrap()).unwrap(), p);
        }
        assert_eq!(
            m.position_of(Assignment { category: 2, rank: 1 }).unwrap_err(),
            RangeError::RankOutOfQuota {
                category: 2,
                rank: 1,
                quota: 1
            }
        );
        assert_eq!(
            m.position_of(Assignment { category: 9, rank: 0 }).unwrap_err(),
            RangeError::UnknownCategory(9)
        );
    }

    #[test]
    fn single_category_spans_domain() {
        let m = QuotaMap::new(&cats(&[10])).unwrap();
        let a = Assigner::new(&[4u8; 32], &m).unwrap();
        let mut ranks: Vec<u64> = (0..10).map(|i| a.category_of(i).unwrap().rank).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn rejects_zero_and_empty() {
        assert_eq!(QuotaMap::new(&[]).unwrap_err(), ConfigError::EmptyCollection);
        assert_eq!(
            QuotaMap::new(&cats(&[2, 0])).unwrap_err(),
            ConfigError::ZeroQuota(1)
        );
        assert_eq!(
            QuotaMap::new(&cats(&[u64::MAX, 1])).unwrap_err(),
            ConfigError::QuotaOverflow
        );
    }

    #[test]
    fn assigner_item_of_roundtrips() {
        let m = QuotaMap::new(&cats(&[4, 4, 2])).unwrap();
        let a = Assigner::new(&[1u8; 32], &m).unwrap();
        for i in 0..10 {
            let asg = a.category_of(i).unwrap();
            assert_eq!(a.item_of(asg).unwrap(), i);
        }
        assert_eq!(
            a.category_of(10).unwrap_err(),
            RangeError::OutsideCollection { index: 10, size: 10 }
        );
    }
}
