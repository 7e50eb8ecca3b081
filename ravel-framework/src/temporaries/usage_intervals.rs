use crate::{ImageDescription, ImageHandle, TemporaryImageId};
use fnv::FnvHashMap;

/// Indices of the first and last pass (inclusive) that reference a temporary image
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UsageInterval {
    pub first_use: usize,
    pub last_use: usize,
}

impl UsageInterval {
    pub fn overlaps(
        &self,
        other: &UsageInterval,
    ) -> bool {
        self.first_use <= other.last_use && other.first_use <= self.last_use
    }
}

/// Bookkeeping for one image in the temporary pool
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolSlotUsage {
    pub description: ImageDescription,
    /// Last pass this frame that uses the image, None if unused so far this frame
    pub last_used_pass_index: Option<usize>,
    pub used_this_frame: bool,
}

impl PoolSlotUsage {
    fn is_free_for(
        &self,
        description: &ImageDescription,
        first_use: usize,
    ) -> bool {
        let previous_use_ended = self
            .last_used_pass_index
            .map_or(true, |last_used| last_used < first_use);
        previous_use_ended && self.description == *description
    }
}

/// Finds the interval of passes each temporary image is used in. `passes` yields, for each pass
/// in declaration order, the images it references. Temporaries come back ordered by the pass
/// that first references them.
pub fn compute_usage_intervals<P, I>(passes: P) -> Vec<(TemporaryImageId, UsageInterval)>
where
    P: IntoIterator<Item = I>,
    I: IntoIterator<Item = ImageHandle>,
{
    let mut intervals: Vec<(TemporaryImageId, UsageInterval)> = Vec::default();
    let mut lookup = FnvHashMap::<TemporaryImageId, usize>::default();

    for (pass_index, images) in passes.into_iter().enumerate() {
        for image in images {
            let temporary = match image {
                ImageHandle::Temporary(temporary) => temporary,
                ImageHandle::Persistent(_) => continue,
            };

            match lookup.get(&temporary) {
                Some(&i) => intervals[i].1.last_use = pass_index,
                None => {
                    lookup.insert(temporary, intervals.len());
                    intervals.push((
                        temporary,
                        UsageInterval {
                            first_use: pass_index,
                            last_use: pass_index,
                        },
                    ));
                }
            }
        }
    }

    intervals
}

/// Binds each temporary to a pool slot. A slot is reused only if its description is equal and
/// its last use this frame ends strictly before the temporary's first use; the first such slot
/// wins. Otherwise a new slot is appended to `pool`.
///
/// `descriptions` is indexed by the temporary's index. Returns the slot index for each entry of
/// `intervals`.
pub fn assign_allocations(
    intervals: &[(TemporaryImageId, UsageInterval)],
    descriptions: &[ImageDescription],
    pool: &mut Vec<PoolSlotUsage>,
) -> Vec<usize> {
    let mut assignments = Vec::with_capacity(intervals.len());

    for (temporary, interval) in intervals {
        let description = &descriptions[temporary.index() as usize];
        let existing = pool
            .iter()
            .position(|slot| slot.is_free_for(description, interval.first_use));

        let slot_index = match existing {
            Some(slot_index) => {
                log::trace!(
                    "  Temporary {:?} {:?} - REUSE pool slot {}",
                    temporary,
                    interval,
                    slot_index
                );
                slot_index
            }
            None => {
                log::trace!(
                    "  Temporary {:?} {:?} - CREATE pool slot {}",
                    temporary,
                    interval,
                    pool.len()
                );
                pool.push(PoolSlotUsage {
                    description: description.clone(),
                    last_used_pass_index: None,
                    used_this_frame: false,
                });
                pool.len() - 1
            }
        };

        let slot = &mut pool[slot_index];
        slot.used_this_frame = true;
        slot.last_used_pass_index = Some(interval.last_use);
        assignments.push(slot_index);
    }

    assignments
}

#[cfg(test)]
mod tests {
    use super::*;
    use ravel_api::{RavelFormat, RavelTextureUsage};

    fn description(width: u32) -> ImageDescription {
        ImageDescription::new_2d(
            RavelFormat::R16G16B16A16_SFLOAT,
            width,
            width,
            RavelTextureUsage::SAMPLED | RavelTextureUsage::STORAGE,
        )
    }

    fn temporary(index: u32) -> ImageHandle {
        ImageHandle::Temporary(TemporaryImageId::new(index, 0))
    }

    // Builds a pass list in which each temporary is referenced exactly at the ends of its interval
    fn passes_for(
        pass_count: usize,
        usages: &[(u32, usize, usize)],
    ) -> Vec<Vec<ImageHandle>> {
        let mut passes = vec![Vec::default(); pass_count];
        for &(index, first, last) in usages {
            passes[first].push(temporary(index));
            passes[last].push(temporary(index));
        }
        passes
    }

    fn assign(
        passes: Vec<Vec<ImageHandle>>,
        descriptions: &[ImageDescription],
        pool: &mut Vec<PoolSlotUsage>,
    ) -> FnvHashMap<u32, usize> {
        let intervals = compute_usage_intervals(passes);
        let assignments = assign_allocations(&intervals, descriptions, pool);
        intervals
            .iter()
            .zip(assignments)
            .map(|((temporary, _), slot)| (temporary.index(), slot))
            .collect()
    }

    #[test]
    fn test_compute_usage_intervals() {
        let passes = vec![
            vec![temporary(1)],
            vec![ImageHandle::Persistent(0), temporary(0)],
            vec![temporary(1), temporary(0), temporary(1)],
            vec![],
        ];

        let intervals = compute_usage_intervals(passes);
        assert_eq!(
            intervals,
            vec![
                (
                    TemporaryImageId::new(1, 0),
                    UsageInterval {
                        first_use: 0,
                        last_use: 2
                    }
                ),
                (
                    TemporaryImageId::new(0, 0),
                    UsageInterval {
                        first_use: 1,
                        last_use: 2
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_disjoint_intervals_share_a_slot() {
        // T1 over [0, 2] and T2 over [3, 5]
        let descriptions = vec![description(64), description(64)];
        let mut pool = Vec::default();
        let slots = assign(
            passes_for(6, &[(0, 0, 2), (1, 3, 5)]),
            &descriptions,
            &mut pool,
        );

        assert_eq!(slots[&0], slots[&1]);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_overlapping_intervals_get_different_slots() {
        // T1 over [0, 5] and T2 over [2, 3]
        let descriptions = vec![description(64), description(64)];
        let mut pool = Vec::default();
        let slots = assign(
            passes_for(6, &[(0, 0, 5), (1, 2, 3)]),
            &descriptions,
            &mut pool,
        );

        assert_ne!(slots[&0], slots[&1]);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_touching_intervals_do_not_share() {
        // T2 starts in the pass T1 ends in
        let descriptions = vec![description(64), description(64)];
        let mut pool = Vec::default();
        let slots = assign(
            passes_for(4, &[(0, 0, 2), (1, 2, 3)]),
            &descriptions,
            &mut pool,
        );

        assert_ne!(slots[&0], slots[&1]);
    }

    #[test]
    fn test_different_descriptions_never_share() {
        let descriptions = vec![description(64), description(32)];
        let mut pool = Vec::default();
        let slots = assign(
            passes_for(4, &[(0, 0, 1), (1, 2, 3)]),
            &descriptions,
            &mut pool,
        );

        assert_ne!(slots[&0], slots[&1]);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_first_fit() {
        // T0 [0,0] and T1 [1,1] both end before T2 [2,3], which must take the first slot
        let descriptions = vec![description(64), description(64), description(64)];
        let mut pool = vec![
            PoolSlotUsage {
                description: description(64),
                last_used_pass_index: None,
                used_this_frame: false,
            },
            PoolSlotUsage {
                description: description(64),
                last_used_pass_index: None,
                used_this_frame: false,
            },
        ];

        let slots = assign(
            vec![
                vec![temporary(0), temporary(1)],
                vec![temporary(1)],
                vec![temporary(2)],
                vec![temporary(2)],
            ],
            &descriptions,
            &mut pool,
        );

        assert_eq!(slots[&0], 0);
        assert_eq!(slots[&1], 1);
        assert_eq!(slots[&2], 0);
        assert_eq!(pool[0].last_used_pass_index, Some(3));
        assert!(pool.iter().all(|x| x.used_this_frame));
    }

    #[test]
    fn test_no_aliasing_on_overlap_exhaustive() {
        // Every pair of intervals over 5 passes, with equal descriptions
        let mut all_intervals = Vec::default();
        for first in 0..5 {
            for last in first..5 {
                all_intervals.push((first, last));
            }
        }

        for &(a_first, a_last) in &all_intervals {
            for &(b_first, b_last) in &all_intervals {
                let descriptions = vec![description(16), description(16)];
                let mut pool = Vec::default();
                let slots = assign(
                    passes_for(5, &[(0, a_first, a_last), (1, b_first, b_last)]),
                    &descriptions,
                    &mut pool,
                );

                let a = UsageInterval {
                    first_use: a_first,
                    last_use: a_last,
                };
                let b = UsageInterval {
                    first_use: b_first,
                    last_use: b_last,
                };
                if a.overlaps(&b) {
                    assert_ne!(slots[&0], slots[&1], "{:?} and {:?} alias", a, b);
                } else {
                    assert_eq!(slots[&0], slots[&1], "{:?} and {:?} don't alias", a, b);
                }
            }
        }
    }
}
