//! Slice partitioning: which records a given reader or writer instance
//! keeps, and where None records go.

use crate::error::{Error, Result};

/// The `(sliceno, slices, spread_None)` triple configuring horizontal
/// partitioning. A record with canonical hash `h` belongs to slice
/// `h % slices`; an instance keeps exactly the records of its own slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashFilter {
    /// This instance's partition index, `0 <= sliceno < slices`.
    pub sliceno: u32,
    /// Total partition count.
    pub slices: u32,
    /// Round-robin None records over all slices instead of pinning them
    /// to slice 0.
    pub spread_none: bool,
}

impl HashFilter {
    /// A filter keeping slice `sliceno` of `slices`, with Nones pinned to
    /// slice 0.
    pub fn new(sliceno: u32, slices: u32) -> Self {
        HashFilter {
            sliceno,
            slices,
            spread_none: false,
        }
    }

    /// Same, but with None records spread round-robin over the slices.
    pub fn with_spread_none(sliceno: u32, slices: u32) -> Self {
        HashFilter {
            sliceno,
            slices,
            spread_none: true,
        }
    }

    fn validate(self) -> Result<Self> {
        if self.slices == 0 || self.sliceno >= self.slices {
            return Err(Error::Config(format!(
                "Bad hashfilter ({}, {})",
                self.sliceno, self.slices
            )));
        }
        Ok(self)
    }
}

impl From<(u32, u32)> for HashFilter {
    fn from((sliceno, slices): (u32, u32)) -> Self {
        HashFilter::new(sliceno, slices)
    }
}

impl From<(u32, u32, bool)> for HashFilter {
    fn from((sliceno, slices, spread_none): (u32, u32, bool)) -> Self {
        HashFilter {
            sliceno,
            slices,
            spread_none,
        }
    }
}

/// Per-instance slicing state: the validated filter plus the None
/// counter that drives spread-None round-robin.
#[derive(Clone, Debug, Default)]
pub(crate) struct Slicer {
    filter: Option<HashFilter>,
    // Doubles as the spread flag in the original; starts at 1 when
    // spreading so the first None lands on slice 1 % slices.
    spread_counter: u64,
}

impl Slicer {
    pub(crate) fn new(filter: Option<HashFilter>) -> Result<Self> {
        let filter = filter.map(HashFilter::validate).transpose()?;
        let spread_counter = match filter {
            Some(f) if f.spread_none => 1,
            _ => 0,
        };
        Ok(Slicer {
            filter,
            spread_counter,
        })
    }

    pub(crate) fn filter(&self) -> Option<HashFilter> {
        self.filter
    }

    pub(crate) fn is_active(&self) -> bool {
        self.filter.is_some()
    }

    /// Whether a record hashing to `h` belongs to this instance. Always
    /// true when no filter is configured.
    pub(crate) fn keeps(&self, h: u64) -> bool {
        match self.filter {
            Some(f) => h % f.slices as u64 == f.sliceno as u64,
            None => true,
        }
    }

    /// Whether the next None record belongs to this instance, advancing
    /// the round-robin counter only when `advance` is set (writers
    /// advance on `write`, not on `hashcheck`).
    pub(crate) fn keeps_none(&mut self, advance: bool) -> bool {
        let Some(f) = self.filter else { return true };
        if f.spread_none {
            let slice = self.spread_counter % f.slices as u64;
            if advance {
                self.spread_counter += 1;
            }
            slice == f.sliceno as u64
        } else {
            f.sliceno == 0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_tuples() {
        assert!(Slicer::new(Some(HashFilter::new(0, 0))).is_err());
        assert!(Slicer::new(Some(HashFilter::new(3, 3))).is_err());
        assert!(Slicer::new(Some(HashFilter::new(2, 3))).is_ok());
        assert!(Slicer::new(None).is_ok());
    }

    #[test]
    fn unfiltered_keeps_everything() {
        let mut s = Slicer::new(None).unwrap();
        assert!(s.keeps(12345));
        assert!(s.keeps_none(true));
    }

    #[test]
    fn nones_pin_to_slice_zero() {
        let mut s0 = Slicer::new(Some(HashFilter::new(0, 3))).unwrap();
        let mut s1 = Slicer::new(Some(HashFilter::new(1, 3))).unwrap();
        for _ in 0..4 {
            assert!(s0.keeps_none(true));
            assert!(!s1.keeps_none(true));
        }
    }

    #[test]
    fn spread_none_round_robins() {
        let mut counts = [0u32; 3];
        let mut slicers: Vec<Slicer> = (0..3)
            .map(|i| Slicer::new(Some(HashFilter::with_spread_none(i, 3))).unwrap())
            .collect();
        for _ in 0..10 {
            for (i, s) in slicers.iter_mut().enumerate() {
                if s.keeps_none(true) {
                    counts[i] += 1;
                }
            }
        }
        let max = counts.iter().max().unwrap();
        let min = counts.iter().min().unwrap();
        assert!(max - min <= 1, "spread counts {:?}", counts);
        assert_eq!(counts.iter().sum::<u32>(), 10);
    }

    #[test]
    fn hashcheck_does_not_advance() {
        let mut s = Slicer::new(Some(HashFilter::with_spread_none(1, 2))).unwrap();
        // Counter starts at 1, so slice 1 owns the first None.
        assert!(s.keeps_none(false));
        assert!(s.keeps_none(false));
        assert!(s.keeps_none(true));
        assert!(!s.keeps_none(true));
    }
}
