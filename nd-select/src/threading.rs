//! Lane-parallel execution for the sort routines.
//!
//! Lanes of a packed staging buffer are independent, so with the
//! `parallel` feature they are handed to rayon's `par_chunks_mut` once the
//! total element count is large enough. Without the feature everything
//! runs on the calling thread.

/// Minimum number of elements before lanes are sorted on the rayon pool.
pub const PARALLEL_LANE_THRESHOLD: usize = 1 << 15;

/// Whether a sort over `total` elements should use the rayon pool.
///
/// Element types with reference hooks always stay on the calling thread.
#[inline]
pub(crate) fn wants_threads(total: usize, has_refs: bool) -> bool {
    cfg!(feature = "parallel") && !has_refs && total > PARALLEL_LANE_THRESHOLD
}

/// Call `f(i, lane)` for every `lane_len`-sized chunk of `buf`.
pub(crate) fn for_each_lane<T, F>(buf: &mut [T], lane_len: usize, threaded: bool, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    if lane_len == 0 {
        return;
    }
    #[cfg(feature = "parallel")]
    {
        if threaded {
            use rayon::prelude::*;
            log::trace!(
                "sorting {} lanes on {} threads",
                buf.len() / lane_len,
                rayon::current_num_threads()
            );
            buf.par_chunks_mut(lane_len)
                .enumerate()
                .for_each(|(i, lane)| f(i, lane));
            return;
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = threaded;
    for (i, lane) in buf.chunks_mut(lane_len).enumerate() {
        f(i, lane);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_or_ref_holding_stays_serial() {
        assert!(!wants_threads(10, false));
        assert!(!wants_threads(PARALLEL_LANE_THRESHOLD * 4, true));
        assert_eq!(
            wants_threads(PARALLEL_LANE_THRESHOLD * 4, false),
            cfg!(feature = "parallel")
        );
    }

    #[test]
    fn test_for_each_lane_visits_every_chunk() {
        let mut buf: Vec<usize> = vec![0; 12];
        for_each_lane(&mut buf, 4, true, |i, lane| lane.fill(i + 1));
        assert_eq!(buf, vec![1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3]);
        for_each_lane(&mut buf, 0, false, |_, _| panic!("empty lanes visited"));
    }
}
