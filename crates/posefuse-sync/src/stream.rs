use posefuse_3d::transforms::RigidTransform;

/// Error types for the stream module.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum StreamError {
    /// A lookup was requested on a stream without entries.
    #[error("Transform stream is empty")]
    Empty,
}

/// A relative transform sampled at an epoch-millisecond timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedTransform {
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Transform relative to the reference pose.
    pub transform: RigidTransform,
}

/// An ordered sequence of timestamped relative transforms.
///
/// Entries keep the order they were produced in, which is the order of the pose
/// source. The stream is read-only once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformStream {
    entries: Vec<TimedTransform>,
}

impl TransformStream {
    /// Create a stream from entries, keeping their order.
    pub fn new(entries: Vec<TimedTransform>) -> Self {
        Self { entries }
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the stream has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries in stream order.
    pub fn entries(&self) -> &[TimedTransform] {
        &self.entries
    }

    /// Iterate over the entries in stream order.
    pub fn iter(&self) -> std::slice::Iter<'_, TimedTransform> {
        self.entries.iter()
    }

    /// Index of the entry closest in time to `query` by exhaustive scan.
    ///
    /// Ties go to the earliest index.
    pub fn nearest_index(&self, query: i64) -> Result<usize, StreamError> {
        let mut best: Option<(usize, u64)> = None;
        for (idx, entry) in self.entries.iter().enumerate() {
            let delta = entry.timestamp.abs_diff(query);
            match best {
                Some((_, best_delta)) if delta >= best_delta => {}
                _ => best = Some((idx, delta)),
            }
        }
        best.map(|(idx, _)| idx).ok_or(StreamError::Empty)
    }
}

impl FromIterator<TimedTransform> for TransformStream {
    fn from_iter<I: IntoIterator<Item = TimedTransform>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TransformStream {
    type Item = &'a TimedTransform;
    type IntoIter = std::slice::Iter<'a, TimedTransform>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Nearest-in-time lookup of transforms.
pub trait TransformLookup {
    /// The entry whose timestamp is closest to `query`, earliest index on ties.
    fn nearest(&self, query: i64) -> Result<&TimedTransform, StreamError>;

    /// Number of entries available.
    fn len(&self) -> usize;

    /// Whether no entries are available.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The transform closest in time to `query`.
    fn nearest_transform(&self, query: i64) -> Result<RigidTransform, StreamError> {
        self.nearest(query).map(|entry| entry.transform)
    }
}

impl TransformLookup for TransformStream {
    fn nearest(&self, query: i64) -> Result<&TimedTransform, StreamError> {
        let idx = self.nearest_index(query)?;
        Ok(&self.entries[idx])
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Return the transform of `stream` closest in time to `query`.
///
/// Example:
///
/// ```
/// use posefuse_3d::transforms::RigidTransform;
/// use posefuse_sync::stream::{match_nearest, TimedTransform, TransformStream};
///
/// let shifted = RigidTransform::new(RigidTransform::IDENTITY.rotation, [1.0, 0.0, 0.0]);
/// let stream = TransformStream::new(vec![
///     TimedTransform { timestamp: 0, transform: RigidTransform::IDENTITY },
///     TimedTransform { timestamp: 100, transform: shifted },
/// ]);
/// assert_eq!(match_nearest(95, &stream).unwrap(), shifted);
/// ```
pub fn match_nearest(query: i64, stream: &TransformStream) -> Result<RigidTransform, StreamError> {
    stream.nearest_transform(query)
}

/// A time-sorted view of a [`TransformStream`] with logarithmic lookup.
///
/// Answers exactly what the exhaustive scan answers, including the
/// earliest-index tie break, without requiring the stream to be sorted.
#[derive(Debug, Clone)]
pub struct SortedTransformIndex<'a> {
    stream: &'a TransformStream,
    // stream indices ordered by timestamp, equal timestamps by index
    order: Vec<usize>,
}

impl<'a> SortedTransformIndex<'a> {
    /// Build the index over `stream`.
    pub fn new(stream: &'a TransformStream) -> Self {
        let mut order = (0..stream.len()).collect::<Vec<_>>();
        order.sort_by_key(|&idx| stream.entries[idx].timestamp);
        Self { stream, order }
    }

    fn timestamp_at(&self, pos: usize) -> i64 {
        self.stream.entries[self.order[pos]].timestamp
    }

    // first sorted position whose timestamp is not below `ts`
    fn lower_bound(&self, ts: i64) -> usize {
        self.order
            .partition_point(|&idx| self.stream.entries[idx].timestamp < ts)
    }

    /// Index into the underlying stream of the entry closest to `query`.
    pub fn nearest_index(&self, query: i64) -> Result<usize, StreamError> {
        if self.order.is_empty() {
            return Err(StreamError::Empty);
        }

        let pos = self.lower_bound(query);

        // candidate at or above the query: first of its run has the smallest index
        let above = (pos < self.order.len()).then(|| {
            let ts = self.timestamp_at(pos);
            (self.order[pos], ts.abs_diff(query))
        });

        // candidate below the query: the run just before `pos`
        let below = (pos > 0).then(|| {
            let ts = self.timestamp_at(pos - 1);
            let start = self.lower_bound(ts);
            (self.order[start], ts.abs_diff(query))
        });

        let best = match (below, above) {
            (Some(b), Some(a)) => {
                if b.1 < a.1 || (b.1 == a.1 && b.0 < a.0) {
                    b
                } else {
                    a
                }
            }
            (Some(b), None) => b,
            (None, Some(a)) => a,
            (None, None) => return Err(StreamError::Empty),
        };

        Ok(best.0)
    }
}

impl TransformLookup for SortedTransformIndex<'_> {
    fn nearest(&self, query: i64) -> Result<&TimedTransform, StreamError> {
        let idx = self.nearest_index(query)?;
        Ok(&self.stream.entries[idx])
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn translated(x: f64) -> RigidTransform {
        RigidTransform::new(RigidTransform::IDENTITY.rotation, [x, 0.0, 0.0])
    }

    fn stream_of(timestamps: &[i64]) -> TransformStream {
        timestamps
            .iter()
            .enumerate()
            .map(|(i, &timestamp)| TimedTransform {
                timestamp,
                transform: translated(i as f64),
            })
            .collect()
    }

    #[test]
    fn test_match_scenario() -> Result<(), StreamError> {
        let stream = stream_of(&[0, 100]);
        assert_eq!(match_nearest(95, &stream)?, translated(1.0));
        assert_eq!(match_nearest(20, &stream)?, translated(0.0));
        assert_eq!(match_nearest(-1000, &stream)?, translated(0.0));
        assert_eq!(match_nearest(i64::MAX, &stream)?, translated(1.0));
        Ok(())
    }

    #[test]
    fn test_match_exact_is_idempotent() -> Result<(), StreamError> {
        let stream = stream_of(&[10, 20, 30, 40]);
        for entry in stream.iter() {
            assert_eq!(stream.nearest(entry.timestamp)?, entry);
        }
        Ok(())
    }

    #[test]
    fn test_match_tie_earliest_index() -> Result<(), StreamError> {
        // equidistant neighbours
        let stream = stream_of(&[0, 10]);
        assert_eq!(stream.nearest_index(5)?, 0);
        let stream = stream_of(&[10, 0]);
        assert_eq!(stream.nearest_index(5)?, 0);
        // duplicate timestamps
        let stream = stream_of(&[7, 3, 7]);
        assert_eq!(stream.nearest_index(7)?, 0);
        assert_eq!(stream.nearest_index(6)?, 0);
        Ok(())
    }

    #[test]
    fn test_match_empty() {
        let stream = TransformStream::default();
        assert_eq!(match_nearest(0, &stream), Err(StreamError::Empty));
        let index = SortedTransformIndex::new(&stream);
        assert!(index.is_empty());
        assert_eq!(index.nearest_index(0), Err(StreamError::Empty));
    }

    #[test]
    fn test_sorted_index_unsorted_stream() -> Result<(), StreamError> {
        let stream = stream_of(&[50, 10, 30, 10, 70]);
        let index = SortedTransformIndex::new(&stream);
        assert_eq!(index.len(), 5);
        assert_eq!(index.nearest_index(12)?, 1);
        assert_eq!(index.nearest_index(20)?, 1);
        assert_eq!(index.nearest_index(35)?, 2);
        assert_eq!(index.nearest_index(40)?, 0);
        assert_eq!(index.nearest_index(60)?, 0);
        assert_eq!(index.nearest_index(1000)?, 4);
        Ok(())
    }

    #[test]
    fn test_sorted_index_matches_linear_scan() -> Result<(), StreamError> {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let n = rng.random_range(1..40);
            let timestamps = (0..n)
                .map(|_| rng.random_range(-50..50))
                .collect::<Vec<i64>>();
            let stream = stream_of(&timestamps);
            let index = SortedTransformIndex::new(&stream);
            for query in -60..60 {
                assert_eq!(
                    index.nearest_index(query)?,
                    stream.nearest_index(query)?,
                    "timestamps {timestamps:?} query {query}"
                );
            }
        }
        Ok(())
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() -> Result<(), StreamError> {
        let stream = stream_of(&[i64::MIN, i64::MAX]);
        assert_eq!(stream.nearest_index(-1)?, 0);
        assert_eq!(stream.nearest_index(0)?, 1);
        assert_eq!(SortedTransformIndex::new(&stream).nearest_index(0)?, 1);
        Ok(())
    }
}
