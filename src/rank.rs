//! Stable top/bottom-N selection over aggregated rows

use std::cmp::Ordering;

/// Sort direction for a ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest metric first
    Ascending,
    /// Largest metric first
    Descending,
}

/// Return the first `n` items after a stable sort on `metric`
///
/// Items with equal metrics keep their relative input order. Values that do
/// not compare equal to themselves (NaN) sort after every other value in
/// either direction.
pub fn select_n<T, M, F>(items: &[T], n: usize, direction: Direction, metric: F) -> Vec<T>
where
    T: Clone,
    M: PartialOrd,
    F: Fn(&T) -> M,
{
    let mut ranked: Vec<&T> = items.iter().collect();
    // sort_by is stable
    ranked.sort_by(|a, b| compare(&metric(a), &metric(b), direction));

    ranked.into_iter().take(n).cloned().collect()
}

fn compare<M: PartialOrd>(a: &M, b: &M, direction: Direction) -> Ordering {
    match (is_unordered(a), is_unordered(b)) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ordering = a.partial_cmp(b).unwrap_or(Ordering::Equal);
            match direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        }
    }
}

fn is_unordered<M: PartialOrd>(value: &M) -> bool {
    value.partial_cmp(value).is_none()
}

/// The `n` items with the largest metric
pub fn top_n<T, M, F>(items: &[T], n: usize, metric: F) -> Vec<T>
where
    T: Clone,
    M: PartialOrd,
    F: Fn(&T) -> M,
{
    select_n(items, n, Direction::Descending, metric)
}

/// The `n` items with the smallest metric
pub fn bottom_n<T, M, F>(items: &[T], n: usize, metric: F) -> Vec<T>
where
    T: Clone,
    M: PartialOrd,
    F: Fn(&T) -> M,
{
    select_n(items, n, Direction::Ascending, metric)
}
