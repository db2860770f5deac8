//! Small numeric and ordering helpers shared by the layout stages.

use std::cmp::Ordering;

pub fn f64_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Stable insertion sort driven by a comparator that is not required to be a total order.
///
/// Link ordering compares links by projected breadth, which is not transitive. `slice::sort_by`
/// may panic on such comparators, so those call sites use this instead: the result is still
/// deterministic for a given input order, and equal elements keep their relative order.
pub fn insertion_sort_by<T, F>(items: &mut [T], mut compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && compare(&items[j - 1], &items[j]) == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_sort_keeps_equal_elements_in_place() {
        let mut v = vec![(1, 'a'), (0, 'b'), (1, 'c'), (0, 'd')];
        insertion_sort_by(&mut v, |a, b| a.0.cmp(&b.0));
        assert_eq!(v, vec![(0, 'b'), (0, 'd'), (1, 'a'), (1, 'c')]);
    }

    #[test]
    fn insertion_sort_tolerates_cyclic_comparators() {
        // rock < paper < scissors < rock
        let beats = |a: &u8, b: &u8| match (a, b) {
            (0, 1) | (1, 2) | (2, 0) => Ordering::Less,
            (1, 0) | (2, 1) | (0, 2) => Ordering::Greater,
            _ => Ordering::Equal,
        };
        let mut first = vec![2u8, 0, 1, 2, 0];
        let mut second = first.clone();
        insertion_sort_by(&mut first, beats);
        insertion_sort_by(&mut second, beats);
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }

    #[test]
    fn mean_of_nothing_is_none() {
        assert_eq!(mean(std::iter::empty()), None);
        assert_eq!(mean([1.0, 2.0, 6.0]), Some(3.0));
    }
}
