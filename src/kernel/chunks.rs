use std::iter::StepBy;
use std::ops::Range;

/// Starts of the full `width`-wide chunks of `range`, and the leftover tail.
pub fn split(range: Range<usize>, width: usize) -> (StepBy<Range<usize>>, Range<usize>) {
    debug_assert!(width > 0);
    let body_end = range.start + range.len() / width * width;
    ((range.start..body_end).step_by(width), body_end..range.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_into_body_and_tail() {
        let (body, tail) = split(3..14, 4);
        assert_eq!(body.collect::<Vec<_>>(), vec![3, 7]);
        assert_eq!(tail, 11..14);
        let (body, tail) = split(0..8, 4);
        assert_eq!(body.count(), 2);
        assert!(tail.is_empty());
        let (body, tail) = split(5..5, 4);
        assert_eq!(body.count(), 0);
        assert!(tail.is_empty());
    }
}
