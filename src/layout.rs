/// Picks the 1-based row that carries the summary annotations.
///
/// Odd counts land on the exact middle, even counts on the upper of the two
/// central rows. Non-positive counts fall back to `1`; with no rows there is
/// nothing to tag.
pub fn compute_anchor(count: i64) -> usize {
    if count <= 0 {
        return 1;
    }
    usize::try_from(count / 2 + count % 2).unwrap_or(usize::MAX)
}
