use rand::seq::SliceRandom;
use rand::Rng;

/// Random permutation of `0..len` with no fixed points.
///
/// Shuffles and retries until no index maps to itself, so every
/// derangement is equally likely. About `e` attempts are needed on average.
/// Returns `None` when `len < 2` since no derangement exists.
pub fn derangement<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Option<Vec<usize>> {
    if len < 2 {
        return None;
    }

    let mut order: Vec<usize> = (0..len).collect();
    loop {
        order.shuffle(rng);
        if order.iter().enumerate().all(|(i, &j)| i != j) {
            return Some(order);
        }
    }
}
