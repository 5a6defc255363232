use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::models::Profile;

/// Result of a random pairing round
#[derive(Debug, Clone, PartialEq)]
pub struct Pairing {
    pub pairs: Vec<(Profile, Profile)>,
    /// Left over when the pool has an odd size
    pub unpaired: Option<Profile>,
}

/// Pair profiles at random: seeded shuffle, then adjacent pairs
///
/// This is a uniformly random perfect matching of the pool (minus one
/// profile when the pool is odd). Compatibility plays no part; use
/// [`crate::core::Matcher`] for scored suggestions. The same seed and input
/// order always produce the same pairs.
pub fn pair_participants(mut profiles: Vec<Profile>, seed: u64) -> Pairing {
    let mut rng = StdRng::seed_from_u64(seed);
    profiles.shuffle(&mut rng);

    let unpaired = if profiles.len() % 2 == 1 {
        profiles.pop()
    } else {
        None
    };

    let mut pairs = Vec::with_capacity(profiles.len() / 2);
    let mut iter = profiles.into_iter();
    while let (Some(a), Some(b)) = (iter.next(), iter.next()) {
        pairs.push((a, b));
    }

    Pairing { pairs, unpaired }
}
