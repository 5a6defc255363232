use crate::models::Profile;

/// Score contributed by the experience levels of two profiles
///
/// Identical levels score 2, levels one step apart (in either direction)
/// score 1. Anything else, including an unset level on either side, scores 0.
#[inline]
pub fn level_term(a: &Profile, b: &Profile) -> u32 {
    match (a.level, b.level) {
        (Some(x), Some(y)) => match x.distance(y) {
            0 => 2,
            1 => 1,
            _ => 0,
        },
        _ => 0,
    }
}

/// Interest flags set on both profiles, by name
pub fn shared_interests(a: &Profile, b: &Profile) -> Vec<String> {
    [
        ("consulting", a.consulting && b.consulting),
        ("mna", a.mna && b.mna),
        ("quant", a.quant && b.quant),
    ]
    .into_iter()
    .filter(|(_, shared)| *shared)
    .map(|(name, _)| name.to_string())
    .collect()
}

/// One point per interest flag set on both profiles, at most 3
#[inline]
pub fn interest_term(a: &Profile, b: &Profile) -> u32 {
    u32::from(a.consulting && b.consulting)
        + u32::from(a.mna && b.mna)
        + u32::from(a.quant && b.quant)
}

/// Compatibility between the caller and another student
///
/// Scoring formula:
/// score = level_term + interest_term
///
/// The value is only meaningful for ordering candidates; it is not
/// normalized.
#[inline]
pub fn compatibility_score(me: &Profile, other: &Profile) -> u32 {
    level_term(me, other) + interest_term(me, other)
}
