use crate::core::{
    error::MatchingError,
    scoring::{compatibility_score, shared_interests},
};
use crate::models::{Profile, RankedPartner};

/// Order `candidates` by descending compatibility with `me`
///
/// The sort is stable: candidates with equal scores keep their input order.
/// Removing `me` from the pool is the caller's job.
pub fn rank(me: &Profile, candidates: Vec<Profile>) -> Vec<Profile> {
    let mut keyed: Vec<(u32, Profile)> = candidates
        .into_iter()
        .map(|candidate| (compatibility_score(me, &candidate), candidate))
        .collect();

    keyed.sort_by(|a, b| b.0.cmp(&a.0));

    keyed.into_iter().map(|(_, candidate)| candidate).collect()
}

/// Result of the partner search
#[derive(Debug)]
pub struct MatchResult {
    pub partners: Vec<RankedPartner>,
    pub total_candidates: usize,
}

/// Partner search pipeline
///
/// # Pipeline Stages
/// 1. Completeness gate on the caller
/// 2. Exclusion of the caller's own profile
/// 3. Scoring and stable ranking
/// 4. Truncation to the requested limit
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    max_limit: usize,
}

impl Matcher {
    pub fn new(max_limit: usize) -> Self {
        Self { max_limit }
    }

    /// Rank `candidates` for `me`
    ///
    /// # Arguments
    /// * `me` - The caller's profile; must be complete
    /// * `candidates` - Profile directory, may include the caller
    /// * `limit` - Maximum number of partners to return, capped at `max_limit`
    ///
    /// # Returns
    /// MatchResult with partners ordered by descending compatibility
    pub fn find_partners(
        &self,
        me: &Profile,
        candidates: Vec<Profile>,
        limit: usize,
    ) -> Result<MatchResult, MatchingError> {
        let missing = me.missing_fields();
        if !missing.is_empty() {
            return Err(MatchingError::ProfileIncomplete {
                completion: me.completion_percentage(),
                missing,
            });
        }

        let pool: Vec<Profile> = candidates
            .into_iter()
            .filter(|candidate| candidate.id != me.id)
            .collect();
        let total_candidates = pool.len();

        let mut partners: Vec<RankedPartner> = rank(me, pool)
            .into_iter()
            .map(|profile| RankedPartner {
                compatibility_score: compatibility_score(me, &profile),
                shared_interests: shared_interests(me, &profile),
                profile,
            })
            .collect();

        partners.truncate(limit.min(self.max_limit));

        Ok(MatchResult {
            partners,
            total_candidates,
        })
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Level;

    fn create_candidate(id: &str, level: Option<Level>, consulting: bool, mna: bool, quant: bool) -> Profile {
        Profile {
            id: id.to_string(),
            first_name: Some(format!("First {}", id)),
            last_name: Some(format!("Last {}", id)),
            email: format!("{}@hec.edu", id),
            phone_number: None,
            level,
            consulting,
            mna,
            quant,
            created_at: None,
        }
    }

    fn me() -> Profile {
        create_candidate("me", Some(Level::Medium), true, true, false)
    }

    #[test]
    fn test_rank_sorted_by_score() {
        let me = me();
        let candidates = vec![
            create_candidate("low", Some(Level::Advanced), false, false, true), // 1
            create_candidate("high", Some(Level::Medium), true, true, false),   // 4
            create_candidate("mid", None, true, true, false),                   // 2
        ];

        let ranked = rank(&me, candidates);
        let ids: Vec<&str> = ranked.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_rank_ties_keep_input_order() {
        let me = me();
        let candidates = vec![
            create_candidate("a", Some(Level::Beginner), false, false, false),
            create_candidate("b", Some(Level::Advanced), false, false, false),
            create_candidate("c", None, true, false, false),
        ];

        let ranked = rank(&me, candidates);
        let ids: Vec<&str> = ranked.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_rank_is_idempotent() {
        let me = me();
        let candidates = vec![
            create_candidate("1", Some(Level::Beginner), true, false, true),
            create_candidate("2", Some(Level::Medium), false, false, false),
            create_candidate("3", Some(Level::Advanced), true, true, true),
            create_candidate("4", None, false, true, false),
        ];

        let once = rank(&me, candidates);
        let twice = rank(&me, once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_find_partners_excludes_self_and_limits() {
        let matcher = Matcher::new(2);
        let me = me();
        let candidates = vec![
            me.clone(),
            create_candidate("1", Some(Level::Medium), true, false, false),
            create_candidate("2", Some(Level::Medium), true, true, false),
            create_candidate("3", None, false, false, false),
        ];

        let result = matcher.find_partners(&me, candidates, 10).unwrap();

        assert_eq!(result.total_candidates, 3);
        assert_eq!(result.partners.len(), 2);
        assert_eq!(result.partners[0].profile.id, "2");
        assert_eq!(result.partners[0].compatibility_score, 4);
        assert_eq!(result.partners[0].shared_interests, vec!["consulting", "mna"]);
        assert!(result.partners.iter().all(|p| p.profile.id != "me"));
    }

    #[test]
    fn test_find_partners_requires_complete_profile() {
        let matcher = Matcher::default();
        let mut me = me();
        me.level = None;

        let err = matcher.find_partners(&me, vec![], 10).unwrap_err();
        match err {
            MatchingError::ProfileIncomplete { missing, completion } => {
                assert_eq!(missing, vec![crate::models::ProfileField::Level]);
                assert_eq!(completion, 75);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
