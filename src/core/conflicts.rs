use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::{Profile, Session};

/// How a same-day session is matched against a proposed pair
///
/// Truth table for a session on the queried date, querying users {A, B}
/// (`C` and `D` are unrelated users, `-` an empty slot):
///
/// | participant1 | participant2 | EitherParticipant | BothSlots |
/// |--------------|--------------|-------------------|-----------|
/// | A            | B            | true              | true      |
/// | B            | A            | true              | true      |
/// | A            | C            | true              | false     |
/// | C            | B            | true              | false     |
/// | A            | -            | true              | false     |
/// | C            | D            | false             | false     |
///
/// Sessions on any other date never conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictRule {
    /// Either slot holds A or B: one session per user per day
    #[default]
    EitherParticipant,
    /// Both slots hold A or B
    BothSlots,
}

#[inline]
fn slot_in(slot: Option<&str>, user_a: &str, user_b: &str) -> bool {
    matches!(slot, Some(id) if id == user_a || id == user_b)
}

impl ConflictRule {
    /// Does `session` block pairing `user_a` with `user_b` on `date`?
    #[inline]
    pub fn conflicts(&self, session: &Session, user_a: &str, user_b: &str, date: NaiveDate) -> bool {
        if session.date != date {
            return false;
        }

        let first = slot_in(session.participant1.as_deref(), user_a, user_b);
        let second = slot_in(session.participant2.as_deref(), user_a, user_b);

        match self {
            ConflictRule::EitherParticipant => first || second,
            ConflictRule::BothSlots => first && second,
        }
    }
}

/// Whether any session in `sessions` blocks pairing `user_a` with `user_b` on `date`
pub fn has_conflict(
    sessions: &[Session],
    user_a: &str,
    user_b: &str,
    date: NaiveDate,
    rule: ConflictRule,
) -> bool {
    sessions
        .iter()
        .any(|session| rule.conflicts(session, user_a, user_b, date))
}

/// Profiles that do not appear in any session, in input order
pub fn find_unmatched_participants(profiles: Vec<Profile>, sessions: &[Session]) -> Vec<Profile> {
    let matched: HashSet<&str> = sessions
        .iter()
        .flat_map(|s| [s.participant1.as_deref(), s.participant2.as_deref()])
        .flatten()
        .collect();

    profiles
        .into_iter()
        .filter(|profile| !matched.contains(profile.id.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SessionFormat, TimeSlot};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn create_test_session(d: &str, p1: Option<&str>, p2: Option<&str>) -> Session {
        Session {
            id: format!("{}-{:?}-{:?}", d, p1, p2),
            date: date(d),
            time: TimeSlot::default(),
            format: SessionFormat::VideoCall,
            topic: None,
            participant1: p1.map(str::to_string),
            participant2: p2.map(str::to_string),
            meet_link: None,
            created_at: None,
        }
    }

    #[test]
    fn test_truth_table() {
        let d = "2024-01-01";
        let rows = [
            (Some("A"), Some("B"), true, true),
            (Some("B"), Some("A"), true, true),
            (Some("A"), Some("C"), true, false),
            (Some("C"), Some("B"), true, false),
            (Some("A"), None, true, false),
            (None, Some("B"), true, false),
            (Some("C"), Some("D"), false, false),
            (None, None, false, false),
        ];

        for (p1, p2, either, both) in rows {
            let sessions = vec![create_test_session(d, p1, p2)];
            assert_eq!(
                has_conflict(&sessions, "A", "B", date(d), ConflictRule::EitherParticipant),
                either,
                "either: {:?}/{:?}",
                p1,
                p2
            );
            assert_eq!(
                has_conflict(&sessions, "A", "B", date(d), ConflictRule::BothSlots),
                both,
                "both: {:?}/{:?}",
                p1,
                p2
            );
        }
    }

    #[test]
    fn test_other_dates_never_conflict() {
        let sessions = vec![create_test_session("2024-01-02", Some("A"), Some("B"))];
        for rule in [ConflictRule::EitherParticipant, ConflictRule::BothSlots] {
            assert!(!has_conflict(&sessions, "A", "B", date("2024-01-01"), rule));
        }
    }

    #[test]
    fn test_third_party_session_scenario() {
        let sessions = vec![create_test_session("2024-01-01", Some("u1"), Some("u3"))];
        let d = date("2024-01-01");

        assert!(has_conflict(&sessions, "u1", "u2", d, ConflictRule::EitherParticipant));
        assert!(!has_conflict(&sessions, "u1", "u2", d, ConflictRule::BothSlots));
    }

    #[test]
    fn test_empty_sessions() {
        assert!(!has_conflict(&[], "A", "B", date("2024-01-01"), ConflictRule::default()));
    }

    #[test]
    fn test_find_unmatched_participants() {
        let profiles: Vec<Profile> = ["u1", "u2", "u3", "u4"]
            .iter()
            .map(|id| Profile {
                id: id.to_string(),
                first_name: None,
                last_name: None,
                email: format!("{}@hec.edu", id),
                phone_number: None,
                level: None,
                consulting: false,
                mna: false,
                quant: false,
                created_at: None,
            })
            .collect();
        let sessions = vec![
            create_test_session("2024-01-01", Some("u1"), None),
            create_test_session("2024-01-02", None, Some("u3")),
        ];

        let unmatched = find_unmatched_participants(profiles, &sessions);
        let ids: Vec<&str> = unmatched.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["u2", "u4"]);
    }
}
