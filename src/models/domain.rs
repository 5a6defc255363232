use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Case-study experience level, ordered from least to most experienced
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    Beginner,
    Medium,
    Advanced,
}

impl Level {
    /// Position on the Beginner < Medium < Advanced ladder
    pub fn step(self) -> u8 {
        match self {
            Level::Beginner => 0,
            Level::Medium => 1,
            Level::Advanced => 2,
        }
    }

    /// Number of steps between two levels, in either direction
    pub fn distance(self, other: Level) -> u8 {
        self.step().abs_diff(other.step())
    }
}

/// Student profile as stored by the hosted backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub level: Option<Level>,
    #[serde(default)]
    pub consulting: bool,
    #[serde(default)]
    pub mna: bool,
    #[serde(default)]
    pub quant: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A requirement that must hold before a profile can be matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    FirstName,
    LastName,
    Level,
    Interests,
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProfileField::FirstName => "first_name",
            ProfileField::LastName => "last_name",
            ProfileField::Level => "level",
            ProfileField::Interests => "interests",
        };
        f.write_str(name)
    }
}

fn is_filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl Profile {
    /// Whether any of the three interest flags is set
    pub fn has_interest(&self) -> bool {
        self.consulting || self.mna || self.quant
    }

    /// Requirements this profile does not meet yet, in display order
    pub fn missing_fields(&self) -> Vec<ProfileField> {
        let mut missing = Vec::new();
        if !is_filled(&self.first_name) {
            missing.push(ProfileField::FirstName);
        }
        if !is_filled(&self.last_name) {
            missing.push(ProfileField::LastName);
        }
        if self.level.is_none() {
            missing.push(ProfileField::Level);
        }
        if !self.has_interest() {
            missing.push(ProfileField::Interests);
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Share of the four requirements that are met, 0 to 100
    pub fn completion_percentage(&self) -> u8 {
        let met = 4 - self.missing_fields().len() as u8;
        met * 25
    }
}

/// Fields a user may set on their own profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consulting: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mna: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quant: Option<bool>,
}

impl ProfileUpdate {
    /// Build the full record to upsert for `id`, layered over `existing` if any
    pub fn apply(self, id: &str, email: &str, existing: Option<Profile>) -> Profile {
        let base = existing.unwrap_or_else(|| Profile {
            id: id.to_string(),
            first_name: None,
            last_name: None,
            email: email.to_string(),
            phone_number: None,
            level: None,
            consulting: false,
            mna: false,
            quant: false,
            created_at: None,
        });

        Profile {
            id: id.to_string(),
            first_name: self.first_name.or(base.first_name),
            last_name: self.last_name.or(base.last_name),
            email: email.to_string(),
            phone_number: self.phone_number.or(base.phone_number),
            level: self.level.or(base.level),
            consulting: self.consulting.unwrap_or(base.consulting),
            mna: self.mna.unwrap_or(base.mna),
            quant: self.quant.unwrap_or(base.quant),
            created_at: Some(Utc::now()),
        }
    }
}

/// Session delivery format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionFormat {
    #[serde(rename = "Video Call")]
    VideoCall,
    #[serde(rename = "In-person")]
    InPerson,
}

impl SessionFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionFormat::VideoCall => "Video Call",
            SessionFormat::InPerson => "In-person",
        }
    }
}

impl FromStr for SessionFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Video Call" => Ok(SessionFormat::VideoCall),
            "In-person" => Ok(SessionFormat::InPerson),
            other => Err(format!("unknown session format '{}'", other)),
        }
    }
}

/// Bookable start times, in display order
pub const TIME_SLOTS: [&str; 8] = [
    "09:00", "10:00", "11:00", "14:00", "15:00", "16:00", "17:00", "18:00",
];

/// Slot preselected by the session forms
pub const DEFAULT_TIME_SLOT: &str = "18:00";

/// Start time of a session, always one of [`TIME_SLOTS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeSlot(usize);

impl TimeSlot {
    pub fn all() -> impl Iterator<Item = TimeSlot> {
        (0..TIME_SLOTS.len()).map(TimeSlot)
    }

    pub fn as_str(&self) -> &'static str {
        TIME_SLOTS[self.0]
    }
}

impl Default for TimeSlot {
    fn default() -> Self {
        // DEFAULT_TIME_SLOT is the last entry of TIME_SLOTS
        TimeSlot(TIME_SLOTS.len() - 1)
    }
}

impl FromStr for TimeSlot {
    type Err = String;

    /// Accepts `HH:MM`, or `HH:MM:00` as returned by a Postgres `time` column
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hhmm = match trimmed.len() {
            8 if trimmed.ends_with(":00") => &trimmed[..5],
            _ => trimmed,
        };
        TIME_SLOTS
            .iter()
            .position(|slot| *slot == hhmm)
            .map(TimeSlot)
            .ok_or_else(|| format!("'{}' is not an available time slot", s))
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TimeSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Scheduled case-study session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub date: NaiveDate,
    pub time: TimeSlot,
    pub format: SessionFormat,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub participant1: Option<String>,
    #[serde(default)]
    pub participant2: Option<String>,
    #[serde(default)]
    pub meet_link: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Both participant slots are filled
    pub fn is_matched(&self) -> bool {
        self.participant1.is_some() && self.participant2.is_some()
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.participant1.as_deref() == Some(user_id)
            || self.participant2.as_deref() == Some(user_id)
    }

    /// The session date lies strictly before `today`
    pub fn is_completed(&self, today: NaiveDate) -> bool {
        self.date < today
    }

    /// The other participant, seen from `user_id`
    pub fn partner_of(&self, user_id: &str) -> Option<&str> {
        match (self.participant1.as_deref(), self.participant2.as_deref()) {
            (Some(p1), p2) if p1 == user_id => p2,
            (p1, Some(p2)) if p2 == user_id => p1,
            _ => None,
        }
    }
}

/// Session record about to be inserted; the store assigns `id` and `created_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub date: NaiveDate,
    pub time: TimeSlot,
    pub format: SessionFormat,
    pub topic: Option<String>,
    pub participant1: Option<String>,
    pub participant2: Option<String>,
    pub meet_link: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Meet links only exist for video calls
fn link_for(format: SessionFormat, link: Option<String>) -> Option<String> {
    match format {
        SessionFormat::VideoCall => non_blank(link),
        SessionFormat::InPerson => None,
    }
}

impl NewSession {
    /// A session with only the creator as participant
    pub fn solo(
        creator: &str,
        date: NaiveDate,
        time: TimeSlot,
        format: SessionFormat,
        topic: Option<String>,
        meet_link: Option<String>,
    ) -> Self {
        Self {
            date,
            time,
            format,
            topic: non_blank(topic),
            participant1: Some(creator.to_string()),
            participant2: None,
            meet_link: link_for(format, meet_link),
        }
    }

    /// A matched session between `participant1` and `participant2`
    pub fn paired(
        participant1: &str,
        participant2: &str,
        date: NaiveDate,
        time: TimeSlot,
        format: SessionFormat,
        topic: Option<String>,
        meet_link: Option<String>,
    ) -> Self {
        Self {
            participant2: Some(participant2.to_string()),
            ..Self::solo(participant1, date, time, format, topic, meet_link)
        }
    }

    /// Materialize the record as a store would persist it
    pub fn into_session(self, id: String) -> Session {
        Session {
            id,
            date: self.date,
            time: self.time,
            format: self.format,
            topic: self.topic,
            participant1: self.participant1,
            participant2: self.participant2,
            meet_link: self.meet_link,
            created_at: Some(Utc::now()),
        }
    }
}

/// Partial update of a session; `Some(None)` clears a nullable column
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<SessionFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meet_link: Option<Option<String>>,
}

impl SessionPatch {
    pub fn is_empty(&self) -> bool {
        self.time.is_none()
            && self.format.is_none()
            && self.topic.is_none()
            && self.meet_link.is_none()
    }

    /// Blank strings become NULL and the link is dropped when the resulting
    /// format is in-person
    pub fn normalized(mut self, current: &Session) -> Self {
        self.topic = self.topic.map(non_blank);
        let format = self.format.unwrap_or(current.format);
        match format {
            SessionFormat::InPerson => {
                if current.meet_link.is_some() || self.meet_link.is_some() {
                    self.meet_link = Some(None);
                }
            }
            SessionFormat::VideoCall => {
                self.meet_link = self.meet_link.map(non_blank);
            }
        }
        self
    }

    /// Apply to an in-memory copy of the session
    pub fn apply_to(&self, session: &mut Session) {
        if let Some(time) = self.time {
            session.time = time;
        }
        if let Some(format) = self.format {
            session.format = format;
        }
        if let Some(topic) = &self.topic {
            session.topic = topic.clone();
        }
        if let Some(link) = &self.meet_link {
            session.meet_link = link.clone();
        }
    }
}

/// Authenticated caller, as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
}

/// Candidate partner with their compatibility score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPartner {
    pub profile: Profile,
    #[serde(rename = "compatibilityScore")]
    pub compatibility_score: u32,
    #[serde(rename = "sharedInterests")]
    pub shared_interests: Vec<String>,
}

/// Grouping used by the resource catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceCategory {
    Academic,
    Transport,
    Special,
}

/// Link shown on the resources page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: ResourceCategory,
    pub icon: String,
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile {
            id: "u1".to_string(),
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            email: "jane.doe@hec.edu".to_string(),
            phone_number: None,
            level: Some(Level::Medium),
            consulting: true,
            mna: false,
            quant: false,
            created_at: None,
        }
    }

    #[test]
    fn test_complete_profile() {
        let p = profile();
        assert!(p.is_complete());
        assert_eq!(p.completion_percentage(), 100);
    }

    #[test]
    fn test_missing_last_name_is_incomplete() {
        let mut p = profile();
        p.last_name = None;
        assert!(!p.is_complete());
        assert_eq!(p.missing_fields(), vec![ProfileField::LastName]);
        assert_eq!(p.completion_percentage(), 75);
    }

    #[test]
    fn test_blank_name_counts_as_missing() {
        let mut p = profile();
        p.first_name = Some("   ".to_string());
        p.consulting = false;
        assert_eq!(
            p.missing_fields(),
            vec![ProfileField::FirstName, ProfileField::Interests]
        );
        assert_eq!(p.completion_percentage(), 50);
    }

    #[test]
    fn test_level_distance_is_symmetric() {
        assert_eq!(Level::Beginner.distance(Level::Advanced), 2);
        assert_eq!(Level::Advanced.distance(Level::Beginner), 2);
        assert_eq!(Level::Medium.distance(Level::Beginner), 1);
        assert!(Level::Beginner < Level::Medium && Level::Medium < Level::Advanced);
    }

    #[test]
    fn test_time_slot_parsing() {
        let slot: TimeSlot = "14:00".parse().unwrap();
        assert_eq!(slot.as_str(), "14:00");
        let with_seconds: TimeSlot = "14:00:00".parse().unwrap();
        assert_eq!(with_seconds, slot);
        assert!("12:00".parse::<TimeSlot>().is_err());
        assert_eq!(TimeSlot::default().as_str(), DEFAULT_TIME_SLOT);
        assert_eq!(TimeSlot::all().count(), TIME_SLOTS.len());
    }

    #[test]
    fn test_session_wire_format() {
        let json = r#"{
            "id": "s1",
            "date": "2024-01-01",
            "time": "18:00:00",
            "format": "Video Call",
            "topic": null,
            "participant1": "u1",
            "participant2": null,
            "meet_link": null,
            "created_at": "2023-12-30T10:00:00Z"
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.time.as_str(), "18:00");
        assert_eq!(session.format, SessionFormat::VideoCall);
        assert!(!session.is_matched());
        assert_eq!(session.partner_of("u1"), None);

        let out = serde_json::to_value(&session).unwrap();
        assert_eq!(out["format"], "Video Call");
        assert_eq!(out["time"], "18:00");
    }

    #[test]
    fn test_in_person_session_has_no_link() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let s = NewSession::paired(
            "u1",
            "u2",
            date,
            TimeSlot::default(),
            SessionFormat::InPerson,
            Some("  ".to_string()),
            Some("https://meet.example/abc".to_string()),
        );
        assert_eq!(s.meet_link, None);
        assert_eq!(s.topic, None);
        assert_eq!(s.participant2.as_deref(), Some("u2"));
    }

    #[test]
    fn test_patch_to_in_person_clears_link() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut session = NewSession::solo(
            "u1",
            date,
            TimeSlot::default(),
            SessionFormat::VideoCall,
            None,
            Some("https://meet.example/abc".to_string()),
        )
        .into_session("s1".to_string());

        let patch = SessionPatch {
            format: Some(SessionFormat::InPerson),
            ..Default::default()
        }
        .normalized(&session);
        assert_eq!(patch.meet_link, Some(None));

        patch.apply_to(&mut session);
        assert_eq!(session.format, SessionFormat::InPerson);
        assert_eq!(session.meet_link, None);

        let body = serde_json::to_value(&patch).unwrap();
        assert!(body["meet_link"].is_null());
        assert!(body.get("time").is_none());
    }
}
