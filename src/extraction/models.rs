use crate::error::ExtractionError;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Weekday};
use chrono_tz::Tz;
use std::collections::BTreeSet;
use std::fmt;

/// Fields of a meeting that extraction can fail to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MeetingField {
    Title,
    Date,
    Time,
    Duration,
}

impl fmt::Display for MeetingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MeetingField::Title => "title",
            MeetingField::Date => "date",
            MeetingField::Time => "time",
            MeetingField::Duration => "duration",
        };
        f.write_str(name)
    }
}

/// Which extraction path produced a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftSource {
    /// Explicit `key - value` lines
    Structured,
    /// Free prose, via the language-understanding service
    Inferred,
}

/// A calendar date as written by the user, before it is pinned to a reference day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateHint {
    /// Fully specified calendar date
    Calendar(NaiveDate),
    /// Day and month without a year; the reference year applies
    DayMonth { day: u32, month: u32 },
    /// Days relative to the reference date (`today` = 0, `tomorrow` = 1)
    OffsetDays(i64),
    /// Named weekday; `skip_week` is set for "next Friday"
    Weekday { weekday: Weekday, skip_week: bool },
}

/// Start of a meeting, resolved or still pending
#[derive(Debug, Clone, PartialEq)]
pub enum DateTimeSpec {
    /// Anchored instant in the configured timezone
    Absolute(DateTime<Tz>),
    /// Free text such as "tomorrow at 15:30" awaiting the time resolver
    Expression(String),
    /// Separately parsed date and time literals, either possibly missing
    Parts {
        date: Option<DateHint>,
        time: Option<NaiveTime>,
    },
}

/// Partially filled meeting record produced while extracting one message.
///
/// A field is written at most once: setters ignore values for fields that are
/// already set or that a higher-priority path has claimed.
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingDraft {
    source: DraftSource,
    title: Option<String>,
    date_time: Option<DateTimeSpec>,
    duration_minutes: Option<u32>,
    notes: Option<String>,
    claimed: BTreeSet<MeetingField>,
    rejected: BTreeSet<MeetingField>,
}

impl MeetingDraft {
    /// Create an empty draft for the given extraction path
    pub fn new(source: DraftSource) -> Self {
        Self {
            source,
            title: None,
            date_time: None,
            duration_minutes: None,
            notes: None,
            claimed: BTreeSet::new(),
            rejected: BTreeSet::new(),
        }
    }

    pub fn source(&self) -> DraftSource {
        self.source
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn date_time(&self) -> Option<&DateTimeSpec> {
        self.date_time.as_ref()
    }

    pub fn duration_minutes(&self) -> Option<u32> {
        self.duration_minutes
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Fields whose value was present but could not be parsed
    pub fn rejected(&self) -> impl Iterator<Item = MeetingField> + '_ {
        self.rejected.iter().copied()
    }

    pub fn has_rejections(&self) -> bool {
        !self.rejected.is_empty()
    }

    /// Mark a field as explicitly provided so lower-priority paths leave it alone
    pub fn claim(&mut self, field: MeetingField) {
        self.claimed.insert(field);
    }

    pub fn is_claimed(&self, field: MeetingField) -> bool {
        self.claimed.contains(&field)
    }

    /// Record that a field was provided but unusable. The field stays unset.
    pub fn reject(&mut self, field: MeetingField) {
        self.claimed.insert(field);
        self.rejected.insert(field);
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        let title = title.trim();
        if self.title.is_none() && !title.is_empty() {
            self.title = Some(title.to_string());
        }
    }

    pub fn set_date_time(&mut self, spec: DateTimeSpec) {
        if self.date_time.is_none() {
            self.date_time = Some(spec);
        }
    }

    /// Replace the pending start with its resolved instant
    pub fn resolve_start(&mut self, start: DateTime<Tz>) {
        self.date_time = Some(DateTimeSpec::Absolute(start));
    }

    pub fn set_duration_minutes(&mut self, minutes: u32) {
        if self.duration_minutes.is_none() && minutes > 0 {
            self.duration_minutes = Some(minutes);
        }
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        let notes = notes.into();
        let notes = notes.trim();
        if self.notes.is_none() && !notes.is_empty() {
            self.notes = Some(notes.to_string());
        }
    }

    /// Keep the resolved date while the time is still unknown
    pub fn resolve_date_only(&mut self, date: NaiveDate) {
        self.date_time = Some(DateTimeSpec::Parts {
            date: Some(DateHint::Calendar(date)),
            time: None,
        });
    }

    fn start_parts(&self) -> (Option<DateHint>, Option<NaiveTime>) {
        match &self.date_time {
            Some(DateTimeSpec::Parts { date, time }) => (*date, *time),
            _ => (None, None),
        }
    }

    /// Fill fields from a lower-priority draft.
    ///
    /// Only fields that are unset here and were not claimed by this draft are
    /// taken. Date and time parts are merged one by one; an anchored or
    /// free-text start on this draft is left alone.
    pub fn fill_from(&mut self, lower: &MeetingDraft) {
        if !self.is_claimed(MeetingField::Title) {
            if let Some(title) = lower.title() {
                self.set_title(title);
            }
        }
        if !self.is_claimed(MeetingField::Duration) {
            if let Some(minutes) = lower.duration_minutes() {
                self.set_duration_minutes(minutes);
            }
        }
        if let Some(notes) = lower.notes() {
            self.set_notes(notes);
        }

        if matches!(self.date_time, None | Some(DateTimeSpec::Parts { .. })) {
            let (date, time) = self.start_parts();
            let (lower_date, lower_time) = lower.start_parts();
            let date = date.or(lower_date.filter(|_| !self.is_claimed(MeetingField::Date)));
            let time = time.or(lower_time.filter(|_| !self.is_claimed(MeetingField::Time)));
            if date.is_some() || time.is_some() {
                self.date_time = Some(DateTimeSpec::Parts { date, time });
            }
        }
    }

    /// Date and time parts that are still missing for a complete start
    pub fn missing_start_fields(&self) -> Vec<MeetingField> {
        match &self.date_time {
            Some(DateTimeSpec::Absolute(_)) => Vec::new(),
            Some(DateTimeSpec::Parts { date, time }) => {
                let mut missing = Vec::new();
                if date.is_none() && !self.rejected.contains(&MeetingField::Date) {
                    missing.push(MeetingField::Date);
                }
                if time.is_none() && !self.rejected.contains(&MeetingField::Time) {
                    missing.push(MeetingField::Time);
                }
                missing
            }
            Some(DateTimeSpec::Expression(_)) | None => {
                let mut missing = Vec::new();
                for field in [MeetingField::Date, MeetingField::Time] {
                    if !self.rejected.contains(&field) {
                        missing.push(field);
                    }
                }
                missing
            }
        }
    }

    /// Whether the draft carries both a date and a time (not necessarily anchored yet)
    pub fn has_complete_start(&self) -> bool {
        match &self.date_time {
            Some(DateTimeSpec::Absolute(_)) => true,
            Some(DateTimeSpec::Parts { date, time }) => date.is_some() && time.is_some(),
            _ => false,
        }
    }
}

/// Fully resolved meeting, ready to be written to a calendar
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingEvent {
    title: String,
    start: DateTime<Tz>,
    duration_minutes: u32,
    notes: Option<String>,
}

impl MeetingEvent {
    /// Build an event, rejecting an empty title or a zero duration
    pub fn new(
        title: impl Into<String>,
        start: DateTime<Tz>,
        duration_minutes: u32,
        notes: Option<String>,
    ) -> Result<Self, ExtractionError> {
        let title = title.into().trim().to_string();
        let mut invalid = Vec::new();
        if title.is_empty() {
            invalid.push(MeetingField::Title);
        }
        if duration_minutes == 0 {
            invalid.push(MeetingField::Duration);
        }
        if !invalid.is_empty() {
            return Err(ExtractionError::ValidationFailed { fields: invalid });
        }

        Ok(Self {
            title,
            start,
            duration_minutes,
            notes: notes.filter(|n| !n.trim().is_empty()),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn start(&self) -> DateTime<Tz> {
        self.start
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// End of the meeting, always derived from start and duration
    pub fn end(&self) -> DateTime<Tz> {
        self.start + Duration::minutes(self.duration_minutes as i64)
    }
}
