//! Activity model.
//!
//! # Invariants
//! - `date` is an ISO calendar date (`YYYY-MM-DD`), so lexical order equals
//!   chronological order.
//! - `academic_year_id` always references an existing academic year once
//!   committed; deleting the year deletes the activity.

use super::{
    require_text, AcademicYearId, ActivityId, Entity, EntityId, EntityKind, Record,
    ValidationError,
};
use crate::store::Dataset;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static ISO_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<year>\d{4})-(?P<month>\d{2})-(?P<day>\d{2})$").expect("valid date regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    pub date: String,
    pub academic_year_id: AcademicYearId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub name: String,
    pub date: String,
    pub academic_year_id: AcademicYearId,
}

impl NewActivity {
    pub fn new(
        name: impl Into<String>,
        date: impl Into<String>,
        academic_year_id: impl Into<AcademicYearId>,
    ) -> Self {
        Self {
            name: name.into(),
            date: date.into(),
            academic_year_id: academic_year_id.into(),
        }
    }
}

impl Entity for Activity {
    const KIND: EntityKind = EntityKind::Activity;
    type Draft = NewActivity;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: EntityId, draft: NewActivity) -> Self {
        Self {
            id,
            name: draft.name,
            date: draft.date,
            academic_year_id: draft.academic_year_id,
        }
    }

    fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.date = self.date.trim().to_string();
        self.academic_year_id = self.academic_year_id.trim().to_string();
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.name, EntityKind::Activity, "name")?;
        require_text(&self.academic_year_id, EntityKind::Activity, "academicYearId")?;
        if !is_calendar_date(&self.date) {
            return Err(ValidationError::InvalidDate(self.date.clone()));
        }
        Ok(())
    }

    fn into_record(self) -> Record {
        Record::Activity(self)
    }

    fn from_record(record: Record) -> Option<Self> {
        match record {
            Record::Activity(item) => Some(item),
            _ => None,
        }
    }

    fn collection(dataset: &Dataset) -> &[Self] {
        &dataset.activities
    }

    fn collection_mut(dataset: &mut Dataset) -> &mut Vec<Self> {
        &mut dataset.activities
    }
}

fn is_calendar_date(value: &str) -> bool {
    let Some(captures) = ISO_DATE_RE.captures(value) else {
        return false;
    };
    let field = |name: &str| {
        captures
            .name(name)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0)
    };
    let (year, month, day) = (field("year"), field("month"), field("day"));

    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    let days_in_month = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        2 => 28,
        _ => return false,
    };
    (1..=days_in_month).contains(&day)
}
