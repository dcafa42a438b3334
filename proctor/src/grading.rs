//! Cheating penalty and the proctoring events emitted around a submission.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    error::{Error, Result},
    event::Event,
};

/// Penalty applied from the number of cheating flags raised during an exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PenaltyTier {
    None,
    Half,
    Void,
}

impl PenaltyTier {
    pub fn from_count(cheating_count: u32) -> Self {
        match cheating_count {
            0 => Self::None,
            1 => Self::Half,
            _ => Self::Void,
        }
    }

    pub fn apply(self, original_marks: f64) -> f64 {
        match self {
            Self::None => original_marks,
            Self::Half => (original_marks * 0.5).max(0.0),
            Self::Void => 0.0,
        }
    }
}

impl From<PenaltyTier> for u8 {
    fn from(tier: PenaltyTier) -> Self {
        match tier {
            PenaltyTier::None => 0,
            PenaltyTier::Half => 1,
            PenaltyTier::Void => 2,
        }
    }
}

impl TryFrom<u8> for PenaltyTier {
    type Error = Error;

    fn try_from(flag: u8) -> Result<Self> {
        match flag {
            0 => Ok(Self::None),
            1 => Ok(Self::Half),
            2 => Ok(Self::Void),
            other => Err(Error::InvalidInput(format!("unknown penalty flag {other}"))),
        }
    }
}

pub fn final_marks(original_marks: f64, cheating_count: u32) -> f64 {
    PenaltyTier::from_count(cheating_count).apply(original_marks)
}

/// A scored exam attempt, before the penalty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub student_id: Option<i64>,
    pub student_username: Option<String>,
    pub exam_id: i64,
    pub original_marks: f64,
    pub cheating_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graded {
    pub exam_id: i64,
    pub original_marks: f64,
    pub final_marks: f64,
    pub cheating_count: u32,
    pub penalty: PenaltyTier,
}

impl Submission {
    pub fn grade(&self) -> Graded {
        let penalty = PenaltyTier::from_count(self.cheating_count);

        Graded {
            exam_id: self.exam_id,
            original_marks: self.original_marks,
            final_marks: penalty.apply(self.original_marks),
            cheating_count: self.cheating_count,
            penalty,
        }
    }

    /// `submit_exam` record for the live monitor.
    pub fn to_event(&self, graded: &Graded) -> Result<Event> {
        Event::new("submit_exam")
            .field("student_id", self.student_id)?
            .field("student_username", &self.student_username)?
            .field("exam_id", self.exam_id)?
            .field("marks", graded.final_marks)?
            .field("cheating_count", self.cheating_count)?
            .field("time", Utc::now().to_rfc3339())
    }
}

/// Student-reported proctoring signal such as `exam_start` or `tab_hidden`.
pub fn signal_event(
    kind: &str,
    student_id: Option<i64>,
    student_username: Option<&str>,
    meta: Map<String, Value>,
) -> Result<Event> {
    Event::new(kind)
        .field("student_id", student_id)?
        .field("student_username", student_username)?
        .field("meta", meta)?
        .field("time", Utc::now().to_rfc3339())
}
