//! Résumé document collected by the entry forms, and its single write path.
//!
//! Dates are kept as the `YYYY-MM-DD` strings the forms submit.

use std::future::Future;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::OwnerEmail;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
    pub name: String,
    pub birth_date: Option<String>,
    pub phone: String,
    pub email: String,
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub school_name: String,
    pub major: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub degree: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkExperience {
    pub company_name: String,
    pub position: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub main_duties: Vec<String>,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Award {
    pub title: String,
    pub issuer: String,
    pub date: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Certification {
    pub name: String,
    pub issuer: String,
    pub acquired_date: Option<String>,
    pub expiry_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Activity {
    pub name: String,
    pub organization: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MilitaryService {
    pub branch: String,
    pub rank: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub discharge_type: String,
}

/// The whole résumé as one nested document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeData {
    pub personal_info: PersonalInfo,
    pub education: Vec<Education>,
    pub work_experience: Vec<WorkExperience>,
    pub skills: Vec<String>,
    pub awards: Vec<Award>,
    pub certifications: Vec<Certification>,
    pub activities: Vec<Activity>,
    pub military_service: Option<MilitaryService>,
}

impl ResumeData {
    /// Replace the skill list from comma-separated text.
    pub fn set_skills_from_text(&mut self, text: &str) {
        self.skills = split_items(text, ',');
    }
}

impl WorkExperience {
    /// Set duties and achievements from newline-separated text areas.
    pub fn set_lines(&mut self, duties: &str, achievements: &str) {
        self.main_duties = split_items(duties, '\n');
        self.achievements = split_items(achievements, '\n');
    }
}

/// Split free text on `sep`, trimming entries and dropping empty ones.
#[must_use]
pub fn split_items(text: &str, sep: char) -> Vec<String> {
    text.split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum ParseStatus {
    Pending,
    Success,
    Failed,
}

/// A saved résumé row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ResumeRecord {
    pub owner_email: OwnerEmail,
    pub resume_data: ResumeData,
    pub parse_status: ParseStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub saved_at: OffsetDateTime,
}

impl ResumeRecord {
    /// A record for data entered by hand, which needs no parsing.
    #[must_use]
    pub fn entered(owner_email: OwnerEmail, resume_data: ResumeData) -> Self {
        Self {
            owner_email,
            resume_data,
            parse_status: ParseStatus::Success,
            saved_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Consumer-provided résumé persistence.
pub trait ResumeStore: Send + Sync + 'static {
    /// Insert or replace the owner's résumé.
    fn save(
        &self,
        record: ResumeRecord,
    ) -> impl Future<Output = Result<(), Box<dyn std::error::Error + Send + Sync>>> + Send;

    fn find(
        &self,
        owner_email: &OwnerEmail,
    ) -> impl Future<Output = Result<Option<ResumeRecord>, Box<dyn std::error::Error + Send + Sync>>>
           + Send;
}
