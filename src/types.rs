use alloy::primitives::Address;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use std::fmt;
use std::str::FromStr;

use crate::address::require_address;
use crate::error::DappError;

/// Day-first date pattern, e.g. `31/12/2025`.
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Category of a badge, indexed as the contract stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeType {
    Course,
    Project,
    Event,
    Contribution,
}

impl BadgeType {
    pub const ALL: [BadgeType; 4] = [
        BadgeType::Course,
        BadgeType::Project,
        BadgeType::Event,
        BadgeType::Contribution,
    ];

    pub fn from_index(index: u64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn index(self) -> u8 {
        match self {
            BadgeType::Course => 0,
            BadgeType::Project => 1,
            BadgeType::Event => 2,
            BadgeType::Contribution => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BadgeType::Course => "Course",
            BadgeType::Project => "Project",
            BadgeType::Event => "Event",
            BadgeType::Contribution => "Contribution",
        }
    }
}

impl fmt::Display for BadgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parses a form field holding either the category index or its name.
impl FromStr for BadgeType {
    type Err = DappError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match s.parse::<u64>() {
            Ok(index) => Self::from_index(index),
            Err(_) => Self::ALL
                .into_iter()
                .find(|t| t.label().eq_ignore_ascii_case(s)),
        };
        parsed.ok_or_else(|| DappError::Validation(format!("Unknown badge type: {s:?}.")))
    }
}

/// Expiry of a badge. The contract encodes `Never` as `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Never,
    At(u64),
}

impl Expiry {
    pub fn from_unix(secs: u64) -> Self {
        if secs == 0 { Expiry::Never } else { Expiry::At(secs) }
    }

    pub fn as_unix(self) -> u64 {
        match self {
            Expiry::Never => 0,
            Expiry::At(secs) => secs,
        }
    }
}

/// Parses the expiry form field: empty, unix seconds or `YYYY-MM-DD` (midnight UTC).
impl FromStr for Expiry {
    type Err = DappError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Expiry::Never);
        }

        if s.bytes().all(|b| b.is_ascii_digit()) {
            return s
                .parse::<u64>()
                .map(Expiry::from_unix)
                .map_err(|_| DappError::Validation(format!("Expiry {s:?} is out of range.")));
        }

        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| DappError::Validation(format!("Invalid expiry date: {s:?}.")))?;
        let secs = date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default();
        if secs <= 0 {
            return Err(DappError::Validation(
                "Expiry date must be after 1970-01-01.".to_string(),
            ));
        }
        Ok(Expiry::At(secs as u64))
    }
}

/// A badge as returned by `getBadgeByTitle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeRecord {
    pub title: String,
    pub description: String,
    pub issuer: String,
    /// `None` when the contract returned an index outside the known categories.
    pub badge_type: Option<BadgeType>,
    pub issued_at: u64,
    pub expires_at: Expiry,
    pub evidence_url: String,
}

/// Raw registration form, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub recipient: String,
    pub title: String,
    pub description: String,
    pub issuer: String,
    pub evidence_url: String,
    pub badge_type: String,
    pub expiry: String,
}

impl RegistrationForm {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A validated registration, consumed by exactly one transaction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub recipient: Address,
    pub title: String,
    pub description: String,
    pub issuer: String,
    pub evidence_url: String,
    pub badge_type: BadgeType,
    pub expiry: Expiry,
}

impl RegistrationRequest {
    pub fn from_form(form: &RegistrationForm) -> Result<Self, DappError> {
        let recipient = require_address(&form.recipient, "recipient")?;

        let title = form.title.trim();
        if title.is_empty() {
            return Err(DappError::Validation(
                "The badge title is required.".to_string(),
            ));
        }

        Ok(Self {
            recipient,
            title: title.to_string(),
            description: form.description.trim().to_string(),
            issuer: form.issuer.trim().to_string(),
            evidence_url: form.evidence_url.trim().to_string(),
            badge_type: form.badge_type.parse()?,
            expiry: form.expiry.parse()?,
        })
    }
}

/// A validated strftime pattern used to render badge dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat(String);

impl DateFormat {
    pub fn new(pattern: &str) -> Result<Self, DappError> {
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(DappError::Configuration(format!(
                "invalid date format {pattern:?}"
            )));
        }
        Ok(Self(pattern.to_string()))
    }

    /// Renders `unix_secs` in the host's local timezone.
    pub fn format(&self, unix_secs: u64) -> String {
        self.format_in(unix_secs, &Local)
    }

    pub fn format_in<Tz: TimeZone>(&self, unix_secs: u64, tz: &Tz) -> String
    where
        Tz::Offset: fmt::Display,
    {
        i64::try_from(unix_secs)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.with_timezone(tz).format(&self.0).to_string())
            .unwrap_or_else(|| unix_secs.to_string())
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self(DEFAULT_DATE_FORMAT.to_string())
    }
}
