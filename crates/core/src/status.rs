use std::fmt;

use serde::{Deserialize, Serialize};

/// Confidence of a resolved value, ordered weakest to strongest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// No value at all
    Missing,
    Unconfirmed,
    Provisional,
    Contributed,
    Approved,
}

impl Status {
    /// Status named by a `draft` attribute. No attribute means approved;
    /// unrecognized values are treated as unconfirmed.
    pub fn from_draft(draft: Option<&str>) -> Self {
        match draft {
            None | Some("approved") => Status::Approved,
            Some("contributed") => Status::Contributed,
            Some("provisional") | Some("tentative") => Status::Provisional,
            Some("missing") => Status::Missing,
            Some(_) => Status::Unconfirmed,
        }
    }

    /// The `draft` attribute value for this status, none for approved and
    /// missing
    pub fn as_draft(&self) -> Option<&'static str> {
        match self {
            Status::Missing | Status::Approved => None,
            Status::Unconfirmed => Some("unconfirmed"),
            Status::Provisional => Some("provisional"),
            Status::Contributed => Some("contributed"),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Status::Missing => "missing",
            Status::Unconfirmed => "unconfirmed",
            Status::Provisional => "provisional",
            Status::Contributed => "contributed",
            Status::Approved => "approved",
        }
    }
}

/// A value and its status as published in a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleasedValue {
    pub value: Option<String>,
    pub status: Status,
}

impl ReleasedValue {
    pub fn new(value: Option<&str>, status: Status) -> Self {
        Self {
            value: value.map(str::to_string),
            status,
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Missing
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
