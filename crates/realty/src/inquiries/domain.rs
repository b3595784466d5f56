use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::domain::{Role, UserId};
use crate::listings::domain::ListingId;
use crate::params::empty_as_none;

pub const DEFAULT_INQUIRY_TYPE: &str = "general";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InquiryId(pub i64);

impl fmt::Display for InquiryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a contact inquiry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquiryStatus {
    #[default]
    New,
    InProgress,
    Responded,
    Closed,
}

impl InquiryStatus {
    pub const ALL: [InquiryStatus; 4] = [
        InquiryStatus::New,
        InquiryStatus::InProgress,
        InquiryStatus::Responded,
        InquiryStatus::Closed,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            InquiryStatus::New => "new",
            InquiryStatus::InProgress => "in_progress",
            InquiryStatus::Responded => "responded",
            InquiryStatus::Closed => "closed",
        }
    }
}

impl FromStr for InquiryStatus {
    type Err = InvalidInquiryStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.label() == normalized)
            .ok_or(InvalidInquiryStatus)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid status. Must be one of: new, in_progress, responded, closed")]
pub struct InvalidInquiryStatus;

/// A stored contact-form submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inquiry {
    pub id: InquiryId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub property_id: Option<ListingId>,
    pub inquiry_type: String,
    pub user_id: Option<UserId>,
    pub status: InquiryStatus,
    pub response: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Listing and agent columns joined onto inquiry reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InquiryContext {
    pub property_title: Option<String>,
    pub property_price: Option<f64>,
    pub property_location: Option<String>,
    pub property_images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_phone: Option<String>,
    #[serde(skip)]
    pub agent_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InquiryDetail {
    #[serde(flatten)]
    pub inquiry: Inquiry,
    #[serde(flatten)]
    pub context: InquiryContext,
}

/// Raw contact-form payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InquirySubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub property_id: Option<ListingId>,
    #[serde(default)]
    pub inquiry_type: Option<String>,
}

/// Validated inquiry ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInquiry {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub property_id: Option<ListingId>,
    pub inquiry_type: String,
    pub user_id: Option<UserId>,
}

/// Filters on the inquiry inbox queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryFilter {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<InquiryStatus>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub property_id: Option<i64>,
}

impl InquiryFilter {
    pub fn matches(&self, inquiry: &Inquiry) -> bool {
        self.status.map_or(true, |status| status == inquiry.status)
            && self
                .property_id
                .map_or(true, |id| inquiry.property_id == Some(ListingId(id)))
    }
}

/// Who is looking at an inquiry. Decides visibility for reads, status changes and deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: UserId,
    pub role: Role,
}

impl Viewer {
    /// Agents see inquiries on their own listings and general ones; everyone else sees what they sent.
    pub fn can_access(&self, inquiry: &Inquiry, listing_agent: Option<UserId>) -> bool {
        if self.role.is_agent() {
            inquiry.property_id.is_none() || listing_agent == Some(self.user_id)
        } else {
            inquiry.user_id == Some(self.user_id)
        }
    }

    /// Inbox membership for agents: own listings, plus inquiries without a listing of the general type.
    pub fn in_agent_inbox(&self, inquiry: &Inquiry, listing_agent: Option<UserId>) -> bool {
        listing_agent == Some(self.user_id)
            || (inquiry.property_id.is_none() && inquiry.inquiry_type == DEFAULT_INQUIRY_TYPE)
    }
}

/// Status change requested by a viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: InquiryStatus,
    pub response: Option<String>,
}

impl StatusChange {
    pub fn apply(&self, inquiry: &mut Inquiry, now: DateTime<Utc>) {
        inquiry.status = self.status;
        if let Some(response) = &self.response {
            inquiry.response = Some(response.clone());
        }
        inquiry.updated_at = Some(now);
        if self.status == InquiryStatus::Responded {
            inquiry.responded_at = Some(now);
        }
    }
}

/// Compact listing reference returned after a submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyInfo {
    pub id: ListingId,
    pub title: String,
    pub price: f64,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentInfo {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}
