use std::sync::Arc;

use serde::Serialize;

use super::domain::{
    AgentInfo, Inquiry, InquiryDetail, InquiryFilter, InquiryId, InquirySubmission,
    InquiryStatus, NewInquiry, PropertyInfo, StatusChange, DEFAULT_INQUIRY_TYPE,
};
use crate::accounts::session::Session;
use crate::accounts::validation::is_valid_email;
use crate::error::ApiError;
use crate::listings::domain::ListingWithAgent;
use crate::pagination::{Page, PageRequest};
use crate::params::trimmed;
use crate::storage::{RepositoryError, Store};

const HIDDEN: &str = "Inquiry not found or unauthorized";

/// A stored inquiry plus the listing and agent it was addressed to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedInquiry {
    pub inquiry: Inquiry,
    pub property_info: Option<PropertyInfo>,
    pub agent_info: Option<AgentInfo>,
}

/// Contact form intake and the buyer/agent inquiry inboxes.
pub struct InquiryService<S> {
    store: Arc<S>,
}

impl<S> InquiryService<S>
where
    S: Store,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Anonymous submissions are accepted; a session only links the inquiry to its sender.
    pub async fn submit(
        &self,
        session: Option<&Session>,
        submission: InquirySubmission,
    ) -> Result<SubmittedInquiry, ApiError> {
        let (Some(name), Some(email), Some(message)) = (
            trimmed(submission.name),
            trimmed(submission.email),
            trimmed(submission.message),
        ) else {
            return Err(ApiError::bad_request(
                "Name, email, and message are required",
            ));
        };
        if !is_valid_email(&email) {
            return Err(ApiError::bad_request(
                "Please provide a valid email address",
            ));
        }

        let listing = match submission.property_id {
            Some(id) => Some(
                self.store
                    .listing(id)
                    .await?
                    .ok_or_else(|| ApiError::not_found("Property not found"))?,
            ),
            None => None,
        };

        let inquiry = self
            .store
            .insert_inquiry(NewInquiry {
                name,
                email,
                phone: trimmed(submission.phone),
                subject: trimmed(submission.subject),
                message,
                property_id: submission.property_id,
                inquiry_type: trimmed(submission.inquiry_type)
                    .unwrap_or_else(|| DEFAULT_INQUIRY_TYPE.to_string()),
                user_id: session.map(|session| session.user_id),
            })
            .await
            .map_err(|err| match err {
                RepositoryError::NotFound => ApiError::not_found("Property not found"),
                other => other.into(),
            })?;
        tracing::info!(
            inquiry_id = %inquiry.id,
            listing_id = ?inquiry.property_id,
            signed_in = session.is_some(),
            "inquiry submitted"
        );

        let (property_info, agent_info) = listing.map(split_listing).unzip();
        Ok(SubmittedInquiry {
            inquiry,
            property_info,
            agent_info: agent_info.flatten(),
        })
    }

    pub async fn my_inquiries(
        &self,
        session: &Session,
        status: Option<InquiryStatus>,
        page: PageRequest,
    ) -> Result<Page<InquiryDetail>, ApiError> {
        let filter = InquiryFilter {
            status,
            property_id: None,
        };
        Ok(self
            .store
            .user_inquiries(session.user_id, filter, page)
            .await?)
    }

    pub async fn agent_inquiries(
        &self,
        session: &Session,
        filter: InquiryFilter,
        page: PageRequest,
    ) -> Result<Page<InquiryDetail>, ApiError> {
        session.require_agent("Only agents can access this endpoint")?;
        Ok(self
            .store
            .agent_inquiries(session.user_id, filter, page)
            .await?)
    }

    pub async fn detail(
        &self,
        session: &Session,
        id: InquiryId,
    ) -> Result<InquiryDetail, ApiError> {
        self.visible(session, id).await
    }

    pub async fn update_status(
        &self,
        session: &Session,
        id: InquiryId,
        status: Option<String>,
        response: Option<String>,
    ) -> Result<Inquiry, ApiError> {
        let status = status
            .as_deref()
            .unwrap_or_default()
            .parse::<InquiryStatus>()
            .map_err(|err| ApiError::bad_request(err.to_string()))?;
        self.visible(session, id).await?;
        let change = StatusChange {
            status,
            response: trimmed(response),
        };
        let inquiry = self
            .store
            .update_inquiry_status(id, &change)
            .await?
            .ok_or_else(|| ApiError::not_found(HIDDEN))?;
        tracing::info!(
            inquiry_id = %id,
            user_id = %session.user_id,
            status = status.label(),
            "inquiry status changed"
        );
        Ok(inquiry)
    }

    pub async fn delete(&self, session: &Session, id: InquiryId) -> Result<(), ApiError> {
        self.visible(session, id).await?;
        if !self.store.delete_inquiry(id).await? {
            return Err(ApiError::not_found(HIDDEN));
        }
        tracing::info!(inquiry_id = %id, user_id = %session.user_id, "inquiry deleted");
        Ok(())
    }

    /// Loads an inquiry the caller may see; anything else reads as missing.
    async fn visible(&self, session: &Session, id: InquiryId) -> Result<InquiryDetail, ApiError> {
        let detail = self
            .store
            .inquiry(id)
            .await?
            .ok_or_else(|| ApiError::not_found(HIDDEN))?;
        if !session
            .viewer()
            .can_access(&detail.inquiry, detail.context.agent_id)
        {
            return Err(ApiError::not_found(HIDDEN));
        }
        Ok(detail)
    }
}

fn split_listing(listing: ListingWithAgent) -> (PropertyInfo, Option<AgentInfo>) {
    let ListingWithAgent { listing, agent } = listing;
    let property = PropertyInfo {
        id: listing.id,
        title: listing.title,
        price: listing.price,
        location: listing.location,
    };
    let agent = match (agent.agent_name, agent.agent_email) {
        (Some(name), Some(email)) => Some(AgentInfo {
            name,
            email,
            phone: agent.agent_phone,
        }),
        _ => None,
    };
    (property, agent)
}
