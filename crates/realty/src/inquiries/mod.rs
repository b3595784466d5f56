//! Contact-form inquiries and the inboxes that read them.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AgentInfo, Inquiry, InquiryDetail, InquiryFilter, InquiryId, InquiryStatus,
    InquirySubmission, PropertyInfo, Viewer,
};
pub use repository::InquiryRepository;
pub use router::inquiry_router;
pub use service::{InquiryService, SubmittedInquiry};
