use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Postgres, QueryBuilder};

use super::listings::convert_all;
use super::{corrupt, total, PgStore};
use crate::accounts::domain::UserId;
use crate::inquiries::domain::{
    Inquiry, InquiryContext, InquiryDetail, InquiryFilter, InquiryId, NewInquiry, StatusChange,
    DEFAULT_INQUIRY_TYPE,
};
use crate::inquiries::repository::InquiryRepository;
use crate::listings::domain::ListingId;
use crate::pagination::{Page, PageRequest};
use crate::storage::RepositoryError;

const INQUIRY_COLUMNS: &str = "c.id, c.name, c.email, c.phone, c.subject, c.message, \
     c.property_id, c.inquiry_type, c.user_id, c.status, c.response, c.responded_at, \
     c.created_at, c.updated_at";

const CONTEXT_COLUMNS: &str = "p.title AS property_title, p.price AS property_price, \
     p.location AS property_location, p.images AS property_images, p.agent_id AS agent_id, \
     u.name AS agent_name, u.email AS agent_email, u.phone AS agent_phone";

const CONTEXT_JOINS: &str = "LEFT JOIN properties p ON p.id = c.property_id \
     LEFT JOIN users u ON u.id = p.agent_id";

#[derive(Debug, FromRow)]
struct InquiryRow {
    id: i64,
    name: String,
    email: String,
    phone: Option<String>,
    subject: Option<String>,
    message: String,
    property_id: Option<i64>,
    inquiry_type: String,
    user_id: Option<i64>,
    status: String,
    response: Option<String>,
    responded_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<InquiryRow> for Inquiry {
    type Error = RepositoryError;

    fn try_from(row: InquiryRow) -> Result<Self, Self::Error> {
        Ok(Inquiry {
            id: InquiryId(row.id),
            name: row.name,
            email: row.email,
            phone: row.phone,
            subject: row.subject,
            message: row.message,
            property_id: row.property_id.map(ListingId),
            inquiry_type: row.inquiry_type,
            user_id: row.user_id.map(UserId),
            status: row.status.parse().map_err(corrupt)?,
            response: row.response,
            responded_at: row.responded_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct InquiryDetailRow {
    #[sqlx(flatten)]
    inquiry: InquiryRow,
    property_title: Option<String>,
    property_price: Option<f64>,
    property_location: Option<String>,
    property_images: Option<Vec<String>>,
    agent_id: Option<i64>,
    agent_name: Option<String>,
    agent_email: Option<String>,
    agent_phone: Option<String>,
}

impl TryFrom<InquiryDetailRow> for InquiryDetail {
    type Error = RepositoryError;

    fn try_from(row: InquiryDetailRow) -> Result<Self, Self::Error> {
        Ok(InquiryDetail {
            inquiry: row.inquiry.try_into()?,
            context: InquiryContext {
                property_title: row.property_title,
                property_price: row.property_price,
                property_location: row.property_location,
                property_images: row.property_images,
                agent_name: row.agent_name,
                agent_email: row.agent_email,
                agent_phone: row.agent_phone,
                agent_id: row.agent_id.map(UserId),
            },
        })
    }
}

/// Whose inquiries an inbox query covers.
#[derive(Debug, Clone, Copy)]
enum Inbox {
    Sender(UserId),
    Agent(UserId),
}

fn inbox_query(
    inbox: Inbox,
    filter: InquiryFilter,
    select: &str,
) -> QueryBuilder<'static, Postgres> {
    let mut query =
        QueryBuilder::new(format!("SELECT {select} FROM contacts c {CONTEXT_JOINS} WHERE "));
    match inbox {
        Inbox::Sender(user) => {
            query.push("c.user_id = ").push_bind(user.0);
        }
        Inbox::Agent(agent) => {
            query
                .push("(p.agent_id = ")
                .push_bind(agent.0)
                .push(" OR (c.property_id IS NULL AND c.inquiry_type = ")
                .push_bind(DEFAULT_INQUIRY_TYPE)
                .push("))");
        }
    }
    if let Some(status) = filter.status {
        query.push(" AND c.status = ").push_bind(status.label());
    }
    if let Some(property_id) = filter.property_id {
        query.push(" AND c.property_id = ").push_bind(property_id);
    }
    query
}

impl PgStore {
    async fn inbox_page(
        &self,
        inbox: Inbox,
        filter: InquiryFilter,
        page: PageRequest,
    ) -> Result<Page<InquiryDetail>, RepositoryError> {
        let mut query = inbox_query(
            inbox,
            filter,
            &format!("{INQUIRY_COLUMNS}, {CONTEXT_COLUMNS}"),
        );
        query
            .push(" ORDER BY c.created_at DESC, c.id DESC LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let rows: Vec<InquiryDetailRow> = query.build_query_as().fetch_all(self.pool()).await?;
        let count: i64 = inbox_query(inbox, filter, "COUNT(*)")
            .build_query_scalar()
            .fetch_one(self.pool())
            .await?;
        Ok(Page::new(convert_all(rows)?, total(count)))
    }
}

#[async_trait]
impl InquiryRepository for PgStore {
    async fn insert_inquiry(&self, inquiry: NewInquiry) -> Result<Inquiry, RepositoryError> {
        let row: InquiryRow = sqlx::query_as(&format!(
            "INSERT INTO contacts AS c (name, email, phone, subject, message, property_id, \
               inquiry_type, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {INQUIRY_COLUMNS}"
        ))
        .bind(&inquiry.name)
        .bind(&inquiry.email)
        .bind(&inquiry.phone)
        .bind(&inquiry.subject)
        .bind(&inquiry.message)
        .bind(inquiry.property_id.map(|id| id.0))
        .bind(&inquiry.inquiry_type)
        .bind(inquiry.user_id.map(|id| id.0))
        .fetch_one(self.pool())
        .await?;
        row.try_into()
    }

    async fn inquiry(&self, id: InquiryId) -> Result<Option<InquiryDetail>, RepositoryError> {
        let row: Option<InquiryDetailRow> = sqlx::query_as(&format!(
            "SELECT {INQUIRY_COLUMNS}, {CONTEXT_COLUMNS} FROM contacts c {CONTEXT_JOINS} \
             WHERE c.id = $1"
        ))
        .bind(id.0)
        .fetch_optional(self.pool())
        .await?;
        row.map(InquiryDetail::try_from).transpose()
    }

    async fn user_inquiries(
        &self,
        user: UserId,
        filter: InquiryFilter,
        page: PageRequest,
    ) -> Result<Page<InquiryDetail>, RepositoryError> {
        self.inbox_page(Inbox::Sender(user), filter, page).await
    }

    async fn agent_inquiries(
        &self,
        agent: UserId,
        filter: InquiryFilter,
        page: PageRequest,
    ) -> Result<Page<InquiryDetail>, RepositoryError> {
        self.inbox_page(Inbox::Agent(agent), filter, page).await
    }

    async fn update_inquiry_status(
        &self,
        id: InquiryId,
        change: &StatusChange,
    ) -> Result<Option<Inquiry>, RepositoryError> {
        let row: Option<InquiryRow> = sqlx::query_as(&format!(
            "UPDATE contacts AS c SET \
               status = $2, \
               response = COALESCE($3, response), \
               responded_at = CASE WHEN $2 = 'responded' THEN NOW() ELSE responded_at END, \
               updated_at = NOW() \
             WHERE c.id = $1 RETURNING {INQUIRY_COLUMNS}"
        ))
        .bind(id.0)
        .bind(change.status.label())
        .bind(&change.response)
        .fetch_optional(self.pool())
        .await?;
        row.map(Inquiry::try_from).transpose()
    }

    async fn delete_inquiry(&self, id: InquiryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id.0)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn recent_agent_inquiries(
        &self,
        agent: UserId,
        limit: u32,
    ) -> Result<Vec<InquiryDetail>, RepositoryError> {
        let rows: Vec<InquiryDetailRow> = sqlx::query_as(&format!(
            "SELECT {INQUIRY_COLUMNS}, {CONTEXT_COLUMNS} FROM contacts c {CONTEXT_JOINS} \
             WHERE p.agent_id = $1 ORDER BY c.created_at DESC, c.id DESC LIMIT $2"
        ))
        .bind(agent.0)
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await?;
        convert_all(rows)
    }

    async fn open_inquiry_count(&self, user: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM contacts WHERE user_id = $1 AND status <> 'closed'",
        )
        .bind(user.0)
        .fetch_one(self.pool())
        .await?;
        Ok(count)
    }
}
