//! Support tickets: `/sistemas/tickets/`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::{ApiClient, Page};
use crate::error::{ApiError, ApiResult};
use crate::resource::Resource;

pub const PATH: &str = "sistemas/tickets/";

/// Largest attachment accepted before upload (10 MiB).
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Normal,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub assigned_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub filename: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TicketFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct SystemsService {
    tickets: Resource<Ticket>,
}

impl SystemsService {
    pub fn new(client: ApiClient) -> Self {
        SystemsService {
            tickets: Resource::new(client, PATH),
        }
    }

    pub async fn list_tickets(&self, filter: &TicketFilter) -> ApiResult<Page<Ticket>> {
        self.tickets.list(filter).await
    }

    pub async fn create_ticket(&self, ticket: &NewTicket) -> ApiResult<Ticket> {
        if ticket.title.trim().is_empty() {
            return Err(ApiError::Validation {
                message: "A ticket needs a title".to_string(),
                fields: [("title".to_string(), vec!["Required.".to_string()])].into(),
            });
        }

        let created = self.tickets.create(ticket).await?;
        info!(id = created.id, "Ticket opened");
        Ok(created)
    }

    /// Attaches a file to a ticket (multipart field `archivo`).
    pub async fn upload_attachment(
        &self,
        ticket_id: i64,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> ApiResult<Attachment> {
        if bytes.len() > MAX_ATTACHMENT_BYTES {
            return Err(ApiError::Validation {
                message: format!("{filename} is larger than 10 MB"),
                fields: [("archivo".to_string(), vec!["File too large.".to_string()])].into(),
            });
        }

        let size = bytes.len();
        let path = self.tickets.action_path(ticket_id, "adjuntos");
        let attachment: Attachment = self
            .tickets
            .client()
            .upload(&path, "archivo", filename, content_type, bytes, &[])
            .await?;
        info!(ticket_id, attachment_id = attachment.id, size, "Attachment uploaded");
        Ok(attachment)
    }
}
