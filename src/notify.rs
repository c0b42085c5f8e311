//! Outbound email of a single-item summary or a bulk spreadsheet export
//!
//! [`Notifier`] decides what to send and [`Mailer`] sends it. The SMTP
//! transport is built once from an explicit [`MailConfig`] at startup.

use crate::config::MailConfig;
use crate::error::{Error, NotificationError, Result};
use crate::export::{SpreadsheetExport, XLSX_CONTENT_TYPE};
use crate::pipeline::AggregationPipeline;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Subject used when the request leaves it blank
pub const DEFAULT_SUBJECT: &str = "Pokémon catalog";

/// Body of an outgoing message
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MailBody {
    /// Plain text
    Plain(String),
    /// HTML document
    Html(String),
}

/// A file attached to an outgoing message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailAttachment {
    /// File name shown to the recipient
    pub file_name: String,
    /// MIME type of `bytes`
    pub content_type: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

/// Transport-independent description of one email
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMail {
    /// Recipient address, unparsed
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Message body
    pub body: MailBody,
    /// Optional single attachment
    pub attachment: Option<MailAttachment>,
}

/// Something that can deliver an [`OutgoingMail`]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver `mail`, returning once the transport has accepted it
    async fn send(&self, mail: OutgoingMail) -> std::result::Result<(), NotificationError>;
}

/// SMTP mailer authenticated with the configured sender credentials
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build the transport from `config`
    ///
    /// No connection is opened here; the first send connects.
    pub fn new(config: &MailConfig) -> Result<Self> {
        config.validate()?;

        let from: Mailbox = config.sender_address.parse().map_err(|e| Error::Config {
            message: format!("invalid sender address: {}", e),
            key: Some("mail.sender_address".to_string()),
        })?;

        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        }
        .map_err(|e| Error::Config {
            message: format!("invalid mail host: {}", e),
            key: Some("mail.host".to_string()),
        })?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.sender_address.clone(),
                config.sender_password.clone(),
            ))
            .build();

        tracing::info!(
            host = %config.host,
            port = config.port,
            starttls = config.starttls,
            "SMTP mailer configured"
        );

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> std::result::Result<(), NotificationError> {
        let to: Mailbox = mail.to.parse().map_err(|e: lettre::address::AddressError| {
            NotificationError::Address {
                address: mail.to.clone(),
                reason: e.to_string(),
            }
        })?;

        let builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject);

        let message = match mail.attachment {
            None => match mail.body {
                MailBody::Plain(text) => builder.header(ContentType::TEXT_PLAIN).body(text),
                MailBody::Html(html) => builder.header(ContentType::TEXT_HTML).body(html),
            },
            Some(attachment) => {
                let content_type = ContentType::parse(&attachment.content_type)
                    .map_err(|e| NotificationError::Build(e.to_string()))?;
                let body = match mail.body {
                    MailBody::Plain(text) => SinglePart::plain(text),
                    MailBody::Html(html) => SinglePart::html(html),
                };
                builder.multipart(
                    MultiPart::mixed().singlepart(body).singlepart(
                        Attachment::new(attachment.file_name)
                            .body(attachment.bytes, content_type),
                    ),
                )
            }
        }
        .map_err(|e| NotificationError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;
        Ok(())
    }
}

/// Body of `POST /items/notify`
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotifyRequest {
    /// Recipient address
    #[serde(default)]
    pub email_address: String,
    /// Subject line; blank falls back to [`DEFAULT_SUBJECT`]
    #[serde(default)]
    pub subject: String,
    /// Introductory text (HTML-escaped in summaries)
    #[serde(default)]
    pub body: String,
    /// When present, a single-item summary is sent instead of an export
    #[serde(default)]
    pub item_name: Option<String>,
    /// Numeric id shown in the summary
    #[serde(default)]
    pub item_id: Option<u32>,
    /// Comma-separated category names
    #[serde(default)]
    pub item_categories: Option<String>,
    /// Image URL embedded in the summary
    #[serde(default)]
    pub item_image: Option<String>,
    /// Name filter applied to the exported set
    #[serde(default)]
    pub name_filter: Option<String>,
    /// Category filter applied to the exported set
    #[serde(default)]
    pub category_filter: Option<String>,
}

impl NotifyRequest {
    fn single_item_name(&self) -> Option<&str> {
        self.item_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    fn subject_or_default(&self) -> String {
        match self.subject.trim() {
            "" => DEFAULT_SUBJECT.to_string(),
            subject => subject.to_string(),
        }
    }
}

/// What a successful notification carried
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NotifyOutcome {
    /// Single-item HTML summary
    ItemSummary {
        /// Name of the summarized item
        #[serde(rename = "itemName")]
        item_name: String,
    },
    /// Plain body plus spreadsheet of the filtered set
    Export {
        /// Attachment file name
        #[serde(rename = "fileName")]
        file_name: String,
        /// Data rows in the attached workbook
        rows: usize,
    },
}

/// Builds and sends notifications on top of the pipeline
#[derive(Clone)]
pub struct Notifier {
    pipeline: AggregationPipeline,
    mailer: Option<Arc<dyn Mailer>>,
}

impl Notifier {
    /// `mailer` is `None` when mail transport is not configured
    pub fn new(pipeline: AggregationPipeline, mailer: Option<Arc<dyn Mailer>>) -> Self {
        Self { pipeline, mailer }
    }

    /// Send the email described by `request`
    pub async fn notify(&self, request: &NotifyRequest) -> Result<NotifyOutcome> {
        let mailer = self.mailer.as_ref().ok_or_else(|| Error::Config {
            message: "mail transport is not configured".to_string(),
            key: Some("mail".to_string()),
        })?;

        let recipient = request.email_address.trim();
        if recipient.is_empty() {
            return Err(Error::InvalidInput {
                field: "emailAddress".to_string(),
                message: "recipient address is required".to_string(),
            });
        }

        let (mail, outcome) = match request.single_item_name() {
            Some(item_name) => {
                let mail = OutgoingMail {
                    to: recipient.to_string(),
                    subject: request.subject_or_default(),
                    body: MailBody::Html(render_item_html(request, item_name)),
                    attachment: None,
                };
                let outcome = NotifyOutcome::ItemSummary {
                    item_name: item_name.to_string(),
                };
                (mail, outcome)
            }
            None => {
                let items = self
                    .pipeline
                    .filtered_items(
                        request.name_filter.as_deref(),
                        request.category_filter.as_deref(),
                    )
                    .await
                    .map_err(|e| Error::Export(format!("filtered item set unavailable: {}", e)))?;
                let export = SpreadsheetExport::render(&items)?;
                let outcome = NotifyOutcome::Export {
                    file_name: export.file_name.clone(),
                    rows: export.rows,
                };
                let mail = OutgoingMail {
                    to: recipient.to_string(),
                    subject: request.subject_or_default(),
                    body: MailBody::Plain(request.body.clone()),
                    attachment: Some(MailAttachment {
                        file_name: export.file_name,
                        content_type: XLSX_CONTENT_TYPE.to_string(),
                        bytes: export.bytes,
                    }),
                };
                (mail, outcome)
            }
        };

        mailer.send(mail).await.map_err(|e| {
            tracing::error!(recipient, error = %e, "notification not sent");
            Error::from(e)
        })?;

        tracing::info!(recipient, ?outcome, "notification sent");
        Ok(outcome)
    }
}

fn render_item_html(request: &NotifyRequest, item_name: &str) -> String {
    let mut html = String::from("<html><body>");
    if !request.body.trim().is_empty() {
        html.push_str(&format!("<p>{}</p>", escape_html(&request.body)));
    }
    html.push_str(&format!("<h2>{}</h2>", escape_html(item_name)));
    if let Some(id) = request.item_id {
        html.push_str(&format!("<p><strong>ID:</strong> {}</p>", id));
    }
    if let Some(categories) = request.item_categories.as_deref().filter(|c| !c.is_empty()) {
        html.push_str(&format!(
            "<p><strong>Types:</strong> {}</p>",
            escape_html(categories)
        ));
    }
    if let Some(image) = request.item_image.as_deref().filter(|i| !i.is_empty()) {
        html.push_str(&format!(
            "<img src=\"{}\" alt=\"{}\" />",
            escape_html(image),
            escape_html(item_name)
        ));
    }
    html.push_str("</body></html>");
    html
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_helpers::{FakeCatalog, RecordingMailer, mixed_catalog};

    fn notifier(mailer: Option<Arc<RecordingMailer>>) -> Notifier {
        let source = Arc::new(FakeCatalog::with_items(mixed_catalog(12)));
        let pipeline = AggregationPipeline::new(source, &Config::default());
        Notifier::new(pipeline, mailer.map(|m| m as Arc<dyn Mailer>))
    }

    fn request(to: &str) -> NotifyRequest {
        NotifyRequest {
            email_address: to.to_string(),
            subject: "Catalog".to_string(),
            body: "See attached".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn missing_mail_transport_is_a_config_error() {
        let err = notifier(None).notify(&request("ash@example.com")).await.unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn blank_recipient_is_rejected() {
        let mailer = Arc::new(RecordingMailer::default());
        let err = notifier(Some(mailer.clone()))
            .notify(&request("  "))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidInput { ref field, .. } if field == "emailAddress"));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn item_name_sends_escaped_html_summary() {
        let mailer = Arc::new(RecordingMailer::default());
        let req = NotifyRequest {
            item_name: Some("mr-mime".into()),
            item_id: Some(122),
            item_categories: Some("psychic, fairy".into()),
            item_image: Some("https://img/122.png".into()),
            body: "<b>look</b>".into(),
            ..request("ash@example.com")
        };

        let outcome = notifier(Some(mailer.clone())).notify(&req).await.unwrap();
        assert_eq!(
            outcome,
            NotifyOutcome::ItemSummary {
                item_name: "mr-mime".into()
            }
        );

        let sent = mailer.sent.lock().unwrap();
        let mail = &sent[0];
        assert!(mail.attachment.is_none());
        let MailBody::Html(html) = &mail.body else {
            panic!("expected html body");
        };
        assert!(html.contains("<h2>mr-mime</h2>"));
        assert!(html.contains("122"));
        assert!(html.contains("psychic, fairy"));
        assert!(html.contains("&lt;b&gt;look&lt;/b&gt;"));
    }

    #[tokio::test]
    async fn no_item_name_attaches_filtered_export() {
        let mailer = Arc::new(RecordingMailer::default());
        let req = NotifyRequest {
            category_filter: Some("fire".into()),
            ..request("ash@example.com")
        };

        let outcome = notifier(Some(mailer.clone())).notify(&req).await.unwrap();
        let NotifyOutcome::Export { rows, .. } = outcome else {
            panic!("expected export outcome");
        };
        assert_eq!(rows, 4);

        let sent = mailer.sent.lock().unwrap();
        let mail = &sent[0];
        assert_eq!(mail.body, MailBody::Plain("See attached".into()));
        let attachment = mail.attachment.as_ref().unwrap();
        assert_eq!(attachment.content_type, XLSX_CONTENT_TYPE);
        assert!(attachment.bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn blank_subject_falls_back_to_default() {
        let mailer = Arc::new(RecordingMailer::default());
        let req = NotifyRequest {
            subject: " ".into(),
            item_name: Some("pikachu".into()),
            ..request("ash@example.com")
        };

        notifier(Some(mailer.clone())).notify(&req).await.unwrap();
        assert_eq!(mailer.sent.lock().unwrap()[0].subject, DEFAULT_SUBJECT);
    }

    #[tokio::test]
    async fn transport_failure_is_surfaced() {
        let mailer = Arc::new(RecordingMailer {
            fail_with: Some(NotificationError::Transport("connection reset".into())),
            ..Default::default()
        });
        let req = NotifyRequest {
            item_name: Some("pikachu".into()),
            ..request("ash@example.com")
        };

        let err = notifier(Some(mailer)).notify(&req).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Notification(NotificationError::Transport(_))
        ));
    }

    #[test]
    fn smtp_mailer_rejects_incomplete_config() {
        let config = MailConfig {
            sender_address: "bot@example.com".into(),
            sender_password: "secret".into(),
            host: String::new(),
            port: 587,
            starttls: true,
        };
        assert!(matches!(SmtpMailer::new(&config), Err(Error::Config { .. })));
    }

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;"
        );
    }
}
