//! Delivery of change reports.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use session_types::ReportMessage;
use std::time::Duration;

use crate::config::{EmailConfig, SmtpConfig, SmtpSecurity};
use crate::error::{PollError, PollResult};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, report: &ReportMessage) -> PollResult<()>;
}

/// Sends each report as one multipart (plain + HTML) email
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
    subject: String,
}

impl SmtpNotifier {
    pub fn new(smtp: &SmtpConfig, email: &EmailConfig, timeout: Duration) -> PollResult<Self> {
        let builder = match smtp.security {
            SmtpSecurity::Tls => {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host).map_err(PollError::send)?
            }
            SmtpSecurity::Starttls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
                    .map_err(PollError::send)?
            }
            SmtpSecurity::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host),
        };

        let mut builder = builder.port(smtp.port).timeout(Some(timeout));
        if let Some(username) = &smtp.username {
            let password = smtp.password.clone().unwrap_or_default();
            builder = builder.credentials(Credentials::new(username.clone(), password));
        }

        Ok(Self {
            transport: builder.build(),
            from: email.from.parse()?,
            to: parse_recipients(&email.to)?,
            subject: email.subject.clone(),
        })
    }

    fn build_message(&self, report: &ReportMessage) -> PollResult<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(self.subject.clone());
        for recipient in &self.to {
            builder = builder.to(recipient.clone());
        }

        builder
            .multipart(MultiPart::alternative_plain_html(
                report.text.clone(),
                report.html.clone(),
            ))
            .map_err(PollError::send)
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, report: &ReportMessage) -> PollResult<()> {
        let message = self.build_message(report)?;
        self.transport
            .send(message)
            .await
            .map_err(PollError::send)?;

        tracing::info!("Sent change report to {} recipient(s)", self.to.len());
        Ok(())
    }
}

/// Writes reports to the log instead of sending them (`--dry-run`)
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, report: &ReportMessage) -> PollResult<()> {
        tracing::info!("Dry run, report not sent:\n{}", report.text);
        Ok(())
    }
}

fn parse_recipients(addresses: &[String]) -> PollResult<Vec<Mailbox>> {
    addresses
        .iter()
        .map(|address| address.parse::<Mailbox>().map_err(PollError::from))
        .collect()
}
