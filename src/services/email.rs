//! Outgoing mail for admin verification and password reset
//!
//! With `mail.enabled = false` messages are written to the log instead of
//! being sent, which keeps local setups working without an SMTP server.

use anyhow::{anyhow, Result};
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::MailConfig;

/// A rendered plain-text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub struct EmailService {
    config: MailConfig,
    /// Base URL used to build links, without trailing slash
    public_url: String,
}

impl EmailService {
    pub fn new(config: MailConfig, public_url: &str) -> Self {
        Self {
            config,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn verification_mail(&self, to: &str, name: &str, secret: &str) -> OutgoingMail {
        let link = format!(
            "{}/api/admin/auth/verify?token={}",
            self.public_url,
            urlencoding::encode(secret)
        );
        OutgoingMail {
            to: to.to_string(),
            subject: "Verify your Learnboard admin account".to_string(),
            body: format!(
                "Hi {},\n\nConfirm your email address by opening this link:\n\n{}\n\nThe link expires in 24 hours. If you did not sign up, ignore this message.\n",
                name, link
            ),
        }
    }

    pub fn reset_mail(&self, to: &str, name: &str, secret: &str) -> OutgoingMail {
        let link = format!(
            "{}/login?reset={}",
            self.public_url,
            urlencoding::encode(secret)
        );
        OutgoingMail {
            to: to.to_string(),
            subject: "Reset your Learnboard password".to_string(),
            body: format!(
                "Hi {},\n\nA password reset was requested for your account. Open this link to choose a new password:\n\n{}\n\nIf you did not request this, ignore this message.\n",
                name, link
            ),
        }
    }

    /// Deliver a message. Failures are logged and swallowed.
    pub async fn deliver(&self, mail: OutgoingMail) {
        if !self.config.enabled {
            tracing::info!(to = %mail.to, subject = %mail.subject, "Mail disabled, message not sent:\n{}", mail.body);
            return;
        }

        if let Err(e) = self.send(&mail).await {
            tracing::error!(to = %mail.to, "Failed to send mail: {:#}", e);
        }
    }

    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        if self.config.smtp_host.is_empty() {
            return Err(anyhow!("SMTP host not configured"));
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from_address);
        let message = Message::builder()
            .from(from.parse().map_err(|e| anyhow!("Invalid from address: {}", e))?)
            .to(mail.to.parse().map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
            .port(self.config.smtp_port);
        if !self.config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            ));
        }

        builder
            .build()
            .send(message)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        tracing::info!(to = %mail.to, "Sent mail: {}", mail.subject);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> EmailService {
        EmailService::new(MailConfig::default(), "http://localhost:8080/")
    }

    #[test]
    fn test_verification_link() {
        let mail = service().verification_mail("ada@example.com", "Ada", "abc123");
        assert!(mail
            .body
            .contains("http://localhost:8080/api/admin/auth/verify?token=abc123"));
        assert_eq!(mail.to, "ada@example.com");
    }

    #[test]
    fn test_reset_link() {
        let mail = service().reset_mail("ada@example.com", "Ada", "xyz");
        assert!(mail.body.contains("http://localhost:8080/login?reset=xyz"));
    }

    #[tokio::test]
    async fn test_disabled_mail_is_logged_only() {
        let svc = service();
        let mail = svc.verification_mail("ada@example.com", "Ada", "abc123");
        svc.deliver(mail).await;
    }
}
