//! Email service for sending verification codes.

use lettre::{
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::path::Path;

use crate::{config::Config, errors::Error};

const VERIFICATION_SUBJECT: &str = "TodoIng 邮箱验证码";

pub struct EmailService {
    transport: EmailTransport,
    from: String,
}

enum EmailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
    /// No mail configuration; codes are logged so development setups still work.
    Disabled,
}

impl EmailService {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let transport = if let Some(dir) = config.email_file_dir.as_deref().filter(|d| !d.is_empty()) {
            // File transport for development/testing
            let emails_dir = Path::new(dir);
            if !emails_dir.exists() {
                std::fs::create_dir_all(emails_dir).map_err(|e| Error::Internal {
                    operation: format!("create emails directory: {e}"),
                })?;
            }
            EmailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(emails_dir))
        } else if let Some(host) = config.email_host.as_deref().filter(|h| !h.is_empty()) {
            let builder = if config.email_secure {
                AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            }
            .map_err(|e| Error::Internal {
                operation: format!("create SMTP transport: {e}"),
            })?
            .port(config.email_port);

            let builder = match (&config.email_user, &config.email_pass) {
                (Some(user), Some(pass)) if !user.is_empty() => {
                    builder.credentials(Credentials::new(user.clone(), pass.clone()))
                }
                _ => builder,
            };

            EmailTransport::Smtp(builder.build())
        } else {
            EmailTransport::Disabled
        };

        let from = config
            .email_from
            .clone()
            .filter(|f| !f.is_empty())
            .or_else(|| config.email_user.clone().filter(|u| !u.is_empty()))
            .unwrap_or_else(|| "TodoIng <noreply@todoing.app>".to_string());

        Ok(Self { transport, from })
    }

    /// Whether sending actually delivers mail somewhere.
    pub fn is_enabled(&self) -> bool {
        !matches!(self.transport, EmailTransport::Disabled)
    }

    pub async fn send_verification_code(&self, to_email: &str, code: &str) -> Result<(), Error> {
        if let EmailTransport::Disabled = self.transport {
            tracing::info!("Email transport disabled; verification code for {to_email}: {code}");
            return Ok(());
        }

        let body = self.create_verification_body(code);
        self.send_email(to_email, VERIFICATION_SUBJECT, &body).await
    }

    async fn send_email(&self, to_email: &str, subject: &str, body: &str) -> Result<(), Error> {
        let from = self.from.parse::<Mailbox>().map_err(|e| Error::Internal {
            operation: format!("parse from email: {e}"),
        })?;

        let to = to_email.parse::<Mailbox>().map_err(|e| Error::EmailDelivery {
            operation: format!("parse to email: {e}"),
        })?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| Error::EmailDelivery {
                operation: format!("build email message: {e}"),
            })?;

        match &self.transport {
            EmailTransport::Smtp(smtp) => {
                smtp.send(message).await.map_err(|e| Error::EmailDelivery {
                    operation: format!("send SMTP email: {e}"),
                })?;
            }
            EmailTransport::File(file) => {
                file.send(message).await.map_err(|e| Error::EmailDelivery {
                    operation: format!("send file email: {e}"),
                })?;
            }
            EmailTransport::Disabled => {}
        }

        Ok(())
    }

    fn create_verification_body(&self, code: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>TodoIng 邮箱验证码</title>
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .code {{ font-size: 28px; font-weight: bold; letter-spacing: 6px; color: #1a73e8; }}
        .footer {{ margin-top: 30px; font-size: 12px; color: #666; }}
    </style>
</head>
<body>
    <div class="container">
        <h2>TodoIng 邮箱验证码</h2>

        <p>您好，</p>

        <p>您的验证码是：</p>

        <p class="code">{code}</p>

        <p>验证码 10 分钟内有效，请尽快完成验证。</p>

        <p>如果这不是您的操作，请忽略此邮件。</p>

        <div class="footer">
            <p>此邮件由系统自动发送，请勿回复。</p>
        </div>
    </div>
</body>
</html>"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_transport_succeeds_without_sending() {
        let config = Config::default();
        let service = EmailService::new(&config).unwrap();

        assert!(!service.is_enabled());
        assert!(service.send_verification_code("user@example.com", "123456").await.is_ok());
    }

    #[tokio::test]
    async fn file_transport_writes_the_email() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            email_file_dir: Some(dir.path().to_string_lossy().into_owned()),
            ..Config::default()
        };
        let service = EmailService::new(&config).unwrap();

        assert!(service.is_enabled());
        service
            .send_verification_code("user@example.com", "654321")
            .await
            .unwrap();

        let wrote_one = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(wrote_one, 1);
    }

    #[test]
    fn verification_body_contains_code_and_validity() {
        let config = Config::default();
        let service = EmailService::new(&config).unwrap();

        let body = service.create_verification_body("987654");
        assert!(body.contains("987654"));
        assert!(body.contains("10 分钟"));
        assert!(body.contains("TodoIng 邮箱验证码"));
    }

    #[tokio::test]
    async fn invalid_recipient_is_a_delivery_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            email_file_dir: Some(dir.path().to_string_lossy().into_owned()),
            ..Config::default()
        };
        let service = EmailService::new(&config).unwrap();

        let error = service
            .send_verification_code("not-an-address", "111111")
            .await
            .unwrap_err();
        assert_eq!(error.user_message(), "Failed to send email");
    }
}
