use std::sync::Arc;

use anyhow::Context as _;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use uuid::Uuid;

use crate::config::{MailConfig, MailSecurity};
use crate::domain::repository::Mailer;
use crate::domain::types::Issue;

/// SMTP-backed [`Mailer`]. Building it does not open a connection.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    security: MailSecurity,
    from: Mailbox,
    public_base_url: String,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig, public_base_url: &str) -> anyhow::Result<Self> {
        let builder = match config.security {
            MailSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .context("configure TLS relay")?,
            MailSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .context("configure STARTTLS relay")?
            }
            MailSecurity::None => {
                tracing::warn!(host = %config.host, "SMTP credentials will be sent unencrypted");
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            }
        };
        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        let from = config
            .username
            .parse()
            .context("EMAIL_USERNAME is not a valid sender address")?;
        Ok(Self {
            transport: Arc::new(transport),
            security: config.security,
            from,
            public_base_url: public_base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn security(&self) -> MailSecurity {
        self.security
    }

    fn link(&self, path: &str, token: Uuid) -> String {
        format!("{}{path}?token={token}", self.public_base_url)
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse().context("parse recipient address")?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .context("build message")?;
        self.transport
            .send(message)
            .await
            .context("send message")?;
        Ok(())
    }
}

impl Mailer for SmtpMailer {
    async fn send_verification(&self, to: &str, verify_token: Uuid) -> anyhow::Result<()> {
        let link = self.link("/user/verify-email", verify_token);
        self.send(
            to,
            "Подтверждение адреса электронной почты",
            format!("Для подтверждения адреса перейдите по ссылке:\n{link}\n"),
        )
        .await
    }

    async fn send_password_reset(&self, to: &str, verify_token: Uuid) -> anyhow::Result<()> {
        let link = self.link("/user/reset-password", verify_token);
        self.send(
            to,
            "Сброс пароля",
            format!(
                "Чтобы задать новый пароль, перейдите по ссылке:\n{link}\n\n\
                 Если вы не запрашивали сброс, просто проигнорируйте это письмо.\n"
            ),
        )
        .await
    }

    async fn send_status_changed(&self, to: &str, issue: &Issue) -> anyhow::Result<()> {
        self.send(
            to,
            "Статус обращения изменён",
            format!(
                "Статус вашего обращения «{}» ({}) изменён на «{}».\n",
                issue.short_desc, issue.address, issue.status
            ),
        )
        .await
    }
}
