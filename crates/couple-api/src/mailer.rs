use anyhow::{Context, Result};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub user: String,
    pub pass: String,
    /// Defaults to `user` when unset.
    pub from: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// No SMTP credentials; the mail was only logged.
    Simulated,
}

/// An outgoing email, already rendered.
#[derive(Debug, Clone)]
pub struct Email {
    pub subject: String,
    pub text: String,
    pub html: String,
}

pub struct Mailer {
    smtp: Option<(AsyncSmtpTransport<Tokio1Executor>, Mailbox)>,
    app_url: String,
}

impl Mailer {
    pub fn disabled(app_url: impl Into<String>) -> Self {
        Self {
            smtp: None,
            app_url: app_url.into(),
        }
    }

    pub fn new(config: SmtpConfig, app_url: impl Into<String>) -> Result<Self> {
        let from: Mailbox = config
            .from
            .as_deref()
            .unwrap_or(&config.user)
            .parse()
            .context("parsing SMTP sender address")?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .with_context(|| format!("configuring SMTP relay {}", config.host))?
            .credentials(Credentials::new(config.user, config.pass))
            .build();
        Ok(Self {
            smtp: Some((transport, from)),
            app_url: app_url.into(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.smtp.is_some()
    }

    pub fn app_url(&self) -> &str {
        &self.app_url
    }

    pub async fn send(&self, to: Mailbox, email: Email) -> Result<Delivery> {
        let Some((transport, from)) = &self.smtp else {
            info!("SMTP not configured, simulating mail to {}: {}", to, email.subject);
            return Ok(Delivery::Simulated);
        };

        let message = Message::builder()
            .from(from.clone())
            .to(to.clone())
            .subject(email.subject)
            .multipart(MultiPart::alternative_plain_html(email.text, email.html))
            .context("building email")?;
        transport
            .send(message)
            .await
            .with_context(|| format!("sending mail to {}", to))?;

        info!("Mail sent to {}", to);
        Ok(Delivery::Sent)
    }
}

pub fn mood_email(from: &str, mood: &str, app_url: &str) -> Email {
    let (from_html, mood_html) = (escape_html(from), escape_html(mood));
    Email {
        subject: format!("🥺 {} is feeling {}...", from, mood),
        text: format!(
            "{} just updated their mood to \"{}\". Send them a message or a hug: {}",
            from, mood, app_url
        ),
        html: format!(
            r#"<div style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 32px; text-align: center;">
  <h1 style="color: #be185d;">Mood Notification</h1>
  <p style="font-size: 18px;"><strong>{from_html}</strong> just updated their mood to:</p>
  <p style="display: inline-block; background: #fce7f3; color: #be185d; padding: 12px 24px; border-radius: 9999px; font-weight: 800;">{mood_html}</p>
  <p>It looks like your partner is missing you! Why don't you send them a message or a hug in the app?</p>
  <p><a href="{app_url}" style="background: #6366f1; color: white; padding: 12px 32px; border-radius: 12px; text-decoration: none;">Go to Dashboard ❤️</a></p>
</div>"#
        ),
    }
}

pub fn missing_you_email(sender: &str, message: &str, app_url: &str) -> Email {
    let (sender_html, message_html) = (escape_html(sender), escape_html(message));
    Email {
        subject: format!("💕 {} is Missing You!", sender),
        text: format!("{} just sent you a message:\n\n\"{}\"\n\nReply: {}", sender, message, app_url),
        html: format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 40px;">
  <h1 style="color: #667eea; text-align: center;">💕 Someone is Missing You! 💕</h1>
  <p style="font-size: 18px;"><strong style="color: #667eea;">{sender_html}</strong> just sent you a message:</p>
  <p style="font-size: 20px; font-style: italic;">"{message_html}"</p>
  <p style="text-align: center;"><a href="{app_url}" style="padding: 15px 40px; background: #667eea; color: white; text-decoration: none; border-radius: 30px;">💬 Reply Now</a></p>
</div>"#
        ),
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
