//! Email service for transactional mail.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates. Every call
//! site treats delivery as best-effort: failures are logged and never fail
//! the request that triggered them.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use thiserror::Error;

use telar_core::OrderId;

use crate::config::EmailConfig;
use crate::db::reports::LowStockVariant;
use crate::models::order::OrderItemDetail;

/// HTML template for the password reset code email.
#[derive(Template)]
#[template(path = "email/reset_code.html")]
struct ResetCodeEmailHtml<'a> {
    code: &'a str,
}

/// Plain text template for the password reset code email.
#[derive(Template)]
#[template(path = "email/reset_code.txt")]
struct ResetCodeEmailText<'a> {
    code: &'a str,
}

/// HTML template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationEmailHtml<'a> {
    order_id: OrderId,
    items: &'a [OrderItemDetail],
    total: Decimal,
}

/// Plain text template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationEmailText<'a> {
    order_id: OrderId,
    items: &'a [OrderItemDetail],
    total: Decimal,
}

/// HTML template for the low-stock alert email.
#[derive(Template)]
#[template(path = "email/low_stock.html")]
struct LowStockEmailHtml<'a> {
    threshold: i32,
    variants: &'a [LowStockVariant],
}

/// Plain text template for the low-stock alert email.
#[derive(Template)]
#[template(path = "email/low_stock.txt")]
struct LowStockEmailText<'a> {
    threshold: i32,
    variants: &'a [LowStockVariant],
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay is invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.smtp_username.clone(),
        })
    }

    /// Send a password reset code.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or a template fails to render.
    pub async fn send_reset_code(&self, to: &str, code: &str) -> Result<(), EmailError> {
        let html = ResetCodeEmailHtml { code }.render()?;
        let text = ResetCodeEmailText { code }.render()?;

        self.send_multipart_email(to, "Tu código para restablecer la contraseña", &text, &html)
            .await
    }

    /// Send an order confirmation after checkout.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or a template fails to render.
    pub async fn send_order_confirmation(
        &self,
        to: &str,
        order_id: OrderId,
        items: &[OrderItemDetail],
        total: Decimal,
    ) -> Result<(), EmailError> {
        let html = OrderConfirmationEmailHtml {
            order_id,
            items,
            total,
        }
        .render()?;
        let text = OrderConfirmationEmailText {
            order_id,
            items,
            total,
        }
        .render()?;

        self.send_multipart_email(
            to,
            &format!("Confirmación de tu pedido #{order_id}"),
            &text,
            &html,
        )
        .await
    }

    /// Send a low-stock alert to the admin address.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or a template fails to render.
    pub async fn send_low_stock_alert(
        &self,
        to: &str,
        threshold: i32,
        variants: &[LowStockVariant],
    ) -> Result<(), EmailError> {
        let html = LowStockEmailHtml {
            threshold,
            variants,
        }
        .render()?;
        let text = LowStockEmailText {
            threshold,
            variants,
        }
        .render()?;

        self.send_multipart_email(to, "Alerta de stock bajo", &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}
