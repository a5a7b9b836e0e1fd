use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{info, instrument};

use classhero_config::EmailConfig;
use classhero_core::AppError;

pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    #[instrument(skip(self, code))]
    pub async fn send_otp_email(
        &self,
        to_email: &str,
        code: &str,
        valid_minutes: i64,
    ) -> Result<(), AppError> {
        let html_body = self.otp_template(code, valid_minutes);
        let text_body = format!(
            "Hello,\n\n\
             Your ClassHero access code is: {}\n\n\
             The code expires in {} minutes.\n\n\
             If you didn't request this code, you can ignore this email.\n\n\
             ClassHero Team",
            code, valid_minutes
        );

        self.send_email(to_email, "ClassHero - Access code", &text_body, &html_body)
            .await
    }

    #[instrument(skip(self, changes))]
    pub async fn send_profile_update_notice(
        &self,
        admin_email: &str,
        user_email: &str,
        changes: &[String],
    ) -> Result<(), AppError> {
        let text_list = changes
            .iter()
            .map(|c| format!("- {}", c))
            .collect::<Vec<_>>()
            .join("\n");

        let text_body = format!(
            "The user {} updated their profile and needs to be validated again.\n\n\
             Changes:\n{}\n\n\
             ClassHero",
            user_email, text_list
        );
        let html_body = self.profile_update_template(user_email, changes);

        self.send_email(
            admin_email,
            "ClassHero - Profile pending validation",
            &text_body,
            &html_body,
        )
        .await
    }

    #[instrument(skip(self, html_body, text_body))]
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), AppError> {
        if !self.config.enabled {
            info!(to = %to_email, subject = %subject, "SMTP disabled, email not sent");
            tracing::debug!(body = %text_body, "Unsent email body");
            return Ok(());
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| AppError::internal_error(format!("Invalid from email: {}", e)))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| AppError::internal_error(format!("Invalid to email: {}", e)))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| AppError::internal_error(format!("Failed to build email: {}", e)))?;

        let mailer = if self.config.smtp_username.is_empty() {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build()
        } else {
            let creds = Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            );

            SmtpTransport::relay(&self.config.smtp_host)
                .map_err(|e| {
                    AppError::internal_error(format!("Failed to create SMTP relay: {}", e))
                })?
                .port(self.config.smtp_port)
                .credentials(creds)
                .build()
        };

        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::internal_error(format!("Task join error: {}", e)))?
            .map_err(|e| AppError::internal_error(format!("Failed to send email: {}", e)))?;

        info!(to = %to_email, "Email sent");

        Ok(())
    }

    fn otp_template(&self, code: &str, valid_minutes: i64) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>ClassHero - Access code</title>
</head>
<body style="font-family: Arial, sans-serif; background-color: #f4f4f7; margin: 0; padding: 24px;">
    <table role="presentation" width="100%" cellspacing="0" cellpadding="0">
        <tr>
            <td align="center">
                <table role="presentation" width="480" cellspacing="0" cellpadding="0" style="background: #ffffff; border-radius: 8px; padding: 32px;">
                    <tr>
                        <td>
                            <h1 style="color: #1f2937; font-size: 22px; margin: 0 0 16px;">Your access code</h1>
                            <p style="color: #4b5563; font-size: 15px;">Use the code below to sign in to ClassHero.</p>
                            <p style="font-size: 32px; letter-spacing: 8px; font-weight: bold; color: #4f46e5; text-align: center; margin: 24px 0;">{code}</p>
                            <p style="color: #6b7280; font-size: 13px;">The code expires in {valid_minutes} minutes. If you didn't request it, you can ignore this email.</p>
                        </td>
                    </tr>
                </table>
            </td>
        </tr>
    </table>
</body>
</html>"#
        )
    }

    fn profile_update_template(&self, user_email: &str, changes: &[String]) -> String {
        let items: String = changes
            .iter()
            .map(|c| format!("<li>{}</li>", html_escape(c)))
            .collect();

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>ClassHero - Profile pending validation</title>
</head>
<body style="font-family: Arial, sans-serif; color: #1f2937;">
    <h2>Profile pending validation</h2>
    <p>The user <strong>{}</strong> updated their profile and needs to be validated again.</p>
    <ul>{}</ul>
</body>
</html>"#,
            html_escape(user_email),
            items
        )
    }
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
