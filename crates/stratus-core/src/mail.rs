use stratus_types::models::User;

/// A composed message, ready for whatever transport the [`Notifier`]
/// implementation speaks.
///
/// [`Notifier`]: crate::capabilities::Notifier
#[derive(Debug, Clone)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Welcome mail carrying the account activation link. The link points at the
/// public frontend, which relays the secret to the API.
pub fn activation_email(user: &User, secret: &str, public_url: &str) -> MailMessage {
    let link = format!("{public_url}/activate/{secret}");
    MailMessage {
        to: user.email.clone(),
        subject: "Activate your Stratus account".to_string(),
        html: format!(
            "<p>Hi {first_name},</p>\
             <p>Welcome to Stratus. Confirm your email address to finish setting up your account:</p>\
             <p><a href=\"{link}\">Activate my account</a></p>\
             <p>This link is valid for 24 hours and can be used once.</p>",
            first_name = user.first_name,
        ),
    }
}

/// Password reset mail. Same shape as activation: frontend link, single-use
/// secret, 24 hour validity.
pub fn reset_email(user: &User, secret: &str, public_url: &str) -> MailMessage {
    let link = format!("{public_url}/reset-password?token={secret}");
    MailMessage {
        to: user.email.clone(),
        subject: "Reset your Stratus password".to_string(),
        html: format!(
            "<p>Hi {first_name},</p>\
             <p>We received a request to reset your password. If that was you, pick a new one here:</p>\
             <p><a href=\"{link}\">Reset my password</a></p>\
             <p>This link is valid for 24 hours and can be used once. If you did not ask for a reset, you can ignore this mail.</p>",
            first_name = user.first_name,
        ),
    }
}
