use crate::models::ContactRequest;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use serde::Deserialize;
use std::sync::{Arc, Mutex};

// 1. NotificationRelay Contract
/// NotificationRelay
///
/// Defines the abstract contract for delivering a validated contact
/// submission to the admin's inbox. The trait lets us swap the concrete
/// implementation, from the real Gmail client (GmailRelay) in production to
/// the in-memory Mock (MockNotificationRelay) during testing, without
/// affecting the calling handlers.
///
/// A failed delivery is reported to the caller and nothing else: the relay
/// never touches the content store, so a delivery failure can never leave
/// partial state behind.
#[async_trait]
pub trait NotificationRelay: Send + Sync {
    /// Delivers the submission. `Err` carries a diagnostic string the
    /// handler logs and maps to a delivery-failure response.
    async fn send_contact_message(&self, submission: &ContactRequest) -> Result<(), String>;
}

/// The concrete type used to share the relay across the application state.
pub type RelayState = Arc<dyn NotificationRelay>;

/// sanitize_address
///
/// Strips CR/LF to block header injection, then checks the basic
/// local@domain.tld shape. Anything else is rejected before an SMTP header
/// is ever built from it.
pub fn sanitize_address(email: &str) -> Result<String, String> {
    let sanitized: String = email.chars().filter(|c| *c != '\r' && *c != '\n').collect();

    let mut parts = sanitized.split('@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    let well_formed = parts.next().is_none()
        && !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !sanitized.chars().any(char::is_whitespace);

    if well_formed {
        Ok(sanitized)
    } else {
        Err(format!("Invalid email address: {sanitized}"))
    }
}

// 2. The Real Implementation (Gmail REST)
/// GmailRelay
///
/// Delivers contact submissions through the Gmail REST API: the admin's own
/// mailbox is both sender and recipient, with the visitor's address set as
/// Reply-To so the admin can answer directly. The raw RFC-822 message is
/// base64url-encoded as the API requires.
pub struct GmailRelay {
    http: reqwest::Client,
    access_token: String,
}

#[derive(Deserialize)]
struct GmailProfile {
    #[serde(rename = "emailAddress")]
    email_address: String,
}

impl GmailRelay {
    pub fn new(access_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_token,
        }
    }

    /// Resolves the mailbox address of the authenticated account; used as
    /// both From and To.
    async fn own_address(&self) -> Result<String, String> {
        let profile = self
            .http
            .get("https://gmail.googleapis.com/gmail/v1/users/me/profile")
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| format!("Gmail profile request failed: {e}"))?
            .error_for_status()
            .map_err(|e| format!("Gmail profile request rejected: {e}"))?
            .json::<GmailProfile>()
            .await
            .map_err(|e| format!("Gmail profile response malformed: {e}"))?;

        Ok(profile.email_address)
    }

    /// Builds the raw message: UTF-8 B-encoded subject, HTML body, Reply-To
    /// pointing back at the visitor.
    fn build_raw_message(
        from: &str,
        to: &str,
        reply_to: &str,
        submission: &ContactRequest,
    ) -> String {
        let subject = format!("Portfolio contact from {}", submission.name);
        let encoded_subject = format!("=?utf-8?B?{}?=", STANDARD.encode(subject.as_bytes()));

        let body = format!(
            "<h2>New contact form submission</h2>\
             <p><strong>Name:</strong> {}</p>\
             <p><strong>Email:</strong> {}</p>\
             <p><strong>Message:</strong></p>\
             <p>{}</p>",
            submission.name, reply_to, submission.message
        );

        let message = [
            format!("From: {from}"),
            format!("To: {to}"),
            "Content-Type: text/html; charset=utf-8".to_string(),
            "MIME-Version: 1.0".to_string(),
            format!("Subject: {encoded_subject}"),
            format!("Reply-To: {reply_to}"),
            String::new(),
            body,
        ]
        .join("\n");

        URL_SAFE_NO_PAD.encode(message.as_bytes())
    }
}

#[async_trait]
impl NotificationRelay for GmailRelay {
    async fn send_contact_message(&self, submission: &ContactRequest) -> Result<(), String> {
        let reply_to = sanitize_address(&submission.email)?;
        let own = self.own_address().await?;
        let own = sanitize_address(&own)?;

        let raw = Self::build_raw_message(&own, &own, &reply_to, submission);

        self.http
            .post("https://gmail.googleapis.com/gmail/v1/users/me/messages/send")
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({ "raw": raw }))
            .send()
            .await
            .map_err(|e| format!("Gmail send failed: {e}"))?
            .error_for_status()
            .map_err(|e| format!("Gmail send rejected: {e}"))?;

        Ok(())
    }
}

// 3. The Mock Implementation (For Unit Tests)
/// MockNotificationRelay
///
/// A mock implementation of `NotificationRelay` used for unit and
/// integration testing. Records every delivered submission so tests can
/// assert on the relay boundary without a network connection.
#[derive(Default)]
pub struct MockNotificationRelay {
    /// When true, every delivery returns a simulated failure.
    pub should_fail: bool,
    /// Submissions "delivered" so far.
    pub sent: Mutex<Vec<ContactRequest>>,
}

impl MockNotificationRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl NotificationRelay for MockNotificationRelay {
    async fn send_contact_message(&self, submission: &ContactRequest) -> Result<(), String> {
        if self.should_fail {
            return Err("Mock Relay Error: Simulation requested".to_string());
        }

        // Same validation the real relay applies, so tests exercise it.
        sanitize_address(&submission.email)?;

        self.sent
            .lock()
            .map_err(|_| "Mock relay lock poisoned".to_string())?
            .push(submission.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_address() {
        assert_eq!(
            sanitize_address("visitor@example.com").as_deref(),
            Ok("visitor@example.com")
        );
    }

    #[test]
    fn strips_header_injection_newlines() {
        // The CRLF is removed; what remains must still parse as an address.
        let result = sanitize_address("a@example.com\r\nBcc: spam@example.com");
        assert!(result.is_err());
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(sanitize_address("not-an-email").is_err());
        assert!(sanitize_address("a b@example.com").is_err());
        assert!(sanitize_address("a@domain").is_err());
        assert!(sanitize_address("@example.com").is_err());
    }

    #[test]
    fn raw_message_is_base64url() {
        let submission = ContactRequest {
            name: "Visitor".to_string(),
            email: "visitor@example.com".to_string(),
            message: "Hello!".to_string(),
        };
        let raw = GmailRelay::build_raw_message(
            "me@example.com",
            "me@example.com",
            "visitor@example.com",
            &submission,
        );
        assert!(!raw.contains('+'));
        assert!(!raw.contains('/'));
        assert!(!raw.contains('='));

        let decoded = URL_SAFE_NO_PAD.decode(raw).expect("valid base64url");
        let text = String::from_utf8(decoded).expect("utf-8");
        assert!(text.contains("Reply-To: visitor@example.com"));
        assert!(text.contains("MIME-Version: 1.0"));
    }

    #[tokio::test]
    async fn mock_records_deliveries() {
        let relay = MockNotificationRelay::new();
        let submission = ContactRequest {
            name: "Visitor".to_string(),
            email: "visitor@example.com".to_string(),
            message: "Hi".to_string(),
        };
        relay.send_contact_message(&submission).await.unwrap();
        assert_eq!(relay.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failing_mock_reports_error() {
        let relay = MockNotificationRelay::new_failing();
        let submission = ContactRequest::default();
        assert!(relay.send_contact_message(&submission).await.is_err());
    }
}
