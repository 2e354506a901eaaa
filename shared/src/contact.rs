use bamboo_atoms::error::ApiError;
use bamboo_atoms::http::{parse_body, respond};
use lambda_http::{Body, Error, Response};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::email::{Email, Mailer};

/// Interest form for a property.
#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub property: String,
    /// Preferred contact channel (phone, email, whatsapp...).
    #[serde(rename = "type", default)]
    pub contact_type: String,
    pub contact: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize)]
struct ContactResponse {
    status: &'static str,
}

/// Escape text interpolated into the notification HTML.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn contact_email(request: &ContactRequest, from: &str, to: &str) -> Email {
    Email {
        from: from.to_string(),
        to: to.to_string(),
        subject: format!("Interesados en {}", request.property),
        html: format!(
            "<h1> Interesado en la propiedad {} </h1><hr /><ul>\
             <li> Quiere ser contactado con {} </li>\
             <li> Su contacto {} </li>\
             <li> Descripción de lo que pide: {} </li></ul>",
            escape_html(&request.property),
            escape_html(&request.contact_type),
            escape_html(&request.contact),
            escape_html(&request.description)
        ),
    }
}

async fn send_contact(
    mailer: &dyn Mailer,
    config: &Config,
    body: &[u8],
) -> Result<ContactResponse, ApiError> {
    let request: ContactRequest = parse_body(body)?;
    if request.property.is_empty() || request.contact.is_empty() {
        return Err(ApiError::InvalidArgument(
            "property and contact are required".to_string(),
        ));
    }

    let (Some(from), Some(to)) = (config.contact_from.as_deref(), config.contact_to.as_deref()) else {
        return Err(ApiError::Internal("Contact email is not configured".to_string()));
    };

    tracing::info!("Contact form submission received for {}", request.property);
    mailer
        .send(&contact_email(&request, from, to))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    tracing::info!("✅ Contact email sent for {}", request.property);
    Ok(ContactResponse { status: "OK" })
}

/// HTTP Handler: POST /contact
pub async fn handle_contact(
    mailer: &dyn Mailer,
    config: &Config,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    respond(send_contact(mailer, config, body).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::MailError;
    use async_trait::async_trait;
    use lambda_http::http::StatusCode;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Outbox {
        sent: Mutex<Vec<Email>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for Outbox {
        async fn send(&self, email: &Email) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError::Send("throttled".into()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    fn config() -> Config {
        Config::from_lookup(|key| match key {
            "CONTACT_FROM_EMAIL" => Some("contacto@example.com".into()),
            "CONTACT_TO_EMAIL" => Some("ventas@example.com".into()),
            _ => None,
        })
        .unwrap()
    }

    const BODY: &[u8] = br#"{"property": "Casa Azul", "type": "telefono", "contact": "555-0101", "description": "Visita el sabado"}"#;

    #[tokio::test]
    async fn sends_one_email_and_returns_ok() {
        let outbox = Outbox::default();
        let resp = handle_contact(&outbox, &config(), BODY).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body, serde_json::json!({"status": "OK"}));

        let sent = outbox.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Interesados en Casa Azul");
        assert_eq!(sent[0].to, "ventas@example.com");
        assert!(sent[0].html.contains("Su contacto 555-0101"));
    }

    #[test]
    fn submitted_text_cannot_inject_markup() {
        let request = ContactRequest {
            property: "Casa <b>Azul</b>".into(),
            contact_type: "email".into(),
            contact: "<script>alert(1)</script>".into(),
            description: "Tom & Jerry".into(),
        };
        let email = contact_email(&request, "from@example.com", "to@example.com");
        assert!(!email.html.contains("<script>"));
        assert!(email.html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(email.html.contains("Casa &lt;b&gt;Azul&lt;/b&gt;"));
        assert!(email.html.contains("Tom &amp; Jerry"));
    }

    #[tokio::test]
    async fn mailer_failure_is_internal() {
        let outbox = Outbox {
            fail: true,
            ..Default::default()
        };
        let resp = handle_contact(&outbox, &config(), BODY).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let outbox = Outbox::default();
        let resp = handle_contact(&outbox, &config(), br#"{"property": "", "contact": ""}"#)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["code"], "invalid-argument");
        assert!(outbox.sent.lock().unwrap().is_empty());
    }
}
