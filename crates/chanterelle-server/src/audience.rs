//! Mailchimp audience subscription for people who use the contact form.

use crate::config::MailchimpConfig;
use crate::error::ApiError;
use crate::sender::split_name;
use crate::store::ContactRecord;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Serialize)]
struct MergeFields {
    #[serde(rename = "FNAME")]
    first_name: String,
    #[serde(rename = "LNAME")]
    last_name: String,
}

#[derive(Debug, Serialize)]
struct Member<'a> {
    email_address: &'a str,
    status: &'a str,
    merge_fields: MergeFields,
}

#[derive(Debug, Deserialize)]
struct Problem {
    #[serde(default)]
    title: String,
}

/// Adds contacts to a Mailchimp audience list.
pub struct MailchimpAudience {
    client: Client,
    members_url: String,
    api_key: SecretString,
}

impl MailchimpAudience {
    /// Build from configuration. `None` when no key or list is configured.
    pub fn from_config(
        config: &MailchimpConfig,
        timeout: Duration,
    ) -> Result<Option<Self>, ApiError> {
        let (Some(api_key), Some(list_id)) = (config.api_key.as_ref(), config.list_id.as_deref())
        else {
            return Ok(None);
        };

        let base_url = match config.api_url.as_deref() {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let datacenter = datacenter(api_key.expose_secret()).ok_or_else(|| {
                    ApiError::Internal(
                        "MAILCHIMP__API_KEY must end with its datacenter, e.g. -us21".into(),
                    )
                })?;
                format!("https://{}.api.mailchimp.com", datacenter)
            }
        };

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Some(Self {
            client,
            members_url: format!("{}/3.0/lists/{}/members", base_url, list_id),
            api_key: api_key.clone(),
        }))
    }

    /// Subscribe the contact's email, with the name split into merge fields.
    ///
    /// An address already on the list counts as success.
    #[instrument(skip(self, contact), fields(contact_id = contact.id))]
    pub async fn subscribe(&self, contact: &ContactRecord) -> Result<(), ApiError> {
        let (first_name, last_name) = split_name(&contact.name);
        let member = Member {
            email_address: &contact.email,
            status: "subscribed",
            merge_fields: MergeFields {
                first_name,
                last_name,
            },
        };

        let response = self
            .client
            .post(&self.members_url)
            .basic_auth("anystring", Some(self.api_key.expose_secret()))
            .json(&member)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!("Contact added to audience");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::BAD_REQUEST
            && serde_json::from_str::<Problem>(&body).is_ok_and(|p| p.title == "Member Exists")
        {
            debug!("Contact already in audience");
            return Ok(());
        }

        warn!(%status, "Mailchimp rejected subscriber");
        Err(ApiError::Delivery(format!(
            "mailchimp returned {}: {}",
            status.as_u16(),
            body
        )))
    }
}

/// Datacenter suffix of a Mailchimp key (`abc123-us21` → `us21`).
fn datacenter(api_key: &str) -> Option<&str> {
    api_key
        .rsplit_once('-')
        .map(|(_, dc)| dc)
        .filter(|dc| !dc.is_empty())
}
