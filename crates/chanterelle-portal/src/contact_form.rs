//! Public contact form.

use crate::inflight::InFlight;
use chanterelle_client::{validate_contact, ChanterelleClient, ContactSubmission, FieldError};
use std::sync::{Mutex, MutexGuard};
use tracing::{info, instrument, warn};

pub use chanterelle_client::ContactField;

const SENT: &str = "Your message has been sent successfully!";
const FAILED: &str = "An error occurred";

/// Form input as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

/// Check a draft, returning the submission or every field error.
///
/// Phone is only looked at when the form collects it.
pub fn validate(draft: &ContactDraft, collect_phone: bool) -> Result<ContactSubmission, Vec<FieldError>> {
    validate_contact(
        &draft.name,
        &draft.email,
        collect_phone.then_some(draft.phone.as_str()),
        Some(draft.message.as_str()),
    )
}

/// Result of a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    /// Local validation failed; nothing was sent.
    Invalid(Vec<FieldError>),
    /// Success banner text.
    Sent(String),
    /// Error banner text.
    Failed(String),
    /// A submission is already in flight.
    Ignored,
}

/// Contact form state with a single in-flight submission.
pub struct ContactForm {
    client: ChanterelleClient,
    collect_phone: bool,
    draft: Mutex<ContactDraft>,
    in_flight: InFlight,
}

impl ContactForm {
    pub fn new(client: ChanterelleClient, collect_phone: bool) -> Self {
        Self {
            client,
            collect_phone,
            draft: Mutex::new(ContactDraft::default()),
            in_flight: InFlight::new(),
        }
    }

    pub fn collects_phone(&self) -> bool {
        self.collect_phone
    }

    pub fn draft(&self) -> ContactDraft {
        self.lock().clone()
    }

    pub fn set_draft(&self, draft: ContactDraft) {
        *self.lock() = draft;
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_active()
    }

    /// Validate the current draft and post it.
    #[instrument(skip(self))]
    pub async fn submit(&self) -> FormOutcome {
        let Some(_guard) = self.in_flight.try_begin() else {
            return FormOutcome::Ignored;
        };

        let submission = match validate(&self.draft(), self.collect_phone) {
            Ok(submission) => submission,
            Err(errors) => return FormOutcome::Invalid(errors),
        };

        match self.client.submit_contact(&submission).await {
            Ok(response) => {
                info!(
                    contact_id = response.contact.as_ref().map(|c| c.id),
                    "Contact submitted"
                );
                *self.lock() = ContactDraft::default();
                FormOutcome::Sent(response.message.unwrap_or_else(|| SENT.to_string()))
            }
            Err(e) => {
                warn!(error = %e, "Contact submission failed");
                FormOutcome::Failed(e.server_message().unwrap_or(FAILED).to_string())
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, ContactDraft> {
        self.draft.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
