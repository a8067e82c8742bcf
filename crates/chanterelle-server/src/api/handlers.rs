//! HTTP request handlers.

use super::auth::AdminSession;
use super::types::{
    check_code_format, identifier_from_fields, ContactListResponse, ContactRequest,
    CreateContactResponse, HealthResponse, MessageResponse, ReadyResponse,
    SendVerificationRequest, VerifyCodeRequest, VerifyCodeResponse, CONTACT_LIST_VERSION,
};
use super::AppState;
use crate::error::ApiError;
use crate::identifier::{Identifier, IdentifierKind};
use crate::store::{generate_code, PendingCode};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::{error, info, warn};

const CONTACT_ACCEPTED: &str = "Your message has been sent successfully!";

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let ledger = state.ledger.read().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        contacts: ledger.contact_count(),
        pending_codes: ledger.pending_count(),
    })
}

/// Readiness: a sender that can deliver and at least one admin to deliver to.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let sender_ready = state.sender.is_ready();
    let admins_configured = state.policy.admin_count() > 0;
    let is_ready = sender_ready && admins_configured;

    let status = if is_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadyResponse {
            status: if is_ready { "ready" } else { "not_ready" }.to_string(),
            persistent: state.store.is_persistent(),
            sender: state.sender.name().to_string(),
            sender_ready,
            admins_configured,
        }),
    )
}

fn ensure_kind(expected: IdentifierKind, identifier: &Identifier) -> Result<(), ApiError> {
    if identifier.kind() == expected {
        return Ok(());
    }
    Err(ApiError::InvalidRequest(match expected {
        IdentifierKind::Phone => "phone_number is required".into(),
        IdentifierKind::Email => "email is required".into(),
    }))
}

/// Issue a verification code to an admin identifier.
///
/// Unknown identifiers get the same acknowledgement as admins.
pub async fn send_verification(
    State(state): State<AppState>,
    payload: Result<Json<SendVerificationRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;
    let identifier =
        identifier_from_fields(request.phone_number.as_deref(), request.email.as_deref())?;
    ensure_kind(state.policy.kind(), &identifier)?;

    info!(identifier = %identifier, "Verification code requested");

    let acknowledgement = Json(MessageResponse {
        message: state.policy.acknowledgement().to_string(),
    });

    if !state.policy.is_admin(&identifier) {
        warn!(identifier = %identifier, "Verification requested for unknown identifier");
        return Ok(acknowledgement);
    }

    let code = generate_code();
    let key = identifier.storage_key();

    let mut ledger = state.ledger.write().await;
    let previous = ledger.put_pending(
        key.clone(),
        PendingCode::new(identifier.as_str(), &code, state.policy.code_ttl()),
    );
    if let Err(e) = state.store.save(&ledger).await {
        // keep memory in line with disk
        match previous {
            Some(previous) => ledger.put_pending(key, previous),
            None => ledger.take_pending(&key),
        };
        return Err(e);
    }
    drop(ledger);

    if let Err(e) = state.sender.send_code(&identifier, &code).await {
        error!(identifier = %identifier, error = %e, "Failed to deliver verification code");

        let mut ledger = state.ledger.write().await;
        ledger.take_pending(&key);
        state.store.save(&ledger).await?;

        return Err(match e {
            ApiError::Delivery(_) => e,
            other => ApiError::Delivery(other.to_string()),
        });
    }

    info!(identifier = %identifier, "Verification code dispatched");
    Ok(acknowledgement)
}

enum Verdict {
    Missing,
    Expired,
    Exhausted,
    Rejected { remaining: u32 },
    Accepted,
}

/// Exchange a code for a session token.
pub async fn verify_code(
    State(state): State<AppState>,
    payload: Result<Json<VerifyCodeRequest>, JsonRejection>,
) -> Result<Json<VerifyCodeResponse>, ApiError> {
    let Json(request) = payload?;
    check_code_format(&request.code)?;
    let identifier =
        identifier_from_fields(request.phone_number.as_deref(), request.email.as_deref())?;
    ensure_kind(state.policy.kind(), &identifier)?;

    let key = identifier.storage_key();
    let now = Utc::now();
    let max_attempts = state.policy.max_attempts();

    let mut ledger = state.ledger.write().await;
    let verdict = match ledger.pending_mut(&key) {
        None => Verdict::Missing,
        Some(pending) if pending.is_expired(now) => Verdict::Expired,
        Some(pending) if pending.matches(&request.code) => Verdict::Accepted,
        Some(pending) => {
            pending.attempts += 1;
            if pending.attempts >= max_attempts {
                Verdict::Exhausted
            } else {
                Verdict::Rejected {
                    remaining: max_attempts - pending.attempts,
                }
            }
        }
    };

    match verdict {
        Verdict::Missing => {
            warn!(identifier = %identifier, "No pending code for identifier");
            return Err(ApiError::InvalidCode);
        }
        Verdict::Expired => {
            warn!(identifier = %identifier, "Verification code expired");
            ledger.take_pending(&key);
            state.store.save(&ledger).await?;
            return Err(ApiError::InvalidCode);
        }
        Verdict::Exhausted => {
            warn!(identifier = %identifier, "Verification attempts exhausted");
            ledger.take_pending(&key);
            state.store.save(&ledger).await?;
            return Err(ApiError::InvalidCode);
        }
        Verdict::Rejected { remaining } => {
            warn!(identifier = %identifier, remaining, "Wrong verification code");
            state.store.save(&ledger).await?;
            return Err(ApiError::InvalidCode);
        }
        Verdict::Accepted => {
            ledger.take_pending(&key);
            state.store.save(&ledger).await?;
        }
    }
    drop(ledger);

    let issued = state
        .tokens
        .issue(identifier.as_str())
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!(identifier = %identifier, "Admin verified");

    Ok(Json(VerifyCodeResponse {
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}

/// Store a contact form submission.
pub async fn create_contact(
    State(state): State<AppState>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateContactResponse>), ApiError> {
    let Json(request) = payload?;
    let contact = request.validate()?;

    let mut ledger = state.ledger.write().await;
    let record = ledger.add_contact(contact);
    if let Err(e) = state.store.save(&ledger).await {
        ledger.remove_contact(record.id);
        return Err(e);
    }
    drop(ledger);

    info!(contact_id = record.id, "Contact stored");

    // Notification and audience sync are best-effort and must not delay the response
    let sender = state.sender.clone();
    let audience = state.audience.clone();
    let notification = record.clone();
    tokio::spawn(async move {
        if let Err(e) = sender.notify_contact(&notification).await {
            warn!(contact_id = notification.id, error = %e, "Contact notification failed");
        }
        if let Some(audience) = audience {
            if let Err(e) = audience.subscribe(&notification).await {
                warn!(contact_id = notification.id, error = %e, "Audience subscription failed");
            }
        }
    });

    Ok((
        StatusCode::CREATED,
        Json(CreateContactResponse {
            message: CONTACT_ACCEPTED.to_string(),
            contact: record,
        }),
    ))
}

/// List contacts, newest first.
pub async fn list_contacts(
    State(state): State<AppState>,
    admin: AdminSession,
) -> Json<ContactListResponse> {
    let ledger = state.ledger.read().await;
    let contacts: Vec<_> = ledger.contacts_newest_first().into_iter().cloned().collect();

    info!(admin = %admin.claims.sub, count = contacts.len(), "Contacts listed");

    Json(ContactListResponse {
        version: CONTACT_LIST_VERSION,
        total: contacts.len(),
        contacts,
    })
}

/// Delete a contact.
pub async fn delete_contact(
    State(state): State<AppState>,
    admin: AdminSession,
    Path(id): Path<u64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut ledger = state.ledger.write().await;
    let removed = ledger
        .remove_contact(id)
        .ok_or_else(|| ApiError::NotFound(format!("Contact {} not found", id)))?;

    if let Err(e) = state.store.save(&ledger).await {
        // put it back so memory matches disk
        ledger.restore_contact(removed);
        return Err(e);
    }

    info!(admin = %admin.claims.sub, contact_id = id, "Contact deleted");

    Ok(Json(MessageResponse {
        message: "Contact deleted successfully".to_string(),
    }))
}
