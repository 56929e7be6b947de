//! Outbound email delivery
//!
//! Invite and reminder composition on top of a pluggable delivery seam.
//! Delivery returns the count of accepted messages; the workflows report
//! that count and never retry internally.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// One outbound message
#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait EmailDelivery: Send + Sync {
    /// Deliver a batch; returns how many messages were accepted
    async fn send(&self, messages: Vec<EmailMessage>) -> usize;
}

/// Delivery through an HTTP relay endpoint (one POST per batch)
pub struct HttpRelayDelivery {
    client: reqwest::Client,
    relay_url: String,
}

impl HttpRelayDelivery {
    pub fn new(relay_url: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_default(),
            relay_url,
        }
    }
}

#[async_trait]
impl EmailDelivery for HttpRelayDelivery {
    async fn send(&self, messages: Vec<EmailMessage>) -> usize {
        if messages.is_empty() {
            return 0;
        }

        let count = messages.len();
        let result = self
            .client
            .post(&self.relay_url)
            .json(&messages)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => count,
            Ok(response) => {
                tracing::warn!(
                    status = %response.status(),
                    count = count,
                    "Email relay rejected batch"
                );
                0
            }
            Err(e) => {
                tracing::warn!(error = %e, count = count, "Email relay unreachable");
                0
            }
        }
    }
}

/// Logs deliveries instead of sending; used when no relay is configured
pub struct LogOnlyDelivery;

#[async_trait]
impl EmailDelivery for LogOnlyDelivery {
    async fn send(&self, messages: Vec<EmailMessage>) -> usize {
        for message in &messages {
            tracing::info!(to = %message.to, subject = %message.subject, "Email (log only)");
        }
        messages.len()
    }
}

/// Test double that records every message it accepts
#[derive(Default)]
pub struct RecordingDelivery {
    pub sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl EmailDelivery for RecordingDelivery {
    async fn send(&self, messages: Vec<EmailMessage>) -> usize {
        let count = messages.len();
        self.sent.lock().unwrap().extend(messages);
        count
    }
}

/// Recipient of a campaign invite or reminder; the assignment id is the
/// deep-link target
#[derive(Debug, Clone)]
pub struct AssignmentRecipient {
    pub email: String,
    pub assignment_id: Uuid,
    pub campaign_name: String,
}

fn assignment_link(assignment_id: Uuid) -> String {
    format!("/learn/assignments/{}", assignment_id)
}

/// Send one invite per member; returns the delivered count
pub async fn send_campaign_invites(
    delivery: &dyn EmailDelivery,
    targets: &[AssignmentRecipient],
    request_id: Uuid,
) -> usize {
    let messages: Vec<EmailMessage> = targets
        .iter()
        .map(|target| EmailMessage {
            to: target.email.clone(),
            subject: format!("Training assigned: {}", target.campaign_name),
            body: format!(
                "You have new compliance training to complete. Start here: {}",
                assignment_link(target.assignment_id)
            ),
        })
        .collect();

    let delivered = delivery.send(messages).await;
    tracing::info!(
        request_id = %request_id,
        targets = targets.len(),
        delivered = delivered,
        "Campaign invites sent"
    );
    delivered
}

/// Send one reminder per outstanding assignment; returns the delivered count
pub async fn send_reminder_emails(
    delivery: &dyn EmailDelivery,
    targets: &[AssignmentRecipient],
    request_id: Uuid,
) -> usize {
    let messages: Vec<EmailMessage> = targets
        .iter()
        .map(|target| EmailMessage {
            to: target.email.clone(),
            subject: format!("Reminder: finish {}", target.campaign_name),
            body: format!(
                "Your compliance training is still outstanding. Pick it up here: {}",
                assignment_link(target.assignment_id)
            ),
        })
        .collect();

    let delivered = delivery.send(messages).await;
    tracing::info!(
        request_id = %request_id,
        targets = targets.len(),
        delivered = delivered,
        "Reminder emails sent"
    );
    delivered
}
