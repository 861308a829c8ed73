//! Mailing list domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Subscription state of a mailing list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailingListStatus {
    Active,
    Unsubscribed,
}

impl MailingListStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MailingListStatus::Active => "active",
            MailingListStatus::Unsubscribed => "unsubscribed",
        }
    }
}

impl fmt::Display for MailingListStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One email address on the mailing list. Email is the natural key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailingListEntry {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub status: MailingListStatus,
    pub source: String,
    pub subscribed_at: DateTime<Utc>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// What a subscribe call does given the current state of the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeAction {
    Insert,
    Reactivate,
    AlreadyActive,
}

impl SubscribeAction {
    pub fn for_existing(existing: Option<MailingListStatus>) -> Self {
        match existing {
            None => SubscribeAction::Insert,
            Some(MailingListStatus::Unsubscribed) => SubscribeAction::Reactivate,
            Some(MailingListStatus::Active) => SubscribeAction::AlreadyActive,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            SubscribeAction::Insert => "Successfully subscribed",
            SubscribeAction::Reactivate => "Welcome back! You have been resubscribed",
            SubscribeAction::AlreadyActive => "You are already subscribed",
        }
    }
}

/// What an unsubscribe call does given the current state of the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsubscribeAction {
    NotFound,
    Unsubscribe,
    AlreadyUnsubscribed,
}

impl UnsubscribeAction {
    pub fn for_existing(existing: Option<MailingListStatus>) -> Self {
        match existing {
            None => UnsubscribeAction::NotFound,
            Some(MailingListStatus::Active) => UnsubscribeAction::Unsubscribe,
            Some(MailingListStatus::Unsubscribed) => UnsubscribeAction::AlreadyUnsubscribed,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            UnsubscribeAction::NotFound => "Email address not found",
            UnsubscribeAction::Unsubscribe => "Successfully unsubscribed",
            UnsubscribeAction::AlreadyUnsubscribed => "You are already unsubscribed",
        }
    }
}

/// Public subscribe form.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub email: String,
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 50, message = "Source must be at most 50 characters"))]
    pub source: Option<String>,
}

/// Public unsubscribe form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsubscribeRequest {
    pub email: String,
}

/// Admin add-subscriber form.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddSubscriberRequest {
    pub email: String,
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,
}

/// Admin delete-subscriber form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSubscriberRequest {
    pub email: String,
}

/// Admin subscriber listing filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSubscribersQuery {
    pub status: Option<MailingListStatus>,
}

/// Admin subscriber listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSubscribersResponse {
    pub data: Vec<MailingListEntry>,
    pub total: usize,
}

/// `{success, message}` envelope used by the mailing list endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
