//! Backend error extraction and translation.
//!
//! Failed responses go through two steps. [`extract_error_message`] pulls
//! a raw message out of whatever the backend sent (DRF-style `detail`,
//! `message`, `non_field_errors` or per-field maps). Then
//! [`ErrorTranslationTable::translate`] turns that raw message into text
//! fit for an end user.

use serde_json::{Map, Value};

/// Fallback when a JSON error body carries nothing usable.
pub const REQUEST_FAILED: &str = "Request failed";

/// Fallback for multipart uploads.
pub const UPLOAD_FAILED: &str = "Upload failed";

/// Raw message used when no response was received at all.
pub const NETWORK_ERROR: &str = "Network error";

/// A backend literal and the user-facing text that replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRule {
    pub key: &'static str,
    pub message: &'static str,
}

const fn rule(key: &'static str, message: &'static str) -> MessageRule {
    MessageRule { key, message }
}

/// Known backend messages, in priority order for substring matching.
pub static STANDARD_RULES: &[MessageRule] = &[
    // Authentication
    rule(
        "No active account found with the given credentials",
        "Invalid email or password. Please try again.",
    ),
    rule(
        "Authentication credentials were not provided",
        "Please log in to continue.",
    ),
    rule(
        "Token is invalid or expired",
        "Your session has expired. Please log in again.",
    ),
    rule(
        "Unable to log in with provided credentials",
        "Invalid email or password. Please check your credentials.",
    ),
    rule(
        "User account is disabled",
        "Your account has been disabled. Please contact support.",
    ),
    // Accounts
    rule(
        "A user with that email already exists",
        "An account with this email already exists. Try logging in instead.",
    ),
    rule(
        "user with this email already exists",
        "An account with this email already exists. Try logging in instead.",
    ),
    rule(
        "Password fields didn't match",
        "The passwords you entered do not match.",
    ),
    rule(
        "Password must be at least 8 characters",
        "Password must be at least 8 characters long.",
    ),
    rule(
        "This password is too common",
        "Please choose a stronger password.",
    ),
    rule(
        "This password is entirely numeric",
        "Password cannot be entirely numbers.",
    ),
    // Profiles
    rule(
        "Profile not found",
        "We couldn't find your profile. Please try again.",
    ),
    // Jobs
    rule("Job not found", "This job posting is no longer available."),
    rule("Only Clients can create jobs", "Only clients can post jobs."),
    rule(
        "Only Clients can create Categories",
        "Only clients can create categories.",
    ),
    // Proposals
    rule(
        "You have already submitted a proposal for this job",
        "You've already applied to this job.",
    ),
    rule("Proposal not found", "This proposal is no longer available."),
    rule(
        "Only freelancers can submit proposals",
        "Only freelancers can apply for jobs.",
    ),
    rule(
        "Cannot submit proposal for your own job",
        "You cannot apply to your own job posting.",
    ),
    // Contracts
    rule("Contract not found", "This contract could not be found."),
    rule("Contract is not active", "This contract is no longer active."),
    rule(
        "Only the client can fund this contract",
        "Only the client can add funds to this contract.",
    ),
    rule(
        "Only the client can approve deliverables",
        "Only the client can approve work submissions.",
    ),
    rule(
        "Insufficient balance",
        "Your wallet balance is too low. Please add funds.",
    ),
    rule(
        "Insufficient funds",
        "Your wallet balance is too low. Please add funds.",
    ),
    // Wallet
    rule(
        "Wallet not found",
        "We couldn't find your wallet. Please contact support.",
    ),
    rule("Invalid amount", "Please enter a valid amount."),
    rule(
        "Amount must be greater than 0",
        "Please enter an amount greater than $0.",
    ),
    rule(
        "Withdrawal amount exceeds available balance",
        "You don't have enough funds to withdraw this amount.",
    ),
    // Deliverables
    rule("Deliverable not found", "This deliverable could not be found."),
    rule("File is required", "Please attach a file to your submission."),
    // Generic
    rule("Not found", "The requested item could not be found."),
    rule(
        "Permission denied",
        "You don't have permission to perform this action.",
    ),
    rule("Method not allowed", "This action is not allowed."),
    rule(
        "Bad request",
        "Something went wrong. Please check your input and try again.",
    ),
    rule(
        "Internal server error",
        "Something went wrong on our end. Please try again later.",
    ),
    rule(REQUEST_FAILED, "Something went wrong. Please try again."),
    rule(
        NETWORK_ERROR,
        "Unable to connect. Please check your internet connection.",
    ),
];

/// Ordered mapping from backend messages to user-facing text.
///
/// Lookup runs two separate passes: an exact match over all rules, then a
/// case-insensitive substring match where the first rule in declaration
/// order wins.
#[derive(Debug, Clone, Copy)]
pub struct ErrorTranslationTable {
    rules: &'static [MessageRule],
}

impl ErrorTranslationTable {
    /// Table over a custom rule set.
    pub const fn new(rules: &'static [MessageRule]) -> Self {
        Self { rules }
    }

    /// Table over [`STANDARD_RULES`].
    pub const fn standard() -> Self {
        Self::new(STANDARD_RULES)
    }

    /// Turn a raw backend message into user-facing text.
    pub fn translate(&self, raw: &str) -> String {
        if let Some(rule) = self.rules.iter().find(|r| r.key == raw) {
            return rule.message.to_string();
        }

        let lower = raw.to_lowercase();
        if let Some(rule) = self
            .rules
            .iter()
            .find(|r| lower.contains(&r.key.to_lowercase()))
        {
            return rule.message.to_string();
        }

        // A raw message that is itself a field map, e.g. {"email": [...]}
        if let Ok(parsed @ (Value::Object(_) | Value::Array(_))) =
            serde_json::from_str::<Value>(raw)
        {
            let fields = field_errors(&parsed);
            if !fields.is_empty() {
                return fields;
            }
        }

        // "field: message"
        let parts: Vec<&str> = raw.split(':').collect();
        if let [field, message] = parts.as_slice() {
            return format!("{}: {}", humanize_field(field.trim()), message.trim());
        }

        capitalize_first(raw)
    }
}

impl Default for ErrorTranslationTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Pull the raw error message out of a failed response body.
///
/// `fallback` is used when the body is JSON but names no message.
pub fn extract_error_message(body: &str, status: u16, fallback: &str) -> String {
    let parsed: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) if body.is_empty() => return format!("Error: {}", status),
        Err(_) => return body.to_string(),
    };

    match &parsed {
        Value::Object(map) => {
            if let Some(detail) = truthy(map, "detail") {
                return render(detail);
            }
            if let Some(message) = truthy(map, "message") {
                return render(message);
            }
            if let Some(errors) = truthy(map, "non_field_errors") {
                return match errors {
                    Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(" "),
                    other => render(other),
                };
            }
            non_empty_or(field_errors(&parsed), fallback)
        }
        Value::Array(_) => non_empty_or(field_errors(&parsed), fallback),
        // `null` has no fields to look at; report the body itself.
        Value::Null => body.to_string(),
        _ => fallback.to_string(),
    }
}

/// "Field: first message" for each entry, joined by spaces.
///
/// Fields whose message list is empty are skipped.
pub fn field_errors(value: &Value) -> String {
    let entries: Vec<(String, &Value)> = match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => return String::new(),
    };

    entries
        .into_iter()
        .filter_map(|(field, messages)| {
            let message = match messages {
                Value::Array(items) => render(items.first()?),
                other => render(other),
            };
            Some(format!("{}: {}", humanize_field(&field), message))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Uppercase the first character and turn later underscores into spaces.
pub fn humanize_field(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.map(|c| if c == '_' { ' ' } else { c }))
            .collect(),
        None => String::new(),
    }
}

/// Uppercase only the first character.
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn truthy<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|value| match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn non_empty_or(text: String, fallback: &str) -> String {
    if text.is_empty() {
        fallback.to_string()
    } else {
        text
    }
}
