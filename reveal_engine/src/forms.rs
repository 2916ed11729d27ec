// Contact and newsletter form state.
//
// Validation is a pure function of the field values. A form stays in
// `Editing` until a submit passes validation, then moves to `Submitted`
// with its fields reset. `Submitted` is terminal for that form; a page
// mount gets a fresh one.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub const NAME_REQUIRED: &str = "Please enter your full name";
pub const EMAIL_REQUIRED: &str = "Please enter your email address";
pub const EMAIL_INVALID: &str = "Please enter a valid email address";
pub const MESSAGE_REQUIRED: &str = "Please enter your message";

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
    })
}

/// `local@domain.tld` with no whitespace and a single `@` per part.
pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormPhase {
    Editing,
    Submitted,
}

/// Result of pressing submit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "payload", rename_all = "snake_case")]
pub enum Submission<T, E> {
    /// Passed validation; carries the values that were submitted.
    Accepted(T),
    Rejected(E),
    /// The form already submitted and shows its confirmation.
    Closed,
}

impl<T, E> Submission<T, E> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Submission::Accepted(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFields {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

impl ContactFields {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ContactFields {
            name: name.into(),
            email: email.into(),
            message: message.into(),
        }
    }
}

/// Per-field messages. `None` means the field is fine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ContactErrors {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.message.is_none()
    }

    fn slot(&mut self, field: ContactField) -> &mut Option<String> {
        match field {
            ContactField::Name => &mut self.name,
            ContactField::Email => &mut self.email,
            ContactField::Message => &mut self.message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    Name,
    Email,
    Message,
}

impl FromStr for ContactField {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(ContactField::Name),
            "email" => Ok(ContactField::Email),
            "message" => Ok(ContactField::Message),
            other => Err(EngineError::InvalidRequest(format!(
                "unknown contact field '{other}'"
            ))),
        }
    }
}

pub fn validate_contact(fields: &ContactFields) -> ContactErrors {
    let mut errors = ContactErrors::default();

    if fields.name.trim().is_empty() {
        errors.name = Some(NAME_REQUIRED.to_string());
    }

    if fields.email.trim().is_empty() {
        errors.email = Some(EMAIL_REQUIRED.to_string());
    } else if !is_valid_email(&fields.email) {
        errors.email = Some(EMAIL_INVALID.to_string());
    }

    if fields.message.trim().is_empty() {
        errors.message = Some(MESSAGE_REQUIRED.to_string());
    }

    errors
}

/// Newsletter email check. Only a truly empty value counts as missing.
pub fn validate_newsletter(email: &str) -> Option<&'static str> {
    if email.is_empty() {
        Some(EMAIL_REQUIRED)
    } else if !is_valid_email(email) {
        Some(EMAIL_INVALID)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct ContactForm {
    fields: ContactFields,
    errors: ContactErrors,
    phase: FormPhase,
}

impl Default for ContactForm {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactForm {
    pub fn new() -> Self {
        ContactForm {
            fields: ContactFields::default(),
            errors: ContactErrors::default(),
            phase: FormPhase::Editing,
        }
    }

    pub fn fields(&self) -> &ContactFields {
        &self.fields
    }

    pub fn errors(&self) -> &ContactErrors {
        &self.errors
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    /// Edit one field and clear its message. Ignored once submitted.
    pub fn set_field(&mut self, field: ContactField, value: impl Into<String>) {
        if self.phase == FormPhase::Submitted {
            return;
        }
        let value = value.into();
        match field {
            ContactField::Name => self.fields.name = value,
            ContactField::Email => self.fields.email = value,
            ContactField::Message => self.fields.message = value,
        }
        *self.errors.slot(field) = None;
    }

    pub fn submit(&mut self) -> Submission<ContactFields, ContactErrors> {
        if self.phase == FormPhase::Submitted {
            return Submission::Closed;
        }

        let errors = validate_contact(&self.fields);
        if !errors.is_empty() {
            tracing::debug!(?errors, "contact form rejected");
            self.errors = errors.clone();
            return Submission::Rejected(errors);
        }

        self.errors = ContactErrors::default();
        self.phase = FormPhase::Submitted;
        let submitted = std::mem::take(&mut self.fields);
        tracing::debug!("contact form submitted");
        Submission::Accepted(submitted)
    }
}

#[derive(Debug, Clone)]
pub struct NewsletterForm {
    email: String,
    error: Option<String>,
    phase: FormPhase,
}

impl Default for NewsletterForm {
    fn default() -> Self {
        Self::new()
    }
}

impl NewsletterForm {
    pub fn new() -> Self {
        NewsletterForm {
            email: String::new(),
            error: None,
            phase: FormPhase::Editing,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    /// Edit the address and clear the message. Ignored once submitted.
    pub fn set_email(&mut self, value: impl Into<String>) {
        if self.phase == FormPhase::Submitted {
            return;
        }
        self.email = value.into();
        self.error = None;
    }

    pub fn submit(&mut self) -> Submission<String, String> {
        if self.phase == FormPhase::Submitted {
            return Submission::Closed;
        }

        if let Some(message) = validate_newsletter(&self.email) {
            tracing::debug!(error = message, "newsletter signup rejected");
            self.error = Some(message.to_string());
            return Submission::Rejected(message.to_string());
        }

        self.error = None;
        self.phase = FormPhase::Submitted;
        tracing::debug!("newsletter signup submitted");
        Submission::Accepted(std::mem::take(&mut self.email))
    }
}
