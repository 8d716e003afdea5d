//! Turning a filled-in mail form into something support can act on.

use helpdesk_core::types::IssueDraft;

use crate::types::EscalationForm;

/// Confirmation shown once an issue has been stored.
pub const STORED_CONFIRMATION: &str = "Thank you! Your issue has been submitted to our support team. \
We'll get back to you by email as soon as possible.";

/// Confirmation shown when the user is handed a compose link instead.
pub const MAILTO_CONFIRMATION: &str = "Your email client should open with the message ready to send. \
Our support team will reply to the address you provided.";

/// A pending issue built from a validated form.
pub fn issue_draft(form: &EscalationForm, original_question: Option<&str>) -> IssueDraft {
    IssueDraft::pending(
        form.name.clone(),
        form.email.clone(),
        form.subject.clone(),
        form.message.clone(),
        original_question.map(str::to_string),
    )
}

/// Body text of the support mail.
pub fn mail_body(form: &EscalationForm, original_question: Option<&str>) -> String {
    let mut body = format!(
        "Name: {}\nEmail: {}\n\n{}",
        form.name, form.email, form.message
    );
    if let Some(question) = original_question {
        body.push_str(&format!("\n\nOriginal question: {}", question));
    }
    body
}

/// `mailto:` link with subject and body percent-encoded.
pub fn mailto_link(
    support_email: &str,
    form: &EscalationForm,
    original_question: Option<&str>,
) -> String {
    format!(
        "mailto:{}?subject={}&body={}",
        support_email,
        urlencoding::encode(&form.subject),
        urlencoding::encode(&mail_body(form, original_question)),
    )
}

/// Text of the contact-support turn.
pub fn contact_text(support_email: &str, support_phone: &str) -> String {
    format!(
        "You can reach our support team directly:\n\nEmail: {}\nPhone: {}\n\n\
         Or send us a message with the form below and we'll get back to you.",
        support_email, support_phone
    )
}
