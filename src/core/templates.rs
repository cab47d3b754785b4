//! Email bodies for the two outbound messages. Every user-supplied value goes
//! through [`escape_html`] before it lands in HTML.

use crate::domain::model::SubmissionPayload;

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn or_dash(value: &str) -> &str {
    let value = value.trim();
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

fn html_row(label: &str, value: &str) -> String {
    format!(
        "<tr><td style=\"padding:4px 12px 4px 0;color:#555\"><strong>{}</strong></td><td>{}</td></tr>",
        label,
        escape_html(or_dash(value))
    )
}

fn message_html(message: &str) -> String {
    escape_html(message.trim()).replace('\n', "<br>")
}

pub fn notification_html(payload: &SubmissionPayload) -> String {
    format!(
        "<h2>New website inquiry</h2>\
         <table>{}{}{}{}</table>\
         <h3>Message</h3><p>{}</p>",
        html_row("Name", &payload.full_name()),
        html_row("Email", &payload.email),
        html_row("Phone", &payload.phone),
        html_row("Interest", &payload.interest),
        message_html(&payload.message)
    )
}

pub fn notification_text(payload: &SubmissionPayload) -> String {
    format!(
        "New website inquiry\n\nName: {}\nEmail: {}\nPhone: {}\nInterest: {}\n\nMessage:\n{}\n",
        or_dash(&payload.full_name()),
        or_dash(&payload.email),
        or_dash(&payload.phone),
        or_dash(&payload.interest),
        payload.message.trim()
    )
}

pub fn auto_reply_html(payload: &SubmissionPayload) -> String {
    format!(
        "<p>Hi {},</p>\
         <p>Thank you for reaching out to AgriNova. We have received your message and \
         a member of our team will get back to you within 1-2 business days.</p>\
         <p>For reference, here is what you sent us:</p>\
         <blockquote>{}</blockquote>\
         <p>Best regards,<br>The AgriNova Team</p>",
        escape_html(payload.first_name.trim()),
        message_html(&payload.message)
    )
}

pub fn auto_reply_text(payload: &SubmissionPayload) -> String {
    format!(
        "Hi {},\n\nThank you for reaching out to AgriNova. We have received your message and \
         a member of our team will get back to you within 1-2 business days.\n\n\
         For reference, here is what you sent us:\n\n{}\n\nBest regards,\nThe AgriNova Team\n",
        payload.first_name.trim(),
        payload.message.trim()
    )
}
