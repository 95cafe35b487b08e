//! HTML rendering for the single-page UI.
//!
//! Every request renders the whole page from scratch: the header and capture
//! button, followed by the events of the run that was just triggered.

use mirror_core::{Transcript, UiEvent};

const STYLE: &str = include_str!("../assets/style.css");

/// Render the page, optionally followed by a run transcript.
///
/// `image_version` is appended to the image URL so browsers refetch the
/// overwritten capture.
pub fn render(transcript: Option<&Transcript>, image_version: i64) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<title>AI Mood Mirror</title>\n<style>\n");
    out.push_str(STYLE);
    out.push_str("</style>\n</head>\n<body>\n");
    out.push_str("<div class='title'>🪞 AI Mood Mirror</div>\n");
    out.push_str("<div class='subtitle'>Let AI reflect your vibe today!</div>\n<hr>\n");
    out.push_str(
        "<form method='post' action='/capture'>\
         <button type='submit'>📸 Capture Emotion from Webcam</button></form>\n",
    );

    if let Some(t) = transcript {
        for event in &t.events {
            render_event(&mut out, event, image_version);
        }
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn render_event(out: &mut String, event: &UiEvent, image_version: i64) {
    let html = match event {
        UiEvent::Info { text } => format!("<div class='info'>{}</div>\n", escape(text)),
        UiEvent::Status { text } => format!("<p class='status'>{}</p>\n", escape(text)),
        UiEvent::Success { text } => format!("<div class='success'>{}</div>\n", escape(text)),
        UiEvent::Image { caption, .. } => format!(
            "<figure><img src='/captured.jpg?v={image_version}' alt='{0}'>\
             <figcaption>{0}</figcaption></figure>\n",
            escape(caption)
        ),
        UiEvent::Mood {
            emoji,
            label,
            message,
        } => format!(
            "<div class='emoji-box'>{}</div>\n\
             <div class='msg'>🧠 Detected Emotion: <strong>{}</strong><br>{}</div>\n",
            escape(emoji),
            escape(label),
            escape(message)
        ),
        UiEvent::Error { text } => format!("<div class='error'>{}</div>\n", escape(text)),
    };
    out.push_str(&html);
}

/// Escape text for HTML element and attribute content.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
