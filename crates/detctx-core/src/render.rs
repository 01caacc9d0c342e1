//! HTML fragments for the translation and context panels.
//!
//! Every piece of text that reaches a fragment comes from users, the host, or
//! the translation model, so all of it goes through [`sanitize`] first. The
//! sanitiser strips scripts, event handlers and unknown markup instead of
//! failing; none of these functions can error.

use std::sync::LazyLock;

use ammonia::Builder;

use crate::{Comment, ContextEntry, Detection};

/// Sanitiser allowing the markup the panels and the translate prompt use.
static SANITIZER: LazyLock<Builder<'static>> = LazyLock::new(|| {
    let mut builder = Builder::default();
    builder
        .add_tags(["button", "header"])
        .add_tag_attributes("button", ["id"])
        .add_generic_attributes(["class"]);
    builder
});

/// Defang untrusted HTML, keeping safe formatting markup.
pub fn sanitize(input: &str) -> String {
    SANITIZER.clean(input).to_string()
}

/// Wrap a title and body into the uniform panel fragment.
pub fn render_panel(title: &str, content: &str) -> String {
    format!(
        r#"<div class="my-4 space-y-2 rounded bg-surface-md p-3 shadow-base">
      <header class="type-md-tight-medium overflow-hidden text-titles-and-attributes">
        {title}
      </header>
      <div class="type-md min-h-6 text-titles-and-attributes">
        {content}
      </div>
    </div>"#,
        title = sanitize(title),
        content = sanitize(content),
    )
}

/// Panel for a stored context entry.
pub fn render_entry(entry: &ContextEntry) -> String {
    render_panel(&entry.title, &entry.content)
}

/// Red alert fragment: `"<prefix>: <message>"`.
pub fn render_error(prefix: &str, message: &str) -> String {
    format!(
        r#"<div class="p-4 bg-red-100 border border-red-400 text-red-700 rounded">
        {prefix}: {message}
      </div>"#,
        prefix = sanitize(prefix),
        message = sanitize(message),
    )
}

/// A single comment list item.
pub fn render_comment(comment: &Comment) -> String {
    format!(
        r#"
  <li class="grid gap-1">
    <div class="font-semibold text-gray-900">
        {author} on {time}
    </div>
    {body}
  </li>"#,
        author = sanitize(&comment.created_by.display_name),
        time = sanitize(&comment.created_time),
        body = sanitize(&comment.body),
    )
}

/// Render a detection's description, overwatch note and triage, followed by
/// its comments when there are any.
///
/// This is the HTML handed to the translation job.
pub fn render_detection(detection: &Detection, comments: &[Comment]) -> String {
    let timestamp = detection
        .overwatch_note_timestamp
        .as_deref()
        .filter(|ts| !ts.is_empty())
        .map(|ts| format!("({})", sanitize(ts)))
        .unwrap_or_default();

    let mut html = format!(
        r#"
  <dl class="space-y-6">
    <div class="grid gap-1">
      <dt class="font-semibold text-gray-900">Description</dt>
      <dd class="text-gray-600">
        {description}
      </dd>
    </div>

    <div class="grid gap-1">
      <dt class="font-semibold text-gray-900">
        Overwatch notes {timestamp}
      </dt>
      <dd class="text-gray-600">
        {overwatch_note}
      </dd>
    </div>

    <div class="grid gap-1">
      <dt class="font-semibold text-gray-900">AI Triage</dt>
      <dd class="text-gray-600">
        {triage}
      </dd>
    </div>
  </dl>
"#,
        description = sanitize(detection.description.as_deref().unwrap_or_default()),
        overwatch_note = sanitize(detection.overwatch_note.as_deref().unwrap_or_default()),
        triage = sanitize(detection.triage_explanation().unwrap_or_default()),
    );

    if !comments.is_empty() {
        let items: Vec<String> = comments.iter().map(render_comment).collect();
        html.push_str(&format!(
            r#"
    <div class="mt-6">
      <h2 class="font-semibold text-gray-900">Falcon complete</h2>
      <h3 class="font-semibold text-gray-900 text-sm">Comments</h3>
      <ul class="space-y-6">
        {}
      </ul>
    </div>"#,
            items.join("\n")
        ));
    }

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AutomatedTriage, CommentAuthor};

    const HOSTILE: &str = r#"<script>alert("x")</script><img src=x onerror="alert(1)">"#;

    fn comment(author: &str, time: &str, body: &str) -> Comment {
        Comment {
            created_by: CommentAuthor {
                display_name: author.into(),
            },
            created_time: time.into(),
            body: body.into(),
        }
    }

    fn assert_defanged(html: &str) {
        assert!(!html.contains("<script"), "script tag survived: {html}");
        assert!(!html.contains("onerror"), "event handler survived: {html}");
        assert!(!html.contains("alert("), "script body survived: {html}");
    }

    #[test]
    fn sanitize_strips_script() {
        assert_eq!(sanitize("<script>alert(1)</script>hello"), "hello");
    }

    #[test]
    fn sanitize_keeps_formatting_markup() {
        let html = sanitize(r#"<p class="x"><strong>bold</strong></p>"#);
        assert_eq!(html, r#"<p class="x"><strong>bold</strong></p>"#);
    }

    #[test]
    fn sanitize_keeps_translate_button() {
        let html = sanitize(r#"<button id="translateBtn">Translate</button>"#);
        assert!(html.contains(r#"<button id="translateBtn">"#));
    }

    #[test]
    fn sanitize_drops_ids_outside_buttons() {
        let html = sanitize(r#"<div id="translateBtn" class="x">Fake</div>"#);
        assert_eq!(html, r#"<div class="x">Fake</div>"#);
    }

    #[test]
    fn panel_contains_title_and_content() {
        let html = render_panel("Detection translation (es)", "Contenido traducido");
        assert!(html.contains("Detection translation (es)"));
        assert!(html.contains("Contenido traducido"));
        assert!(html.contains("<header"));
    }

    #[test]
    fn panel_sanitizes_both_fields() {
        let html = render_panel(HOSTILE, HOSTILE);
        assert_defanged(&html);
    }

    #[test]
    fn error_panel_sanitizes_message() {
        let html = render_error("Error translating detection", HOSTILE);
        assert!(html.contains("Error translating detection: "));
        assert_defanged(&html);
    }

    #[test]
    fn detection_renders_all_sections() {
        let detection = Detection {
            description: Some("Test Description".into()),
            overwatch_note: Some("Test Overwatch Note".into()),
            overwatch_note_timestamp: Some("2024-05-01".into()),
            automated_triage: Some(AutomatedTriage {
                triage_explanation: Some("Looks malicious".into()),
            }),
        };
        let html = render_detection(&detection, &[]);
        assert!(html.contains("Test Description"));
        assert!(html.contains("Overwatch notes (2024-05-01)"));
        assert!(html.contains("Test Overwatch Note"));
        assert!(html.contains("Looks malicious"));
        assert!(!html.contains("Comments"));
    }

    #[test]
    fn detection_without_timestamp_has_no_parens() {
        let detection = Detection {
            overwatch_note: Some("note".into()),
            ..Default::default()
        };
        let html = render_detection(&detection, &[]);
        assert!(html.contains("Overwatch notes \n"));
        assert!(!html.contains("()"));
    }

    #[test]
    fn detection_appends_comments() {
        let detection = Detection::default();
        let comments = [
            comment("User", "2023-01-01", "Comment"),
            comment("Other", "2023-01-02", "Second"),
        ];
        let html = render_detection(&detection, &comments);
        assert!(html.contains("Comments"));
        assert!(html.contains("User on 2023-01-01"));
        assert!(html.contains("Second"));
        assert_eq!(html.matches("<li").count(), 2);
    }

    #[test]
    fn detection_sanitizes_every_field() {
        let detection = Detection {
            description: Some(HOSTILE.into()),
            overwatch_note: Some(HOSTILE.into()),
            overwatch_note_timestamp: Some(HOSTILE.into()),
            automated_triage: Some(AutomatedTriage {
                triage_explanation: Some(HOSTILE.into()),
            }),
        };
        let html = render_detection(&detection, &[comment(HOSTILE, HOSTILE, HOSTILE)]);
        assert_defanged(&html);
    }

    #[test]
    fn entry_panel_uses_title_and_content() {
        let entry = ContextEntry::new("id", "note", "Note", "Note content");
        let html = render_entry(&entry);
        assert!(html.contains("Note content"));
    }
}
