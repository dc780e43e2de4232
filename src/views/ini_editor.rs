use crate::views::layout::{breadcrumb, render_layout, render_notices};
use arkdash::ini::{ConfigDocument, FormField};
use arkdash::models::{IniKind, ServerRecord};
use arkdash::session::Session;

/// `document` is `None` when the file could not be read; the page then shows
/// only the message.
pub fn render_ini_editor(
    session: &Session,
    server: &ServerRecord,
    kind: IniKind,
    document: Option<&ConfigDocument>,
    message: Option<&str>,
) -> String {
    let path = server.ini_path(kind);
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let notices: Vec<&str> = message.into_iter().collect();

    let form = match document {
        Some(document) if document.entry_count() > 0 => render_fields_form(server, kind, &document.fields()),
        Some(_) => "<p class=\"text-muted\">This file has no settings.</p>".to_string(),
        None => String::new(),
    };

    let content = format!(
        r#"<h1 class="h3 mb-1">{file_name}</h1>
        <p class="text-muted mb-3">{server_name} &middot; <code>{path}</code></p>
        {notices}
        {form}"#,
        file_name = html_escape::encode_text(&file_name),
        server_name = html_escape::encode_text(&server.name),
        path = html_escape::encode_text(&path.display().to_string()),
        notices = render_notices(&notices),
        form = form,
    );

    render_layout(
        &format!("arkdash {file_name}"),
        "dashboard",
        Some(session),
        vec![
            breadcrumb("Dashboard", Some("/dashboard".to_string())),
            breadcrumb(&server.name, None),
            breadcrumb(&file_name, None),
        ],
        &content,
    )
}

fn render_fields_form(server: &ServerRecord, kind: IniKind, fields: &[FormField]) -> String {
    let mut body = String::new();
    let mut current_section: Option<&str> = None;

    for field in fields {
        if current_section != Some(field.section.as_str()) {
            if current_section.is_some() {
                body.push_str("</tbody></table></fieldset>");
            }
            let heading = if field.section.is_empty() {
                "(no section)".to_string()
            } else {
                format!("[{}]", field.section)
            };
            body.push_str(&format!(
                r#"<fieldset class="mb-4">
                  <legend class="h6 text-muted">{heading}</legend>
                  <table class="table table-sm align-middle"><tbody>"#,
                heading = html_escape::encode_text(&heading),
            ));
            current_section = Some(field.section.as_str());
        }

        body.push_str(&format!(
            r#"<tr>
              <td class="w-50"><label for="{id}"><code>{key}</code></label></td>
              <td><input class="form-control form-control-sm" id="{id}" name="{id}" value="{value}"></td>
            </tr>"#,
            id = html_escape::encode_double_quoted_attribute(&field.id),
            key = html_escape::encode_text(&field.key),
            value = html_escape::encode_double_quoted_attribute(&field.value),
        ));
    }
    if current_section.is_some() {
        body.push_str("</tbody></table></fieldset>");
    }

    format!(
        r#"<form method="post" action="/edit_ini/{id}/{which}">
          {body}
          <button class="btn btn-primary" type="submit">Save</button>
          <a class="btn btn-secondary ms-2" href="/dashboard">Back</a>
          <p class="form-text text-muted mt-2">The previous content is written to a <code>.bak</code> file next to the original before saving.</p>
        </form>"#,
        id = html_escape::encode_double_quoted_attribute(&server.id),
        which = kind.as_str(),
        body = body,
    )
}
