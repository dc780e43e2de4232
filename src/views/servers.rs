use crate::forms::ServerForm;
use crate::views::layout::{breadcrumb, render_layout, render_notices};
use arkdash::session::Session;

pub fn render_add_server_page(session: &Session, form: &ServerForm, message: Option<&str>) -> String {
    let notices: Vec<&str> = message.into_iter().collect();
    let mut inputs = String::new();
    for (name, label, value, hint) in [
        ("name", "Name", &form.name, ""),
        ("folder", "Server folder", &form.folder, "Install folder; the status check matches processes running inside it."),
        ("start_script", "Start script", &form.start_script, "Relative paths are resolved against the server folder."),
        ("stop_script", "Stop script", &form.stop_script, ""),
        ("game_ini", "Game.ini path", &form.game_ini, ""),
        ("gameusersettings_ini", "GameUserSettings.ini path", &form.gameusersettings_ini, ""),
    ] {
        let hint = if hint.is_empty() {
            String::new()
        } else {
            format!("<div class=\"form-text text-muted\">{hint}</div>")
        };
        inputs.push_str(&format!(
            r#"<div class="mb-3">
              <label class="form-label" for="{name}">{label}</label>
              <input class="form-control" id="{name}" name="{name}" value="{value}" required>
              {hint}
            </div>"#,
            name = name,
            label = label,
            value = html_escape::encode_double_quoted_attribute(value),
            hint = hint,
        ));
    }

    let content = format!(
        r#"<h1 class="h3 mb-3">Add server</h1>
        {notices}
        <form method="post" action="/add_server">
          {inputs}
          <button class="btn btn-primary" type="submit">Add server</button>
          <a class="btn btn-secondary ms-2" href="/dashboard">Cancel</a>
        </form>"#,
        notices = render_notices(&notices),
        inputs = inputs,
    );

    render_layout(
        "arkdash Add server",
        "add_server",
        Some(session),
        vec![
            breadcrumb("Dashboard", Some("/dashboard".to_string())),
            breadcrumb("Add server", None),
        ],
        &content,
    )
}
