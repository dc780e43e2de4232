use crate::views::layout::{breadcrumb, render_layout, render_notices, template_env};
use arkdash::models::ServerRecord;
use arkdash::session::Session;
use arkdash::status::ProcessStatus;
use minijinja::context;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ServerRow {
    pub id: String,
    pub name: String,
    pub folder: String,
    pub status: &'static str,
}

/// Without statuses (process table unavailable) every row shows `unknown`.
pub fn server_rows(servers: &[ServerRecord], statuses: Option<&[ProcessStatus]>) -> Vec<ServerRow> {
    servers
        .iter()
        .enumerate()
        .map(|(index, server)| ServerRow {
            id: server.id.clone(),
            name: server.name.clone(),
            folder: server.folder.clone(),
            status: statuses
                .and_then(|statuses| statuses.get(index))
                .map(|status| status.as_str())
                .unwrap_or("unknown"),
        })
        .collect()
}

pub fn render_server_table(rows: &[ServerRow], is_admin: bool, refreshed_at: &str) -> String {
    let context = context! {
        rows => rows,
        is_admin => is_admin,
        refreshed_at => refreshed_at,
    };
    template_env()
        .get_template("partials/server_table.html")
        .and_then(|template| template.render(context))
        .unwrap_or_else(|err| format!("Template error: {err}"))
}

pub fn render_dashboard_page(table: &str, session: &Session, messages: &[&str]) -> String {
    let content = format!(
        r#"<div class="d-flex justify-content-between align-items-center mb-3">
          <h1 class="h3 mb-0">Servers</h1>
        </div>
        {notices}
        <div id="server-table" hx-get="/partials/server-table" hx-trigger="every 5s" hx-swap="innerHTML">
          {table}
        </div>
        <div class="card mt-3 d-none" id="update-card">
          <div class="card-header" id="update-title">Update</div>
          <div class="card-body">
            <pre class="mb-0" id="update-output" style="max-height: 360px; overflow-y: auto;"></pre>
          </div>
        </div>
        <script>
          document.addEventListener('click', async (event) => {{
            const button = event.target.closest('[data-update]');
            if (!button) {{
              return;
            }}
            const card = document.getElementById('update-card');
            const title = document.getElementById('update-title');
            const output = document.getElementById('update-output');
            card.classList.remove('d-none');
            title.textContent = 'Updating ' + button.dataset.name + '...';
            output.textContent = '';
            button.disabled = true;
            try {{
              const response = await fetch('/api/server_update/' + encodeURIComponent(button.dataset.update), {{ method: 'POST' }});
              const data = await response.json();
              title.textContent = data.message;
              output.textContent = data.output;
            }} catch (error) {{
              title.textContent = 'Error: ' + error;
            }} finally {{
              button.disabled = false;
            }}
          }});
        </script>"#,
        notices = render_notices(messages),
        table = table,
    );

    render_layout(
        "arkdash",
        "dashboard",
        Some(session),
        vec![breadcrumb("Dashboard", None)],
        &content,
    )
}
