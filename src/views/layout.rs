use arkdash::session::Session;
use minijinja::{context, Environment};
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Serialize)]
pub struct Breadcrumb {
    pub label: String,
    pub href: Option<String>,
}

#[derive(Serialize)]
pub struct NavItem {
    pub label: String,
    pub href: String,
    pub key: String,
}

pub fn breadcrumb(label: &str, href: Option<String>) -> Breadcrumb {
    Breadcrumb {
        label: label.to_string(),
        href,
    }
}

fn nav_items(session: &Session) -> Vec<NavItem> {
    let mut items = vec![NavItem {
        label: "Dashboard".to_string(),
        href: "/dashboard".to_string(),
        key: "dashboard".to_string(),
    }];
    if session.is_admin() {
        items.push(NavItem {
            label: "Add server".to_string(),
            href: "/add_server".to_string(),
            key: "add_server".to_string(),
        });
    }
    items
}

/// Pages without a session (the login form) render without navigation.
pub fn render_layout(
    title: &str,
    active: &str,
    session: Option<&Session>,
    breadcrumbs: Vec<Breadcrumb>,
    content: &str,
) -> String {
    let env = template_env();
    let context = context! {
        title => title,
        active => active,
        nav_items => session.map(nav_items).unwrap_or_default(),
        username => session.map(|session| session.username.clone()),
        breadcrumbs => breadcrumbs,
        content => content,
    };

    env.get_template("layouts/base.html")
        .and_then(|template| template.render(context))
        .unwrap_or_else(|err| format!("Template error: {err}"))
}

pub fn render_notices(messages: &[&str]) -> String {
    messages
        .iter()
        .map(|message| {
            format!(
                "<div class=\"alert alert-info py-2\">{}</div>",
                html_escape::encode_text(message)
            )
        })
        .collect()
}

pub fn template_env() -> &'static Environment<'static> {
    static ENV: OnceLock<Environment<'static>> = OnceLock::new();
    ENV.get_or_init(|| {
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(templates_dir()));
        env.set_auto_escape_callback(|_| minijinja::AutoEscape::Html);
        env
    })
}

fn templates_dir() -> String {
    std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("templates")
        .to_string_lossy()
        .to_string()
}
