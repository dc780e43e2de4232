mod forms;
mod routes;
mod services;
mod views;

use arkdash::{security, storage};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = storage::load_settings(&storage::settings_path())
        .await
        .expect("failed to load settings");
    settings.validate().expect("invalid settings");

    let (users, generated_password) = security::load_or_create_users(&security::users_path())
        .await
        .expect("failed to prepare users");
    if let Some(password) = generated_password {
        warn!(username = "admin", password = %password, "created initial admin account");
    }

    let state = routes::default_state(Arc::new(security::UserDirectory::new(users)));
    let app = routes::build_router(state);

    let addr: SocketAddr = settings.bind_address.parse().expect("invalid bind address");
    let cert_path = security::cert_path();
    let key_path = security::key_path();
    security::ensure_tls_cert(&cert_path, &key_path, addr.ip())
        .await
        .expect("failed to prepare TLS certificates");
    let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .expect("failed to load TLS certificates");

    info!(data_dir = %storage::base_dir().display(), "server listening on https://{addr}");
    axum_server::bind_rustls(addr, tls_config)
        .serve(app.into_make_service())
        .await
        .expect("server failed");
}
