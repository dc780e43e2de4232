use crate::models::{Role, UserRecord};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{distributions::Alphanumeric, Rng};
use rcgen::{CertificateParams, DistinguishedName, DnType, SanType};
use sha2::{Digest, Sha256};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Looks up an operator account by name.
pub trait CredentialLookup: Send + Sync {
    fn lookup(&self, username: &str) -> Option<UserRecord>;
}

#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: Vec<UserRecord>,
}

impl UserDirectory {
    pub fn new(users: Vec<UserRecord>) -> Self {
        Self { users }
    }
}

impl CredentialLookup for UserDirectory {
    fn lookup(&self, username: &str) -> Option<UserRecord> {
        self.users.iter().find(|user| user.username == username).cloned()
    }
}

/// Returns the account when the password matches its stored hash.
pub fn authenticate(
    lookup: &dyn CredentialLookup,
    username: &str,
    password: &str,
) -> Option<UserRecord> {
    lookup
        .lookup(username)
        .filter(|user| verify_password(&user.password_hash, password))
}

pub fn users_path() -> PathBuf {
    crate::storage::base_dir().join("users.json")
}

pub fn certs_dir() -> PathBuf {
    crate::storage::base_dir().join("certs")
}

pub fn cert_path() -> PathBuf {
    certs_dir().join("arkdash.crt.pem")
}

pub fn key_path() -> PathBuf {
    certs_dir().join("arkdash.key.pem")
}

pub const HASH_ROUNDS: u32 = 100_000;

/// `<rounds>$<salt>$<digest>`, salt and digest base64. The digest starts as
/// SHA-256(salt || password) and is re-hashed with the password `rounds`
/// times to slow down guessing.
pub fn hash_password(password: &str) -> String {
    hash_with_rounds(password, HASH_ROUNDS)
}

fn hash_with_rounds(password: &str, rounds: u32) -> String {
    let salt: [u8; 16] = rand::thread_rng().gen();
    format!(
        "{rounds}${}${}",
        STANDARD.encode(salt),
        STANDARD.encode(stretch(&salt, password, rounds))
    )
}

pub fn verify_password(stored: &str, password: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(rounds), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    let Ok(rounds) = rounds.parse::<u32>() else {
        return false;
    };
    if rounds == 0 {
        return false;
    }
    let (Ok(salt), Ok(expected)) = (STANDARD.decode(salt), STANDARD.decode(expected)) else {
        return false;
    };
    let actual = stretch(&salt, password, rounds);
    actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected.iter())
            .fold(0u8, |acc, (left, right)| acc | (left ^ right))
            == 0
}

fn stretch(salt: &[u8], password: &str, rounds: u32) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let mut digest = hasher.finalize();
    for _ in 1..rounds {
        let mut hasher = Sha256::new();
        hasher.update(&digest);
        hasher.update(password.as_bytes());
        digest = hasher.finalize();
    }
    digest.to_vec()
}

/// Loads `users.json`, creating an `admin` account with a random password
/// when the file does not exist yet. The generated password is returned only
/// on that first call.
pub async fn load_or_create_users(path: &Path) -> Result<(Vec<UserRecord>, Option<String>), String> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => {
            let users = serde_json::from_str(&contents)
                .map_err(|err| format!("failed to parse users: {err}"))?;
            Ok((users, None))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let password = random_token(20);
            let users = vec![UserRecord {
                username: "admin".to_string(),
                password_hash: hash_password(&password),
                role: Role::Admin,
            }];
            save_users(path, &users).await?;
            Ok((users, Some(password)))
        }
        Err(err) => Err(format!("failed to read users: {err}")),
    }
}

pub async fn save_users(path: &Path, users: &[UserRecord]) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|err| format!("failed to create users dir: {err}"))?;
    }
    let data = serde_json::to_string_pretty(users)
        .map_err(|err| format!("failed to serialize users: {err}"))?;
    tokio::fs::write(path, data)
        .await
        .map_err(|err| format!("failed to write users: {err}"))
}

/// Names the self-signed certificate is valid for: `localhost`, loopback and
/// the address the dashboard binds to when that is a concrete IP.
pub fn certificate_names(bind_ip: IpAddr) -> Vec<SanType> {
    let mut names = vec![
        SanType::DnsName("localhost".to_string()),
        SanType::IpAddress(IpAddr::V4(Ipv4Addr::LOCALHOST)),
    ];
    if !bind_ip.is_unspecified() && !bind_ip.is_loopback() {
        names.push(SanType::IpAddress(bind_ip));
    }
    names
}

/// Generates a self-signed pair unless both PEM files already exist.
/// Returns whether a new pair was written.
pub async fn ensure_tls_cert(cert_path: &Path, key_path: &Path, bind_ip: IpAddr) -> Result<bool, String> {
    let cert_exists = tokio::fs::metadata(cert_path).await.is_ok();
    let key_exists = tokio::fs::metadata(key_path).await.is_ok();
    if cert_exists && key_exists {
        return Ok(false);
    }

    for dir in [cert_path.parent(), key_path.parent()].into_iter().flatten() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|err| format!("failed to create cert dir: {err}"))?;
    }

    let mut params = CertificateParams::default();
    params.distinguished_name = DistinguishedName::new();
    params.distinguished_name.push(DnType::CommonName, "arkdash");
    params.subject_alt_names = certificate_names(bind_ip);
    let cert = rcgen::Certificate::from_params(params)
        .map_err(|err| format!("failed to create cert: {err}"))?;
    let cert_pem = cert.serialize_pem().map_err(|err| format!("failed to serialize cert: {err}"))?;

    tokio::fs::write(key_path, cert.serialize_private_key_pem())
        .await
        .map_err(|err| format!("failed to write key: {err}"))?;
    tokio::fs::write(cert_path, cert_pem)
        .await
        .map_err(|err| format!("failed to write cert: {err}"))?;
    warn!(cert = %cert_path.display(), %bind_ip, "generated self-signed TLS certificate");
    Ok(true)
}

pub fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> UserDirectory {
        UserDirectory::new(vec![
            UserRecord {
                username: "admin".to_string(),
                password_hash: hash_password("changeme"),
                role: Role::Admin,
            },
            UserRecord {
                username: "leslie".to_string(),
                password_hash: hash_password("leslie"),
                role: Role::User,
            },
        ])
    }

    #[test]
    fn password_hash_round_trips() {
        let stored = hash_password("hunter2");
        assert!(verify_password(&stored, "hunter2"));
        assert!(!verify_password(&stored, "hunter3"));
        assert_ne!(stored, hash_password("hunter2"));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("", ""));
        assert!(!verify_password("no-separator", "x"));
        assert!(!verify_password("!!$!!", "x"));
        assert!(!verify_password("many$!!$!!", "x"));
        assert!(!verify_password("0$AAAA$AAAA", "x"));
    }

    #[test]
    fn hash_records_round_count() {
        let stored = hash_password("hunter2");
        assert!(stored.starts_with(&format!("{HASH_ROUNDS}$")));

        let fast = hash_with_rounds("hunter2", 3);
        assert!(fast.starts_with("3$"));
        assert!(verify_password(&fast, "hunter2"));

        let (_, rest) = fast.split_once('$').expect("rounds");
        assert!(!verify_password(&format!("4${rest}"), "hunter2"));
        assert!(!verify_password(&format!("1${rest}"), "hunter2"));
    }

    #[test]
    fn authenticate_checks_name_and_password() {
        let users = directory();
        let user = authenticate(&users, "leslie", "leslie").expect("leslie");
        assert_eq!(user.role, Role::User);
        assert!(authenticate(&users, "leslie", "changeme").is_none());
        assert!(authenticate(&users, "nobody", "leslie").is_none());
        assert!(authenticate(&users, "Admin", "changeme").is_none());
    }

    #[tokio::test]
    async fn first_start_creates_admin_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("users.json");

        let (users, password) = load_or_create_users(&path).await.expect("create");
        let password = password.expect("generated password");
        assert_eq!(users.len(), 1);
        assert!(verify_password(&users[0].password_hash, &password));

        let (reloaded, password) = load_or_create_users(&path).await.expect("reload");
        assert!(password.is_none());
        assert_eq!(reloaded[0].password_hash, users[0].password_hash);
    }

    #[test]
    fn certificate_covers_concrete_bind_address() {
        let lan: IpAddr = "192.168.1.20".parse().expect("ip");
        let names = certificate_names(lan);
        assert!(names.contains(&SanType::IpAddress(lan)));
        assert!(names.contains(&SanType::DnsName("localhost".to_string())));

        let any: IpAddr = "0.0.0.0".parse().expect("ip");
        assert_eq!(certificate_names(any).len(), 2);
    }

    #[tokio::test]
    async fn tls_pair_is_generated_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cert = dir.path().join("certs").join("arkdash.crt.pem");
        let key = dir.path().join("certs").join("arkdash.key.pem");
        let bind = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

        assert!(ensure_tls_cert(&cert, &key, bind).await.expect("generate"));
        let pem = std::fs::read_to_string(&cert).expect("cert");
        assert!(pem.contains("BEGIN CERTIFICATE"));
        assert!(std::fs::read_to_string(&key).expect("key").contains("PRIVATE KEY"));

        assert!(!ensure_tls_cert(&cert, &key, bind).await.expect("reuse"));
        assert_eq!(std::fs::read_to_string(&cert).expect("cert"), pem);
    }

    #[test]
    fn random_token_is_alphanumeric() {
        let token = random_token(32);
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
