use anyhow::anyhow;
use confique::Config;
use openssl::ssl::{SslAcceptor, SslFiletype, SslMethod};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub static CONFIG_PATH: &'static str = "/etc/wedding-invitation/config.toml";

#[derive(Config, Deserialize, Clone, Debug)]
pub struct AppConfig {
    /// Root of everything served under `/images`.
    #[config(default = "public", env = "WEDDING_PUBLIC_DIR")]
    pub public_dir: String,

    /// Gallery directory, relative to `public_dir`.
    #[config(default = "images/gallery")]
    pub gallery_dir: String,

    #[config(default = "manifest.json")]
    pub manifest_name: String,

    /// Wedding content file layered over the built-in defaults.
    #[config(default = "/etc/wedding-invitation/content.toml", env = "WEDDING_CONTENT")]
    pub content: String,

    /// Maximum age of cached image data in ms.
    #[config(default = 300000)]
    pub cache_age: i64,

    /// How long a page render waits for the hero edge colors.
    #[config(default = 1500)]
    pub sample_timeout_ms: u64,

    #[config(default = "0.0.0.0:8443", env = "WEDDING_ADDRESS")]
    pub address: String,

    #[config(default = false)]
    pub ssl: bool,

    #[config()]
    pub cert: Option<String>,

    #[config()]
    pub key: Option<String>,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config = Self::builder().env().file(path.as_ref()).load()?;
        Ok(config)
    }

    pub fn gallery_path(&self) -> PathBuf {
        PathBuf::from(&self.public_dir).join(&self.gallery_dir)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.gallery_path().join(&self.manifest_name)
    }

    /// URL prefix under which directory-scanned gallery files are served.
    pub fn gallery_url_prefix(&self) -> String {
        format!("/{}", self.gallery_dir.trim_matches('/').replace('\\', "/"))
    }

    pub fn check(&self) -> anyhow::Result<(String, String)> {
        let cert_missing = self.cert.is_none();
        let key_missing = self.key.is_none();

        if self.ssl && (cert_missing || key_missing) {
            let mut missing = Vec::new();
            if cert_missing {
                missing.push("certificate");
            }
            if key_missing {
                missing.push("key");
            }
            anyhow::bail!("SSL is enabled but missing {}!", missing.join(" and "));
        }

        let cert = self
            .cert
            .clone()
            .ok_or_else(|| anyhow!("Certificate is missing"))?;
        let key = self.key.clone().ok_or_else(|| anyhow!("Key is missing"))?;

        Ok((cert, key))
    }
}

#[cfg(test)]
impl AppConfig {
    pub fn for_public_dir(public_dir: &Path) -> Self {
        Self {
            public_dir: public_dir.to_string_lossy().to_string(),
            gallery_dir: "images/gallery".to_string(),
            manifest_name: "manifest.json".to_string(),
            content: public_dir.join("content.toml").to_string_lossy().to_string(),
            cache_age: 300_000,
            sample_timeout_ms: 5_000,
            address: "127.0.0.1:0".to_string(),
            ssl: false,
            cert: None,
            key: None,
        }
    }
}

// Takes in the certificate and key and generates an openssl instance.
// Most likely fail cause is missing certificates or incorrect permissions.
pub fn create_ssl_builder(
    cert_path: &str,
    key_path: &str,
) -> anyhow::Result<openssl::ssl::SslAcceptorBuilder> {
    match (
        PathBuf::from(&cert_path).exists(),
        PathBuf::from(&key_path).exists(),
    ) {
        (false, _) => return Err(anyhow!("Certificate does not exist.")),
        (_, false) => return Err(anyhow!("Key does not exist.")),
        (_, _) => {}
    }

    let mut builder = SslAcceptor::mozilla_intermediate(SslMethod::tls())?;

    builder.set_private_key_file(key_path, SslFiletype::PEM)?;
    builder.set_certificate_chain_file(cert_path)?;

    Ok(builder)
}
