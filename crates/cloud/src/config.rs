use std::path::PathBuf;

/// Settings for the S3 backend.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint (MinIO and other S3-compatible services).
    pub endpoint: Option<String>,
    /// Base for public URLs. Derived from bucket/region/endpoint when unset.
    pub public_base_url: Option<String>,
}

/// Which blob backend to use and how to reach it.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    Local {
        root: PathBuf,
        public_base_url: String,
    },
    S3(S3Config),
}

impl StorageConfig {
    /// Load storage configuration from environment variables.
    ///
    /// | Env Var              | Default                          |
    /// |----------------------|----------------------------------|
    /// | `STORAGE_BACKEND`    | `local`                          |
    /// | `STORAGE_LOCAL_ROOT` | `./data/blobs`                   |
    /// | `STORAGE_PUBLIC_URL` | `http://localhost:3000/blobs`    |
    /// | `S3_BUCKET`          | required when backend is `s3`    |
    /// | `S3_REGION`          | `us-east-1`                      |
    /// | `S3_ENDPOINT`        | unset                            |
    pub fn from_env() -> Self {
        let backend = std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "local".into());
        let public_url = std::env::var("STORAGE_PUBLIC_URL").ok();

        match backend.as_str() {
            "s3" => Self::S3(S3Config {
                bucket: std::env::var("S3_BUCKET")
                    .expect("S3_BUCKET must be set when STORAGE_BACKEND=s3"),
                region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
                endpoint: std::env::var("S3_ENDPOINT").ok().filter(|s| !s.is_empty()),
                public_base_url: public_url,
            }),
            "local" => Self::Local {
                root: std::env::var("STORAGE_LOCAL_ROOT")
                    .unwrap_or_else(|_| "./data/blobs".into())
                    .into(),
                public_base_url: public_url
                    .unwrap_or_else(|| "http://localhost:3000/blobs".into()),
            },
            other => panic!("STORAGE_BACKEND must be 'local' or 's3', got '{other}'"),
        }
    }

    /// Directory to serve over HTTP, for the local backend only.
    pub fn local_root(&self) -> Option<&PathBuf> {
        match self {
            Self::Local { root, .. } => Some(root),
            Self::S3(_) => None,
        }
    }
}
