use std::fmt;

use rand::Rng;
use thiserror::Error;

pub const IDENTITY_LENGTH: usize = 8;
pub const TABLE_NAME: &str = "TransripcionesAuto";
pub const INPUT_BUCKET_ROLE: &str = "proyecto-entrada";
pub const WEB_BUCKET_ROLE: &str = "proyecto-web";
pub const FUNCTION_ROLE: &str = "procesador-imagenes";
pub const PERMISSION_ROLE: &str = "s3-invoke";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("project id must be exactly {IDENTITY_LENGTH} characters, got {0}")]
    Length(usize),
    #[error("project id must be lowercase hex, got '{0}'")]
    NotHex(String),
}

/// Short random token scoping every resource name of one deployment run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectIdentity(String);

impl ProjectIdentity {
    pub fn generate() -> Self {
        Self::from_rng(&mut rand::thread_rng())
    }

    pub fn from_rng(rng: &mut impl Rng) -> Self {
        Self(format!("{:08x}", rng.gen::<u32>()))
    }

    pub fn parse(token: &str) -> Result<Self, IdentityError> {
        let token = token.trim();
        if token.len() != IDENTITY_LENGTH {
            return Err(IdentityError::Length(token.len()));
        }
        if !token
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(IdentityError::NotHex(token.to_string()));
        }
        Ok(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every name the orchestrator plans for a run, derived once from the identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    pub input_bucket: String,
    pub web_bucket: String,
    pub table: String,
    pub function: String,
    pub permission_statement: String,
}

impl ResourceNames {
    pub fn derive(identity: &ProjectIdentity) -> Self {
        let id = identity.as_str();
        Self {
            input_bucket: format!("{INPUT_BUCKET_ROLE}-{id}"),
            web_bucket: format!("{WEB_BUCKET_ROLE}-{id}"),
            table: TABLE_NAME.to_string(),
            function: format!("{FUNCTION_ROLE}-{id}"),
            permission_statement: format!("{PERMISSION_ROLE}-{id}"),
        }
    }

    pub fn buckets(&self) -> [&str; 2] {
        [&self.input_bucket, &self.web_bucket]
    }
}

pub fn bucket_arn(bucket: &str) -> String {
    format!("arn:aws:s3:::{bucket}")
}

pub fn object_arn_pattern(bucket: &str) -> String {
    format!("arn:aws:s3:::{bucket}/*")
}

pub fn role_arn(account_id: &str, role_name: &str) -> String {
    format!("arn:aws:iam::{account_id}:role/{role_name}")
}

pub fn website_url(bucket: &str, region: &str) -> String {
    format!("http://{bucket}.s3-website-{region}.amazonaws.com")
}
