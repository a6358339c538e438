use super::errors::classify;
use crate::runtime::error::ProviderError;
use crate::runtime::naming::role_arn;

/// Resolves `arn:aws:iam::{account}:role/{role_name}` for the caller's account.
pub async fn caller_role_arn(
    client: &aws_sdk_sts::Client,
    role_name: &str,
) -> Result<String, ProviderError> {
    let identity = client
        .get_caller_identity()
        .send()
        .await
        .map_err(|error| classify("GetCallerIdentity", error))?;
    let account = identity
        .account()
        .ok_or_else(|| ProviderError::other("GetCallerIdentity", "response carried no account id"))?;
    Ok(role_arn(account, role_name))
}
