//! XML payloads and responses of the VersityGW admin API
//!
//! Request bodies are assembled element by element: an optional property
//! that is absent is left out entirely, which the gateway treats
//! differently from an empty value.

use crate::traits::{UserSpec, UserUpdate};
use quick_xml::escape::escape;
use serde::Deserialize;

/// Role assigned when a record does not ask for one
pub const DEFAULT_ROLE: &str = "user";

#[derive(Debug, Deserialize)]
struct ListUsersResult {
    #[serde(rename = "Accounts", default)]
    accounts: Vec<AccountEntry>,
}

#[derive(Debug, Deserialize)]
struct AccountEntry {
    #[serde(rename = "Access", default)]
    access: String,
}

#[derive(Debug, Deserialize)]
struct ListBucketsResult {
    #[serde(rename = "Buckets", default)]
    buckets: Vec<BucketEntry>,
}

#[derive(Debug, Deserialize)]
struct BucketEntry {
    #[serde(rename = "Name", default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct AccessControlPolicy {
    #[serde(rename = "Owner")]
    owner: OwnerEntry,
}

#[derive(Debug, Deserialize)]
struct OwnerEntry {
    #[serde(rename = "ID", default)]
    id: String,
}

/// Body for `create-user`
pub fn create_user_payload(user: &UserSpec) -> String {
    let mut xml = String::from("<Account>");
    push_element(&mut xml, "Access", &user.access_key);
    push_element(&mut xml, "Secret", &user.secret_key);
    push_element(&mut xml, "Role", user.role.as_deref().unwrap_or(DEFAULT_ROLE));
    if let Some(user_id) = user.user_id {
        push_element(&mut xml, "UserID", &user_id.to_string());
    }
    if let Some(group_id) = user.group_id {
        push_element(&mut xml, "GroupID", &group_id.to_string());
    }
    xml.push_str("</Account>");
    xml
}

/// Body for `update-user`
pub fn update_user_payload(update: &UserUpdate) -> String {
    let mut xml = String::from("<MutableProps>");
    if let Some(secret) = &update.secret_key {
        push_element(&mut xml, "Secret", secret);
    }
    if let Some(user_id) = update.user_id {
        push_element(&mut xml, "UserID", &user_id.to_string());
    }
    if let Some(group_id) = update.group_id {
        push_element(&mut xml, "GroupID", &group_id.to_string());
    }
    xml.push_str("</MutableProps>");
    xml
}

fn push_element(xml: &mut String, name: &str, text: &str) {
    xml.push('<');
    xml.push_str(name);
    xml.push('>');
    xml.push_str(&escape(text));
    xml.push_str("</");
    xml.push_str(name);
    xml.push('>');
}

/// Access keys from a `list-users` response
pub fn parse_user_list(body: &str) -> Result<Vec<String>, quick_xml::DeError> {
    let result: ListUsersResult = quick_xml::de::from_str(body)?;
    Ok(result.accounts.into_iter().map(|a| a.access).collect())
}

/// Bucket names from a `list-buckets` response
pub fn parse_bucket_list(body: &str) -> Result<Vec<String>, quick_xml::DeError> {
    let result: ListBucketsResult = quick_xml::de::from_str(body)?;
    Ok(result.buckets.into_iter().map(|b| b.name).collect())
}

/// Owner ID from a bucket ACL document
pub fn parse_acl_owner(body: &str) -> Result<String, quick_xml::DeError> {
    let policy: AccessControlPolicy = quick_xml::de::from_str(body)?;
    Ok(policy.owner.id)
}
