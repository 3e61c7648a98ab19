//! Field lookup over the alternate key spellings a secret may use
//!
//! Each logical field has an ordered list of candidate keys: lower-case
//! hyphenated first, then upper-case underscored, then AWS-style names.
//! The first candidate with a non-empty value wins.

use s3_operator_core::{ExtractedIntent, FieldMap};

pub const BUCKET_NAME_KEYS: &[&str] = &["bucket-name", "BUCKET_NAME"];
pub const ACCESS_KEY_KEYS: &[&str] = &[
    "access-key",
    "ACCESS_KEY",
    "ACCESS_KEY_ID",
    "AWS_ACCESS_KEY_ID",
];
pub const SECRET_KEY_KEYS: &[&str] = &[
    "secret-key",
    "SECRET_KEY",
    "SECRET_ACCESS_KEY",
    "AWS_SECRET_ACCESS_KEY",
];
pub const ENDPOINT_URL_KEYS: &[&str] = &["endpoint-url", "ENDPOINT_URL", "AWS_ENDPOINT_URL"];
pub const USER_ID_KEYS: &[&str] = &["user-id", "USER_ID"];
pub const GROUP_ID_KEYS: &[&str] = &["group-id", "GROUP_ID"];
pub const ROLE_KEYS: &[&str] = &["role", "ROLE"];

/// First non-empty value among `candidates`
pub fn lookup<'a>(fields: &'a FieldMap, candidates: &[&str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|key| fields.get(*key))
        .map(String::as_str)
        .find(|value| !value.is_empty())
}

/// Base-10 integer under `candidates`; a non-numeric value counts as absent
pub fn lookup_int(fields: &FieldMap, candidates: &[&str]) -> Option<i64> {
    lookup(fields, candidates).and_then(|value| value.trim().parse().ok())
}

/// Resolve the reconciliation intent of a flattened field map.
///
/// Fails with the logical names of every missing required field.
pub fn extract_intent(fields: &FieldMap) -> Result<ExtractedIntent, Vec<&'static str>> {
    let bucket_name = lookup(fields, BUCKET_NAME_KEYS);
    let access_key = lookup(fields, ACCESS_KEY_KEYS);
    let secret_key = lookup(fields, SECRET_KEY_KEYS);

    match (bucket_name, access_key, secret_key) {
        (Some(bucket_name), Some(access_key), Some(secret_key)) => Ok(ExtractedIntent {
            bucket_name: bucket_name.to_string(),
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
            endpoint_url: lookup(fields, ENDPOINT_URL_KEYS).map(str::to_string),
            role: lookup(fields, ROLE_KEYS).map(str::to_string),
            user_id: lookup_int(fields, USER_ID_KEYS),
            group_id: lookup_int(fields, GROUP_ID_KEYS),
        }),
        _ => {
            let mut missing = Vec::new();
            if bucket_name.is_none() {
                missing.push("bucket-name");
            }
            if access_key.is_none() {
                missing.push("access-key");
            }
            if secret_key.is_none() {
                missing.push("secret-key");
            }
            Err(missing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_lookup_follows_candidate_order() {
        let map = fields(&[("ACCESS_KEY_ID", "third"), ("ACCESS_KEY", "second")]);
        assert_eq!(lookup(&map, ACCESS_KEY_KEYS), Some("second"));
    }

    #[test]
    fn test_lookup_skips_empty_values() {
        let map = fields(&[("access-key", ""), ("AWS_ACCESS_KEY_ID", "aws")]);
        assert_eq!(lookup(&map, ACCESS_KEY_KEYS), Some("aws"));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let map = fields(&[("Bucket-Name", "nope")]);
        assert_eq!(lookup(&map, BUCKET_NAME_KEYS), None);
    }

    #[test]
    fn test_lookup_int() {
        assert_eq!(lookup_int(&fields(&[("user-id", "1000")]), USER_ID_KEYS), Some(1000));
        assert_eq!(lookup_int(&fields(&[("USER_ID", "-7")]), USER_ID_KEYS), Some(-7));
        assert_eq!(lookup_int(&fields(&[("user-id", "abc")]), USER_ID_KEYS), None);
        assert_eq!(lookup_int(&fields(&[]), USER_ID_KEYS), None);
    }

    #[test]
    fn test_extract_full_intent() {
        let map = fields(&[
            ("BUCKET_NAME", "photos"),
            ("AWS_ACCESS_KEY_ID", "alice"),
            ("AWS_SECRET_ACCESS_KEY", "s3cret"),
            ("AWS_ENDPOINT_URL", "http://gw:7070"),
            ("role", "admin"),
            ("group-id", "50"),
            ("user-id", "not-a-number"),
        ]);

        let intent = extract_intent(&map).unwrap();
        assert_eq!(intent.bucket_name, "photos");
        assert_eq!(intent.access_key, "alice");
        assert_eq!(intent.secret_key, "s3cret");
        assert_eq!(intent.endpoint_url.as_deref(), Some("http://gw:7070"));
        assert_eq!(intent.role.as_deref(), Some("admin"));
        assert_eq!(intent.group_id, Some(50));
        assert_eq!(intent.user_id, None);
    }

    #[test]
    fn test_extract_reports_every_missing_field() {
        let map = fields(&[("access-key", "alice"), ("secret-key", "")]);
        assert_eq!(extract_intent(&map).unwrap_err(), vec!["bucket-name", "secret-key"]);

        assert_eq!(
            extract_intent(&FieldMap::new()).unwrap_err(),
            vec!["bucket-name", "access-key", "secret-key"]
        );
    }
}
