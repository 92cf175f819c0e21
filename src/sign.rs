use std::collections::HashMap;

use hmac::{Hmac, Mac};
use md5::Md5;
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Concatenate parameters in byte-wise key order as `key` immediately
/// followed by `value`, no separators. Keys are used exactly as given; the
/// remote verifier recomputes this string from the transmitted form body, so
/// any normalization here would break verification.
fn canonical_concat(params: &HashMap<String, String>) -> String {
    let mut entries: Vec<(&str, &str)> = params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
    let mut out = String::with_capacity(entries.iter().map(|(k, v)| k.len() + v.len()).sum());
    for (k, v) in entries {
        out.push_str(k);
        out.push_str(v);
    }
    out
}

/// Legacy TOP signature: MD5 over the sorted key-value concatenation wrapped
/// in the secret on both sides, rendered as uppercase hex.
///
/// Used by the TOP router endpoints (`sign_method=md5`). The `sign` field
/// must not be present in `params`.
pub fn sign_md5(params: &HashMap<String, String>, secret: &str) -> String {
    let mut base = String::from(secret);
    base.push_str(&canonical_concat(params));
    base.push_str(secret);
    let digest = Md5::digest(base.as_bytes());
    hex::encode_upper(digest)
}

/// GOP signature: HMAC-SHA256 keyed by the app secret over the operation
/// path followed by the sorted key-value concatenation, uppercase hex.
///
/// Unlike [`sign_md5`] the secret is not appended to the signed string; it
/// enters only as HMAC key material. Used by the `/rest` gateway
/// (`sign_method=sha256`).
pub fn sign_hmac_sha256(params: &HashMap<String, String>, secret: &str, operation: &str) -> String {
    let mut base = String::from(operation);
    base.push_str(&canonical_concat(params));
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(base.as_bytes());
    hex::encode_upper(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn md5_known_vector() {
        // base string: "SECRETa1b2SECRET"
        let p = params(&[("a", "1"), ("b", "2")]);
        assert_eq!(sign_md5(&p, "SECRET"), "F179311338B82F4A13FFB20921B8B3DD");
    }

    #[test]
    fn hmac_known_vector() {
        // base string: "/test/opa1b2"
        let p = params(&[("a", "1"), ("b", "2")]);
        assert_eq!(
            sign_hmac_sha256(&p, "SECRET", "/test/op"),
            "6C40B69090E0D758C1B8D7DE143DE8A76120D7E9DBE7B8CFFD09C57E6EBAF582"
        );
    }

    #[test]
    fn md5_empty_params_wraps_secret_only() {
        // base string degenerates to secret twice: "XX"
        let p = params(&[]);
        assert_eq!(sign_md5(&p, "X"), hex::encode_upper(Md5::digest(b"XX")));
    }

    #[test]
    fn hmac_empty_params_signs_operation_only() {
        let p = params(&[]);
        assert_eq!(
            sign_hmac_sha256(&p, "k", "/op"),
            "ABF5623E081AC4026F9C0A40E211E8CD15E38D3A9CE87AEB9961883744141684"
        );
    }

    #[test]
    fn output_shape() {
        let p = params(&[("app_key", "123"), ("timestamp", "1700000000000")]);
        let a = sign_md5(&p, "s");
        let b = sign_hmac_sha256(&p, "s", "/icbu/product/get");
        assert_eq!(a.len(), 32);
        assert_eq!(b.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert!(b.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn deterministic_and_order_independent() {
        let p1 = params(&[("b", "2"), ("a", "1"), ("c", "3")]);
        let mut p2 = HashMap::new();
        for (k, v) in [("c", "3"), ("a", "1"), ("b", "2")] {
            p2.insert(k.to_string(), v.to_string());
        }
        assert_eq!(sign_md5(&p1, "s"), sign_md5(&p2, "s"));
        assert_eq!(
            sign_hmac_sha256(&p1, "s", "/op"),
            sign_hmac_sha256(&p2, "s", "/op")
        );
        assert_eq!(sign_md5(&p1, "s"), sign_md5(&p1, "s"));
    }

    #[test]
    fn sorting_is_bytewise_not_casefolded() {
        // 'Z' (0x5a) sorts before 'a' (0x61); a case-folded sort would flip
        // the pair order and change the digest.
        let p = params(&[("Z", "1"), ("a", "2")]);
        let mut base = String::from("s");
        base.push_str("Z1a2");
        base.push('s');
        assert_eq!(sign_md5(&p, "s"), hex::encode_upper(Md5::digest(base.as_bytes())));
    }

    #[test]
    fn sensitive_to_any_mutation() {
        let base = params(&[("a", "1"), ("b", "2")]);
        let reference = sign_hmac_sha256(&base, "SECRET", "/test/op");

        let mut changed_value = base.clone();
        changed_value.insert("b".into(), "3".into());
        assert_ne!(sign_hmac_sha256(&changed_value, "SECRET", "/test/op"), reference);

        let mut extra_key = base.clone();
        extra_key.insert("c".into(), "".into());
        assert_ne!(sign_hmac_sha256(&extra_key, "SECRET", "/test/op"), reference);

        let mut removed = base.clone();
        removed.remove("a");
        assert_ne!(sign_hmac_sha256(&removed, "SECRET", "/test/op"), reference);

        assert_ne!(sign_hmac_sha256(&base, "SECRE_", "/test/op"), reference);
        assert_ne!(sign_hmac_sha256(&base, "SECRET", "/test/oq"), reference);
    }
}
