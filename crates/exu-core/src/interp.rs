//! Flat `{token}` template interpolation for save-path templates.

use std::collections::BTreeMap;

use crate::errors::{ErrorInfo, ExuError};

/// Substitutes every `{token}` occurrence in `template` with its value.
///
/// Substitution is a single literal pass: tokens are found left to right,
/// each is replaced everywhere it occurs, and the result is never
/// re-scanned. A token with no entry in `values` is a hard error so that a
/// malformed save template cannot silently produce a path with braces in it.
pub fn interpolate(template: &str, values: &BTreeMap<String, String>) -> Result<String, ExuError> {
    let mut out = template.to_string();
    for token in find_tokens(template) {
        let value = values.get(&token).ok_or_else(|| {
            ExuError::Config(
                ErrorInfo::new("interp-unknown-token", "unknown interpolation token")
                    .with_context("token", token.clone())
                    .with_context("template", template.to_string()),
            )
        })?;
        out = out.replace(&format!("{{{token}}}"), value);
    }
    Ok(out)
}

/// Lists the `{token}` names appearing in a template, left to right.
pub fn find_tokens(template: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let bytes = template.as_bytes();
    let mut pos = 0;
    while let Some(open) = template[pos..].find('{') {
        let start = pos + open + 1;
        match template[start..].find('}') {
            Some(close) => {
                let token = &template[start..start + close];
                if !token.contains('{') && !tokens.iter().any(|t| t == token) {
                    tokens.push(token.to_string());
                }
                pos = start + close + 1;
            }
            None => break,
        }
        if pos >= bytes.len() {
            break;
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn replaces_every_occurrence() {
        let d = values(&[("name", "gridworld"), ("run", "2")]);
        let got = interpolate("results/{name}/{run}/{name}", &d).unwrap();
        assert_eq!(got, "results/gridworld/2/gridworld");
    }

    #[test]
    fn unknown_token_is_fatal() {
        let d = values(&[("name", "gridworld")]);
        let err = interpolate("results/{name}/{oops}", &d).unwrap_err();
        assert_eq!(err.info().code, "interp-unknown-token");
    }

    #[test]
    fn no_literal_braces_remain() {
        let d = values(&[("a", "1"), ("b", "2")]);
        let got = interpolate("{a}/{b}", &d).unwrap();
        assert!(!got.contains('{'));
    }
}
