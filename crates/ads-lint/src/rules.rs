//! Resolution of request paths to pack entries

use ads_core::{HttpMethod, singularize};
use ads_schema::SchemaPack;

/// Entity key for a collection segment.
///
/// Prefers the singular form (`ads` → `ad`), falls back to the segment as
/// written when only that is declared, and returns the singular form when
/// neither is present so messages still read naturally.
pub fn resolve_entity(pack: &SchemaPack, segment: &str) -> String {
    let singular = singularize(segment);
    if pack.has_entity(&singular) || !pack.has_entity(segment) {
        singular
    } else {
        segment.to_string()
    }
}

/// Endpoint key `<entity>.<verb>` for a collection segment, resolved the
/// same way as [`resolve_entity`] across both parameter tables.
pub fn resolve_endpoint(pack: &SchemaPack, segment: &str, method: HttpMethod) -> String {
    let declared = |key: &str| {
        pack.endpoint_params(key).is_some() || pack.deprecated_params(key).is_some()
    };

    let singular = format!("{}.{}", singularize(segment), method.verb());
    if declared(&singular) {
        return singular;
    }
    let raw = format!("{segment}.{}", method.verb());
    if declared(&raw) { raw } else { singular }
}

/// Whether `name` appears in an optional list.
pub fn listed(list: Option<&[String]>, name: &str) -> bool {
    list.is_some_and(|items| items.iter().any(|item| item == name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singular_entity_preferred() {
        let pack = SchemaPack::new("m", "v1").with_entity("ad", ["id"]);
        assert_eq!(resolve_entity(&pack, "ads"), "ad");
    }

    #[test]
    fn test_raw_segment_fallback() {
        let pack = SchemaPack::new("m", "v1")
            .with_entity("insights", ["spend"])
            .with_endpoint("insights.get", ["date_preset"]);
        assert_eq!(resolve_entity(&pack, "insights"), "insights");
        assert_eq!(
            resolve_endpoint(&pack, "insights", HttpMethod::Get),
            "insights.get"
        );
    }

    #[test]
    fn test_undeclared_resolves_to_singular() {
        let pack = SchemaPack::new("m", "v1");
        assert_eq!(resolve_entity(&pack, "campaigns"), "campaign");
        assert_eq!(
            resolve_endpoint(&pack, "campaigns", HttpMethod::Post),
            "campaign.post"
        );
    }

    #[test]
    fn test_endpoint_declared_only_as_deprecated() {
        let pack = SchemaPack::new("m", "v1").with_deprecated("ad.delete", ["force"]);
        assert_eq!(resolve_endpoint(&pack, "ads", HttpMethod::Delete), "ad.delete");
    }

    #[test]
    fn test_listed() {
        let items = vec!["a".to_string(), "b".to_string()];
        assert!(listed(Some(items.as_slice()), "b"));
        assert!(!listed(Some(items.as_slice()), "c"));
        assert!(!listed(None, "a"));
    }
}
