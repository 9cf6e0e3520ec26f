//! Remediation tables: error code → category, and canned guidance per category

use crate::error::RemediationCategory;

/// Application and ad-account throttling codes.
const RATE_LIMIT_CODES: [i64; 4] = [4, 17, 32, 613];
/// Business-use-case throttling codes.
const BUC_RATE_LIMIT_CODES: std::ops::RangeInclusive<i64> = 80_000..=80_014;
/// Subcode used for ad-account spend/mutation throttling under code 100/17.
const RATE_LIMIT_SUBCODE: i64 = 2_446_079;

/// Codes the API documents as temporary ("unknown", "service").
const TRANSIENT_CODES: [i64; 2] = [1, 2];

const PERMISSION_CODES: [i64; 3] = [10, 190, 368];
const PERMISSION_RANGE: std::ops::RangeInclusive<i64> = 200..=299;

const INVALID_PARAMETER: i64 = 100;
const UNSUPPORTED_GET_SUBCODE: i64 = 33;
const ALIAS_NOT_FOUND: i64 = 803;
const DEPRECATED_VERSION: i64 = 2635;
const TOKEN_INVALID: i64 = 190;

/// Map an error to its category and whether repeating it may succeed.
///
/// Checked in order: throttling, documented transient codes, permission,
/// missing objects, validation, then HTTP status fallbacks. Anything else
/// is `unknown` and not retryable. Apart from throttling, no 4xx response
/// is retryable.
pub fn categorize(
    code: i64,
    subcode: Option<i64>,
    status: u16,
    is_transient: bool,
) -> (RemediationCategory, bool) {
    if RATE_LIMIT_CODES.contains(&code)
        || BUC_RATE_LIMIT_CODES.contains(&code)
        || subcode == Some(RATE_LIMIT_SUBCODE)
        || status == 429
    {
        return (RemediationCategory::RateLimit, true);
    }

    let client_error = (400..500).contains(&status);
    if (TRANSIENT_CODES.contains(&code) || is_transient) && !client_error {
        return (RemediationCategory::Unknown, true);
    }

    if PERMISSION_CODES.contains(&code) || PERMISSION_RANGE.contains(&code) {
        return (RemediationCategory::Permission, false);
    }

    if code == ALIAS_NOT_FOUND
        || (code == INVALID_PARAMETER && subcode == Some(UNSUPPORTED_GET_SUBCODE))
    {
        return (RemediationCategory::NotFound, false);
    }

    if code == INVALID_PARAMETER || code == DEPRECATED_VERSION {
        return (RemediationCategory::Validation, false);
    }

    match status {
        401 | 403 => (RemediationCategory::Permission, false),
        404 => (RemediationCategory::NotFound, false),
        500..=599 => (RemediationCategory::Unknown, true),
        _ => (RemediationCategory::Unknown, false),
    }
}

/// One-line summary for a category.
pub fn summary(category: RemediationCategory) -> &'static str {
    match category {
        RemediationCategory::NotFound => {
            "The referenced object does not exist or is not visible to this token."
        }
        RemediationCategory::Permission => {
            "The access token is not allowed to perform this operation."
        }
        RemediationCategory::Validation => "The API rejected one or more request parameters.",
        RemediationCategory::RateLimit => "The request was throttled by the API rate limiter.",
        RemediationCategory::Unknown => "The API returned an error that could not be classified.",
    }
}

/// Ordered next steps for a category, with code-specific steps first.
pub fn actions(category: RemediationCategory, code: i64, retryable: bool) -> Vec<String> {
    let mut steps: Vec<&str> = Vec::new();

    match category {
        RemediationCategory::NotFound => {
            steps.extend([
                "Verify the object ID in the path and in any *_id parameters",
                "Confirm the object belongs to the ad account named in the path",
                "Check that the token's user can see the object (it may be deleted or archived)",
            ]);
        }
        RemediationCategory::Permission => {
            if code == TOKEN_INVALID {
                steps.push("Regenerate the access token for this profile; it is expired or revoked");
            }
            steps.extend([
                "Confirm the token has the ads_management permission for this ad account",
                "Check the user's role on the ad account or business",
                "Review any policy restriction notices on the account",
            ]);
        }
        RemediationCategory::Validation => {
            if code == DEPRECATED_VERSION {
                steps.push("Switch --api-version to a supported API version");
            }
            steps.extend([
                "Fix the parameters named in the error and resend",
                "Run `ads lint` with --strict to check the request against the schema pack",
                "Compare parameter formats (JSON specs, enums, budgets in minor units) with the API reference",
            ]);
        }
        RemediationCategory::RateLimit => {
            steps.extend([
                "Wait before retrying; throttling windows reset within an hour",
                "Reduce request volume or spread calls over time",
                "Inspect the rate_limit block in the output for current usage",
            ]);
        }
        RemediationCategory::Unknown => {
            if retryable {
                steps.push("Retry the request; the API reported a temporary failure");
            }
            steps.extend([
                "Quote the trace id when contacting API support",
                "Re-run with -vv to capture request details",
            ]);
        }
    }

    steps.into_iter().map(ToString::to_string).collect()
}
