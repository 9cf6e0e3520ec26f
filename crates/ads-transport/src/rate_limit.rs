//! Usage headers reported with every response

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::exchange::RawResponse;

const APP_USAGE: &str = "x-app-usage";
const AD_ACCOUNT_USAGE: &str = "x-ad-account-usage";
const BUSINESS_USE_CASE_USAGE: &str = "x-business-use-case-usage";

/// Throttling headroom parsed from the usage headers.
///
/// Each member is the decoded JSON header value; headers that are absent
/// or not JSON are left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_usage: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_account_usage: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub business_use_case_usage: BTreeMap<String, Value>,
}

impl RateLimitInfo {
    pub fn from_response(response: &RawResponse) -> Option<Self> {
        let decode = |name: &str| {
            response
                .header(name)
                .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
        };

        let business_use_case_usage = match decode(BUSINESS_USE_CASE_USAGE) {
            Some(Value::Object(map)) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        };
        let info = Self {
            app_usage: decode(APP_USAGE),
            ad_account_usage: decode(AD_ACCOUNT_USAGE),
            business_use_case_usage,
        };
        (!info.is_empty()).then_some(info)
    }

    pub fn is_empty(&self) -> bool {
        self.app_usage.is_none()
            && self.ad_account_usage.is_none()
            && self.business_use_case_usage.is_empty()
    }

    /// Highest percentage reported by any usage counter.
    pub fn peak_usage(&self) -> Option<f64> {
        let mut values = Vec::new();
        collect_percentages(self.app_usage.as_ref(), &mut values);
        collect_percentages(self.ad_account_usage.as_ref(), &mut values);
        for entry in self.business_use_case_usage.values() {
            collect_percentages(Some(entry), &mut values);
        }
        values.into_iter().reduce(f64::max)
    }
}

fn collect_percentages(value: Option<&Value>, out: &mut Vec<f64>) {
    match value {
        Some(Value::Object(map)) => {
            for (key, v) in map {
                if key == "estimated_time_to_regain_access" || key == "type" {
                    continue;
                }
                match v {
                    Value::Number(n) => out.extend(n.as_f64()),
                    other => collect_percentages(Some(other), out),
                }
            }
        }
        Some(Value::Array(items)) => {
            for item in items {
                collect_percentages(Some(item), out);
            }
        }
        _ => {}
    }
}
