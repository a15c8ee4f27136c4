//! Label selector rendering

use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;

/// Render a selector in the textual form accepted by `labelSelector`
///
/// Requirements are sorted by key; set values are sorted and deduplicated.
/// Unknown operators are skipped.
pub fn format_label_selector(selector: &LabelSelector) -> String {
    let mut requirements: Vec<(&str, String)> = Vec::new();

    for (key, value) in selector.match_labels.iter().flatten() {
        requirements.push((key.as_str(), format!("{key}={value}")));
    }

    for expr in selector.match_expressions.iter().flatten() {
        let mut values: Vec<&str> = expr.values.iter().flatten().map(String::as_str).collect();
        values.sort_unstable();
        values.dedup();

        let rendered = match expr.operator.as_str() {
            "In" => format!("{} in ({})", expr.key, values.join(",")),
            "NotIn" => format!("{} notin ({})", expr.key, values.join(",")),
            "Exists" => expr.key.clone(),
            "DoesNotExist" => format!("!{}", expr.key),
            other => {
                tracing::warn!(key = %expr.key, operator = other, "unsupported selector operator");
                continue;
            }
        };
        requirements.push((expr.key.as_str(), rendered));
    }

    requirements.sort_by(|a, b| a.0.cmp(b.0));
    requirements
        .into_iter()
        .map(|(_, r)| r)
        .collect::<Vec<_>>()
        .join(",")
}
