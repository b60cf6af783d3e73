use serde_json::Value;

/// Headline fields, most specific first.
const PRIORITY_KEYS: [&str; 8] = [
    "irr",
    "recommendation",
    "base_irr",
    "payment_per_period",
    "matched_outperformance",
    "total_profit",
    "final_difference",
    "loan_amount",
];

/// Nested objects searched when the result itself has no headline field.
const NESTED_KEYS: [&str; 2] = ["summary", "context"];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(val) = find_headline(result_obj) {
        println!("{}", format_minimal(val));
        return;
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn find_headline(value: &Value) -> Option<&Value> {
    let map = value.as_object()?;
    let direct = PRIORITY_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|v| !v.is_null());
    direct.or_else(|| {
        NESTED_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(find_headline)
    })
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
