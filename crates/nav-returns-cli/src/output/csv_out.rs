use serde_json::Value;
use std::io;

use super::{format_value, SERIES_KEYS};

/// Write output as CSV to stdout.
///
/// The first dated series in the result (growth curve, rolling points or
/// transactions) becomes the table; otherwise scalar fields are written as
/// `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => {
            let series = SERIES_KEYS.iter().find_map(|key| match map.get(*key) {
                Some(Value::Array(arr)) if !arr.is_empty() => Some(arr),
                _ => None,
            });
            match series {
                Some(arr) => write_array_csv(&mut wtr, arr),
                None => {
                    let _ = wtr.write_record(["field", "value"]);
                    for (key, val) in map {
                        if !val.is_array() {
                            let _ = wtr.write_record([key.as_str(), &format_value(val)]);
                        }
                    }
                }
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_value(result)]);
        }
    }

    let _ = wtr.flush();
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([&format_value(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_value).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}
