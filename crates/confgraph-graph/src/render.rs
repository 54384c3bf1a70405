use crate::executor::GraphRecord;

/// Render graph records as prompt-ready text, one record per line.
///
/// Deterministic for identical input: column order within each record is
/// preserved as flattened, values are JSON-formatted.
pub fn render_records(records: &[GraphRecord]) -> String {
    records
        .iter()
        .map(|record| {
            let fields = record
                .iter()
                .map(|(key, value)| format!("{}: {}", key, value))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{{}}}", fields)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_records_one_per_line() {
        let records = vec![
            vec![("sp.name".to_string(), json!("Jane Doe"))],
            vec![
                ("count(s)".to_string(), json!(3)),
                ("sp.name".to_string(), json!("Aakrati Talati")),
            ],
        ];

        let rendered = render_records(&records);
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "{sp.name: \"Jane Doe\"}");
        assert_eq!(lines[1], "{count(s): 3, sp.name: \"Aakrati Talati\"}");
    }

    #[test]
    fn empty_records_render_empty() {
        assert_eq!(render_records(&[]), "");
    }

    #[test]
    fn rendering_is_deterministic() {
        let records = vec![vec![("k".to_string(), json!(["a", "b"]))]];
        assert_eq!(render_records(&records), render_records(&records));
    }
}
