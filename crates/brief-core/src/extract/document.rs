use crate::ExtractError;
use serde_json::Value;

pub(super) fn pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ExtractError::Extraction(format!("PDF extraction error: {e}")))
}

/// Body paragraphs, one per line. Tables and headers are not included.
pub(super) fn word_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let docx = docx_rs::read_docx(bytes)
        .map_err(|e| ExtractError::Extraction(format!("Word document parsing error: {e}")))?;
    let json: Value = serde_json::from_str(&docx.json())
        .map_err(|e| ExtractError::Extraction(format!("Word document layout error: {e}")))?;
    Ok(paragraphs_from_json(&json).join("\n"))
}

fn paragraphs_from_json(json: &Value) -> Vec<String> {
    let Some(children) = json.pointer("/document/children").and_then(Value::as_array) else {
        return Vec::new();
    };
    children
        .iter()
        .filter(|child| child.get("type").and_then(Value::as_str) == Some("paragraph"))
        .map(|paragraph| {
            let mut text = String::new();
            collect_text(paragraph, &mut text);
            text
        })
        .collect()
}

// Runs can sit under hyperlinks and tracked insertions, so walk every nested node.
fn collect_text(node: &Value, out: &mut String) {
    let Some(data) = node.get("data") else {
        return;
    };
    if node.get("type").and_then(Value::as_str) == Some("text") {
        if let Some(text) = data.get("text").and_then(Value::as_str) {
            out.push_str(text);
        }
        return;
    }
    if let Some(children) = data.get("children").and_then(Value::as_array) {
        for child in children {
            collect_text(child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::paragraphs_from_json;
    use serde_json::json;

    fn run(text: &str) -> serde_json::Value {
        json!({"type": "run", "data": {"children": [{"type": "text", "data": {"text": text}}]}})
    }

    #[test]
    fn paragraphs_concatenate_runs() {
        let doc = json!({
            "document": {"children": [
                {"type": "paragraph", "data": {"children": [run("Quarterly "), run("report")]}},
                {"type": "table", "data": {"rows": []}},
                {"type": "paragraph", "data": {"children": [
                    {"type": "hyperlink", "data": {"children": [run("see appendix")]}}
                ]}},
            ]}
        });
        assert_eq!(
            paragraphs_from_json(&doc),
            vec!["Quarterly report".to_string(), "see appendix".to_string()]
        );
    }

    #[test]
    fn missing_body_yields_nothing() {
        assert!(paragraphs_from_json(&json!({})).is_empty());
    }
}
