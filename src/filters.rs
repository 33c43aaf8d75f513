//! Small pure helpers for playbook-style automation.
//!
//! These functions mirror the checks an upgrade workflow keeps repeating:
//! is a job finished, did it succeed, which job did a request start, and how
//! to turn a nested map into an XML command. The version and HA predicates
//! are re-exported here so templated callers find everything in one place.

use serde_json::Value;

use crate::xml::{NormalizedResponse, XmlValue};

pub use crate::ha::{
    is_active as ha_state_is_active, is_passive as ha_state_is_passive,
    is_standalone as ha_state_is_standalone,
};
pub use crate::version::{
    compare as version_compare, eq as version_eq, gt as version_gt, gte as version_gte,
    is_hotfix, lt as version_lt, lte as version_lte, major_minor, normalize as normalize_version,
    parse as parse_version,
};

const COMPLETE_STATES: [&str; 4] = ["FIN", "COMPLETED", "OK", "DONE"];
const SUCCESS_RESULTS: [&str; 3] = ["OK", "SUCCESS", "COMPLETED"];

/// Escapes the five XML special characters.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// True when a job status denotes a finished job, case-insensitively.
pub fn is_job_complete(status: &str) -> bool {
    let status = status.trim();
    COMPLETE_STATES
        .iter()
        .any(|done| done.eq_ignore_ascii_case(status))
}

/// True when a job result denotes success, case-insensitively.
pub fn is_job_success(result: &str) -> bool {
    let result = result.trim();
    SUCCESS_RESULTS
        .iter()
        .any(|ok| ok.eq_ignore_ascii_case(result))
}

/// Job id started by a request, if the response names one.
///
/// Looks at `job` as plain text, then `job/id`, then the `id` attribute of
/// `job`, and finally `result/job`.
pub fn extract_job_id(response: &NormalizedResponse) -> Option<String> {
    let data = &response.data;
    if let Some(job) = data.get("job") {
        return match job {
            XmlValue::Scalar(id) => Some(id.clone()),
            XmlValue::Map(_) => job
                .get("id")
                .and_then(XmlValue::as_str)
                .or_else(|| job.attribute("id"))
                .map(str::to_string),
            _ => None,
        };
    }
    data.path(&["result", "job"])
        .and_then(XmlValue::as_str)
        .map(str::to_string)
}

/// Serializes a JSON tree into nested XML command tags under `root_tag`.
///
/// Map keys become tags in insertion order, arrays are concatenated, `null`
/// is empty and other scalars are written as escaped text.
///
/// ```
/// use serde_json::json;
/// let cmd = rpanos::filters::dict_to_xml_cmd(&json!({"system": {"info": null}}), "show");
/// assert_eq!(cmd, "<show><system><info></info></system></show>");
/// ```
pub fn dict_to_xml_cmd(tree: &Value, root_tag: &str) -> String {
    let mut out = String::new();
    out.push('<');
    out.push_str(root_tag);
    out.push('>');
    write_value(&mut out, tree);
    out.push_str("</");
    out.push_str(root_tag);
    out.push('>');
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (tag, child) in map {
                out.push('<');
                out.push_str(tag);
                out.push('>');
                write_value(out, child);
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
        Value::Array(items) => items.iter().for_each(|item| write_value(out, item)),
        Value::Null => {}
        Value::String(text) => out.push_str(&escape_xml(text)),
        Value::Bool(flag) => out.push_str(if *flag { "true" } else { "false" }),
        Value::Number(number) => out.push_str(&number.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_response;
    use serde_json::json;

    #[test]
    fn job_state_checks_ignore_case() {
        assert!(is_job_complete("FIN"));
        assert!(is_job_complete("done"));
        assert!(!is_job_complete("PEND"));
        assert!(!is_job_complete(""));
        assert!(is_job_success("ok"));
        assert!(is_job_success("Success"));
        assert!(!is_job_success("FAIL"));
    }

    #[test]
    fn job_id_from_every_known_shape() {
        let cases = [
            (r#"<response status="success"><result><job>17</job></result></response>"#, Some("17")),
            (
                r#"<response status="success"><result><job><id>18</id></job></result></response>"#,
                Some("18"),
            ),
            (
                r#"<response status="success"><result><job id="19"><type>Download</type></job></result></response>"#,
                Some("19"),
            ),
            (
                r#"<response status="success"><result><result><job>20</job></result></result></response>"#,
                Some("20"),
            ),
            (r#"<response status="success"><result><msg>queued</msg></result></response>"#, None),
        ];
        for (xml, expected) in cases {
            let resp = parse_response(xml).expect("parse");
            assert_eq!(extract_job_id(&resp).as_deref(), expected, "{xml}");
        }
    }

    #[test]
    fn nested_map_becomes_xml_command() {
        let tree = json!({
            "system": {"software": {"install": {"version": "11.1.2"}}},
            "flags": [{"a": null}, {"b": true}],
            "count": 3,
        });
        assert_eq!(
            dict_to_xml_cmd(&tree, "request"),
            "<request><system><software><install><version>11.1.2</version></install></software></system>\
             <flags><a></a><b>true</b></flags><count>3</count></request>"
        );
    }

    #[test]
    fn string_leaves_are_escaped() {
        assert_eq!(
            dict_to_xml_cmd(&json!({"name": "a<b & 'c'"}), "show"),
            "<show><name>a&lt;b &amp; &apos;c&apos;</name></show>"
        );
    }

    #[test]
    fn reexported_predicates_are_usable() {
        assert!(version_gte("10.2.9-h1", "10.2.9"));
        assert!(!version_gte("garbage", "10.2.9"));
        assert!(ha_state_is_active("Active-Primary"));
        assert!(ha_state_is_standalone(""));
    }
}
