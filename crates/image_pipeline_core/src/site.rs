use serde_json::json;

use crate::naming::object_arn_pattern;

pub const PLACEHOLDER: &str = "__NOMBRE_BUCKET_PLACEHOLDER__";

/// Cross-origin rules applied to every provisioned bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsRules {
    pub allowed_headers: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_origins: Vec<String>,
    pub expose_headers: Vec<String>,
}

impl Default for CorsRules {
    fn default() -> Self {
        Self {
            allowed_headers: vec!["*".to_string()],
            allowed_methods: ["GET", "PUT", "POST", "HEAD"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            allowed_origins: vec!["*".to_string()],
            expose_headers: vec!["ETag".to_string()],
        }
    }
}

pub fn render_site(template: &str, input_bucket: &str) -> String {
    template.replace(PLACEHOLDER, input_bucket)
}

pub fn public_read_policy(bucket: &str) -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Sid": "PublicReadGetObject",
            "Effect": "Allow",
            "Principal": "*",
            "Action": "s3:GetObject",
            "Resource": object_arn_pattern(bucket),
        }]
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[test]
    fn substitution_is_exact() {
        let rendered = render_site(
            "<a>__NOMBRE_BUCKET_PLACEHOLDER__</a>",
            "proyecto-entrada-ab12cd34",
        );
        assert_eq!(rendered, "<a>proyecto-entrada-ab12cd34</a>");
    }

    #[test]
    fn every_placeholder_is_replaced_and_nothing_else_changes() {
        let template = "const b = '__NOMBRE_BUCKET_PLACEHOLDER__';\n{{ x }} __NOMBRE_BUCKET_PLACEHOLDER__";
        assert_eq!(
            render_site(template, "in-1"),
            "const b = 'in-1';\n{{ x }} in-1"
        );
    }

    #[test]
    fn template_without_placeholder_is_unchanged() {
        assert_eq!(render_site("<p>hola</p>", "in-1"), "<p>hola</p>");
    }

    #[test]
    fn policy_grants_anonymous_get_on_bucket_objects() {
        let policy: Value =
            serde_json::from_str(&public_read_policy("proyecto-web-ab12cd34")).expect("valid json");
        let statement = &policy["Statement"][0];

        assert_eq!(statement["Principal"], "*");
        assert_eq!(statement["Action"], "s3:GetObject");
        assert_eq!(
            statement["Resource"],
            "arn:aws:s3:::proyecto-web-ab12cd34/*"
        );
    }
}
