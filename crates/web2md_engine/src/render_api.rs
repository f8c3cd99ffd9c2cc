use serde::Deserialize;

/// Response envelope shared by the browser-rendering endpoints (`content`, `markdown`).
#[derive(Debug, Deserialize)]
pub(crate) struct RenderEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    errors: Vec<RenderMessage>,
}

#[derive(Debug, Deserialize)]
struct RenderMessage {
    #[serde(default)]
    code: Option<i64>,
    message: String,
}

impl RenderEnvelope {
    pub(crate) fn parse(body: &str) -> Result<Self, String> {
        serde_json::from_str(body).map_err(|err| format!("malformed response: {err}"))
    }

    /// The `result` payload, or the remote error messages joined into one line.
    pub(crate) fn into_result(self) -> Result<String, String> {
        if !self.success {
            return Err(self.error_summary());
        }
        self.result
            .ok_or_else(|| "response has no result".to_string())
    }

    pub(crate) fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return "unknown error".to_string();
        }
        self.errors
            .iter()
            .map(|err| match err.code {
                Some(code) => format!("{} (code {code})", err.message),
                None => err.message.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::RenderEnvelope;

    #[test]
    fn successful_envelope_yields_result() {
        let envelope = RenderEnvelope::parse(r#"{"success":true,"result":"<p>hi</p>"}"#).unwrap();
        assert_eq!(envelope.into_result().unwrap(), "<p>hi</p>");
    }

    #[test]
    fn failed_envelope_joins_messages() {
        let envelope = RenderEnvelope::parse(
            r#"{"success":false,"errors":[{"code":1001,"message":"bad token"},{"message":"again"}]}"#,
        )
        .unwrap();
        assert_eq!(
            envelope.into_result().unwrap_err(),
            "bad token (code 1001); again"
        );
    }

    #[test]
    fn non_json_body_is_reported() {
        assert!(RenderEnvelope::parse("<html>gateway</html>")
            .unwrap_err()
            .starts_with("malformed response"));
    }
}
