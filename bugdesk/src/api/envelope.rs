use serde::Serialize;

/// The JSON wrapper every endpoint responds with.
///
/// Absent parts are omitted from the body rather than serialized as `null`.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            count: None,
            data: Some(data),
            errors: None,
            error: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

impl<T: Serialize> Envelope<Vec<T>> {
    /// A list result, carrying its length as `count`.
    pub fn list(items: Vec<T>) -> Self {
        let count = items.len();

        Self {
            count: Some(count),
            ..Self::data(items)
        }
    }
}

impl Envelope<()> {
    /// A success that carries only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            count: None,
            data: None,
            errors: None,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::message(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_includes_count() {
        let body = serde_json::to_value(Envelope::list(vec!["a", "b"])).unwrap();

        assert_eq!(body, json!({ "success": true, "count": 2, "data": ["a", "b"] }));
    }

    #[test]
    fn failure_omits_absent_parts() {
        let body = serde_json::to_value(Envelope::failure("Bug not found")).unwrap();

        assert_eq!(body, json!({ "success": false, "message": "Bug not found" }));
    }

    #[test]
    fn validation_failure_lists_errors() {
        let body = serde_json::to_value(
            Envelope::failure("Validation Error").with_errors(vec!["Email is required".into()]),
        )
        .unwrap();

        assert_eq!(
            body,
            json!({ "success": false, "message": "Validation Error", "errors": ["Email is required"] })
        );
    }
}
