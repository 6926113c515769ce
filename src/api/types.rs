use serde::Serialize;

/// Envelope for every JSON response.
///
/// Success bodies flatten their payload next to `success`, so a login reply
/// reads `{"success":true,"token":...,"user":...}`. Errors carry `message`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserBody {
    pub user: crate::db::User,
}

#[derive(Debug, Serialize)]
pub struct LoginBody {
    pub token: String,
    pub user: crate::db::User,
}

#[derive(Debug, Serialize)]
pub struct StatsBody {
    pub stats: crate::services::TransactionStats,
}

#[derive(Debug, Serialize)]
pub struct TransactionBody {
    pub transaction: crate::services::TransactionDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthBody {
    pub status: &'static str,
    pub database: &'static str,
    pub uptime_seconds: u64,
    pub version: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Payload {
        token: &'static str,
    }

    #[test]
    fn test_success_flattens_payload() {
        let body = serde_json::to_value(ApiResponse::success(Payload { token: "abc" })).unwrap();
        assert_eq!(body, json!({ "success": true, "token": "abc" }));
    }

    #[test]
    fn test_error_has_message_only() {
        let body = serde_json::to_value(ApiResponse::<()>::error("Lỗi")).unwrap();
        assert_eq!(body, json!({ "success": false, "message": "Lỗi" }));
    }
}
