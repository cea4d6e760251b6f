use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::admin::AdminUser;
use crate::models::code::{CodeStats, PromotionalCode};

/// `{success, message?, ...payload}` envelope shared by every JSON endpoint.
///
/// The payload's fields are flattened into the top level, so a handler picks
/// the shape by choosing `T`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub body: T,
}

impl<T> ApiResponse<T> {
    pub const fn success(body: T) -> Self {
        Self {
            success: true,
            message: None,
            body,
        }
    }

    pub fn failure(message: impl Into<String>, body: T) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            body,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<Empty> {
    pub fn message(message: impl Into<String>) -> Self {
        Self::success(Empty {}).with_message(message)
    }
}

#[derive(Debug, Serialize)]
pub struct Empty {}

#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

/// Identity stored in the session and echoed back to the console.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionUser {
    pub id: i32,
    pub username: String,
}

impl From<AdminUser> for SessionUser {
    fn from(user: AdminUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginBody {
    pub user: SessionUser,
}

#[derive(Debug, Serialize)]
pub struct AuthStatusBody {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateCodeRequest {
    #[serde(default)]
    pub code: String,
}

/// Raw `/api/codes` query. Numbers are parsed leniently: anything that is
/// not a positive integer falls back to the default.
#[derive(Debug, Default, Deserialize)]
pub struct ListCodesQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeListDto {
    pub codes: Vec<PromotionalCode>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct CodeStatsDto {
    pub total: u64,
    pub used: u64,
    pub unused: u64,
    pub usage_rate: u64,
}

impl From<CodeStats> for CodeStatsDto {
    fn from(stats: CodeStats) -> Self {
        Self {
            total: stats.total,
            used: stats.used,
            unused: stats.unused,
            usage_rate: stats.usage_rate(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeBody {
    pub qr_code: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub timestamp: DateTime<Utc>,
    pub database: bool,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_flattens_payload() {
        let body = ApiResponse::success(Data { data: 7 }).with_message("ok");
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"success": true, "message": "ok", "data": 7})
        );

        let body = ApiResponse::success(AuthStatusBody {
            authenticated: false,
            user: None,
        });
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"success": true, "authenticated": false})
        );

        let body = ApiResponse::failure("nope", Empty {});
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"success": false, "message": "nope"})
        );
    }

    #[test]
    fn test_camel_case_payloads() {
        let body = ApiResponse::success(QrCodeBody {
            qr_code: "data:image/png;base64,AA==".to_string(),
            code: "K3F9QZ1B".to_string(),
        });
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["qrCode"], "data:image/png;base64,AA==");

        let request: ChangePasswordRequest = serde_json::from_value(json!({
            "oldPassword": "a",
            "newPassword": "b",
            "confirmPassword": "c"
        }))
        .unwrap();
        assert_eq!(request.old_password, "a");
        assert_eq!(request.confirm_password, "c");
    }
}
