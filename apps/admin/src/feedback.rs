use client_core::ApiRequestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureContext {
    LoadItems,
    AdjustStock,
    LoadOrders,
    UpdateStatus,
    LoadAnalytics,
    LoadTopCategories,
}

impl FailureContext {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::LoadItems => "Failed to load items",
            Self::AdjustStock => "Update failed",
            Self::LoadOrders => "Failed to load orders",
            Self::UpdateStatus => "Status update failed",
            Self::LoadAnalytics => "Failed to load analytics",
            Self::LoadTopCategories => "Failed to load top categories",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    Unreachable,
    Timeout,
    NotFound,
    Server,
    MalformedPayload,
    Rejected,
    Validation,
    Config,
}

pub fn classify(err: &ApiRequestError) -> FailureCategory {
    match err {
        ApiRequestError::Transport(source) if source.is_timeout() => FailureCategory::Timeout,
        ApiRequestError::Transport(_) => FailureCategory::Unreachable,
        ApiRequestError::Status { status: 404, .. } => FailureCategory::NotFound,
        ApiRequestError::Status { status, .. } if *status >= 500 => FailureCategory::Server,
        ApiRequestError::Status { .. } => FailureCategory::Rejected,
        ApiRequestError::MalformedPayload(_) => FailureCategory::MalformedPayload,
        ApiRequestError::Validation(_) => FailureCategory::Validation,
        ApiRequestError::InvalidBaseUrl { .. } | ApiRequestError::UnsupportedScheme(_) => {
            FailureCategory::Config
        }
    }
}

fn hint(category: FailureCategory) -> Option<&'static str> {
    match category {
        FailureCategory::Unreachable => Some("API unreachable; check api_base and network, then retry."),
        FailureCategory::Timeout => {
            Some("API did not answer in time; retry or raise request_timeout_secs.")
        }
        FailureCategory::NotFound => Some("Record no longer exists; reload the list and retry."),
        FailureCategory::Server => Some("API server error; retry shortly."),
        FailureCategory::MalformedPayload => {
            Some("API answered with unreadable JSON; check that api_base points at the shop API.")
        }
        FailureCategory::Config => {
            Some("Check api_base in scoop-admin.toml, SCOOP_API_BASE or --api-base.")
        }
        FailureCategory::Rejected | FailureCategory::Validation => None,
    }
}

/// Operator-facing message: the action prefix, the error, and a hint when the
/// failure category has one.
pub fn describe(context: FailureContext, err: &ApiRequestError) -> String {
    let message = format!("{}: {err}", context.prefix());
    match hint(classify(err)) {
        Some(hint) => format!("{message}\n  hint: {hint}"),
        None => message,
    }
}

pub fn report(context: FailureContext, err: &ApiRequestError) -> anyhow::Error {
    anyhow::anyhow!(describe(context, err))
}

#[cfg(test)]
mod tests {
    use client_core::ApiConfig;
    use shared::error::DomainError;

    use super::*;

    fn status(status: u16, body: &str) -> ApiRequestError {
        ApiRequestError::Status {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn prefixes_match_dashboard_alerts() {
        assert_eq!(
            describe(FailureContext::AdjustStock, &status(409, "stock locked")),
            "Update failed: HTTP 409: stock locked"
        );
        assert_eq!(
            describe(
                FailureContext::UpdateStatus,
                &ApiRequestError::Validation(DomainError::UnknownOrder("ord_9".into()))
            ),
            "Status update failed: order ord_9 is not loaded"
        );
    }

    #[test]
    fn missing_record_gets_reload_hint() {
        let message = describe(FailureContext::AdjustStock, &status(404, "item not found"));
        assert_eq!(
            message,
            "Update failed: HTTP 404: item not found\n  hint: Record no longer exists; reload the list and retry."
        );
    }

    #[test]
    fn classifies_status_ranges() {
        assert_eq!(classify(&status(503, "")), FailureCategory::Server);
        assert_eq!(classify(&status(422, "bad")), FailureCategory::Rejected);
        assert_eq!(classify(&status(404, "")), FailureCategory::NotFound);
    }

    #[test]
    fn unreadable_json_is_not_reported_as_unreachable() {
        let decode = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = ApiRequestError::from(decode);
        assert_eq!(classify(&err), FailureCategory::MalformedPayload);

        let message = describe(FailureContext::LoadOrders, &err);
        assert!(message.starts_with("Failed to load orders: malformed JSON response:"));
        assert!(message.ends_with(
            "hint: API answered with unreadable JSON; check that api_base points at the shop API."
        ));
        assert!(!message.contains("unreachable"));
    }

    #[test]
    fn bad_base_url_points_at_settings() {
        let err = ApiConfig::new("ftp://example.com").unwrap_err();
        assert_eq!(classify(&err), FailureCategory::Config);
        assert!(describe(FailureContext::LoadOrders, &err).contains("hint: Check api_base"));
    }
}
