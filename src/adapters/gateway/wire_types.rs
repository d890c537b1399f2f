//! JSON bodies exchanged with the payment microservice.

use serde::{Deserialize, Serialize};

use crate::ports::{CancelAck, CheckoutRequest, CheckoutSession, GatewayError};

/// `POST /checkout` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutBody<'a> {
    pub user_id: &'a str,
    pub user_email: &'a str,
    pub plan: &'a str,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
    pub metadata: CheckoutMetadata<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutMetadata<'a> {
    pub user_id: &'a str,
    pub plan: &'a str,
}

impl<'a> From<&'a CheckoutRequest> for CheckoutBody<'a> {
    fn from(request: &'a CheckoutRequest) -> Self {
        Self {
            user_id: request.user_id.as_str(),
            user_email: &request.email,
            plan: request.plan.as_str(),
            success_url: &request.success_url,
            cancel_url: &request.cancel_url,
            metadata: CheckoutMetadata {
                user_id: request.user_id.as_str(),
                plan: request.plan.as_str(),
            },
        }
    }
}

/// `POST /checkout` response. Older gateway builds use the alternate field names.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub subscription_id: Option<String>,
    pub session_id: Option<String>,
    pub redirect_url: Option<String>,
    pub short_url: Option<String>,
}

impl TryFrom<CheckoutResponse> for CheckoutSession {
    type Error = GatewayError;

    fn try_from(body: CheckoutResponse) -> Result<Self, Self::Error> {
        let session_id = non_empty(body.subscription_id)
            .or_else(|| non_empty(body.session_id))
            .ok_or_else(|| GatewayError::invalid_response("checkout response has no session id"))?;
        let redirect_url = non_empty(body.redirect_url)
            .or_else(|| non_empty(body.short_url))
            .ok_or_else(|| {
                GatewayError::invalid_response("checkout response has no redirect url")
            })?;

        Ok(CheckoutSession {
            session_id,
            redirect_url,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// `POST /cancel` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBody<'a> {
    pub user_id: &'a str,
    pub provider_ref: &'a str,
}

/// `POST /cancel` response. Any 2xx counts as acknowledgement.
#[derive(Debug, Default, Deserialize)]
pub struct CancelResponse {
    pub status: Option<String>,
}

impl From<CancelResponse> for CancelAck {
    fn from(body: CancelResponse) -> Self {
        CancelAck {
            status: body.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use crate::domain::subscription::SubscriptionPlan;
    use serde_json::json;

    #[test]
    fn checkout_body_matches_gateway_contract() {
        let request = CheckoutRequest {
            user_id: UserId::new("u3").unwrap(),
            email: "u3@example.com".into(),
            plan: SubscriptionPlan::Premium,
            success_url: "https://ok".into(),
            cancel_url: "https://cancel".into(),
        };

        let body = serde_json::to_value(CheckoutBody::from(&request)).unwrap();

        assert_eq!(
            body,
            json!({
                "userId": "u3",
                "userEmail": "u3@example.com",
                "plan": "premium",
                "successUrl": "https://ok",
                "cancelUrl": "https://cancel",
                "metadata": {"userId": "u3", "plan": "premium"}
            })
        );
    }

    #[test]
    fn checkout_response_accepts_either_spelling() {
        let a: CheckoutResponse =
            serde_json::from_value(json!({"subscriptionId": "s1", "redirectUrl": "https://a"}))
                .unwrap();
        let b: CheckoutResponse =
            serde_json::from_value(json!({"sessionId": "s2", "shortUrl": "https://b"})).unwrap();

        assert_eq!(CheckoutSession::try_from(a).unwrap().session_id, "s1");
        assert_eq!(CheckoutSession::try_from(b).unwrap().redirect_url, "https://b");
    }

    #[test]
    fn empty_primary_field_falls_back_to_alternate() {
        let body: CheckoutResponse = serde_json::from_value(json!({
            "subscriptionId": "",
            "sessionId": "cs_7",
            "redirectUrl": "",
            "shortUrl": "https://pay/7"
        }))
        .unwrap();

        let session = CheckoutSession::try_from(body).unwrap();

        assert_eq!(session.session_id, "cs_7");
        assert_eq!(session.redirect_url, "https://pay/7");
    }

    #[test]
    fn checkout_response_without_url_is_invalid() {
        let body: CheckoutResponse = serde_json::from_value(json!({"sessionId": "s1"})).unwrap();
        let err = CheckoutSession::try_from(body).unwrap_err();
        assert_eq!(err.kind, crate::ports::GatewayErrorKind::InvalidResponse);
    }

    #[test]
    fn cancel_body_matches_gateway_contract() {
        let body = serde_json::to_value(CancelBody {
            user_id: "u1",
            provider_ref: "r1",
        })
        .unwrap();
        assert_eq!(body, json!({"userId": "u1", "providerRef": "r1"}));
    }
}
