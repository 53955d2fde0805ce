//! Auth middleware.
//!
//! [`handler`] requires a bearer token. [`optional`] accepts anonymous
//! requests (guest carts, catalog reads) but still rejects a bad token.

use std::sync::Arc;

use bookstore_app::auth::{AuthServiceError, Principal};
use salvo::{http::header::AUTHORIZATION, prelude::*};
use tracing::Span;

use crate::{errors::ApiError, extensions::*, state::State};

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let Some(token) = extract_bearer_token(req) else {
        res.render(ApiError::unauthorized("Missing or invalid Authorization header"));
        ctrl.skip_rest();

        return;
    };

    match authenticate(depot, token).await {
        Ok(principal) => {
            depot.insert_principal(principal);
            ctrl.call_next(req, depot, res).await;
        }
        Err(error) => {
            res.render(error);
            ctrl.skip_rest();
        }
    }
}

#[salvo::handler]
pub(crate) async fn optional(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    if req.headers().contains_key(AUTHORIZATION) {
        let Some(token) = extract_bearer_token(req) else {
            res.render(ApiError::unauthorized("Missing or invalid Authorization header"));
            ctrl.skip_rest();

            return;
        };

        match authenticate(depot, token).await {
            Ok(principal) => depot.insert_principal(principal),
            Err(error) => {
                res.render(error);
                ctrl.skip_rest();

                return;
            }
        }
    }

    ctrl.call_next(req, depot, res).await;
}

async fn authenticate(depot: &Depot, token: &str) -> Result<Principal, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let principal = state
        .auth
        .authenticate_bearer(token)
        .await
        .map_err(|error| match error {
            AuthServiceError::NotFound | AuthServiceError::UnknownUser => {
                ApiError::unauthorized("Invalid API token")
            }
            AuthServiceError::Sql(source) => {
                ApiError::internal("failed to validate api token", &source)
            }
            AuthServiceError::Token(source) => {
                ApiError::internal("failed to process api token", &source)
            }
        })?;

    Span::current().record("user_uuid", tracing::field::display(principal.user));

    Ok(principal)
}

fn extract_bearer_token(req: &Request) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.splitn(2, ' ');

    let scheme = parts.next()?;
    let token = parts.next()?.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }

    Some(token)
}

#[cfg(test)]
mod tests {
    use bookstore_app::{
        auth::MockAuthService,
        domain::users::records::{Role, UserUuid},
    };
    use salvo::{
        affix_state::inject,
        test::{ResponseExt, TestClient},
    };
    use testresult::TestResult;
    use uuid::Uuid;

    use crate::test_helpers::state_with_auth;

    use super::*;

    #[salvo::handler]
    async fn echo_user(depot: &mut Depot, res: &mut Response) {
        let user = depot
            .principal()
            .map_or_else(|| "anonymous".to_string(), |p| p.user.to_string());

        res.render(user);
    }

    fn make_service(auth: MockAuthService, middleware: impl Handler) -> Service {
        let router = Router::new()
            .hoop(inject(state_with_auth(auth)))
            .hoop(middleware)
            .push(Router::new().get(echo_user));

        Service::new(router)
    }

    fn seller() -> Principal {
        Principal {
            user: UserUuid::from_uuid(Uuid::nil()),
            role: Role::Seller,
        }
    }

    #[tokio::test]
    async fn test_missing_authorization_header_returns_401() -> TestResult {
        let mut auth = MockAuthService::new();

        auth.expect_authenticate_bearer().never();

        let res = TestClient::get("http://example.com")
            .send(&make_service(auth, handler))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_non_bearer_authorization_header_returns_401() -> TestResult {
        let mut auth = MockAuthService::new();

        auth.expect_authenticate_bearer().never();

        let res = TestClient::get("http://example.com")
            .add_header(AUTHORIZATION, "Basic abc123", true)
            .send(&make_service(auth, handler))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_token_returns_401() -> TestResult {
        let mut auth = MockAuthService::new();

        auth.expect_authenticate_bearer()
            .once()
            .withf(|token| token == "abc123")
            .return_once(|_| Err(AuthServiceError::NotFound));

        let res = TestClient::get("http://example.com")
            .add_header(AUTHORIZATION, "Bearer abc123", true)
            .send(&make_service(auth, handler))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_valid_token_injects_principal() -> TestResult {
        let mut auth = MockAuthService::new();

        auth.expect_authenticate_bearer()
            .once()
            .withf(|token| token == "abc123")
            .return_once(|_| Ok(seller()));

        let mut res = TestClient::get("http://example.com")
            .add_header(AUTHORIZATION, "Bearer abc123", true)
            .send(&make_service(auth, handler))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(res.take_string().await?, Uuid::nil().to_string());

        Ok(())
    }

    #[tokio::test]
    async fn test_optional_auth_allows_anonymous_requests() -> TestResult {
        let mut auth = MockAuthService::new();

        auth.expect_authenticate_bearer().never();

        let mut res = TestClient::get("http://example.com")
            .send(&make_service(auth, optional))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(res.take_string().await?, "anonymous");

        Ok(())
    }

    #[tokio::test]
    async fn test_optional_auth_still_rejects_bad_tokens() -> TestResult {
        let mut auth = MockAuthService::new();

        auth.expect_authenticate_bearer()
            .once()
            .return_once(|_| Err(AuthServiceError::NotFound));

        let res = TestClient::get("http://example.com")
            .add_header(AUTHORIZATION, "Bearer revoked", true)
            .send(&make_service(auth, optional))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_optional_auth_injects_principal_when_present() -> TestResult {
        let mut auth = MockAuthService::new();

        auth.expect_authenticate_bearer()
            .once()
            .return_once(|_| Ok(seller()));

        let mut res = TestClient::get("http://example.com")
            .add_header(AUTHORIZATION, "Bearer abc123", true)
            .send(&make_service(auth, optional))
            .await;

        assert_eq!(res.take_string().await?, Uuid::nil().to_string());

        Ok(())
    }
}
