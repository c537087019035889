use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::Duration;

use crate::{
    auth::{JwtClaims, TokenIssuer, TokenVerifier},
    config::AuthConfig,
    errors::json_payload_config,
};

// A test secret for issuing tokens. DO NOT re-use this anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new("endpoint-test-secret-b4db54f75421a02b0d0056fb7203df23")
}

pub fn issue_token(claims: JwtClaims) -> String {
    let issuer = TokenIssuer::new(&get_auth_config());
    issuer.issue_token(claims, Some(Duration::hours(1))).expect("Failed to sign token")
}

pub async fn send_request(
    req: TestRequest,
    token: &str,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    let mut req = req;
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    let req = req.to_request();
    let verifier = TokenVerifier::new(&get_auth_config());
    let app = App::new()
        .app_data(json_payload_config())
        .app_data(web::Data::new(verifier))
        .configure(configure);
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req).await;
    let (_, res) = res.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}
