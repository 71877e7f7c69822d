use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use super::claims::{AdminClaims, StaffContext};

/// Guards the admin API with an HS256 bearer token carrying the admin role.
///
/// With `security.jwt_required = false`, requests without a token pass
/// through; a token that is present is still verified.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Get Authorization header
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|v| v.strip_prefix("Bearer ")) {
        Some(token) => token.to_string(),
        None => {
            if !state.config.security.jwt_required {
                return Ok(next.run(request).await);
            }
            tracing::debug!(path = %request.uri().path(), "Admin request without bearer token");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    // 2. Decode & Validate Token
    let key = DecodingKey::from_secret(state.config.security.jwt_secret.as_bytes());
    let claims = match decode::<AdminClaims>(&token, &key, &Validation::default()) {
        Ok(token_data) => token_data.claims,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected admin bearer token");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    if !claims.has_role(&state.config.security.admin_role) {
        tracing::warn!(user = %claims.sub, "Admin request without admin role");
        return Err(StatusCode::FORBIDDEN);
    }

    // 3. Inject Context
    request.extensions_mut().insert(StaffContext {
        user_id: claims.sub.clone(),
        claims,
    });
    Ok(next.run(request).await)
}
