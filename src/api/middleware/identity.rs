use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::str::FromStr;
use uuid::Uuid;

use crate::{
    domain::{Role, Visibility},
    error::{AppError, Result},
};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The caller as asserted by the upstream identity provider.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: Option<Uuid>,
    pub role: Role,
}

impl CurrentUser {
    pub fn anonymous() -> Self {
        Self { user_id: None, role: Role::Public }
    }

    pub fn require_user(&self) -> Result<Uuid> {
        self.user_id.ok_or(AppError::Unauthorized)
    }

    pub fn require_staff(&self) -> Result<()> {
        if self.role.is_staff() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Admins see every event; everyone else only what their role is shown.
    pub fn can_see(&self, visibility: &Visibility) -> bool {
        self.role == Role::Admin || visibility.visible_to(self.role)
    }

    /// Resolve the user an action is for. Staff may act on anyone's behalf;
    /// everyone else only on their own.
    pub fn acting_for(&self, target: Option<Uuid>) -> Result<Uuid> {
        let me = self.user_id;
        match (target, me) {
            (Some(target), _) if self.role.is_staff() => Ok(target),
            (Some(target), Some(me)) if target == me => Ok(me),
            (Some(_), Some(_)) => Err(AppError::Forbidden),
            (_, Some(me)) => Ok(me),
            (_, None) => Err(AppError::Unauthorized),
        }
    }
}

/// Reads `X-User-Id` and `X-User-Role` into a [`CurrentUser`] extension.
/// Requests without headers pass through as the public role.
pub async fn identify(mut request: Request, next: Next) -> Result<Response> {
    let user = from_headers(request.headers())?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn from_headers(headers: &HeaderMap) -> Result<CurrentUser> {
    let user_id = match header_str(headers, USER_ID_HEADER)? {
        Some(raw) => Some(
            Uuid::parse_str(raw)
                .map_err(|_| AppError::BadRequest(format!("Invalid {} header", USER_ID_HEADER)))?,
        ),
        None => None,
    };

    let mut user = CurrentUser::anonymous();
    user.user_id = user_id;
    if let Some(raw) = header_str(headers, USER_ROLE_HEADER)? {
        user.role = Role::from_str(raw)?;
    }

    Ok(user)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>> {
    match headers.get(name) {
        Some(value) => value
            .to_str()
            .map(|s| Some(s.trim()))
            .map_err(|_| AppError::BadRequest(format!("Invalid {} header", name))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_headers_mean_public() {
        let user = from_headers(&HeaderMap::new()).unwrap();
        assert_eq!(user.role, Role::Public);
        assert!(user.user_id.is_none());
    }

    #[test]
    fn parses_id_and_role() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        headers.insert(USER_ROLE_HEADER, HeaderValue::from_static("Leader"));

        let user = from_headers(&headers).unwrap();
        assert_eq!(user.user_id, Some(id));
        assert_eq!(user.role, Role::Leader);
    }

    #[test]
    fn rejects_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert!(matches!(from_headers(&headers), Err(AppError::BadRequest(_))));

        let mut headers = HeaderMap::new();
        headers.insert(USER_ROLE_HEADER, HeaderValue::from_static("scoutmaster"));
        assert!(matches!(from_headers(&headers), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn acting_for_others_requires_staff() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();

        let member = CurrentUser { user_id: Some(me), role: Role::Public };
        assert_eq!(member.acting_for(None).unwrap(), me);
        assert_eq!(member.acting_for(Some(me)).unwrap(), me);
        assert!(matches!(member.acting_for(Some(other)), Err(AppError::Forbidden)));

        let leader = CurrentUser { user_id: Some(me), role: Role::Leader };
        assert_eq!(leader.acting_for(Some(other)).unwrap(), other);

        assert!(matches!(CurrentUser::anonymous().acting_for(None), Err(AppError::Unauthorized)));
    }
}
