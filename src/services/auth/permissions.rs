//! Permission strings and the route -> permission table.

use axum::http::Method;

use super::access_jwt::Claims;
use super::error::AuthError;

pub const GET_ACTORS: &str = "get:actors";
pub const POST_ACTORS: &str = "post:actors";
pub const PATCH_ACTORS: &str = "patch:actors";
pub const DELETE_ACTORS: &str = "delete:actors";

pub const GET_MOVIES: &str = "get:movies";
pub const POST_MOVIES: &str = "post:movies";
pub const PATCH_MOVIES: &str = "patch:movies";
pub const DELETE_MOVIES: &str = "delete:movies";

/// Exact, case-sensitive membership check. No wildcards.
pub fn enforce(claims: &Claims, required: &str) -> Result<(), AuthError> {
    if claims.has_permission(required) {
        Ok(())
    } else {
        Err(AuthError::InsufficientPermission(required.to_string()))
    }
}

#[derive(Debug, Clone)]
struct RoutePermission {
    method: Method,
    path: &'static str,
    permission: &'static str,
}

/// Required permission per protected route, keyed by method and route template
/// (the path as registered on the router, e.g. `/actors/{actor_id}`).
#[derive(Debug, Clone, Default)]
pub struct RoutePermissions {
    entries: Vec<RoutePermission>,
}

impl RoutePermissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the permission for a route. Each route takes exactly one.
    pub fn require(mut self, method: Method, path: &'static str, permission: &'static str) -> Self {
        assert!(
            self.lookup(&method, path).is_none(),
            "permission for {method} {path} registered twice"
        );
        self.entries.push(RoutePermission {
            method,
            path,
            permission,
        });
        self
    }

    pub fn lookup(&self, method: &Method, path: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|e| e.method == *method && e.path == path)
            .map(|e| e.permission)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Method, &'static str, &'static str)> {
        self.entries.iter().map(|e| (&e.method, e.path, e.permission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(permissions: &[&str]) -> Claims {
        Claims {
            sub: Some("auth0|assistant".into()),
            iss: "https://issuer/".into(),
            aud: vec!["casting-agency".into()],
            exp: u64::MAX,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn enforce_requires_exact_match() {
        let c = claims(&[GET_ACTORS, GET_MOVIES]);

        assert!(enforce(&c, GET_ACTORS).is_ok());
        assert_eq!(
            enforce(&c, POST_ACTORS),
            Err(AuthError::InsufficientPermission(POST_ACTORS.into()))
        );
        assert!(enforce(&c, "GET:ACTORS").is_err());
        assert!(enforce(&c, "get:actor").is_err());
        assert!(enforce(&claims(&["get:*"]), GET_ACTORS).is_err());
    }

    #[test]
    fn lookup_by_method_and_template() {
        let table = RoutePermissions::new()
            .require(Method::GET, "/actors", GET_ACTORS)
            .require(Method::POST, "/actors", POST_ACTORS);

        assert_eq!(table.lookup(&Method::GET, "/actors"), Some(GET_ACTORS));
        assert_eq!(table.lookup(&Method::POST, "/actors"), Some(POST_ACTORS));
        assert_eq!(table.lookup(&Method::DELETE, "/actors"), None);
        assert_eq!(table.lookup(&Method::GET, "/movies"), None);
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_registration_panics() {
        let _ = RoutePermissions::new()
            .require(Method::GET, "/actors", GET_ACTORS)
            .require(Method::GET, "/actors", POST_ACTORS);
    }
}
