//! Site routes.

use std::fmt;

/// A page of the site. Unknown paths resolve to the landing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Landing,
    /// `/verify`
    Verify,
    /// `/admin`
    Admin,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Verify => "/verify",
            Route::Admin => "/admin",
        }
    }

    /// Resolve a path, sending anything unknown to `/`.
    pub fn resolve(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        match path.trim_end_matches('/') {
            "/verify" => Route::Verify,
            "/admin" => Route::Admin,
            _ => Route::Landing,
        }
    }

    /// Whether the route needs a session token.
    pub fn requires_session(&self) -> bool {
        matches!(self, Route::Admin)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
