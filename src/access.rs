//! Role-gated routes.
//!
//! Decides, for a session role and a requested path, whether the page
//! renders or the caller is redirected.

use crate::model::Role;

pub const LOGIN_PATH: &str = "/login";

/// A page of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    AdminDashboard,
    DealerDashboard,
    InstallerDashboard,
    Notifications,
    QuotationManagement,
    Products,
    ProductDetails(u32),
    Orders,
    Reward,
    Referral,
}

impl Route {
    /// Parse a request path. Matching ignores case and a trailing slash.
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.trim_end_matches('/').to_ascii_lowercase();
        if let Some(id) = path.strip_prefix("/product-details/") {
            return id.parse().ok().map(Route::ProductDetails);
        }
        Some(match path.as_str() {
            "/login" => Route::Login,
            "/signup" => Route::Signup,
            "/admin-dashboard" => Route::AdminDashboard,
            "/dealer-dashboard" => Route::DealerDashboard,
            "/installer-dashboard" => Route::InstallerDashboard,
            "/notifications" => Route::Notifications,
            "/quotation-management" => Route::QuotationManagement,
            "/products" => Route::Products,
            "/orders" => Route::Orders,
            "/reward" => Route::Reward,
            "/referral" => Route::Referral,
            _ => return None,
        })
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => LOGIN_PATH.to_string(),
            Route::Signup => "/signup".to_string(),
            Route::AdminDashboard => "/admin-dashboard".to_string(),
            Route::DealerDashboard => "/dealer-dashboard".to_string(),
            Route::InstallerDashboard => "/installer-dashboard".to_string(),
            Route::Notifications => "/notifications".to_string(),
            Route::QuotationManagement => "/Quotation-management".to_string(),
            Route::Products => "/Products".to_string(),
            Route::ProductDetails(id) => format!("/product-details/{}", id),
            Route::Orders => "/Orders".to_string(),
            Route::Reward => "/reward".to_string(),
            Route::Referral => "/referral".to_string(),
        }
    }

    /// Whether a signed-in user with `role` may open this page.
    pub fn allows(&self, role: Role) -> bool {
        match self {
            Route::Login | Route::Signup => false,
            Route::Notifications => true,
            Route::AdminDashboard | Route::QuotationManagement => role == Role::Admin,
            Route::DealerDashboard
            | Route::Products
            | Route::ProductDetails(_)
            | Route::Orders
            | Route::Reward
            | Route::Referral => role == Role::Dealer,
            Route::InstallerDashboard => role == Role::Installer,
        }
    }
}

/// Landing page for a role.
pub fn dashboard_for(role: Role) -> Route {
    match role {
        Role::Admin => Route::AdminDashboard,
        Role::Dealer => Route::DealerDashboard,
        Role::Installer => Route::InstallerDashboard,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Render(Route),
    Redirect(String),
}

/// Resolve a request for `path` by a session with `role` (None = signed out).
pub fn resolve(role: Option<Role>, path: &str) -> Resolution {
    let route = Route::parse(path);
    match (role, route) {
        (None, Some(r @ (Route::Login | Route::Signup))) => Resolution::Render(r),
        (None, _) => Resolution::Redirect(LOGIN_PATH.to_string()),
        (Some(role), Some(r)) if r.allows(role) => Resolution::Render(r),
        (Some(role), _) => Resolution::Redirect(dashboard_for(role).path()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_out_goes_to_login() {
        assert_eq!(resolve(None, "/login"), Resolution::Render(Route::Login));
        assert_eq!(resolve(None, "/signup"), Resolution::Render(Route::Signup));
        assert_eq!(
            resolve(None, "/dealer-dashboard"),
            Resolution::Redirect("/login".to_string())
        );
        assert_eq!(resolve(None, "/nowhere"), Resolution::Redirect("/login".to_string()));
    }

    #[test]
    fn test_signed_in_leaves_login_and_signup() {
        assert_eq!(
            resolve(Some(Role::Admin), "/login"),
            Resolution::Redirect("/admin-dashboard".to_string())
        );
        assert_eq!(
            resolve(Some(Role::Installer), "/signup"),
            Resolution::Redirect("/installer-dashboard".to_string())
        );
    }

    #[test]
    fn test_role_gates() {
        assert_eq!(
            resolve(Some(Role::Admin), "/Quotation-management"),
            Resolution::Render(Route::QuotationManagement)
        );
        assert_eq!(
            resolve(Some(Role::Dealer), "/Quotation-management"),
            Resolution::Redirect("/dealer-dashboard".to_string())
        );
        assert_eq!(
            resolve(Some(Role::Dealer), "/product-details/7"),
            Resolution::Render(Route::ProductDetails(7))
        );
        assert_eq!(
            resolve(Some(Role::Installer), "/reward"),
            Resolution::Redirect("/installer-dashboard".to_string())
        );
        for role in [Role::Admin, Role::Dealer, Role::Installer] {
            assert_eq!(
                resolve(Some(role), "/notifications"),
                Resolution::Render(Route::Notifications)
            );
        }
    }

    #[test]
    fn test_unknown_path_goes_to_dashboard() {
        assert_eq!(
            resolve(Some(Role::Dealer), "/"),
            Resolution::Redirect("/dealer-dashboard".to_string())
        );
        assert_eq!(
            resolve(Some(Role::Dealer), "/product-details/abc"),
            Resolution::Redirect("/dealer-dashboard".to_string())
        );
    }

    #[test]
    fn test_path_round_trips_through_parse() {
        let route = Route::ProductDetails(12);
        assert_eq!(Route::parse(&route.path()), Some(route));
        assert_eq!(Route::parse("/products/"), Some(Route::Products));
    }
}
