//! Route authorization.
//!
//! Every navigation goes through [`authorize`], which either renders the
//! requested page or redirects. Roles are compared exactly; there is no
//! hierarchy between them.

use crate::session::{Role, Session};
use crate::types::EventId;
use std::fmt;

/// Pages of the storefront
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Route {
    /// Landing page
    #[default]
    Home,
    /// Event catalog
    Events,
    /// One event
    EventDetail(EventId),
    /// Sign-in form
    Login,
    /// Sign-up form
    Register,
    /// Cart review
    Cart,
    /// Payment page
    Checkout,
    /// Issued tickets
    MyTickets,
    /// Profile
    Account,
    /// Platform administration
    AdminDashboard,
    /// Artist event management
    ArtistDashboard,
}

impl Route {
    /// Guard protecting this page
    #[must_use]
    pub const fn guard(&self) -> RouteGuard {
        match self {
            Self::Home | Self::Events | Self::EventDetail(_) => RouteGuard::Open,
            Self::Login | Self::Register => RouteGuard::Public,
            Self::Cart | Self::Checkout | Self::MyTickets | Self::Account => RouteGuard::Private {
                required_role: None,
            },
            Self::AdminDashboard => RouteGuard::Private {
                required_role: Some(Role::Admin),
            },
            Self::ArtistDashboard => RouteGuard::Private {
                required_role: Some(Role::Artist),
            },
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => f.write_str("/"),
            Self::Events => f.write_str("/events"),
            Self::EventDetail(id) => write!(f, "/events/{id}"),
            Self::Login => f.write_str("/login"),
            Self::Register => f.write_str("/register"),
            Self::Cart => f.write_str("/cart"),
            Self::Checkout => f.write_str("/checkout"),
            Self::MyTickets => f.write_str("/my-tickets"),
            Self::Account => f.write_str("/account"),
            Self::AdminDashboard => f.write_str("/admin"),
            Self::ArtistDashboard => f.write_str("/artist"),
        }
    }
}

/// How a page is protected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteGuard {
    /// Anyone may view it
    Open,
    /// Only for visitors who are not signed in
    Public,
    /// Only for signed-in visitors, optionally with an exact role
    Private {
        /// Role the visitor must hold
        required_role: Option<Role>,
    },
}

/// Outcome of a guard check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Show the requested page
    Render(Route),
    /// Go somewhere else instead
    Redirect(Route),
}

impl Access {
    /// Page that ends up on screen
    #[must_use]
    pub const fn destination(&self) -> Route {
        match self {
            Self::Render(route) | Self::Redirect(route) => *route,
        }
    }
}

/// Sign-in and sign-up pages: signed-in visitors are sent home
#[must_use]
pub const fn public_route(session: &Session, target: Route) -> Access {
    if session.is_authenticated() {
        Access::Redirect(Route::Home)
    } else {
        Access::Render(target)
    }
}

/// Signed-in pages
///
/// Anonymous visitors go to the login page whatever the required role;
/// signed-in visitors without the exact role go home.
#[must_use]
pub fn private_route(session: &Session, target: Route, required_role: Option<Role>) -> Access {
    match (session.role(), required_role) {
        (None, _) => Access::Redirect(Route::Login),
        (Some(held), Some(required)) if held != required => Access::Redirect(Route::Home),
        _ => Access::Render(target),
    }
}

/// Applies the route table to a navigation request
#[must_use]
pub fn authorize(session: &Session, target: Route) -> Access {
    let access = match target.guard() {
        RouteGuard::Open => Access::Render(target),
        RouteGuard::Public => public_route(session, target),
        RouteGuard::Private { required_role } => private_route(session, target, required_role),
    };
    if let Access::Redirect(to) = access {
        tracing::debug!(from = %target, %to, "Navigation redirected");
    }
    access
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_table() {
        assert_eq!(Route::Home.guard(), RouteGuard::Open);
        assert_eq!(Route::Login.guard(), RouteGuard::Public);
        assert_eq!(
            Route::Checkout.guard(),
            RouteGuard::Private { required_role: None }
        );
        assert_eq!(
            Route::AdminDashboard.guard(),
            RouteGuard::Private {
                required_role: Some(Role::Admin)
            }
        );
    }

    #[test]
    fn test_open_routes_render_for_everyone() {
        let anonymous = Session::Anonymous;
        let admin = Session::signed_in(Role::Admin, "t");
        let detail = Route::EventDetail(EventId::new(3));
        assert_eq!(authorize(&anonymous, detail), Access::Render(detail));
        assert_eq!(authorize(&admin, detail), Access::Render(detail));
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::MyTickets.to_string(), "/my-tickets");
        assert_eq!(Route::EventDetail(EventId::new(9)).to_string(), "/events/9");
    }

    #[test]
    fn test_access_destination() {
        assert_eq!(Access::Redirect(Route::Login).destination(), Route::Login);
        assert_eq!(Access::Render(Route::Cart).destination(), Route::Cart);
    }
}
