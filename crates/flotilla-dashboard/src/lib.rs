//! Dashboard view controllers for Flotilla.
//!
//! Contains the route guard that validates cached credentials before the
//! dashboard is entered, the node list controller that sequences swarm and
//! node fetches, and the notification values both hand to the presentation
//! layer.

pub mod node_list;
pub mod notifications;
pub mod route_guard;


pub use node_list::{ActionOutcome, NodeListController, NodeListState, DEFAULT_LISTEN_ADDR};
pub use notifications::{Notification, NotificationLevel, NotificationQueue};
pub use route_guard::{GuardOutcome, RouteGuard, LOGIN_ROUTE};
