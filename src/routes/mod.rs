pub mod mission_routes;
pub mod notification_routes;
