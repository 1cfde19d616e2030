pub mod analysis_service;
pub mod audit_service;
pub mod dispatcher;
pub mod identity_service;
pub mod lifecycle_service;
pub mod messaging_service;
pub mod notification_service;
pub mod ownership_service;
pub mod room_service;
pub mod session_service;
