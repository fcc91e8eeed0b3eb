//! Fixed names and routes

/// Group whose permissions are always full and never editable
pub const ADMIN_GROUP_NAME: &str = "Administrators";

/// Group every user belongs to; membership is not editable
pub const DEFAULT_GROUP_NAME: &str = "All Users";

/// Schema key used for tables that live outside any schema
pub const NO_SCHEMA: &str = "";

/// Root of the permission admin routes
pub const ROUTE_BASE: &str = "/admin/permissions";

// Navigation link labels
pub const VIEW_SCHEMAS: &str = "View schemas";
pub const VIEW_TABLES: &str = "View tables";
