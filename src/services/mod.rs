pub mod activity_service;
pub mod analytics_service;
pub mod dashboard_service;

pub use activity_service::{merge_recent, paginate, Activity, Page};
pub use analytics_service::CombinedAnalytics;
pub use dashboard_service::{DashboardSummary, TotalCounts};
