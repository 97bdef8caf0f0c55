mod dashboard;
mod project_detail;

pub use dashboard::DashboardView;
pub use project_detail::ProjectDetailView;
