pub mod attendance;
pub mod filter;
pub mod stats;

pub use attendance::{
    AttendanceBoard, AttendanceEntry, AttendanceFilter, AttendanceSummary, BranchBucket, BranchSelector, BucketView,
    UNASSIGNED_TOKEN,
};
pub use filter::{filter_sort, BranchFilter, Criteria, Filterable, SearchQuery, StatusFilter};
pub use stats::{
    percentage, AppointmentStats, CategoryStats, ClientStats, EmployeeStats, StatusBucket, Summarize,
};
