//! Staff category classification.

use crate::config::PolicyConfig;
use crate::models::{EmployeeRecord, StaffCategory};

/// Classifies an employee as staff or regular for salary-raise purposes.
///
/// An explicit `staff_category` on the record wins. Otherwise the employee
/// is staff when their position title contains the policy's lowest-grade
/// keyword, compared case-insensitively.
///
/// # Examples
///
/// ```
/// use hr_lifecycle_engine::config::PolicyConfig;
/// use hr_lifecycle_engine::models::{EmployeeRecord, StaffCategory};
/// use hr_lifecycle_engine::rules::classify_category;
///
/// let policy = PolicyConfig::default();
/// let mut employee = EmployeeRecord::new("emp_001", "A");
/// employee.position = "Nhân viên văn thư".to_string();
/// assert_eq!(classify_category(&employee, &policy), StaffCategory::Staff);
///
/// employee.position = "Chuyên viên".to_string();
/// assert_eq!(classify_category(&employee, &policy), StaffCategory::Regular);
/// ```
pub fn classify_category(employee: &EmployeeRecord, policy: &PolicyConfig) -> StaffCategory {
    if let Some(category) = employee.staff_category {
        return category;
    }

    let title = employee.position.to_lowercase();
    let keyword = policy.staff_title_keyword.trim().to_lowercase();
    if title.contains(&keyword) {
        StaffCategory::Staff
    } else {
        StaffCategory::Regular
    }
}

/// Months between raises the policy requires for `category`.
pub fn required_raise_months(category: StaffCategory, policy: &PolicyConfig) -> i32 {
    match category {
        StaffCategory::Staff => policy.salary_raise_staff_months,
        StaffCategory::Regular => policy.salary_raise_regular_months,
    }
}
