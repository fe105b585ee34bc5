//! Well-known keys shared by the request pipeline and response bodies.

/// Request header naming the employee acting on the request.
pub const CURRENT_EMPLOYEE_HEADER: &str = "x-current-employee";

/// Response key holding the acting employee.
pub const CURRENT_EMPLOYEE: &str = "current_employee";

/// Query/response key for the zero-based page index.
pub const PAGE_INDEX: &str = "page_index";

/// Query/response key for the page size.
pub const PAGE_SIZE: &str = "page_size";

/// Response key holding validation errors.
pub const ERRORS: &str = "errors";

/// Response key holding the confirmation of a successful command.
pub const SUCCESS_MESSAGE: &str = "success_message";

pub const TEAMS: &str = "teams";

pub const LOANED_ITEMS: &str = "loaned_items";
