use staffroom_core::EntityId;

/// Employee acting on the current request, taken from the
/// [`CURRENT_EMPLOYEE_HEADER`](crate::constants::CURRENT_EMPLOYEE_HEADER) header.
///
/// Absent header means an anonymous request.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CurrentEmployee {
    employee_id: Option<EntityId>,
}

impl CurrentEmployee {
    pub fn new(employee_id: Option<EntityId>) -> Self {
        Self { employee_id }
    }

    pub fn employee_id(&self) -> Option<EntityId> {
        self.employee_id
    }
}
