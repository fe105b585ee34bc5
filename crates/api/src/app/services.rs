//! Service wiring: database, session provider, command configurations and the
//! message processor shared by all routes.

use chrono::Utc;

use staffroom_commands::{
    CommandMessage, CommandRegistry, ExecutionResult, MappingRegistry, MessageProcessor,
    ProcessError,
};
use staffroom_core::{DomainResult, PageRequest};
use staffroom_infra::commands::{
    self, AssignEmployeeToTeamCommandMessage, CreateEmployeeCommandMessage,
    CreateTeamCommandMessage, LendItemCommandMessage, RecordSaleCommandMessage,
    RegisterArticleCommandMessage, RegisterLoanedItemCommandMessage,
    RegisterSalesmanCommandMessage, ReturnItemCommandMessage, UpdateEmployeeCommandMessage,
};
use staffroom_infra::repository::{RepositoryError, SessionRepository};
use staffroom_infra::{Database, SessionProvider, unit_of_work};

use crate::app::dto::{
    EmployeeRequest, Identified, LoanRequest, MembershipRequest, SaleRequest, TeamRequest,
};
use crate::config::AppConfig;

pub struct AppServices {
    processor: MessageProcessor,
    sessions: SessionProvider,
    default_page_size: usize,
}

impl AppServices {
    pub fn new(config: &AppConfig) -> Self {
        unit_of_work::configure_ambient_session();

        let sessions = SessionProvider::new(Database::new(), config.session_scope);
        let mut registry = CommandRegistry::new();
        commands::configure(&mut registry, &sessions);

        tracing::info!(
            scope = ?config.session_scope,
            commands = registry.len(),
            "services initialised"
        );

        Self {
            processor: MessageProcessor::new(registry, build_mapper()),
            sessions,
            default_page_size: config.default_page_size,
        }
    }

    pub fn sessions(&self) -> &SessionProvider {
        &self.sessions
    }

    /// Map a UI message to `C` and run it through the pipeline.
    pub fn process<U, C, R>(&self, message: &U) -> Result<ExecutionResult<R>, ProcessError>
    where
        U: std::any::Any + Send + Sync,
        C: CommandMessage,
        R: 'static,
    {
        self.processor.process::<U, C, R>(message)
    }

    pub fn process_command<C: CommandMessage, R: 'static>(
        &self,
        command: &C,
    ) -> Result<ExecutionResult<R>, ProcessError> {
        self.processor.process_command(command)
    }

    /// Repository bound to the request's session.
    pub fn repository<E>(&self) -> Result<SessionRepository<E>, RepositoryError> {
        Ok(SessionRepository::new(self.sessions.current()?))
    }

    /// Page request from optional query values, falling back to the configured size.
    pub fn page_request(&self, index: Option<usize>, size: Option<usize>) -> DomainResult<PageRequest> {
        PageRequest::new(index.unwrap_or(0), size.unwrap_or(self.default_page_size))
    }
}

fn build_mapper() -> MappingRegistry {
    let mut mapper = MappingRegistry::new();

    mapper
        .register::<EmployeeRequest, CreateEmployeeCommandMessage>(|body| CreateEmployeeCommandMessage {
            first_name: body.first_name.clone(),
            last_name: body.last_name.clone(),
            email: body.email.clone(),
            hired_on: body.hired_on,
        })
        .register::<Identified<EmployeeRequest>, UpdateEmployeeCommandMessage>(|form| {
            UpdateEmployeeCommandMessage {
                employee_id: form.id,
                first_name: form.body.first_name.clone(),
                last_name: form.body.last_name.clone(),
                email: form.body.email.clone(),
                hired_on: form.body.hired_on,
            }
        })
        .register::<TeamRequest, CreateTeamCommandMessage>(|body| CreateTeamCommandMessage {
            name: body.name.clone(),
            description: body.description.clone().unwrap_or_default(),
        })
        .register::<Identified<MembershipRequest>, AssignEmployeeToTeamCommandMessage>(|form| {
            AssignEmployeeToTeamCommandMessage {
                team_id: form.id,
                employee_id: form.body.employee_id,
                role: form.body.role.clone().unwrap_or_default(),
                joined_on: form.body.joined_on.unwrap_or_else(|| Utc::now().date_naive()),
            }
        })
        .register::<Identified<LoanRequest>, LendItemCommandMessage>(|form| LendItemCommandMessage {
            item_id: form.id,
            employee_id: form.body.employee_id,
            on: form.body.on.unwrap_or_else(|| Utc::now().date_naive()),
        })
        .register::<Identified<LoanRequest>, ReturnItemCommandMessage>(|form| ReturnItemCommandMessage {
            item_id: form.id,
            employee_id: form.body.employee_id,
            on: form.body.on.unwrap_or_else(|| Utc::now().date_naive()),
        })
        .register::<Identified<SaleRequest>, RecordSaleCommandMessage>(|form| RecordSaleCommandMessage {
            salesman_id: form.id,
            article_id: form.body.article_id,
            sold_on: form.body.sold_on.unwrap_or_else(|| Utc::now().date_naive()),
            amount: form.body.amount,
            cost: form.body.cost,
        })
        .register_identity::<RegisterLoanedItemCommandMessage>()
        .register_identity::<RegisterArticleCommandMessage>()
        .register_identity::<RegisterSalesmanCommandMessage>();

    mapper
}
