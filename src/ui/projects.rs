use crate::client::{CrmApi, DeleteAttempt};
use crate::models::{Customer, Project, RelatedRecords};
use crate::ui::project_form::ProjectForm;

/// Entry of the customer picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerOption {
    pub value: i64,
    pub label: String,
    /// `"<name> <id>"`, what the picker filters on
    pub search_label: String,
}

impl From<&Customer> for CustomerOption {
    fn from(customer: &Customer) -> Self {
        Self {
            value: customer.cid,
            label: customer.cname.clone(),
            search_label: format!("{} {}", customer.cname, customer.cid),
        }
    }
}

/// Where a delete attempt ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(String),
    /// The project has dependents; the user must approve the cascade
    AwaitingConfirmation(String),
    Aborted,
    Failed(String),
}

/// A delete blocked by dependents, waiting for the user's answer
#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingCascade {
    pid: i64,
    related: RelatedRecords,
}

/// State and operations behind the projects page
pub struct ProjectsPage<A: CrmApi> {
    api: A,
    projects: Vec<Project>,
    customers: Vec<Customer>,
    customer_options: Vec<CustomerOption>,
    pub form: ProjectForm,
    edit_id: Option<i64>,
    search_term: String,
    loading: bool,
    alert: Option<String>,
    pending_cascade: Option<PendingCascade>,
}

/// Confirmation text for a delete blocked by dependents
pub fn cascade_warning(related: &RelatedRecords) -> String {
    let mut message = format!(
        "This project has {} related record(s).",
        related.related_records
    );
    if related.has_spending {
        message.push_str(&format!(
            "\n\nWARNING: This project has {} inventory spending record(s). \
             Deleting this project will delete all spending history.",
            related.spending_records
        ));
    }
    message.push_str("\n\nDo you want to delete the project and all related records?");
    message
}

impl<A: CrmApi> ProjectsPage<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            projects: Vec::new(),
            customers: Vec::new(),
            customer_options: Vec::new(),
            form: ProjectForm::default(),
            edit_id: None,
            search_term: String::new(),
            loading: false,
            alert: None,
            pending_cascade: None,
        }
    }

    pub async fn load(&mut self) {
        self.fetch_projects().await;
        self.fetch_customers().await;
    }

    pub async fn fetch_projects(&mut self) {
        self.loading = true;
        match self.api.list_projects().await {
            Ok(projects) => self.projects = projects,
            Err(e) => tracing::error!("Error fetching projects: {}", e),
        }
        self.loading = false;
    }

    pub async fn fetch_customers(&mut self) {
        match self.api.list_customers().await {
            Ok(customers) => {
                self.customer_options = customers.iter().map(CustomerOption::from).collect();
                self.customers = customers;
            }
            Err(e) => tracing::error!("Error fetching customers: {}", e),
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn customer_options(&self) -> &[CustomerOption] {
        &self.customer_options
    }

    /// Options whose search label contains `query`, ignoring case
    pub fn filter_customer_options(&self, query: &str) -> Vec<&CustomerOption> {
        let query = query.to_lowercase();
        self.customer_options()
            .iter()
            .filter(|option| option.search_label.to_lowercase().contains(&query))
            .collect()
    }

    pub fn selected_customer(&self) -> Option<&CustomerOption> {
        let cid = self.form.customer_id?;
        self.customer_options.iter().find(|option| option.value == cid)
    }

    pub fn select_customer(&mut self, cid: Option<i64>) {
        self.form.customer_id = cid;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn edit_id(&self) -> Option<i64> {
        self.edit_id
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    pub fn search_term_mut(&mut self) -> &mut String {
        &mut self.search_term
    }

    /// Projects whose name contains the search term, ignoring case
    pub fn filtered_projects(&self) -> Vec<&Project> {
        let term = self.search_term.to_lowercase();
        self.projects()
            .iter()
            .filter(|project| project.pname.to_lowercase().contains(&term))
            .collect()
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    fn show_alert(&mut self, message: impl Into<String>) {
        self.alert = Some(message.into());
    }

    /// Load a project into the form for editing. Returns false when the id
    /// is not in the list.
    pub fn edit(&mut self, pid: i64) -> bool {
        let Some(project) = self.projects.iter().find(|p| p.pid == pid) else {
            return false;
        };
        self.form.load(project);
        self.edit_id = Some(pid);
        // The project keeps its customer even when the list does not have it
        if !self.customers.iter().any(|c| c.cid == project.cid) {
            tracing::warn!("Customer {} of project {} is not in the list", project.cid, pid);
        }
        true
    }

    pub fn reset_form(&mut self) {
        self.form.clear();
        self.edit_id = None;
    }

    /// Create or update from the form. Returns true when the server accepted
    /// it; the list is then refreshed and the form cleared.
    pub async fn submit(&mut self) -> bool {
        let payload = match self.form.to_payload() {
            Ok(payload) => payload,
            Err(message) => {
                self.show_alert(message);
                return false;
            }
        };

        let result = match self.edit_id {
            Some(pid) => self.api.update_project(pid, &payload).await,
            None => self.api.create_project(&payload).await,
        };

        match result {
            Ok(project) => {
                tracing::info!(pid = project.pid, "project saved");
                self.fetch_projects().await;
                self.reset_form();
                true
            }
            Err(e) => {
                tracing::error!("Error saving project: {}", e);
                self.show_alert(e.to_string());
                false
            }
        }
    }

    /// First delete request, sent after the user confirmed the delete.
    pub async fn delete(&mut self, pid: i64) -> DeleteOutcome {
        self.pending_cascade = None;

        let outcome = match self.api.delete_project(pid, false).await {
            Ok(DeleteAttempt::Deleted(_)) => {
                self.fetch_projects().await;
                DeleteOutcome::Deleted("Project deleted successfully".to_string())
            }
            Ok(DeleteAttempt::Blocked(related)) => {
                tracing::info!(pid, related = related.related_records, "delete needs cascade");
                self.pending_cascade = Some(PendingCascade { pid, related });
                return DeleteOutcome::AwaitingConfirmation(cascade_warning(&related));
            }
            Err(e) => {
                tracing::error!("Error deleting project: {}", e);
                DeleteOutcome::Failed(e.to_string())
            }
        };

        self.report(&outcome);
        outcome
    }

    /// Answer to the cascade warning. Declining ends the attempt untouched.
    pub async fn resolve_cascade(&mut self, approve: bool) -> DeleteOutcome {
        let Some(pending) = self.pending_cascade.take() else {
            return DeleteOutcome::Aborted;
        };
        if !approve {
            return DeleteOutcome::Aborted;
        }

        self.loading = true;
        let outcome = match self.api.delete_project(pending.pid, true).await {
            Ok(DeleteAttempt::Deleted(_)) => {
                let mut message = "Project and related records deleted successfully.".to_string();
                if pending.related.has_spending {
                    message.push_str("\nInventory spending records have also been deleted.");
                }
                self.fetch_projects().await;
                DeleteOutcome::Deleted(message)
            }
            Ok(DeleteAttempt::Blocked(_)) => {
                DeleteOutcome::Failed("Failed to delete project and related records".to_string())
            }
            Err(e) => {
                tracing::error!("Error during cascade delete: {}", e);
                DeleteOutcome::Failed(e.to_string())
            }
        };
        self.loading = false;

        self.report(&outcome);
        outcome
    }

    fn report(&mut self, outcome: &DeleteOutcome) {
        match outcome {
            DeleteOutcome::Deleted(message) | DeleteOutcome::Failed(message) => {
                self.show_alert(message.clone())
            }
            DeleteOutcome::AwaitingConfirmation(_) | DeleteOutcome::Aborted => {}
        }
    }
}
