pub mod dates;
mod customer;
mod project;
mod invoice;
mod inventory;

pub use customer::{Customer, CustomerDeletion, CustomerInput, CustomerPatch, NewCustomer};
pub use project::{NewProject, Project, ProjectDeletion, ProjectPayload, ProjectStatus, RelatedRecords};
pub use invoice::{Invoice, InvoiceInput, NewInvoice};
pub use inventory::{Spending, SpendingInput, StockTransaction, StockTransactionInput};
