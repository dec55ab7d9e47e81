pub mod popup;
pub mod project_form;
pub mod projects;
pub mod screen;
