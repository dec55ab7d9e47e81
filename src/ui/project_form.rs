use tui::{
    backend::Backend,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::models::dates::{self, format_date, parse_calendar_date};
use crate::models::{Project, ProjectPayload, ProjectStatus};

pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill all required fields.";
pub const INVALID_START_MESSAGE: &str = "Start date is invalid or missing.";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProjectField {
    Name,
    StartDate,
    EndDate,
    Status,
    Customer,
}

impl ProjectField {
    fn label(&self) -> &'static str {
        match self {
            ProjectField::Name => "Project Name",
            ProjectField::StartDate => "Start Date",
            ProjectField::EndDate => "End Date (Optional)",
            ProjectField::Status => "Status",
            ProjectField::Customer => "Customer",
        }
    }
}

/// Field values of the add/update project form
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectForm {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub status: Option<ProjectStatus>,
    pub customer_id: Option<i64>,
    /// Text typed into the customer picker
    pub customer_query: String,
    pub current_field: ProjectField,
}

impl Default for ProjectForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            status: None,
            customer_id: None,
            customer_query: String::new(),
            current_field: ProjectField::Name,
        }
    }
}

impl ProjectForm {
    /// Fill the form from an existing project; a `TBD` end date leaves the
    /// field empty.
    pub fn load(&mut self, project: &Project) {
        self.name = project.pname.clone();
        self.start_date = format_date(Some(project.start_date.as_str()));
        self.end_date = match project.end_date.as_deref() {
            Some(end) if !dates::is_absent(end) => format_date(Some(end)),
            _ => String::new(),
        };
        self.status = project.status.parse().ok();
        self.customer_id = Some(project.cid);
        self.customer_query = project.cname.clone().unwrap_or_default();
        self.current_field = ProjectField::Name;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Validate the form and build the request body.
    ///
    /// Dates go out as `YYYY-MM-DD`; a missing or unreadable end date is
    /// sent as `TBD`.
    pub fn to_payload(&self) -> Result<ProjectPayload, &'static str> {
        let name = self.name.trim();
        let start = self.start_date.trim();
        let Some(cid) = self.customer_id else {
            return Err(REQUIRED_FIELDS_MESSAGE);
        };
        if name.is_empty() || start.is_empty() {
            return Err(REQUIRED_FIELDS_MESSAGE);
        }

        let start_date = parse_calendar_date(start).ok_or(INVALID_START_MESSAGE)?;
        let end_date = parse_calendar_date(&self.end_date)
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| dates::TBD.to_string());

        Ok(ProjectPayload {
            pname: Some(name.to_string()),
            start_date: Some(start_date.format("%Y-%m-%d").to_string()),
            end_date: Some(end_date),
            status: self.status.map(|status| status.as_str().to_string()),
            cid: Some(cid),
        })
    }

    pub fn next_field(&mut self) {
        self.current_field = match self.current_field {
            ProjectField::Name => ProjectField::StartDate,
            ProjectField::StartDate => ProjectField::EndDate,
            ProjectField::EndDate => ProjectField::Status,
            ProjectField::Status => ProjectField::Customer,
            ProjectField::Customer => ProjectField::Name,
        };
    }

    pub fn previous_field(&mut self) {
        self.current_field = match self.current_field {
            ProjectField::Name => ProjectField::Customer,
            ProjectField::StartDate => ProjectField::Name,
            ProjectField::EndDate => ProjectField::StartDate,
            ProjectField::Status => ProjectField::EndDate,
            ProjectField::Customer => ProjectField::Status,
        };
    }

    /// Step through "no status" and the three statuses
    pub fn cycle_status(&mut self, forward: bool) {
        let choices: Vec<Option<ProjectStatus>> = std::iter::once(None)
            .chain(ProjectStatus::ALL.into_iter().map(Some))
            .collect();
        let current = choices.iter().position(|s| *s == self.status).unwrap_or(0);
        let next = if forward {
            (current + 1) % choices.len()
        } else {
            (current + choices.len() - 1) % choices.len()
        };
        self.status = choices[next];
    }

    /// Type into the text field under the cursor. Status and customer are
    /// handled by the page since they pick from lists.
    pub fn push_char(&mut self, c: char) {
        match self.current_field {
            ProjectField::Name => self.name.push(c),
            ProjectField::StartDate => self.start_date.push(c),
            ProjectField::EndDate => self.end_date.push(c),
            ProjectField::Customer => self.customer_query.push(c),
            ProjectField::Status => {}
        }
    }

    pub fn pop_char(&mut self) {
        match self.current_field {
            ProjectField::Name => {
                self.name.pop();
            }
            ProjectField::StartDate => {
                self.start_date.pop();
            }
            ProjectField::EndDate => {
                self.end_date.pop();
            }
            ProjectField::Customer => {
                self.customer_query.pop();
            }
            ProjectField::Status => {}
        }
    }
}

pub fn render_project_form<B: Backend>(
    frame: &mut Frame<B>,
    area: Rect,
    form: &ProjectForm,
    customer_label: Option<&str>,
    editing: bool,
    focused: bool,
) {
    let fields = [
        (ProjectField::Name, form.name.clone()),
        (ProjectField::StartDate, form.start_date.clone()),
        (ProjectField::EndDate, form.end_date.clone()),
        (
            ProjectField::Status,
            form.status
                .map(|status| status.label().to_string())
                .unwrap_or_else(|| "Select Status".to_string()),
        ),
        (
            ProjectField::Customer,
            match customer_label {
                Some(label) => format!("{} [{}]", form.customer_query, label),
                None => format!("{} [Select Customer]", form.customer_query),
            },
        ),
    ];

    let mut lines = Vec::new();
    for (field, value) in fields {
        let selected = focused && form.current_field == field;
        let label_style = if selected {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Spans::from(Span::styled(field.label(), label_style)));

        let value_style = if selected {
            Style::default().bg(Color::Blue).fg(Color::White)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Spans::from(Span::styled(format!(" {}", value), value_style)));
        lines.push(Spans::from(""));
    }

    let title = if editing { "Update Project" } else { "Add Project" };
    let form_widget = Paragraph::new(lines)
        .block(Block::default().title(title).borders(Borders::ALL));

    frame.render_widget(form_widget, area);
}
