use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::client::CrmApi;
use crate::models::dates::format_date;
use crate::ui::popup::render_popup;
use crate::ui::project_form::{render_project_form, ProjectField};
use crate::ui::projects::{DeleteOutcome, ProjectsPage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Search,
    Form,
    ConfirmDelete(i64),
    ConfirmCascade(String),
}

/// Work that needs the API, handed back to the event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenAction {
    Quit,
    Refresh,
    Submit,
    Delete(i64),
    ResolveCascade(bool),
}

pub struct ProjectsScreen<A: CrmApi> {
    pub page: ProjectsPage<A>,
    pub mode: Mode,
    list_state: ListState,
}

impl<A: CrmApi> ProjectsScreen<A> {
    pub fn new(page: ProjectsPage<A>) -> Self {
        Self {
            page,
            mode: Mode::Browse,
            list_state: ListState::default(),
        }
    }

    fn visible_len(&self) -> usize {
        self.page.filtered_projects().len()
    }

    /// Keep the highlight on a row that still exists
    fn clamp_selection(&mut self) {
        let len = self.visible_len();
        let selected = match self.list_state.selected() {
            _ if len == 0 => None,
            Some(i) if i >= len => Some(len - 1),
            Some(i) => Some(i),
            None => Some(0),
        };
        self.list_state.select(selected);
    }

    pub fn next(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    pub fn selected_project_id(&self) -> Option<i64> {
        let index = self.list_state.selected()?;
        self.page.filtered_projects().get(index).map(|p| p.pid)
    }

    /// Pick the first customer matching what was typed into the picker
    fn match_customer(&mut self) {
        let cid = self
            .page
            .filter_customer_options(&self.page.form.customer_query)
            .first()
            .map(|option| option.value);
        self.page.select_customer(cid);
    }

    /// Step through the customers matching the picker text
    fn cycle_customer(&mut self, forward: bool) {
        let matches: Vec<i64> = self
            .page
            .filter_customer_options(&self.page.form.customer_query)
            .iter()
            .map(|option| option.value)
            .collect();
        if matches.is_empty() {
            return;
        }
        let current = self
            .page
            .form
            .customer_id
            .and_then(|cid| matches.iter().position(|m| *m == cid));
        let next = match (current, forward) {
            (Some(i), true) => (i + 1) % matches.len(),
            (Some(i), false) => (i + matches.len() - 1) % matches.len(),
            (None, _) => 0,
        };
        self.page.select_customer(Some(matches[next]));
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<ScreenAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        if self.page.alert().is_some() {
            self.page.dismiss_alert();
            return None;
        }

        match self.mode.clone() {
            Mode::Browse => self.handle_browse(key.code),
            Mode::Search => {
                match key.code {
                    KeyCode::Char(c) => self.page.search_term_mut().push(c),
                    KeyCode::Backspace => {
                        self.page.search_term_mut().pop();
                    }
                    KeyCode::Esc => {
                        self.page.set_search_term("");
                        self.mode = Mode::Browse;
                    }
                    KeyCode::Enter => self.mode = Mode::Browse,
                    _ => {}
                }
                self.list_state.select(None);
                self.clamp_selection();
                None
            }
            Mode::Form => self.handle_form(key.code),
            Mode::ConfirmDelete(pid) => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.mode = Mode::Browse;
                    Some(ScreenAction::Delete(pid))
                }
                KeyCode::Char('n') | KeyCode::Esc => {
                    self.mode = Mode::Browse;
                    None
                }
                _ => None,
            },
            Mode::ConfirmCascade(_) => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.mode = Mode::Browse;
                    Some(ScreenAction::ResolveCascade(true))
                }
                KeyCode::Char('n') | KeyCode::Esc => {
                    self.mode = Mode::Browse;
                    Some(ScreenAction::ResolveCascade(false))
                }
                _ => None,
            },
        }
    }

    fn handle_browse(&mut self, code: KeyCode) -> Option<ScreenAction> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(ScreenAction::Quit),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Char('/') => self.mode = Mode::Search,
            KeyCode::Char('r') => return Some(ScreenAction::Refresh),
            KeyCode::Char('n') => {
                self.page.reset_form();
                self.mode = Mode::Form;
            }
            KeyCode::Char('e') => {
                if let Some(pid) = self.selected_project_id() {
                    if self.page.edit(pid) {
                        self.mode = Mode::Form;
                    }
                }
            }
            KeyCode::Char('d') => {
                if let Some(pid) = self.selected_project_id() {
                    self.mode = Mode::ConfirmDelete(pid);
                }
            }
            _ => {}
        }
        None
    }

    fn handle_form(&mut self, code: KeyCode) -> Option<ScreenAction> {
        let field = self.page.form.current_field;
        match code {
            KeyCode::Esc => {
                self.page.reset_form();
                self.mode = Mode::Browse;
            }
            KeyCode::Enter => return Some(ScreenAction::Submit),
            KeyCode::Tab | KeyCode::Down => self.page.form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.page.form.previous_field(),
            KeyCode::Left | KeyCode::Right if field == ProjectField::Status => {
                self.page.form.cycle_status(code == KeyCode::Right)
            }
            KeyCode::Left | KeyCode::Right if field == ProjectField::Customer => {
                self.cycle_customer(code == KeyCode::Right)
            }
            KeyCode::Char(' ') if field == ProjectField::Status => {
                self.page.form.cycle_status(true)
            }
            KeyCode::Char(c) => {
                self.page.form.push_char(c);
                if field == ProjectField::Customer {
                    self.match_customer();
                }
            }
            KeyCode::Backspace => {
                self.page.form.pop_char();
                if field == ProjectField::Customer {
                    self.match_customer();
                }
            }
            _ => {}
        }
        None
    }

    /// Run an action against the API. Returns true when the page should close.
    pub async fn perform(&mut self, action: ScreenAction) -> bool {
        match action {
            ScreenAction::Quit => return true,
            ScreenAction::Refresh => self.page.load().await,
            ScreenAction::Submit => {
                if self.page.submit().await {
                    self.mode = Mode::Browse;
                }
            }
            ScreenAction::Delete(pid) => {
                if let DeleteOutcome::AwaitingConfirmation(warning) = self.page.delete(pid).await {
                    self.mode = Mode::ConfirmCascade(warning);
                }
            }
            ScreenAction::ResolveCascade(approve) => {
                self.page.resolve_cascade(approve).await;
            }
        }
        self.clamp_selection();
        false
    }
}

pub fn render_projects<B: Backend, A: CrmApi>(frame: &mut Frame<B>, screen: &mut ProjectsScreen<A>) {
    let size = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ].as_ref())
        .split(size);

    let search_style = if screen.mode == Mode::Search {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    };
    let search = Paragraph::new(screen.page.search_term().to_string())
        .style(search_style)
        .block(Block::default().title("Search Projects").borders(Borders::ALL));
    frame.render_widget(search, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
        .split(chunks[1]);

    let items: Vec<ListItem> = screen
        .page
        .filtered_projects()
        .iter()
        .map(|project| {
            ListItem::new(Spans::from(vec![
                Span::styled(
                    project.pname.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(
                    "  {}  {} to {}  [{}]",
                    project.cname.as_deref().unwrap_or("-"),
                    format_date(Some(project.start_date.as_str())),
                    format_date(project.end_date.as_deref()),
                    project.status,
                )),
            ]))
        })
        .collect();

    let title = if screen.page.is_loading() {
        "Projects (loading...)"
    } else {
        "Projects"
    };
    let projects_list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_stateful_widget(projects_list, body[0], &mut screen.list_state);

    let customer_label = screen.page.selected_customer().map(|option| option.label.clone());
    render_project_form(
        frame,
        body[1],
        &screen.page.form,
        customer_label.as_deref(),
        screen.page.edit_id().is_some(),
        screen.mode == Mode::Form,
    );

    let help = match screen.mode {
        Mode::Browse => "<N> New | <E> Edit | <D> Delete | </> Search | <R> Refresh | <Q> Quit",
        Mode::Search => "Type to filter | <Enter> Done | <Esc> Clear",
        Mode::Form => "<Tab> Next Field | <Left/Right> Choose | <Enter> Save | <Esc> Cancel",
        Mode::ConfirmDelete(_) | Mode::ConfirmCascade(_) => "<Y> Yes  <N> No",
    };
    let buttons = Paragraph::new(help)
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));
    frame.render_widget(buttons, chunks[2]);

    match &screen.mode {
        Mode::ConfirmDelete(_) => render_popup(
            frame,
            size,
            "Confirm Delete",
            "Are you sure you want to delete this project?",
            "<Y> Yes  <N> No",
        ),
        Mode::ConfirmCascade(warning) => {
            render_popup(frame, size, "Related Records", warning, "<Y> Yes  <N> No")
        }
        _ => {}
    }

    if let Some(alert) = screen.page.alert() {
        render_popup(frame, size, "Notice", alert, "Press any key");
    }
}
