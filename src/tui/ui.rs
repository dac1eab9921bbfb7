use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;

use crate::core::state::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{
    ConfirmDialog, FormPanel, MessageList, RemotePanel, TitleBar, panel_height,
};

const HELP: &str = " Ctrl+C quit  Ctrl+D disconnect  Ctrl+R remote side  Tab field  Enter submit  End follow ";

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState) {
    use Constraint::{Length, Min};

    let error_height = u16::from(app.error.is_some());
    let form_height = panel_height(&app.forms);
    let layout = Layout::vertical([
        Length(1),
        Min(0),
        Length(error_height),
        Length(form_height),
        Length(1),
    ]);
    let [title_area, log_area, error_area, form_area, help_area] = layout.areas(frame.area());

    MessageList::new(&mut tui.message_list, &app.log).render(frame, log_area);

    let mut title_bar = TitleBar::new(
        app.kind.title(),
        app.session.phase(),
        app.status_message.clone(),
    );
    title_bar.pending_prompts = app.prompts.len();
    title_bar.has_unseen_content = tui.message_list.has_unseen_content();
    title_bar.render(frame, title_area);

    if let Some(error) = &app.error {
        draw_error_line(frame, error_area, error);
    }

    let overlay_open = tui.remote.is_some() || app.current_prompt().is_some();
    FormPanel::new(&app.forms, !overlay_open).render(frame, form_area);

    frame.render_widget(
        Line::styled(HELP, Style::default().add_modifier(Modifier::DIM)),
        help_area,
    );

    if let Some(remote) = tui.remote.as_mut() {
        remote.sync(app.session.registered());
        RemotePanel::new(remote).render(frame, frame.area());
    } else if let Some(invocation) = app.current_prompt() {
        ConfirmDialog::new(invocation, app.prompts.len() - 1).render(frame, frame.area());
    }
}

fn draw_error_line(frame: &mut Frame, area: Rect, error: &str) {
    frame.render_widget(
        Line::styled(format!("Error: {error}"), Style::default().fg(Color::Red)),
        area,
    );
}
