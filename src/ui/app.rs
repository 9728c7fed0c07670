use std::mem;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use crossterm::event::KeyCode;
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::backup::{default_transfer_path, export_catalog, read_import};
use crate::catalog::CatalogStore;
use crate::models::{Song, SongPatch};

use super::forms::{ConfirmDelete, ConfirmImport, SongForm};
use super::helpers::{centered_rect, completeness_span, surface_error, surface_store_error};
use super::screens::{CatalogScreen, DetailScreen};

/// Footer space reserved for the status line, the now-playing line, and the
/// key instructions.
const FOOTER_HEIGHT: u16 = 4;

/// High-level navigation states. The catalog list survives screen switches
/// (it lives on [`App`] directly), so entering and leaving the detail view
/// never loses the active search or selection.
enum Screen {
    Catalog,
    Detail(DetailScreen),
}

/// Fine-grained modes scoped to the current screen.
enum Mode {
    Normal,
    CreatingSong(SongForm),
    EditingSong { id: String, form: SongForm },
    ConfirmDelete(ConfirmDelete),
    ConfirmImport(ConfirmImport),
    Searching(SearchState),
}

/// State for an active inline search.
struct SearchState {
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    store: CatalogStore,
    catalog: CatalogScreen,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
    saved_search: Option<SearchState>,
}

impl App {
    pub fn new(store: CatalogStore) -> Self {
        let catalog = CatalogScreen::new(store.songs().to_vec());
        Self {
            store,
            catalog,
            screen: Screen::Catalog,
            mode: Mode::Normal,
            status: None,
            saved_search: None,
        }
    }

    /// Surface a startup notice (such as the seed-catalog fallback) before
    /// the first frame is drawn.
    pub fn with_startup_notice(mut self, text: impl Into<String>) -> Self {
        self.set_status(text, StatusKind::Info);
        self
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::CreatingSong(form) => self.handle_create_song(code, form),
            Mode::EditingSong { id, form } => self.handle_edit_song(code, id, form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
            Mode::ConfirmImport(confirm) => self.handle_confirm_import(code, confirm),
            Mode::Searching(state) => self.handle_search(code, state),
        };

        self.mode = mode;
        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match self.screen {
            Screen::Catalog => self.handle_catalog_key(code, exit),
            Screen::Detail(_) => self.handle_detail_key(code, exit),
        }
    }

    fn handle_catalog_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Up => self.catalog.move_selection(-1),
            KeyCode::Down => self.catalog.move_selection(1),
            KeyCode::PageUp => self.catalog.move_selection(-5),
            KeyCode::PageDown => self.catalog.move_selection(5),
            KeyCode::Home => self.catalog.select_first(),
            KeyCode::End => self.catalog.select_last(),
            KeyCode::Char('f') => {
                return Ok(Mode::Searching(SearchState {
                    query: String::new(),
                }));
            }
            KeyCode::Char('k') | KeyCode::Char('K') => {
                let active = self.catalog.toggle_show_picks();
                let message = if active {
                    "Showing editor picks only."
                } else {
                    "Showing all songs."
                };
                self.set_status(message, StatusKind::Info);
            }
            KeyCode::Char('b') | KeyCode::Char('B') => {
                if let Some(song) = self.catalog.current_song().cloned() {
                    self.toggle_editor_pick(&song);
                } else {
                    self.set_status("No song selected.", StatusKind::Error);
                }
            }
            KeyCode::Enter => {
                if let Some(song) = self.catalog.current_song() {
                    let id = song.id.clone();
                    self.clear_status();
                    self.screen = Screen::Detail(DetailScreen::new(id));
                } else {
                    self.set_status("No song selected.", StatusKind::Error);
                }
            }
            KeyCode::Char('o') | KeyCode::Char('O') => {
                if let Some(song) = self.catalog.current_song().cloned() {
                    self.open_song_link(&song);
                }
            }
            KeyCode::Char(' ') => {
                if let Some(song) = self.catalog.current_song().cloned() {
                    self.store.select_for_playback(&song.id);
                    self.set_status(
                        format!("Now playing {}.", song.display_title()),
                        StatusKind::Info,
                    );
                }
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                self.store.clear_selection();
                self.set_status("Playback selection cleared.", StatusKind::Info);
            }
            KeyCode::Char('u') | KeyCode::Char('U') => self.perform_undo(),
            KeyCode::Char('x') | KeyCode::Char('X') => self.perform_export(),
            KeyCode::Char('i') | KeyCode::Char('I') => {
                return Ok(self.begin_import());
            }
            KeyCode::Char('+') => {
                self.clear_status();
                return Ok(Mode::CreatingSong(SongForm::default()));
            }
            KeyCode::Char('-') => {
                if let Some(song) = self.catalog.current_song().cloned() {
                    self.clear_status();
                    return Ok(Mode::ConfirmDelete(ConfirmDelete { song }));
                } else {
                    self.set_status("No song selected to delete.", StatusKind::Error);
                }
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                if let Some(song) = self.catalog.current_song().cloned() {
                    self.clear_status();
                    return Ok(Mode::EditingSong {
                        id: song.id.clone(),
                        form: SongForm::from_song(&song),
                    });
                } else {
                    self.set_status("No song selected to edit.", StatusKind::Error);
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_detail_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let song_id = match &self.screen {
            Screen::Detail(detail) => detail.song_id.clone(),
            Screen::Catalog => return Ok(Mode::Normal),
        };

        match code {
            KeyCode::Char('q') => {
                *exit = true;
            }
            KeyCode::Esc => {
                self.clear_status();
                self.screen = Screen::Catalog;
            }
            KeyCode::Up => self.scroll_detail(-1),
            KeyCode::Down => self.scroll_detail(1),
            KeyCode::PageUp => self.scroll_detail(-5),
            KeyCode::PageDown => self.scroll_detail(5),
            KeyCode::Char('o') | KeyCode::Char('O') => {
                if let Some(song) = self.store.get(&song_id).cloned() {
                    self.open_song_link(&song);
                }
            }
            KeyCode::Char(' ') => {
                if let Some(song) = self.store.get(&song_id).cloned() {
                    self.store.select_for_playback(&song.id);
                    self.set_status(
                        format!("Now playing {}.", song.display_title()),
                        StatusKind::Info,
                    );
                }
            }
            KeyCode::Char('b') | KeyCode::Char('B') => {
                if let Some(song) = self.store.get(&song_id).cloned() {
                    self.toggle_editor_pick(&song);
                }
            }
            KeyCode::Char('u') | KeyCode::Char('U') => self.perform_undo(),
            KeyCode::Char('e') | KeyCode::Char('E') => {
                if let Some(song) = self.store.get(&song_id).cloned() {
                    self.clear_status();
                    return Ok(Mode::EditingSong {
                        id: song.id.clone(),
                        form: SongForm::from_song(&song),
                    });
                } else {
                    self.set_status("This song no longer exists.", StatusKind::Error);
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_create_song(&mut self, code: KeyCode, mut form: SongForm) -> Mode {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Create cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.prev_field(),
            KeyCode::Up => {
                form.cycle_choice(-1);
            }
            KeyCode::Down => {
                form.cycle_choice(1);
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.parse_new(next_song_id(self.store.songs())) {
                Ok(song) => {
                    let title = song.display_title();
                    match self.store.create(song) {
                        Ok(()) => {
                            self.refresh_catalog();
                            self.catalog.select_first();
                            self.set_status(format!("Created {title}."), StatusKind::Info);
                            keep_open = false;
                        }
                        Err(err) => {
                            let message = surface_store_error(&err);
                            form.error = Some(message.clone());
                            self.set_status(message, StatusKind::Error);
                        }
                    }
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Mode::CreatingSong(form)
        } else {
            Mode::Normal
        }
    }

    fn handle_edit_song(&mut self, code: KeyCode, id: String, mut form: SongForm) -> Mode {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.prev_field(),
            KeyCode::Up => {
                form.cycle_choice(-1);
            }
            KeyCode::Down => {
                form.cycle_choice(1);
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.parse_patch() {
                Ok(patch) if patch.is_empty() => {
                    self.set_status("No changes to save.", StatusKind::Info);
                    keep_open = false;
                }
                Ok(patch) => match self.store.update(&id, &patch) {
                    Ok(()) => {
                        self.refresh_catalog();
                        self.set_status("Song updated.", StatusKind::Info);
                        keep_open = false;
                    }
                    Err(err) => {
                        let message = surface_store_error(&err);
                        form.error = Some(message.clone());
                        self.set_status(message, StatusKind::Error);
                    }
                },
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Mode::EditingSong { id, form }
        } else if let Some(state) = self.saved_search.take() {
            Mode::Searching(state)
        } else {
            Mode::Normal
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.store.delete(&confirm.song.id) {
                    Ok(()) => {
                        self.refresh_catalog();
                        self.set_status(
                            format!("Deleted {}.", confirm.song.display_title()),
                            StatusKind::Info,
                        );
                        Mode::Normal
                    }
                    Err(err) => {
                        self.set_status(surface_store_error(&err), StatusKind::Error);
                        Mode::ConfirmDelete(confirm)
                    }
                }
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    fn handle_confirm_import(&mut self, code: KeyCode, confirm: ConfirmImport) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Import cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                let count = confirm.songs.len();
                // The replace may partially fail; the store keeps whatever it
                // managed to apply, so refresh the list either way.
                let outcome = self.store.import_all(confirm.songs);
                self.refresh_catalog();
                match outcome {
                    Ok(()) => {
                        self.set_status(format!("Imported {count} songs."), StatusKind::Info);
                    }
                    Err(err) => {
                        self.set_status(surface_store_error(&err), StatusKind::Error);
                    }
                }
                Mode::Normal
            }
            _ => Mode::ConfirmImport(confirm),
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Mode {
        match code {
            KeyCode::Esc => {
                self.catalog.set_filter(None);
                return Mode::Normal;
            }
            KeyCode::Enter => {
                // Keep the filter applied and drop back to normal navigation.
                return Mode::Normal;
            }
            KeyCode::Up => {
                self.catalog.move_selection(-1);
                return Mode::Searching(state);
            }
            KeyCode::Down => {
                self.catalog.move_selection(1);
                return Mode::Searching(state);
            }
            KeyCode::PageUp => {
                self.catalog.move_selection(-5);
                return Mode::Searching(state);
            }
            KeyCode::PageDown => {
                self.catalog.move_selection(5);
                return Mode::Searching(state);
            }
            KeyCode::Home => {
                self.catalog.select_first();
                return Mode::Searching(state);
            }
            KeyCode::End => {
                self.catalog.select_last();
                return Mode::Searching(state);
            }
            KeyCode::Backspace => {
                state.query.pop();
            }
            KeyCode::Char(ch) => {
                if !ch.is_control() {
                    state.query.push(ch);
                }
            }
            _ => {}
        }

        if state.query.trim().is_empty() {
            self.catalog.set_filter(None);
        } else {
            self.catalog.set_filter(Some(state.query.clone()));
        }

        Mode::Searching(state)
    }

    /// Ctrl+E jumps from an active search straight into the edit form for the
    /// highlighted song, restoring the search when the form closes.
    pub(crate) fn handle_ctrl_e(&mut self) -> Result<()> {
        if !matches!(self.mode, Mode::Searching(_)) {
            return Ok(());
        }

        let previous = mem::replace(&mut self.mode, Mode::Normal);
        if let Mode::Searching(state) = previous {
            self.saved_search = Some(state);
        }

        if let Some(song) = self.catalog.current_song().cloned() {
            self.mode = Mode::EditingSong {
                id: song.id.clone(),
                form: SongForm::from_song(&song),
            };
        } else {
            self.set_status("No song selected to edit.", StatusKind::Error);
        }

        Ok(())
    }

    fn toggle_editor_pick(&mut self, song: &Song) {
        let patch = SongPatch {
            is_editor_pick: Some(!song.is_editor_pick),
            ..SongPatch::default()
        };
        match self.store.update(&song.id, &patch) {
            Ok(()) => {
                self.refresh_catalog();
                let message = if song.is_editor_pick {
                    format!("Removed {} from editor picks.", song.display_title())
                } else {
                    format!("Marked {} as an editor pick.", song.display_title())
                };
                self.set_status(message, StatusKind::Info);
            }
            Err(err) => self.set_status(surface_store_error(&err), StatusKind::Error),
        }
    }

    fn open_song_link(&mut self, song: &Song) {
        match song.primary_link() {
            None => {
                self.set_status("This song does not have a link.", StatusKind::Error);
            }
            Some(link) => {
                if let Err(err) = open_link(link) {
                    self.set_status(format!("Failed to open link: {err}"), StatusKind::Error);
                } else {
                    self.set_status(
                        format!("Opened {}.", song.display_title()),
                        StatusKind::Info,
                    );
                }
            }
        }
    }

    fn perform_undo(&mut self) {
        if self.store.undo() {
            self.refresh_catalog();
            let depth = self.store.undo_depth();
            self.set_status(
                format!("Undo applied. {depth} earlier state(s) remain."),
                StatusKind::Info,
            );
        } else {
            self.set_status("Nothing to undo.", StatusKind::Info);
        }
    }

    fn perform_export(&mut self) {
        let result = default_transfer_path()
            .and_then(|path| export_catalog(self.store.songs(), &path).map(|()| path));
        match result {
            Ok(path) => self.set_status(
                format!("Exported catalog to {}.", path.display()),
                StatusKind::Info,
            ),
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    fn begin_import(&mut self) -> Mode {
        let path = match default_transfer_path() {
            Ok(path) => path,
            Err(err) => {
                self.set_status(surface_error(&err), StatusKind::Error);
                return Mode::Normal;
            }
        };
        match read_import(&path) {
            Ok(songs) => {
                self.clear_status();
                Mode::ConfirmImport(ConfirmImport { songs })
            }
            Err(err) => {
                self.set_status(surface_store_error(&err), StatusKind::Error);
                Mode::Normal
            }
        }
    }

    fn refresh_catalog(&mut self) {
        self.catalog.set_songs(self.store.songs().to_vec());
    }

    fn scroll_detail(&mut self, delta: i32) {
        if let Screen::Detail(detail) = &mut self.screen {
            detail.scroll_by(delta);
        }
    }

    fn set_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Catalog => self.draw_catalog(frame, content_area),
            Screen::Detail(detail) => self.draw_detail(frame, content_area, detail),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::CreatingSong(form) => self.draw_song_form(frame, area, "Create Song", form),
            Mode::EditingSong { form, .. } => self.draw_song_form(frame, area, "Edit Song", form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::ConfirmImport(confirm) => self.draw_confirm_import(frame, area, confirm),
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::Normal => {}
        }
    }

    fn draw_catalog(&self, frame: &mut Frame, area: Rect) {
        let title = if self.catalog.show_only_picks {
            "Catalog • Editor Picks"
        } else {
            "Catalog"
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.catalog.songs.is_empty() {
            let message = Paragraph::new("No songs yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        if self.catalog.filtered_songs.is_empty() {
            let message_text = if self.catalog.show_only_picks {
                "No editor picks match the current view."
            } else {
                "No songs match the current search."
            };
            let message = Paragraph::new(message_text)
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = self
            .catalog
            .filtered_songs
            .iter()
            .map(|song| ListItem::new(catalog_row(song)))
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.catalog.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_detail(&self, frame: &mut Frame, area: Rect, detail: &DetailScreen) {
        let block = Block::default().borders(Borders::ALL).title("Song Detail");

        let song = match self.store.get(&detail.song_id) {
            Some(song) => song,
            None => {
                let message = Paragraph::new("This song no longer exists. Press Esc to go back.")
                    .alignment(Alignment::Center)
                    .block(block);
                frame.render_widget(message, area);
                return;
            }
        };

        let paragraph = Paragraph::new(detail_lines(song))
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((detail.scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let playing_line = if let Some(song) = self.store.selected() {
            Line::from(vec![
                Span::styled("▶ ", Style::default().fg(Color::Cyan)),
                Span::styled(
                    song.display_title(),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
            ])
        } else {
            Line::from(Span::styled(
                "▶ (nothing selected for playback)",
                Style::default().fg(Color::DarkGray),
            ))
        };

        let instructions = self.footer_instructions();

        let paragraph =
            Paragraph::new(vec![status_line, playing_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        match (&self.screen, &self.mode) {
            (_, Mode::Searching(_)) => Line::from(vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Navigate   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Keep Filter   "),
                Span::styled("[Ctrl+E]", key_style),
                Span::raw(" Edit   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Clear"),
            ]),
            (Screen::Detail(_), _) => Line::from(vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Scroll   "),
                Span::styled("[e]", key_style),
                Span::raw(" Edit   "),
                Span::styled("[b]", key_style),
                Span::raw(" Pick   "),
                Span::styled("[o]", key_style),
                Span::raw(" Open   "),
                Span::styled("[Space]", key_style),
                Span::raw(" Play   "),
                Span::styled("[u]", key_style),
                Span::raw(" Undo   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Back   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
            _ => Line::from(vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Select   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Detail   "),
                Span::styled("[f]", key_style),
                Span::raw(" Search   "),
                Span::styled("[k]", key_style),
                Span::raw(" Picks   "),
                Span::styled("[+]", key_style),
                Span::raw(" Add   "),
                Span::styled("[-]", key_style),
                Span::raw(" Delete   "),
                Span::styled("[e]", key_style),
                Span::raw(" Edit   "),
                Span::styled("[Space]", key_style),
                Span::raw(" Play   "),
                Span::styled("[u]", key_style),
                Span::raw(" Undo   "),
                Span::styled("[x]", key_style),
                Span::raw(" Export   "),
                Span::styled("[i]", key_style),
                Span::raw(" Import   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
        }
    }

    fn draw_song_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &SongForm) {
        let mut popup_area = centered_rect(70, 80, area);
        // Fields plus the spacer, hint line, and borders.
        let needed = SongForm::field_count() as u16 + 4;
        if popup_area.height < needed {
            let available = (area.y + area.height).saturating_sub(popup_area.y);
            popup_area.height = needed.min(available);
        }
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = form.build_lines();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • ↑↓ to pick a value • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines);
        frame.render_widget(paragraph, inner);

        let (offset_x, offset_y) = form.cursor_offset();
        if offset_y < inner.height {
            frame.set_cursor_position((inner.x + offset_x, inner.y + offset_y));
        }
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Delete Song").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "Delete '{}' permanently?",
                confirm.song.display_title()
            )),
            Line::from("Undo can still restore it during this session."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_confirm_import(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmImport) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Import Catalog")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "Replace the entire catalog with {} imported songs?",
                confirm.songs.len()
            )),
            Line::from("The current collection is kept on the undo stack."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + state.query.chars().count() as u16;
        let cursor_y = inner.y;
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

/// One list row: pick marker, title, language, release date, and the
/// completeness badge.
fn catalog_row(song: &Song) -> Line<'static> {
    let pick = if song.is_editor_pick {
        Span::styled("★ ", Style::default().fg(Color::Yellow))
    } else {
        Span::raw("  ")
    };

    let mut spans = vec![
        pick,
        Span::styled(
            song.display_title(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];

    if let Some(language) = song.language.as_deref() {
        spans.push(Span::raw(format!("  [{language}]")));
    }
    if let Some(date) = song.release_date.as_deref() {
        spans.push(Span::styled(
            format!("  {date}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    spans.push(Span::raw("  "));
    spans.push(completeness_span(song));

    Line::from(spans)
}

/// Full metadata readout for the detail screen.
fn detail_lines(song: &Song) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        song.display_title(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];

    if song.is_editor_pick {
        lines.push(Line::from(Span::styled(
            "★ Editor Pick",
            Style::default().fg(Color::Yellow),
        )));
    }
    lines.push(Line::from(""));

    let mut push_field = |label: &str, value: &Option<String>| {
        if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            lines.push(Line::from(format!("{label:<14}{value}")));
        }
    };

    push_field("Language:", &song.language);
    push_field("Project:", &song.project_type);
    push_field("Released:", &song.release_date);
    push_field("ISRC:", &song.isrc);
    push_field("UPC:", &song.upc);
    push_field("Spotify ID:", &song.spotify_id);
    push_field("MusicBrainz:", &song.music_brainz_artist_id);
    push_field("Spotify:", &song.spotify_link);
    push_field("YouTube:", &song.youtube_url);
    push_field("YT Music:", &song.youtube_music_url);
    push_field("Apple Music:", &song.apple_music_link);
    push_field("Musixmatch:", &song.musixmatch_url);
    push_field("Cover:", &song.cover_url);

    let missing = song.missing_fields();
    if !missing.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Missing for release: {}", missing.join(", ")),
            Style::default().fg(Color::Yellow),
        )));
    }

    for (heading, text) in [
        ("Description", &song.description),
        ("Credits", &song.credits),
        ("Lyrics", &song.lyrics),
    ] {
        if let Some(text) = text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                heading.to_string(),
                Style::default().add_modifier(Modifier::UNDERLINED),
            )));
            for row in text.lines() {
                lines.push(Line::from(row.to_string()));
            }
        }
    }

    lines
}

/// Millisecond timestamp ids, nudged forward past any id already in use so
/// rapid creation (or a mocked clock) cannot collide.
fn next_song_id(existing: &[Song]) -> String {
    let mut candidate = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0);
    while existing.iter().any(|song| song.id == candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::seed_catalog;

    #[test]
    fn next_song_id_avoids_existing_ids() {
        let songs = seed_catalog();
        let id = next_song_id(&songs);
        assert!(songs.iter().all(|song| song.id != id));
    }

    #[test]
    fn detail_lines_skip_blank_fields() {
        let song = Song {
            id: "x".to_string(),
            title: "極簡".to_string(),
            upc: Some("  ".to_string()),
            ..Song::default()
        };
        let lines = detail_lines(&song);
        let text: Vec<String> = lines
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect::<String>()
            })
            .collect();
        assert!(text.iter().all(|line| !line.contains("UPC")));
        assert!(text.iter().any(|line| line.contains("極簡")));
    }
}
