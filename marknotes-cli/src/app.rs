//! Wiring between the command line and the core library.

use std::io::{self, Read};
use std::path::PathBuf;
use std::rc::Rc;

use marknotes_core::{
    CmarkRenderer, DirectorySink, EditorCoordinator, ExportFormat, Exporter, MarkdownRenderer,
    MarknotesError, MemoryStore, Note, NoteChanges, NotesRepository, Result, SharedStore,
    SqliteStore, SystemClock, Theme, ThemeManager,
};

use crate::cli::{ConfigAction, ConfigKey, ThemeAction};
use crate::settings::{self, AppSettings, STORE_FILE_NAME};

/// Everything a command needs: the opened store and the services built on it.
pub struct App {
    pub settings: AppSettings,
    pub repo: Rc<NotesRepository>,
    pub themes: ThemeManager,
}

impl App {
    /// Opens the store named by `data_dir` (or the settings), or a memory
    /// store when `ephemeral` is set.
    pub fn open(settings: AppSettings, data_dir: Option<PathBuf>, ephemeral: bool) -> Result<Self> {
        let store: SharedStore = if ephemeral {
            log::debug!("Using in-memory store");
            Rc::new(MemoryStore::new())
        } else {
            let path = match data_dir {
                Some(dir) => dir.join(STORE_FILE_NAME),
                None => settings.store_path(),
            };
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            log::debug!("Opening store {}", path.display());
            Rc::new(SqliteStore::open_or_create(&path)?)
        };

        let repo = Rc::new(NotesRepository::load(store.clone()));
        let themes = ThemeManager::new(store, None, settings.prefers_dark);

        Ok(Self { settings, repo, themes })
    }

    /// Builds an editor that exports into `out`, or the configured export
    /// directory.
    pub fn editor(&self, out: Option<PathBuf>) -> EditorCoordinator {
        let dir = out.unwrap_or_else(|| PathBuf::from(&self.settings.export_directory));
        EditorCoordinator::new(
            Rc::clone(&self.repo),
            Rc::new(CmarkRenderer::default()),
            Exporter::new(Box::new(DirectorySink::new(dir))),
            Rc::new(SystemClock),
        )
    }

    /// Finds a note by full id or unique id prefix.
    pub fn resolve(&self, id: &str) -> Result<Note> {
        let notes = self.repo.notes();
        if let Some(note) = notes.iter().find(|n| n.id == id) {
            return Ok(note.clone());
        }
        let mut matches = notes.into_iter().filter(|n| n.id.starts_with(id));
        match (matches.next(), matches.next()) {
            (Some(note), None) if !id.is_empty() => Ok(note),
            _ => Err(MarknotesError::NoteNotFound(id.to_string())),
        }
    }
}

pub fn print_note_line(note: &Note) {
    println!(
        "{}  {:<32}  {}",
        short_id(&note.id),
        note.title,
        note.updated_at.format("%Y-%m-%d %H:%M")
    );
}

pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

pub fn handle_list(app: &App, json: bool) -> Result<()> {
    let notes = app.repo.notes();
    if json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
        return Ok(());
    }
    if notes.is_empty() {
        println!("No notes.");
    }
    for note in &notes {
        print_note_line(note);
    }
    Ok(())
}

pub fn handle_show(app: &App, id: &str) -> Result<()> {
    let note = app.resolve(id)?;
    println!("{}", note.content);
    Ok(())
}

pub fn handle_new(app: &App, title: Option<String>, content: Option<String>, json: bool) -> Result<()> {
    let id = app.repo.add_note();
    let changes = NoteChanges { title, content };
    if !changes.is_empty() {
        app.repo.update_note(&id, changes);
    }
    let note = app.resolve(&id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!("Created note {} ({})", short_id(&note.id), note.title);
    }
    Ok(())
}

pub fn handle_edit(
    app: &App,
    id: &str,
    title: Option<String>,
    content: Option<String>,
    stdin: bool,
) -> Result<()> {
    let note = app.resolve(id)?;
    let content = if stdin {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Some(buf)
    } else {
        content
    };

    let changes = NoteChanges { title, content };
    if changes.is_empty() {
        println!("Nothing to change.");
        return Ok(());
    }
    app.repo.update_note(&note.id, changes);
    println!("Updated note {}", short_id(&note.id));
    Ok(())
}

pub fn handle_delete(app: &App, id: &str) -> Result<()> {
    let note = app.resolve(id)?;
    app.repo.delete_note(&note.id);
    println!("Deleted note {} ({})", short_id(&note.id), note.title);
    Ok(())
}

pub fn handle_preview(app: &App, id: &str) -> Result<()> {
    let note = app.resolve(id)?;
    print!("{}", CmarkRenderer::default().render(&note.content));
    Ok(())
}

pub fn handle_export(app: &App, id: &str, format: ExportFormat, out: Option<PathBuf>) -> Result<()> {
    let note = app.resolve(id)?;
    let mut editor = app.editor(out);
    editor.select_note(&note.id);
    let exported = editor.export_note(format);
    editor.dispose();

    match exported? {
        Some(path) => println!("Exported to {}", path.display()),
        None => println!("Nothing exported."),
    }
    Ok(())
}

pub fn handle_theme(app: &mut App, action: Option<ThemeAction>) -> Result<()> {
    let theme = match action.unwrap_or(ThemeAction::Show) {
        ThemeAction::Show => app.themes.current(),
        ThemeAction::Toggle => app.themes.toggle_theme(),
        ThemeAction::Set { theme } => {
            let theme = Theme::from(theme);
            app.themes.set_theme(theme);
            theme
        }
    };
    println!("{theme}");
    Ok(())
}

pub fn handle_config(action: Option<ConfigAction>) -> std::result::Result<(), String> {
    let mut current = settings::load_settings();
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            println!("# {}", settings::settings_file_path().display());
            let json = serde_json::to_string_pretty(&current).map_err(|e| e.to_string())?;
            println!("{json}");
        }
        ConfigAction::Set { key, value } => {
            match key {
                ConfigKey::DataDirectory => current.data_directory = value,
                ConfigKey::ExportDirectory => current.export_directory = value,
                ConfigKey::PrefersDark => {
                    current.prefers_dark = value
                        .parse()
                        .map_err(|_| format!("Expected true or false, got '{value}'"))?;
                }
            }
            settings::save_settings(&current)?;
            println!("Saved {}", settings::settings_file_path().display());
        }
    }
    Ok(())
}
