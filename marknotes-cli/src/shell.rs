//! Line-oriented editing session driven by [`EditorCoordinator`].
//!
//! Every line is one command. Typed edits go through the coordinator's
//! debounce pipeline; the loop calls `tick` before each command and flushes
//! on exit so nothing typed is lost.

use std::io::{self, BufRead, IsTerminal, Write};

use marknotes_core::{EditorCoordinator, ExportFormat, Result, Theme};

use crate::app::{print_note_line, App};

const HELP: &str = "\
Commands:
  list                 List notes (* marks the selected one)
  select <id>          Select a note by ID or unique ID prefix
  new                  Create and select a new note
  delete               Ask to delete the selected note (answer yes/no)
  title <text>         Change the selected note's title
  content <text>       Replace the selected note's content
  append <text>        Add a line to the selected note's content
  show                 Print the selected note's content
  preview              Toggle the HTML preview
  export <md|pdf>      Export the selected note
  theme [light|dark]   Toggle or set the colour theme
  help                 Show this help
  quit                 Save pending edits and leave";

pub fn run(app: &mut App) -> Result<()> {
    let mut editor = app.editor(None);
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();

    if interactive {
        println!("marknotes shell. Type 'help' for commands.");
    }

    let mut lines = stdin.lock().lines();
    loop {
        editor.tick();
        if interactive {
            print!("{}> ", selected_title(&editor));
            io::stdout().flush()?;
        }

        let Some(line) = lines.next() else { break };
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        if editor.delete_prompt_visible() {
            answer_delete_prompt(&mut editor, command);
            continue;
        }

        match command {
            "quit" | "exit" => break,
            "help" => println!("{HELP}"),
            "list" => {
                let selected = editor.selected().map(|n| n.id);
                for note in app.repo.notes() {
                    let marker = if selected.as_deref() == Some(note.id.as_str()) { "*" } else { " " };
                    print!("{marker} ");
                    print_note_line(&note);
                }
            }
            "select" => match app.resolve(rest) {
                Ok(note) => editor.select_note(&note.id),
                Err(e) => println!("{}", e.user_message()),
            },
            "new" => {
                editor.add_note();
            }
            "delete" => match editor.selected() {
                Some(note) => {
                    editor.toggle_delete_prompt();
                    println!("Delete '{}'? (yes/no)", note.title);
                }
                None => println!("No note selected."),
            },
            "title" => {
                if editor.selected().is_some() {
                    editor.on_title_change(rest);
                } else {
                    println!("No note selected.");
                }
            }
            "content" => {
                if editor.selected().is_some() {
                    editor.on_content_change(unescape(rest));
                } else {
                    println!("No note selected.");
                }
            }
            "append" => match editor.draft_content() {
                Some(draft) => {
                    let line = unescape(rest);
                    let content = if draft.is_empty() { line } else { format!("{draft}\n{line}") };
                    editor.on_content_change(content);
                }
                None => println!("No note selected."),
            },
            "show" => match editor.draft_content() {
                Some(content) => println!("{content}"),
                None => println!("No note selected."),
            },
            "preview" => {
                if editor.toggle_preview() {
                    print!("{}", editor.preview_region().unwrap_or_default());
                } else {
                    println!("Preview hidden.");
                }
            }
            "export" => export(&mut editor, rest),
            "theme" => theme(app, rest),
            other => println!("Unknown command '{other}'. Type 'help' for commands."),
        }
    }

    editor.flush();
    editor.dispose();
    Ok(())
}

fn selected_title(editor: &EditorCoordinator) -> String {
    editor.selected().map(|n| n.title).unwrap_or_default()
}

fn answer_delete_prompt(editor: &mut EditorCoordinator, answer: &str) {
    match (answer, editor.selected()) {
        ("yes" | "y", Some(note)) => {
            editor.delete_note(&note.id);
            println!("Deleted '{}'.", note.title);
        }
        _ => {
            editor.toggle_delete_prompt();
            println!("Kept.");
        }
    }
}

fn export(editor: &mut EditorCoordinator, arg: &str) {
    let format = if arg.is_empty() { Ok(ExportFormat::Markdown) } else { arg.parse::<ExportFormat>() };
    let format = match format {
        Ok(format) => format,
        Err(e) => {
            println!("{e}");
            return;
        }
    };

    editor.toggle_export_menu();
    match editor.export_note(format) {
        Ok(Some(path)) => println!("Exported to {}", path.display()),
        Ok(None) => println!("Nothing exported."),
        Err(e) => println!("{}", e.user_message()),
    }
}

fn theme(app: &mut App, arg: &str) {
    let theme = match arg {
        "" => app.themes.toggle_theme(),
        other => match other.parse::<Theme>() {
            Ok(theme) => {
                app.themes.set_theme(theme);
                theme
            }
            Err(e) => {
                println!("{e}");
                return;
            }
        },
    };
    println!("Theme: {theme}");
}

/// Turns a literal `\n` typed on one line into a newline.
fn unescape(text: &str) -> String {
    text.replace("\\n", "\n")
}
