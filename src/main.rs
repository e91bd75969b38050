use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{CommandFactory, Parser, Subcommand};
use inquire::{Confirm, DateSelect, InquireError, Select, Text};

use invoice_composer::artifact::{ArtifactError, PDF_NOT_IMPLEMENTED_NOTICE, PdfPlaceholder};
use invoice_composer::config::{self, AppSettings};
use invoice_composer::export::{self, DialogSink, DirectorySink, FileSink};
use invoice_composer::render::Renderer;
use invoice_composer::{
    DisplayMode, InvoiceEditor, ItemField, PartyField, PartySide, Result, logging,
};

// ==========================================
// Structs & Enums
// ==========================================

#[derive(Parser)]
#[command(name = "invoice-composer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose a new invoice
    New,
    /// Continue editing a saved invoice
    Open {
        /// Exported invoice JSON
        file: PathBuf,
    },
    /// Print a saved invoice as the client would see it
    Preview {
        /// Exported invoice JSON
        file: PathBuf,
    },
    /// Configure data directory
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    EditHeader,
    EditFrom,
    EditTo,
    AddItem,
    EditItem,
    RemoveItem,
    EditNotes,
    ToggleMode(DisplayMode),
    Save,
    GeneratePdf,
    Quit,
}

impl Action {
    fn available(mode: DisplayMode) -> Vec<Action> {
        let mut actions = Vec::new();
        if mode == DisplayMode::Edit {
            actions.extend([
                Action::EditHeader,
                Action::EditFrom,
                Action::EditTo,
                Action::AddItem,
                Action::EditItem,
                Action::RemoveItem,
                Action::EditNotes,
            ]);
        }
        actions.extend([
            Action::ToggleMode(mode.toggled()),
            Action::Save,
            Action::GeneratePdf,
            Action::Quit,
        ]);
        actions
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::EditHeader => "Edit Invoice Number / Dates",
            Action::EditFrom => "Edit From",
            Action::EditTo => "Edit To",
            Action::AddItem => "➕ Add Item",
            Action::EditItem => "Edit Item",
            Action::RemoveItem => "🗑  Remove Item",
            Action::EditNotes => "Edit Notes",
            Action::ToggleMode(DisplayMode::Preview) => "👁  Preview",
            Action::ToggleMode(DisplayMode::Edit) => "✏️  Edit",
            Action::Save => "💾 Save",
            Action::GeneratePdf => "📄 Generate PDF",
            Action::Quit => "Quit",
        };
        f.write_str(label)
    }
}

/// Select entry pointing at one line item.
struct ItemChoice {
    id: String,
    label: String,
}

impl fmt::Display for ItemChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

// ==========================================
// Main Function
// ==========================================

fn main() {
    logging::init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::New => {
            let Some(settings) = settings_or_wizard()? else {
                return Ok(());
            };
            let sender = config::load_sender(&settings.root())?;
            let editor = InvoiceEditor::starting_on(Local::now().date_naive(), sender);
            run_session(editor, &settings)
        }
        Commands::Open { file } => {
            let Some(settings) = settings_or_wizard()? else {
                return Ok(());
            };
            let document = export::load(&file)?;
            println!("✅ Opened: {}", file.display());
            run_session(InvoiceEditor::with_document(document), &settings)
        }
        Commands::Preview { file } => {
            let document = export::load(&file)?;
            println!("{}", Renderer::terminal().render(&document, DisplayMode::Preview));
            Ok(())
        }
        Commands::Config => {
            setup_config_wizard(&config::config_path()?)?;
            Ok(())
        }
    }
}

// ==========================================
// 1. Editing Session
// ==========================================

fn run_session(mut editor: InvoiceEditor, settings: &AppSettings) -> Result<()> {
    let renderer = Renderer::terminal();

    loop {
        println!("{}", renderer.render(editor.document(), editor.mode()));

        let Some(action) = ask(Select::new("What next?", Action::available(editor.mode())).prompt())? else {
            break;
        };

        match action {
            Action::EditHeader => edit_header(&mut editor)?,
            Action::EditFrom => edit_party(&mut editor, PartySide::From)?,
            Action::EditTo => edit_party(&mut editor, PartySide::To)?,
            Action::AddItem => {
                let id = editor.add_item();
                edit_item_fields(&mut editor, &id)?;
            }
            Action::EditItem => {
                if let Some(id) = pick_item(&editor, "Select Item to Edit:")? {
                    edit_item_fields(&mut editor, &id)?;
                }
            }
            Action::RemoveItem => {
                if let Some(id) = pick_item(&editor, "Select Item to Remove:")? {
                    editor.remove_item(&id);
                }
            }
            Action::EditNotes => {
                if let Some(notes) = ask_multiline("Notes:", &editor.document().notes)? {
                    editor.set_notes(notes);
                }
            }
            Action::ToggleMode(mode) => editor.set_mode(mode),
            Action::Save => {
                let mut sink = sink_for(settings);
                editor.export_document(sink.as_mut())?;
            }
            Action::GeneratePdf => match editor.generate_artifact(&PdfPlaceholder) {
                Ok(artifact) => sink_for(settings).save(&artifact.bytes, &artifact.filename),
                Err(ArtifactError::NotImplemented { .. }) => {
                    println!("\n🚧 {}\n", PDF_NOT_IMPLEMENTED_NOTICE);
                }
            },
            Action::Quit => {
                let leave = Confirm::new("Quit? Unsaved changes are lost.")
                    .with_default(false)
                    .prompt();
                if ask(leave)?.unwrap_or(false) {
                    break;
                }
            }
        }
    }
    Ok(())
}

fn sink_for(settings: &AppSettings) -> Box<dyn FileSink> {
    if settings.save_dialog {
        Box::new(DialogSink::new(settings.output_dir()))
    } else {
        Box::new(DirectorySink::new(settings.output_dir()))
    }
}

/// Cancelled prompts become `None`; anything else is a real error.
fn ask<T>(answer: std::result::Result<T, InquireError>) -> Result<Option<T>> {
    match answer {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ==========================================
// 2. Data Entry Helpers
// ==========================================

fn edit_header(editor: &mut InvoiceEditor) -> Result<()> {
    let options = vec!["Invoice Number", "Date", "Due Date"];
    let Some(choice) = ask(Select::new("Field:", options).prompt())? else {
        return Ok(());
    };

    let doc = editor.document();
    match choice {
        "Invoice Number" => {
            let answer = Text::new("Invoice Number:")
                .with_initial_value(&doc.invoice_number)
                .prompt();
            if let Some(number) = ask(answer)? {
                editor.set_invoice_number(number);
            }
        }
        "Date" => {
            let answer = DateSelect::new("Invoice Date:").with_default(doc.date).prompt();
            if let Some(date) = ask(answer)? {
                editor.set_issue_date(date);
            }
        }
        _ => {
            let answer = DateSelect::new("Due Date:").with_default(doc.due_date).prompt();
            if let Some(date) = ask(answer)? {
                editor.set_due_date(date);
            }
        }
    }
    Ok(())
}

fn edit_party(editor: &mut InvoiceEditor, side: PartySide) -> Result<()> {
    let title = match side {
        PartySide::From => "From:",
        PartySide::To => "To:",
    };
    println!("\n--- Editing {} (Esc to finish) ---", title);

    loop {
        let Some(field) = ask(Select::new("Field:", PartyField::ALL.to_vec()).prompt())? else {
            return Ok(());
        };
        let current = editor.document().party(side).get(field).to_string();
        let answer = Text::new(&format!("{}:", field))
            .with_initial_value(&current)
            .prompt();
        if let Some(value) = ask(answer)? {
            editor.set_party_field(side, field, value);
        }
    }
}

fn pick_item(editor: &InvoiceEditor, prompt: &str) -> Result<Option<String>> {
    let choices: Vec<ItemChoice> = editor
        .document()
        .items()
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let first_line = item.description.lines().next().unwrap_or("");
            let description = if first_line.is_empty() { "(no description)" } else { first_line };
            ItemChoice {
                id: item.id.clone(),
                label: format!("#{} {} | ${:.2}", idx + 1, description, item.amount()),
            }
        })
        .collect();

    if choices.is_empty() {
        println!("❌ No items on this invoice.");
        return Ok(None);
    }

    Ok(ask(Select::new(prompt, choices).prompt())?.map(|choice| choice.id))
}

fn edit_item_fields(editor: &mut InvoiceEditor, id: &str) -> Result<()> {
    println!("💡 Tip: Use '\\n' for new lines. Esc skips a field.");

    for field in ItemField::ALL {
        let Some(item) = editor.document().item(id) else {
            return Ok(());
        };
        let value = match field {
            ItemField::Description => ask_multiline("Description:", &item.description)?,
            ItemField::Quantity => ask(
                Text::new("Quantity:")
                    .with_initial_value(&item.quantity().to_string())
                    .prompt(),
            )?,
            ItemField::Rate => ask(
                Text::new("Rate ($):")
                    .with_initial_value(&item.rate().to_string())
                    .prompt(),
            )?,
        };
        if let Some(value) = value {
            editor.update_item(id, field, &value);
        }
    }
    Ok(())
}

/// Single-line prompt where a literal `\n` stands for a line break.
fn ask_multiline(prompt: &str, current: &str) -> Result<Option<String>> {
    let escaped = current.replace('\n', "\\n");
    let answer = Text::new(prompt).with_initial_value(&escaped).prompt();
    Ok(ask(answer)?.map(|text| text.replace("\\n", "\n")))
}

// ==========================================
// 3. Config
// ==========================================

fn settings_or_wizard() -> Result<Option<AppSettings>> {
    let path = config::config_path()?;
    match config::load_settings(&path)? {
        Some(settings) => Ok(Some(settings)),
        None => setup_config_wizard(&path),
    }
}

/// `Ok(None)` when the user backs out; nothing is saved then.
fn setup_config_wizard(path: &Path) -> Result<Option<AppSettings>> {
    println!("\n⚙️  --- Configuration Setup ---");
    let current = config::load_settings(path)?.unwrap_or_default();

    println!("📂 Opening folder picker...");
    let picked_path = rfd::FileDialog::new()
        .set_title("Select Root Data Directory")
        .pick_folder();

    let data_root = if let Some(path) = picked_path {
        path.to_string_lossy().to_string()
    } else {
        println!("❌ No folder selected. Falling back to manual input.");
        let answer = Text::new("Enter Root Data Directory:")
            .with_default(&current.data_root)
            .prompt();
        match ask(answer)? {
            Some(root) => root,
            None => return Ok(cancelled_config()),
        }
    };

    let answer = Confirm::new("Ask where to save each invoice?")
        .with_default(current.save_dialog)
        .prompt();
    let Some(save_dialog) = ask(answer)? else {
        return Ok(cancelled_config());
    };

    let settings = AppSettings { data_root, save_dialog };
    config::save_settings(path, &settings)?;
    println!("✅ Settings saved.");
    Ok(Some(settings))
}

fn cancelled_config() -> Option<AppSettings> {
    println!("Cancelled. Settings unchanged.");
    None
}
