pub mod catalog;
pub mod cli;
pub mod conditional;
pub mod data;
pub mod document;
pub mod element;
pub mod engine;
pub mod error;
pub mod input;
pub mod metadata;
pub mod options;
pub mod persistence;
pub mod reorder;
pub mod submit;
pub mod table;
pub mod validation;
pub mod view;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, ElementKindArg, HostArgs},
    document::Document,
    element::{Conditional, StaticKind},
    engine::{FormEngine, SubmitOutcome},
    error::FormError,
    options::JsonFileOptionStore,
    persistence::LoadOutcome,
    submit::CsvRecordSink,
};

type LocalEngine = FormEngine<Document, JsonFileOptionStore>;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("tabform", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Columns(args) => handle_columns(&args),
        Commands::Show(args) => handle_show(&args),
        Commands::Add(args) => handle_add(&args),
        Commands::Remove(args) => {
            let mut engine = open_engine(&args.host)?;
            let removed = engine.remove_at(args.index)?;
            info!("Removed {} element at index {}", removed.kind(), args.index);
            Ok(())
        }
        Commands::Label(args) => {
            let mut engine = open_engine(&args.host)?;
            require_field(&engine, args.index)?;
            let changed = engine.update_label(args.index, &args.text)?;
            report_change(changed, args.index);
            Ok(())
        }
        Commands::Content(args) => handle_content(&args),
        Commands::Required(args) => {
            let mut engine = open_engine(&args.host)?;
            require_field(&engine, args.index)?;
            let changed = engine.set_required(args.index, args.state)?;
            report_change(changed, args.index);
            Ok(())
        }
        Commands::MaxLength(args) => handle_max_length(&args),
        Commands::Conditional(args) => handle_conditional(&args),
        Commands::Move(args) => handle_move(&args),
        Commands::Form(args) => handle_form(&args),
        Commands::Submit(args) => handle_submit(&args),
    }
}

fn open_engine(host: &HostArgs) -> Result<LocalEngine> {
    let document = Document::load(&host.document)
        .with_context(|| format!("Loading document {:?}", host.document))?;
    debug!("Bound to table '{}'", document.table);
    let store = JsonFileOptionStore::new(&host.options);
    let engine = FormEngine::open(document, store)
        .with_context(|| format!("Opening form configuration {:?}", host.options))?;
    match engine.last_load() {
        LoadOutcome::Loaded => {}
        LoadOutcome::Bootstrapped => info!(
            "Created a form with {} field(s) in {:?}",
            engine.config().len(),
            host.options
        ),
        LoadOutcome::Migrated { added } => {
            info!("Form now includes new column(s): {}", added.join(", "))
        }
    }
    Ok(engine)
}

fn require_field(engine: &LocalEngine, index: usize) -> Result<()> {
    let len = engine.config().len();
    match engine.config().get(index) {
        None => Err(FormError::IndexOutOfRange { index, len }.into()),
        Some(element) if element.as_field().is_none() => {
            bail!("Element {index} is a {}, not a field", element.kind())
        }
        Some(_) => Ok(()),
    }
}

fn report_change(changed: bool, index: usize) {
    if changed {
        info!("Updated element {index}");
    } else {
        info!("Element {index} left unchanged");
    }
}

fn handle_columns(args: &HostArgs) -> Result<()> {
    let engine = open_engine(args)?;
    let rows = engine
        .columns()
        .iter()
        .map(|column| {
            let meta = engine.metadata().get_or_plain(column);
            vec![
                column.clone(),
                meta.type_tag.clone(),
                meta.shape().to_string(),
                meta.options().len().to_string(),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&["Column", "Type", "Input", "Choices"], &rows);
    Ok(())
}

fn handle_show(args: &HostArgs) -> Result<()> {
    let engine = open_engine(args)?;
    if engine.config().is_empty() {
        info!("The form has no elements");
        return Ok(());
    }
    print!("{}", view::render_editor(&engine.editor_rows()));
    Ok(())
}

fn handle_add(args: &cli::AddArgs) -> Result<()> {
    let mut engine = open_engine(&args.host)?;
    let value = args.value.as_deref().unwrap_or_default();
    match args.kind {
        ElementKindArg::Field => {
            if value.is_empty() {
                let available = engine.available_columns();
                if available.is_empty() {
                    bail!("Every column already has a field");
                }
                bail!("Name the column to add; available: {}", available.join(", "));
            }
            engine.add_field(value)?;
        }
        ElementKindArg::Separator => engine.add_static(StaticKind::Separator, "")?,
        ElementKindArg::Title => engine.add_static(StaticKind::Title, value)?,
        ElementKindArg::Text => engine.add_static(StaticKind::Text, value)?,
    }
    info!(
        "Form has {} element(s) after adding a {:?} element",
        engine.config().len(),
        args.kind
    );
    Ok(())
}

fn handle_content(args: &cli::EditTextArgs) -> Result<()> {
    let mut engine = open_engine(&args.host)?;
    let len = engine.config().len();
    let Some(element) = engine.config().get(args.index) else {
        return Err(FormError::IndexOutOfRange {
            index: args.index,
            len,
        }
        .into());
    };
    if element.as_field().is_some() {
        bail!("Element {} is a field; use the label command", args.index);
    }
    let changed = engine.update_content(args.index, &args.text)?;
    report_change(changed, args.index);
    Ok(())
}

fn handle_max_length(args: &cli::MaxLengthArgs) -> Result<()> {
    let mut engine = open_engine(&args.host)?;
    require_field(&engine, args.index)?;
    let changed = engine.set_max_length(args.index, args.value)?;
    if !changed
        && let Some(field) = engine.config().field_at(args.index)
        && !engine
            .metadata()
            .get_or_plain(&field.field_name)
            .shape()
            .accepts_max_length()
    {
        bail!("Column '{}' does not take a maximum length", field.field_name);
    }
    report_change(changed, args.index);
    Ok(())
}

fn handle_conditional(args: &cli::ConditionalArgs) -> Result<()> {
    let mut engine = open_engine(&args.host)?;
    require_field(&engine, args.index)?;
    let rule = match (&args.field, &args.value) {
        (Some(field), Some(value)) => {
            let targets = engine
                .conditional_targets(args.index)
                .iter()
                .map(|target| target.field_name.clone())
                .collect::<Vec<_>>();
            if !targets.contains(field) {
                bail!(
                    "Field '{field}' cannot drive a condition here; candidates: {}",
                    targets.join(", ")
                );
            }
            let values = engine.conditional_values(field);
            if !values.iter().any(|(candidate, _)| candidate == value) {
                let listed = values
                    .iter()
                    .map(|(candidate, _)| candidate.as_str())
                    .collect::<Vec<_>>();
                bail!(
                    "Value '{value}' is not an option of '{field}'; options: {}",
                    listed.join(", ")
                );
            }
            Some(Conditional::new(field.as_str(), value.as_str()))
        }
        _ => None,
    };
    let changed = engine.set_conditional(args.index, rule)?;
    report_change(changed, args.index);
    Ok(())
}

fn handle_move(args: &cli::MoveArgs) -> Result<()> {
    let mut engine = open_engine(&args.host)?;
    let len = engine.config().len();
    for index in [args.from, args.to] {
        if index >= len {
            return Err(FormError::IndexOutOfRange { index, len }.into());
        }
    }
    if engine.reorder(args.from, args.to, args.half.into())? {
        info!(
            "Moved element {} onto the {:?} half of element {}",
            args.from, args.half, args.to
        );
    } else {
        info!("Drop leaves the order unchanged");
    }
    Ok(())
}

fn prepare_form(args: &cli::FormArgs) -> Result<LocalEngine> {
    let mut engine = open_engine(&args.host)?;
    for (column, raw) in &args.set {
        if engine.config().field_by_column(column).is_none() {
            bail!("Column '{column}' has no field on the form");
        }
        engine.assign_input(column, raw)?;
    }
    Ok(engine)
}

fn handle_form(args: &cli::FormArgs) -> Result<()> {
    let engine = prepare_form(args)?;
    print!(
        "{}",
        view::render_form(&engine.form_view(), engine.inputs(), None)
    );
    Ok(())
}

fn handle_submit(args: &cli::SubmitArgs) -> Result<()> {
    let mut engine = prepare_form(&args.form)?;
    let mut sink = CsvRecordSink::new(&args.records, engine.columns().to_vec());
    match engine.submit(&mut sink) {
        SubmitOutcome::Created { row_id, fields } => {
            println!("Created record {row_id} with {} value(s)", fields.len());
            Ok(())
        }
        SubmitOutcome::Invalid(report) => {
            if let Some(summary) = report.summary() {
                eprintln!("{summary}");
            }
            for failure in &report.failures {
                eprintln!("  {}: {}", failure.label, failure.failure);
            }
            bail!("{} field(s) failed validation", report.failures.len())
        }
        SubmitOutcome::Rejected { message } => {
            bail!("Record was not created: {message}")
        }
    }
}
