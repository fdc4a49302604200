//! The form engine: one owner for the catalog, the resolved metadata, the
//! configuration and the live inputs of a form.
//!
//! Every mutation runs to completion on `&mut self` and persists the whole
//! configuration before returning, so saves never overlap. Host events
//! (catalog or option changes) can arrive at any time through a
//! [`HostNotifier`], including from inside a store or catalog call; they are
//! queued and applied once the operation in progress has finished.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::{
    catalog::ColumnCatalog,
    conditional,
    data::{self, InputValue},
    element::{Conditional, FieldElement, FormConfig, FormElement, StaticKind},
    error::EngineError,
    input::{InputState, LiveInputs},
    metadata::{self, CatalogMetadata},
    options::OptionStore,
    persistence::{self, LoadOutcome},
    reorder::DropHalf,
    submit::{RecordFields, RecordSink},
    validation::{self, ValidationReport},
    view::{self, EditorRow, FormNode},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    CatalogChanged,
    OptionsChanged,
}

/// Cloneable handle the host uses to push events into an engine.
#[derive(Debug, Clone, Default)]
pub struct HostNotifier {
    queue: Rc<RefCell<VecDeque<HostEvent>>>,
}

impl HostNotifier {
    /// Queues `event`; an identical event already waiting absorbs it.
    pub fn notify(&self, event: HostEvent) {
        let mut queue = self.queue.borrow_mut();
        if !queue.contains(&event) {
            queue.push_back(event);
        }
    }

    pub fn catalog_changed(&self) {
        self.notify(HostEvent::CatalogChanged);
    }

    pub fn options_changed(&self) {
        self.notify(HostEvent::OptionsChanged);
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    fn pop(&self) -> Option<HostEvent> {
        self.queue.borrow_mut().pop_front()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created { row_id: u64, fields: RecordFields },
    Invalid(ValidationReport),
    Rejected { message: String },
}

pub struct FormEngine<C, S> {
    catalog: C,
    store: S,
    columns: Vec<String>,
    metadata: CatalogMetadata,
    config: FormConfig,
    inputs: InputState,
    visible: Vec<bool>,
    notifier: HostNotifier,
    revision: u64,
    last_load: LoadOutcome,
}

impl<C: ColumnCatalog, S: OptionStore> FormEngine<C, S> {
    pub fn open(catalog: C, store: S) -> Result<Self, EngineError> {
        let mut engine = Self {
            catalog,
            store,
            columns: Vec::new(),
            metadata: CatalogMetadata::default(),
            config: FormConfig::default(),
            inputs: InputState::new(),
            visible: Vec::new(),
            notifier: HostNotifier::default(),
            revision: 0,
            last_load: LoadOutcome::Loaded,
        };
        engine.refresh_catalog()?;
        engine.reload()?;
        engine.drain_events()?;
        Ok(engine)
    }

    pub fn notifier(&self) -> HostNotifier {
        self.notifier.clone()
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn metadata(&self) -> &CatalogMetadata {
        &self.metadata
    }

    pub fn inputs(&self) -> &InputState {
        &self.inputs
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn last_load(&self) -> &LoadOutcome {
        &self.last_load
    }

    pub fn available_columns(&self) -> Vec<String> {
        self.config.available_columns(&self.columns)
    }

    pub fn add_field(&mut self, column_id: &str) -> Result<(), EngineError> {
        self.config.add_field(column_id, &self.columns)?;
        let shape = self.metadata.get_or_plain(column_id).shape();
        self.inputs.reset(column_id, shape);
        info!("Added field for column '{column_id}'");
        self.commit()
    }

    pub fn add_static(&mut self, kind: StaticKind, content: &str) -> Result<(), EngineError> {
        self.config.add_static(kind, content)?;
        self.commit()
    }

    /// Removes an element. Rules targeting a removed field are left in
    /// place and fail open.
    pub fn remove_at(&mut self, index: usize) -> Result<FormElement, EngineError> {
        let removed = self.config.remove_at(index)?;
        if let FormElement::Field(field) = &removed {
            self.inputs.remove(&field.field_name);
        }
        self.commit()?;
        Ok(removed)
    }

    pub fn update_label(&mut self, index: usize, label: &str) -> Result<bool, EngineError> {
        let changed = self.config.update_label(index, label);
        self.commit_if(changed)
    }

    pub fn update_content(&mut self, index: usize, content: &str) -> Result<bool, EngineError> {
        let changed = self.config.update_content(index, content);
        self.commit_if(changed)
    }

    pub fn set_required(&mut self, index: usize, required: bool) -> Result<bool, EngineError> {
        let changed = self.config.set_required(index, required);
        self.commit_if(changed)
    }

    pub fn toggle_required(&mut self, index: usize) -> Result<bool, EngineError> {
        let changed = self.config.toggle_required(index);
        self.commit_if(changed)
    }

    pub fn set_max_length(
        &mut self,
        index: usize,
        max_length: Option<u32>,
    ) -> Result<bool, EngineError> {
        let Some(shape) = self
            .config
            .field_at(index)
            .map(|field| self.metadata.get_or_plain(&field.field_name).shape())
        else {
            return Ok(false);
        };
        let changed = self.config.set_max_length(index, max_length, shape);
        self.commit_if(changed)
    }

    pub fn set_conditional(
        &mut self,
        index: usize,
        rule: Option<Conditional>,
    ) -> Result<bool, EngineError> {
        let changed = self.config.set_conditional(index, rule);
        self.commit_if(changed)
    }

    pub fn reorder(&mut self, from: usize, to: usize, half: DropHalf) -> Result<bool, EngineError> {
        let changed = self.config.reorder(from, to, half);
        self.commit_if(changed)
    }

    /// Fields the rule editor may offer as a target for element `index`.
    pub fn conditional_targets(&self, index: usize) -> Vec<&FieldElement> {
        conditional::conditional_targets(&self.config, &self.metadata, index)
    }

    pub fn conditional_values(&self, column_id: &str) -> Vec<(String, String)> {
        conditional::conditional_values(&self.metadata, column_id)
    }

    pub fn set_input(&mut self, column_id: &str, value: InputValue) {
        self.inputs.set(column_id, value);
        self.refresh_all();
    }

    /// Applies a textual assignment interpreted through the column's shape.
    pub fn assign_input(&mut self, column_id: &str, raw: &str) -> Result<()> {
        let shape = self.metadata.get_or_plain(column_id).shape();
        self.inputs.assign(column_id, raw, shape)?;
        self.refresh_all();
        Ok(())
    }

    pub fn refresh_all(&mut self) -> &[bool] {
        self.visible = conditional::visibility(&self.config, &self.metadata, &self.inputs);
        &self.visible
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.get(index).copied().unwrap_or(false)
    }

    pub fn should_show(&self, field: &FieldElement) -> bool {
        conditional::should_show(field, &self.config, &self.metadata, &self.inputs)
    }

    pub fn validate(&self) -> ValidationReport {
        validation::validate_form(&self.config, &self.metadata, &self.inputs)
    }

    pub fn collect_record(&self) -> RecordFields {
        self.config
            .fields()
            .filter(|(_, field)| self.should_show(field))
            .map(|(_, field)| {
                let meta = self.metadata.get_or_plain(&field.field_name);
                let value = data::extract_value(meta, self.inputs.current_value(&field.field_name));
                (field.field_name.clone(), value)
            })
            .collect()
    }

    /// Validates, submits one record and resets the inputs on success.
    pub fn submit(&mut self, sink: &mut dyn RecordSink) -> SubmitOutcome {
        let report = self.validate();
        if !report.is_valid() {
            debug!(
                "Submission blocked by {} invalid field(s)",
                report.failures.len()
            );
            return SubmitOutcome::Invalid(report);
        }
        let fields = self.collect_record();
        match sink.create_record(&fields) {
            Ok(row_id) => {
                info!("Created record {row_id} with {} field(s)", fields.len());
                self.reset_inputs();
                SubmitOutcome::Created { row_id, fields }
            }
            Err(err) => {
                warn!("Record creation failed: {err:#}");
                SubmitOutcome::Rejected {
                    message: format!("{err:#}"),
                }
            }
        }
    }

    pub fn reset_inputs(&mut self) {
        for (_, field) in self.config.fields() {
            let shape = self.metadata.get_or_plain(&field.field_name).shape();
            self.inputs.reset(&field.field_name, shape);
        }
        self.refresh_all();
        self.revision += 1;
    }

    pub fn form_view(&self) -> Vec<FormNode> {
        view::form_view(&self.config, &self.metadata, &self.visible)
    }

    pub fn editor_rows(&self) -> Vec<EditorRow> {
        view::editor_rows(&self.config, &self.metadata)
    }

    /// Host entry point for a catalog change; applied once nothing else runs.
    pub fn notify_catalog_changed(&mut self) -> Result<(), EngineError> {
        self.notifier.catalog_changed();
        self.drain_events()
    }

    pub fn notify_options_changed(&mut self) -> Result<(), EngineError> {
        self.notifier.options_changed();
        self.drain_events()
    }

    fn commit_if(&mut self, changed: bool) -> Result<bool, EngineError> {
        if changed {
            self.commit()?;
        }
        Ok(changed)
    }

    fn commit(&mut self) -> Result<(), EngineError> {
        let saved = persistence::save(&self.store, &self.config);
        self.refresh_all();
        self.revision += 1;
        saved.map_err(EngineError::Persist)?;
        self.drain_events()
    }

    fn drain_events(&mut self) -> Result<(), EngineError> {
        while let Some(event) = self.notifier.pop() {
            debug!("Applying host event {event:?}");
            match event {
                HostEvent::CatalogChanged => {
                    self.refresh_catalog()?;
                    self.reconcile()?;
                }
                HostEvent::OptionsChanged => self.reload()?,
            }
        }
        Ok(())
    }

    fn refresh_catalog(&mut self) -> Result<(), EngineError> {
        self.columns = self
            .catalog
            .list_columns()
            .context("Listing catalog columns")
            .map_err(EngineError::Catalog)?;
        self.metadata = metadata::resolve_metadata(&self.catalog).unwrap_or_else(|err| {
            warn!("Column metadata unavailable; treating every column as text: {err:#}");
            CatalogMetadata::default()
        });
        debug!(
            "Catalog offers {} column(s), metadata for {}",
            self.columns.len(),
            self.metadata.len()
        );
        Ok(())
    }

    fn reload(&mut self) -> Result<(), EngineError> {
        let stored = persistence::read_stored(&self.store).map_err(EngineError::Load)?;
        let loaded = persistence::resolve(&self.store, stored, &self.columns)
            .map_err(EngineError::Persist)?;
        if loaded.recovered {
            warn!("Stored form configuration was unreadable and has been rebuilt");
        }
        self.config = loaded.config;
        self.last_load = loaded.outcome;
        self.refresh_all();
        self.revision += 1;
        Ok(())
    }

    fn reconcile(&mut self) -> Result<(), EngineError> {
        let added = persistence::reconcile(&mut self.config, &self.columns);
        if added.is_empty() {
            self.refresh_all();
            self.revision += 1;
            return Ok(());
        }
        info!("Catalog change added field(s): {}", added.join(", "));
        self.last_load = LoadOutcome::Migrated { added };
        let saved = persistence::save(&self.store, &self.config);
        self.refresh_all();
        self.revision += 1;
        saved.map_err(EngineError::Persist)
    }
}
