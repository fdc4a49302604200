use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    data::InputShape,
    error::FormError,
    reorder::{self, DropHalf},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conditional {
    pub field: String,
    pub value: String,
}

impl Conditional {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FieldElement {
    pub field_name: String,
    #[serde(default)]
    pub field_label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub conditional: Option<Conditional>,
}

impl FieldElement {
    pub fn for_column(column_id: impl Into<String>) -> Self {
        let field_name = column_id.into();
        Self {
            field_label: field_name.clone(),
            field_name,
            required: false,
            max_length: None,
            conditional: None,
        }
    }

    pub fn label(&self) -> &str {
        if self.field_label.is_empty() {
            &self.field_name
        } else {
            &self.field_label
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FormElement {
    Field(FieldElement),
    Separator {},
    Title { content: String },
    Text { content: String },
}

impl FormElement {
    pub fn field(column_id: impl Into<String>) -> Self {
        FormElement::Field(FieldElement::for_column(column_id))
    }

    pub fn separator() -> Self {
        FormElement::Separator {}
    }

    pub fn title(content: impl Into<String>) -> Self {
        FormElement::Title {
            content: content.into(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        FormElement::Text {
            content: content.into(),
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            FormElement::Field(_) => ElementKind::Field,
            FormElement::Separator {} => ElementKind::Separator,
            FormElement::Title { .. } => ElementKind::Title,
            FormElement::Text { .. } => ElementKind::Text,
        }
    }

    pub fn as_field(&self) -> Option<&FieldElement> {
        match self {
            FormElement::Field(field) => Some(field),
            _ => None,
        }
    }

    pub fn as_field_mut(&mut self) -> Option<&mut FieldElement> {
        match self {
            FormElement::Field(field) => Some(field),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Field,
    Separator,
    Title,
    Text,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Field => "field",
            ElementKind::Separator => "separator",
            ElementKind::Title => "title",
            ElementKind::Text => "text",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticKind {
    Separator,
    Title,
    Text,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormConfig {
    elements: Vec<FormElement>,
}

impl FormConfig {
    pub fn new(elements: Vec<FormElement>) -> Self {
        Self { elements }
    }

    pub fn bootstrap(columns: &[String]) -> Self {
        Self::new(columns.iter().map(FormElement::field).collect())
    }

    pub fn elements(&self) -> &[FormElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FormElement> {
        self.elements.get(index)
    }

    pub fn field_at(&self, index: usize) -> Option<&FieldElement> {
        self.elements.get(index).and_then(FormElement::as_field)
    }

    fn field_at_mut(&mut self, index: usize) -> Option<&mut FieldElement> {
        self.elements
            .get_mut(index)
            .and_then(FormElement::as_field_mut)
    }

    pub fn fields(&self) -> impl Iterator<Item = (usize, &FieldElement)> {
        self.elements
            .iter()
            .enumerate()
            .filter_map(|(idx, element)| element.as_field().map(|field| (idx, field)))
    }

    pub fn field_by_column(&self, column_id: &str) -> Option<&FieldElement> {
        self.fields()
            .map(|(_, field)| field)
            .find(|field| field.field_name == column_id)
    }

    pub fn used_columns(&self) -> BTreeSet<&str> {
        self.fields()
            .map(|(_, field)| field.field_name.as_str())
            .collect()
    }

    pub fn available_columns(&self, catalog_columns: &[String]) -> Vec<String> {
        let used = self.used_columns();
        catalog_columns
            .iter()
            .filter(|column| !used.contains(column.as_str()))
            .cloned()
            .collect()
    }

    pub fn add_field(
        &mut self,
        column_id: &str,
        catalog_columns: &[String],
    ) -> Result<(), FormError> {
        if !catalog_columns.iter().any(|c| c == column_id) {
            return Err(FormError::UnknownColumn(column_id.to_string()));
        }
        if self.field_by_column(column_id).is_some() {
            return Err(FormError::ColumnInUse(column_id.to_string()));
        }
        self.elements.push(FormElement::field(column_id));
        Ok(())
    }

    pub fn add_static(&mut self, kind: StaticKind, content: &str) -> Result<(), FormError> {
        let element = match kind {
            StaticKind::Separator => FormElement::separator(),
            StaticKind::Title => FormElement::title(required_content(content, "title")?),
            StaticKind::Text => FormElement::text(required_content(content, "text")?),
        };
        self.elements.push(element);
        Ok(())
    }

    pub fn prepend(&mut self, elements: Vec<FormElement>) {
        self.elements.splice(0..0, elements);
    }

    pub fn remove_at(&mut self, index: usize) -> Result<FormElement, FormError> {
        if index >= self.elements.len() {
            return Err(FormError::IndexOutOfRange {
                index,
                len: self.elements.len(),
            });
        }
        Ok(self.elements.remove(index))
    }

    pub fn update_label(&mut self, index: usize, label: &str) -> bool {
        match self.field_at_mut(index) {
            Some(field) if field.field_label != label => {
                field.field_label = label.to_string();
                true
            }
            _ => false,
        }
    }

    pub fn set_required(&mut self, index: usize, required: bool) -> bool {
        match self.field_at_mut(index) {
            Some(field) if field.required != required => {
                field.required = required;
                true
            }
            _ => false,
        }
    }

    pub fn toggle_required(&mut self, index: usize) -> bool {
        match self.field_at_mut(index) {
            Some(field) => {
                field.required = !field.required;
                true
            }
            None => false,
        }
    }

    pub fn set_max_length(
        &mut self,
        index: usize,
        max_length: Option<u32>,
        shape: InputShape,
    ) -> bool {
        if !shape.accepts_max_length() {
            return false;
        }
        let max_length = max_length.filter(|max| *max > 0);
        match self.field_at_mut(index) {
            Some(field) if field.max_length != max_length => {
                field.max_length = max_length;
                true
            }
            _ => false,
        }
    }

    pub fn set_conditional(&mut self, index: usize, conditional: Option<Conditional>) -> bool {
        let conditional =
            conditional.filter(|rule| !rule.field.is_empty() && !rule.value.is_empty());
        match self.field_at_mut(index) {
            Some(field) if field.conditional != conditional => {
                field.conditional = conditional;
                true
            }
            _ => false,
        }
    }

    pub fn update_content(&mut self, index: usize, content: &str) -> bool {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return false;
        }
        match self.elements.get_mut(index) {
            Some(FormElement::Title { content } | FormElement::Text { content })
                if *content != trimmed =>
            {
                *content = trimmed.to_string();
                true
            }
            _ => false,
        }
    }

    pub fn reorder(&mut self, from: usize, to: usize, half: DropHalf) -> bool {
        reorder::apply_drop(&mut self.elements, from, to, half)
    }
}

fn required_content<'a>(content: &'a str, kind: &'static str) -> Result<&'a str, FormError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        Err(FormError::MissingContent { kind })
    } else {
        Ok(trimmed)
    }
}

impl From<Vec<FormElement>> for FormConfig {
    fn from(elements: Vec<FormElement>) -> Self {
        Self::new(elements)
    }
}
