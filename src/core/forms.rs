//! # Form Binder
//!
//! Pages describe their forms as [`FormSpec`]s. The binder keeps the live
//! field values, tracks focus, and on submit turns a form into a
//! [`FormSubmission`]: a map from field name to value, with checkboxes as
//! booleans and every other control as its string value.
//!
//! No validation happens here. A JSON field holding garbage is submitted as
//! garbage and the page handler decides what to do with it.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// CSS color string; the TUI previews it.
    Color,
    /// JSON document typed by the operator.
    Json,
    Checkbox,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub default: String,
    /// Reset to the default after each submit (chat input, action name).
    pub clear_on_submit: bool,
}

impl FieldSpec {
    fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            default: String::new(),
            clear_on_submit: false,
        }
    }

    pub fn text(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn color(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Color)
    }

    pub fn json(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Json)
    }

    pub fn checkbox(name: &'static str, label: &'static str, checked: bool) -> Self {
        let mut spec = Self::new(name, label, FieldKind::Checkbox);
        spec.default = checked.to_string();
        spec
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = value.into();
        self
    }

    pub fn clearing(mut self) -> Self {
        self.clear_on_submit = true;
        self
    }

    fn initial(&self) -> FieldValue {
        match self.kind {
            FieldKind::Checkbox => FieldValue::Bool(self.default == "true"),
            _ => FieldValue::Text(self.default.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl FormSpec {
    pub fn new(id: &'static str, title: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self { id, title, fields }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
}

/// Field name → value for one submitted form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormValues(BTreeMap<String, FieldValue>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, name: &str, value: &str) -> Self {
        self.insert(name, FieldValue::Text(value.to_string()));
        self
    }

    pub fn with_flag(mut self, name: &str, value: bool) -> Self {
        self.insert(name, FieldValue::Bool(value));
        self
    }

    pub fn insert(&mut self, name: &str, value: FieldValue) {
        self.0.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    /// String value of `name`; empty for missing or checkbox fields.
    pub fn text(&self, name: &str) -> &str {
        match self.0.get(name) {
            Some(FieldValue::Text(s)) => s,
            _ => "",
        }
    }

    /// Trimmed string value, `None` when blank.
    pub fn optional(&self, name: &str) -> Option<String> {
        let value = self.text(name).trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Checkbox value of `name`; false for missing or text fields.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.0.get(name), Some(FieldValue::Bool(true)))
    }

    /// Comma-separated list, trimmed, blanks dropped.
    pub fn list(&self, name: &str) -> Vec<String> {
        self.text(name)
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormSubmission {
    pub form: String,
    pub values: FormValues,
}

/// Live values of one form.
#[derive(Debug, Clone)]
pub struct FormState {
    pub spec: FormSpec,
    values: Vec<FieldValue>,
}

impl FormState {
    pub fn new(spec: FormSpec) -> Self {
        let values = spec.fields.iter().map(FieldSpec::initial).collect();
        Self { spec, values }
    }

    pub fn id(&self) -> &'static str {
        self.spec.id
    }

    pub fn value(&self, index: usize) -> Option<&FieldValue> {
        self.values.get(index)
    }

    /// Editable text of field `index`; `None` for checkboxes.
    pub fn text_mut(&mut self, index: usize) -> Option<&mut String> {
        match self.values.get_mut(index) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Flip a checkbox. Returns false for non-checkbox fields.
    pub fn toggle(&mut self, index: usize) -> bool {
        match self.values.get_mut(index) {
            Some(FieldValue::Bool(b)) => {
                *b = !*b;
                true
            }
            _ => false,
        }
    }

    pub fn set_text(&mut self, name: &str, value: &str) {
        if let Some(idx) = self.spec.fields.iter().position(|f| f.name == name)
            && let Some(text) = self.text_mut(idx)
        {
            *text = value.to_string();
        }
    }

    /// Collect every field, then clear the ones marked `clear_on_submit`.
    pub fn submit(&mut self) -> FormSubmission {
        let mut values = FormValues::new();
        for (field, value) in self.spec.fields.iter().zip(&self.values) {
            values.insert(field.name, value.clone());
        }
        for (field, value) in self.spec.fields.iter().zip(self.values.iter_mut()) {
            if field.clear_on_submit {
                *value = field.initial();
            }
        }
        FormSubmission {
            form: self.spec.id.to_string(),
            values,
        }
    }
}

/// The forms of the active page plus focus.
#[derive(Debug, Default)]
pub struct FormBinder {
    forms: Vec<FormState>,
    focused_form: usize,
    focused_field: usize,
}

impl FormBinder {
    pub fn new(specs: Vec<FormSpec>) -> Self {
        Self {
            forms: specs.into_iter().map(FormState::new).collect(),
            focused_form: 0,
            focused_field: 0,
        }
    }

    /// Match the tracked forms to `specs`: forms that stay keep their values,
    /// new forms start from defaults, vanished forms are dropped.
    pub fn sync(&mut self, specs: Vec<FormSpec>) {
        let same = specs.len() == self.forms.len()
            && specs.iter().zip(&self.forms).all(|(s, f)| s.id == f.id());
        if same {
            return;
        }
        let focused_id = self.focused().map(FormState::id);
        let mut old = std::mem::take(&mut self.forms);
        self.forms = specs
            .into_iter()
            .map(|spec| match old.iter().position(|f| f.id() == spec.id) {
                Some(idx) => old.swap_remove(idx),
                None => FormState::new(spec),
            })
            .collect();
        match focused_id.and_then(|id| self.forms.iter().position(|f| f.id() == id)) {
            Some(idx) => self.focused_form = idx,
            None => {
                self.focused_form = 0;
                self.focused_field = 0;
            }
        }
    }

    pub fn forms(&self) -> &[FormState] {
        &self.forms
    }

    pub fn focused(&self) -> Option<&FormState> {
        self.forms.get(self.focused_form)
    }

    pub fn focused_mut(&mut self) -> Option<&mut FormState> {
        self.forms.get_mut(self.focused_form)
    }

    pub fn focused_form_index(&self) -> usize {
        self.focused_form
    }

    pub fn focused_field(&self) -> usize {
        self.focused_field
    }

    pub fn next_form(&mut self) {
        if !self.forms.is_empty() {
            self.focused_form = (self.focused_form + 1) % self.forms.len();
            self.focused_field = 0;
        }
    }

    pub fn prev_form(&mut self) {
        if !self.forms.is_empty() {
            self.focused_form = (self.focused_form + self.forms.len() - 1) % self.forms.len();
            self.focused_field = 0;
        }
    }

    pub fn next_field(&mut self) {
        let count = self.focused().map_or(0, |f| f.spec.fields.len());
        if count > 0 {
            self.focused_field = (self.focused_field + 1) % count;
        }
    }

    pub fn prev_field(&mut self) {
        let count = self.focused().map_or(0, |f| f.spec.fields.len());
        if count > 0 {
            self.focused_field = (self.focused_field + count - 1) % count;
        }
    }

    /// Editable text of the focused field, if it is a text-like field.
    pub fn focused_text_mut(&mut self) -> Option<&mut String> {
        let field = self.focused_field;
        self.focused_mut()?.text_mut(field)
    }

    pub fn toggle_focused(&mut self) -> bool {
        let field = self.focused_field;
        self.focused_mut().is_some_and(|f| f.toggle(field))
    }

    pub fn submit_focused(&mut self) -> Option<FormSubmission> {
        self.focused_mut().map(FormState::submit)
    }
}
