use std::borrow::Cow;

use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::core::error::{AppError, Result};
use crate::features::categories::models::{
    Category, CategoryDomain, CategoryPatch, NewCategory, ParentRef,
};
use crate::features::categories::services::CategoryService;
use crate::shared::constants::DEFAULT_SORT_ORDER;
use crate::shared::validation::NON_BLANK_REGEX;

/// Editable fields of the category dialog
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct CategoryForm {
    #[validate(
        length(min = 1, max = 200, message = "name must be between 1 and 200 characters"),
        regex(path = *NON_BLANK_REGEX, message = "name must not be blank")
    )]
    pub name: String,
    pub parent_id: Option<ParentRef>,
    pub sort_order: Option<i32>,
    pub is_active: bool,
}

impl Default for CategoryForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            parent_id: None,
            sort_order: Some(DEFAULT_SORT_ORDER),
            is_active: true,
        }
    }
}

// A stored self-reference loads as "no parent", so submitting repairs it
impl From<&Category> for CategoryForm {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            parent_id: category
                .parent()
                .filter(|parent| *parent != category.id)
                .map(ParentRef::Id),
            sort_order: category.sort_order,
            is_active: category.is_active,
        }
    }
}

impl CategoryForm {
    fn parent(&self) -> Option<Uuid> {
        self.parent_id.as_ref().map(ParentRef::id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorState {
    Create,
    Edit { original: Category },
    Submitted(Category),
    Cancelled,
}

/// Create/edit dialog for one category.
///
/// Opens in `Create` or `Edit`, ends in `Submitted` after a successful store
/// call or in `Cancelled` without one. A failed submit keeps the dialog open
/// and records the message in `last_error`.
#[derive(Debug, Clone)]
pub struct CategoryEditor {
    domain: CategoryDomain,
    state: EditorState,
    form: CategoryForm,
    last_error: Option<String>,
}

impl CategoryEditor {
    pub fn create(domain: CategoryDomain) -> Self {
        Self {
            domain,
            state: EditorState::Create,
            form: CategoryForm::default(),
            last_error: None,
        }
    }

    pub fn edit(domain: CategoryDomain, original: Category) -> Self {
        Self {
            domain,
            form: CategoryForm::from(&original),
            state: EditorState::Edit { original },
            last_error: None,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn form_mut(&mut self) -> &mut CategoryForm {
        &mut self.form
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, EditorState::Create | EditorState::Edit { .. })
    }

    fn editing_id(&self) -> Option<Uuid> {
        match &self.state {
            EditorState::Edit { original } => Some(original.id),
            _ => None,
        }
    }

    /// Field checks, run before anything reaches the store
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = match self.form.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if let (Some(editing), Some(parent)) = (self.editing_id(), self.form.parent()) {
            if editing == parent {
                errors.add(
                    "parent_id",
                    ValidationError::new("self_parent")
                        .with_message(Cow::Borrowed("a category cannot be its own parent")),
                );
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Create or update depending on how the editor was opened
    pub async fn submit(&mut self, service: &CategoryService) -> Result<Category> {
        if !self.is_open() {
            return Err(AppError::BadRequest(
                "Category editor is already closed".to_string(),
            ));
        }

        if let Err(errors) = self.validate() {
            let err = AppError::from(errors);
            self.last_error = Some(err.to_string());
            return Err(err);
        }

        let result = match &self.state {
            EditorState::Edit { original } => {
                let patch = self.patch_against(original);
                service.update(self.domain, original.id, patch).await
            }
            _ => service.create(self.domain, self.new_category()).await,
        };

        match result {
            Ok(category) => {
                tracing::info!(
                    "Saved {} category {} ({})",
                    self.domain,
                    category.id,
                    category.name
                );
                self.last_error = None;
                self.state = EditorState::Submitted(category.clone());
                Ok(category)
            }
            Err(e) => {
                tracing::error!("Failed to save {} category: {}", self.domain, e);
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Close without touching the store
    pub fn cancel(&mut self) {
        if self.is_open() {
            self.state = EditorState::Cancelled;
            self.last_error = None;
        }
    }

    fn new_category(&self) -> NewCategory {
        NewCategory {
            name: self.form.name.trim().to_string(),
            parent_id: self.form.parent(),
            sort_order: self.form.sort_order.unwrap_or(DEFAULT_SORT_ORDER),
            is_active: self.form.is_active,
        }
    }

    // Only fields that differ from the loaded record
    fn patch_against(&self, original: &Category) -> CategoryPatch {
        let name = self.form.name.trim();
        let parent = self.form.parent();

        CategoryPatch {
            name: (name != original.name).then(|| name.to_string()),
            parent_id: (parent != original.parent()).then_some(parent),
            sort_order: self
                .form
                .sort_order
                .filter(|sort_order| Some(*sort_order) != original.sort_order),
            is_active: (self.form.is_active != original.is_active).then_some(self.form.is_active),
        }
    }
}

/// Parent choices for the dialog: every category except the one being edited
pub fn selectable_parents(categories: &[Category], editing: Option<Uuid>) -> Vec<Category> {
    categories
        .iter()
        .filter(|c| Some(c.id) != editing)
        .cloned()
        .collect()
}
