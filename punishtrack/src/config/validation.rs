//! Configuration validation
//!
//! Runs on the deserialized `ComposerConfig` and collects ALL issues
//! (doesn't stop at first) so one pass over a file reports everything
//! wrong with it.

use std::collections::HashSet;

use crate::config::loader::ConfigLimits;
use crate::config::schema::{
    ComposerConfig, CriteriaRef, CriteriaSettings, IndexRef, SubscriptionConfig, VARIABLE_MARKER,
    VariableValue,
};
use crate::error::{Severity, ValidationIssue};
use crate::tracker::EventKind;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Configuration validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a configuration and returns every issue found.
    pub fn validate(&mut self, config: &ComposerConfig, limits: &ConfigLimits) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_variables(config);
        self.validate_events(config);
        self.validate_limits(config, limits);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ========================================================================
    // Variables
    // ========================================================================

    fn validate_variables(&mut self, config: &ComposerConfig) {
        for (name, value) in &config.variables {
            let path = format!("variables.{name}");
            if !name.starts_with(VARIABLE_MARKER) {
                self.add_error(
                    &path,
                    format!("Variable names must start with '{VARIABLE_MARKER}'"),
                );
            } else if name.len() == 1 {
                self.add_error(&path, "Variable name is empty");
            }
            if let VariableValue::Criteria(settings) = value {
                self.validate_criteria(settings, &path);
            }
        }

        let used: HashSet<&str> = config
            .events
            .iter()
            .flat_map(|event| referenced_variables(event))
            .collect();
        for name in config.variables.keys() {
            if !used.contains(name.as_str()) {
                self.add_warning(
                    &format!("variables.{name}"),
                    "Variable is never referenced",
                );
            }
        }
    }

    // ========================================================================
    // Events
    // ========================================================================

    fn validate_events(&mut self, config: &ComposerConfig) {
        if config.events.is_empty() {
            self.add_warning("events", "No subscriptions defined; nothing will be emitted");
        }

        let mut seen_ids = HashSet::new();
        for (i, event) in config.events.iter().enumerate() {
            let path = format!("events[{i}]");
            self.validate_event(config, event, &path);

            if !event.id.is_empty() && !seen_ids.insert(event.id.as_str()) {
                self.add_error(
                    &format!("{path}.id"),
                    format!("Duplicate subscription id '{}'", event.id),
                );
            }
        }
    }

    fn validate_event(&mut self, config: &ComposerConfig, event: &SubscriptionConfig, path: &str) {
        if event.id.trim().is_empty() {
            self.add_error(
                &format!("{path}.id"),
                "Subscription id is required and cannot be empty",
            );
        }

        if event.kind.parse::<EventKind>().is_err() {
            let hint = EventKind::suggest(&event.kind)
                .map(|s| format!(" (did you mean '{s}'?)"))
                .unwrap_or_default();
            self.add_error(
                &format!("{path}.kind"),
                format!("Unknown event kind '{}'{hint}", event.kind),
            );
        }

        if let Some(participant) = &event.filter.participant {
            if let IndexRef::Variable(name) = participant.index() {
                let location = format!("{path}.filter.participant");
                match config.variables.get(name) {
                    Some(VariableValue::Index(_)) => {}
                    Some(other) => self.add_error(
                        &location,
                        format!(
                            "Variable '{name}' is a {}, expected a participant index",
                            other.type_name()
                        ),
                    ),
                    None => self.add_error(
                        &location,
                        format!(
                            "Variable '{name}' is not defined{}",
                            suggest_variable(name, config)
                        ),
                    ),
                }
            }
        }

        let location = format!("{path}.filter.criteria");
        match &event.filter.criteria {
            Some(CriteriaRef::Literal(settings)) => self.validate_criteria(settings, &location),
            Some(CriteriaRef::Variable(name)) => match config.variables.get(name) {
                Some(VariableValue::Criteria(_)) => {}
                Some(other) => self.add_error(
                    &location,
                    format!(
                        "Variable '{name}' is a {}, expected criteria",
                        other.type_name()
                    ),
                ),
                None => {
                    let message = format!(
                        "Variable '{name}' is not defined{}",
                        suggest_variable(name, config)
                    );
                    if config.strict_variables {
                        self.add_error(&location, message);
                    } else {
                        self.add_warning(
                            &location,
                            format!("{message}; the subscription will pass every event"),
                        );
                    }
                }
            },
            Some(CriteriaRef::Disabled) | None => {}
        }
    }

    // ========================================================================
    // Criteria
    // ========================================================================

    fn validate_criteria(&mut self, settings: &CriteriaSettings, path: &str) {
        for (field, value) in [
            ("min_damage", settings.min_damage),
            ("max_damage", settings.max_damage),
        ] {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    self.add_error(
                        &format!("{path}.{field}"),
                        format!("Damage threshold must be a non-negative number, got {value}"),
                    );
                }
            }
        }

        if let (Some(min), Some(max)) = (settings.min_damage, settings.max_damage) {
            if min > max {
                self.add_error(
                    path,
                    format!("min_damage ({min}) is greater than max_damage ({max})"),
                );
            }
        }

        for (field, empty) in [
            (
                "opening_types",
                settings.opening_types.as_ref().is_some_and(Vec::is_empty),
            ),
            (
                "character_ids",
                settings.character_ids.as_ref().is_some_and(Vec::is_empty),
            ),
            (
                "name_tags",
                settings.name_tags.as_ref().is_some_and(Vec::is_empty),
            ),
        ] {
            if empty {
                self.add_warning(
                    &format!("{path}.{field}"),
                    "Empty list matches nothing; omit the field to accept any value",
                );
            }
        }
    }

    // ========================================================================
    // Limits
    // ========================================================================

    fn validate_limits(&mut self, config: &ComposerConfig, limits: &ConfigLimits) {
        if config.events.len() > limits.max_subscriptions {
            self.add_error(
                "events",
                format!(
                    "Too many subscriptions: {} (max {})",
                    config.events.len(),
                    limits.max_subscriptions
                ),
            );
        }
        if config.variables.len() > limits.max_variables {
            self.add_error(
                "variables",
                format!(
                    "Too many variables: {} (max {})",
                    config.variables.len(),
                    limits.max_variables
                ),
            );
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn add_error(&mut self, path: &str, message: impl Into<String>) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.into(),
            severity: Severity::Error,
        });
    }

    fn add_warning(&mut self, path: &str, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.into(),
            severity: Severity::Warning,
        });
    }
}

fn referenced_variables(event: &SubscriptionConfig) -> impl Iterator<Item = &str> {
    let participant = event
        .filter
        .participant
        .as_ref()
        .and_then(|p| match p.index() {
            IndexRef::Variable(name) => Some(name.as_str()),
            IndexRef::Literal(_) => None,
        });
    let criteria = match &event.filter.criteria {
        Some(CriteriaRef::Variable(name)) => Some(name.as_str()),
        _ => None,
    };
    participant.into_iter().chain(criteria)
}

/// Formats a "did you mean" hint for an unknown variable name.
fn suggest_variable(name: &str, config: &ComposerConfig) -> String {
    config
        .variables
        .keys()
        .map(|known| (known, strsim::damerau_levenshtein(name, known)))
        .filter(|(_, dist)| *dist <= 2)
        .min_by_key(|(_, dist)| *dist)
        .map(|(known, _)| format!(" (did you mean '{known}'?)"))
        .unwrap_or_default()
}
