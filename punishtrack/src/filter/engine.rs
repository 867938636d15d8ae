//! Event composer
//!
//! Compiles a [`ComposerConfig`] into resolved subscriptions and applies
//! them to raw events, either one event at a time ([`EventComposer::dispatch`])
//! or as one ordered async stream over the tracker's output channel
//! ([`EventComposer::attach`]).

use std::pin::Pin;
use std::sync::Arc;

use futures_util::{StreamExt, stream};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::config::{ComposerConfig, CriteriaRef, IndexRef, SubscriptionConfig, VariableValue};
use crate::error::ConfigError;
use crate::observability::metrics;
use crate::tracker::{EventKind, RawEvent};

use super::criteria::Criteria;
use super::participant::ParticipantFilter;

/// Merged output of every subscription.
pub type TaggedStream = Pin<Box<dyn Stream<Item = TaggedEvent> + Send>>;

/// One emission on the composed stream.
#[derive(Debug, Clone, Serialize)]
pub struct TaggedEvent {
    /// Id of the subscription that matched
    pub subscription_id: Arc<str>,
    /// Kind of the matched event
    pub kind: EventKind,
    /// The matched event
    pub payload: RawEvent,
}

/// A subscription with every reference resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    /// Tag attached to emissions
    pub id: Arc<str>,
    /// Event kind selected
    pub kind: EventKind,
    /// Participant filter, if any
    pub participant: Option<ParticipantFilter>,
    /// Criteria filter; `None` passes all
    pub criteria: Option<Criteria>,
}

impl Subscription {
    /// Whether the event passes this subscription.
    #[must_use]
    pub fn accepts(&self, event: &RawEvent) -> bool {
        event.kind == self.kind
            && self
                .participant
                .is_none_or(|filter| filter.matches(&event.record))
            && self
                .criteria
                .as_ref()
                .is_none_or(|criteria| criteria.matches(event))
    }

    fn tag(&self, event: RawEvent) -> TaggedEvent {
        metrics::record_emission(self.kind);
        TaggedEvent {
            subscription_id: Arc::clone(&self.id),
            kind: event.kind,
            payload: event,
        }
    }
}

/// Filters and tags raw events for a set of subscriptions.
#[derive(Debug, Clone, Default)]
pub struct EventComposer {
    subscriptions: Vec<Subscription>,
}

impl EventComposer {
    /// Resolves every subscription against the variable table.
    ///
    /// Participant variables must resolve to an index. Criteria variables
    /// that are missing fall back to passing every event, unless
    /// `strict_variables` is set.
    ///
    /// # Errors
    ///
    /// Returns the first unknown event kind, unresolvable participant
    /// variable, variable of the wrong type, or (in strict mode) missing
    /// criteria variable.
    pub fn compile(config: &ComposerConfig) -> Result<Self, ConfigError> {
        let subscriptions = config
            .events
            .iter()
            .enumerate()
            .map(|(i, event)| compile_subscription(config, event, &format!("events[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(subscriptions = subscriptions.len(), "composer compiled");
        Ok(Self { subscriptions })
    }

    /// Resolved subscriptions, in configuration order.
    #[must_use]
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Tagged emissions for one event, in subscription order.
    #[must_use]
    pub fn dispatch(&self, event: &RawEvent) -> Vec<TaggedEvent> {
        self.subscriptions
            .iter()
            .filter(|sub| sub.accepts(event))
            .map(|sub| sub.tag(event.clone()))
            .collect()
    }

    /// Applies every subscription to the events arriving on `events`.
    ///
    /// Emissions come out in publication order, and in subscription order
    /// within one event. The channel is only read as fast as the stream is
    /// polled, so a slow consumer holds the sender back rather than losing
    /// events. The stream ends once every sender is dropped; dropping the
    /// stream closes the channel.
    #[must_use]
    pub fn attach(&self, events: mpsc::Receiver<RawEvent>) -> TaggedStream {
        let composer = self.clone();
        Box::pin(
            ReceiverStream::new(events)
                .flat_map(move |event| stream::iter(composer.dispatch(&event))),
        )
    }
}

fn compile_subscription(
    config: &ComposerConfig,
    event: &SubscriptionConfig,
    path: &str,
) -> Result<Subscription, ConfigError> {
    let kind = event
        .kind
        .parse::<EventKind>()
        .map_err(|_| ConfigError::InvalidValue {
            field: format!("{path}.kind"),
            value: event.kind.clone(),
            expected: format!(
                "one of {}",
                EventKind::ALL.map(EventKind::as_str).join(", ")
            ),
        })?;

    let participant = event
        .filter
        .participant
        .as_ref()
        .map(|filter| {
            let location = format!("{path}.filter.participant");
            let index = match filter.index() {
                IndexRef::Literal(index) => *index,
                IndexRef::Variable(name) => match config.variables.get(name) {
                    Some(VariableValue::Index(index)) => *index,
                    Some(other) => {
                        return Err(wrong_type(name, other, "a participant index", location));
                    }
                    None => {
                        return Err(ConfigError::UnresolvedVariable {
                            name: name.clone(),
                            location,
                        });
                    }
                },
            };
            Ok(ParticipantFilter::new(index, filter.mode()))
        })
        .transpose()?;

    let criteria = match &event.filter.criteria {
        None | Some(CriteriaRef::Disabled) => None,
        Some(CriteriaRef::Literal(settings)) => Some(Criteria::from(settings)),
        Some(CriteriaRef::Variable(name)) => {
            let location = format!("{path}.filter.criteria");
            match config.variables.get(name) {
                Some(VariableValue::Criteria(settings)) => Some(Criteria::from(settings)),
                Some(other) => return Err(wrong_type(name, other, "criteria", location)),
                None if config.strict_variables => {
                    return Err(ConfigError::UnresolvedVariable {
                        name: name.clone(),
                        location,
                    });
                }
                None => {
                    warn!(
                        subscription = %event.id,
                        variable = %name,
                        "criteria variable not defined, passing all events"
                    );
                    None
                }
            }
        }
    };

    Ok(Subscription {
        id: Arc::from(event.id.as_str()),
        kind,
        participant,
        criteria,
    })
}

fn wrong_type(name: &str, value: &VariableValue, expected: &str, location: String) -> ConfigError {
    ConfigError::InvalidValue {
        field: location,
        value: format!("{name} ({})", value.type_name()),
        expected: expected.to_string(),
    }
}
