use std::collections::HashMap;

use super::errors::CatalogError;
use super::payload::EventPayload;
use super::registry::SchemaRegistryClient;

// ============================================================================
// Schema Catalog - event type -> (schema id, payload factory)
// ============================================================================
//
// Bindings are built once at startup through `&mut self` and then shared
// behind `Arc<dyn SchemaCatalog>`. Once shared nothing can mutate them, so the
// hot path is a plain HashMap read with no locking and no network I/O.
//
// ============================================================================

/// Produces a zero-value payload for decoding.
pub type PayloadFactory = fn() -> Box<dyn EventPayload>;

fn factory_for<M: EventPayload + Default>() -> Box<dyn EventPayload> {
    Box::new(M::default())
}

/// Lookup result: the bound schema id and a fresh payload instance.
#[derive(Debug)]
pub struct SchemaInfo {
    pub schema_id: u32,
    pub template: Box<dyn EventPayload>,
}

/// Read-only capability the codec depends on.
pub trait SchemaCatalog: Send + Sync {
    fn get_info(&self, event_type: &str) -> Result<SchemaInfo, CatalogError>;
}

#[derive(Debug, Clone)]
pub struct SchemaBinding {
    event_type: String,
    schema_id: Option<u32>,
    factory: PayloadFactory,
}

impl SchemaBinding {
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// `None` until the binding has been resolved against a registry.
    pub fn schema_id(&self) -> Option<u32> {
        self.schema_id
    }

    pub fn instantiate(&self) -> Box<dyn EventPayload> {
        (self.factory)()
    }
}

#[derive(Debug, Default)]
struct BindingTable {
    bindings: HashMap<String, SchemaBinding>,
}

impl BindingTable {
    fn register(&mut self, event_type: String, schema_id: Option<u32>, factory: PayloadFactory) {
        let schema_id = schema_id.or_else(|| {
            self.bindings
                .get(&event_type)
                .and_then(|existing| existing.schema_id)
        });

        self.bindings.insert(
            event_type.clone(),
            SchemaBinding {
                event_type,
                schema_id,
                factory,
            },
        );
    }

    fn info(&self, event_type: &str) -> Result<SchemaInfo, CatalogError> {
        let binding = self
            .bindings
            .get(event_type)
            .ok_or_else(|| CatalogError::SchemaNotFound(event_type.to_string()))?;

        let schema_id = binding
            .schema_id
            .ok_or_else(|| CatalogError::SchemaNotFound(event_type.to_string()))?;

        Ok(SchemaInfo {
            schema_id,
            template: binding.instantiate(),
        })
    }
}

// ============================================================================
// Live catalog - ids resolved from a schema registry at startup
// ============================================================================

pub struct LiveSchemaCatalog<R> {
    registry: R,
    table: BindingTable,
}

impl<R: SchemaRegistryClient> LiveSchemaCatalog<R> {
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            table: BindingTable::default(),
        }
    }

    /// Associate an event type with the payload type used to decode it.
    ///
    /// Registering the same event type again replaces the factory and keeps an
    /// id that was already bound.
    pub fn register_template<M: EventPayload + Default>(&mut self, event_type: impl Into<String>) {
        let event_type = event_type.into();
        tracing::debug!(
            event_type = %event_type,
            payload = std::any::type_name::<M>(),
            "Registered payload template"
        );
        self.table.register(event_type, None, factory_for::<M>);
    }

    /// Resolve the current schema id of each subject and attach it to the
    /// template registered for the event type.
    ///
    /// All-or-nothing: ids are only applied once every subject has resolved.
    /// Every registered template must end up bound, so a template without a
    /// subject (and no id from an earlier bind) fails before any lookup.
    pub async fn bind_schemas(
        &mut self,
        subjects_by_type: &HashMap<String, String>,
    ) -> Result<(), CatalogError> {
        if let Some(missing) = subjects_by_type
            .keys()
            .find(|event_type| !self.table.bindings.contains_key(*event_type))
        {
            return Err(CatalogError::NoTemplateRegistered(missing.clone()));
        }

        if let Some(empty) = subjects_by_type
            .iter()
            .find(|(_, subject)| subject.trim().is_empty())
        {
            return Err(CatalogError::NoSubject(empty.0.clone()));
        }

        let mut unbound: Vec<&str> = self
            .table
            .bindings
            .values()
            .filter(|b| b.schema_id.is_none() && !subjects_by_type.contains_key(&b.event_type))
            .map(|b| b.event_type.as_str())
            .collect();
        unbound.sort_unstable();
        if let Some(first) = unbound.first() {
            return Err(CatalogError::NoSubject(first.to_string()));
        }

        let mut resolved = Vec::with_capacity(subjects_by_type.len());
        for (event_type, subject) in subjects_by_type {
            let schema_id = self
                .registry
                .latest_schema_id(subject)
                .await
                .map_err(|source| CatalogError::RegistryUnavailable {
                    subject: subject.clone(),
                    source,
                })?;

            resolved.push((event_type, subject, schema_id));
        }

        for (event_type, subject, schema_id) in resolved {
            if let Some(binding) = self.table.bindings.get_mut(event_type) {
                binding.schema_id = Some(schema_id);
            }
            tracing::info!(
                event_type = %event_type,
                subject = %subject,
                schema_id = schema_id,
                "✅ Bound event type to schema"
            );
        }

        Ok(())
    }

    pub fn binding(&self, event_type: &str) -> Option<&SchemaBinding> {
        self.table.bindings.get(event_type)
    }
}

impl<R: SchemaRegistryClient> SchemaCatalog for LiveSchemaCatalog<R> {
    fn get_info(&self, event_type: &str) -> Result<SchemaInfo, CatalogError> {
        self.table.info(event_type)
    }
}

// ============================================================================
// Static catalog - ids injected directly (tests, fixed deployments)
// ============================================================================

#[derive(Debug, Default)]
pub struct StaticSchemaCatalog {
    table: BindingTable,
}

impl StaticSchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<M: EventPayload + Default>(
        &mut self,
        event_type: impl Into<String>,
        schema_id: u32,
    ) {
        self.table.register(event_type.into(), Some(schema_id), factory_for::<M>);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<M: EventPayload + Default>(
        mut self,
        event_type: impl Into<String>,
        schema_id: u32,
    ) -> Self {
        self.register::<M>(event_type, schema_id);
        self
    }
}

impl SchemaCatalog for StaticSchemaCatalog {
    fn get_info(&self, event_type: &str) -> Result<SchemaInfo, CatalogError> {
        self.table.info(event_type)
    }
}
