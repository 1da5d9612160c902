// ============================================================================
// Domain Layer - Business payloads and their handlers
// ============================================================================
//
// Each aggregate has its own subdirectory with:
// - Events (prost messages + DomainEvent impls)
// - Handlers (EventHandler impls for the consumer side)
//
// ============================================================================

pub mod app;
