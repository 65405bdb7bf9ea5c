//! Domain Layer
//!
//! This is the core of drawstack - pure provisioning logic without I/O
//! dependencies.
//!
//! ## Structure
//!
//! - `entities/` - Core domain entities (ResourceDeclaration, IdentityBinding, DeploymentState)
//! - `value_objects/` - Immutable value types (ResourceKey, PropertyValue, DeploymentScope)
//! - `services/` - Domain services (DependencyGraph, Planner, PropertyResolver, IdentityBinder, OutputResolver)
//! - `ports/` - Interface definitions for infrastructure
//!
//! ## Design Principles
//!
//! 1. **No I/O** - This layer never touches the file system or network directly
//! 2. **Pure Functions** - Services are stateless and testable
//! 3. **Ports & Adapters** - All backend and state access goes through trait-defined ports

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;
