// Module layout (Clean Architecture style)
// - bootstrap: configuration and startup wiring
// - infrastructure: Postgres repositories and evidence file storage
// - presentation: server-rendered pages, lookups JSON and routing
// - application: ports, access policy and use cases
// - domain: territory, planning, organization, users and evidence models

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
