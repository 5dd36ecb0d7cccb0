// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (bearer JWT, every query scoped to the caller)
pub mod protected; // /api/*
pub mod public; // /, /health
